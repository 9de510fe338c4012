//! Worker routes: the open queue, status updates, and completion.

use axum::extract::{Multipart, Path, State};
use axum::Json;
use cleanstreet_core::ClaimStatus;
use database::{Complaint, ComplaintWithReporter};
use serde::Deserialize;

use crate::error::{Result, WebError};
use crate::routes::upload::Form;
use crate::session::WorkerSession;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct StatusUpdate {
    /// `Accepted` or `In Progress`.
    pub status: String,
}

/// Open complaints, oldest first.
pub async fn open(
    State(state): State<AppState>,
    WorkerSession(_): WorkerSession,
) -> Result<Json<Vec<ComplaintWithReporter>>> {
    Ok(Json(state.complaints.open_queue().await?))
}

/// Complaints the caller completed.
pub async fn completed(
    State(state): State<AppState>,
    WorkerSession(me): WorkerSession,
) -> Result<Json<Vec<ComplaintWithReporter>>> {
    Ok(Json(state.complaints.completed_by(me.account_id).await?))
}

/// Claim a complaint or move it between `Accepted` and `In Progress`.
pub async fn update_status(
    State(state): State<AppState>,
    WorkerSession(me): WorkerSession,
    Path(id): Path<i64>,
    Json(req): Json<StatusUpdate>,
) -> Result<Json<Complaint>> {
    let status = ClaimStatus::parse(&req.status).ok_or_else(|| {
        WebError::BadRequest(format!(
            "status must be Accepted or In Progress, got {:?}",
            req.status
        ))
    })?;

    let updated = state
        .complaints
        .claim_or_update(me.account_id, id, status)
        .await?;
    Ok(Json(updated))
}

/// Complete a complaint with the `image_after` photo.
pub async fn complete(
    State(state): State<AppState>,
    WorkerSession(me): WorkerSession,
    Path(id): Path<i64>,
    multipart: Multipart,
) -> Result<Json<Complaint>> {
    let mut form = Form::read(multipart).await?;
    let completed = state
        .complaints
        .complete(me.account_id, id, form.take_file("image_after"))
        .await?;
    Ok(Json(completed))
}
