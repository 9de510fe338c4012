//! Reporter-facing complaint routes and public reports.

use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use cleanstreet_core::Submission;
use database::{Complaint, ComplaintWithReporter, Location};
use serde::Deserialize;

use crate::error::{Result, WebError};
use crate::routes::upload::Form;
use crate::session::{SignedIn, UserSession};
use crate::state::AppState;

/// Optional `?status=` filter.
#[derive(Deserialize, Default)]
pub struct StatusQuery {
    #[serde(default)]
    pub status: Option<String>,
}

fn parse_location(form: &Form) -> Result<Option<Location>> {
    let coordinate = |name: &str| -> Result<Option<f64>> {
        form.text(name)
            .map(|raw| {
                raw.parse::<f64>()
                    .map_err(|_| WebError::BadRequest(format!("{} must be a number", name)))
            })
            .transpose()
    };

    match (coordinate("latitude")?, coordinate("longitude")?) {
        (Some(latitude), Some(longitude)) => Ok(Some(Location {
            latitude,
            longitude,
        })),
        (None, None) => Ok(None),
        _ => Err(WebError::BadRequest(
            "latitude and longitude must be given together".to_string(),
        )),
    }
}

/// File a complaint from a multipart form
/// (`description`, optional `latitude`/`longitude`, optional `image_before`).
pub async fn submit(
    State(state): State<AppState>,
    UserSession(me): UserSession,
    multipart: Multipart,
) -> Result<(StatusCode, Json<Complaint>)> {
    let mut form = Form::read(multipart).await?;
    let location = parse_location(&form)?;
    let submission = Submission {
        description: form.text("description").unwrap_or_default().to_string(),
        before_evidence: form.take_file("image_before"),
        location,
    };

    let created = state.complaints.submit(me.account_id, submission).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// The caller's complaints. `status=pending` or `status=open` means the open set.
pub async fn mine(
    State(state): State<AppState>,
    UserSession(me): UserSession,
    Query(query): Query<StatusQuery>,
) -> Result<Json<Vec<Complaint>>> {
    let complaints = state
        .complaints
        .my_complaints(me.account_id, query.status.as_deref())
        .await?;
    Ok(Json(complaints))
}

pub async fn detail(
    State(state): State<AppState>,
    SignedIn(_): SignedIn,
    Path(id): Path<i64>,
) -> Result<Json<ComplaintWithReporter>> {
    Ok(Json(state.complaints.detail(id).await?))
}

/// Every complaint, newest first. No sign-in required.
pub async fn reports(
    State(state): State<AppState>,
    Query(query): Query<StatusQuery>,
) -> Result<Json<Vec<ComplaintWithReporter>>> {
    let reports = state
        .complaints
        .public_reports(query.status.as_deref())
        .await?;
    Ok(Json(reports))
}
