//! Administrator routes.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use cleanstreet_core::AccountRequest;
use database::{Account, AccountSummary, AdminSnapshot};
use serde::Deserialize;

use crate::error::Result;
use crate::session::AdminSession;
use crate::state::AppState;

/// New worker account.
#[derive(Deserialize)]
pub struct NewWorker {
    pub display_name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub phone: Option<String>,
}

pub async fn snapshot(
    State(state): State<AppState>,
    AdminSession(me): AdminSession,
) -> Result<Json<AdminSnapshot>> {
    Ok(Json(state.dashboard.admin(me.role).await?))
}

pub async fn list_workers(
    State(state): State<AppState>,
    AdminSession(me): AdminSession,
) -> Result<Json<Vec<AccountSummary>>> {
    Ok(Json(state.identity.list_workers(me.role).await?))
}

pub async fn provision_worker(
    State(state): State<AppState>,
    AdminSession(me): AdminSession,
    Json(req): Json<NewWorker>,
) -> Result<(StatusCode, Json<Account>)> {
    let worker = state
        .identity
        .provision_worker(
            me.role,
            AccountRequest {
                display_name: req.display_name,
                email: req.email,
                phone: req.phone,
                password: Some(req.password),
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(worker)))
}

pub async fn remove_worker(
    State(state): State<AppState>,
    AdminSession(me): AdminSession,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    state.identity.remove_worker(me.role, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_accounts(
    State(state): State<AppState>,
    AdminSession(me): AdminSession,
) -> Result<Json<Vec<AccountSummary>>> {
    Ok(Json(state.identity.list_accounts(me.role).await?))
}
