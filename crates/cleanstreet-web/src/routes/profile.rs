//! The signed-in account's own profile.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use cleanstreet_core::DeletionReport;
use database::Account;
use serde::Deserialize;
use tower_sessions::Session;

use crate::error::Result;
use crate::session::{sign_out, SignedIn};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct ChangePassword {
    pub current_password: String,
    pub new_password: String,
}

/// The caller's account.
pub async fn profile(State(state): State<AppState>, SignedIn(me): SignedIn) -> Result<Json<Account>> {
    Ok(Json(state.identity.profile(me.account_id).await?))
}

pub async fn change_password(
    State(state): State<AppState>,
    SignedIn(me): SignedIn,
    Json(req): Json<ChangePassword>,
) -> Result<StatusCode> {
    state
        .identity
        .change_password(me.account_id, &req.current_password, &req.new_password)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Delete the caller's account with its complaints and evidence, then sign out.
pub async fn delete_account(
    State(state): State<AppState>,
    session: Session,
    SignedIn(me): SignedIn,
) -> Result<Json<DeletionReport>> {
    let report = state.identity.delete_account(&me, me.account_id).await?;
    sign_out(&session).await?;
    Ok(Json(report))
}
