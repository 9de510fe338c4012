//! Registration, login, and logout.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use cleanstreet_core::{ExternalLogin, LoginOutcome, Registration};
use database::Account;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::info;

use crate::error::{Result, WebError};
use crate::session::{sign_in, sign_out};
use crate::state::AppState;

/// Password registration request.
#[derive(Deserialize)]
pub struct RegisterRequest {
    pub display_name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    pub password: String,
    /// Checked against `password` when supplied.
    #[serde(default)]
    pub confirm_password: Option<String>,
}

/// Email and password login request.
#[derive(Deserialize)]
pub struct PasswordLogin {
    pub email: String,
    pub password: String,
}

/// External identity login request.
#[derive(Deserialize)]
pub struct TokenLogin {
    pub token: String,
    pub email: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub display_name: Option<String>,
    /// Create the account if the email is unknown.
    #[serde(default)]
    pub signup: bool,
}

/// Register a password account. Does not sign in.
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<Account>)> {
    if req.confirm_password.as_deref().is_some_and(|c| c != req.password) {
        return Err(WebError::BadRequest("passwords do not match".to_string()));
    }

    let account = state
        .auth
        .register(Registration {
            display_name: req.display_name,
            email: req.email,
            phone: req.phone,
            password: req.password,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(account)))
}

/// Password login.
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Json(req): Json<PasswordLogin>,
) -> Result<Json<LoginOutcome>> {
    let outcome = state.auth.login_with_password(&req.email, &req.password).await?;
    sign_in(&session, &outcome.session).await?;
    Ok(Json(outcome))
}

/// Password login from the pre-federation clients.
pub async fn legacy_login(
    State(state): State<AppState>,
    session: Session,
    Json(req): Json<PasswordLogin>,
) -> Result<Json<LoginOutcome>> {
    let outcome = state
        .auth
        .login_with_legacy_password(&req.email, &req.password)
        .await?;
    sign_in(&session, &outcome.session).await?;
    Ok(Json(outcome))
}

/// External identity login.
pub async fn token_login(
    State(state): State<AppState>,
    session: Session,
    Json(req): Json<TokenLogin>,
) -> Result<Json<LoginOutcome>> {
    let outcome = state
        .auth
        .login_with_token(ExternalLogin {
            token: req.token,
            email: req.email,
            subject: req.subject,
            display_name: req.display_name,
            allow_provisioning: req.signup,
        })
        .await?;
    sign_in(&session, &outcome.session).await?;
    Ok(Json(outcome))
}

/// Clear the session.
pub async fn logout(session: Session) -> Result<StatusCode> {
    sign_out(&session).await?;
    info!("Signed out");
    Ok(StatusCode::NO_CONTENT)
}
