//! Route handlers for the CleanStreet API.

pub mod admin;
pub mod auth;
pub mod complaints;
pub mod dashboard;
pub mod health;
pub mod profile;
pub mod upload;
pub mod worker;

use std::path::Path;

use axum::extract::DefaultBodyLimit;
use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::services::ServeDir;

use crate::session::session_layer;
use crate::state::AppState;

/// Largest accepted request body (photo uploads).
const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Build the router with all routes.
pub fn router() -> Router<AppState> {
    Router::new()
        // Health check
        .route("/health", get(health::health))
        // Auth
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/legacy-login", post(auth::legacy_login))
        .route("/api/auth/token", post(auth::token_login))
        .route("/api/auth/logout", post(auth::logout))
        // Profile
        .route(
            "/api/profile",
            get(profile::profile).delete(profile::delete_account),
        )
        .route("/api/profile/password", post(profile::change_password))
        // Complaints
        .route("/api/complaints", post(complaints::submit))
        .route("/api/complaints/mine", get(complaints::mine))
        .route("/api/complaints/{id}", get(complaints::detail))
        .route("/api/reports", get(complaints::reports))
        .route("/api/dashboard", get(dashboard::dashboard))
        // Worker
        .route("/api/worker/open", get(worker::open))
        .route("/api/worker/completed", get(worker::completed))
        .route("/api/worker/complaints/{id}/status", post(worker::update_status))
        .route("/api/worker/complaints/{id}/complete", post(worker::complete))
        // Admin
        .route("/api/admin/snapshot", get(admin::snapshot))
        .route(
            "/api/admin/workers",
            get(admin::list_workers).post(admin::provision_worker),
        )
        .route("/api/admin/workers/{id}", delete(admin::remove_worker))
        .route("/api/admin/accounts", get(admin::list_accounts))
}

/// The complete application: API routes, evidence files, and sessions.
pub fn app(state: AppState, upload_dir: &Path, secure_cookies: bool) -> Router {
    router()
        .nest_service("/uploads", ServeDir::new(upload_dir))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(session_layer(secure_cookies))
        .with_state(state)
}
