//! Health check endpoint.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
pub struct Health {
    pub status: String,
    pub database: bool,
}

/// Health check endpoint. Reports `degraded` when the database is unreachable.
pub async fn health(State(state): State<AppState>) -> Json<Health> {
    let database = match state.db.ping().await {
        Ok(()) => true,
        Err(err) => {
            tracing::warn!(error = %err, "Health check could not reach the database");
            false
        }
    };

    Json(Health {
        status: if database { "ok" } else { "degraded" }.to_string(),
        database,
    })
}
