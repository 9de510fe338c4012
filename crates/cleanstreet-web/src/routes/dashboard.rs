//! Dashboard route.

use axum::extract::State;
use axum::Json;
use cleanstreet_core::DashboardView;

use crate::error::Result;
use crate::session::SignedIn;
use crate::state::AppState;

/// Counts for the caller's role.
pub async fn dashboard(
    State(state): State<AppState>,
    SignedIn(me): SignedIn,
) -> Result<Json<DashboardView>> {
    Ok(Json(state.dashboard.for_session(&me).await?))
}
