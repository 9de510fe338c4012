//! CleanStreet web server.
//!
//! Serves the complaint tracker as a JSON API with cookie sessions and
//! multipart photo uploads.

mod config;
mod error;
mod routes;
mod session;
mod state;

use std::sync::Arc;

use cleanstreet_core::{
    FsEvidenceStore, HttpTokenVerifier, RoleResolver, TokenVerifier, UnconfiguredVerifier,
};
use database::Database;
use tracing::{info, warn};

use crate::config::Config;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt::init();

    // Load configuration
    let config = Config::from_env()?;
    info!(addr = %config.addr, "Starting CleanStreet web server");

    // Connect to database
    let db = Database::connect(&config.database_url).await?;
    db.migrate().await?;

    // Evidence directory
    let evidence = FsEvidenceStore::new(&config.upload_dir);
    evidence.ensure_dir().await?;

    // External identity verifier
    let verifier: Arc<dyn TokenVerifier> = match &config.token_verifier_url {
        Some(url) => Arc::new(HttpTokenVerifier::new(url.clone(), config.token_audience.clone())?),
        None => {
            warn!("TOKEN_VERIFIER_URL not set; external logins will not be verified");
            Arc::new(UnconfiguredVerifier)
        }
    };

    let resolver = RoleResolver::from_comma_list(&config.admin_emails);
    info!(admins = resolver.admin_emails().count(), "Loaded admin allow-list");

    // Build application state
    let state = AppState::new(db, Arc::new(evidence), verifier, resolver);

    // Build router
    let app = routes::app(state, &config.upload_dir, config.session_secure);

    // Start server
    info!(addr = %config.addr, "CleanStreet web server listening");
    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
