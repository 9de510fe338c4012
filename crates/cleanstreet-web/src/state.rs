//! Application state shared across handlers.

use std::sync::Arc;

use cleanstreet_core::{
    AuthReconciler, ComplaintEngine, Dashboard, EvidenceStore, IdentityService, RoleResolver,
    TokenVerifier,
};
use database::Database;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Database connection.
    pub db: Database,
    pub identity: IdentityService,
    pub auth: AuthReconciler,
    pub complaints: ComplaintEngine,
    pub dashboard: Dashboard,
}

impl AppState {
    /// Wire the core services around one database and its collaborators.
    pub fn new(
        db: Database,
        evidence: Arc<dyn EvidenceStore>,
        verifier: Arc<dyn TokenVerifier>,
        resolver: RoleResolver,
    ) -> Self {
        let identity = IdentityService::new(db.clone(), evidence.clone());
        let auth = AuthReconciler::new(db.clone(), identity.clone(), resolver, verifier);
        let complaints = ComplaintEngine::new(db.clone(), evidence);
        let dashboard = Dashboard::new(db.clone());

        Self {
            db,
            identity,
            auth,
            complaints,
            dashboard,
        }
    }
}
