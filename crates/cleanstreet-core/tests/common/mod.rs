//! Shared setup for core integration tests.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use cleanstreet_core::{
    AccountRequest, AuthReconciler, ComplaintEngine, Dashboard, EvidenceStore, EvidenceUpload,
    IdentityService, RoleResolver, TokenVerifier,
};
use database::{Account, Database, Role};
use mock_services::MemoryEvidenceStore;

pub const ADMIN_EMAIL: &str = "admin@example.com";

pub struct Harness {
    pub db: Database,
    pub evidence: Arc<MemoryEvidenceStore>,
    pub identity: IdentityService,
    pub engine: ComplaintEngine,
    pub dashboard: Dashboard,
    db_file: Option<PathBuf>,
}

impl Harness {
    pub async fn new() -> Self {
        Self::with_db(test_db().await, None)
    }

    /// Harness over a database file, so concurrent operations contend for
    /// SQLite's file locks the way a deployed server does.
    pub async fn on_disk() -> Self {
        let path = std::env::temp_dir().join(format!("cleanstreet-core-{}.db", uuid::Uuid::new_v4()));
        let db = Database::connect(&format!("sqlite:{}", path.display()))
            .await
            .unwrap();
        db.migrate().await.unwrap();
        Self::with_db(db, Some(path))
    }

    fn with_db(db: Database, db_file: Option<PathBuf>) -> Self {
        let evidence = Arc::new(MemoryEvidenceStore::new());
        let store: Arc<dyn EvidenceStore> = evidence.clone();
        Self {
            identity: IdentityService::new(db.clone(), store.clone()),
            engine: ComplaintEngine::new(db.clone(), store),
            dashboard: Dashboard::new(db.clone()),
            db,
            evidence,
            db_file,
        }
    }

    /// Reconciler with `admin@example.com` on the allow-list.
    pub fn reconciler(&self, verifier: Arc<dyn TokenVerifier>) -> AuthReconciler {
        AuthReconciler::new(
            self.db.clone(),
            self.identity.clone(),
            RoleResolver::new([ADMIN_EMAIL]),
            verifier,
        )
    }

    /// Credential-less account with an explicit role.
    pub async fn account(&self, name: &str, email: &str, role: Role) -> Account {
        self.identity
            .create_account(
                AccountRequest {
                    display_name: name.to_string(),
                    email: email.to_string(),
                    phone: None,
                    password: None,
                },
                role,
            )
            .await
            .unwrap()
    }

    pub async fn reporter(&self, name: &str) -> Account {
        let email = format!("{}@example.com", name.to_lowercase());
        self.account(name, &email, Role::User).await
    }

    pub async fn worker(&self, name: &str) -> Account {
        let email = format!("{}@crew.example.com", name.to_lowercase());
        self.account(name, &email, Role::Worker).await
    }
}

impl Drop for Harness {
    fn drop(&mut self) {
        if let Some(path) = &self.db_file {
            for suffix in ["", "-wal", "-shm", "-journal"] {
                let mut file = path.clone().into_os_string();
                file.push(suffix);
                let _ = std::fs::remove_file(file);
            }
        }
    }
}

pub async fn test_db() -> Database {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    db.migrate().await.unwrap();
    db
}

pub fn photo(name: &str) -> Option<EvidenceUpload> {
    Some(EvidenceUpload::new(name, b"\x89PNG fake image".to_vec()))
}
