//! Core services for the CleanStreet complaint tracker.
//!
//! This crate sits between the transport layer and the [`database`]
//! crate. It provides:
//!
//! - [`AuthReconciler`] - Password, legacy, and external-token logins,
//!   auto-provisioning, and admin role re-derivation
//! - [`IdentityService`] - Account creation, worker provisioning/removal,
//!   self-service deletion
//! - [`ComplaintEngine`] - The complaint state machine and its queries
//! - [`Dashboard`] - Read-only count projections
//! - [`EvidenceStore`] / [`TokenVerifier`] - Collaborator traits, with
//!   [`FsEvidenceStore`] and [`HttpTokenVerifier`] as production backends
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use cleanstreet_core::{ComplaintEngine, FsEvidenceStore, Submission};
//! use database::Database;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let db = Database::connect("sqlite::memory:").await?;
//! db.migrate().await?;
//!
//! let engine = ComplaintEngine::new(db, Arc::new(FsEvidenceStore::new("uploads")));
//! let complaint = engine
//!     .submit(
//!         1,
//!         Submission {
//!             description: "Overflowing bin on Elm St".to_string(),
//!             ..Default::default()
//!         },
//!     )
//!     .await?;
//! println!("filed complaint {}", complaint.id);
//! # Ok(())
//! # }
//! ```

mod auth;
mod dashboard;
mod error;
mod evidence;
mod identity;
mod lifecycle;
mod password;
mod role;
mod session;
mod verifier;

pub use auth::{AuthMode, AuthReconciler, ExternalLogin, Registration};
pub use dashboard::{Dashboard, DashboardView};
pub use error::{CoreError, Result};
pub use evidence::{
    sanitize_file_name, EvidenceError, EvidenceStore, EvidenceUpload, FsEvidenceStore,
    ALLOWED_EXTENSIONS,
};
pub use identity::{AccountRequest, DeletionReport, IdentityService};
pub use lifecycle::{report_filter, reporter_filter, ClaimStatus, ComplaintEngine, Submission};
pub use password::{hash_password, verify_password};
pub use role::RoleResolver;
pub use session::{LoginOutcome, SessionRecord};
pub use verifier::{HttpTokenVerifier, TokenVerifier, UnconfiguredVerifier, VerifiedToken, VerifierError};

// Re-export async_trait for collaborator implementations
pub use async_trait::async_trait;
