//! Error taxonomy for core operations.

use database::{ComplaintStatus, DatabaseError};
use thiserror::Error;

use crate::evidence::EvidenceError;

/// Errors returned by core operations.
///
/// Every named failure kind is its own variant so callers can match on
/// it; infrastructure faults are grouped under `Storage`, `Evidence`
/// and `PasswordHash`.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A referenced record does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// External login for an unknown email outside a provisioning flow.
    #[error("no account registered for {email}")]
    AccountNotFound { email: String },

    /// The actor's role does not allow the operation.
    #[error("not permitted to {action}")]
    Unauthorized { action: &'static str },

    /// The email or external identity already belongs to an account.
    #[error("identity already registered: {0}")]
    DuplicateIdentity(String),

    /// Wrong password, missing local password, or rejected token.
    #[error("invalid credentials")]
    InvalidCredential,

    /// The account has moved to federated login.
    #[error("this account signs in with its external identity")]
    RequiresExternalAuth,

    /// Complaint submitted without a description.
    #[error("description is required")]
    MissingDescription,

    /// Completion attempted without an after-cleanup photo.
    #[error("an after-cleanup photo is required to complete a complaint")]
    MissingAfterEvidence,

    /// Email failed the syntactic check.
    #[error("invalid email: {0}")]
    InvalidEmailFormat(String),

    /// Worker still holds complaints that are not completed.
    #[error("worker {worker_id} still has {open} unresolved complaint(s)")]
    HasActiveWork { worker_id: i64, open: i64 },

    /// Token verifier could not be reached. Logged, never returned from login.
    #[error("token verifier unavailable: {0}")]
    VerifierUnavailable(String),

    /// The complaint is `Completed` and has no outgoing transition.
    #[error("complaint {complaint_id} is {from} and cannot change status")]
    InvalidTransition {
        complaint_id: i64,
        from: ComplaintStatus,
    },

    /// Uploaded evidence is not an accepted image type.
    #[error("invalid evidence: {0}")]
    InvalidEvidence(String),

    /// Other malformed input (empty display name, empty password).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("storage error: {0}")]
    Storage(DatabaseError),

    #[error("evidence store error: {0}")]
    Evidence(#[from] EvidenceError),

    #[error("password hashing failed: {0}")]
    PasswordHash(String),
}

impl CoreError {
    /// Stable machine-readable name of the failure kind.
    pub fn kind(&self) -> &'static str {
        match self {
            CoreError::NotFound { .. } => "not_found",
            CoreError::AccountNotFound { .. } => "account_not_found",
            CoreError::Unauthorized { .. } => "unauthorized",
            CoreError::DuplicateIdentity(_) => "duplicate_identity",
            CoreError::InvalidCredential => "invalid_credential",
            CoreError::RequiresExternalAuth => "requires_external_auth",
            CoreError::MissingDescription => "missing_description",
            CoreError::MissingAfterEvidence => "missing_after_evidence",
            CoreError::InvalidEmailFormat(_) => "invalid_email_format",
            CoreError::HasActiveWork { .. } => "has_active_work",
            CoreError::VerifierUnavailable(_) => "verifier_unavailable",
            CoreError::InvalidTransition { .. } => "invalid_transition",
            CoreError::InvalidEvidence(_) => "invalid_evidence",
            CoreError::InvalidInput(_) => "invalid_input",
            CoreError::Storage(_) => "storage",
            CoreError::Evidence(_) => "evidence",
            CoreError::PasswordHash(_) => "password_hash",
        }
    }

    /// Whether the failure is an infrastructure fault rather than a
    /// rejected request.
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            CoreError::Storage(_) | CoreError::Evidence(_) | CoreError::PasswordHash(_)
        )
    }
}

impl From<DatabaseError> for CoreError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::NotFound { entity, id } => CoreError::NotFound { entity, id },
            // Only account email and external identity columns are unique.
            DatabaseError::AlreadyExists { id, .. } => CoreError::DuplicateIdentity(id),
            other => CoreError::Storage(other),
        }
    }
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_errors_translate_to_taxonomy() {
        let err: CoreError = DatabaseError::AlreadyExists {
            entity: "Account",
            id: "a@example.com".to_string(),
        }
        .into();
        assert!(matches!(err, CoreError::DuplicateIdentity(ref id) if id == "a@example.com"));

        let err: CoreError = DatabaseError::NotFound {
            entity: "Complaint",
            id: "9".to_string(),
        }
        .into();
        assert_eq!(err.kind(), "not_found");
        assert!(!err.is_internal());
    }

    #[test]
    fn test_internal_errors() {
        assert!(CoreError::PasswordHash("salt".to_string()).is_internal());
        assert!(!CoreError::MissingAfterEvidence.is_internal());
        assert_eq!(CoreError::RequiresExternalAuth.kind(), "requires_external_auth");
    }
}
