//! Mock collaborators for CleanStreet tests.
//!
//! This crate provides in-memory implementations of the core's
//! collaborator traits:
//! - `MemoryEvidenceStore` - Keeps evidence in memory and counts calls
//! - `FailingEvidenceStore` - Fails every put or delete on demand
//! - `FixedTokenVerifier` - Accepts a fixed set of tokens
//! - `UnavailableVerifier` / `RejectingVerifier` - Verifier failure modes
//!
//! For production, use `FsEvidenceStore` and `HttpTokenVerifier` from
//! `cleanstreet-core`.
//!
//! # Example
//!
//! ```rust
//! use mock_services::{EvidenceStore, MemoryEvidenceStore};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), mock_services::EvidenceError> {
//!     let store = MemoryEvidenceStore::new();
//!
//!     let reference = store.put(b"jpeg", "before_bin.jpg").await?;
//!     assert!(store.contains(&reference).await);
//!
//!     store.delete(&reference).await?;
//!     assert!(!store.contains(&reference).await);
//!     Ok(())
//! }
//! ```

mod evidence;
mod verifier;

// Re-export core collaborator types for convenience
pub use cleanstreet_core::{
    async_trait, EvidenceError, EvidenceStore, TokenVerifier, VerifiedToken, VerifierError,
};

pub use evidence::{FailingEvidenceStore, MemoryEvidenceStore};
pub use verifier::{FixedTokenVerifier, RejectingVerifier, UnavailableVerifier};
