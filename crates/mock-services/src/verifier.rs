//! Token verifiers with scripted answers.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use cleanstreet_core::{TokenVerifier, VerifiedToken, VerifierError};

/// Accepts only the tokens it was given; anything else is rejected.
#[derive(Debug, Default)]
pub struct FixedTokenVerifier {
    tokens: HashMap<String, VerifiedToken>,
    calls: AtomicUsize,
}

impl FixedTokenVerifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept `token` as `subject`, optionally asserting `email`.
    pub fn with_token(mut self, token: &str, subject: &str, email: Option<&str>) -> Self {
        self.tokens.insert(
            token.to_string(),
            VerifiedToken {
                subject: subject.to_string(),
                email: email.map(str::to_string),
            },
        );
        self
    }

    /// Number of `verify` calls so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TokenVerifier for FixedTokenVerifier {
    async fn verify(&self, token: &str) -> Result<VerifiedToken, VerifierError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.tokens
            .get(token)
            .cloned()
            .ok_or_else(|| VerifierError::Rejected(format!("unknown token {}", token)))
    }
}

/// Verifier that can never be reached.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableVerifier;

#[async_trait]
impl TokenVerifier for UnavailableVerifier {
    async fn verify(&self, _token: &str) -> Result<VerifiedToken, VerifierError> {
        Err(VerifierError::Unavailable("connection refused".to_string()))
    }
}

/// Verifier that rejects every token.
#[derive(Debug, Clone, Copy, Default)]
pub struct RejectingVerifier;

#[async_trait]
impl TokenVerifier for RejectingVerifier {
    async fn verify(&self, _token: &str) -> Result<VerifiedToken, VerifierError> {
        Err(VerifierError::Rejected("signature mismatch".to_string()))
    }
}
