//! External identity token verification.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

/// Identity asserted by a verified token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedToken {
    /// Stable subject identifier issued by the identity provider.
    pub subject: String,
    /// Email claim, when the provider includes one.
    pub email: Option<String>,
}

/// Why a token could not be verified.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerifierError {
    /// The verifier could not be reached or gave no usable answer.
    #[error("verifier unavailable: {0}")]
    Unavailable(String),

    /// The verifier answered and refused the token.
    #[error("token rejected: {0}")]
    Rejected(String),
}

/// Verifies federated identity tokens out of process.
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<VerifiedToken, VerifierError>;
}

/// Verifier used when no endpoint is configured. Always unavailable.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnconfiguredVerifier;

#[async_trait]
impl TokenVerifier for UnconfiguredVerifier {
    async fn verify(&self, _token: &str) -> Result<VerifiedToken, VerifierError> {
        Err(VerifierError::Unavailable(
            "no token verifier configured".to_string(),
        ))
    }
}

/// Token-info response body.
#[derive(Debug, Deserialize)]
struct TokenInfo {
    sub: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    aud: Option<String>,
}

/// Verifier backed by an HTTP token-info endpoint
/// (`GET <endpoint>?id_token=<token>`).
#[derive(Debug, Clone)]
pub struct HttpTokenVerifier {
    client: reqwest::Client,
    endpoint: String,
    audience: Option<String>,
}

impl HttpTokenVerifier {
    const TIMEOUT: Duration = Duration::from_secs(10);

    /// Create a verifier for `endpoint`, optionally requiring an `aud` claim.
    pub fn new(endpoint: impl Into<String>, audience: Option<String>) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(Self::TIMEOUT).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            audience,
        })
    }

    fn check_claims(&self, info: TokenInfo) -> Result<VerifiedToken, VerifierError> {
        if info.sub.trim().is_empty() {
            return Err(VerifierError::Rejected("token has no subject".to_string()));
        }

        if let Some(expected) = &self.audience {
            if info.aud.as_deref() != Some(expected.as_str()) {
                return Err(VerifierError::Rejected(format!(
                    "audience mismatch (got {:?})",
                    info.aud
                )));
            }
        }

        Ok(VerifiedToken {
            subject: info.sub,
            email: info.email,
        })
    }
}

#[async_trait]
impl TokenVerifier for HttpTokenVerifier {
    async fn verify(&self, token: &str) -> Result<VerifiedToken, VerifierError> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("id_token", token)])
            .send()
            .await
            .map_err(|e| VerifierError::Unavailable(e.to_string()))?;

        let status = response.status();
        if status.is_server_error() {
            return Err(VerifierError::Unavailable(format!("verifier returned {}", status)));
        }
        if !status.is_success() {
            return Err(VerifierError::Rejected(format!("verifier returned {}", status)));
        }

        let info = response
            .json::<TokenInfo>()
            .await
            .map_err(|e| VerifierError::Unavailable(format!("unreadable verifier response: {}", e)))?;

        self.check_claims(info)
    }
}
