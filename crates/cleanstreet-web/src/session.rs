//! Cookie sessions and the extractors that guard routes by role.
//!
//! The session holds exactly one [`SessionRecord`] under [`SESSION_KEY`].

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use cleanstreet_core::SessionRecord;
use database::Role;
use tower_sessions::cookie::SameSite;
use tower_sessions::{Expiry, MemoryStore, Session, SessionManagerLayer};

use crate::error::WebError;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "cleanstreet_session";

/// Key the session record is stored under.
pub const SESSION_KEY: &str = "account";

/// Session expiry after inactivity (7 days).
const SESSION_EXPIRY_SECONDS: i64 = 7 * 24 * 60 * 60;

/// Create the session layer backed by an in-process store.
pub fn session_layer(secure: bool) -> SessionManagerLayer<MemoryStore> {
    SessionManagerLayer::new(MemoryStore::default())
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(secure)
        .with_same_site(SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
}

/// Store the record for a fresh login, rotating the session id.
pub async fn sign_in(session: &Session, record: &SessionRecord) -> Result<(), WebError> {
    session.cycle_id().await?;
    session.insert(SESSION_KEY, record).await?;
    Ok(())
}

/// Drop the session entirely.
pub async fn sign_out(session: &Session) -> Result<(), WebError> {
    session.flush().await?;
    Ok(())
}

/// The signed-in record, if any.
///
/// A request outside the session layer has no session. A store failure or
/// a record that no longer decodes is a server error, not a sign-out.
async fn current(parts: &Parts) -> Result<Option<SessionRecord>, WebError> {
    let Some(session) = parts.extensions.get::<Session>() else {
        return Ok(None);
    };
    Ok(session.get::<SessionRecord>(SESSION_KEY).await?)
}

async fn with_role(parts: &Parts, role: Role, label: &'static str) -> Result<SessionRecord, WebError> {
    let record = current(parts).await?.ok_or(WebError::Unauthenticated)?;
    if record.role != role {
        return Err(WebError::Forbidden(label));
    }
    Ok(record)
}

/// Any signed-in account.
pub struct SignedIn(pub SessionRecord);

impl<S> FromRequestParts<S> for SignedIn
where
    S: Send + Sync,
{
    type Rejection = WebError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        current(parts).await?.map(Self).ok_or(WebError::Unauthenticated)
    }
}

/// A signed-in reporter (role `user`).
pub struct UserSession(pub SessionRecord);

impl<S> FromRequestParts<S> for UserSession
where
    S: Send + Sync,
{
    type Rejection = WebError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        with_role(parts, Role::User, "user").await.map(Self)
    }
}

/// A signed-in worker.
pub struct WorkerSession(pub SessionRecord);

impl<S> FromRequestParts<S> for WorkerSession
where
    S: Send + Sync,
{
    type Rejection = WebError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        with_role(parts, Role::Worker, "worker").await.map(Self)
    }
}

/// A signed-in administrator.
pub struct AdminSession(pub SessionRecord);

impl<S> FromRequestParts<S> for AdminSession
where
    S: Send + Sync,
{
    type Rejection = WebError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        with_role(parts, Role::Admin, "admin").await.map(Self)
    }
}
