//! Fixed-shape session record handed to the session carrier.

use database::{Account, Role};
use serde::{Deserialize, Serialize};

/// Identity carried by a signed-in session. Nothing else is stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SessionRecord {
    pub account_id: i64,
    pub display_name: String,
    pub role: Role,
}

impl From<&Account> for SessionRecord {
    fn from(account: &Account) -> Self {
        Self {
            account_id: account.id,
            display_name: account.display_name.clone(),
            role: account.role,
        }
    }
}

/// Result of a successful login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoginOutcome {
    pub session: SessionRecord,
    /// Set on legacy password logins for accounts without an external identity.
    pub migration_recommended: bool,
    /// False when the token verifier was unavailable and the login continued unverified.
    pub identity_verified: bool,
    /// True when the login created the account.
    pub account_created: bool,
}

impl LoginOutcome {
    pub(crate) fn password(account: &Account, migration_recommended: bool) -> Self {
        Self {
            session: SessionRecord::from(account),
            migration_recommended,
            identity_verified: true,
            account_created: false,
        }
    }
}
