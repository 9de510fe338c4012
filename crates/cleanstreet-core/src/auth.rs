//! Auth reconciliation.
//!
//! Three entry paths converge on one account row:
//!
//! - password login, refused once the account has an external identity;
//! - legacy password login, the same check plus a migration nudge;
//! - external-token login, which auto-provisions when allowed, re-derives
//!   the role from the admin allow-list, and links the external identity
//!   (`PasswordOnly` -> `Linked`).
//!
//! Role changes after creation only happen on the token path.

use std::sync::Arc;

use database::{account, Account, Database, DatabaseError, NewAccount};
use serde::Serialize;
use tracing::{info, warn};

use crate::error::{CoreError, Result};
use crate::identity::{AccountRequest, IdentityService};
use crate::password::verify_password;
use crate::role::RoleResolver;
use crate::session::{LoginOutcome, SessionRecord};
use crate::verifier::{TokenVerifier, VerifierError};

/// Auth state of an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthMode {
    PasswordOnly,
    ExternalOnly,
    Linked,
    /// Neither a password nor an external identity (not reachable through
    /// the public operations).
    Unlinked,
}

impl AuthMode {
    pub fn of(account: &Account) -> Self {
        match (account.has_credential(), account.has_external_identity()) {
            (true, false) => AuthMode::PasswordOnly,
            (false, true) => AuthMode::ExternalOnly,
            (true, true) => AuthMode::Linked,
            (false, false) => AuthMode::Unlinked,
        }
    }
}

/// A self-registration with email and password.
#[derive(Debug, Clone, Default)]
pub struct Registration {
    pub display_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub password: String,
}

/// An external-identity login attempt.
#[derive(Debug, Clone, Default)]
pub struct ExternalLogin {
    /// Token presented to the verifier.
    pub token: String,
    /// Email the client claims for the identity.
    pub email: String,
    /// Subject the client claims for the identity.
    pub subject: String,
    /// Name to use if the account has to be created.
    pub display_name: Option<String>,
    /// Whether an unknown email may be provisioned (first-time signup).
    pub allow_provisioning: bool,
}

/// Resolves logins into session identities.
#[derive(Clone)]
pub struct AuthReconciler {
    db: Database,
    identity: IdentityService,
    resolver: RoleResolver,
    verifier: Arc<dyn TokenVerifier>,
}

impl AuthReconciler {
    pub fn new(
        db: Database,
        identity: IdentityService,
        resolver: RoleResolver,
        verifier: Arc<dyn TokenVerifier>,
    ) -> Self {
        Self {
            db,
            identity,
            resolver,
            verifier,
        }
    }

    /// Role resolver this reconciler applies.
    pub fn resolver(&self) -> &RoleResolver {
        &self.resolver
    }

    /// Register a password account. The role is resolved once, here.
    pub async fn register(&self, registration: Registration) -> Result<Account> {
        if registration.password.is_empty() {
            return Err(CoreError::InvalidInput("password cannot be empty".to_string()));
        }

        let role = self.resolver.resolve(&registration.email);
        self.identity
            .create_account(
                AccountRequest {
                    display_name: registration.display_name,
                    email: registration.email,
                    phone: registration.phone,
                    password: Some(registration.password),
                },
                role,
            )
            .await
    }

    /// Password login.
    pub async fn login_with_password(&self, email: &str, password: &str) -> Result<LoginOutcome> {
        let account = self.check_password(email, password).await?;
        info!(account_id = account.id, "Password login");
        Ok(LoginOutcome::password(&account, false))
    }

    /// Password login from the pre-federation flow.
    ///
    /// Same checks as [`login_with_password`](Self::login_with_password);
    /// additionally recommends migration when no external identity is linked.
    pub async fn login_with_legacy_password(&self, email: &str, password: &str) -> Result<LoginOutcome> {
        let account = self.check_password(email, password).await?;
        let migration_recommended = !account.has_external_identity();
        info!(account_id = account.id, migration_recommended, "Legacy password login");
        Ok(LoginOutcome::password(&account, migration_recommended))
    }

    async fn check_password(&self, email: &str, password: &str) -> Result<Account> {
        let account = account::find_account_by_email(self.db.pool(), email)
            .await?
            .ok_or_else(|| CoreError::NotFound {
                entity: "Account",
                id: email.trim().to_string(),
            })?;

        if !verify_password(password, &account.credential_hash) {
            return Err(CoreError::InvalidCredential);
        }

        if account.has_external_identity() {
            return Err(CoreError::RequiresExternalAuth);
        }

        Ok(account)
    }

    /// External-identity login.
    ///
    /// An unavailable verifier is logged and the login continues with the
    /// client's claims; a rejected token fails with `InvalidCredential`.
    /// Repeating a login with unchanged allow-list membership writes nothing.
    pub async fn login_with_token(&self, login: ExternalLogin) -> Result<LoginOutcome> {
        let (subject, email, identity_verified) = match self.verifier.verify(&login.token).await {
            Ok(verified) => {
                let email = verified.email.unwrap_or(login.email);
                (verified.subject, email, true)
            }
            Err(VerifierError::Unavailable(reason)) => {
                let err = CoreError::VerifierUnavailable(reason);
                warn!(error = %err, email = %login.email.trim(), "Continuing external login unverified");
                (login.subject, login.email, false)
            }
            Err(VerifierError::Rejected(reason)) => {
                warn!(reason = %reason, email = %login.email.trim(), "External token rejected");
                return Err(CoreError::InvalidCredential);
            }
        };

        let subject = subject.trim().to_string();
        if subject.is_empty() {
            return Err(CoreError::InvalidCredential);
        }
        database::validation::validate_email(&email)
            .map_err(|e| CoreError::InvalidEmailFormat(e.to_string()))?;

        let role = self.resolver.resolve(&email);
        let mut tx = self.db.begin_immediate().await?;

        let (account, account_created) = match account::find_account_by_email(&mut *tx, &email).await? {
            None if !login.allow_provisioning => {
                return Err(CoreError::AccountNotFound {
                    email: email.trim().to_string(),
                });
            }
            None => {
                let display_name = login
                    .display_name
                    .filter(|name| !name.trim().is_empty())
                    .unwrap_or_else(|| local_part(&email));
                let created = account::create_account(
                    &mut *tx,
                    &NewAccount {
                        display_name,
                        email: email.clone(),
                        phone: None,
                        credential_hash: String::new(),
                        role,
                        external_identity_ref: Some(subject.clone()),
                    },
                )
                .await?;
                info!(account_id = created.id, role = %role, "Provisioned account from external identity");
                (created, true)
            }
            Some(mut existing) => {
                if existing.role != role {
                    account::update_role(&mut *tx, existing.id, role).await?;
                    info!(
                        account_id = existing.id,
                        from = %existing.role,
                        to = %role,
                        "Corrected account role"
                    );
                    existing.role = role;
                }

                match existing.external_identity_ref.clone() {
                    None => {
                        account::link_external_identity(&mut *tx, existing.id, &subject).await?;
                        info!(account_id = existing.id, "Linked external identity");
                        existing.external_identity_ref = Some(subject);
                    }
                    Some(linked) if linked != subject => {
                        warn!(
                            account_id = existing.id,
                            "Presented identity differs from the linked one; keeping the linked identity"
                        );
                    }
                    Some(_) => {}
                }

                (existing, false)
            }
        };

        tx.commit().await.map_err(DatabaseError::from)?;

        Ok(LoginOutcome {
            session: SessionRecord::from(&account),
            migration_recommended: false,
            identity_verified,
            account_created,
        })
    }
}

fn local_part(email: &str) -> String {
    email
        .trim()
        .split('@')
        .next()
        .filter(|part| !part.is_empty())
        .unwrap_or("member")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use database::Role;

    fn account(hash: &str, external: Option<&str>) -> Account {
        Account {
            id: 1,
            display_name: "A".to_string(),
            email: "a@example.com".to_string(),
            phone: None,
            credential_hash: hash.to_string(),
            role: Role::User,
            external_identity_ref: external.map(str::to_string),
            created_at: String::new(),
        }
    }

    #[test]
    fn test_auth_mode() {
        assert_eq!(AuthMode::of(&account("h", None)), AuthMode::PasswordOnly);
        assert_eq!(AuthMode::of(&account("", Some("s"))), AuthMode::ExternalOnly);
        assert_eq!(AuthMode::of(&account("h", Some("s"))), AuthMode::Linked);
        assert_eq!(AuthMode::of(&account("", None)), AuthMode::Unlinked);
    }

    #[test]
    fn test_local_part() {
        assert_eq!(local_part(" asha@example.com"), "asha");
        assert_eq!(local_part("@example.com"), "member");
    }
}
