//! Identity store operations: account creation, worker provisioning and
//! removal, self-service deletion, and password changes.

use std::sync::Arc;

use database::validation::{validate_display_name, validate_email};
use database::{account, complaint, Account, AccountSummary, Database, NewAccount, Role, ValidationError};
use serde::Serialize;
use tracing::info;

use crate::error::{CoreError, Result};
use crate::evidence::{release, EvidenceStore};
use crate::password::{hash_password, verify_password};
use crate::session::SessionRecord;

/// Input for creating an account.
#[derive(Debug, Clone, Default)]
pub struct AccountRequest {
    pub display_name: String,
    pub email: String,
    pub phone: Option<String>,
    /// Omitted for accounts that will sign in with an external identity.
    pub password: Option<String>,
}

/// What a self-service deletion removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DeletionReport {
    pub complaints_removed: u64,
    pub evidence_released: usize,
    /// Evidence the store failed to delete; logged, not retried.
    pub evidence_failed: usize,
}

fn check_email(email: &str) -> Result<()> {
    validate_email(email).map_err(|err| match err {
        ValidationError::InvalidEmail(msg) => CoreError::InvalidEmailFormat(msg),
        other => CoreError::InvalidEmailFormat(other.to_string()),
    })
}

fn require_admin(actor_role: Role, action: &'static str) -> Result<()> {
    match actor_role {
        Role::Admin => Ok(()),
        Role::User | Role::Worker => Err(CoreError::Unauthorized { action }),
    }
}

fn blank_to_none(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Account management on top of the identity store.
#[derive(Clone)]
pub struct IdentityService {
    db: Database,
    evidence: Arc<dyn EvidenceStore>,
}

impl IdentityService {
    pub fn new(db: Database, evidence: Arc<dyn EvidenceStore>) -> Self {
        Self { db, evidence }
    }

    /// Create an account with an explicit role.
    ///
    /// A supplied password is stored as a salted hash; without one the
    /// account stays credential-less until an external identity is linked.
    pub async fn create_account(&self, request: AccountRequest, role: Role) -> Result<Account> {
        validate_display_name(&request.display_name)
            .map_err(|e| CoreError::InvalidInput(e.to_string()))?;
        check_email(&request.email)?;

        let credential_hash = match request.password.as_deref() {
            Some(password) if !password.is_empty() => hash_password(password)?,
            Some(_) => return Err(CoreError::InvalidInput("password cannot be empty".to_string())),
            None => String::new(),
        };

        let created = account::create_account(
            self.db.pool(),
            &NewAccount {
                display_name: request.display_name,
                email: request.email,
                phone: blank_to_none(request.phone),
                credential_hash,
                role,
                external_identity_ref: None,
            },
        )
        .await?;

        info!(account_id = created.id, role = %created.role, "Account created");
        Ok(created)
    }

    /// Create a worker account. Admin only.
    pub async fn provision_worker(&self, actor_role: Role, request: AccountRequest) -> Result<Account> {
        require_admin(actor_role, "provision workers")?;
        check_email(&request.email)?;
        if request.password.as_deref().map_or(true, str::is_empty) {
            return Err(CoreError::InvalidInput("worker password is required".to_string()));
        }

        self.create_account(request, Role::Worker).await
    }

    /// Delete a worker account that holds no unresolved complaints. Admin only.
    ///
    /// Completed complaints keep the removed worker's id.
    pub async fn remove_worker(&self, actor_role: Role, worker_id: i64) -> Result<()> {
        require_admin(actor_role, "remove workers")?;

        let mut tx = self.db.begin_immediate().await?;

        let worker = account::get_account(&mut *tx, worker_id).await?;
        if worker.role != Role::Worker {
            return Err(CoreError::NotFound {
                entity: "Worker",
                id: worker_id.to_string(),
            });
        }

        let open = complaint::count_active_for_worker(&mut *tx, worker_id).await?;
        if open > 0 {
            return Err(CoreError::HasActiveWork { worker_id, open });
        }

        account::delete_account(&mut *tx, worker_id).await?;
        tx.commit().await.map_err(database::DatabaseError::from)?;

        info!(worker_id, "Worker removed");
        Ok(())
    }

    /// Delete the caller's own account with its complaints and evidence.
    ///
    /// Complaints and the account go in one transaction; evidence is
    /// released only after it commits, so a failed delete never leaves
    /// complaints pointing at missing photos.
    pub async fn delete_account(&self, actor: &SessionRecord, account_id: i64) -> Result<DeletionReport> {
        if actor.account_id != account_id {
            return Err(CoreError::Unauthorized {
                action: "delete another account",
            });
        }

        let mut tx = self.db.begin_immediate().await?;

        let owner = account::get_account(&mut *tx, account_id).await?;
        if owner.role == Role::Worker {
            let open = complaint::count_active_for_worker(&mut *tx, account_id).await?;
            if open > 0 {
                return Err(CoreError::HasActiveWork {
                    worker_id: account_id,
                    open,
                });
            }
        }

        let evidence = complaint::evidence_for_reporter(&mut *tx, account_id).await?;
        let complaints_removed = complaint::delete_by_reporter(&mut *tx, account_id).await?;
        account::delete_account(&mut *tx, account_id).await?;
        tx.commit().await.map_err(database::DatabaseError::from)?;

        let mut report = DeletionReport {
            complaints_removed,
            evidence_released: 0,
            evidence_failed: 0,
        };
        for reference in evidence.iter().flat_map(|refs| refs.references()) {
            if release(self.evidence.as_ref(), reference).await {
                report.evidence_released += 1;
            } else {
                report.evidence_failed += 1;
            }
        }

        info!(
            account_id,
            complaints = report.complaints_removed,
            evidence = report.evidence_released,
            "Account deleted"
        );
        Ok(report)
    }

    /// Replace the caller's password after checking the current one.
    pub async fn change_password(&self, account_id: i64, current: &str, new_password: &str) -> Result<()> {
        if new_password.is_empty() {
            return Err(CoreError::InvalidCredential);
        }

        let existing = account::get_account(self.db.pool(), account_id).await?;
        if !verify_password(current, &existing.credential_hash) {
            return Err(CoreError::InvalidCredential);
        }

        let hash = hash_password(new_password)?;
        account::update_credential_hash(self.db.pool(), account_id, &hash).await?;

        info!(account_id, "Password changed");
        Ok(())
    }

    /// Load an account for its profile page.
    pub async fn profile(&self, account_id: i64) -> Result<Account> {
        Ok(account::get_account(self.db.pool(), account_id).await?)
    }

    /// Worker accounts. Admin only.
    pub async fn list_workers(&self, actor_role: Role) -> Result<Vec<AccountSummary>> {
        require_admin(actor_role, "list workers")?;
        Ok(account::list_accounts_by_role(self.db.pool(), Role::Worker).await?)
    }

    /// Every account with its external-identity linkage. Admin only.
    pub async fn list_accounts(&self, actor_role: Role) -> Result<Vec<AccountSummary>> {
        require_admin(actor_role, "list accounts")?;
        Ok(account::list_accounts(self.db.pool()).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_email_maps_to_invalid_format() {
        assert!(check_email("ok@example.com").is_ok());
        assert!(matches!(
            check_email("not-an-email"),
            Err(CoreError::InvalidEmailFormat(_))
        ));
        assert!(matches!(check_email(""), Err(CoreError::InvalidEmailFormat(_))));
    }

    #[test]
    fn test_require_admin() {
        assert!(require_admin(Role::Admin, "x").is_ok());
        assert!(matches!(
            require_admin(Role::Worker, "x"),
            Err(CoreError::Unauthorized { .. })
        ));
        assert!(matches!(
            require_admin(Role::User, "x"),
            Err(CoreError::Unauthorized { .. })
        ));
    }

    #[test]
    fn test_blank_phone_is_dropped() {
        assert_eq!(blank_to_none(Some("  ".to_string())), None);
        assert_eq!(
            blank_to_none(Some(" 98450 ".to_string())),
            Some("98450".to_string())
        );
    }
}
