//! Account (identity store) operations.
//!
//! Every function accepts any SQLite executor, so the same call works on
//! the pool or inside a transaction (`&mut *tx`).

use sqlx::{Executor, Sqlite};

use crate::error::{DatabaseError, Result};
use crate::models::{Account, AccountSummary, NewAccount, Role};
use crate::validation::normalize_email;

/// Insert a new account.
///
/// Fails with `AlreadyExists` when the normalized email, or the external
/// identity reference, is already taken.
pub async fn create_account<'e, E>(executor: E, account: &NewAccount) -> Result<Account>
where
    E: Executor<'e, Database = Sqlite>,
{
    let email = normalize_email(&account.email);

    sqlx::query_as::<_, Account>(
        r#"
        INSERT INTO accounts (display_name, email, phone, credential_hash, role, external_identity_ref)
        VALUES (?, ?, ?, ?, ?, ?)
        RETURNING id, display_name, email, phone, credential_hash, role, external_identity_ref, created_at
        "#,
    )
    .bind(account.display_name.trim())
    .bind(&email)
    .bind(&account.phone)
    .bind(&account.credential_hash)
    .bind(account.role)
    .bind(&account.external_identity_ref)
    .fetch_one(executor)
    .await
    .map_err(|e| DatabaseError::from_insert(e, "Account", &email))
}

/// Get an account by ID.
pub async fn get_account<'e, E>(executor: E, id: i64) -> Result<Account>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, Account>(
        r#"
        SELECT id, display_name, email, phone, credential_hash, role, external_identity_ref, created_at
        FROM accounts
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(executor)
    .await?
    .ok_or_else(|| DatabaseError::NotFound {
        entity: "Account",
        id: id.to_string(),
    })
}

/// Find an account by email, comparing the normalized form.
pub async fn find_account_by_email<'e, E>(executor: E, email: &str) -> Result<Option<Account>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let account = sqlx::query_as::<_, Account>(
        r#"
        SELECT id, display_name, email, phone, credential_hash, role, external_identity_ref, created_at
        FROM accounts
        WHERE email = ?
        "#,
    )
    .bind(normalize_email(email))
    .fetch_optional(executor)
    .await?;

    Ok(account)
}

/// Overwrite the stored role.
pub async fn update_role<'e, E>(executor: E, id: i64, role: Role) -> Result<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query(
        r#"
        UPDATE accounts
        SET role = ?
        WHERE id = ?
        "#,
    )
    .bind(role)
    .bind(id)
    .execute(executor)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: "Account",
            id: id.to_string(),
        });
    }

    Ok(())
}

/// Attach an external identity reference to an account.
///
/// Fails with `AlreadyExists` if another account already holds the reference.
pub async fn link_external_identity<'e, E>(executor: E, id: i64, external_ref: &str) -> Result<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query(
        r#"
        UPDATE accounts
        SET external_identity_ref = ?
        WHERE id = ?
        "#,
    )
    .bind(external_ref)
    .bind(id)
    .execute(executor)
    .await
    .map_err(|e| DatabaseError::from_insert(e, "External identity", external_ref))?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: "Account",
            id: id.to_string(),
        });
    }

    Ok(())
}

/// Replace the stored credential hash.
pub async fn update_credential_hash<'e, E>(executor: E, id: i64, hash: &str) -> Result<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query(
        r#"
        UPDATE accounts
        SET credential_hash = ?
        WHERE id = ?
        "#,
    )
    .bind(hash)
    .bind(id)
    .execute(executor)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: "Account",
            id: id.to_string(),
        });
    }

    Ok(())
}

/// Delete an account row.
///
/// Owned complaints must be removed first; the foreign key rejects the
/// delete otherwise.
pub async fn delete_account<'e, E>(executor: E, id: i64) -> Result<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query(
        r#"
        DELETE FROM accounts
        WHERE id = ?
        "#,
    )
    .bind(id)
    .execute(executor)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: "Account",
            id: id.to_string(),
        });
    }

    Ok(())
}

/// List every account, oldest first.
pub async fn list_accounts<'e, E>(executor: E) -> Result<Vec<AccountSummary>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let accounts = sqlx::query_as::<_, AccountSummary>(
        r#"
        SELECT id, display_name, email, phone, role,
               external_identity_ref IS NOT NULL AS external_linked,
               created_at
        FROM accounts
        ORDER BY id
        "#,
    )
    .fetch_all(executor)
    .await?;

    Ok(accounts)
}

/// List accounts holding one role, by display name.
pub async fn list_accounts_by_role<'e, E>(executor: E, role: Role) -> Result<Vec<AccountSummary>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let accounts = sqlx::query_as::<_, AccountSummary>(
        r#"
        SELECT id, display_name, email, phone, role,
               external_identity_ref IS NOT NULL AS external_linked,
               created_at
        FROM accounts
        WHERE role = ?
        ORDER BY display_name, id
        "#,
    )
    .bind(role)
    .fetch_all(executor)
    .await?;

    Ok(accounts)
}
