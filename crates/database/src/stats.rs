//! Dashboard projections.
//!
//! Each projection is a single statement, so it reads one snapshot of
//! the database even while other connections are writing.

use sqlx::{Executor, Sqlite};

use crate::error::Result;
use crate::models::{AdminSnapshot, ReporterCounts, WorkerCounts};

/// Totals for the complaints filed by one reporter.
pub async fn reporter_counts<'e, E>(executor: E, reporter_id: i64) -> Result<ReporterCounts>
where
    E: Executor<'e, Database = Sqlite>,
{
    let counts = sqlx::query_as::<_, ReporterCounts>(
        r#"
        SELECT COUNT(*) AS total,
               COALESCE(SUM(CASE WHEN status IN ('Accepted', 'In Progress') THEN 1 ELSE 0 END), 0) AS in_progress,
               COALESCE(SUM(CASE WHEN status = 'Completed' THEN 1 ELSE 0 END), 0) AS completed
        FROM complaints
        WHERE reporter_id = ?
        "#,
    )
    .bind(reporter_id)
    .fetch_one(executor)
    .await?;

    Ok(counts)
}

/// System-wide open count plus the worker's own completed count.
pub async fn worker_counts<'e, E>(executor: E, worker_id: i64) -> Result<WorkerCounts>
where
    E: Executor<'e, Database = Sqlite>,
{
    let counts = sqlx::query_as::<_, WorkerCounts>(
        r#"
        SELECT COALESCE(SUM(CASE WHEN status <> 'Completed' THEN 1 ELSE 0 END), 0) AS open,
               COALESCE(SUM(CASE WHEN status = 'Completed' AND assigned_worker_id = ? THEN 1 ELSE 0 END), 0) AS completed
        FROM complaints
        "#,
    )
    .bind(worker_id)
    .fetch_one(executor)
    .await?;

    Ok(counts)
}

/// System-wide totals for the admin view.
pub async fn admin_snapshot<'e, E>(executor: E) -> Result<AdminSnapshot>
where
    E: Executor<'e, Database = Sqlite>,
{
    let snapshot = sqlx::query_as::<_, AdminSnapshot>(
        r#"
        SELECT (SELECT COUNT(*) FROM complaints) AS total_complaints,
               (SELECT COUNT(*) FROM accounts WHERE role = 'user') AS total_users,
               (SELECT COUNT(*) FROM accounts WHERE role = 'worker') AS total_workers,
               (SELECT COUNT(*) FROM complaints WHERE status = 'Pending') AS pending,
               (SELECT COUNT(*) FROM complaints WHERE status IN ('Accepted', 'In Progress')) AS in_progress,
               (SELECT COUNT(*) FROM complaints WHERE status = 'Completed') AS completed
        "#,
    )
    .fetch_one(executor)
    .await?;

    Ok(snapshot)
}
