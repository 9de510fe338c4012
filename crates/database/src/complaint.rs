//! Complaint store operations.

use sqlx::{Executor, QueryBuilder, Sqlite};

use crate::error::{DatabaseError, Result};
use crate::models::{
    Complaint, ComplaintStatus, ComplaintWithReporter, EvidenceRefs, NewComplaint, Role,
    StatusFilter,
};

/// Append the filter as an `AND` clause on `column`.
fn push_status_filter(query: &mut QueryBuilder<'_, Sqlite>, column: &str, filter: StatusFilter) {
    match filter {
        StatusFilter::All => {}
        StatusFilter::Open => {
            query.push(format!(" AND {} <> ", column));
            query.push_bind(ComplaintStatus::Completed);
        }
        StatusFilter::Only(status) => {
            query.push(format!(" AND {} = ", column));
            query.push_bind(status);
        }
    }
}

/// Insert a complaint in `Pending` with no assigned worker.
pub async fn insert_complaint<'e, E>(executor: E, complaint: &NewComplaint) -> Result<Complaint>
where
    E: Executor<'e, Database = Sqlite>,
{
    let (latitude, longitude) = match complaint.location {
        Some(location) => (Some(location.latitude), Some(location.longitude)),
        None => (None, None),
    };

    let created = sqlx::query_as::<_, Complaint>(
        r#"
        INSERT INTO complaints (reporter_id, description, before_evidence_ref, latitude, longitude, status)
        VALUES (?, ?, ?, ?, ?, ?)
        RETURNING id, reporter_id, assigned_worker_id, description, before_evidence_ref,
                  after_evidence_ref, latitude, longitude, status, created_at, updated_at
        "#,
    )
    .bind(complaint.reporter_id)
    .bind(&complaint.description)
    .bind(&complaint.before_evidence_ref)
    .bind(latitude)
    .bind(longitude)
    .bind(ComplaintStatus::Pending)
    .fetch_one(executor)
    .await?;

    Ok(created)
}

/// Get a complaint by ID.
pub async fn get_complaint<'e, E>(executor: E, id: i64) -> Result<Complaint>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, Complaint>(
        r#"
        SELECT id, reporter_id, assigned_worker_id, description, before_evidence_ref,
               after_evidence_ref, latitude, longitude, status, created_at, updated_at
        FROM complaints
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(executor)
    .await?
    .ok_or_else(|| DatabaseError::NotFound {
        entity: "Complaint",
        id: id.to_string(),
    })
}

/// Get a complaint together with its reporter's display name.
pub async fn get_complaint_with_reporter<'e, E>(executor: E, id: i64) -> Result<ComplaintWithReporter>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, ComplaintWithReporter>(
        r#"
        SELECT c.id, c.reporter_id, c.assigned_worker_id, c.description, c.before_evidence_ref,
               c.after_evidence_ref, c.latitude, c.longitude, c.status, c.created_at, c.updated_at,
               a.display_name AS reporter
        FROM complaints c
        INNER JOIN accounts a ON a.id = c.reporter_id
        WHERE c.id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(executor)
    .await?
    .ok_or_else(|| DatabaseError::NotFound {
        entity: "Complaint",
        id: id.to_string(),
    })
}

/// Set a non-terminal status and record the acting worker.
///
/// Returns `None` when the complaint does not exist, is already
/// `Completed`, or `worker_id` is no longer a worker account. The role
/// check is part of the same statement, so a worker removed concurrently
/// is never assigned.
pub async fn update_status<'e, E>(
    executor: E,
    id: i64,
    worker_id: i64,
    status: ComplaintStatus,
) -> Result<Option<Complaint>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let updated = sqlx::query_as::<_, Complaint>(
        r#"
        UPDATE complaints
        SET status = ?, assigned_worker_id = ?, updated_at = datetime('now')
        WHERE id = ? AND status <> ?
          AND EXISTS (SELECT 1 FROM accounts WHERE id = ? AND role = ?)
        RETURNING id, reporter_id, assigned_worker_id, description, before_evidence_ref,
                  after_evidence_ref, latitude, longitude, status, created_at, updated_at
        "#,
    )
    .bind(status)
    .bind(worker_id)
    .bind(id)
    .bind(ComplaintStatus::Completed)
    .bind(worker_id)
    .bind(Role::Worker)
    .fetch_optional(executor)
    .await?;

    Ok(updated)
}

/// Move a complaint to `Completed` with its after-evidence.
///
/// Returns `None` when the complaint does not exist, is already `Completed`,
/// or `worker_id` is no longer a worker account.
pub async fn mark_completed<'e, E>(
    executor: E,
    id: i64,
    worker_id: i64,
    after_evidence_ref: &str,
) -> Result<Option<Complaint>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let updated = sqlx::query_as::<_, Complaint>(
        r#"
        UPDATE complaints
        SET status = ?, after_evidence_ref = ?, assigned_worker_id = ?, updated_at = datetime('now')
        WHERE id = ? AND status <> ?
          AND EXISTS (SELECT 1 FROM accounts WHERE id = ? AND role = ?)
        RETURNING id, reporter_id, assigned_worker_id, description, before_evidence_ref,
                  after_evidence_ref, latitude, longitude, status, created_at, updated_at
        "#,
    )
    .bind(ComplaintStatus::Completed)
    .bind(after_evidence_ref)
    .bind(worker_id)
    .bind(id)
    .bind(ComplaintStatus::Completed)
    .bind(worker_id)
    .bind(Role::Worker)
    .fetch_optional(executor)
    .await?;

    Ok(updated)
}

/// Complaints filed by one reporter, newest first.
pub async fn list_by_reporter<'e, E>(
    executor: E,
    reporter_id: i64,
    filter: StatusFilter,
) -> Result<Vec<Complaint>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let mut query = QueryBuilder::<Sqlite>::new(
        r#"
        SELECT id, reporter_id, assigned_worker_id, description, before_evidence_ref,
               after_evidence_ref, latitude, longitude, status, created_at, updated_at
        FROM complaints
        WHERE reporter_id = "#,
    );
    query.push_bind(reporter_id);
    push_status_filter(&mut query, "status", filter);
    query.push(" ORDER BY created_at DESC, id DESC");

    let complaints = query
        .build_query_as::<Complaint>()
        .fetch_all(executor)
        .await?;

    Ok(complaints)
}

/// All complaints with reporter names, newest first.
pub async fn list_reports<'e, E>(executor: E, filter: StatusFilter) -> Result<Vec<ComplaintWithReporter>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let mut query = QueryBuilder::<Sqlite>::new(
        r#"
        SELECT c.id, c.reporter_id, c.assigned_worker_id, c.description, c.before_evidence_ref,
               c.after_evidence_ref, c.latitude, c.longitude, c.status, c.created_at, c.updated_at,
               a.display_name AS reporter
        FROM complaints c
        INNER JOIN accounts a ON a.id = c.reporter_id
        WHERE 1 = 1"#,
    );
    push_status_filter(&mut query, "c.status", filter);
    query.push(" ORDER BY c.created_at DESC, c.id DESC");

    let reports = query
        .build_query_as::<ComplaintWithReporter>()
        .fetch_all(executor)
        .await?;

    Ok(reports)
}

/// Open complaints for the worker queue, oldest first.
pub async fn list_open<'e, E>(executor: E) -> Result<Vec<ComplaintWithReporter>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let complaints = sqlx::query_as::<_, ComplaintWithReporter>(
        r#"
        SELECT c.id, c.reporter_id, c.assigned_worker_id, c.description, c.before_evidence_ref,
               c.after_evidence_ref, c.latitude, c.longitude, c.status, c.created_at, c.updated_at,
               a.display_name AS reporter
        FROM complaints c
        INNER JOIN accounts a ON a.id = c.reporter_id
        WHERE c.status <> ?
        ORDER BY c.created_at ASC, c.id ASC
        "#,
    )
    .bind(ComplaintStatus::Completed)
    .fetch_all(executor)
    .await?;

    Ok(complaints)
}

/// Complaints a worker completed, most recently updated first.
pub async fn list_completed_by_worker<'e, E>(
    executor: E,
    worker_id: i64,
) -> Result<Vec<ComplaintWithReporter>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let complaints = sqlx::query_as::<_, ComplaintWithReporter>(
        r#"
        SELECT c.id, c.reporter_id, c.assigned_worker_id, c.description, c.before_evidence_ref,
               c.after_evidence_ref, c.latitude, c.longitude, c.status, c.created_at, c.updated_at,
               a.display_name AS reporter
        FROM complaints c
        INNER JOIN accounts a ON a.id = c.reporter_id
        WHERE c.status = ? AND c.assigned_worker_id = ?
        ORDER BY c.updated_at DESC, c.id DESC
        "#,
    )
    .bind(ComplaintStatus::Completed)
    .bind(worker_id)
    .fetch_all(executor)
    .await?;

    Ok(complaints)
}

/// Count complaints assigned to a worker that are not yet `Completed`.
pub async fn count_active_for_worker<'e, E>(executor: E, worker_id: i64) -> Result<i64>
where
    E: Executor<'e, Database = Sqlite>,
{
    let count = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*)
        FROM complaints
        WHERE assigned_worker_id = ? AND status <> ?
        "#,
    )
    .bind(worker_id)
    .bind(ComplaintStatus::Completed)
    .fetch_one(executor)
    .await?;

    Ok(count)
}

/// Evidence references of every complaint filed by a reporter.
pub async fn evidence_for_reporter<'e, E>(executor: E, reporter_id: i64) -> Result<Vec<EvidenceRefs>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let refs = sqlx::query_as::<_, EvidenceRefs>(
        r#"
        SELECT id AS complaint_id, before_evidence_ref, after_evidence_ref
        FROM complaints
        WHERE reporter_id = ?
        ORDER BY id
        "#,
    )
    .bind(reporter_id)
    .fetch_all(executor)
    .await?;

    Ok(refs)
}

/// Delete every complaint filed by a reporter, returning how many went.
pub async fn delete_by_reporter<'e, E>(executor: E, reporter_id: i64) -> Result<u64>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query(
        r#"
        DELETE FROM complaints
        WHERE reporter_id = ?
        "#,
    )
    .bind(reporter_id)
    .execute(executor)
    .await?;

    Ok(result.rows_affected())
}
