//! Complaint lifecycle engine.
//!
//! `Pending -> {Accepted, In Progress} -> Completed`. Workers may move a
//! complaint between `Accepted` and `In Progress` freely and the last
//! worker to act becomes the assignee. Only the move into `Completed` is
//! gated (it needs an after photo), and `Completed` is terminal.

use std::sync::Arc;

use database::{
    account, complaint, Complaint, ComplaintStatus, ComplaintWithReporter, Database, Location,
    NewComplaint, Role, StatusFilter,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{CoreError, Result};
use crate::evidence::{present, release, store_upload, EvidenceStore, EvidenceUpload};

/// Statuses a worker may set without evidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClaimStatus {
    #[serde(rename = "Accepted")]
    Accepted,
    #[serde(rename = "In Progress")]
    InProgress,
}

impl ClaimStatus {
    /// Parse `Accepted` or `In Progress`, ignoring case and surrounding whitespace.
    pub fn parse(value: &str) -> Option<Self> {
        ComplaintStatus::parse(value).and_then(|status| Self::try_from(status).ok())
    }
}

impl From<ClaimStatus> for ComplaintStatus {
    fn from(status: ClaimStatus) -> Self {
        match status {
            ClaimStatus::Accepted => ComplaintStatus::Accepted,
            ClaimStatus::InProgress => ComplaintStatus::InProgress,
        }
    }
}

impl TryFrom<ComplaintStatus> for ClaimStatus {
    type Error = ComplaintStatus;

    fn try_from(status: ComplaintStatus) -> std::result::Result<Self, Self::Error> {
        match status {
            ComplaintStatus::Accepted => Ok(ClaimStatus::Accepted),
            ComplaintStatus::InProgress => Ok(ClaimStatus::InProgress),
            ComplaintStatus::Pending | ComplaintStatus::Completed => Err(status),
        }
    }
}

/// Interpret a "my complaints" status filter.
///
/// `pending` and `open` both mean the whole open set; any other value
/// must name a status exactly (case-insensitive). `None` means the value
/// names nothing, which matches no complaint.
pub fn reporter_filter(value: Option<&str>) -> Option<StatusFilter> {
    let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) else {
        return Some(StatusFilter::All);
    };

    match value.to_ascii_lowercase().as_str() {
        "pending" | "open" => Some(StatusFilter::Open),
        _ => ComplaintStatus::parse(value).map(StatusFilter::Only),
    }
}

/// Interpret a public-report status filter: a single exact status.
pub fn report_filter(value: Option<&str>) -> Option<StatusFilter> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        None => Some(StatusFilter::All),
        Some(value) => ComplaintStatus::parse(value).map(StatusFilter::Only),
    }
}

/// Error for a complaint that changed between read and conditional update.
fn stale(complaint_id: i64) -> CoreError {
    // With the actor still a worker, the conditional update only misses
    // when the row was completed in the meantime.
    CoreError::InvalidTransition {
        complaint_id,
        from: ComplaintStatus::Completed,
    }
}

/// A new complaint as submitted by a reporter.
#[derive(Debug, Clone, Default)]
pub struct Submission {
    pub description: String,
    pub before_evidence: Option<EvidenceUpload>,
    pub location: Option<Location>,
}

/// Complaint state machine and queries.
#[derive(Clone)]
pub struct ComplaintEngine {
    db: Database,
    evidence: Arc<dyn EvidenceStore>,
}

impl ComplaintEngine {
    pub fn new(db: Database, evidence: Arc<dyn EvidenceStore>) -> Self {
        Self { db, evidence }
    }

    async fn require_role(&self, account_id: i64, role: Role, action: &'static str) -> Result<()> {
        match account::get_account(self.db.pool(), account_id).await {
            Ok(account) if account.role == role => Ok(()),
            Ok(_) | Err(database::DatabaseError::NotFound { .. }) => {
                Err(CoreError::Unauthorized { action })
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Explain a guarded update that touched no row: the actor stopped
    /// being a worker, or the complaint reached `Completed` meanwhile.
    async fn refused(&self, worker_id: i64, complaint_id: i64, action: &'static str) -> CoreError {
        match self.require_role(worker_id, Role::Worker, action).await {
            Ok(()) => stale(complaint_id),
            Err(err) => err,
        }
    }

    /// Undo an evidence write after the store mutation failed.
    async fn rollback_evidence(&self, reference: Option<&str>) {
        if let Some(reference) = reference {
            if release(self.evidence.as_ref(), reference).await {
                warn!(reference = %reference, "Rolled back evidence after failed update");
            }
        }
    }

    /// File a complaint in `Pending` with no assignee.
    ///
    /// Without a photo the before reference is the empty string.
    pub async fn submit(&self, reporter_id: i64, submission: Submission) -> Result<Complaint> {
        let description = submission.description.trim();
        if description.is_empty() {
            return Err(CoreError::MissingDescription);
        }
        self.require_role(reporter_id, Role::User, "submit complaints")
            .await?;

        let before = present(submission.before_evidence);
        if let Some(upload) = &before {
            upload.check_image()?;
        }

        let before_ref = match &before {
            Some(upload) => Some(store_upload(self.evidence.as_ref(), "before", upload).await?),
            None => None,
        };

        let inserted = complaint::insert_complaint(
            self.db.pool(),
            &NewComplaint {
                reporter_id,
                description: description.to_string(),
                before_evidence_ref: before_ref.clone().unwrap_or_default(),
                location: submission.location,
            },
        )
        .await;

        match inserted {
            Ok(created) => {
                info!(
                    complaint_id = created.id,
                    reporter_id,
                    with_photo = before_ref.is_some(),
                    "Complaint submitted"
                );
                Ok(created)
            }
            Err(err) => {
                self.rollback_evidence(before_ref.as_deref()).await;
                Err(err.into())
            }
        }
    }

    /// Set `Accepted` or `In Progress` and make `worker_id` the assignee.
    ///
    /// Concurrent claims are last-writer-wins. The worker check is repeated
    /// inside the update, so a worker removed in between is never assigned.
    pub async fn claim_or_update(
        &self,
        worker_id: i64,
        complaint_id: i64,
        status: ClaimStatus,
    ) -> Result<Complaint> {
        self.require_role(worker_id, Role::Worker, "update complaints")
            .await?;

        let current = complaint::get_complaint(self.db.pool(), complaint_id).await?;
        if current.status == ComplaintStatus::Completed {
            return Err(CoreError::InvalidTransition {
                complaint_id,
                from: current.status,
            });
        }

        let Some(updated) =
            complaint::update_status(self.db.pool(), complaint_id, worker_id, status.into()).await?
        else {
            return Err(self.refused(worker_id, complaint_id, "update complaints").await);
        };

        info!(
            complaint_id,
            worker_id,
            from = %current.status,
            to = %updated.status,
            "Complaint status updated"
        );
        Ok(updated)
    }

    /// Move a complaint to `Completed` with its after photo.
    ///
    /// A missing or blank photo fails with `MissingAfterEvidence` and
    /// leaves the complaint untouched.
    pub async fn complete(
        &self,
        worker_id: i64,
        complaint_id: i64,
        after_evidence: Option<EvidenceUpload>,
    ) -> Result<Complaint> {
        self.require_role(worker_id, Role::Worker, "complete complaints")
            .await?;

        let current = complaint::get_complaint(self.db.pool(), complaint_id).await?;
        let Some(upload) = present(after_evidence) else {
            return Err(CoreError::MissingAfterEvidence);
        };
        if current.status == ComplaintStatus::Completed {
            return Err(CoreError::InvalidTransition {
                complaint_id,
                from: current.status,
            });
        }

        let after_ref = store_upload(self.evidence.as_ref(), "after", &upload).await?;

        let updated = match complaint::mark_completed(self.db.pool(), complaint_id, worker_id, &after_ref).await {
            Ok(Some(updated)) => updated,
            Ok(None) => {
                self.rollback_evidence(Some(&after_ref)).await;
                return Err(self.refused(worker_id, complaint_id, "complete complaints").await);
            }
            Err(err) => {
                self.rollback_evidence(Some(&after_ref)).await;
                return Err(err.into());
            }
        };

        info!(complaint_id, worker_id, "Complaint completed");
        Ok(updated)
    }

    /// One complaint with its reporter's name.
    pub async fn detail(&self, complaint_id: i64) -> Result<ComplaintWithReporter> {
        Ok(complaint::get_complaint_with_reporter(self.db.pool(), complaint_id).await?)
    }

    /// Complaints filed by `reporter_id`, newest first. See [`reporter_filter`].
    pub async fn my_complaints(&self, reporter_id: i64, status: Option<&str>) -> Result<Vec<Complaint>> {
        match reporter_filter(status) {
            Some(filter) => Ok(complaint::list_by_reporter(self.db.pool(), reporter_id, filter).await?),
            None => Ok(Vec::new()),
        }
    }

    /// Every complaint, newest first, optionally restricted to one status.
    pub async fn public_reports(&self, status: Option<&str>) -> Result<Vec<ComplaintWithReporter>> {
        match report_filter(status) {
            Some(filter) => Ok(complaint::list_reports(self.db.pool(), filter).await?),
            None => Ok(Vec::new()),
        }
    }

    /// The open set, oldest first.
    pub async fn open_queue(&self) -> Result<Vec<ComplaintWithReporter>> {
        Ok(complaint::list_open(self.db.pool()).await?)
    }

    /// Complaints completed by `worker_id`, most recent first.
    pub async fn completed_by(&self, worker_id: i64) -> Result<Vec<ComplaintWithReporter>> {
        Ok(complaint::list_completed_by_worker(self.db.pool(), worker_id).await?)
    }
}
