//! Database models.

use std::fmt;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Role of an account.
///
/// `Worker` is only ever assigned through explicit provisioning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Role {
    User,
    Worker,
    Admin,
}

impl Role {
    /// Stored and serialized name of the role.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Worker => "worker",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle status of a complaint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
pub enum ComplaintStatus {
    #[serde(rename = "Pending")]
    #[sqlx(rename = "Pending")]
    Pending,
    #[serde(rename = "Accepted")]
    #[sqlx(rename = "Accepted")]
    Accepted,
    #[serde(rename = "In Progress")]
    #[sqlx(rename = "In Progress")]
    InProgress,
    #[serde(rename = "Completed")]
    #[sqlx(rename = "Completed")]
    Completed,
}

impl ComplaintStatus {
    /// All statuses in lifecycle order.
    pub const ALL: [ComplaintStatus; 4] = [
        ComplaintStatus::Pending,
        ComplaintStatus::Accepted,
        ComplaintStatus::InProgress,
        ComplaintStatus::Completed,
    ];

    /// Stored name of the status (e.g. `"In Progress"`).
    pub fn as_str(&self) -> &'static str {
        match self {
            ComplaintStatus::Pending => "Pending",
            ComplaintStatus::Accepted => "Accepted",
            ComplaintStatus::InProgress => "In Progress",
            ComplaintStatus::Completed => "Completed",
        }
    }

    /// Parse a status name, ignoring case and surrounding whitespace.
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(value))
    }

    /// Whether the complaint still needs work (Pending, Accepted, In Progress).
    pub fn is_open(&self) -> bool {
        !matches!(self, ComplaintStatus::Completed)
    }
}

impl fmt::Display for ComplaintStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An account row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Account {
    /// Surrogate key.
    pub id: i64,
    /// Display name shown on complaints and in the session.
    pub display_name: String,
    /// Normalized (trimmed, lower-cased) email address.
    pub email: String,
    /// Optional phone number.
    pub phone: Option<String>,
    /// Argon2 PHC string, empty for pure external-identity accounts.
    #[serde(skip_serializing)]
    pub credential_hash: String,
    /// Account role.
    pub role: Role,
    /// Linked federated identity subject, if any.
    pub external_identity_ref: Option<String>,
    /// Creation timestamp.
    pub created_at: String,
}

impl Account {
    /// Whether a local password is stored for this account.
    pub fn has_credential(&self) -> bool {
        !self.credential_hash.is_empty()
    }

    /// Whether a federated identity is linked to this account.
    pub fn has_external_identity(&self) -> bool {
        self.external_identity_ref.is_some()
    }
}

/// Fields required to insert an account.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub display_name: String,
    /// Normalized on insert.
    pub email: String,
    pub phone: Option<String>,
    /// Empty when the account has no local password.
    pub credential_hash: String,
    pub role: Role,
    pub external_identity_ref: Option<String>,
}

/// Account listing entry for administrative views.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct AccountSummary {
    pub id: i64,
    pub display_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub role: Role,
    /// Whether a federated identity is linked.
    pub external_linked: bool,
    pub created_at: String,
}

/// A complaint row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Complaint {
    pub id: i64,
    /// Owning account.
    pub reporter_id: i64,
    /// Last worker to act on the complaint.
    pub assigned_worker_id: Option<i64>,
    pub description: String,
    /// Evidence reference, empty string when no photo was supplied.
    pub before_evidence_ref: String,
    /// Evidence reference recorded on completion.
    pub after_evidence_ref: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub status: ComplaintStatus,
    pub created_at: String,
    pub updated_at: String,
}

impl Complaint {
    /// Reported location, when both coordinates were given.
    pub fn location(&self) -> Option<Location> {
        match (self.latitude, self.longitude) {
            (Some(latitude), Some(longitude)) => Some(Location {
                latitude,
                longitude,
            }),
            _ => None,
        }
    }
}

/// A complaint joined with the reporter's display name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct ComplaintWithReporter {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub complaint: Complaint,
    /// Reporter display name.
    pub reporter: String,
}

/// Fields required to insert a complaint.
#[derive(Debug, Clone)]
pub struct NewComplaint {
    pub reporter_id: i64,
    pub description: String,
    pub before_evidence_ref: String,
    pub location: Option<Location>,
}

/// Latitude/longitude pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

/// Evidence references held by one complaint.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct EvidenceRefs {
    pub complaint_id: i64,
    pub before_evidence_ref: String,
    pub after_evidence_ref: Option<String>,
}

impl EvidenceRefs {
    /// Non-empty references in before/after order.
    pub fn references(&self) -> Vec<&str> {
        std::iter::once(self.before_evidence_ref.as_str())
            .chain(self.after_evidence_ref.as_deref())
            .filter(|r| !r.is_empty())
            .collect()
    }
}

/// Totals for one reporter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct ReporterCounts {
    pub total: i64,
    /// Accepted plus In Progress.
    pub in_progress: i64,
    pub completed: i64,
}

/// Totals for one worker.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct WorkerCounts {
    /// Open complaints across the whole system.
    pub open: i64,
    /// Complaints this worker completed.
    pub completed: i64,
}

/// System-wide totals for administrators.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct AdminSnapshot {
    pub total_complaints: i64,
    pub total_users: i64,
    pub total_workers: i64,
    pub pending: i64,
    /// Accepted plus In Progress.
    pub in_progress: i64,
    pub completed: i64,
}

/// Status restriction applied to complaint listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatusFilter {
    /// No restriction.
    #[default]
    All,
    /// Pending, Accepted, or In Progress.
    Open,
    /// Exactly one status.
    Only(ComplaintStatus),
}

impl StatusFilter {
    /// Whether a complaint with `status` passes the filter.
    pub fn matches(&self, status: ComplaintStatus) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Open => status.is_open(),
            StatusFilter::Only(only) => *only == status,
        }
    }
}
