//! Read-only dashboard projections.
//!
//! Each projection is one SQL statement, so counts never mix pre- and
//! post-transition state for the same complaint.

use database::{stats, AdminSnapshot, Database, ReporterCounts, Role, WorkerCounts};
use serde::Serialize;

use crate::error::{CoreError, Result};
use crate::session::SessionRecord;

/// The dashboard a session lands on, chosen by role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum DashboardView {
    Reporter(ReporterCounts),
    Worker(WorkerCounts),
    Admin(AdminSnapshot),
}

/// Dashboard aggregator.
#[derive(Debug, Clone)]
pub struct Dashboard {
    db: Database,
}

impl Dashboard {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn reporter(&self, reporter_id: i64) -> Result<ReporterCounts> {
        Ok(stats::reporter_counts(self.db.pool(), reporter_id).await?)
    }

    pub async fn worker(&self, worker_id: i64) -> Result<WorkerCounts> {
        Ok(stats::worker_counts(self.db.pool(), worker_id).await?)
    }

    /// System-wide snapshot. Admin only.
    pub async fn admin(&self, actor_role: Role) -> Result<AdminSnapshot> {
        if actor_role != Role::Admin {
            return Err(CoreError::Unauthorized {
                action: "view the admin snapshot",
            });
        }
        Ok(stats::admin_snapshot(self.db.pool()).await?)
    }

    /// Projection for the session's role.
    pub async fn for_session(&self, session: &SessionRecord) -> Result<DashboardView> {
        Ok(match session.role {
            Role::User => DashboardView::Reporter(self.reporter(session.account_id).await?),
            Role::Worker => DashboardView::Worker(self.worker(session.account_id).await?),
            Role::Admin => DashboardView::Admin(self.admin(session.role).await?),
        })
    }
}
