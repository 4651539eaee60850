//! Seam between the reports and the remote bug tracker.

use crate::error::AppError;
use crate::models::bug::BugRecord;
use crate::models::project::ProjectRecord;
use std::future::Future;

/// Remote bug tracker operations the reports rely on.
pub trait BugTracker {
    /// Look up a project together with its milestone lists.
    fn fetch_project(
        &self,
        name: &str,
    ) -> impl Future<Output = Result<ProjectRecord, AppError>> + Send;

    /// Tasks of `project` whose status is one of `statuses` and that target
    /// one of `milestone_links`.
    fn search_tasks(
        &self,
        project: &ProjectRecord,
        statuses: &[String],
        milestone_links: &[String],
    ) -> impl Future<Output = Result<Vec<BugRecord>, AppError>> + Send;
}
