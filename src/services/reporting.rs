//! Bug statistics reports.
//!
//! `Reporter` owns the store pools, the tracker client and the tracker caches.
//! Cross-project reports run the same filter against both configured
//! namespaces and merge the results:
//! - `bugs_ids` counts the union of bug ids, so a bug mirrored in both
//!   namespaces counts once
//! - `code_freeze_statistic` concatenates the per-namespace lists, so such a
//!   bug appears twice

use crate::config::ReportingConfig;
use crate::db::pool::DbPool;
use crate::db::{self, bugs, roster};
use crate::error::AppError;
use crate::models::bug::{BugRecord, RecencyFlag};
use crate::models::project::ProjectRecord;
use crate::models::report::{CodeFreezeReport, DedupCounts, ProjectStatistics, TeamFreezeReport};
use crate::models::status::{StatusGroup, CRITICAL, HIGH};
use crate::services::launchpad_client::LaunchpadClient;
use crate::services::query_builder::{BugFilter, BugSearch, TagMode};
use crate::services::tracker::BugTracker;
use crate::services::ttl_cache::TtlCache;
use std::collections::{BTreeSet, HashSet};
use std::time::Duration;

/// Report entry point.
pub struct Reporter<T> {
    /// Mirrored bug store.
    bugs: DbPool,

    /// Team roster store.
    assignees: DbPool,

    tracker: T,

    namespaces: [String; 2],

    projects: TtlCache<String, ProjectRecord>,

    all_bugs: TtlCache<String, Vec<BugRecord>>,
}

impl Reporter<LaunchpadClient> {
    /// Open both stores and build the Launchpad client described by `config`.
    pub async fn open(config: &ReportingConfig) -> Result<Self, AppError> {
        config.validate()?;

        let bugs = db::initialize(&config.bugs_db_path).await?;
        let assignees = if config.assignees_db_path == config.bugs_db_path {
            bugs.clone()
        } else {
            db::initialize(&config.assignees_db_path).await?
        };
        let tracker = LaunchpadClient::new(config.tracker.clone())?;

        Ok(Self::new(bugs, assignees, tracker, config))
    }
}

impl<T: BugTracker> Reporter<T> {
    /// Assemble a reporter from already opened parts.
    pub fn new(bugs: DbPool, assignees: DbPool, tracker: T, config: &ReportingConfig) -> Self {
        let ttl = Duration::from_secs(config.cache_ttl_secs);
        Self {
            bugs,
            assignees,
            tracker,
            namespaces: config.namespaces.clone(),
            projects: TtlCache::new(ttl),
            all_bugs: TtlCache::new(ttl),
        }
    }

    pub fn namespaces(&self) -> &[String; 2] {
        &self.namespaces
    }

    /// Close both store pools.
    pub async fn close(self) {
        self.bugs.close().await;
        self.assignees.close().await;
        log::info!("Reporter closed");
    }

    // ============================================================
    // CACHED TRACKER ACCESSORS
    // ============================================================

    /// Look up a tracker project, reusing a lookup younger than the cache TTL.
    pub async fn get_project(&self, name: &str) -> Result<ProjectRecord, AppError> {
        self.projects
            .get_or_try_fetch(name.to_string(), || self.tracker.fetch_project(name))
            .await
    }

    /// Every task of `project` in the All group targeted at one of its active
    /// milestones, reusing a listing younger than the cache TTL.
    pub async fn get_all_bugs(&self, project: &ProjectRecord) -> Result<Vec<BugRecord>, AppError> {
        self.all_bugs
            .get_or_try_fetch(project.name.clone(), || async move {
                let statuses = StatusGroup::All.statuses();
                let milestones = project.active_milestone_links();
                self.tracker
                    .search_tasks(project, &statuses, &milestones)
                    .await
            })
            .await
    }

    // ============================================================
    // STORE REPORTS
    // ============================================================

    /// Bugs of one namespace matching a search.
    pub async fn get_bugs(
        &self,
        project: &str,
        search: &BugSearch,
    ) -> Result<Vec<BugRecord>, AppError> {
        bugs::find_bugs(&self.bugs, project, &search.to_filter()).await
    }

    /// Bug ids matching `search` in either namespace, without duplicates.
    async fn ids_across_namespaces(&self, search: &BugSearch) -> Result<HashSet<i64>, AppError> {
        let mut ids = HashSet::new();
        for namespace in &self.namespaces {
            let found = self.get_bugs(namespace, search).await?;
            ids.extend(found.iter().map(|bug| bug.id));
        }
        Ok(ids)
    }

    /// Done / total / high counts across both namespaces; a bug present in
    /// both namespaces is counted once in each metric.
    pub async fn bugs_ids(
        &self,
        tag: Option<&str>,
        milestone: Option<&str>,
    ) -> Result<DedupCounts, AppError> {
        let search = |group: StatusGroup| {
            BugSearch::in_group(group)
                .milestone(milestone)
                .tags(tag, TagMode::Include)
        };

        let done = self.ids_across_namespaces(&search(StatusGroup::Closed)).await?;
        let total = self.ids_across_namespaces(&search(StatusGroup::All)).await?;
        let high = self
            .ids_across_namespaces(&search(StatusGroup::NotDone).importance([CRITICAL, HIGH]))
            .await?;

        Ok(DedupCounts {
            done: done.len(),
            total: total.len(),
            high: high.len(),
        })
    }

    /// Seven independent counts for one namespace restricted to `milestones`,
    /// and to `tag` when given.
    pub async fn common_statistic_for_project(
        &self,
        project: &str,
        milestones: &[String],
        tag: Option<&str>,
    ) -> Result<ProjectStatistics, AppError> {
        if milestones.is_empty() {
            log::warn!("Statistics for {} requested with no milestones", project);
        }

        let base = || {
            BugFilter::new()
                .milestone_in(milestones.iter().cloned())
                .tags(tag, TagMode::Include)
        };
        let count = move |filter: BugFilter| async move {
            bugs::count_bugs(&self.bugs, project, &filter).await
        };

        let stats = ProjectStatistics {
            total: count(base()).await?,
            critical: count(
                base()
                    .status_group(StatusGroup::NotDone)
                    .importance(CRITICAL),
            )
            .await?,
            unresolved: count(base().status_group(StatusGroup::NotDone)).await?,
            new_for_week: count(base().flag_set(RecencyFlag::CreatedWithinWeek)).await?,
            fixed_for_week: count(base().flag_set(RecencyFlag::FixedWithinWeek)).await?,
            new_for_month: count(base().flag_set(RecencyFlag::CreatedWithinMonth)).await?,
            fixed_for_month: count(base().flag_set(RecencyFlag::FixedWithinMonth)).await?,
        };

        log::info!(
            "Statistics for {} {:?}: {} total, {} unresolved",
            project,
            milestones,
            stats.total,
            stats.unresolved
        );
        Ok(stats)
    }

    /// High and Critical NotDone bugs per team during a code freeze.
    ///
    /// Bugs from both namespaces are concatenated, not deduplicated.
    pub async fn code_freeze_statistic(
        &self,
        milestones: &[String],
        teams: &[String],
        exclude_tags: &[String],
    ) -> Result<CodeFreezeReport, AppError> {
        let mut report = CodeFreezeReport::new();

        for team in teams {
            if report.contains_key(team) {
                continue;
            }

            let roster = roster::get_team_roster(&self.assignees, team).await?;
            if roster.is_empty() {
                log::warn!("Team {} has no roster members", team);
            }

            let filter = BugFilter::new()
                .status_group(StatusGroup::NotDone)
                .milestone_in(milestones.iter().cloned())
                .tags(exclude_tags.iter().cloned(), TagMode::Exclude)
                .importance_in([HIGH, CRITICAL])
                .assignee_in(roster.members.iter().cloned());

            let mut team_bugs = Vec::new();
            for namespace in &self.namespaces {
                team_bugs.extend(bugs::find_bugs(&self.bugs, namespace, &filter).await?);
            }

            report.insert(team.clone(), TeamFreezeReport::new(team_bugs));
        }

        log::info!("Code freeze report built for {} team(s)", report.len());
        Ok(report)
    }
}

/// Milestones present in both lists, sorted and without duplicates.
pub fn common_milestone(a: &[String], b: &[String]) -> Vec<String> {
    let a: BTreeSet<&String> = a.iter().collect();
    let b: BTreeSet<&String> = b.iter().collect();
    a.intersection(&b).map(|m| (*m).clone()).collect()
}
