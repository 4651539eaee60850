//! End-to-end report workflow.
//!
//! Seeds a bug store with the two namespaces the reports merge, a roster
//! store with two teams, and drives every report through `Reporter` backed by
//! a counting in-memory tracker.

use bug_reporting::db::bugs::upsert_bug;
use bug_reporting::db::roster::add_roster;
use bug_reporting::db::{self, pool::DbPool};
use bug_reporting::models::bug::RecencyFlags;
use bug_reporting::models::project::MilestoneRef;
use bug_reporting::{
    AppError, BugRecord, BugSearch, BugTracker, ProjectRecord, Reporter, ReportingConfig,
    StatusGroup, TagMode,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::{tempdir, TempDir};

/// Tracker double that counts every remote call.
#[derive(Clone, Default)]
struct FakeTracker {
    project_calls: Arc<AtomicUsize>,
    search_calls: Arc<AtomicUsize>,
}

impl BugTracker for FakeTracker {
    async fn fetch_project(&self, name: &str) -> Result<ProjectRecord, AppError> {
        self.project_calls.fetch_add(1, Ordering::SeqCst);
        if name != "fuel" {
            return Err(AppError::not_found_with_id("project", name));
        }
        let milestone = |name: &str, is_active: bool| MilestoneRef {
            name: name.to_string(),
            self_link: format!("https://api.launchpad.net/1.0/fuel/+milestone/{}", name),
            is_active,
        };
        Ok(ProjectRecord {
            name: "fuel".to_string(),
            display_name: "Fuel for OpenStack".to_string(),
            self_link: "https://api.launchpad.net/1.0/fuel".to_string(),
            milestones: vec![milestone("5.1", false), milestone("6.0", true)],
            active_milestones: vec![milestone("6.0", true)],
        })
    }

    async fn search_tasks(
        &self,
        _project: &ProjectRecord,
        statuses: &[String],
        milestone_links: &[String],
    ) -> Result<Vec<BugRecord>, AppError> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        assert_eq!(statuses.len(), StatusGroup::All.members().len());
        assert_eq!(milestone_links.len(), 1);
        Ok(vec![BugRecord::new(42, "New", "High").with_milestone("6.0")])
    }
}

fn week_old() -> RecencyFlags {
    RecencyFlags {
        created_within_week: Some(true),
        fixed_within_week: Some(false),
        created_within_month: Some(true),
        fixed_within_month: None,
    }
}

fn fixed_this_month() -> RecencyFlags {
    RecencyFlags {
        created_within_week: Some(false),
        fixed_within_week: Some(false),
        created_within_month: Some(false),
        fixed_within_month: Some(true),
    }
}

/// Populate both namespaces and the rosters.
///
/// fuel: 1 New/High/6.0 (alice, tag ui, new this week)
///       2 Fix Released/Critical/6.0 (bob, fixed this month)
///       3 Confirmed/Critical/6.0 (bob, tags docs)
///       4 In Progress/Medium/5.1 (alice)
/// mos:  1 New/High/6.0 (alice) - mirror of fuel 1
///       7 Triaged/High/6.0 (carol, tag ui)
///       8 Won't Fix/Low/6.0
async fn seed(pool: &DbPool) {
    let fuel = [
        BugRecord::new(1, "New", "High")
            .with_milestone("6.0")
            .with_tags(["ui"])
            .with_assignee("alice")
            .with_recency(week_old()),
        BugRecord::new(2, "Fix Released", "Critical")
            .with_milestone("6.0")
            .with_assignee("bob")
            .with_recency(fixed_this_month()),
        BugRecord::new(3, "Confirmed", "Critical")
            .with_milestone("6.0")
            .with_tags(["docs"])
            .with_assignee("bob"),
        BugRecord::new(4, "In Progress", "Medium")
            .with_milestone("5.1")
            .with_assignee("alice"),
    ];
    let mos = [
        BugRecord::new(1, "New", "High")
            .with_milestone("6.0")
            .with_assignee("alice"),
        BugRecord::new(7, "Triaged", "High")
            .with_milestone("6.0")
            .with_tags(["ui"])
            .with_assignee("carol"),
        BugRecord::new(8, "Won't Fix", "Low").with_milestone("6.0"),
    ];

    for bug in &fuel {
        upsert_bug(pool, "fuel", bug).await.unwrap();
    }
    for bug in &mos {
        upsert_bug(pool, "mos", bug).await.unwrap();
    }

    add_roster(pool, "core", &["alice".to_string()]).await.unwrap();
    add_roster(pool, "core", &["bob".to_string()]).await.unwrap();
    add_roster(pool, "ui", &["carol".to_string()]).await.unwrap();
}

async fn setup(cache_ttl_secs: u64) -> (TempDir, Reporter<FakeTracker>, FakeTracker) {
    let dir = tempdir().unwrap();
    let pool = db::initialize(&dir.path().join("reports.db")).await.unwrap();
    seed(&pool).await;

    let config = ReportingConfig {
        cache_ttl_secs,
        ..ReportingConfig::default()
    };
    let tracker = FakeTracker::default();
    let reporter = Reporter::new(pool.clone(), pool, tracker.clone(), &config);
    (dir, reporter, tracker)
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

fn ids(bugs: &[BugRecord]) -> Vec<i64> {
    bugs.iter().map(|b| b.id).collect()
}

#[tokio::test]
async fn test_get_bugs_by_group() {
    let (_dir, reporter, _) = setup(300).await;

    let not_done = reporter
        .get_bugs("fuel", &BugSearch::in_group(StatusGroup::NotDone))
        .await
        .unwrap();
    assert_eq!(ids(&not_done), vec![1, 3, 4]);

    let closed = reporter
        .get_bugs("mos", &BugSearch::in_group(StatusGroup::Closed))
        .await
        .unwrap();
    assert_eq!(ids(&closed), vec![8]);
}

#[tokio::test]
async fn test_empty_tag_list_is_no_restriction() {
    let (_dir, reporter, _) = setup(300).await;

    let plain = BugSearch::in_group(StatusGroup::All).milestone(Some("6.0"));
    let with_empty_tags = plain.clone().tags(Vec::<String>::new(), TagMode::Include);

    let a = reporter.get_bugs("fuel", &plain).await.unwrap();
    let b = reporter.get_bugs("fuel", &with_empty_tags).await.unwrap();
    assert_eq!(ids(&a), vec![1, 2, 3]);
    assert_eq!(a, b);
}

#[tokio::test]
async fn test_tag_include_and_exclude() {
    let (_dir, reporter, _) = setup(300).await;

    let included = reporter
        .get_bugs(
            "fuel",
            &BugSearch::in_group(StatusGroup::All).tags(["ui", "docs"], TagMode::Include),
        )
        .await
        .unwrap();
    assert_eq!(ids(&included), vec![1, 3]);

    let excluded = reporter
        .get_bugs(
            "fuel",
            &BugSearch::in_group(StatusGroup::All).tags(["ui"], TagMode::Exclude),
        )
        .await
        .unwrap();
    assert_eq!(ids(&excluded), vec![2, 3, 4]);
}

#[tokio::test]
async fn test_bugs_ids_deduplicates_across_namespaces() {
    let (_dir, reporter, _) = setup(300).await;

    let counts = reporter.bugs_ids(None, Some("6.0")).await.unwrap();
    // fuel {1,2,3} + mos {1,7,8}
    assert_eq!(counts.total, 5);
    // fuel 2 Fix Released, mos 8 Won't Fix
    assert_eq!(counts.done, 2);
    // NotDone High/Critical: 1 (both), 3, 7
    assert_eq!(counts.high, 3);
}

#[tokio::test]
async fn test_bugs_ids_with_tag() {
    let (_dir, reporter, _) = setup(300).await;

    let counts = reporter.bugs_ids(Some("ui"), None).await.unwrap();
    assert_eq!(counts.total, 2);
    assert_eq!(counts.done, 0);
    assert_eq!(counts.high, 2);

    let none = reporter.bugs_ids(Some("missing"), None).await.unwrap();
    assert_eq!((none.done, none.total, none.high), (0, 0, 0));
}

#[tokio::test]
async fn test_blank_tag_and_milestone_are_no_filter() {
    let (_dir, reporter, _) = setup(300).await;

    let unfiltered = reporter.bugs_ids(None, None).await.unwrap();
    let blank = reporter.bugs_ids(Some(""), Some("")).await.unwrap();
    assert_eq!(blank, unfiltered);
    assert_eq!(unfiltered.total, 6);

    let stats = reporter
        .common_statistic_for_project("fuel", &strings(&["6.0"]), Some(""))
        .await
        .unwrap();
    assert_eq!(stats.total, 3);
}

#[tokio::test]
async fn test_common_statistic_for_project() {
    let (_dir, reporter, _) = setup(300).await;

    let stats = reporter
        .common_statistic_for_project("fuel", &strings(&["6.0"]), None)
        .await
        .unwrap();
    assert_eq!(stats.total, 3);
    assert_eq!(stats.critical, 1);
    assert_eq!(stats.unresolved, 2);
    assert_eq!(stats.new_for_week, 1);
    assert_eq!(stats.fixed_for_week, 0);
    assert_eq!(stats.new_for_month, 1);
    assert_eq!(stats.fixed_for_month, 1);

    let both = reporter
        .common_statistic_for_project("fuel", &strings(&["6.0", "5.1"]), None)
        .await
        .unwrap();
    assert_eq!(both.total, 4);
    assert_eq!(both.unresolved, 3);
}

#[tokio::test]
async fn test_common_statistic_with_tag_and_no_milestones() {
    let (_dir, reporter, _) = setup(300).await;

    let tagged = reporter
        .common_statistic_for_project("fuel", &strings(&["6.0"]), Some("docs"))
        .await
        .unwrap();
    assert_eq!(tagged.total, 1);
    assert_eq!(tagged.critical, 1);
    assert_eq!(tagged.new_for_week, 0);

    let empty = reporter
        .common_statistic_for_project("fuel", &[], None)
        .await
        .unwrap();
    assert_eq!(empty.total, 0);
    assert_eq!(empty.unresolved, 0);
}

#[tokio::test]
async fn test_code_freeze_statistic() {
    let (_dir, reporter, _) = setup(300).await;

    let report = reporter
        .code_freeze_statistic(
            &strings(&["6.0"]),
            &strings(&["ui", "core", "nobody", "core"]),
            &strings(&["docs"]),
        )
        .await
        .unwrap();

    let teams: Vec<&String> = report.keys().collect();
    assert_eq!(teams, vec!["ui", "core", "nobody"]);

    assert_eq!(ids(&report["ui"].bugs), vec![7]);
    assert_eq!(report["ui"].count, 1);

    // Bug 1 is mirrored in both namespaces and listed twice; bug 3 is tagged docs
    assert_eq!(ids(&report["core"].bugs), vec![1, 1]);
    assert_eq!(report["core"].count, 2);

    assert!(report["nobody"].bugs.is_empty());
    assert_eq!(report["nobody"].count, 0);
}

#[tokio::test]
async fn test_project_lookup_is_cached() {
    let (_dir, reporter, tracker) = setup(300).await;

    let first = reporter.get_project("fuel").await.unwrap();
    let second = reporter.get_project("fuel").await.unwrap();
    assert_eq!(first, second);
    assert_eq!(first.active_milestone_names(), vec!["6.0"]);
    assert_eq!(tracker.project_calls.load(Ordering::SeqCst), 1);

    let all = reporter.get_all_bugs(&first).await.unwrap();
    let again = reporter.get_all_bugs(&first).await.unwrap();
    assert_eq!(ids(&all), vec![42]);
    assert_eq!(all, again);
    assert_eq!(tracker.search_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_expired_cache_fetches_again() {
    let (_dir, reporter, tracker) = setup(0).await;

    let project = reporter.get_project("fuel").await.unwrap();
    reporter.get_project("fuel").await.unwrap();
    assert_eq!(tracker.project_calls.load(Ordering::SeqCst), 2);

    reporter.get_all_bugs(&project).await.unwrap();
    reporter.get_all_bugs(&project).await.unwrap();
    assert_eq!(tracker.search_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_tracker_errors_are_not_cached() {
    let (_dir, reporter, tracker) = setup(300).await;

    let err = reporter.get_project("nova").await.unwrap_err();
    assert!(matches!(err, AppError::NotFound { .. }));
    reporter.get_project("nova").await.unwrap_err();
    assert_eq!(tracker.project_calls.load(Ordering::SeqCst), 2);
}

#[test]
fn test_unknown_status_group_key() {
    let err = "Someday".parse::<StatusGroup>().unwrap_err();
    assert!(matches!(err, AppError::UnknownStatusGroup { .. }));
    assert_eq!("closed".parse::<StatusGroup>().unwrap(), StatusGroup::Closed);
}
