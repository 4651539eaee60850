//! Report result models.
//!
//! Every report is built fresh per call and serializes to plain JSON.

use crate::models::bug::BugRecord;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Counts across both namespaces with duplicate bug ids counted once.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DedupCounts {
    /// Bugs in the Closed group.
    pub done: usize,

    /// Bugs in the All group.
    pub total: usize,

    /// Critical or High bugs in the NotDone group.
    pub high: usize,
}

/// Seven independent counts for one project namespace.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectStatistics {
    pub total: i64,
    pub critical: i64,
    pub unresolved: i64,
    pub new_for_week: i64,
    pub fixed_for_week: i64,
    pub new_for_month: i64,
    pub fixed_for_month: i64,
}

/// Code-freeze blockers assigned to one team.
///
/// Bugs from both namespaces are concatenated, so a bug mirrored in both
/// appears (and is counted) twice.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TeamFreezeReport {
    pub bugs: Vec<BugRecord>,
    pub count: usize,
}

impl TeamFreezeReport {
    pub fn new(bugs: Vec<BugRecord>) -> Self {
        let count = bugs.len();
        Self { bugs, count }
    }
}

/// Code-freeze report keyed by team, in the order teams were requested.
pub type CodeFreezeReport = IndexMap<String, TeamFreezeReport>;
