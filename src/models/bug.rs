//! Bug record model.
//!
//! `BugRecord` is the single shape every report works with. It is built
//! either from a row of the local bug store or from a tracker API bug task.

use crate::error::AppError;
use crate::services::launchpad_client::LaunchpadBugTask;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Precomputed "happened recently" flag stored on each bug.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecencyFlag {
    CreatedWithinWeek,
    FixedWithinWeek,
    CreatedWithinMonth,
    FixedWithinMonth,
}

impl RecencyFlag {
    /// Store column holding this flag.
    pub fn column(&self) -> &'static str {
        match self {
            Self::CreatedWithinWeek => "created_within_week",
            Self::FixedWithinWeek => "fixed_within_week",
            Self::CreatedWithinMonth => "created_within_month",
            Self::FixedWithinMonth => "fixed_within_month",
        }
    }
}

/// Recency flags as written by the ingester. `None` means the flag was never computed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecencyFlags {
    pub created_within_week: Option<bool>,
    pub fixed_within_week: Option<bool>,
    pub created_within_month: Option<bool>,
    pub fixed_within_month: Option<bool>,
}

impl RecencyFlags {
    pub fn get(&self, flag: RecencyFlag) -> Option<bool> {
        match flag {
            RecencyFlag::CreatedWithinWeek => self.created_within_week,
            RecencyFlag::FixedWithinWeek => self.fixed_within_week,
            RecencyFlag::CreatedWithinMonth => self.created_within_month,
            RecencyFlag::FixedWithinMonth => self.fixed_within_month,
        }
    }

    /// True only when the flag is present and set.
    pub fn is_set(&self, flag: RecencyFlag) -> bool {
        self.get(flag).unwrap_or(false)
    }
}

/// Snapshot of one bug as seen by the reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BugRecord {
    /// Tracker bug number.
    pub id: i64,

    pub title: String,

    /// Raw tracker status, e.g. `Fix Released`.
    pub status: String,

    /// Raw tracker importance, e.g. `High`.
    pub importance: String,

    /// Milestone name, if targeted.
    pub milestone: Option<String>,

    pub tags: Vec<String>,

    /// Assignee account name.
    pub assignee: Option<String>,

    /// URL to the bug in the tracker web UI.
    pub web_link: Option<String>,

    /// Creation timestamp (Unix).
    pub created_at: Option<i64>,

    /// Fix timestamp (Unix, if fixed).
    pub fixed_at: Option<i64>,

    #[serde(default)]
    pub recency: RecencyFlags,
}

impl BugRecord {
    /// Create a record with only the fields every bug has.
    pub fn new(id: i64, status: impl Into<String>, importance: impl Into<String>) -> Self {
        Self {
            id,
            title: String::new(),
            status: status.into(),
            importance: importance.into(),
            milestone: None,
            tags: Vec::new(),
            assignee: None,
            web_link: None,
            created_at: None,
            fixed_at: None,
            recency: RecencyFlags::default(),
        }
    }

    pub fn with_milestone(mut self, milestone: impl Into<String>) -> Self {
        self.milestone = Some(milestone.into());
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_assignee(mut self, assignee: impl Into<String>) -> Self {
        self.assignee = Some(assignee.into());
        self
    }

    pub fn with_recency(mut self, recency: RecencyFlags) -> Self {
        self.recency = recency;
        self
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Field-by-field listing in `name --- value` form, one field per line.
    pub fn dump(&self) -> String {
        fn or_na<T: ToString>(value: &Option<T>) -> String {
            value
                .as_ref()
                .map(|v| v.to_string())
                .unwrap_or_else(|| "n/a".to_string())
        }

        let fields = [
            ("id", self.id.to_string()),
            ("title", self.title.clone()),
            ("status", self.status.clone()),
            ("importance", self.importance.clone()),
            ("milestone", or_na(&self.milestone)),
            ("tags", self.tags.join(", ")),
            ("assignee", or_na(&self.assignee)),
            ("web_link", or_na(&self.web_link)),
            ("created_at", or_na(&self.created_at)),
            ("fixed_at", or_na(&self.fixed_at)),
            ("created_within_week", or_na(&self.recency.created_within_week)),
            ("fixed_within_week", or_na(&self.recency.fixed_within_week)),
            ("created_within_month", or_na(&self.recency.created_within_month)),
            ("fixed_within_month", or_na(&self.recency.fixed_within_month)),
        ];

        fields
            .iter()
            .map(|(name, value)| format!("{} --- {}", name, value))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Row of the `bugs` table.
///
/// Note: `tags` is stored as a JSON array string.
#[derive(Debug, Clone, FromRow)]
pub struct BugRow {
    pub namespace: String,
    pub id: i64,
    pub title: String,
    pub status: String,
    pub importance: String,
    pub milestone: Option<String>,
    pub tags: String,
    pub assignee: Option<String>,
    pub web_link: Option<String>,
    pub created_at: Option<i64>,
    pub fixed_at: Option<i64>,
    pub created_within_week: Option<bool>,
    pub fixed_within_week: Option<bool>,
    pub created_within_month: Option<bool>,
    pub fixed_within_month: Option<bool>,
}

impl TryFrom<BugRow> for BugRecord {
    type Error = AppError;

    fn try_from(row: BugRow) -> Result<Self, Self::Error> {
        let tags: Vec<String> = serde_json::from_str(&row.tags).map_err(|e| {
            AppError::internal(format!(
                "Malformed tags for bug {} in {}: {}",
                row.id, row.namespace, e
            ))
        })?;

        Ok(Self {
            id: row.id,
            title: row.title,
            status: row.status,
            importance: row.importance,
            milestone: row.milestone,
            tags,
            assignee: row.assignee,
            web_link: row.web_link,
            created_at: row.created_at,
            fixed_at: row.fixed_at,
            recency: RecencyFlags {
                created_within_week: row.created_within_week,
                fixed_within_week: row.fixed_within_week,
                created_within_month: row.created_within_month,
                fixed_within_month: row.fixed_within_month,
            },
        })
    }
}

impl TryFrom<LaunchpadBugTask> for BugRecord {
    type Error = AppError;

    fn try_from(task: LaunchpadBugTask) -> Result<Self, Self::Error> {
        let id = last_segment(&task.bug_link)
            .and_then(|s| s.parse::<i64>().ok())
            .ok_or_else(|| {
                AppError::internal(format!("Bug task has no bug number: {}", task.bug_link))
            })?;

        let milestone = task
            .milestone_link
            .as_deref()
            .and_then(last_segment)
            .map(str::to_string);

        let assignee = task
            .assignee_link
            .as_deref()
            .and_then(last_segment)
            .map(|s| s.trim_start_matches('~').to_string());

        let fixed_at = task
            .date_fix_released
            .as_deref()
            .or(task.date_fix_committed.as_deref())
            .and_then(parse_iso_timestamp);

        Ok(Self {
            id,
            title: task.title,
            status: task.status,
            importance: task.importance,
            milestone,
            tags: task.tags,
            assignee,
            web_link: task.web_link,
            created_at: task.date_created.as_deref().and_then(parse_iso_timestamp),
            fixed_at,
            recency: RecencyFlags::default(),
        })
    }
}

/// Last non-empty path segment of an API link.
fn last_segment(link: &str) -> Option<&str> {
    link.trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|s| !s.is_empty())
}

/// Parse an ISO 8601 timestamp to Unix seconds.
fn parse_iso_timestamp(s: &str) -> Option<i64> {
    chrono::DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.timestamp())
        .ok()
}
