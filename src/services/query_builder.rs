//! Composite bug filters.
//!
//! A `BugFilter` is the AND of a list of clauses. The same filter renders to
//! a parameterised SQL `WHERE` clause for the bug store and can be evaluated
//! directly against a `BugRecord`; both paths agree on every clause,
//! including how absent fields behave.

use crate::models::bug::{BugRecord, RecencyFlag};
use crate::models::status::StatusGroup;
use serde::{Deserialize, Serialize};

/// Scalar bug field a clause can test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Field {
    Status,
    Importance,
    Milestone,
    Assignee,
}

impl Field {
    /// Column in the `bugs` table.
    pub fn column(&self) -> &'static str {
        match self {
            Self::Status => "status",
            Self::Importance => "importance",
            Self::Milestone => "milestone",
            Self::Assignee => "assignee",
        }
    }

    fn value_of<'a>(&self, bug: &'a BugRecord) -> Option<&'a str> {
        match self {
            Self::Status => Some(bug.status.as_str()),
            Self::Importance => Some(bug.importance.as_str()),
            Self::Milestone => bug.milestone.as_deref(),
            Self::Assignee => bug.assignee.as_deref(),
        }
    }
}

/// How a tag list constrains a bug's tags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TagMode {
    /// At least one of the tags must be present.
    #[default]
    Include,
    /// None of the tags may be present.
    Exclude,
}

/// One predicate of a filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Clause {
    /// Field value is one of `values`. An empty set matches nothing.
    In { field: Field, values: Vec<String> },

    /// Field value equals `value`.
    Equals { field: Field, value: String },

    /// Bug carries at least one of the tags.
    TagsAny(Vec<String>),

    /// Bug carries none of the tags.
    TagsNone(Vec<String>),

    /// Recency flag is present and set.
    FlagSet(RecencyFlag),
}

impl Clause {
    pub fn matches(&self, bug: &BugRecord) -> bool {
        match self {
            Self::In { field, values } => field
                .value_of(bug)
                .is_some_and(|v| values.iter().any(|candidate| candidate == v)),
            Self::Equals { field, value } => field.value_of(bug) == Some(value.as_str()),
            Self::TagsAny(tags) => tags.iter().any(|t| bug.has_tag(t)),
            Self::TagsNone(tags) => !tags.iter().any(|t| bug.has_tag(t)),
            Self::FlagSet(flag) => bug.recency.is_set(*flag),
        }
    }

    fn push_sql(&self, sql: &mut String, binds: &mut Vec<String>) {
        match self {
            Self::In { values, .. } if values.is_empty() => sql.push_str("1 = 0"),
            Self::In { field, values } => {
                sql.push_str(field.column());
                sql.push_str(" IN (");
                sql.push_str(&placeholders(values.len()));
                sql.push(')');
                binds.extend(values.iter().cloned());
            }
            Self::Equals { field, value } => {
                sql.push_str(field.column());
                sql.push_str(" = ?");
                binds.push(value.clone());
            }
            Self::TagsAny(tags) | Self::TagsNone(tags) => {
                if matches!(self, Self::TagsNone(_)) {
                    sql.push_str("NOT ");
                }
                sql.push_str("EXISTS (SELECT 1 FROM json_each(bugs.tags) WHERE json_each.value IN (");
                sql.push_str(&placeholders(tags.len()));
                sql.push_str("))");
                binds.extend(tags.iter().cloned());
            }
            Self::FlagSet(flag) => {
                sql.push_str(flag.column());
                sql.push_str(" = 1");
            }
        }
    }
}

fn non_empty<I, S>(values: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    values
        .into_iter()
        .map(Into::into)
        .filter(|v: &String| !v.is_empty())
        .collect()
}

fn placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}

/// Rendered SQL condition with its positional bind values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlFilter {
    pub condition: String,
    pub binds: Vec<String>,
}

/// AND of clauses over a bug.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BugFilter {
    clauses: Vec<Clause>,
}

impl BugFilter {
    /// A filter with no clauses; matches every bug.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clause(mut self, clause: Clause) -> Self {
        self.clauses.push(clause);
        self
    }

    pub fn status_in<I, S>(self, statuses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.field_in(Field::Status, statuses)
    }

    pub fn status_group(self, group: StatusGroup) -> Self {
        self.status_in(group.members().iter().copied())
    }

    pub fn milestone(self, milestone: impl Into<String>) -> Self {
        self.clause(Clause::Equals {
            field: Field::Milestone,
            value: milestone.into(),
        })
    }

    pub fn milestone_in<I, S>(self, milestones: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.field_in(Field::Milestone, milestones)
    }

    pub fn importance(self, importance: impl Into<String>) -> Self {
        self.clause(Clause::Equals {
            field: Field::Importance,
            value: importance.into(),
        })
    }

    pub fn importance_in<I, S>(self, importance: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.field_in(Field::Importance, importance)
    }

    pub fn assignee_in<I, S>(self, assignees: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.field_in(Field::Assignee, assignees)
    }

    /// Constrain tags. Empty tag names are ignored; if none remain, no clause
    /// is added at all.
    pub fn tags<I, S>(self, tags: I, mode: TagMode) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let tags = non_empty(tags);
        if tags.is_empty() {
            return self;
        }
        match mode {
            TagMode::Include => self.clause(Clause::TagsAny(tags)),
            TagMode::Exclude => self.clause(Clause::TagsNone(tags)),
        }
    }

    pub fn flag_set(self, flag: RecencyFlag) -> Self {
        self.clause(Clause::FlagSet(flag))
    }

    fn field_in<I, S>(self, field: Field, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.clause(Clause::In {
            field,
            values: values.into_iter().map(Into::into).collect(),
        })
    }

    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    pub fn matches(&self, bug: &BugRecord) -> bool {
        self.clauses.iter().all(|c| c.matches(bug))
    }

    /// Render as a SQL condition over the `bugs` table.
    pub fn to_sql(&self) -> SqlFilter {
        let mut condition = String::new();
        let mut binds = Vec::new();

        if self.clauses.is_empty() {
            condition.push_str("1 = 1");
        }

        for (i, clause) in self.clauses.iter().enumerate() {
            if i > 0 {
                condition.push_str(" AND ");
            }
            clause.push_sql(&mut condition, &mut binds);
        }

        SqlFilter { condition, binds }
    }
}

/// Parameters of a plain bug search.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BugSearch {
    /// Raw statuses to match.
    pub statuses: Vec<String>,

    /// Exact milestone name.
    #[serde(default)]
    pub milestone: Option<String>,

    #[serde(default)]
    pub tags: Vec<String>,

    /// Importance values; empty means any importance.
    #[serde(default)]
    pub importance: Vec<String>,

    #[serde(default)]
    pub tag_mode: TagMode,
}

impl BugSearch {
    pub fn new<I, S>(statuses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            statuses: statuses.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    pub fn in_group(group: StatusGroup) -> Self {
        Self::new(group.members().iter().copied())
    }

    /// Restrict to one milestone. `None` and `""` leave the search unrestricted.
    pub fn milestone(mut self, milestone: Option<&str>) -> Self {
        self.milestone = milestone.filter(|m| !m.is_empty()).map(str::to_string);
        self
    }

    pub fn tags<I, S>(mut self, tags: I, mode: TagMode) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = non_empty(tags);
        self.tag_mode = mode;
        self
    }

    pub fn importance<I, S>(mut self, importance: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.importance = importance.into_iter().map(Into::into).collect();
        self
    }

    /// Build the filter: status ∈ statuses, then the optional clauses.
    pub fn to_filter(&self) -> BugFilter {
        let mut filter = BugFilter::new().status_in(self.statuses.iter().cloned());

        if let Some(milestone) = self.milestone.as_deref().filter(|m| !m.is_empty()) {
            filter = filter.milestone(milestone);
        }

        if !self.importance.is_empty() {
            filter = filter.importance_in(self.importance.iter().cloned());
        }

        filter.tags(self.tags.iter().cloned(), self.tag_mode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::bug::RecencyFlags;

    #[test]
    fn test_status_only_search() {
        let filter = BugSearch::new(["New", "Confirmed"]).to_filter();
        let sql = filter.to_sql();
        assert_eq!(sql.condition, "status IN (?, ?)");
        assert_eq!(sql.binds, vec!["New", "Confirmed"]);
    }

    #[test]
    fn test_full_search_clause_order() {
        let filter = BugSearch::in_group(StatusGroup::Open)
            .milestone(Some("6.0"))
            .importance(["High"])
            .tags(["ui"], TagMode::Exclude)
            .to_filter();

        let sql = filter.to_sql();
        assert_eq!(
            sql.condition,
            "status IN (?, ?, ?) AND milestone = ? AND importance IN (?) AND NOT EXISTS \
             (SELECT 1 FROM json_each(bugs.tags) WHERE json_each.value IN (?))"
        );
        assert_eq!(
            sql.binds,
            vec!["Triaged", "In Progress", "Confirmed", "6.0", "High", "ui"]
        );
    }

    #[test]
    fn test_empty_tag_list_emits_no_clause() {
        let plain = BugSearch::new(["New"]).to_filter();
        let include = BugSearch::new(["New"])
            .tags(Vec::<String>::new(), TagMode::Include)
            .to_filter();
        let exclude = BugSearch::new(["New"])
            .tags(Vec::<String>::new(), TagMode::Exclude)
            .to_filter();

        assert_eq!(plain, include);
        assert_eq!(plain, exclude);
        assert_eq!(plain.clauses().len(), 1);
    }

    #[test]
    fn test_blank_milestone_and_tags_are_no_restriction() {
        let plain = BugSearch::new(["New"]).to_filter();
        let blank = BugSearch::new(["New"])
            .milestone(Some(""))
            .tags([""], TagMode::Include)
            .to_filter();
        assert_eq!(plain, blank);

        let mixed = BugFilter::new().tags(["", "ui"], TagMode::Exclude);
        assert_eq!(mixed.clauses(), &[Clause::TagsNone(vec!["ui".to_string()])]);
    }

    #[test]
    fn test_empty_status_set_matches_nothing() {
        let filter = BugFilter::new().status_in(Vec::<String>::new());
        assert_eq!(filter.to_sql().condition, "1 = 0");
        assert!(!filter.matches(&BugRecord::new(1, "New", "High")));
    }

    #[test]
    fn test_empty_filter_matches_everything() {
        let filter = BugFilter::new();
        assert_eq!(filter.to_sql().condition, "1 = 1");
        assert!(filter.matches(&BugRecord::new(1, "Expired", "Low")));
    }

    #[test]
    fn test_not_done_matches_open_bugs_only() {
        let filter = BugSearch::in_group(StatusGroup::NotDone).to_filter();
        let bugs = [
            BugRecord::new(1, "New", "Undecided"),
            BugRecord::new(2, "Fix Released", "Undecided"),
        ];
        let ids: Vec<i64> = bugs.iter().filter(|b| filter.matches(b)).map(|b| b.id).collect();
        assert_eq!(ids, vec![1]);
    }

    #[test]
    fn test_tag_modes_against_records() {
        let tagged = BugRecord::new(1, "New", "High").with_tags(["docs", "ui"]);
        let untagged = BugRecord::new(2, "New", "High");

        let include = BugFilter::new().tags(["ui", "api"], TagMode::Include);
        let exclude = BugFilter::new().tags(["ui", "api"], TagMode::Exclude);

        assert!(include.matches(&tagged));
        assert!(!include.matches(&untagged));
        assert!(!exclude.matches(&tagged));
        assert!(exclude.matches(&untagged));
    }

    #[test]
    fn test_absent_fields_do_not_match() {
        let bug = BugRecord::new(1, "New", "High");

        assert!(!BugFilter::new().milestone("6.0").matches(&bug));
        assert!(!BugFilter::new().milestone_in(["6.0"]).matches(&bug));
        assert!(!BugFilter::new().assignee_in(["jdoe"]).matches(&bug));
        assert!(!BugFilter::new()
            .flag_set(RecencyFlag::CreatedWithinWeek)
            .matches(&bug));

        let flagged = bug.with_recency(RecencyFlags {
            created_within_week: Some(true),
            ..Default::default()
        });
        assert!(BugFilter::new()
            .flag_set(RecencyFlag::CreatedWithinWeek)
            .matches(&flagged));
    }

    #[test]
    fn test_flag_and_assignee_sql() {
        let sql = BugFilter::new()
            .milestone_in(["6.0", "6.1"])
            .assignee_in(["jdoe"])
            .flag_set(RecencyFlag::FixedWithinMonth)
            .to_sql();
        assert_eq!(
            sql.condition,
            "milestone IN (?, ?) AND assignee IN (?) AND fixed_within_month = 1"
        );
        assert_eq!(sql.binds, vec!["6.0", "6.1", "jdoe"]);
    }
}
