//! Status taxonomy.
//!
//! Maps the report-facing status groups onto the tracker's raw status
//! vocabulary.

use crate::error::AppError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

pub const NEW: &str = "New";
pub const INCOMPLETE: &str = "Incomplete";
pub const CONFIRMED: &str = "Confirmed";
pub const TRIAGED: &str = "Triaged";
pub const IN_PROGRESS: &str = "In Progress";
pub const FIX_COMMITTED: &str = "Fix Committed";
pub const FIX_RELEASED: &str = "Fix Released";
pub const WONT_FIX: &str = "Won't Fix";
pub const INVALID: &str = "Invalid";
pub const EXPIRED: &str = "Expired";
pub const OPINION: &str = "Opinion";

/// Importance values used by the reports.
pub const CRITICAL: &str = "Critical";
pub const HIGH: &str = "High";

/// Group of raw tracker statuses a report filters on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatusGroup {
    New,
    Incomplete,
    Open,
    Closed,
    All,
    NotDone,
}

impl StatusGroup {
    /// Every group, in declaration order.
    pub const ALL_GROUPS: [StatusGroup; 6] = [
        Self::New,
        Self::Incomplete,
        Self::Open,
        Self::Closed,
        Self::All,
        Self::NotDone,
    ];

    /// Raw statuses belonging to this group, in tracker order.
    ///
    /// `Incomplete` belongs to both `Incomplete` and `Closed`.
    pub fn members(&self) -> &'static [&'static str] {
        match self {
            Self::New => &[NEW],
            Self::Incomplete => &[INCOMPLETE],
            Self::Open => &[TRIAGED, IN_PROGRESS, CONFIRMED],
            Self::Closed => &[
                FIX_COMMITTED,
                FIX_RELEASED,
                WONT_FIX,
                INVALID,
                EXPIRED,
                OPINION,
                INCOMPLETE,
            ],
            Self::All => &[
                NEW,
                INCOMPLETE,
                INVALID,
                WONT_FIX,
                CONFIRMED,
                TRIAGED,
                IN_PROGRESS,
                FIX_RELEASED,
                FIX_COMMITTED,
                OPINION,
                EXPIRED,
            ],
            Self::NotDone => &[NEW, CONFIRMED, TRIAGED, IN_PROGRESS],
        }
    }

    /// Members as owned strings, ready for a query clause.
    pub fn statuses(&self) -> Vec<String> {
        self.members().iter().map(|s| s.to_string()).collect()
    }

    /// Check whether a raw status belongs to this group.
    pub fn contains(&self, status: &str) -> bool {
        self.members().contains(&status)
    }

    /// All groups (other than `All`) that contain the given raw status.
    pub fn groups_of(status: &str) -> Vec<StatusGroup> {
        Self::ALL_GROUPS
            .iter()
            .copied()
            .filter(|g| *g != Self::All && g.contains(status))
            .collect()
    }
}

impl FromStr for StatusGroup {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "new" => Ok(Self::New),
            "incomplete" => Ok(Self::Incomplete),
            "open" => Ok(Self::Open),
            "closed" => Ok(Self::Closed),
            "all" => Ok(Self::All),
            "notdone" | "not_done" => Ok(Self::NotDone),
            _ => Err(AppError::unknown_status_group(s)),
        }
    }
}

impl std::fmt::Display for StatusGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::New => write!(f, "New"),
            Self::Incomplete => write!(f, "Incomplete"),
            Self::Open => write!(f, "Open"),
            Self::Closed => write!(f, "Closed"),
            Self::All => write!(f, "All"),
            Self::NotDone => write!(f, "NotDone"),
        }
    }
}
