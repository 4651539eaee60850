//! Data models for the reports.
//!
//! These models represent bugs and projects read from the local store or the
//! tracker API, plus the report shapes handed back to callers.
//!
//! All models derive Serialize so reports can be emitted as JSON.

pub mod bug;
pub mod project;
pub mod report;
pub mod status;
pub mod team;

// Re-exports for convenient access
pub use bug::{BugRecord, BugRow, RecencyFlag, RecencyFlags};
pub use project::{MilestoneRef, ProjectRecord};
pub use report::{CodeFreezeReport, DedupCounts, ProjectStatistics, TeamFreezeReport};
pub use status::StatusGroup;
pub use team::TeamRoster;
