//! Bug reporting - statistics over a local mirror of Launchpad bugs.
//!
//! Reports read from a SQLite store that an external ingester keeps in sync
//! with the tracker, grouping bugs by project, milestone, tag, team and
//! status. Project metadata and full bug listings come straight from the
//! tracker API behind a short-lived cache.

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod services;

pub use config::ReportingConfig;
pub use error::AppError;
pub use models::{
    BugRecord, CodeFreezeReport, DedupCounts, ProjectRecord, ProjectStatistics, StatusGroup,
    TeamFreezeReport,
};
pub use services::{common_milestone, BugSearch, BugTracker, Reporter, TagMode};
