//! Business logic services.
//!
//! This module contains the report logic, the filter builder shared by every
//! store query, the tracker client and its cache.
//!
//! Services take their store pools and tracker explicitly and hold no global state.

pub mod launchpad_client;
pub mod query_builder;
pub mod reporting;
pub mod tracker;
pub mod ttl_cache;

pub use launchpad_client::{LaunchpadClient, LaunchpadClientConfig};
pub use query_builder::{BugFilter, BugSearch, Clause, Field, TagMode};
pub use reporting::{common_milestone, Reporter};
pub use tracker::BugTracker;
pub use ttl_cache::TtlCache;
