//! Reporter configuration.

use crate::error::AppError;
use crate::services::launchpad_client::LaunchpadClientConfig;
use crate::services::ttl_cache::DEFAULT_TTL_SECS;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Project namespaces merged by the cross-project reports.
pub const DEFAULT_NAMESPACES: [&str; 2] = ["fuel", "mos"];

/// Everything needed to open a `Reporter`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportingConfig {
    /// SQLite file holding the mirrored bugs.
    pub bugs_db_path: PathBuf,

    /// SQLite file holding team rosters. May be the same file as `bugs_db_path`.
    pub assignees_db_path: PathBuf,

    /// The two namespaces whose results are merged.
    pub namespaces: [String; 2],

    /// Validity window of the tracker accessors, in seconds.
    pub cache_ttl_secs: u64,

    pub tracker: LaunchpadClientConfig,
}

impl Default for ReportingConfig {
    fn default() -> Self {
        Self {
            bugs_db_path: PathBuf::from("bugs.db"),
            assignees_db_path: PathBuf::from("assignees.db"),
            namespaces: DEFAULT_NAMESPACES.map(String::from),
            cache_ttl_secs: DEFAULT_TTL_SECS,
            tracker: LaunchpadClientConfig::default(),
        }
    }
}

impl ReportingConfig {
    /// Load a JSON config file; absent keys take their defaults.
    pub fn from_file(path: &Path) -> Result<Self, AppError> {
        let json = std::fs::read_to_string(path).map_err(|e| {
            AppError::config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_json(&json)
    }

    pub fn from_json(json: &str) -> Result<Self, AppError> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| AppError::config(format!("Invalid config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.namespaces.iter().any(|ns| ns.trim().is_empty()) {
            return Err(AppError::invalid_input_field(
                "Namespace names must not be empty",
                "namespaces",
            ));
        }
        if self.namespaces[0] == self.namespaces[1] {
            return Err(AppError::invalid_input_field(
                "The two namespaces must differ",
                "namespaces",
            ));
        }
        if self.tracker.base_url.trim().is_empty() {
            return Err(AppError::invalid_input_field(
                "Tracker base URL must not be empty",
                "tracker.base_url",
            ));
        }
        Ok(())
    }
}
