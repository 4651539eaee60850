//! Team roster model.

use serde::{Deserialize, Serialize};

/// Members of one team, merged from every roster document stored for it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamRoster {
    pub team: String,

    /// Assignee account names, in stored order.
    pub members: Vec<String>,
}

impl TeamRoster {
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn contains(&self, member: &str) -> bool {
        self.members.iter().any(|m| m == member)
    }
}
