//! Tracker project metadata model.

use crate::services::launchpad_client::{LaunchpadMilestone, LaunchpadProject};
use serde::{Deserialize, Serialize};

/// Milestone reference as exposed by the tracker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MilestoneRef {
    /// Milestone name (e.g., "6.0").
    pub name: String,

    /// API link identifying the milestone in task searches.
    pub self_link: String,

    pub is_active: bool,
}

impl From<LaunchpadMilestone> for MilestoneRef {
    fn from(m: LaunchpadMilestone) -> Self {
        Self {
            name: m.name,
            self_link: m.self_link,
            is_active: m.is_active,
        }
    }
}

/// Read-only view of a tracker project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectRecord {
    /// Short project name (e.g., "fuel").
    pub name: String,

    /// Human readable name (e.g., "Fuel for OpenStack").
    pub display_name: String,

    /// API link of the project itself.
    pub self_link: String,

    /// Every milestone of the project.
    pub milestones: Vec<MilestoneRef>,

    /// Milestones still open for targeting.
    pub active_milestones: Vec<MilestoneRef>,
}

impl ProjectRecord {
    /// Assemble a record from the project payload and its milestone collections.
    pub fn from_parts(
        project: LaunchpadProject,
        milestones: Vec<LaunchpadMilestone>,
        active_milestones: Vec<LaunchpadMilestone>,
    ) -> Self {
        Self {
            name: project.name,
            display_name: project.display_name,
            self_link: project.self_link,
            milestones: milestones.into_iter().map(MilestoneRef::from).collect(),
            active_milestones: active_milestones
                .into_iter()
                .map(MilestoneRef::from)
                .collect(),
        }
    }

    pub fn milestone_names(&self) -> Vec<String> {
        self.milestones.iter().map(|m| m.name.clone()).collect()
    }

    pub fn active_milestone_names(&self) -> Vec<String> {
        self.active_milestones.iter().map(|m| m.name.clone()).collect()
    }

    /// Links of the active milestones, as the task search expects them.
    pub fn active_milestone_links(&self) -> Vec<String> {
        self.active_milestones
            .iter()
            .map(|m| m.self_link.clone())
            .collect()
    }
}
