//! Outbound work orders for the downstream executor.

use crate::error::Result;
use crate::registry::ProjectDescriptor;
use crate::types::Action;
use serde::{Deserialize, Serialize};

/// Branch reference stamped on every work order.
pub const DEFAULT_BRANCH: &str = "refs/heads/main";

/// Field order here is the wire order: repo, branch, type, dir, commands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkOrder {
    pub repo: String,
    pub branch: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub dir: String,
    pub commands: Vec<String>,
}

impl WorkOrder {
    /// Build the work order for `action` on `repo`. Pure: the same inputs
    /// always produce the same payload.
    pub fn encode(repo: &str, action: Action, project: &ProjectDescriptor) -> Self {
        Self {
            repo: repo.to_string(),
            branch: DEFAULT_BRANCH.to_string(),
            kind: action.work_order_type().to_string(),
            dir: project.dir.clone(),
            commands: project.commands_for(action).to_vec(),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}
