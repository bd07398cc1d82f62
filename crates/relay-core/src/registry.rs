use crate::error::{RelayError, Result};
use crate::types::Action;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ---------------------------------------------------------------------------
// ProjectDescriptor
// ---------------------------------------------------------------------------

/// Execution details for one repository's service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectDescriptor {
    pub repo: String,
    #[serde(default)]
    pub dir: String,
    #[serde(default)]
    pub up_commands: Vec<String>,
    #[serde(default)]
    pub down_commands: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restart_commands: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_queue: Option<String>,
}

impl ProjectDescriptor {
    pub fn new(repo: impl Into<String>, dir: impl Into<String>) -> Self {
        Self {
            repo: repo.into(),
            dir: dir.into(),
            up_commands: Vec::new(),
            down_commands: Vec::new(),
            restart_commands: None,
            target_queue: None,
        }
    }

    /// Commands configured for `action`. An unconfigured restart yields an
    /// empty slice; the executor decides what an empty list means.
    pub fn commands_for(&self, action: Action) -> &[String] {
        match action {
            Action::Up => &self.up_commands,
            Action::Down => &self.down_commands,
            Action::Restart => self.restart_commands.as_deref().unwrap_or(&[]),
        }
    }

    /// The queue override exactly as configured, if one is set and non-blank.
    pub fn target_queue(&self) -> Option<&str> {
        self.target_queue
            .as_deref()
            .filter(|q| !q.trim().is_empty())
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Immutable lookup table from repository id to [`ProjectDescriptor`].
///
/// Built once at startup. There are no mutating methods, so a shared
/// `Arc<Registry>` can be read from any number of tasks without locking.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    projects: BTreeMap<String, ProjectDescriptor>,
    overridden: Vec<String>,
}

impl Registry {
    /// Build a registry from descriptors in order. When two descriptors share
    /// a repository id the later one wins.
    pub fn from_descriptors(descriptors: impl IntoIterator<Item = ProjectDescriptor>) -> Self {
        let mut projects = BTreeMap::new();
        let mut overridden = Vec::new();
        for descriptor in descriptors {
            let repo = descriptor.repo.clone();
            if projects.insert(repo.clone(), descriptor).is_some() {
                overridden.push(repo);
            }
        }
        Self {
            projects,
            overridden,
        }
    }

    pub fn lookup(&self, repo: &str) -> Result<&ProjectDescriptor> {
        self.projects
            .get(repo)
            .ok_or_else(|| RelayError::UnknownRepository(repo.to_string()))
    }

    pub fn len(&self) -> usize {
        self.projects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }

    /// Descriptors ordered by repository id.
    pub fn iter(&self) -> impl Iterator<Item = &ProjectDescriptor> {
        self.projects.values()
    }

    /// Repository ids that appeared more than once while loading.
    pub fn overridden(&self) -> &[String] {
        &self.overridden
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app() -> ProjectDescriptor {
        ProjectDescriptor {
            up_commands: vec!["start.sh".into()],
            down_commands: vec!["stop.sh".into()],
            ..ProjectDescriptor::new("org/app", "/srv/app")
        }
    }

    #[test]
    fn lookup_finds_exact_match() {
        let registry = Registry::from_descriptors([app()]);
        assert_eq!(registry.lookup("org/app").unwrap().dir, "/srv/app");
        assert!(matches!(
            registry.lookup("org/App"),
            Err(RelayError::UnknownRepository(r)) if r == "org/App"
        ));
    }

    #[test]
    fn duplicate_repo_is_last_write_wins() {
        let second = ProjectDescriptor::new("org/app", "/srv/app-v2");
        let registry = Registry::from_descriptors([app(), second]);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.lookup("org/app").unwrap().dir, "/srv/app-v2");
        assert_eq!(registry.overridden(), ["org/app".to_string()]);
    }

    #[test]
    fn restart_without_commands_is_empty() {
        let project = app();
        assert!(project.commands_for(Action::Restart).is_empty());
        assert_eq!(project.commands_for(Action::Up), ["start.sh".to_string()]);
        assert_eq!(project.commands_for(Action::Down), ["stop.sh".to_string()]);
    }

    #[test]
    fn blank_target_queue_is_no_override() {
        let mut project = app();
        assert_eq!(project.target_queue(), None);
        project.target_queue = Some("  ".into());
        assert_eq!(project.target_queue(), None);
        project.target_queue = Some("custom:queue".into());
        assert_eq!(project.target_queue(), Some("custom:queue"));
    }

    #[test]
    fn target_queue_is_not_trimmed() {
        let mut project = app();
        project.target_queue = Some(" jobs ".into());
        assert_eq!(project.target_queue(), Some(" jobs "));
    }

    #[test]
    fn descriptor_uses_camel_case_keys() {
        let json = r#"{
            "repo": "org/app",
            "dir": "/srv/app",
            "upCommands": ["a", "b"],
            "restartCommands": ["r"],
            "targetQueue": "q"
        }"#;
        let project: ProjectDescriptor = serde_json::from_str(json).unwrap();
        assert_eq!(project.up_commands, vec!["a", "b"]);
        assert!(project.down_commands.is_empty());
        assert_eq!(project.restart_commands, Some(vec!["r".to_string()]));
        assert_eq!(project.target_queue(), Some("q"));
    }
}
