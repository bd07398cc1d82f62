use crate::error::{RelayError, Result};
use crate::registry::{ProjectDescriptor, Registry};
use serde::{Deserialize, Serialize};
use std::path::Path;

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// Registry file
// ---------------------------------------------------------------------------

/// Accepted top-level shapes of the projects file.
#[derive(Deserialize)]
#[serde(untagged)]
enum ProjectsFile {
    List(Vec<ProjectDescriptor>),
    Wrapped { projects: Vec<ProjectDescriptor> },
}

impl ProjectsFile {
    fn into_descriptors(self) -> Vec<ProjectDescriptor> {
        match self {
            ProjectsFile::List(projects) | ProjectsFile::Wrapped { projects } => projects,
        }
    }
}

impl Registry {
    /// Load the registry from a JSON projects file: either a bare array of
    /// descriptors or `{"projects": [...]}`.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(RelayError::RegistryNotFound(path.to_path_buf()));
        }
        let data = std::fs::read_to_string(path)?;
        Self::from_json(&data)
    }

    pub fn from_json(data: &str) -> Result<Self> {
        let file: ProjectsFile = serde_json::from_str(data)?;
        Ok(Self::from_descriptors(file.into_descriptors()))
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    /// Report suspicious entries. Nothing here prevents the relay from
    /// starting; the executor is the one that acts on commands.
    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        // 1. Duplicate repository ids (earlier entries were discarded)
        for repo in self.overridden() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: format!("duplicate repository '{repo}': later entry overrides earlier"),
            });
        }

        for project in self.iter() {
            // 2. Empty repository id can never be matched by a directive
            if project.repo.trim().is_empty() {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Error,
                    message: "project with empty 'repo' can never be addressed".to_string(),
                });
                continue;
            }

            // 3. Working directory
            if project.dir.trim().is_empty() {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Warning,
                    message: format!("project '{}' has no 'dir'", project.repo),
                });
            }

            // 4. Commands
            if project.up_commands.is_empty() && project.down_commands.is_empty() {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Warning,
                    message: format!(
                        "project '{}' has neither upCommands nor downCommands",
                        project.repo
                    ),
                });
            }

            // 5. Blank override falls back to the default queue
            if project.target_queue.is_some() && project.target_queue().is_none() {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Warning,
                    message: format!(
                        "project '{}' has a blank targetQueue; the default queue is used",
                        project.repo
                    ),
                });
            }
        }

        warnings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const PROJECTS: &str = r#"[
        {"repo": "org/app", "dir": "/srv/app", "upCommands": ["start.sh"], "downCommands": ["stop.sh"]},
        {"repo": "org/api", "dir": "/srv/api", "upCommands": ["up"], "targetQueue": "api:jobs"}
    ]"#;

    #[test]
    fn load_reads_bare_array() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("projects.json");
        std::fs::write(&path, PROJECTS).unwrap();

        let registry = Registry::load(&path).unwrap();
        assert_eq!(registry.len(), 2);
        assert_eq!(
            registry.lookup("org/api").unwrap().target_queue(),
            Some("api:jobs")
        );
        assert!(registry.validate().is_empty());
    }

    #[test]
    fn load_reads_wrapped_object() {
        let json = format!(r#"{{"projects": {PROJECTS}}}"#);
        let registry = Registry::from_json(&json).unwrap();
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn load_missing_file_is_registry_not_found() {
        let dir = TempDir::new().unwrap();
        let err = Registry::load(&dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, RelayError::RegistryNotFound(_)));
    }

    #[test]
    fn load_malformed_file_is_json_error() {
        let err = Registry::from_json("[{\"repo\": }]").unwrap_err();
        assert!(matches!(err, RelayError::Json(_)));
    }

    #[test]
    fn validate_reports_problems() {
        let json = r#"[
            {"repo": "org/app", "dir": "/srv/app", "upCommands": ["a"]},
            {"repo": "org/app", "dir": "", "targetQueue": " "},
            {"repo": "", "dir": "/tmp"}
        ]"#;
        let registry = Registry::from_json(json).unwrap();
        let messages: Vec<String> = registry
            .validate()
            .into_iter()
            .map(|w| w.message)
            .collect();

        assert!(messages.iter().any(|m| m.contains("duplicate repository 'org/app'")));
        assert!(messages.iter().any(|m| m.contains("has no 'dir'")));
        assert!(messages.iter().any(|m| m.contains("neither upCommands nor downCommands")));
        assert!(messages.iter().any(|m| m.contains("blank targetQueue")));
        assert!(messages.iter().any(|m| m.contains("empty 'repo'")));
    }
}
