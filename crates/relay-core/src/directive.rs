//! Inbound directives: `{"up": "<repo>"}`, `{"down": "<repo>"}` or
//! `{"restart": "<repo>"}`.
//!
//! The same JSON arrives as a queue message body or an HTTP request body.
//! Exactly one action field must carry a non-empty repository id.

use crate::error::{RelayError, Result};
use crate::types::Action;
use serde::{Deserialize, Serialize};

const MISSING_ACTION: &str = "message must contain either 'up', 'down', or 'restart' field";
const AMBIGUOUS_ACTION: &str = "message must contain exactly one of 'up', 'down', or 'restart'";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Directive {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub up: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub down: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restart: Option<String>,
}

impl Directive {
    pub fn new(action: Action, repo: impl Into<String>) -> Self {
        let repo = Some(repo.into());
        match action {
            Action::Up => Self {
                up: repo,
                ..Self::default()
            },
            Action::Down => Self {
                down: repo,
                ..Self::default()
            },
            Action::Restart => Self {
                restart: repo,
                ..Self::default()
            },
        }
    }

    /// Decode a directive from raw JSON bytes.
    ///
    /// Malformed JSON is an [`RelayError::InvalidDirective`]; field validation
    /// happens later in [`Directive::resolve`].
    pub fn parse(raw: &[u8]) -> Result<Self> {
        serde_json::from_slice(raw)
            .map_err(|e| RelayError::InvalidDirective(format!("invalid JSON: {e}")))
    }

    /// Return the single requested action and its repository id.
    ///
    /// Empty strings count as absent.
    pub fn resolve(&self) -> Result<(Action, &str)> {
        let populated: Vec<(Action, &str)> = Action::all()
            .iter()
            .filter_map(|&action| {
                self.repo_for(action)
                    .filter(|r| !r.is_empty())
                    .map(|r| (action, r))
            })
            .collect();

        match populated.as_slice() {
            [single] => Ok(*single),
            [] => Err(RelayError::InvalidDirective(MISSING_ACTION.to_string())),
            _ => Err(RelayError::InvalidDirective(AMBIGUOUS_ACTION.to_string())),
        }
    }

    fn repo_for(&self, action: Action) -> Option<&str> {
        match action {
            Action::Up => self.up.as_deref(),
            Action::Down => self.down.as_deref(),
            Action::Restart => self.restart.as_deref(),
        }
    }
}
