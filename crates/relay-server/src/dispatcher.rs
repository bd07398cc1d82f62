//! Shared dispatch path for both ingress adapters.
//!
//! The queue consumer and the HTTP handler both call [`Dispatcher::dispatch`],
//! so validation, registry resolution and encoding are identical regardless
//! of where a directive came from.

use std::sync::Arc;

use relay_core::{Directive, RelayError, Registry, Result, WorkOrder};
use tracing::{info, instrument};

use crate::queue::QueueStore;

/// Resolves directives against the registry and enqueues work orders.
///
/// Holds no mutable state of its own; concurrent calls only share the
/// read-only registry and the queue store handle.
#[derive(Clone)]
pub struct Dispatcher {
    registry: Arc<Registry>,
    queue: Arc<dyn QueueStore>,
    default_target_queue: String,
}

impl Dispatcher {
    pub fn new(
        registry: Arc<Registry>,
        queue: Arc<dyn QueueStore>,
        default_target_queue: impl Into<String>,
    ) -> Self {
        Self {
            registry,
            queue,
            default_target_queue: default_target_queue.into(),
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn default_target_queue(&self) -> &str {
        &self.default_target_queue
    }

    /// Validate `directive`, resolve it and append one work order to the
    /// target queue.
    ///
    /// Nothing is written unless every step before the append succeeds. A
    /// failed append is reported as [`RelayError::DeliveryFailed`] and is not
    /// retried here.
    #[instrument(skip_all)]
    pub async fn dispatch(&self, directive: &Directive) -> Result<()> {
        let (action, repo) = directive.resolve()?;
        let project = self.registry.lookup(repo)?;

        info!(%repo, %action, "processing directive");

        let target = project
            .target_queue()
            .unwrap_or(self.default_target_queue.as_str());
        let payload = WorkOrder::encode(repo, action, project).to_json()?;

        self.queue
            .push_tail(target, &payload)
            .await
            .map_err(|e| RelayError::DeliveryFailed {
                queue: target.to_string(),
                reason: e.to_string(),
            })?;

        info!(%repo, %action, queue = %target, "work order enqueued");
        Ok(())
    }
}
