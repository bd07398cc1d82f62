//! Source-queue consumer loop.
//!
//! Each iteration takes one message from the head of the source queue with a
//! bounded wait, then hands it to the [`Dispatcher`]. The bounded wait only
//! exists so that cancellation is noticed within one interval; an empty wait
//! is not an error.
//!
//! Messages that fail to parse or dispatch are logged and dropped. Requeueing
//! them without backoff would spin on the same bad message forever.

use std::sync::Arc;
use std::time::Duration;

use relay_core::{Directive, RelayError};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::dispatcher::Dispatcher;
use crate::queue::QueueStore;

/// Default bounded wait for one blocking read.
pub const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_secs(5);

/// Pause after a source read fails for reasons other than a timeout.
pub const DEFAULT_ERROR_BACKOFF: Duration = Duration::from_secs(1);

#[derive(Debug, Clone)]
pub struct ConsumerConfig {
    pub source_queue: String,
    pub poll_timeout: Duration,
    pub error_backoff: Duration,
}

impl ConsumerConfig {
    pub fn new(source_queue: impl Into<String>) -> Self {
        Self {
            source_queue: source_queue.into(),
            poll_timeout: DEFAULT_POLL_TIMEOUT,
            error_backoff: DEFAULT_ERROR_BACKOFF,
        }
    }

    pub fn with_poll_timeout(mut self, poll_timeout: Duration) -> Self {
        self.poll_timeout = poll_timeout;
        self
    }

    pub fn with_error_backoff(mut self, error_backoff: Duration) -> Self {
        self.error_backoff = error_backoff;
        self
    }
}

pub struct Consumer {
    config: ConsumerConfig,
    source: Arc<dyn QueueStore>,
    dispatcher: Dispatcher,
}

impl Consumer {
    pub fn new(
        config: ConsumerConfig,
        source: Arc<dyn QueueStore>,
        dispatcher: Dispatcher,
    ) -> Self {
        Self {
            config,
            source,
            dispatcher,
        }
    }

    /// Run until `shutdown` is cancelled.
    ///
    /// Cancellation is checked before each read and after each backoff. A
    /// read or dispatch already in progress is allowed to finish; no further
    /// message is taken after that.
    pub async fn run(self, shutdown: CancellationToken) {
        let queue = self.config.source_queue.as_str();
        info!(queue, "listening for messages");

        while !shutdown.is_cancelled() {
            let message = match self.source.pop_head(queue, self.config.poll_timeout).await {
                Ok(Some(message)) => message,
                Ok(None) => continue,
                Err(e) => {
                    let err = RelayError::SourceUnavailable(e.to_string());
                    error!(queue, error = %err, "error reading from source queue");
                    tokio::select! {
                        _ = shutdown.cancelled() => break,
                        _ = tokio::time::sleep(self.config.error_backoff) => continue,
                    }
                }
            };

            info!(queue, %message, "received message");
            self.handle(&message).await;
        }

        info!(queue, "consumer stopped");
    }

    async fn handle(&self, message: &str) {
        let directive = match Directive::parse(message.as_bytes()) {
            Ok(directive) => directive,
            Err(e) => {
                warn!(error = %e, "dropping unparseable message");
                return;
            }
        };

        match self.dispatcher.dispatch(&directive).await {
            Ok(()) => debug!("message dispatched"),
            Err(e) => error!(error = %e, "error processing message"),
        }
    }
}
