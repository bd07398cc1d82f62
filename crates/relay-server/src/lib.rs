//! Runtime half of the service command relay.
//!
//! ```text
//! source queue ──► Consumer ──┐
//!                             ├──► Dispatcher ──► WorkOrder ──► target queue
//! POST /messages ──► handler ─┘
//! ```
//!
//! Both ingress paths share one [`Dispatcher`]; the [`ShutdownCoordinator`]
//! stops them in order on SIGINT/SIGTERM.

pub mod consumer;
pub mod dispatcher;
pub mod error;
pub mod queue;
pub mod redis_queue;
pub mod routes;
pub mod shutdown;
pub mod state;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::routing::post;
use axum::Router;
use relay_core::Registry;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

pub use consumer::{Consumer, ConsumerConfig};
pub use dispatcher::Dispatcher;
pub use queue::{MemoryQueue, QueueError, QueueStore};
pub use redis_queue::RedisQueue;
pub use shutdown::ShutdownCoordinator;
pub use state::AppState;

/// Upper bound on handling one HTTP request, body read included.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Everything `run` needs besides the registry, the store and the listener.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub source_queue: String,
    pub default_target_queue: String,
    pub poll_timeout: Duration,
    pub error_backoff: Duration,
    pub shutdown_grace: Duration,
}

impl ServerConfig {
    pub fn new(source_queue: impl Into<String>, default_target_queue: impl Into<String>) -> Self {
        Self {
            source_queue: source_queue.into(),
            default_target_queue: default_target_queue.into(),
            poll_timeout: consumer::DEFAULT_POLL_TIMEOUT,
            error_backoff: consumer::DEFAULT_ERROR_BACKOFF,
            shutdown_grace: shutdown::DEFAULT_HTTP_GRACE,
        }
    }

    fn consumer_config(&self) -> ConsumerConfig {
        ConsumerConfig::new(self.source_queue.clone())
            .with_poll_timeout(self.poll_timeout)
            .with_error_backoff(self.error_backoff)
    }

    /// A consumer blocked in a read needs up to one poll interval to notice
    /// cancellation; allow that plus a second for the dispatch in flight.
    fn consumer_grace(&self) -> Duration {
        self.poll_timeout + Duration::from_secs(1)
    }
}

/// Build the axum Router with the message route and middleware.
/// Used by `run()` and available for integration testing.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/messages", post(routes::messages::post_message))
        .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Run the relay until `signal` resolves: the consumer on its own task, the
/// HTTP server on another, both stopped by the [`ShutdownCoordinator`].
pub async fn run(
    config: ServerConfig,
    registry: Registry,
    queue: Arc<dyn QueueStore>,
    listener: tokio::net::TcpListener,
    signal: impl Future<Output = ()>,
) -> anyhow::Result<()> {
    let addr = listener
        .local_addr()
        .context("failed to read listener address")?;

    let dispatcher = Dispatcher::new(
        Arc::new(registry),
        queue.clone(),
        config.default_target_queue.clone(),
    );
    let coordinator = ShutdownCoordinator::new(config.shutdown_grace, config.consumer_grace());

    let consumer = Consumer::new(config.consumer_config(), queue, dispatcher.clone());
    let consumer_task = tokio::spawn(consumer.run(coordinator.consumer_token()));

    let app = build_router(AppState::new(dispatcher));
    let http_token = coordinator.http_token();
    let server_task = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move { http_token.cancelled().await })
            .await
    });

    tracing::info!(%addr, "HTTP server listening");

    coordinator.drive(signal, server_task, consumer_task).await
}
