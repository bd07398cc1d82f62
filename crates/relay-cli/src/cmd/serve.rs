use crate::ServeArgs;
use anyhow::{Context, Result};
use relay_core::config::WarnLevel;
use relay_core::Registry;
use relay_server::{redis_queue, QueueStore, RedisQueue, ServerConfig};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

pub fn run(config_file: &Path, args: &ServeArgs) -> Result<()> {
    tracing::info!("starting relay");

    let registry = Registry::load(config_file)
        .with_context(|| format!("failed to load configuration from {}", config_file.display()))?;
    for warning in registry.validate() {
        match warning.level {
            WarnLevel::Error => tracing::error!("{}", warning.message),
            WarnLevel::Warning => tracing::warn!("{}", warning.message),
        }
    }
    tracing::info!(count = registry.len(), "loaded project configurations");

    let config = ServerConfig {
        poll_timeout: Duration::from_secs(args.poll_timeout_secs.max(1)),
        shutdown_grace: Duration::from_secs(args.shutdown_grace_secs),
        ..ServerConfig::new(args.source_list.clone(), args.target_queue.clone())
    };
    let url = redis_queue::redis_url(&args.redis_addr, args.redis_password.as_deref())?;

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async move {
        let queue = RedisQueue::connect(&url)
            .await
            .with_context(|| format!("failed to connect to Redis at {}", args.redis_addr))?;
        queue
            .ping()
            .await
            .with_context(|| format!("failed to ping Redis at {}", args.redis_addr))?;
        tracing::info!(addr = %args.redis_addr, "connected to Redis");

        let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", args.port))
            .await
            .with_context(|| format!("failed to bind port {}", args.port))?;

        let queue: Arc<dyn QueueStore> = Arc::new(queue);
        relay_server::run(
            config,
            registry,
            queue,
            listener,
            relay_server::shutdown::shutdown_signal(),
        )
        .await
    })
}
