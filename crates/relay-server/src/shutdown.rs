//! Orderly stop of both ingress paths.
//!
//! On a termination signal the HTTP listener stops accepting and is given a
//! bounded grace period to finish in-flight requests. Only then is the
//! consumer cancelled and awaited, also with a bound. Nothing waits forever.

use std::future::Future;
use std::time::Duration;

use anyhow::Context;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Default time allowed for in-flight HTTP requests after a signal.
pub const DEFAULT_HTTP_GRACE: Duration = Duration::from_secs(5);

/// Resolves on SIGINT (Ctrl-C) or, on Unix, SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}

/// Owns the cancellation tokens for the HTTP server and the consumer and
/// drives them in order.
#[derive(Debug, Clone)]
pub struct ShutdownCoordinator {
    http: CancellationToken,
    consumer: CancellationToken,
    http_grace: Duration,
    consumer_grace: Duration,
}

impl ShutdownCoordinator {
    pub fn new(http_grace: Duration, consumer_grace: Duration) -> Self {
        Self {
            http: CancellationToken::new(),
            consumer: CancellationToken::new(),
            http_grace,
            consumer_grace,
        }
    }

    /// Token the HTTP server's graceful-shutdown future waits on.
    pub fn http_token(&self) -> CancellationToken {
        self.http.clone()
    }

    /// Token the consumer loop checks before every read.
    pub fn consumer_token(&self) -> CancellationToken {
        self.consumer.clone()
    }

    /// Wait for `signal` (or for the server to exit on its own), then stop
    /// the server and the consumer in that order.
    ///
    /// Returns the server's error if it failed rather than being shut down.
    pub async fn drive(
        self,
        signal: impl Future<Output = ()>,
        mut server: JoinHandle<std::io::Result<()>>,
        consumer: JoinHandle<()>,
    ) -> anyhow::Result<()> {
        let exited = tokio::select! {
            () = signal => {
                info!("received shutdown signal, cleaning up");
                None
            }
            res = &mut server => Some(res),
        };

        // (a) stop accepting and drain HTTP within the grace period
        self.http.cancel();
        let server_result = match exited {
            Some(res) => Some(res),
            None => match tokio::time::timeout(self.http_grace, &mut server).await {
                Ok(res) => Some(res),
                Err(_) => {
                    warn!(
                        grace_secs = self.http_grace.as_secs_f64(),
                        "HTTP grace period elapsed; abandoning in-flight requests"
                    );
                    server.abort();
                    None
                }
            },
        };

        // (b) cancel the consumer, (c) wait for it to notice
        self.consumer.cancel();
        match tokio::time::timeout(self.consumer_grace, consumer).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(error = %e, "consumer task failed"),
            Err(_) => warn!("consumer did not stop within its grace period"),
        }

        info!("shutdown complete");

        match server_result {
            None | Some(Ok(Ok(()))) => Ok(()),
            Some(Ok(Err(e))) => Err(e).context("HTTP server error"),
            Some(Err(e)) => Err(e).context("HTTP server task failed"),
        }
    }
}
