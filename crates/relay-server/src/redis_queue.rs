use std::time::Duration;

use async_trait::async_trait;
use redis::aio::{ConnectionManager, MultiplexedConnection};
use tokio::sync::Mutex;
use tracing::debug;

use crate::queue::{QueueError, QueueStore};

/// Build a `redis://` URL for database 0 from a `host:port` address and an
/// optional password. The password is percent-encoded by the URL builder.
pub fn redis_url(addr: &str, password: Option<&str>) -> Result<String, QueueError> {
    let mut url = url::Url::parse(&format!("redis://{addr}/0"))
        .map_err(|e| QueueError::InvalidAddress(format!("{addr}: {e}")))?;
    if let Some(password) = password.filter(|p| !p.is_empty()) {
        url.set_password(Some(password))
            .map_err(|()| QueueError::InvalidAddress(addr.to_string()))?;
    }
    Ok(url.to_string())
}

/// BLPOP timeout in whole seconds. Servers before 6.0 reject fractional
/// values, and zero would block forever.
fn blpop_timeout(wait: Duration) -> u64 {
    wait.as_secs().max(1)
}

/// Redis-backed queue store.
///
/// Writes go through a [`ConnectionManager`], which is cheap to clone and
/// reconnects on its own. Blocking pops get a dedicated connection: a BLPOP
/// parks the connection it runs on, and it must not hold up pushes issued by
/// HTTP handlers.
pub struct RedisQueue {
    client: redis::Client,
    writer: ConnectionManager,
    reader: Mutex<Option<MultiplexedConnection>>,
}

impl RedisQueue {
    pub async fn connect(url: &str) -> Result<Self, QueueError> {
        let client = redis::Client::open(url)?;
        let writer = client.get_connection_manager().await?;
        Ok(Self {
            client,
            writer,
            reader: Mutex::new(None),
        })
    }

    async fn reader(&self) -> Result<MultiplexedConnection, QueueError> {
        let mut slot = self.reader.lock().await;
        if let Some(conn) = slot.as_ref() {
            return Ok(conn.clone());
        }
        debug!("opening blocking-read connection");
        let conn = self.client.get_multiplexed_async_connection().await?;
        *slot = Some(conn.clone());
        Ok(conn)
    }

    async fn drop_reader(&self) {
        *self.reader.lock().await = None;
    }
}

#[async_trait]
impl QueueStore for RedisQueue {
    async fn push_tail(&self, queue: &str, payload: &str) -> Result<(), QueueError> {
        let mut conn = self.writer.clone();
        let _len: i64 = redis::cmd("RPUSH")
            .arg(queue)
            .arg(payload)
            .query_async(&mut conn)
            .await?;
        Ok(())
    }

    async fn pop_head(&self, queue: &str, wait: Duration) -> Result<Option<String>, QueueError> {
        let mut conn = self.reader().await?;
        let reply: redis::RedisResult<Option<(String, String)>> = redis::cmd("BLPOP")
            .arg(queue)
            .arg(blpop_timeout(wait))
            .query_async(&mut conn)
            .await;
        match reply {
            Ok(popped) => Ok(popped.map(|(_list, payload)| payload)),
            Err(e) => {
                // Reconnect on the next read rather than reusing a broken connection.
                self.drop_reader().await;
                Err(e.into())
            }
        }
    }

    async fn ping(&self) -> Result<(), QueueError> {
        let mut conn = self.writer.clone();
        let _pong: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_without_password() {
        assert_eq!(
            redis_url("localhost:6379", None).unwrap(),
            "redis://localhost:6379/0"
        );
        assert_eq!(
            redis_url("localhost:6379", Some("")).unwrap(),
            "redis://localhost:6379/0"
        );
    }

    #[test]
    fn url_with_password_is_encoded() {
        let url = redis_url("cache.internal:6380", Some("p@ss word")).unwrap();
        assert_eq!(url, "redis://:p%40ss%20word@cache.internal:6380/0");
    }

    #[test]
    fn blpop_timeout_is_whole_seconds() {
        assert_eq!(blpop_timeout(Duration::from_secs(5)), 5);
        assert_eq!(blpop_timeout(Duration::from_millis(2500)), 2);
        assert_eq!(blpop_timeout(Duration::from_millis(20)), 1);
    }

    #[test]
    fn url_rejects_garbage_address() {
        assert!(matches!(
            redis_url("bad host:port", None),
            Err(QueueError::InvalidAddress(_))
        ));
    }
}
