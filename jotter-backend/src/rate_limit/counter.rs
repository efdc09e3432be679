//! Hit counters backing the admission gate.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use redis::aio::{ConnectionManager, ConnectionManagerConfig};
use redis::AsyncCommands;
use thiserror::Error;
use tokio::time::timeout;

/// Bound on a single counter round-trip so a dead store fails fast
/// instead of stalling the request.
const RESPONSE_TIMEOUT: Duration = Duration::from_millis(500);

#[derive(Error, Debug)]
pub enum CounterError {
    #[error("counter store error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("counter store timed out")]
    Timeout,
}

/// Atomically record one hit against `key` and return the count inside
/// the current window. The window is armed on the first hit and resets
/// purely by expiry.
#[async_trait]
pub trait HitCounter: Send + Sync {
    async fn hit(&self, key: &str, window: Duration) -> Result<u64, CounterError>;
}

/// Redis-backed counter - INCR plus a TTL armed on the first hit of the
/// window. Shared across server instances; Redis owns the expiry.
pub struct RedisCounter {
    conn: ConnectionManager,
}

impl RedisCounter {
    pub async fn connect(url: &str) -> Result<Self, CounterError> {
        let config = ConnectionManagerConfig::new()
            .set_number_of_retries(1)
            .set_connection_timeout(Duration::from_millis(500));

        let client = redis::Client::open(url)?;
        let conn = client.get_connection_manager_with_config(config).await?;

        Ok(Self { conn })
    }
}

#[async_trait]
impl HitCounter for RedisCounter {
    async fn hit(&self, key: &str, window: Duration) -> Result<u64, CounterError> {
        let mut conn = self.conn.clone();
        let counter_key = format!("jotter:rl:{}", key);

        let count: u64 = timeout(RESPONSE_TIMEOUT, conn.incr(&counter_key, 1_u64))
            .await
            .map_err(|_| CounterError::Timeout)??;

        if count == 1 {
            // First hit of the window arms the TTL
            let _: bool = timeout(
                RESPONSE_TIMEOUT,
                conn.expire(&counter_key, window.as_secs() as i64),
            )
            .await
            .map_err(|_| CounterError::Timeout)??;
        }

        Ok(count)
    }
}

struct Window {
    count: u64,
    started_at: Instant,
}

/// In-process fixed-window counter. Used when no shared counter store is
/// configured (single-instance deployments and tests); the budget is then
/// per server instance rather than global.
pub struct MemoryCounter {
    windows: Mutex<HashMap<String, Window>>,
}

impl MemoryCounter {
    pub fn new() -> Self {
        Self {
            windows: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for MemoryCounter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HitCounter for MemoryCounter {
    async fn hit(&self, key: &str, window: Duration) -> Result<u64, CounterError> {
        let mut windows = self.windows.lock().unwrap();

        let slot = windows.entry(key.to_string()).or_insert(Window {
            count: 0,
            started_at: Instant::now(),
        });

        if slot.started_at.elapsed() >= window {
            slot.count = 0;
            slot.started_at = Instant::now();
        }

        slot.count += 1;
        Ok(slot.count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_counter_counts_per_key() {
        let counter = MemoryCounter::new();
        let window = Duration::from_secs(60);

        assert_eq!(counter.hit("a", window).await.unwrap(), 1);
        assert_eq!(counter.hit("a", window).await.unwrap(), 2);
        assert_eq!(counter.hit("b", window).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_memory_counter_window_reset() {
        let counter = MemoryCounter::new();
        let window = Duration::from_millis(20);

        assert_eq!(counter.hit("k", window).await.unwrap(), 1);
        assert_eq!(counter.hit("k", window).await.unwrap(), 2);

        tokio::time::sleep(Duration::from_millis(30)).await;

        // A new window started; the old count is gone
        assert_eq!(counter.hit("k", window).await.unwrap(), 1);
    }
}
