//! Admission gate: a fixed-window request-rate limiter consulted before
//! every note operation.
//!
//! The counter lives in a shared store (Redis) so multiple server
//! instances enforce one budget; window expiry is owned entirely by the
//! store's TTL, the gate never runs cleanup.

pub mod counter;
pub mod middleware;

use std::sync::Arc;
use std::time::Duration;

use counter::{CounterError, HitCounter};

/// How the admission key is derived from the incoming request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyStrategy {
    /// One shared budget for every caller. A single noisy client can
    /// exhaust it for everyone - kept as the default because it is the
    /// observable behavior clients were written against.
    Global,
    /// A separate budget per caller peer address.
    PerClient,
}

impl KeyStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            KeyStrategy::Global => "global",
            KeyStrategy::PerClient => "per-client",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "global" => Some(KeyStrategy::Global),
            "per-client" | "per_client" => Some(KeyStrategy::PerClient),
            _ => None,
        }
    }
}

/// Outcome of an admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allowed,
    Limited,
}

pub struct RateLimiter {
    counter: Arc<dyn HitCounter>,
    max_requests: u64,
    window: Duration,
    strategy: KeyStrategy,
}

impl RateLimiter {
    pub fn new(
        counter: Arc<dyn HitCounter>,
        max_requests: u64,
        window: Duration,
        strategy: KeyStrategy,
    ) -> Self {
        Self {
            counter,
            max_requests,
            window,
            strategy,
        }
    }

    /// Count this request against its budget and decide admission.
    /// `client` is the caller's peer address, only consulted in
    /// per-client mode.
    pub async fn check(&self, client: Option<&str>) -> Result<Decision, CounterError> {
        let key = match self.strategy {
            KeyStrategy::Global => "global".to_string(),
            KeyStrategy::PerClient => format!("client:{}", client.unwrap_or("unknown")),
        };

        let count = self.counter.hit(&key, self.window).await?;

        if count > self.max_requests {
            Ok(Decision::Limited)
        } else {
            Ok(Decision::Allowed)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::counter::MemoryCounter;

    fn limiter(max: u64, strategy: KeyStrategy) -> RateLimiter {
        RateLimiter::new(
            Arc::new(MemoryCounter::new()),
            max,
            Duration::from_secs(60),
            strategy,
        )
    }

    #[tokio::test]
    async fn test_threshold_boundary() {
        let limiter = limiter(100, KeyStrategy::Global);

        for _ in 0..100 {
            let decision = limiter.check(Some("10.0.0.1")).await.unwrap();
            assert_eq!(decision, Decision::Allowed);
        }

        // Request 101 within the window is rejected
        let decision = limiter.check(Some("10.0.0.1")).await.unwrap();
        assert_eq!(decision, Decision::Limited);
    }

    #[tokio::test]
    async fn test_global_key_shares_budget_across_callers() {
        let limiter = limiter(3, KeyStrategy::Global);

        for peer in ["10.0.0.1", "10.0.0.2", "10.0.0.3"] {
            assert_eq!(limiter.check(Some(peer)).await.unwrap(), Decision::Allowed);
        }

        // A fourth caller is rejected even though it never hit before
        assert_eq!(
            limiter.check(Some("10.0.0.4")).await.unwrap(),
            Decision::Limited
        );
    }

    #[tokio::test]
    async fn test_per_client_keys_are_isolated() {
        let limiter = limiter(1, KeyStrategy::PerClient);

        assert_eq!(
            limiter.check(Some("10.0.0.1")).await.unwrap(),
            Decision::Allowed
        );
        assert_eq!(
            limiter.check(Some("10.0.0.1")).await.unwrap(),
            Decision::Limited
        );

        // A different caller still has its own budget
        assert_eq!(
            limiter.check(Some("10.0.0.2")).await.unwrap(),
            Decision::Allowed
        );
    }
}
