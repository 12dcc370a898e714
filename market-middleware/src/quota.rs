//! Per-provider token-bucket rate limiting and the sweep concurrency gate (§4.2).

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use market_types::{Provider, ProviderRateLimit};
use tokio::sync::Semaphore;

/// Per-provider token bucket.
///
/// Mirrors the orchestrator's rate limiter: refill is computed from
/// wall-clock elapsed time on every acquire, and the whole
/// refill-then-check-then-deduct sequence runs inside one critical
/// section so concurrent callers never double-spend tokens.
struct Bucket {
    capacity: f64,
    refill_per_second: f64,
    tokens: f64,
    last_refill: Instant,
}

impl Bucket {
    fn new(limit: ProviderRateLimit) -> Self {
        Self {
            capacity: limit.capacity,
            refill_per_second: limit.refill_per_second,
            tokens: limit.capacity,
            last_refill: Instant::now(),
        }
    }

    fn refill(&mut self, now: Instant) {
        let elapsed = now.duration_since(self.last_refill).as_secs_f64();
        self.tokens = (self.tokens + elapsed * self.refill_per_second).min(self.capacity);
        self.last_refill = now;
    }

    /// Seconds until at least one token is available, assuming no further deductions.
    fn deficit_seconds(&self, now: Instant) -> f64 {
        let mut tokens = self.tokens;
        let elapsed = now.duration_since(self.last_refill).as_secs_f64();
        tokens += elapsed * self.refill_per_second;
        if tokens >= 1.0 {
            0.0
        } else if self.refill_per_second <= 0.0 {
            f64::INFINITY
        } else {
            (1.0 - tokens) / self.refill_per_second
        }
    }
}

/// Token-bucket rate limiter keyed by external provider.
///
/// `acquire` blocks (via `tokio::time::sleep`) until a token is
/// available, then deducts it. Acquisitions are strictly serialised
/// per bucket; buckets for distinct providers are independent.
pub struct RateLimiter {
    buckets: Mutex<HashMap<Provider, Bucket>>,
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

impl RateLimiter {
    /// Build a limiter with a bucket for every provider, seeded from
    /// [`Provider::default_limit`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_limits(Provider::all().into_iter().map(|p| (p, p.default_limit())).collect())
    }

    /// Build a limiter with explicit per-provider overrides (tests).
    #[must_use]
    pub fn with_limits(limits: HashMap<Provider, ProviderRateLimit>) -> Self {
        let buckets = limits.into_iter().map(|(provider, limit)| (provider, Bucket::new(limit))).collect();
        Self {
            buckets: Mutex::new(buckets),
        }
    }

    /// Acquire `n` tokens from `provider`'s bucket, blocking as needed.
    ///
    /// # Panics
    /// Panics if the internal mutex is poisoned, or if `provider` has
    /// no configured bucket (all seven providers are seeded by `new`).
    pub async fn acquire(&self, provider: Provider, n: u32) {
        debug_assert!(n > 0);
        loop {
            let deficit = {
                let mut buckets = self.buckets.lock().expect("rate limiter mutex poisoned");
                let bucket = buckets.get_mut(&provider).expect("provider bucket missing");
                let now = Instant::now();
                bucket.refill(now);
                if bucket.tokens >= f64::from(n) {
                    bucket.tokens -= f64::from(n);
                    0.0
                } else {
                    bucket.deficit_seconds(now)
                }
            };
            if deficit <= 0.0 {
                return;
            }
            tokio::time::sleep(Duration::from_secs_f64(deficit)).await;
        }
    }

    /// Current token count for `provider`, for observability/tests.
    ///
    /// # Panics
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn tokens_available(&self, provider: Provider) -> f64 {
        let mut buckets = self.buckets.lock().expect("rate limiter mutex poisoned");
        let bucket = buckets.get_mut(&provider).expect("provider bucket missing");
        bucket.refill(Instant::now());
        bucket.tokens
    }
}

/// Global sweep semaphore: caps how many assets sweep concurrently (§4.2, §5).
///
/// Individual bots within one asset's sweep still fan out concurrently;
/// this only gates the number of *assets* in flight.
pub struct SweepLimiter {
    semaphore: Semaphore,
}

impl SweepLimiter {
    /// Build a limiter allowing up to `max_concurrent` simultaneous asset sweeps.
    #[must_use]
    pub fn new(max_concurrent: usize) -> Self {
        Self {
            semaphore: Semaphore::new(max_concurrent.max(1)),
        }
    }

    /// Acquire a permit, held for the duration of one asset's sweep.
    ///
    /// # Panics
    /// Panics if the semaphore has been closed, which this type never does.
    pub async fn acquire(&self) -> tokio::sync::SemaphorePermit<'_> {
        self.semaphore.acquire().await.expect("sweep semaphore closed")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn acquire_deducts_and_blocks_when_empty() {
        let mut limits = HashMap::new();
        limits.insert(Provider::Fmp, ProviderRateLimit::new(1.0, 1000.0));
        let limiter = RateLimiter::with_limits(limits);
        limiter.acquire(Provider::Fmp, 1).await;
        assert!(limiter.tokens_available(Provider::Fmp) < 0.5);
    }

    #[tokio::test]
    async fn refill_replenishes_over_time() {
        let mut limits = HashMap::new();
        limits.insert(Provider::Fred, ProviderRateLimit::new(2.0, 1000.0));
        let limiter = RateLimiter::with_limits(limits);
        limiter.acquire(Provider::Fred, 2).await;
        tokio::time::sleep(Duration::from_millis(5)).await;
        assert!(limiter.tokens_available(Provider::Fred) > 0.0);
    }

    #[tokio::test]
    async fn sweep_limiter_caps_concurrency() {
        let limiter = SweepLimiter::new(1);
        let _permit = limiter.acquire().await;
        assert_eq!(limiter.semaphore.available_permits(), 0);
    }
}

#[cfg(test)]
mod bucket_props {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn refill_never_exceeds_capacity(capacity in 1.0f64..100.0, refill_rate in 0.0f64..1000.0, elapsed_ms in 0u64..10_000) {
            let mut bucket = Bucket::new(ProviderRateLimit::new(capacity, refill_rate));
            bucket.tokens = 0.0;
            bucket.refill(bucket.last_refill + Duration::from_millis(elapsed_ms));
            prop_assert!(bucket.tokens <= capacity);
        }

        #[test]
        fn deficit_is_zero_once_enough_tokens_accrue(capacity in 1.0f64..100.0, refill_rate in 0.1f64..1000.0) {
            let bucket = Bucket::new(ProviderRateLimit::new(capacity, refill_rate));
            prop_assert_eq!(bucket.deficit_seconds(bucket.last_refill), 0.0);
        }
    }
}
