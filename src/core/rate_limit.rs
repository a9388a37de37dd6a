use crate::domain::ports::{Clock, RateLimiter};
use async_trait::async_trait;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Google documents a ceiling of 10 requests per second; 200 ms leaves margin.
pub const DEFAULT_REQUEST_INTERVAL: Duration = Duration::from_millis(200);

#[derive(Debug, Clone, Copy, Default)]
pub struct TokioClock;

#[async_trait]
impl Clock for TokioClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Lets one request through per `interval`. The first permit is granted immediately.
pub struct FixedIntervalGate<C: Clock = TokioClock> {
    interval: Duration,
    clock: C,
    next_slot: Mutex<Option<Instant>>,
}

impl FixedIntervalGate<TokioClock> {
    pub fn new(interval: Duration) -> Self {
        Self::with_clock(interval, TokioClock)
    }
}

impl<C: Clock> FixedIntervalGate<C> {
    pub fn with_clock(interval: Duration, clock: C) -> Self {
        Self {
            interval,
            clock,
            next_slot: Mutex::new(None),
        }
    }

    /// Reserves the next slot and returns how long to wait for it.
    fn reserve(&self, now: Instant) -> Duration {
        let mut next_slot = self
            .next_slot
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let slot = match *next_slot {
            Some(next) if next > now => next,
            _ => now,
        };
        *next_slot = Some(slot + self.interval);
        slot.saturating_duration_since(now)
    }
}

#[async_trait]
impl<C: Clock> RateLimiter for FixedIntervalGate<C> {
    async fn acquire(&self) {
        let wait = self.reserve(self.clock.now());
        if !wait.is_zero() {
            tracing::trace!("Rate limiter waiting {:?}", wait);
            self.clock.sleep(wait).await;
        }
    }
}
