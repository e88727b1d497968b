use crate::error::AppError;
use governor::clock::{Clock, DefaultClock};
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use std::num::NonZeroU32;
use std::sync::Mutex;
use std::thread;
use std::time::{Duration, Instant};

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(200);

#[derive(Debug)]
struct BucketState {
    tokens: f64,
    last_refill: Instant,
}

/// Process-wide token bucket modelling the application quota
/// (100 requests / 2 minutes on a development key).
///
/// Refill, check and spend happen under one lock; waiting callers sleep
/// outside it so a sleeping caller never blocks the others.
#[derive(Debug)]
pub struct TokenBucket {
    capacity: f64,
    refill_per_sec: f64,
    poll_interval: Duration,
    state: Mutex<BucketState>,
}

impl TokenBucket {
    /// Starts full.
    pub fn new(capacity: u32, refill_per_sec: f64) -> Self {
        TokenBucket {
            capacity: capacity as f64,
            refill_per_sec: refill_per_sec.max(0.0),
            poll_interval: DEFAULT_POLL_INTERVAL,
            state: Mutex::new(BucketState {
                tokens: capacity as f64,
                last_refill: Instant::now(),
            }),
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn capacity(&self) -> f64 {
        self.capacity
    }

    /// Blocks until a token is available. Returns how long the caller waited.
    pub fn acquire(&self) -> Duration {
        let started = Instant::now();
        loop {
            if self.try_acquire() {
                return started.elapsed();
            }
            tracing::trace!(poll_ms = self.poll_interval.as_millis() as u64, "rate limiter empty, waiting");
            thread::sleep(self.poll_interval);
        }
    }

    pub fn try_acquire(&self) -> bool {
        self.try_acquire_at(Instant::now())
    }

    pub fn try_acquire_at(&self, now: Instant) -> bool {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        self.refill(&mut state, now);
        if state.tokens >= 1.0 {
            state.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    /// Tokens currently available, after refilling up to `now`.
    pub fn available_at(&self, now: Instant) -> f64 {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        self.refill(&mut state, now);
        state.tokens
    }

    pub fn available(&self) -> f64 {
        self.available_at(Instant::now())
    }

    fn refill(&self, state: &mut BucketState, now: Instant) {
        let elapsed = now.saturating_duration_since(state.last_refill);
        state.tokens = (state.tokens + elapsed.as_secs_f64() * self.refill_per_sec).min(self.capacity);
        if now > state.last_refill {
            state.last_refill = now;
        }
    }
}

/// Short-window guard for the per-second application limit, layered under
/// the token bucket.
pub struct BurstGuard {
    limiter: DefaultDirectRateLimiter,
    clock: DefaultClock,
}

impl BurstGuard {
    pub fn per_second(requests: u32) -> Result<Self, AppError> {
        let requests = NonZeroU32::new(requests)
            .ok_or_else(|| AppError::ConfigError("burst limit must be at least 1 request/second".to_string()))?;
        Ok(BurstGuard {
            limiter: RateLimiter::direct(Quota::per_second(requests)),
            clock: DefaultClock::default(),
        })
    }

    pub fn wait(&self) {
        while let Err(not_until) = self.limiter.check() {
            thread::sleep(not_until.wait_time_from(self.clock.now()));
        }
    }
}
