//! Continuous-refill token bucket.
//!
//! Tokens accrue at `rate` per second up to `capacity`; each admitted request
//! spends one. A new bucket starts full, so a fresh client may burst up to
//! `capacity` requests immediately.

use tokio::time::Instant;

#[derive(Debug, Clone)]
pub struct TokenBucket {
    rate: f64,
    capacity: f64,
    tokens: f64,
    last_refill: Instant,
}

impl TokenBucket {
    pub fn new(rate: f64, capacity: u32, now: Instant) -> Self {
        let capacity = f64::from(capacity);
        Self {
            rate,
            capacity,
            tokens: capacity,
            last_refill: now,
        }
    }

    /// Spends one token if available.
    pub fn try_acquire(&mut self, now: Instant) -> bool {
        self.refill(now);
        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    /// Tokens available at `now`, without spending any.
    pub fn available(&mut self, now: Instant) -> f64 {
        self.refill(now);
        self.tokens
    }

    /// Credits time elapsed since the last refill. A `now` older than the
    /// last refill credits nothing and leaves the refill point in place, so
    /// callers that read the clock out of order never earn a span twice.
    fn refill(&mut self, now: Instant) {
        if now <= self.last_refill {
            return;
        }
        let elapsed = now.duration_since(self.last_refill).as_secs_f64();
        self.tokens = (self.tokens + elapsed * self.rate).min(self.capacity);
        self.last_refill = now;
    }
}
