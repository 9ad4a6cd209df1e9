//! # Rate Limiter Registry
//!
//! One token bucket per client, created on the client's first request and
//! evicted by [`RateLimiterRegistry::sweep`] once idle.
//!
//! ## Locking
//! - Lookup, lazy insert, the last-seen update and sweep removal all happen
//!   under the single `clients` mutex, so a sweep never races an admission
//!   for the same key.
//! - Token arithmetic runs under the entry's own mutex after the map lock is
//!   released, so a busy client never holds up unrelated keys for longer
//!   than the map critical section.

use std::collections::HashMap;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::time::Instant;

use super::bucket::TokenBucket;
use super::errors::{AdmissionError, AdmissionResult};

/// Stable per-client key: the client's IP address, port stripped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClientKey(IpAddr);

impl ClientKey {
    /// Parses `"ip:port"` or a bare IP address.
    pub fn parse(raw: &str) -> AdmissionResult<Self> {
        let raw = raw.trim();
        if let Ok(addr) = raw.parse::<SocketAddr>() {
            return Ok(Self(addr.ip()));
        }
        raw.parse::<IpAddr>()
            .map(Self)
            .map_err(|_| AdmissionError::MalformedClientAddress(raw.to_string()))
    }
}

impl From<SocketAddr> for ClientKey {
    fn from(addr: SocketAddr) -> Self {
        Self(addr.ip())
    }
}

impl From<IpAddr> for ClientKey {
    fn from(ip: IpAddr) -> Self {
        Self(ip)
    }
}

impl fmt::Display for ClientKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

struct ClientEntry {
    bucket: Arc<Mutex<TokenBucket>>,
    last_seen: Instant,
}

/// Per-client token buckets behind a single exclusion domain.
pub struct RateLimiterRegistry {
    rate: f64,
    burst: u32,
    clients: Mutex<HashMap<ClientKey, ClientEntry>>,
}

impl RateLimiterRegistry {
    pub fn new(rate: f64, burst: u32) -> Self {
        Self {
            rate,
            burst,
            clients: Mutex::new(HashMap::new()),
        }
    }

    /// Records the client as seen now and spends one of its tokens.
    ///
    /// Returns `false` when the client's bucket is empty; nothing but the
    /// last-seen time changes in that case.
    pub fn admit(&self, key: &ClientKey) -> bool {
        let now = Instant::now();

        let bucket = {
            let mut clients = self.lock_clients();
            let entry = clients.entry(*key).or_insert_with(|| ClientEntry {
                bucket: Arc::new(Mutex::new(TokenBucket::new(self.rate, self.burst, now))),
                last_seen: now,
            });
            entry.last_seen = now;
            Arc::clone(&entry.bucket)
        };

        let mut bucket = bucket.lock().unwrap_or_else(PoisonError::into_inner);
        bucket.try_acquire(now)
    }

    /// Removes every client idle for longer than `idle_threshold` and
    /// returns how many were removed.
    pub fn sweep(&self, idle_threshold: Duration) -> usize {
        let now = Instant::now();
        let mut clients = self.lock_clients();
        let before = clients.len();
        clients.retain(|_, entry| now.saturating_duration_since(entry.last_seen) <= idle_threshold);
        before - clients.len()
    }

    /// Number of tracked clients.
    pub fn len(&self) -> usize {
        self.lock_clients().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, key: &ClientKey) -> bool {
        self.lock_clients().contains_key(key)
    }

    // The map holds plain data, so a panic elsewhere cannot leave it torn.
    fn lock_clients(&self) -> MutexGuard<'_, HashMap<ClientKey, ClientEntry>> {
        self.clients.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for RateLimiterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RateLimiterRegistry")
            .field("rate", &self.rate)
            .field("burst", &self.burst)
            .field("clients", &self.len())
            .finish()
    }
}
