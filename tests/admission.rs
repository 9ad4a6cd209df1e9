//! Admission Control Tests
//!
//! Properties of the per-client rate limiter:
//! 1. A new client is always admitted while burst >= 1
//! 2. Within a no-refill window at most `burst` admits succeed
//! 3. Sweep evicts exactly the clients idle for longer than the threshold
//! 4. Concurrent admits for one client never over-spend

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use coinvault::admission::{ClientKey, RateLimiterRegistry};

fn client(n: u8) -> ClientKey {
    ClientKey::parse(&format!("10.0.0.{n}:5000")).unwrap()
}

// =============================================================================
// BURST
// =============================================================================

/// First admit succeeds for every unseen client and every burst size.
#[tokio::test(start_paused = true)]
async fn test_first_admit_always_succeeds() {
    for burst in 1..=5 {
        let registry = RateLimiterRegistry::new(0.5, burst);
        for n in 1..=50 {
            assert!(registry.admit(&client(n)), "burst {burst}, client {n}");
        }
    }
}

/// N admits with no time passing: exactly `burst` succeed.
#[tokio::test(start_paused = true)]
async fn test_at_most_burst_admits_without_refill() {
    for burst in [1u32, 2, 4, 10] {
        let registry = RateLimiterRegistry::new(2.0, burst);
        let admitted = (0..50).filter(|_| registry.admit(&client(1))).count();
        assert_eq!(admitted, burst as usize);
    }
}

/// The sustained rate caps admits once the burst is spent.
#[tokio::test(start_paused = true)]
async fn test_sustained_rate() {
    let registry = RateLimiterRegistry::new(2.0, 4);
    let key = client(1);

    let mut admitted = 0;
    // Ten seconds at 10 requests per second.
    for _ in 0..100 {
        if registry.admit(&key) {
            admitted += 1;
        }
        tokio::time::advance(Duration::from_millis(100)).await;
    }

    // Burst of 4 plus about 2 per second for 10 seconds.
    assert!((22..=25).contains(&admitted), "admitted {admitted}");
}

/// Many threads hammering one client spend no more than the burst.
#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_concurrent_admits_do_not_overspend() {
    let registry = Arc::new(RateLimiterRegistry::new(0.001, 16));
    let admitted = Arc::new(AtomicUsize::new(0));

    let mut tasks = Vec::new();
    for _ in 0..8 {
        let registry = Arc::clone(&registry);
        let admitted = Arc::clone(&admitted);
        tasks.push(tokio::spawn(async move {
            for _ in 0..50 {
                if registry.admit(&client(1)) {
                    admitted.fetch_add(1, Ordering::SeqCst);
                }
            }
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }

    assert_eq!(admitted.load(Ordering::SeqCst), 16);
    assert_eq!(registry.len(), 1);
}

// =============================================================================
// SWEEP
// =============================================================================

/// Entries are removed iff idle time exceeds the threshold.
#[tokio::test(start_paused = true)]
async fn test_sweep_removes_iff_idle_exceeds_threshold() {
    let registry = RateLimiterRegistry::new(2.0, 4);
    let threshold = Duration::from_secs(180);

    // Client n was last seen (n * 30) seconds before the sweep.
    for n in (1..=10u8).rev() {
        registry.admit(&client(n));
        tokio::time::advance(Duration::from_secs(30)).await;
    }
    // Client 10 was admitted first: idle 300s. Client 1 last: idle 30s.
    assert_eq!(registry.len(), 10);

    let evicted = registry.sweep(threshold);

    for n in 1..=10u8 {
        let idle = u64::from(n) * 30;
        assert_eq!(
            registry.contains(&client(n)),
            idle <= 180,
            "client {n} idle {idle}s"
        );
    }
    assert_eq!(evicted, 4);
}

/// Concurrent admits and sweeps: an entry admitted after every sweep
/// survives, and the registry stays consistent.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_admit_and_sweep_interleave() {
    let registry = Arc::new(RateLimiterRegistry::new(1000.0, 1000));

    let sweeper = {
        let registry = Arc::clone(&registry);
        tokio::spawn(async move {
            for _ in 0..500 {
                registry.sweep(Duration::from_secs(60));
                tokio::task::yield_now().await;
            }
        })
    };

    let admitter = {
        let registry = Arc::clone(&registry);
        tokio::spawn(async move {
            for i in 0..500u32 {
                let n = (i % 20) as u8 + 1;
                registry.admit(&client(n));
                tokio::task::yield_now().await;
            }
        })
    };

    sweeper.await.unwrap();
    admitter.await.unwrap();

    // Nothing was idle for a minute, so nothing was evicted.
    assert_eq!(registry.len(), 20);
}
