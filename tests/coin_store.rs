//! Coin Store Tests
//!
//! Exercises the record store end to end against an in-memory SQLite
//! database:
//! 1. Version-checked updates under concurrency
//! 2. Conflict vs not-found disambiguation
//! 3. Listing: filters, full-text title match, stable paging, counts

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use coinvault::coin::{Coin, CoinDraft, Runtime};
use coinvault::store::{CoinStore, Filters, SortKey, SqliteStorage, StoreConfig, StoreError};
use tempfile::TempDir;

async fn store() -> CoinStore {
    let storage = SqliteStorage::open_in_memory().unwrap();
    let store = CoinStore::new(Arc::new(storage), Duration::from_secs(3));
    store.bootstrap().await.unwrap();
    store
}

fn draft(title: &str, year: i32, genres: &[&str]) -> CoinDraft {
    CoinDraft {
        title: title.to_string(),
        year,
        runtime: Runtime(12),
        genres: genres.iter().map(|g| g.to_string()).collect(),
    }
}

fn filters(page: u32, page_size: u32, sort: &str) -> Filters {
    Filters {
        page,
        page_size,
        sort: SortKey::parse(sort).unwrap(),
    }
}

// =============================================================================
// OPTIMISTIC CONCURRENCY
// =============================================================================

/// Insert, update with the observed version, then replay the stale version.
#[tokio::test]
async fn test_shilling_update_then_stale_replay() {
    let store = store().await;

    let coin = store
        .insert(&draft("Shilling", 1816, &["England", "12 pence"]))
        .await
        .unwrap();
    assert_eq!(coin.version, 1);

    let mut edited = coin.clone();
    edited.title = "Shilling (George III)".to_string();
    let new_version = store.update(&edited).await.unwrap();
    assert_eq!(new_version, coin.version + 1);

    let fetched = store.get(coin.id).await.unwrap();
    assert_eq!(fetched.title, "Shilling (George III)");
    assert_eq!(fetched.version, 2);
    assert_eq!(fetched.genres, vec!["England", "12 pence"]);

    // Same stale version again.
    let result = store.update(&edited).await;
    assert!(matches!(result, Err(StoreError::EditConflict)));
    assert_eq!(store.get(coin.id).await.unwrap().version, 2);
}

/// Two writers holding the same version race; exactly one wins.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_updates_exactly_one_wins() {
    let store = store().await;

    for round in 0..20 {
        let coin = store
            .insert(&draft(&format!("Florin {round}"), 1849, &["England"]))
            .await
            .unwrap();

        let mut a = coin.clone();
        a.title = format!("Florin {round} A");
        let mut b = coin.clone();
        b.title = format!("Florin {round} B");

        let (store_a, store_b) = (store.clone(), store.clone());
        let task_a = tokio::spawn(async move { store_a.update(&a).await });
        let task_b = tokio::spawn(async move { store_b.update(&b).await });
        let results = [task_a.await.unwrap(), task_b.await.unwrap()];

        let wins: Vec<i64> = results.iter().filter_map(|r| r.as_ref().ok().copied()).collect();
        let conflicts = results
            .iter()
            .filter(|r| matches!(r, Err(StoreError::EditConflict)))
            .count();

        assert_eq!(wins, vec![2], "round {round}: {results:?}");
        assert_eq!(conflicts, 1, "round {round}");
        assert_eq!(store.get(coin.id).await.unwrap().version, 2);
    }
}

/// Many writers each re-read and retry until they land; no increment is lost.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_retrying_writers_never_lose_increments() {
    let store = store().await;
    let coin = store.insert(&draft("Crown", 1900, &["England"])).await.unwrap();

    let mut tasks = Vec::new();
    for _ in 0..8 {
        let store = store.clone();
        let id = coin.id;
        tasks.push(tokio::spawn(async move {
            loop {
                let mut current = store.get(id).await.unwrap();
                current.year += 1;
                match store.update(&current).await {
                    Ok(version) => return version,
                    Err(StoreError::EditConflict) => continue,
                    Err(e) => panic!("unexpected {e:?}"),
                }
            }
        }));
    }

    let mut versions = HashSet::new();
    for task in tasks {
        assert!(versions.insert(task.await.unwrap()));
    }

    let final_coin = store.get(coin.id).await.unwrap();
    assert_eq!(final_coin.version, 9);
    assert_eq!(final_coin.year, 1908);
    assert_eq!(versions, (2..=9).collect());
}

/// A deleted record yields conflict on update and not-found on get.
#[tokio::test]
async fn test_update_after_delete_is_conflict_and_get_is_not_found() {
    let store = store().await;
    let coin = store.insert(&draft("Groat", 1836, &["England"])).await.unwrap();

    store.delete(coin.id).await.unwrap();

    assert!(matches!(store.update(&coin).await, Err(StoreError::EditConflict)));
    assert!(matches!(store.get(coin.id).await, Err(StoreError::NotFound)));
    assert!(matches!(store.delete(coin.id).await, Err(StoreError::NotFound)));
}

/// Non-positive ids are not found.
#[tokio::test]
async fn test_non_positive_ids() {
    let store = store().await;
    assert!(matches!(store.get(0).await, Err(StoreError::NotFound)));
    assert!(matches!(store.get(-5).await, Err(StoreError::NotFound)));
    assert!(matches!(store.delete(0).await, Err(StoreError::NotFound)));
}

// =============================================================================
// LISTING
// =============================================================================

/// No rows: empty page, zero-valued metadata.
#[tokio::test]
async fn test_list_empty_table() {
    let store = store().await;
    let (coins, metadata) = store.list("", &[], &Filters::default()).await.unwrap();

    assert!(coins.is_empty());
    assert!(metadata.is_empty());
    assert_eq!(serde_json::to_value(metadata).unwrap(), serde_json::json!({}));
}

/// Concatenated pages cover every row once, ordered by (year, id), even
/// with many duplicate years.
#[tokio::test]
async fn test_paging_is_stable_with_duplicate_sort_values() {
    let store = store().await;
    for i in 0..23 {
        let year = 1900 + (i % 3);
        store
            .insert(&draft(&format!("Penny {i}"), year, &["England"]))
            .await
            .unwrap();
    }

    for sort in ["year", "-year"] {
        let mut seen: Vec<Coin> = Vec::new();
        let mut page = 1;
        loop {
            let (coins, metadata) = store.list("", &[], &filters(page, 5, sort)).await.unwrap();
            assert_eq!(metadata.total_records, 23);
            assert_eq!(metadata.last_page, 5);
            assert_eq!(metadata.current_page, u64::from(page));
            seen.extend(coins);
            if u64::from(page) == metadata.last_page {
                break;
            }
            page += 1;
        }

        assert_eq!(seen.len(), 23);
        let ids: HashSet<i64> = seen.iter().map(|c| c.id).collect();
        assert_eq!(ids.len(), 23, "duplicates for sort {sort}");

        for pair in seen.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            if a.year == b.year {
                assert!(a.id < b.id, "tie not broken by id for sort {sort}");
            } else if sort == "year" {
                assert!(a.year < b.year);
            } else {
                assert!(a.year > b.year);
            }
        }
    }
}

/// A page past the end is empty, while still reporting no metadata.
#[tokio::test]
async fn test_page_past_end() {
    let store = store().await;
    store.insert(&draft("Farthing", 1860, &["England"])).await.unwrap();

    let (coins, metadata) = store.list("", &[], &filters(9, 20, "id")).await.unwrap();
    assert!(coins.is_empty());
    assert!(metadata.is_empty());
}

/// Title match is case-insensitive and token based; genres must be a superset.
#[tokio::test]
async fn test_title_and_genre_filters() {
    let store = store().await;
    store
        .insert(&draft("Gold Sovereign", 1817, &["England", "gold"]))
        .await
        .unwrap();
    store
        .insert(&draft("Half Sovereign", 1817, &["England", "gold", "half"]))
        .await
        .unwrap();
    store
        .insert(&draft("Silver Dollar", 1794, &["USA", "silver"]))
        .await
        .unwrap();

    let (coins, metadata) = store.list("SOVEREIGN", &[], &Filters::default()).await.unwrap();
    assert_eq!(coins.len(), 2);
    assert_eq!(metadata.total_records, 2);

    let (coins, _) = store.list("half sovereign", &[], &Filters::default()).await.unwrap();
    assert_eq!(coins.len(), 1);
    assert_eq!(coins[0].title, "Half Sovereign");

    // Tokens must match whole words.
    let (coins, _) = store.list("sover", &[], &Filters::default()).await.unwrap();
    assert!(coins.is_empty());

    let gold = vec!["gold".to_string()];
    let (coins, _) = store.list("", &gold, &Filters::default()).await.unwrap();
    assert_eq!(coins.len(), 2);

    let gold_half = vec!["gold".to_string(), "half".to_string()];
    let (coins, _) = store.list("", &gold_half, &Filters::default()).await.unwrap();
    assert_eq!(coins.len(), 1);

    let (coins, _) = store
        .list("dollar", &gold, &Filters::default())
        .await
        .unwrap();
    assert!(coins.is_empty());

    // Punctuation-only query applies no filter.
    let (coins, _) = store.list("  --  ", &[], &Filters::default()).await.unwrap();
    assert_eq!(coins.len(), 3);
}

/// Count reflects all matches, not just the page.
#[tokio::test]
async fn test_count_is_pre_pagination() {
    let store = store().await;
    for i in 0..7 {
        store
            .insert(&draft(&format!("Token {i}"), 1850, &["trade"]))
            .await
            .unwrap();
    }

    let (coins, metadata) = store.list("token", &[], &filters(2, 3, "-id")).await.unwrap();
    assert_eq!(coins.len(), 3);
    assert_eq!(metadata.total_records, 7);
    assert_eq!(metadata.first_page, 1);
    assert_eq!(metadata.last_page, 3);
    assert_eq!(metadata.page_size, 3);
}

// =============================================================================
// ON-DISK STORE
// =============================================================================

/// Data written through one store is visible after reopening the file.
#[tokio::test]
async fn test_reopen_on_disk_database() {
    let dir = TempDir::new().unwrap();
    let config = StoreConfig {
        path: dir.path().join("coins.db").to_string_lossy().into_owned(),
        ..StoreConfig::default()
    };

    let id = {
        let storage = SqliteStorage::open(&config).unwrap();
        let store = CoinStore::new(Arc::new(storage), config.query_timeout());
        store.bootstrap().await.unwrap();
        store
            .insert(&draft("Sixpence", 1887, &["England"]))
            .await
            .unwrap()
            .id
    };

    let storage = SqliteStorage::open(&config).unwrap();
    let store = CoinStore::new(Arc::new(storage), config.query_timeout());
    store.bootstrap().await.unwrap();

    let coin = store.get(id).await.unwrap();
    assert_eq!(coin.title, "Sixpence");
    assert_eq!(coin.version, 1);
}
