//! # Coin Store
//!
//! Get/insert/update/delete/list for coins against a [`Storage`] backend.
//!
//! Every storage round trip is bounded by `timeout`. When the deadline passes
//! the storage future is dropped, which cancels the call, and the caller
//! receives `StoreError::Timeout`, never `EditConflict`.
//!
//! Nothing is cached between calls; every read goes to storage. The version
//! check in [`CoinStore::update`] depends on that.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::coin::{Coin, CoinDraft, Runtime};

use super::backend::{Row, SqlValue, Storage, StorageFuture};
use super::errors::{StoreError, StoreResult};
use super::filters::Filters;
use super::pagination::PageMetadata;
use super::search::{query_terms, token_column};

const CREATE_TABLE: &str = "
    CREATE TABLE IF NOT EXISTS coins (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
        title TEXT NOT NULL,
        title_tokens TEXT NOT NULL DEFAULT '',
        year INTEGER NOT NULL,
        runtime INTEGER NOT NULL,
        genres TEXT NOT NULL DEFAULT '[]',
        version INTEGER NOT NULL DEFAULT 1
    )";

const INSERT: &str = "
    INSERT INTO coins (title, title_tokens, year, runtime, genres)
    VALUES (?1, ?2, ?3, ?4, ?5)
    RETURNING id, created_at, version";

const SELECT_BY_ID: &str = "
    SELECT id, created_at, title, year, runtime, genres, version
    FROM coins
    WHERE id = ?1";

const CONDITIONAL_UPDATE: &str = "
    UPDATE coins
    SET title = ?1, title_tokens = ?2, year = ?3, runtime = ?4, genres = ?5,
        version = version + 1
    WHERE id = ?6 AND version = ?7
    RETURNING version";

const DELETE: &str = "DELETE FROM coins WHERE id = ?1";

/// Record store for coins.
#[derive(Clone)]
pub struct CoinStore {
    storage: Arc<dyn Storage>,
    timeout: Duration,
}

impl CoinStore {
    pub fn new(storage: Arc<dyn Storage>, timeout: Duration) -> Self {
        Self { storage, timeout }
    }

    /// Creates the `coins` table if it does not exist yet.
    pub async fn bootstrap(&self) -> StoreResult<()> {
        self.bounded(self.storage.exec(CREATE_TABLE, vec![])).await?;
        Ok(())
    }

    async fn bounded<T>(&self, call: StorageFuture<'_, T>) -> StoreResult<T> {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(StoreError::Timeout {
                after: self.timeout,
            }),
        }
    }

    /// Stores a new coin. The store assigns `id`, `created_at` and `version = 1`.
    pub async fn insert(&self, draft: &CoinDraft) -> StoreResult<Coin> {
        let args = vec![
            SqlValue::from(draft.title.as_str()),
            SqlValue::from(token_column(&draft.title)),
            SqlValue::from(draft.year),
            SqlValue::from(draft.runtime.minutes()),
            SqlValue::from(encode_genres(&draft.genres)?),
        ];

        let row = self
            .bounded(self.storage.query_one(INSERT, args))
            .await?
            .ok_or_else(|| StoreError::Malformed("insert returned no row".to_string()))?;

        Ok(Coin {
            id: row.get_i64(0)?,
            created_at: parse_timestamp(row.get_text(1)?)?,
            title: draft.title.clone(),
            year: draft.year,
            runtime: draft.runtime,
            genres: draft.genres.clone(),
            version: row.get_i64(2)?,
        })
    }

    /// Fetches a coin. Non-positive ids are not found without a round trip.
    pub async fn get(&self, id: i64) -> StoreResult<Coin> {
        if id < 1 {
            return Err(StoreError::NotFound);
        }

        let row = self
            .bounded(self.storage.query_one(SELECT_BY_ID, vec![id.into()]))
            .await?
            .ok_or(StoreError::NotFound)?;

        decode_coin(&row, 0)
    }

    /// Writes the business fields of `coin` and bumps its version, but only
    /// while the stored `(id, version)` still equals `(coin.id, coin.version)`.
    ///
    /// Returns the new version. Zero matching rows is `EditConflict`, whether
    /// another writer won or the record was deleted; call `get` first to tell
    /// the two apart. Conflicts are never retried here.
    pub async fn update(&self, coin: &Coin) -> StoreResult<i64> {
        let args = vec![
            SqlValue::from(coin.title.as_str()),
            SqlValue::from(token_column(&coin.title)),
            SqlValue::from(coin.year),
            SqlValue::from(coin.runtime.minutes()),
            SqlValue::from(encode_genres(&coin.genres)?),
            SqlValue::from(coin.id),
            SqlValue::from(coin.version),
        ];

        let row = self
            .bounded(self.storage.query_one(CONDITIONAL_UPDATE, args))
            .await?
            .ok_or(StoreError::EditConflict)?;

        row.get_i64(0)
    }

    /// Hard-deletes a coin.
    pub async fn delete(&self, id: i64) -> StoreResult<()> {
        if id < 1 {
            return Err(StoreError::NotFound);
        }

        let changed = self
            .bounded(self.storage.exec(DELETE, vec![id.into()]))
            .await?;
        if changed == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    /// Lists one page of coins whose title contains every token of `title`
    /// and whose genres include every entry of `genres`.
    ///
    /// The total match count comes from a window function over the same
    /// statement that returns the page, so the page and the count always
    /// describe the same snapshot. Ties on the sort column are broken by
    /// `id ASC`, which keeps page boundaries stable.
    pub async fn list(
        &self,
        title: &str,
        genres: &[String],
        filters: &Filters,
    ) -> StoreResult<(Vec<Coin>, PageMetadata)> {
        let sql = format!(
            "SELECT count(*) OVER(), id, created_at, title, year, runtime, genres, version
            FROM coins
            WHERE NOT EXISTS (
                SELECT 1 FROM json_each(?1) AS term
                WHERE instr(coins.title_tokens, ' ' || term.value || ' ') = 0
            )
            AND NOT EXISTS (
                SELECT 1 FROM json_each(?2) AS wanted
                WHERE wanted.value NOT IN (SELECT value FROM json_each(coins.genres))
            )
            ORDER BY {} {}, id ASC
            LIMIT ?3 OFFSET ?4",
            filters.sort.column.as_sql(),
            filters.sort.direction.as_sql(),
        );

        let offset = i64::try_from(filters.offset())
            .map_err(|_| StoreError::Malformed("page offset out of range".to_string()))?;
        let args = vec![
            SqlValue::from(query_terms(title)),
            SqlValue::from(encode_genres(genres)?),
            SqlValue::from(filters.limit()),
            SqlValue::from(offset),
        ];

        let rows = self.bounded(self.storage.query_many(&sql, args)).await?;

        let mut total_records = 0u64;
        let mut coins = Vec::with_capacity(rows.len());
        for row in &rows {
            total_records = u64::try_from(row.get_i64(0)?)
                .map_err(|_| StoreError::Malformed("negative row count".to_string()))?;
            coins.push(decode_coin(row, 1)?);
        }

        let metadata = PageMetadata::calculate(total_records, filters.page, filters.page_size);
        Ok((coins, metadata))
    }
}

/// Decodes `id, created_at, title, year, runtime, genres, version` starting
/// at column `first`.
fn decode_coin(row: &Row, first: usize) -> StoreResult<Coin> {
    Ok(Coin {
        id: row.get_i64(first)?,
        created_at: parse_timestamp(row.get_text(first + 1)?)?,
        title: row.get_text(first + 2)?.to_string(),
        year: row.get_i32(first + 3)?,
        runtime: Runtime(row.get_i32(first + 4)?),
        genres: decode_genres(row.get_text(first + 5)?)?,
        version: row.get_i64(first + 6)?,
    })
}

fn encode_genres(genres: &[String]) -> StoreResult<String> {
    serde_json::to_string(genres).map_err(|e| StoreError::Malformed(format!("genres: {e}")))
}

fn decode_genres(raw: &str) -> StoreResult<Vec<String>> {
    serde_json::from_str(raw).map_err(|e| StoreError::Malformed(format!("genres: {e}")))
}

fn parse_timestamp(raw: &str) -> StoreResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| StoreError::Malformed(format!("created_at {raw:?}: {e}")))
}
