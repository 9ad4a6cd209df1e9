//! # Input Validation
//!
//! Field-level checks that run before anything reaches the store. Errors are
//! collected per field and the first failure for a field wins, so a client
//! gets one actionable message per field.

use std::collections::{BTreeMap, HashSet};

use chrono::{Datelike, Utc};

use super::model::{Coin, CoinDraft};
use super::runtime::Runtime;

/// Earliest accepted year.
pub const MIN_YEAR: i32 = 1888;

/// Maximum title length in bytes.
pub const MAX_TITLE_BYTES: usize = 500;

/// Per-field validation error collector.
#[derive(Debug, Clone, Default)]
pub struct Validator {
    errors: BTreeMap<String, String>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when no check has failed.
    pub fn valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Records `message` for `key` unless the key already has an error.
    pub fn add_error(&mut self, key: &str, message: &str) {
        self.errors
            .entry(key.to_string())
            .or_insert_with(|| message.to_string());
    }

    pub fn check(&mut self, ok: bool, key: &str, message: &str) {
        if !ok {
            self.add_error(key, message);
        }
    }

    pub fn errors(&self) -> &BTreeMap<String, String> {
        &self.errors
    }

    pub fn into_errors(self) -> BTreeMap<String, String> {
        self.errors
    }
}

/// True if every value in the slice is distinct.
pub fn unique(values: &[String]) -> bool {
    let mut seen = HashSet::with_capacity(values.len());
    values.iter().all(|value| seen.insert(value.as_str()))
}

/// Validates the business fields of a coin about to be inserted.
pub fn validate_draft(v: &mut Validator, draft: &CoinDraft) {
    validate_fields(v, &draft.title, draft.year, draft.runtime, &draft.genres);
}

/// Validates a stored coin after a patch has been applied to it.
pub fn validate_coin(v: &mut Validator, coin: &Coin) {
    validate_fields(v, &coin.title, coin.year, coin.runtime, &coin.genres);
}

fn validate_fields(v: &mut Validator, title: &str, year: i32, runtime: Runtime, genres: &[String]) {
    v.check(!title.is_empty(), "title", "must be provided");
    v.check(
        title.len() <= MAX_TITLE_BYTES,
        "title",
        "must not be more than 500 bytes long",
    );

    v.check(year != 0, "year", "must be provided");
    v.check(year >= MIN_YEAR, "year", "must be greater than 1888");
    v.check(year <= Utc::now().year(), "year", "must not be in the future");

    v.check(runtime.minutes() != 0, "runtime", "must be provided");
    v.check(runtime.minutes() > 0, "runtime", "must be a positive integer");

    v.check(!genres.is_empty(), "genres", "must contain at least 1 genre");
    v.check(genres.len() <= 5, "genres", "must not contain more than 5 genres");
    v.check(unique(genres), "genres", "must not contain duplicate values");
}
