//! # Coin Model
//!
//! `Coin` is the stored, versioned record. `CoinDraft` carries the business
//! fields only and is what the store inserts. `NewCoin` and `CoinPatch` are
//! the request bodies for create and partial update.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::runtime::Runtime;

/// A stored coin.
///
/// `(id, version)` is the optimistic concurrency token: an update is only
/// applied while the stored version still equals `version`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Coin {
    pub id: i64,

    #[serde(skip)]
    pub created_at: DateTime<Utc>,

    pub title: String,

    #[serde(skip_serializing_if = "is_zero")]
    pub year: i32,

    #[serde(skip_serializing_if = "Runtime::is_zero")]
    pub runtime: Runtime,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub genres: Vec<String>,

    pub version: i64,
}

fn is_zero(value: &i32) -> bool {
    *value == 0
}

/// Business fields of a coin that has not been stored yet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoinDraft {
    pub title: String,
    pub year: i32,
    pub runtime: Runtime,
    pub genres: Vec<String>,
}

/// Request body for creating a coin.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewCoin {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub year: i32,
    #[serde(default)]
    pub runtime: Runtime,
    #[serde(default)]
    pub genres: Option<Vec<String>>,
}

impl NewCoin {
    /// Returns the draft plus whether `genres` was present in the body.
    pub fn into_draft(self) -> (CoinDraft, bool) {
        let genres_provided = self.genres.is_some();
        let draft = CoinDraft {
            title: self.title,
            year: self.year,
            runtime: self.runtime,
            genres: self.genres.unwrap_or_default(),
        };
        (draft, genres_provided)
    }
}

/// Request body for a partial update. Absent fields keep their stored value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CoinPatch {
    pub title: Option<String>,
    pub year: Option<i32>,
    pub runtime: Option<Runtime>,
    pub genres: Option<Vec<String>>,
}

impl CoinPatch {
    pub fn apply(self, coin: &mut Coin) {
        if let Some(title) = self.title {
            coin.title = title;
        }
        if let Some(year) = self.year {
            coin.year = year;
        }
        if let Some(runtime) = self.runtime {
            coin.runtime = runtime;
        }
        if let Some(genres) = self.genres {
            coin.genres = genres;
        }
    }
}
