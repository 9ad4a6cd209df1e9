//! # Coin Store Module
//!
//! Record storage for coins over a relational backend:
//! - `backend`: the query/execute interface the store is written against
//! - `sqlite`: the rusqlite implementation of that interface
//! - `coins`: get/insert/conditional update/delete/list
//! - `filters`, `pagination`, `search`: list parameters and page metadata

pub mod backend;
pub mod coins;
pub mod config;
pub mod errors;
pub mod filters;
pub mod pagination;
pub mod search;
pub mod sqlite;

pub use backend::{Row, SqlValue, Storage, StorageFuture};
pub use coins::CoinStore;
pub use config::StoreConfig;
pub use errors::{StoreError, StoreResult};
pub use filters::{validate_filters, Filters, SortColumn, SortDirection, SortKey, SORT_SAFELIST};
pub use pagination::PageMetadata;
pub use sqlite::SqliteStorage;
