//! # Storage Backend
//!
//! The narrow query/execute interface the record store is written against.
//! Implementations must cancel the in-flight call when the returned future is
//! dropped; the record store relies on this for both its per-call deadline
//! and for requests abandoned by the client.

use std::future::Future;
use std::pin::Pin;

use super::errors::{StoreError, StoreResult};

/// Boxed future returned by every storage call.
pub type StorageFuture<'a, T> = Pin<Box<dyn Future<Output = StoreResult<T>> + Send + 'a>>;

/// A bound parameter or a returned column value.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
}

impl From<i64> for SqlValue {
    fn from(value: i64) -> Self {
        SqlValue::Integer(value)
    }
}

impl From<i32> for SqlValue {
    fn from(value: i32) -> Self {
        SqlValue::Integer(i64::from(value))
    }
}

impl From<u32> for SqlValue {
    fn from(value: u32) -> Self {
        SqlValue::Integer(i64::from(value))
    }
}

impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        SqlValue::Text(value)
    }
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        SqlValue::Text(value.to_string())
    }
}

/// One result row, addressed by column position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    values: Vec<SqlValue>,
}

impl Row {
    pub fn new(values: Vec<SqlValue>) -> Self {
        Self { values }
    }

    fn column(&self, idx: usize) -> StoreResult<&SqlValue> {
        self.values
            .get(idx)
            .ok_or_else(|| StoreError::Malformed(format!("missing column {idx}")))
    }

    pub fn get_i64(&self, idx: usize) -> StoreResult<i64> {
        match self.column(idx)? {
            SqlValue::Integer(value) => Ok(*value),
            other => Err(StoreError::Malformed(format!(
                "column {idx}: expected integer, found {other:?}"
            ))),
        }
    }

    pub fn get_i32(&self, idx: usize) -> StoreResult<i32> {
        let value = self.get_i64(idx)?;
        i32::try_from(value)
            .map_err(|_| StoreError::Malformed(format!("column {idx}: {value} out of range")))
    }

    pub fn get_text(&self, idx: usize) -> StoreResult<&str> {
        match self.column(idx)? {
            SqlValue::Text(value) => Ok(value),
            other => Err(StoreError::Malformed(format!(
                "column {idx}: expected text, found {other:?}"
            ))),
        }
    }
}

/// Query/execute interface of the relational store.
///
/// `sql` uses positional `?N` placeholders bound from `args`.
pub trait Storage: Send + Sync {
    /// Runs a statement and returns its first row, if any.
    fn query_one<'a>(&'a self, sql: &'a str, args: Vec<SqlValue>) -> StorageFuture<'a, Option<Row>>;

    /// Runs a statement and returns all rows.
    fn query_many<'a>(&'a self, sql: &'a str, args: Vec<SqlValue>) -> StorageFuture<'a, Vec<Row>>;

    /// Runs a statement and returns the number of rows it changed.
    fn exec<'a>(&'a self, sql: &'a str, args: Vec<SqlValue>) -> StorageFuture<'a, u64>;
}
