//! # SQLite Storage
//!
//! `Storage` implementation over a single rusqlite connection. Statements run
//! on tokio's blocking pool while the connection mutex is held.
//!
//! ## Cancellation
//! Every call carries a ticket. Dropping the call's future before it finishes
//! marks the ticket cancelled: a call still waiting for the connection is
//! skipped, and a call whose statement is running gets interrupted through the
//! connection's `InterruptHandle`. The `in_flight` slot is only read and
//! written under its own mutex, so an interrupt can never land on a statement
//! belonging to a different ticket.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use rusqlite::types::{ToSqlOutput, Value, ValueRef};
use rusqlite::{params_from_iter, Connection, ErrorCode, InterruptHandle, OpenFlags, ToSql};
use tracing::debug;

use super::backend::{Row, SqlValue, Storage, StorageFuture};
use super::config::StoreConfig;
use super::errors::{StoreError, StoreResult};

/// SQLite-backed storage collaborator
#[derive(Clone)]
pub struct SqliteStorage {
    shared: Arc<Shared>,
}

struct Shared {
    connection: Mutex<Connection>,
    interrupt: InterruptHandle,
    in_flight: Mutex<Option<u64>>,
    next_ticket: AtomicU64,
}

impl SqliteStorage {
    /// Opens (or creates) the database named by `config.path`.
    pub fn open(config: &StoreConfig) -> StoreResult<Self> {
        let connection = if config.is_in_memory() {
            Connection::open_in_memory()
        } else {
            let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_FULL_MUTEX;
            Connection::open_with_flags(&config.path, flags)
        }
        .map_err(backend_error)?;

        connection
            .busy_timeout(config.busy_timeout())
            .map_err(backend_error)?;
        connection
            .execute_batch("PRAGMA foreign_keys = ON;")
            .map_err(backend_error)?;

        debug!(path = %config.path, "opened sqlite storage");
        Ok(Self::from_connection(connection))
    }

    /// Opens a private in-memory database.
    pub fn open_in_memory() -> StoreResult<Self> {
        Self::open(&StoreConfig::in_memory())
    }

    fn from_connection(connection: Connection) -> Self {
        let interrupt = connection.get_interrupt_handle();
        Self {
            shared: Arc::new(Shared {
                connection: Mutex::new(connection),
                interrupt,
                in_flight: Mutex::new(None),
                next_ticket: AtomicU64::new(1),
            }),
        }
    }

    async fn run<T, F>(&self, sql: &str, args: Vec<SqlValue>, op: F) -> StoreResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection, &str, &[SqlValue]) -> rusqlite::Result<T> + Send + 'static,
    {
        let ticket = self.shared.next_ticket.fetch_add(1, Ordering::Relaxed);
        let cancelled = Arc::new(AtomicBool::new(false));
        let mut guard = CancelOnDrop {
            shared: Arc::clone(&self.shared),
            ticket,
            cancelled: Arc::clone(&cancelled),
            armed: true,
        };

        let shared = Arc::clone(&self.shared);
        let sql = sql.to_string();
        let joined = tokio::task::spawn_blocking(move || {
            shared.execute(ticket, &cancelled, &sql, &args, op)
        })
        .await;
        guard.armed = false;

        match joined {
            Ok(result) => result,
            Err(e) => Err(StoreError::Backend(format!("storage worker failed: {e}"))),
        }
    }
}

impl Shared {
    fn execute<T, F>(
        &self,
        ticket: u64,
        cancelled: &AtomicBool,
        sql: &str,
        args: &[SqlValue],
        op: F,
    ) -> StoreResult<T>
    where
        F: FnOnce(&Connection, &str, &[SqlValue]) -> rusqlite::Result<T>,
    {
        let connection = self
            .connection
            .lock()
            .map_err(|_| StoreError::Backend("connection mutex poisoned".to_string()))?;

        {
            let mut in_flight = self.lock_in_flight();
            if cancelled.load(Ordering::Acquire) {
                return Err(StoreError::Cancelled);
            }
            *in_flight = Some(ticket);
        }

        let result = op(&connection, sql, args);
        *self.lock_in_flight() = None;
        drop(connection);

        result.map_err(map_sqlite_error)
    }

    fn lock_in_flight(&self) -> MutexGuard<'_, Option<u64>> {
        self.in_flight.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

struct CancelOnDrop {
    shared: Arc<Shared>,
    ticket: u64,
    cancelled: Arc<AtomicBool>,
    armed: bool,
}

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }

        let in_flight = self.shared.lock_in_flight();
        self.cancelled.store(true, Ordering::Release);
        if *in_flight == Some(self.ticket) {
            self.shared.interrupt.interrupt();
            debug!(ticket = self.ticket, "interrupted abandoned sqlite statement");
        }
    }
}

impl Storage for SqliteStorage {
    fn query_one<'a>(&'a self, sql: &'a str, args: Vec<SqlValue>) -> StorageFuture<'a, Option<Row>> {
        Box::pin(self.run(sql, args, |connection, sql, args| {
            let mut rows = read_rows(connection, sql, args)?;
            Ok(if rows.is_empty() {
                None
            } else {
                Some(rows.swap_remove(0))
            })
        }))
    }

    fn query_many<'a>(&'a self, sql: &'a str, args: Vec<SqlValue>) -> StorageFuture<'a, Vec<Row>> {
        Box::pin(self.run(sql, args, read_rows))
    }

    fn exec<'a>(&'a self, sql: &'a str, args: Vec<SqlValue>) -> StorageFuture<'a, u64> {
        Box::pin(self.run(sql, args, |connection, sql, args| {
            let mut stmt = connection.prepare_cached(sql)?;
            let changed = stmt.execute(params_from_iter(args.iter()))?;
            Ok(changed as u64)
        }))
    }
}

/// Steps the statement to completion so that `RETURNING` clauses and side
/// effects are fully applied before the connection is released.
fn read_rows(connection: &Connection, sql: &str, args: &[SqlValue]) -> rusqlite::Result<Vec<Row>> {
    let mut stmt = connection.prepare_cached(sql)?;
    let columns = stmt.column_count();
    let mut rows = stmt.query(params_from_iter(args.iter()))?;

    let mut out = Vec::new();
    while let Some(row) = rows.next()? {
        let mut values = Vec::with_capacity(columns);
        for idx in 0..columns {
            let value = match row.get_ref(idx)? {
                ValueRef::Null => SqlValue::Null,
                ValueRef::Integer(v) => SqlValue::Integer(v),
                ValueRef::Real(v) => SqlValue::Real(v),
                ValueRef::Text(bytes) => SqlValue::Text(String::from_utf8_lossy(bytes).into_owned()),
                ValueRef::Blob(_) => {
                    return Err(rusqlite::Error::InvalidColumnType(
                        idx,
                        "blob".to_string(),
                        rusqlite::types::Type::Blob,
                    ))
                }
            };
            values.push(value);
        }
        out.push(Row::new(values));
    }
    Ok(out)
}

impl ToSql for SqlValue {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            SqlValue::Null => ToSqlOutput::Owned(Value::Null),
            SqlValue::Integer(v) => ToSqlOutput::Owned(Value::Integer(*v)),
            SqlValue::Real(v) => ToSqlOutput::Owned(Value::Real(*v)),
            SqlValue::Text(v) => ToSqlOutput::Borrowed(ValueRef::Text(v.as_bytes())),
        })
    }
}

fn map_sqlite_error(err: rusqlite::Error) -> StoreError {
    match err {
        rusqlite::Error::SqliteFailure(ref failure, _)
            if failure.code == ErrorCode::OperationInterrupted =>
        {
            StoreError::Cancelled
        }
        other => backend_error(other),
    }
}

fn backend_error(err: rusqlite::Error) -> StoreError {
    StoreError::Backend(err.to_string())
}
