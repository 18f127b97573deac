//! The lower-level request/response contract this crate is layered on.
//!
//! A [`Handle`] runs one statement at a time against the database tier, streams back raw
//! rows and reports the side effects of the last transaction. Everything above it
//! (transactions, cursors, type coercion, error classification) lives in this crate.

use chrono::{DateTime, FixedOffset, TimeDelta};
use thiserror::Error;

use crate::config::ConnectOptions;
use crate::types::ColumnType;

/// Return codes reported by the engine in [`HandleError::code`].
pub mod codes {
    pub const CONNECT_ERROR: i32 = -1;
    pub const NOT_CONNECTED: i32 = -2;
    pub const PREPARE_ERROR: i32 = -3;
    pub const IO_ERROR: i32 = -4;
    pub const INTERNAL: i32 = -5;
    pub const NO_STATEMENT: i32 = -6;
    pub const BAD_COLUMN: i32 = -7;
    pub const BAD_STATE: i32 = -8;
    pub const ASYNC_ERROR: i32 = -9;
    pub const INVALID_ID: i32 = -12;
    pub const RECORD_OUT_OF_RANGE: i32 = -13;
    pub const REJECTED: i32 = -15;
    pub const STOPPED: i32 = -16;
    pub const BAD_REQUEST: i32 = -17;
    pub const DB_CREATE_FAILED: i32 = -18;
    pub const THREADPOOL_INTERNAL: i32 = -20;
    pub const READ_ONLY: i32 = -21;
    pub const NO_MASTER: i32 = -101;
    pub const UNTAGGED_DATABASE: i32 = -102;
    pub const CONSTRAINTS: i32 = -103;
    pub const TRAN_IO_ERROR: i32 = -105;
    pub const ACCESS: i32 = -106;
    pub const TRAN_MODE_UNSUPPORTED: i32 = -107;
    pub const VERIFY_ERROR: i32 = 2;
    pub const FKEY_VIOLATION: i32 = 3;
    pub const NULL_CONSTRAINT: i32 = 4;
    pub const CONV_FAIL: i32 = 113;
    pub const NONKLESS: i32 = 114;
    pub const MALLOC: i32 = 115;
    pub const NOT_SUPPORTED: i32 = 116;
    pub const DEADLOCK: i32 = 203;
    pub const DUPLICATE: i32 = 299;
    pub const UNKNOWN: i32 = 300;
    pub const TZNAME_FAIL: i32 = 401;
}

/// Failure reported by a [`Handle`] or [`Connector`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} (rc {code})")]
pub struct HandleError {
    pub code: i32,
    pub message: String,
}

impl HandleError {
    #[must_use]
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// A column value as it travels to and from the handle.
#[derive(Debug, Clone, PartialEq)]
pub enum WireValue {
    Null,
    Integer(i64),
    Real(f64),
    /// Text exactly as stored; not yet validated as UTF-8.
    Text(Vec<u8>),
    Blob(Vec<u8>),
    Datetime(DateTime<FixedOffset>),
    IntervalYm { months: i32 },
    IntervalDs(TimeDelta),
}

/// Name and declared type of one result column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMeta {
    pub name: String,
    pub column_type: ColumnType,
}

impl ColumnMeta {
    #[must_use]
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
        }
    }
}

/// Row counts reported for the most recent transaction (or statement, outside one).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Effects {
    pub num_affected: i64,
    pub num_selected: i64,
    pub num_updated: i64,
    pub num_deleted: i64,
    pub num_inserted: i64,
}

/// Statement-level request handle to the database tier.
pub trait Handle {
    /// Run `sql` with named parameters.
    ///
    /// Returns the result columns; an empty list means the statement produces no rows.
    /// Running a statement discards whatever remained unread from the previous one.
    /// Transaction control is issued as the statements `begin`, `commit` and `rollback`.
    ///
    /// # Errors
    /// Returns `HandleError` with the engine's return code when the statement fails.
    fn execute(
        &mut self,
        sql: &str,
        params: &[(String, WireValue)],
    ) -> Result<Vec<ColumnMeta>, HandleError>;

    /// Pull the next raw row of the current statement, `None` once drained.
    ///
    /// # Errors
    /// Returns `HandleError` if the stream breaks mid-way.
    fn next_row(&mut self) -> Result<Option<Vec<WireValue>>, HandleError>;

    /// Effects of the last committed transaction, or of the last statement outside one.
    ///
    /// # Errors
    /// Returns `HandleError` if the engine cannot report effects.
    fn get_effects(&mut self) -> Result<Effects, HandleError>;

    /// Release the underlying connection.
    ///
    /// # Errors
    /// Returns `HandleError` if releasing fails.
    fn close(&mut self) -> Result<(), HandleError>;
}

/// Factory for handles; resolves database and tier to something that can run statements.
pub trait Connector {
    /// # Errors
    /// Returns `HandleError` when the database or tier cannot be reached.
    fn open(&self, options: &ConnectOptions) -> Result<Box<dyn Handle>, HandleError>;
}
