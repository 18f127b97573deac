//! Standard connection, cursor and transaction semantics over a low-level SQL request
//! handle.
//!
//! The [`Handle`](handle::Handle) trait is the only thing a backend has to provide: run one
//! statement, stream raw rows, report effects. On top of it this crate supplies
//!
//! * [`Connection`]s with an implicit transaction opened by the first statement and closed by
//!   [`Connection::commit`] / [`Connection::rollback`],
//! * [`Cursor`]s with `execute`, `executemany`, `fetchone`, `fetchmany`, `fetchall`,
//!   `description` and `rowcount`,
//! * value conversion in both directions, including millisecond rounding of datetimes,
//! * `%(name)s` placeholders rewritten to the handle's `@name` form,
//! * one closed error hierarchy, [`DbApiError`], into which every handle failure is sorted.
//!
//! ```no_run
//! use sql_dbapi::prelude::*;
//! use sql_dbapi::sqlite::SqliteConnector;
//!
//! # fn main() -> Result<(), DbApiError> {
//! let conn = connect(&SqliteConnector::new("app.db"), "app", "local")?;
//! let mut cursor = conn.cursor()?;
//! cursor.execute("insert into users values (%(id)s, %(name)s)", Some(&params! {
//!     "id" => 7,
//!     "name" => "ana",
//! }))?;
//! conn.commit()?;
//! assert_eq!(cursor.rowcount()?, 1);
//! # Ok(())
//! # }
//! ```

pub mod codec;
pub mod config;
pub mod connection;
pub mod cursor;
pub mod error;
pub mod handle;
pub mod prelude;
pub mod results;
pub mod translation;
pub mod types;

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(feature = "test-utils")]
pub mod test_utils;

pub use codec::Params;
pub use config::{ConnectOptions, ConnectOptionsBuilder};
pub use connection::{Connection, connect, connect_with};
pub use cursor::{Cursor, CursorState, Rows};
pub use error::{DbApiError, ErrorDetail, ErrorKind};
pub use results::{ColumnDescription, Row};
pub use types::{
    BINARY, Binary, ColumnType, DATETIME, Datetime, NUMBER, STRING, Timestamp, TypeTag, Value,
    binary, date, date_from_ticks, datetime, timestamp, timestamp_from_ticks,
};

/// DB-API level implemented.
pub const APILEVEL: &str = "2.0";

/// Connections may not be shared between threads; the module may.
pub const THREADSAFETY: u8 = 1;

/// Placeholder style accepted by [`Cursor::execute`]: `%(name)s`.
pub const PARAMSTYLE: &str = "pyformat";
