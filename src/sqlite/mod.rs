//! Local tier backed by an embedded SQLite database.
//!
//! This lets the connection and cursor layer run against a real engine without a cluster:
//! `connect(&SqliteConnector::new(path), "mydb", "local")`. The logical database name is
//! only used for logging; the file is whatever the connector was built with. Transaction
//! control statements are mapped onto SQLite's own `BEGIN`/`COMMIT`/`ROLLBACK`, and engine
//! failures are reported with the same return codes a cluster would use.

mod handle;
mod params;
mod query;

use std::path::{Path, PathBuf};

use rusqlite::OpenFlags;

use crate::config::ConnectOptions;
use crate::handle::{Connector, Handle, HandleError, codes};

pub use handle::SqliteHandle;

/// The only tier name this connector answers to.
pub const LOCAL_TIER: &str = "local";

/// Opens [`SqliteHandle`]s on one database file, or on a private in-memory database.
#[derive(Debug, Clone)]
pub struct SqliteConnector {
    path: Option<PathBuf>,
}

impl SqliteConnector {
    #[must_use]
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: Some(path.as_ref().to_path_buf()),
        }
    }

    /// Every handle opened gets its own empty database.
    #[must_use]
    pub fn in_memory() -> Self {
        Self { path: None }
    }

    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

impl Connector for SqliteConnector {
    fn open(&self, options: &ConnectOptions) -> Result<Box<dyn Handle>, HandleError> {
        if options.tier != LOCAL_TIER {
            return Err(HandleError::new(
                codes::CONNECT_ERROR,
                format!(
                    "cannot connect to db '{}' on tier '{}': only the '{LOCAL_TIER}' tier is served",
                    options.database, options.tier
                ),
            ));
        }
        if let Some(host) = &options.host {
            tracing::debug!(host = %host, "host override has no meaning for the local tier");
        }
        let conn = match &self.path {
            Some(path) => rusqlite::Connection::open_with_flags(
                path,
                OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE,
            ),
            None => rusqlite::Connection::open_in_memory(),
        }
        .map_err(|e| {
            HandleError::new(
                codes::CONNECT_ERROR,
                format!("cannot open db '{}': {e}", options.database),
            )
        })?;
        tracing::debug!(database = %options.database, path = ?self.path, "sqlite handle opened");
        Ok(Box::new(SqliteHandle::new(conn)))
    }
}

/// Map an engine failure onto the return code a cluster would report for it.
///
/// `fallback` is used for failures with no closer equivalent.
pub(crate) fn handle_error(err: &rusqlite::Error, fallback: i32) -> HandleError {
    use rusqlite::ErrorCode;
    use rusqlite::ffi;

    let code = match err.sqlite_error() {
        Some(e) if e.code == ErrorCode::ConstraintViolation => match e.extended_code {
            ffi::SQLITE_CONSTRAINT_UNIQUE | ffi::SQLITE_CONSTRAINT_PRIMARYKEY => codes::DUPLICATE,
            ffi::SQLITE_CONSTRAINT_NOTNULL => codes::NULL_CONSTRAINT,
            ffi::SQLITE_CONSTRAINT_FOREIGNKEY => codes::FKEY_VIOLATION,
            _ => codes::CONSTRAINTS,
        },
        Some(e) if matches!(e.code, ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked) => {
            codes::DEADLOCK
        }
        Some(e) if e.code == ErrorCode::ReadOnly => codes::READ_ONLY,
        Some(e) if e.code == ErrorCode::CannotOpen => codes::CONNECT_ERROR,
        _ => fallback,
    };
    HandleError::new(code, err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_tiers_other_than_local() {
        let err = SqliteConnector::in_memory()
            .open(&ConnectOptions::new("mattdb", "default"))
            .err();
        assert_eq!(err.map(|e| e.code), Some(codes::CONNECT_ERROR));
    }

    #[test]
    fn maps_unique_violation_to_duplicate() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        conn.execute_batch("create table t (k integer primary key); insert into t values (1);")
            .unwrap();
        let err = conn.execute("insert into t values (1)", []).unwrap_err();
        assert_eq!(handle_error(&err, codes::UNKNOWN).code, codes::DUPLICATE);
    }

    #[test]
    fn maps_not_null_violation() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        conn.execute_batch("create table t (k integer not null)").unwrap();
        let err = conn.execute("insert into t values (null)", []).unwrap_err();
        assert_eq!(handle_error(&err, codes::UNKNOWN).code, codes::NULL_CONSTRAINT);
    }
}
