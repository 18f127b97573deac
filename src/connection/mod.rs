//! Connections own the handle and the transaction boundary.
//!
//! A connection starts with no transaction. The first statement run through one of its
//! cursors sends `begin` first; [`Connection::commit`] and [`Connection::rollback`] close the
//! transaction again and are where deferred failures surface. In autocommit mode no
//! transaction is ever opened implicitly.

mod core;
mod tx;

use std::cell::RefCell;
use std::rc::Rc;

use crate::config::ConnectOptions;
use crate::cursor::Cursor;
use crate::error::{DbApiError, Phase, translate};
use crate::handle::Connector;

pub(crate) use self::core::ConnectionInner;
use self::core::TxnState;

/// Open a connection to `database` on `tier`.
///
/// # Errors
/// Returns `DbApiError::Operational` if the database name is empty or the connector cannot
/// reach the database or tier.
pub fn connect(
    connector: &dyn Connector,
    database: &str,
    tier: &str,
) -> Result<Connection, DbApiError> {
    connect_with(connector, ConnectOptions::new(database, tier))
}

/// Open a connection from full [`ConnectOptions`].
///
/// # Errors
/// See [`connect`].
pub fn connect_with(
    connector: &dyn Connector,
    options: ConnectOptions,
) -> Result<Connection, DbApiError> {
    Connection::open(connector, options)
}

/// A connection to one database on one tier.
///
/// Cloning is cheap and yields another reference to the same connection; every
/// [`Cursor`] also holds one, so the connection stays usable through
/// [`Cursor::connection`] after the caller drops its own reference. When the last
/// reference goes away an open transaction is rolled back and the handle released,
/// silently.
#[derive(Debug, Clone)]
pub struct Connection {
    inner: Rc<RefCell<ConnectionInner>>,
}

impl Connection {
    /// # Errors
    /// See [`connect`].
    pub fn open(connector: &dyn Connector, options: ConnectOptions) -> Result<Self, DbApiError> {
        if options.database.trim().is_empty() {
            return Err(DbApiError::operational("database name must not be empty"));
        }
        let handle = connector
            .open(&options)
            .map_err(|e| translate(e, Phase::Connect))?;
        tracing::debug!(
            database = %options.database,
            tier = %options.tier,
            autocommit = options.autocommit,
            "connection opened"
        );
        Ok(Self {
            inner: Rc::new(RefCell::new(ConnectionInner::new(handle, options))),
        })
    }

    pub(crate) fn inner(&self) -> &Rc<RefCell<ConnectionInner>> {
        &self.inner
    }

    /// Create a cursor. The previously created cursor can no longer run statements or
    /// fetch rows.
    ///
    /// # Errors
    /// Returns `DbApiError::Interface` if the connection is closed.
    pub fn cursor(&self) -> Result<Cursor, DbApiError> {
        let (generation, arraysize) = {
            let mut inner = self.inner.borrow_mut();
            inner.ensure_open()?;
            inner.cursor_generation += 1;
            (inner.cursor_generation, inner.options.arraysize)
        };
        let cursor = Cursor::new(self.clone(), generation, arraysize);
        self.inner.borrow_mut().active_cursor = cursor.shared_weak();
        Ok(cursor)
    }

    /// Commit the current transaction; a no-op when none is open.
    ///
    /// On success the current cursor's `rowcount` reflects the rows the transaction
    /// changed.
    ///
    /// # Errors
    /// `DbApiError::Integrity` for constraint violations detected at commit (the rowcount
    /// becomes 0), `DbApiError::Operational` for any other commit failure or when the
    /// row count cannot be retrieved, `DbApiError::Interface` if the connection is closed.
    pub fn commit(&self) -> Result<(), DbApiError> {
        self.inner.borrow_mut().commit()
    }

    /// Roll back the current transaction; a no-op when none is open.
    ///
    /// # Errors
    /// Statement errors the handle deferred until the end of the transaction are raised
    /// here, classified like statement errors (a syntax error is `Programming`).
    pub fn rollback(&self) -> Result<(), DbApiError> {
        self.inner.borrow_mut().rollback()
    }

    /// Roll back any open transaction and release the handle. Failures while doing so are
    /// swallowed.
    ///
    /// # Errors
    /// Returns `DbApiError::Interface` if the connection was already closed.
    pub fn close(&self) -> Result<(), DbApiError> {
        let mut inner = self.inner.borrow_mut();
        if inner.is_closed() {
            return Err(DbApiError::interface("connection already closed"));
        }
        inner.shutdown();
        Ok(())
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.inner.borrow().is_closed()
    }

    #[must_use]
    pub fn in_transaction(&self) -> bool {
        self.inner.borrow().txn == TxnState::TxnOpen
    }

    #[must_use]
    pub fn autocommit(&self) -> bool {
        self.inner.borrow().options.autocommit
    }

    #[must_use]
    pub fn options(&self) -> ConnectOptions {
        self.inner.borrow().options.clone()
    }

    /// True when both values refer to the same underlying connection.
    #[must_use]
    pub fn same_connection(&self, other: &Connection) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}
