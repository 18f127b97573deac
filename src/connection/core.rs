use std::cell::RefCell;
use std::fmt;
use std::rc::Weak;

use crate::config::ConnectOptions;
use crate::cursor::{CursorShared, StatementOutcome};
use crate::error::{DbApiError, Phase, translate};
use crate::handle::{ColumnMeta, Handle, WireValue};

/// Transaction boundary state of a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TxnState {
    NoTxn,
    TxnOpen,
}

/// State shared between a [`Connection`](super::Connection) and every cursor made from it.
pub(crate) struct ConnectionInner {
    /// `None` once closed.
    pub(crate) handle: Option<Box<dyn Handle>>,
    pub(crate) txn: TxnState,
    pub(crate) options: ConnectOptions,
    /// Bumped each time a cursor is created; only the cursor holding the latest value may
    /// run statements or fetch.
    pub(crate) cursor_generation: u64,
    pub(crate) active_cursor: Weak<RefCell<CursorShared>>,
}

impl ConnectionInner {
    pub(crate) fn new(handle: Box<dyn Handle>, options: ConnectOptions) -> Self {
        Self {
            handle: Some(handle),
            txn: TxnState::NoTxn,
            options,
            cursor_generation: 0,
            active_cursor: Weak::new(),
        }
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.handle.is_none()
    }

    pub(crate) fn ensure_open(&self) -> Result<(), DbApiError> {
        if self.is_closed() {
            Err(DbApiError::interface("connection is closed"))
        } else {
            Ok(())
        }
    }

    pub(crate) fn handle_mut(&mut self) -> Result<&mut (dyn Handle + 'static), DbApiError> {
        match self.handle.as_deref_mut() {
            Some(handle) => Ok(handle),
            None => Err(DbApiError::interface("connection is closed")),
        }
    }

    /// Run one cursor statement, opening the implicit transaction first if needed.
    pub(crate) fn run_statement(
        &mut self,
        sql: &str,
        params: &[(String, WireValue)],
    ) -> Result<Vec<ColumnMeta>, DbApiError> {
        self.begin_if_needed()?;
        tracing::debug!(database = %self.options.database, sql, params = params.len(), "execute");
        self.handle_mut()?
            .execute(sql, params)
            .map_err(|e| translate(e, Phase::Execute))
    }

    /// Pull rows the active cursor has not read yet into its buffer, so the handle can run
    /// another statement without losing them.
    pub(crate) fn detach_active_stream(&mut self) {
        let Some(shared) = self.active_cursor.upgrade() else {
            return;
        };
        let Ok(mut cursor) = shared.try_borrow_mut() else {
            return;
        };
        let Some(stream) = cursor.live_stream_mut() else {
            return;
        };
        let Some(handle) = self.handle.as_deref_mut() else {
            stream.mark_drained();
            return;
        };
        loop {
            match handle.next_row() {
                Ok(Some(row)) => stream.push_buffered(row),
                Ok(None) => {
                    stream.mark_drained();
                    break;
                }
                Err(e) => {
                    stream.fail(translate(e, Phase::Fetch));
                    break;
                }
            }
        }
    }

    /// Set the active cursor's rowcount, if its last statement was a write.
    pub(crate) fn set_active_rowcount(&self, rowcount: i64) {
        let Some(shared) = self.active_cursor.upgrade() else {
            return;
        };
        if let Ok(mut cursor) = shared.try_borrow_mut()
            && !cursor.closed
            && matches!(cursor.outcome, StatementOutcome::Write)
        {
            cursor.rowcount = rowcount;
        }
    }

    /// Best-effort rollback and release; never fails, logs what it swallows.
    pub(crate) fn shutdown(&mut self) {
        let Some(mut handle) = self.handle.take() else {
            return;
        };
        if self.txn == TxnState::TxnOpen {
            if let Err(e) = handle.execute("rollback", &[]) {
                tracing::warn!(code = e.code, "rollback during close failed: {}", e.message);
            }
            self.txn = TxnState::NoTxn;
        }
        if let Err(e) = handle.close() {
            tracing::warn!(code = e.code, "closing handle failed: {}", e.message);
        }
        tracing::debug!(database = %self.options.database, "connection closed");
    }
}

impl Drop for ConnectionInner {
    fn drop(&mut self) {
        if self.handle.is_some() {
            tracing::debug!(database = %self.options.database, "connection dropped without close");
            self.shutdown();
        }
    }
}

impl fmt::Debug for ConnectionInner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionInner")
            .field("database", &self.options.database)
            .field("tier", &self.options.tier)
            .field("closed", &self.is_closed())
            .field("txn", &self.txn)
            .field("cursor_generation", &self.cursor_generation)
            .finish_non_exhaustive()
    }
}
