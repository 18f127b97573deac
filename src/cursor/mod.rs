//! Cursors run statements and hand out their rows.

mod state;
mod stream;

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use crate::codec::{Params, bind_params};
use crate::connection::Connection;
use crate::error::{DbApiError, ErrorKind, Phase, translate};
use crate::results::{ColumnDescription, Row};
use crate::translation::{is_transaction_control, translate_placeholders};
use crate::types::Value;

pub use state::CursorState;
pub(crate) use state::{CursorShared, StatementOutcome};
use stream::RowStream;

/// Statement execution and row fetching on top of a [`Connection`].
///
/// Only the most recently created cursor of a connection is usable; once a newer one
/// exists every method except [`Cursor::connection`] returns `DbApiError::Interface`.
#[derive(Debug)]
pub struct Cursor {
    connection: Connection,
    shared: Rc<RefCell<CursorShared>>,
    generation: u64,
    arraysize: usize,
}

impl Cursor {
    pub(crate) fn new(connection: Connection, generation: u64, arraysize: usize) -> Self {
        Self {
            connection,
            shared: Rc::new(RefCell::new(CursorShared::new())),
            generation,
            arraysize: arraysize.max(1),
        }
    }

    pub(crate) fn shared_weak(&self) -> Weak<RefCell<CursorShared>> {
        Rc::downgrade(&self.shared)
    }

    /// The connection this cursor was created from.
    #[must_use]
    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    /// Default number of rows returned by [`Cursor::fetchmany`].
    #[must_use]
    pub fn arraysize(&self) -> usize {
        self.arraysize
    }

    pub fn set_arraysize(&mut self, arraysize: usize) {
        self.arraysize = arraysize.max(1);
    }

    #[must_use]
    pub fn state(&self) -> CursorState {
        self.shared.borrow().state()
    }

    fn is_current(&self) -> bool {
        let inner = self.connection.inner().borrow();
        !inner.is_closed() && inner.cursor_generation == self.generation
    }

    fn ensure_usable(&self) -> Result<(), DbApiError> {
        if self.shared.borrow().closed {
            return Err(DbApiError::interface("cursor is closed"));
        }
        let inner = self.connection.inner().borrow();
        inner.ensure_open()?;
        if inner.cursor_generation != self.generation {
            return Err(DbApiError::interface(
                "cursor is no longer usable: a newer cursor was opened on its connection",
            ));
        }
        Ok(())
    }

    /// Column descriptions of the last result-producing statement, `None` otherwise.
    ///
    /// # Errors
    /// Returns `DbApiError::Interface` on a closed or superseded cursor.
    pub fn description(&self) -> Result<Option<Vec<ColumnDescription>>, DbApiError> {
        self.ensure_usable()?;
        Ok(self.shared.borrow().description.clone())
    }

    /// Rows changed by the last write, once known (after commit unless in autocommit
    /// mode); -1 otherwise.
    ///
    /// # Errors
    /// Returns `DbApiError::Interface` on a closed or superseded cursor.
    pub fn rowcount(&self) -> Result<i64, DbApiError> {
        self.ensure_usable()?;
        Ok(self.shared.borrow().rowcount)
    }

    /// Run one statement.
    ///
    /// Any rows left over from the previous statement are discarded. Parameters are
    /// converted before anything is sent, so conversion failures never reach the handle.
    ///
    /// # Errors
    /// - `Programming` for `BEGIN`/`COMMIT`/`ROLLBACK`, which belong to the connection,
    ///   and for statements the handle rejects as malformed
    /// - `Data` or `Interface` when a parameter cannot be bound
    /// - `Operational` when the implicit transaction cannot be opened
    /// - `Interface` on a closed or superseded cursor
    pub fn execute(&mut self, sql: &str, params: Option<&Params>) -> Result<&mut Self, DbApiError> {
        self.ensure_usable()?;
        self.shared.borrow_mut().reset();
        if is_transaction_control(sql) {
            return Err(DbApiError::programming(format!(
                "'{}' must be issued through the connection's commit/rollback",
                sql.trim()
            )));
        }
        let bound = match params {
            Some(params) => bind_params(params)?,
            None => Vec::new(),
        };
        let sql = translate_placeholders(sql)?;

        let (columns, affected) = {
            let mut inner = self.connection.inner().borrow_mut();
            let columns = inner.run_statement(&sql, &bound)?;
            let affected = if columns.is_empty() && inner.options.autocommit {
                let effects = inner
                    .handle_mut()?
                    .get_effects()
                    .map_err(|e| translate(e, Phase::Effects))?;
                Some(effects.num_affected)
            } else {
                None
            };
            (columns, affected)
        };

        let mut shared = self.shared.borrow_mut();
        if columns.is_empty() {
            shared.outcome = StatementOutcome::Write;
            if let Some(affected) = affected {
                shared.rowcount = affected;
            }
        } else {
            let stream = RowStream::new(columns);
            shared.description = Some(stream.description());
            shared.outcome = StatementOutcome::Rows(stream);
        }
        drop(shared);
        Ok(self)
    }

    /// Run `sql` once per parameter set, in order.
    ///
    /// The previous result set is dropped even when the sequence is empty. Within a
    /// transaction the combined effect is only known after commit.
    ///
    /// # Errors
    /// Stops at and returns the first failing execution; see [`Cursor::execute`].
    pub fn executemany<'p, I>(&mut self, sql: &str, seq_of_params: I) -> Result<&mut Self, DbApiError>
    where
        I: IntoIterator<Item = &'p Params>,
    {
        self.ensure_usable()?;
        self.shared.borrow_mut().reset();
        if is_transaction_control(sql) {
            return Err(DbApiError::programming(format!(
                "'{}' must be issued through the connection's commit/rollback",
                sql.trim()
            )));
        }
        let mut total: Option<i64> = None;
        for params in seq_of_params {
            self.execute(sql, Some(params))?;
            let rowcount = self.shared.borrow().rowcount;
            if rowcount >= 0 {
                total = Some(total.unwrap_or(0) + rowcount);
            }
        }
        if let Some(total) = total {
            self.shared.borrow_mut().rowcount = total;
        }
        Ok(self)
    }

    fn ensure_result_set(&self) -> Result<(), DbApiError> {
        self.ensure_usable()?;
        match self.shared.borrow().outcome {
            StatementOutcome::Rows(_) => Ok(()),
            StatementOutcome::NotExecuted => Err(DbApiError::interface(
                "no statement has been executed on this cursor",
            )),
            StatementOutcome::Failed | StatementOutcome::Write => Err(DbApiError::interface(
                "the last statement did not produce a result set",
            )),
        }
    }

    /// Next row, or `None` once the result set is exhausted.
    ///
    /// # Errors
    /// `Data`/`NotSupported` when this row holds a value that cannot be decoded (later rows
    /// stay fetchable); `Interface` when there is no result set to fetch from.
    pub fn fetchone(&mut self) -> Result<Option<Row>, DbApiError> {
        self.ensure_result_set()?;
        let mut shared = self.shared.borrow_mut();
        let StatementOutcome::Rows(stream) = &mut shared.outcome else {
            return Ok(None);
        };
        let raw = match stream.take_buffered() {
            Some(raw) => raw?,
            None if stream.is_live() => {
                let next = self.connection.inner().borrow_mut().handle_mut()?.next_row();
                match next {
                    Ok(Some(raw)) => raw,
                    Ok(None) => {
                        stream.mark_drained();
                        return Ok(None);
                    }
                    Err(e) => {
                        stream.mark_drained();
                        return Err(translate(e, Phase::Fetch));
                    }
                }
            }
            None => return Ok(None),
        };
        tracing::trace!(columns = raw.len(), "row fetched");
        stream.decode(raw).map(Some)
    }

    /// Up to `size` rows (default [`Cursor::arraysize`]); fewer, possibly none, once the
    /// result set runs out.
    ///
    /// # Errors
    /// See [`Cursor::fetchone`].
    pub fn fetchmany(&mut self, size: Option<usize>) -> Result<Vec<Row>, DbApiError> {
        self.ensure_result_set()?;
        let size = size.unwrap_or(self.arraysize);
        let mut rows = Vec::with_capacity(size);
        while rows.len() < size {
            match self.fetchone()? {
                Some(row) => rows.push(row),
                None => break,
            }
        }
        Ok(rows)
    }

    /// All remaining rows.
    ///
    /// # Errors
    /// See [`Cursor::fetchone`].
    pub fn fetchall(&mut self) -> Result<Vec<Row>, DbApiError> {
        self.ensure_result_set()?;
        let mut rows = Vec::new();
        while let Some(row) = self.fetchone()? {
            rows.push(row);
        }
        Ok(rows)
    }

    /// Lazily decoded rows of the current result set.
    pub fn rows(&mut self) -> Rows<'_> {
        Rows {
            cursor: self,
            done: false,
        }
    }

    /// Accepted for interface conformance; has no effect.
    pub fn setinputsizes<I: IntoIterator>(&mut self, _sizes: I) {}

    /// Accepted for interface conformance; has no effect.
    pub fn setoutputsize(&mut self, _size: usize, _column: Option<usize>) {}

    /// Stored procedures are not callable through this interface.
    ///
    /// # Errors
    /// Always `DbApiError::NotSupported` (or `Interface` on an unusable cursor).
    pub fn callproc(&mut self, procname: &str, _params: &[Value]) -> Result<Vec<Value>, DbApiError> {
        self.ensure_usable()?;
        Err(DbApiError::not_supported(format!(
            "callproc({procname}) is not supported; use execute(\"exec procedure ...\")"
        )))
    }

    /// Close the cursor. Rows still pending on the handle are discarded; failures while
    /// doing so are swallowed. Closing twice is harmless.
    pub fn close(&mut self) {
        let outcome = {
            let mut shared = self.shared.borrow_mut();
            if shared.closed {
                return;
            }
            shared.closed = true;
            std::mem::replace(&mut shared.outcome, StatementOutcome::NotExecuted)
        };
        if let StatementOutcome::Rows(stream) = outcome
            && stream.is_live()
            && self.is_current()
        {
            self.discard_pending_rows();
        }
    }

    fn discard_pending_rows(&self) {
        let mut inner = self.connection.inner().borrow_mut();
        let Ok(handle) = inner.handle_mut() else {
            return;
        };
        loop {
            match handle.next_row() {
                Ok(Some(_)) => {}
                Ok(None) => break,
                Err(e) => {
                    tracing::warn!(code = e.code, "discarding rows on cursor close failed: {}", e.message);
                    break;
                }
            }
        }
    }
}

/// Iterator over the rows of a cursor's current result set.
///
/// Yields `Err` for a row that cannot be decoded and then carries on with the next one.
#[derive(Debug)]
pub struct Rows<'c> {
    cursor: &'c mut Cursor,
    done: bool,
}

impl Iterator for Rows<'_> {
    type Item = Result<Row, DbApiError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let next = self.cursor.fetchone().transpose();
        match &next {
            None => self.done = true,
            Some(Err(e)) if e.kind() == ErrorKind::Interface => self.done = true,
            _ => {}
        }
        next
    }
}

impl<'c> IntoIterator for &'c mut Cursor {
    type Item = Result<Row, DbApiError>;
    type IntoIter = Rows<'c>;

    fn into_iter(self) -> Rows<'c> {
        self.rows()
    }
}
