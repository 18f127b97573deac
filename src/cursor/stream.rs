use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use crate::codec::decode_row;
use crate::error::DbApiError;
use crate::handle::{ColumnMeta, WireValue};
use crate::results::{ColumnDescription, Row};
use crate::results::index_columns;

/// Forward-only source of rows for one executed statement.
///
/// Rows stay raw until they are handed out, so a value that cannot be decoded only fails
/// the fetch that reaches it.
#[derive(Debug)]
pub(crate) struct RowStream {
    columns: Vec<ColumnMeta>,
    column_names: Arc<Vec<String>>,
    column_index: Arc<HashMap<String, usize>>,
    buffered: VecDeque<Vec<WireValue>>,
    /// Still attached to the handle's current statement.
    live: bool,
    /// Failure hit while detaching; reported once the buffer before it is consumed.
    pending_error: Option<DbApiError>,
}

impl RowStream {
    pub(crate) fn new(columns: Vec<ColumnMeta>) -> Self {
        let names: Vec<String> = columns.iter().map(|c| c.name.clone()).collect();
        let column_index = Arc::new(index_columns(&names));
        Self {
            columns,
            column_names: Arc::new(names),
            column_index,
            buffered: VecDeque::new(),
            live: true,
            pending_error: None,
        }
    }

    pub(crate) fn description(&self) -> Vec<ColumnDescription> {
        self.columns.iter().map(ColumnDescription::from).collect()
    }

    pub(crate) fn is_live(&self) -> bool {
        self.live
    }

    pub(crate) fn has_more(&self) -> bool {
        self.live || !self.buffered.is_empty() || self.pending_error.is_some()
    }

    pub(crate) fn push_buffered(&mut self, row: Vec<WireValue>) {
        self.buffered.push_back(row);
    }

    pub(crate) fn mark_drained(&mut self) {
        self.live = false;
    }

    pub(crate) fn fail(&mut self, err: DbApiError) {
        self.live = false;
        self.pending_error = Some(err);
    }

    /// Next row already held client-side, or the deferred failure once the buffer is empty.
    pub(crate) fn take_buffered(&mut self) -> Option<Result<Vec<WireValue>, DbApiError>> {
        if let Some(row) = self.buffered.pop_front() {
            return Some(Ok(row));
        }
        self.pending_error.take().map(Err)
    }

    pub(crate) fn decode(&self, raw: Vec<WireValue>) -> Result<Row, DbApiError> {
        let values = decode_row(&self.columns, raw)?;
        Ok(Row::with_cache(
            Arc::clone(&self.column_names),
            Arc::clone(&self.column_index),
            values,
        ))
    }
}
