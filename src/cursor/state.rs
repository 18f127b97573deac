use crate::results::ColumnDescription;

use super::stream::RowStream;

/// Observable lifecycle of a cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorState {
    /// Nothing executed yet, or the last statement produced no rows.
    Idle,
    /// The last statement produced a result set with rows left to fetch.
    HasResult,
    /// The result set has been read to the end.
    Exhausted,
    Closed,
}

/// What the last `execute` left behind.
#[derive(Debug)]
pub(crate) enum StatementOutcome {
    NotExecuted,
    /// The statement failed before producing anything.
    Failed,
    /// A statement without a result set; its effect is known at commit.
    Write,
    Rows(RowStream),
}

/// Cursor state reachable from the connection, which publishes commit row counts and
/// detaches live row streams through it.
#[derive(Debug)]
pub(crate) struct CursorShared {
    pub(crate) description: Option<Vec<ColumnDescription>>,
    pub(crate) rowcount: i64,
    pub(crate) outcome: StatementOutcome,
    pub(crate) closed: bool,
}

impl CursorShared {
    pub(crate) fn new() -> Self {
        Self {
            description: None,
            rowcount: -1,
            outcome: StatementOutcome::NotExecuted,
            closed: false,
        }
    }

    pub(crate) fn reset(&mut self) {
        self.description = None;
        self.rowcount = -1;
        self.outcome = StatementOutcome::Failed;
    }

    pub(crate) fn live_stream_mut(&mut self) -> Option<&mut RowStream> {
        match &mut self.outcome {
            StatementOutcome::Rows(stream) if stream.is_live() => Some(stream),
            _ => None,
        }
    }

    pub(crate) fn state(&self) -> CursorState {
        if self.closed {
            return CursorState::Closed;
        }
        match &self.outcome {
            StatementOutcome::Rows(stream) if stream.has_more() => CursorState::HasResult,
            StatementOutcome::Rows(_) => CursorState::Exhausted,
            _ => CursorState::Idle,
        }
    }
}
