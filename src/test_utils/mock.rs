use std::cell::RefCell;
use std::collections::{HashSet, VecDeque};
use std::rc::Rc;

use crate::config::ConnectOptions;
use crate::handle::{ColumnMeta, Connector, Effects, Handle, HandleError, WireValue, codes};
use crate::types::ColumnType;

/// How a [`MockHandle`] answers a statement.
#[derive(Debug, Clone)]
pub enum Response {
    /// A result set.
    Rows {
        columns: Vec<ColumnMeta>,
        rows: Vec<Vec<WireValue>>,
    },
    /// A write touching `affected` rows; counted toward the transaction's effects.
    Write { affected: i64 },
    /// The statement itself fails.
    Fail(HandleError),
    /// The statement is accepted, but the next `commit` or `rollback` fails with this error.
    Deferred(HandleError),
    /// A result set whose stream breaks after the given rows.
    RowsThenFail {
        columns: Vec<ColumnMeta>,
        rows: Vec<Vec<WireValue>>,
        error: HandleError,
    },
    /// One row holding the bound parameters, one column per parameter.
    EchoParams,
}

impl Response {
    #[must_use]
    pub fn rows(columns: Vec<ColumnMeta>, rows: Vec<Vec<WireValue>>) -> Self {
        Self::Rows { columns, rows }
    }

    #[must_use]
    pub fn fail(code: i32, message: &str) -> Self {
        Self::Fail(HandleError::new(code, message))
    }

    #[must_use]
    pub fn deferred(code: i32, message: &str) -> Self {
        Self::Deferred(HandleError::new(code, message))
    }
}

#[derive(Debug)]
struct MockState {
    tiers: HashSet<String>,
    missing_databases: HashSet<String>,
    /// Later rules take precedence.
    rules: Vec<(String, Response)>,
    statements: Vec<String>,
    last_params: Vec<(String, WireValue)>,
    fail_begin: Option<HandleError>,
    fail_get_effects: Option<HandleError>,
    fail_close: Option<HandleError>,
    opened: usize,
    closed: usize,
}

impl MockState {
    fn response_for(&self, sql: &str) -> Response {
        let sql = sql.to_ascii_lowercase();
        self.rules
            .iter()
            .rev()
            .find(|(pattern, _)| sql.contains(pattern.as_str()))
            .map_or(Response::Write { affected: 1 }, |(_, r)| r.clone())
    }
}

/// [`Connector`] producing scripted [`MockHandle`]s.
///
/// Clones share state, so a test can keep one clone to inspect what a connection sent.
/// Tiers `default`, `dev` and `local` are known; any non-empty database name is accepted
/// unless marked missing. Statements with no matching rule succeed as one-row writes.
#[derive(Debug, Clone)]
pub struct MockConnector {
    state: Rc<RefCell<MockState>>,
}

impl Default for MockConnector {
    fn default() -> Self {
        Self::new()
    }
}

impl MockConnector {
    #[must_use]
    pub fn new() -> Self {
        let tiers = ["default", "dev", "local"].into_iter().map(String::from).collect();
        Self {
            state: Rc::new(RefCell::new(MockState {
                tiers,
                missing_databases: HashSet::new(),
                rules: Vec::new(),
                statements: Vec::new(),
                last_params: Vec::new(),
                fail_begin: None,
                fail_get_effects: None,
                fail_close: None,
                opened: 0,
                closed: 0,
            })),
        }
    }

    /// Answer statements containing `pattern` (case-insensitive) with `response`.
    pub fn on(&self, pattern: &str, response: Response) -> &Self {
        self.state
            .borrow_mut()
            .rules
            .push((pattern.to_ascii_lowercase(), response));
        self
    }

    pub fn missing_database(&self, database: &str) -> &Self {
        self.state
            .borrow_mut()
            .missing_databases
            .insert(database.to_string());
        self
    }

    pub fn fail_begin(&self, error: HandleError) -> &Self {
        self.state.borrow_mut().fail_begin = Some(error);
        self
    }

    pub fn fail_get_effects(&self, error: HandleError) -> &Self {
        self.state.borrow_mut().fail_get_effects = Some(error);
        self
    }

    pub fn fail_close(&self, error: HandleError) -> &Self {
        self.state.borrow_mut().fail_close = Some(error);
        self
    }

    /// Every statement sent so far, in order, transaction control included.
    #[must_use]
    pub fn statements(&self) -> Vec<String> {
        self.state.borrow().statements.clone()
    }

    /// Parameters bound to the most recent non-control statement.
    #[must_use]
    pub fn last_params(&self) -> Vec<(String, WireValue)> {
        self.state.borrow().last_params.clone()
    }

    pub fn clear_statements(&self) {
        self.state.borrow_mut().statements.clear();
    }

    #[must_use]
    pub fn opened(&self) -> usize {
        self.state.borrow().opened
    }

    #[must_use]
    pub fn closed(&self) -> usize {
        self.state.borrow().closed
    }
}

impl Connector for MockConnector {
    fn open(&self, options: &ConnectOptions) -> Result<Box<dyn Handle>, HandleError> {
        let mut state = self.state.borrow_mut();
        if !state.tiers.contains(&options.tier) {
            return Err(HandleError::new(
                codes::CONNECT_ERROR,
                format!("no such tier '{}'", options.tier),
            ));
        }
        if options.database.is_empty() || state.missing_databases.contains(&options.database) {
            return Err(HandleError::new(
                codes::CONNECT_ERROR,
                format!("no such database '{}'", options.database),
            ));
        }
        state.opened += 1;
        Ok(Box::new(MockHandle {
            state: Rc::clone(&self.state),
            pending: VecDeque::new(),
            pending_error: None,
            in_txn: false,
            txn_affected: 0,
            deferred: None,
            last_effects: Effects::default(),
            closed: false,
        }))
    }
}

/// Handle opened by [`MockConnector`].
#[derive(Debug)]
pub struct MockHandle {
    state: Rc<RefCell<MockState>>,
    pending: VecDeque<Vec<WireValue>>,
    pending_error: Option<HandleError>,
    in_txn: bool,
    txn_affected: i64,
    deferred: Option<HandleError>,
    last_effects: Effects,
    closed: bool,
}

fn effects_of(affected: i64) -> Effects {
    Effects {
        num_affected: affected,
        ..Effects::default()
    }
}

fn echo_type(value: &WireValue) -> ColumnType {
    match value {
        WireValue::Integer(_) => ColumnType::Integer,
        WireValue::Real(_) => ColumnType::Real,
        WireValue::Null | WireValue::Text(_) => ColumnType::CString,
        WireValue::Blob(_) => ColumnType::Blob,
        WireValue::Datetime(_) => ColumnType::Datetime,
        WireValue::IntervalYm { .. } => ColumnType::IntervalYm,
        WireValue::IntervalDs(_) => ColumnType::IntervalDs,
    }
}

impl MockHandle {
    fn control(&mut self, sql: &str) -> Option<Result<(), HandleError>> {
        let word = sql.trim().trim_end_matches(';').trim().to_ascii_lowercase();
        let result = match word.as_str() {
            "begin" => {
                if let Some(err) = self.state.borrow().fail_begin.clone() {
                    return Some(Err(err));
                }
                self.in_txn = true;
                self.txn_affected = 0;
                Ok(())
            }
            "commit" => {
                self.in_txn = false;
                match self.deferred.take() {
                    Some(err) => {
                        self.last_effects = Effects::default();
                        Err(err)
                    }
                    None => {
                        self.last_effects = effects_of(self.txn_affected);
                        Ok(())
                    }
                }
            }
            "rollback" => {
                self.in_txn = false;
                self.last_effects = Effects::default();
                self.deferred.take().map_or(Ok(()), Err)
            }
            _ => return None,
        };
        Some(result)
    }

    fn record_write(&mut self, affected: i64) {
        if self.in_txn {
            self.txn_affected += affected;
        } else {
            self.last_effects = effects_of(affected);
        }
    }
}

impl Handle for MockHandle {
    fn execute(
        &mut self,
        sql: &str,
        params: &[(String, WireValue)],
    ) -> Result<Vec<ColumnMeta>, HandleError> {
        if self.closed {
            return Err(HandleError::new(codes::NOT_CONNECTED, "handle is closed"));
        }
        self.pending.clear();
        self.pending_error = None;
        self.state.borrow_mut().statements.push(sql.to_string());
        if let Some(result) = self.control(sql) {
            return result.map(|()| Vec::new());
        }

        let response = {
            let mut state = self.state.borrow_mut();
            state.last_params = params.to_vec();
            state.response_for(sql)
        };
        match response {
            Response::Rows { columns, rows } => {
                self.pending = rows.into();
                Ok(columns)
            }
            Response::RowsThenFail {
                columns,
                rows,
                error,
            } => {
                self.pending = rows.into();
                self.pending_error = Some(error);
                Ok(columns)
            }
            Response::Write { affected } => {
                self.record_write(affected);
                Ok(Vec::new())
            }
            Response::Fail(err) => Err(err),
            Response::Deferred(err) => {
                self.record_write(1);
                if self.in_txn {
                    self.deferred.get_or_insert(err);
                    Ok(Vec::new())
                } else {
                    Err(err)
                }
            }
            Response::EchoParams => {
                let columns = params
                    .iter()
                    .map(|(name, value)| ColumnMeta::new(name.clone(), echo_type(value)))
                    .collect();
                self.pending
                    .push_back(params.iter().map(|(_, v)| v.clone()).collect());
                Ok(columns)
            }
        }
    }

    fn next_row(&mut self) -> Result<Option<Vec<WireValue>>, HandleError> {
        if let Some(row) = self.pending.pop_front() {
            return Ok(Some(row));
        }
        match self.pending_error.take() {
            Some(err) => Err(err),
            None => Ok(None),
        }
    }

    fn get_effects(&mut self) -> Result<Effects, HandleError> {
        if let Some(err) = self.state.borrow().fail_get_effects.clone() {
            return Err(err);
        }
        Ok(self.last_effects)
    }

    fn close(&mut self) -> Result<(), HandleError> {
        self.closed = true;
        let mut state = self.state.borrow_mut();
        state.closed += 1;
        match state.fail_close.clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}
