use std::collections::VecDeque;

use crate::handle::{ColumnMeta, Effects, Handle, HandleError, WireValue, codes};

use super::handle_error;
use super::params::SqlParam;
use super::query::collect_rows;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Control {
    Begin,
    Commit,
    Rollback,
}

fn control_statement(sql: &str) -> Option<Control> {
    let word = sql.trim().trim_end_matches(';').trim();
    if word.eq_ignore_ascii_case("begin") {
        Some(Control::Begin)
    } else if word.eq_ignore_ascii_case("commit") {
        Some(Control::Commit)
    } else if word.eq_ignore_ascii_case("rollback") {
        Some(Control::Rollback)
    } else {
        None
    }
}

/// Adds a statement's changed-row count to `effects` under its leading keyword.
fn record_changes(effects: &mut Effects, sql: &str, changes: i64) {
    let keyword = sql
        .trim_start()
        .split(|c: char| !c.is_ascii_alphabetic())
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase();
    match keyword.as_str() {
        "insert" | "replace" => effects.num_inserted += changes,
        "update" => effects.num_updated += changes,
        "delete" => effects.num_deleted += changes,
        _ => {}
    }
    effects.num_affected += changes;
}

/// [`Handle`] over one `rusqlite::Connection`.
///
/// Result sets are read eagerly when the statement runs and then handed out row by row.
#[derive(Debug)]
pub struct SqliteHandle {
    conn: Option<rusqlite::Connection>,
    pending: VecDeque<Vec<WireValue>>,
    in_txn: bool,
    txn_effects: Effects,
    last_effects: Effects,
}

impl SqliteHandle {
    #[must_use]
    pub fn new(conn: rusqlite::Connection) -> Self {
        Self {
            conn: Some(conn),
            pending: VecDeque::new(),
            in_txn: false,
            txn_effects: Effects::default(),
            last_effects: Effects::default(),
        }
    }

    fn conn(&self) -> Result<&rusqlite::Connection, HandleError> {
        self.conn
            .as_ref()
            .ok_or_else(|| HandleError::new(codes::NOT_CONNECTED, "handle is closed"))
    }

    fn run_control(&mut self, control: Control) -> Result<(), HandleError> {
        let conn = self
            .conn
            .as_ref()
            .ok_or_else(|| HandleError::new(codes::NOT_CONNECTED, "handle is closed"))?;
        match control {
            Control::Begin => {
                conn.execute_batch("BEGIN")
                    .map_err(|e| handle_error(&e, codes::BAD_STATE))?;
                self.in_txn = true;
                self.txn_effects = Effects::default();
            }
            Control::Commit => {
                let result = conn.execute_batch("COMMIT");
                self.in_txn = false;
                if let Err(e) = result {
                    if !conn.is_autocommit()
                        && let Err(rollback_err) = conn.execute_batch("ROLLBACK")
                    {
                        tracing::warn!("rollback after failed commit failed: {rollback_err}");
                    }
                    return Err(handle_error(&e, codes::UNKNOWN));
                }
                self.last_effects = self.txn_effects;
            }
            Control::Rollback => {
                self.in_txn = false;
                if !conn.is_autocommit() {
                    conn.execute_batch("ROLLBACK")
                        .map_err(|e| handle_error(&e, codes::UNKNOWN))?;
                }
                self.last_effects = Effects::default();
            }
        }
        Ok(())
    }
}

impl Handle for SqliteHandle {
    fn execute(
        &mut self,
        sql: &str,
        params: &[(String, WireValue)],
    ) -> Result<Vec<ColumnMeta>, HandleError> {
        self.pending.clear();
        if let Some(control) = control_statement(sql) {
            self.run_control(control)?;
            return Ok(Vec::new());
        }

        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(sql)
            .map_err(|e| handle_error(&e, codes::PREPARE_ERROR))?;
        for (name, value) in params {
            if let Some(idx) = stmt
                .parameter_index(&format!("@{name}"))
                .map_err(|e| handle_error(&e, codes::PREPARE_ERROR))?
            {
                stmt.raw_bind_parameter(idx, SqlParam(value))
                    .map_err(|e| handle_error(&e, codes::CONV_FAIL))?;
            }
        }

        if stmt.column_count() == 0 {
            let changes = stmt
                .raw_execute()
                .map_err(|e| handle_error(&e, codes::UNKNOWN))?;
            let changes = i64::try_from(changes).unwrap_or(i64::MAX);
            drop(stmt);
            if self.in_txn {
                record_changes(&mut self.txn_effects, sql, changes);
            } else {
                let mut effects = Effects::default();
                record_changes(&mut effects, sql, changes);
                self.last_effects = effects;
            }
            return Ok(Vec::new());
        }

        let (columns, rows) = collect_rows(&mut stmt)?;
        drop(stmt);
        let selected = i64::try_from(rows.len()).unwrap_or(i64::MAX);
        if self.in_txn {
            self.txn_effects.num_selected += selected;
        } else {
            self.last_effects = Effects {
                num_selected: selected,
                ..Effects::default()
            };
        }
        self.pending = rows.into();
        Ok(columns)
    }

    fn next_row(&mut self) -> Result<Option<Vec<WireValue>>, HandleError> {
        self.conn()?;
        Ok(self.pending.pop_front())
    }

    fn get_effects(&mut self) -> Result<Effects, HandleError> {
        self.conn()?;
        Ok(self.last_effects)
    }

    fn close(&mut self) -> Result<(), HandleError> {
        self.pending.clear();
        match self.conn.take() {
            Some(conn) => conn
                .close()
                .map_err(|(_, e)| handle_error(&e, codes::IO_ERROR)),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handle() -> SqliteHandle {
        SqliteHandle::new(rusqlite::Connection::open_in_memory().unwrap())
    }

    #[test]
    fn recognises_control_statements() {
        assert_eq!(control_statement(" BEGIN "), Some(Control::Begin));
        assert_eq!(control_statement("commit;"), Some(Control::Commit));
        assert_eq!(control_statement("rollback transaction"), None);
        assert_eq!(control_statement("select 1"), None);
    }

    #[test]
    fn effects_cover_the_committed_transaction() {
        let mut h = handle();
        h.execute("create table t (k integer, v text)", &[]).unwrap();
        h.execute("begin", &[]).unwrap();
        for k in 0..3 {
            let params = vec![("k".to_string(), WireValue::Integer(k))];
            h.execute("insert into t values (@k, 'a')", &params).unwrap();
        }
        h.execute("update t set v = 'b' where k > 0", &[]).unwrap();
        h.execute("commit", &[]).unwrap();

        let effects = h.get_effects().unwrap();
        assert_eq!(effects.num_affected, 5);
        assert_eq!(effects.num_inserted, 3);
        assert_eq!(effects.num_updated, 2);
    }

    #[test]
    fn rows_stream_in_order_and_statement_discards_leftovers() {
        let mut h = handle();
        let columns = h.execute("select 1 as a union all select 2", &[]).unwrap();
        assert_eq!(columns.len(), 1);
        assert_eq!(h.next_row().unwrap(), Some(vec![WireValue::Integer(1)]));
        h.execute("select 3", &[]).unwrap();
        assert_eq!(h.next_row().unwrap(), Some(vec![WireValue::Integer(3)]));
        assert_eq!(h.next_row().unwrap(), None);
    }

    #[test]
    fn rollback_discards_changes() {
        let mut h = handle();
        h.execute("create table t (k integer)", &[]).unwrap();
        h.execute("begin", &[]).unwrap();
        h.execute("insert into t values (1)", &[]).unwrap();
        h.execute("rollback", &[]).unwrap();
        h.execute("select count(*) from t", &[]).unwrap();
        assert_eq!(h.next_row().unwrap(), Some(vec![WireValue::Integer(0)]));
    }

    #[test]
    fn malformed_sql_is_a_prepare_error() {
        let err = handle().execute("selec 1", &[]).unwrap_err();
        assert_eq!(err.code, codes::PREPARE_ERROR);
    }

    #[test]
    fn closed_handle_refuses_work() {
        let mut h = handle();
        h.close().unwrap();
        assert_eq!(h.execute("select 1", &[]).unwrap_err().code, codes::NOT_CONNECTED);
        assert!(h.close().is_ok());
    }
}
