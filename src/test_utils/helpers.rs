use std::sync::Arc;

use crate::handle::ColumnMeta;
use crate::results::Row;
use crate::types::{ColumnType, Value};

/// Create a test row with the given column names and values.
#[must_use]
pub fn create_test_row(column_names: Vec<String>, values: Vec<Value>) -> Row {
    Row::new(Arc::new(column_names), values)
}

#[must_use]
pub fn int_column(name: &str) -> ColumnMeta {
    ColumnMeta::new(name, ColumnType::Integer)
}

#[must_use]
pub fn text_column(name: &str) -> ColumnMeta {
    ColumnMeta::new(name, ColumnType::CString)
}
