use crate::error::{DbApiError, ErrorDetail};
use crate::handle::{ColumnMeta, WireValue};
use crate::types::{Binary, Datetime, TypeTag, Value};

/// Decode one raw column value.
///
/// Runs when a row is materialized, so a bad value only fails the row that holds it.
///
/// # Errors
/// `DbApiError::Data` for text that is not UTF-8 or that sits in a datetime column (the
/// handle could not read it as one), `DbApiError::NotSupported` for intervals.
pub fn decode_value(column: &ColumnMeta, raw: WireValue) -> Result<Value, DbApiError> {
    let value = match raw {
        WireValue::Null => Value::Null,
        _ if column.column_type.is_interval() => return Err(unsupported_interval(column)),
        WireValue::Integer(i) => Value::Int(i),
        WireValue::Real(f) => Value::Float(f),
        WireValue::Text(bytes) if column.column_type.type_tag() == Some(TypeTag::Datetime) => {
            return Err(DbApiError::data(format!(
                "column '{}' holds '{}', which is not a datetime",
                column.name,
                String::from_utf8_lossy(&bytes)
            )));
        }
        WireValue::Text(bytes) => Value::Text(String::from_utf8(bytes).map_err(|e| {
            DbApiError::data(format!(
                "column '{}' holds text that is not valid UTF-8: {e}",
                column.name
            ))
        })?),
        WireValue::Blob(bytes) => Value::Binary(Binary(bytes)),
        WireValue::Datetime(dt) => Value::Datetime(Datetime::from_aware(&dt)),
        WireValue::IntervalYm { .. } | WireValue::IntervalDs(_) => {
            return Err(unsupported_interval(column));
        }
    };
    Ok(value)
}

/// Decode a whole raw row against its column metadata.
///
/// # Errors
/// Propagates the first [`decode_value`] failure; `DbApiError::Internal` if the handle
/// returned a row of the wrong width.
pub fn decode_row(columns: &[ColumnMeta], raw: Vec<WireValue>) -> Result<Vec<Value>, DbApiError> {
    if raw.len() != columns.len() {
        return Err(DbApiError::Internal(ErrorDetail::client(format!(
            "row has {} values for {} columns",
            raw.len(),
            columns.len()
        ))));
    }
    columns
        .iter()
        .zip(raw)
        .map(|(column, value)| decode_value(column, value))
        .collect()
}

fn unsupported_interval(column: &ColumnMeta) -> DbApiError {
    DbApiError::not_supported(format!(
        "column '{}' is an interval, which has no client representation",
        column.name
    ))
}
