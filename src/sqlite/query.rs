use rusqlite::types::ValueRef;

use crate::handle::{ColumnMeta, HandleError, WireValue, codes};
use crate::types::ColumnType;

use super::params::parse_datetime;

/// Column type implied by a declared SQLite type, using SQLite's affinity rules plus the
/// usual spellings for datetime columns.
pub(crate) fn column_type_from_decl(decl: &str) -> Option<ColumnType> {
    let decl = decl.to_ascii_uppercase();
    if decl.contains("DATE") || decl.contains("TIME") {
        Some(ColumnType::Datetime)
    } else if decl.contains("INT") {
        Some(ColumnType::Integer)
    } else if decl.contains("CHAR") || decl.contains("CLOB") || decl.contains("TEXT") {
        Some(ColumnType::CString)
    } else if decl.contains("BLOB") {
        Some(ColumnType::Blob)
    } else if decl.contains("REAL") || decl.contains("FLOA") || decl.contains("DOUB") {
        Some(ColumnType::Real)
    } else {
        None
    }
}

fn column_type_from_value(value: ValueRef<'_>) -> Option<ColumnType> {
    match value {
        ValueRef::Null => None,
        ValueRef::Integer(_) => Some(ColumnType::Integer),
        ValueRef::Real(_) => Some(ColumnType::Real),
        ValueRef::Text(_) => Some(ColumnType::CString),
        ValueRef::Blob(_) => Some(ColumnType::Blob),
    }
}

/// Convert one stored value, reading text in datetime columns as a datetime.
///
/// Datetime text that cannot be read is passed on as text; decoding fails for the row that
/// holds it once that row is fetched.
pub(crate) fn extract_value(value: ValueRef<'_>, column_type: Option<ColumnType>) -> WireValue {
    match value {
        ValueRef::Null => WireValue::Null,
        ValueRef::Integer(i) => WireValue::Integer(i),
        ValueRef::Real(f) => WireValue::Real(f),
        ValueRef::Text(bytes) if column_type == Some(ColumnType::Datetime) => {
            match std::str::from_utf8(bytes).ok().and_then(parse_datetime) {
                Some(dt) => WireValue::Datetime(dt),
                None => WireValue::Text(bytes.to_vec()),
            }
        }
        ValueRef::Text(bytes) => WireValue::Text(bytes.to_vec()),
        ValueRef::Blob(bytes) => WireValue::Blob(bytes.to_vec()),
    }
}

/// Run a prepared row-producing statement to completion.
///
/// Columns without a declared type take the type of their first non-null value, or
/// `CString` if they hold nothing but nulls.
pub(crate) fn collect_rows(
    stmt: &mut rusqlite::Statement<'_>,
) -> Result<(Vec<ColumnMeta>, Vec<Vec<WireValue>>), HandleError> {
    let (names, mut types): (Vec<String>, Vec<Option<ColumnType>>) = stmt
        .columns()
        .iter()
        .map(|c| (c.name().to_string(), c.decl_type().and_then(column_type_from_decl)))
        .unzip();
    let declared = types.clone();

    let mut rows = Vec::new();
    let mut raw = stmt.raw_query();
    while let Some(row) = raw
        .next()
        .map_err(|e| super::handle_error(&e, codes::UNKNOWN))?
    {
        let mut values = Vec::with_capacity(names.len());
        for (idx, slot) in types.iter_mut().enumerate() {
            let value = row
                .get_ref(idx)
                .map_err(|e| super::handle_error(&e, codes::BAD_COLUMN))?;
            if slot.is_none() {
                *slot = column_type_from_value(value);
            }
            values.push(extract_value(value, declared[idx]));
        }
        rows.push(values);
    }

    let columns = names
        .into_iter()
        .zip(types)
        .map(|(name, ty)| ColumnMeta::new(name, ty.unwrap_or(ColumnType::CString)))
        .collect();
    Ok((columns, rows))
}
