use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};
use rusqlite::ToSql;
use rusqlite::types::{ToSqlOutput, Value, ValueRef};

use crate::handle::{HandleError, WireValue, codes};

/// Text layout datetimes are stored in; sorts chronologically for a fixed offset.
pub(crate) const DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f%:z";

pub(crate) fn format_datetime(value: &DateTime<FixedOffset>) -> String {
    value.format(DATETIME_FORMAT).to_string()
}

/// Read stored datetime text. Text without an offset, such as SQLite's own
/// `CURRENT_TIMESTAMP` and `CURRENT_DATE`, is taken as UTC.
pub(crate) fn parse_datetime(text: &str) -> Option<DateTime<FixedOffset>> {
    let text = text.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(text)
        .or_else(|_| DateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f%:z"))
    {
        return Some(dt);
    }
    let naive = NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f"))
        .or_else(|_| {
            NaiveDate::parse_from_str(text, "%Y-%m-%d").map(|d| d.and_time(chrono::NaiveTime::MIN))
        })
        .ok()?;
    Some(naive.and_utc().fixed_offset())
}

/// Binds a [`WireValue`] without copying text or blob bytes.
pub(crate) struct SqlParam<'a>(pub(crate) &'a WireValue);

impl ToSql for SqlParam<'_> {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self.0 {
            WireValue::Null => ToSqlOutput::Borrowed(ValueRef::Null),
            WireValue::Integer(i) => ToSqlOutput::Owned(Value::Integer(*i)),
            WireValue::Real(f) => ToSqlOutput::Owned(Value::Real(*f)),
            WireValue::Text(bytes) => ToSqlOutput::Borrowed(ValueRef::Text(bytes)),
            WireValue::Blob(bytes) => ToSqlOutput::Borrowed(ValueRef::Blob(bytes)),
            WireValue::Datetime(dt) => ToSqlOutput::Owned(Value::Text(format_datetime(dt))),
            WireValue::IntervalYm { .. } | WireValue::IntervalDs(_) => {
                return Err(rusqlite::Error::ToSqlConversionFailure(Box::new(
                    HandleError::new(codes::CONV_FAIL, "intervals cannot be stored locally"),
                )));
            }
        })
    }
}
