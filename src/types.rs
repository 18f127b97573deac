use std::fmt;
use std::ops::Deref;

use chrono::{
    DateTime, Datelike, FixedOffset, NaiveDate, NaiveDateTime, Offset, TimeDelta, TimeZone, Timelike,
    Utc,
};

use crate::error::DbApiError;

/// Coarse result-column category exposed through cursor descriptions.
///
/// A tag compares equal to every [`ColumnType`] it covers:
/// ```rust
/// use sql_dbapi::{ColumnType, NUMBER, STRING};
///
/// assert_eq!(NUMBER, ColumnType::Integer);
/// assert_eq!(NUMBER, ColumnType::Real);
/// assert_ne!(STRING, ColumnType::Integer);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeTag {
    String,
    Number,
    Binary,
    Datetime,
}

pub const STRING: TypeTag = TypeTag::String;
pub const NUMBER: TypeTag = TypeTag::Number;
pub const BINARY: TypeTag = TypeTag::Binary;
pub const DATETIME: TypeTag = TypeTag::Datetime;

impl TypeTag {
    #[must_use]
    pub fn matches(self, column_type: ColumnType) -> bool {
        column_type.type_tag() == Some(self)
    }
}

/// Declared type of a result column as reported by the handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnType {
    Integer,
    Real,
    CString,
    Blob,
    Datetime,
    DatetimeUs,
    IntervalYm,
    IntervalDs,
    IntervalDsUs,
}

impl ColumnType {
    /// The tag this type aliases; interval types have none.
    #[must_use]
    pub fn type_tag(self) -> Option<TypeTag> {
        match self {
            Self::Integer | Self::Real => Some(TypeTag::Number),
            Self::CString => Some(TypeTag::String),
            Self::Blob => Some(TypeTag::Binary),
            Self::Datetime | Self::DatetimeUs => Some(TypeTag::Datetime),
            Self::IntervalYm | Self::IntervalDs | Self::IntervalDsUs => None,
        }
    }

    #[must_use]
    pub fn is_interval(self) -> bool {
        matches!(
            self,
            Self::IntervalYm | Self::IntervalDs | Self::IntervalDsUs
        )
    }
}

impl PartialEq<ColumnType> for TypeTag {
    fn eq(&self, other: &ColumnType) -> bool {
        self.matches(*other)
    }
}

impl PartialEq<TypeTag> for ColumnType {
    fn eq(&self, other: &TypeTag) -> bool {
        other.matches(*self)
    }
}

/// Byte string, kept distinct from text for binding and decoding.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Binary(pub Vec<u8>);

impl Binary {
    #[must_use]
    pub fn into_inner(self) -> Vec<u8> {
        self.0
    }
}

impl Deref for Binary {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.0
    }
}

impl AsRef<[u8]> for Binary {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<Vec<u8>> for Binary {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl From<&[u8]> for Binary {
    fn from(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }
}

impl<const N: usize> From<&[u8; N]> for Binary {
    fn from(bytes: &[u8; N]) -> Self {
        Self(bytes.to_vec())
    }
}

/// Wall-clock date and time with microsecond precision and an optional fixed offset.
///
/// Naive values (no offset) are bound as UTC. Values read back from the database are
/// always aware.
#[derive(Debug, Clone, Copy)]
pub struct Datetime {
    wall: NaiveDateTime,
    offset: Option<FixedOffset>,
}

/// Alias kept for the standard constructor name.
pub type Timestamp = Datetime;

impl Datetime {
    /// Build a value from calendar fields.
    ///
    /// # Errors
    /// Returns `DbApiError::Data` when the fields do not name a real date and time.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        year: i32,
        month: u32,
        day: u32,
        hour: u32,
        minute: u32,
        second: u32,
        microsecond: u32,
        tz: Option<FixedOffset>,
    ) -> Result<Self, DbApiError> {
        if microsecond >= 1_000_000 {
            return Err(DbApiError::data(format!(
                "microsecond {microsecond} out of range"
            )));
        }
        let wall = NaiveDate::from_ymd_opt(year, month, day)
            .and_then(|d| d.and_hms_micro_opt(hour, minute, second, microsecond))
            .ok_or_else(|| {
                DbApiError::data(format!(
                    "invalid datetime {year:04}-{month:02}-{day:02} {hour:02}:{minute:02}:{second:02}.{microsecond:06}"
                ))
            })?;
        Ok(Self { wall, offset: tz })
    }

    #[must_use]
    pub fn from_naive(wall: NaiveDateTime) -> Self {
        Self { wall, offset: None }
    }

    #[must_use]
    pub fn from_aware<Tz: TimeZone>(dt: &DateTime<Tz>) -> Self {
        let fixed = dt.fixed_offset();
        Self {
            wall: fixed.naive_local(),
            offset: Some(*fixed.offset()),
        }
    }

    /// Wall-clock reading in the value's own offset.
    #[must_use]
    pub fn wall_clock(&self) -> NaiveDateTime {
        self.wall
    }

    #[must_use]
    pub fn offset(&self) -> Option<FixedOffset> {
        self.offset
    }

    #[must_use]
    pub fn is_aware(&self) -> bool {
        self.offset.is_some()
    }

    /// Resolve to an aware instant, reading naive values as UTC.
    ///
    /// `None` when applying the offset pushes the instant outside chrono's range.
    #[must_use]
    pub fn to_fixed(&self) -> Option<DateTime<FixedOffset>> {
        let offset = self.offset.unwrap_or_else(utc_offset);
        offset.from_local_datetime(&self.wall).single()
    }

    #[must_use]
    pub fn year(&self) -> i32 {
        self.wall.year()
    }

    #[must_use]
    pub fn microsecond(&self) -> u32 {
        self.wall.nanosecond() / 1_000
    }
}

pub(crate) fn utc_offset() -> FixedOffset {
    Utc.fix()
}

impl PartialEq for Datetime {
    fn eq(&self, other: &Self) -> bool {
        match (self.offset, other.offset) {
            (Some(_), Some(_)) => match (self.to_fixed(), other.to_fixed()) {
                (Some(a), Some(b)) => a == b,
                _ => self.wall == other.wall && self.offset == other.offset,
            },
            (None, None) => self.wall == other.wall,
            _ => false,
        }
    }
}

impl fmt::Display for Datetime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.offset {
            Some(offset) => write!(f, "{}{offset}", self.wall.format("%Y-%m-%dT%H:%M:%S%.6f")),
            None => write!(f, "{}", self.wall.format("%Y-%m-%dT%H:%M:%S%.6f")),
        }
    }
}

/// Build a [`Binary`] wrapper.
pub fn binary(bytes: impl Into<Vec<u8>>) -> Binary {
    Binary(bytes.into())
}

/// Build a [`Datetime`] from calendar fields; `tz = None` yields a naive value.
///
/// # Errors
/// Returns `DbApiError::Data` for impossible dates or times.
#[allow(clippy::too_many_arguments)]
pub fn datetime(
    year: i32,
    month: u32,
    day: u32,
    hour: u32,
    minute: u32,
    second: u32,
    microsecond: u32,
    tz: Option<FixedOffset>,
) -> Result<Datetime, DbApiError> {
    Datetime::new(year, month, day, hour, minute, second, microsecond, tz)
}

/// Same as [`datetime`].
///
/// # Errors
/// Returns `DbApiError::Data` for impossible dates or times.
#[allow(clippy::too_many_arguments)]
pub fn timestamp(
    year: i32,
    month: u32,
    day: u32,
    hour: u32,
    minute: u32,
    second: u32,
    microsecond: u32,
    tz: Option<FixedOffset>,
) -> Result<Timestamp, DbApiError> {
    Datetime::new(year, month, day, hour, minute, second, microsecond, tz)
}

/// Midnight of the given day, naive.
///
/// # Errors
/// Returns `DbApiError::Data` for impossible dates.
pub fn date(year: i32, month: u32, day: u32) -> Result<Datetime, DbApiError> {
    Datetime::new(year, month, day, 0, 0, 0, 0, None)
}

/// UTC instant `secs` seconds after the Unix epoch, truncated to microseconds.
///
/// # Errors
/// Returns `DbApiError::Data` when `secs` is not finite or out of range.
pub fn timestamp_from_ticks(secs: f64) -> Result<Timestamp, DbApiError> {
    let micros = ticks_to_micros(secs)?;
    let dt = DateTime::<Utc>::from_timestamp_micros(micros)
        .ok_or_else(|| DbApiError::data(format!("ticks {secs} out of range")))?;
    Ok(Datetime::from_aware(&dt))
}

/// Midnight UTC of the day containing `secs` seconds after the Unix epoch.
///
/// # Errors
/// Returns `DbApiError::Data` when `secs` is not finite or out of range.
pub fn date_from_ticks(secs: f64) -> Result<Datetime, DbApiError> {
    let ts = timestamp_from_ticks(secs)?;
    let midnight = ts.wall_clock().date().and_time(chrono::NaiveTime::MIN);
    Ok(Datetime {
        wall: midnight,
        offset: ts.offset(),
    })
}

#[allow(clippy::cast_possible_truncation)]
fn ticks_to_micros(secs: f64) -> Result<i64, DbApiError> {
    let micros = (secs * 1_000_000.0).floor();
    if !micros.is_finite() || micros < i64::MIN as f64 || micros >= i64::MAX as f64 {
        return Err(DbApiError::data(format!("ticks {secs} out of range")));
    }
    Ok(micros as i64)
}

/// Values that can be bound as parameters or returned in a row.
///
/// ```rust
/// use sql_dbapi::Value;
///
/// let params = vec![Value::from(1), Value::from("alice"), Value::from(true)];
/// # let _ = params;
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// SQL NULL
    Null,
    /// Boolean; bound as an integer
    Bool(bool),
    /// Integer value (64-bit)
    Int(i64),
    /// Integer that does not fit 64 bits; rejected at bind time
    BigInt(i128),
    /// Floating point value (64-bit)
    Float(f64),
    /// Text/string value
    Text(String),
    /// Binary data
    Binary(Binary),
    /// Date and time, naive or aware
    Datetime(Datetime),
    /// Duration; has no parameter mapping
    Interval(TimeDelta),
}

impl Value {
    /// Check if this value is NULL
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(value) => Some(*value),
            Value::Bool(b) => Some(i64::from(*b)),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_float(&self) -> Option<f64> {
        if let Value::Float(value) = self {
            Some(*value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        if let Value::Text(value) = self {
            Some(value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_binary(&self) -> Option<&[u8]> {
        if let Value::Binary(bytes) = self {
            Some(bytes)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_datetime(&self) -> Option<&Datetime> {
        if let Value::Datetime(dt) = self {
            Some(dt)
        } else {
            None
        }
    }

    /// Short name of the variant, used in error messages.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) | Value::BigInt(_) => "integer",
            Value::Float(_) => "float",
            Value::Text(_) => "text",
            Value::Binary(_) => "binary",
            Value::Datetime(_) => "datetime",
            Value::Interval(_) => "interval",
        }
    }
}

macro_rules! value_from_small_int {
    ($($t:ty),*) => {
        $(impl From<$t> for Value {
            fn from(v: $t) -> Self {
                Value::Int(i64::from(v))
            }
        })*
    };
}

value_from_small_int!(i8, i16, i32, i64, u8, u16, u32);

macro_rules! value_from_wide_int {
    ($($t:ty),*) => {
        $(impl From<$t> for Value {
            fn from(v: $t) -> Self {
                match i64::try_from(v) {
                    Ok(i) => Value::Int(i),
                    Err(_) => Value::BigInt(i128::try_from(v).unwrap_or(i128::MAX)),
                }
            }
        })*
    };
}

value_from_wide_int!(u64, i128, u128, usize, isize);

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(f64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_owned())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<Binary> for Value {
    fn from(v: Binary) -> Self {
        Value::Binary(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Binary(Binary(v))
    }
}

impl From<Datetime> for Value {
    fn from(v: Datetime) -> Self {
        Value::Datetime(v)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(v: NaiveDateTime) -> Self {
        Value::Datetime(Datetime::from_naive(v))
    }
}

impl<Tz: TimeZone> From<DateTime<Tz>> for Value {
    fn from(v: DateTime<Tz>) -> Self {
        Value::Datetime(Datetime::from_aware(&v))
    }
}

impl From<TimeDelta> for Value {
    fn from(v: TimeDelta) -> Self {
        Value::Interval(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_alias_column_types() {
        for ct in [ColumnType::Integer, ColumnType::Real] {
            assert_eq!(NUMBER, ct);
            assert_ne!(STRING, ct);
            assert_ne!(BINARY, ct);
            assert_ne!(DATETIME, ct);
        }
        assert_eq!(ColumnType::CString, STRING);
        assert_eq!(ColumnType::Blob, BINARY);
        assert_eq!(ColumnType::DatetimeUs, DATETIME);
        assert!(ColumnType::IntervalDs.type_tag().is_none());
    }

    #[test]
    fn aware_datetimes_compare_as_instants() -> Result<(), DbApiError> {
        let utc = Datetime::new(2009, 2, 13, 23, 31, 30, 234_000, Some(utc_offset()))?;
        let new_york_winter = FixedOffset::west_opt(5 * 3600);
        let ny = Datetime::new(2009, 2, 13, 18, 31, 30, 234_000, new_york_winter)?;
        assert_eq!(utc, ny);

        let naive = Datetime::new(2009, 2, 13, 23, 31, 30, 234_000, None)?;
        assert_ne!(naive, utc);
        assert_eq!(naive.to_fixed(), utc.to_fixed());
        Ok(())
    }

    #[test]
    fn offset_past_the_calendar_edge_has_no_instant() -> Result<(), DbApiError> {
        let first_year = NaiveDate::MIN.year();
        let edge = Datetime::new(first_year, 1, 1, 0, 0, 0, 0, FixedOffset::east_opt(3600))?;
        assert!(edge.to_fixed().is_none());
        assert_eq!(edge, edge);
        let utc_edge = Datetime::new(first_year, 1, 1, 0, 0, 0, 0, Some(utc_offset()))?;
        assert!(utc_edge.to_fixed().is_some());
        Ok(())
    }

    #[test]
    fn rejects_impossible_fields() {
        assert!(matches!(
            Datetime::new(2015, 2, 30, 0, 0, 0, 0, None),
            Err(DbApiError::Data(_))
        ));
        assert!(matches!(
            Datetime::new(2015, 1, 1, 0, 0, 0, 1_000_000, None),
            Err(DbApiError::Data(_))
        ));
    }

    #[test]
    fn wide_integers_keep_their_value() {
        assert_eq!(Value::from(u64::MAX), Value::BigInt(i128::from(u64::MAX)));
        assert_eq!(Value::from(42_u64), Value::Int(42));
        assert_eq!(Value::from(None::<i32>), Value::Null);
        assert_eq!(Value::from(Some("x")), Value::Text("x".into()));
    }

    #[test]
    fn ticks_constructors() -> Result<(), DbApiError> {
        let ts = timestamp_from_ticks(1_234_567_890.25)?;
        assert_eq!(ts, Datetime::new(2009, 2, 13, 23, 31, 30, 250_000, Some(utc_offset()))?);
        let day = date_from_ticks(1_234_567_890.25)?;
        assert_eq!(day.wall_clock(), date(2009, 2, 13)?.wall_clock());
        assert!(timestamp_from_ticks(f64::NAN).is_err());
        Ok(())
    }
}
