use std::collections::BTreeMap;

use crate::error::DbApiError;
use crate::handle::WireValue;
use crate::types::Value;

use super::datetime::round_to_millis;

/// Named parameters for one statement execution.
///
/// ```rust
/// use sql_dbapi::{Params, params};
///
/// let a = Params::new().bind("k", 3).bind("v", 4);
/// let b = params! { "k" => 3, "v" => 4 };
/// assert_eq!(a, b);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Params(BTreeMap<String, Value>);

impl Params {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn bind(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(name.into(), value.into());
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Params {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl<K: Into<String>, V: Into<Value>, const N: usize> From<[(K, V); N]> for Params {
    fn from(pairs: [(K, V); N]) -> Self {
        pairs.into_iter().collect()
    }
}

/// Build [`Params`] from `name => value` pairs.
#[macro_export]
macro_rules! params {
    () => { $crate::Params::new() };
    ($($name:expr => $value:expr),+ $(,)?) => {
        $crate::Params::new()$(.bind($name, $value))+
    };
}

/// Parameters converted to what the handle accepts, in name order.
pub type BoundParams = Vec<(String, WireValue)>;

/// Convert every parameter; fails before anything is sent to the handle.
///
/// # Errors
/// `DbApiError::Data` for integers outside 64 bits or unrepresentable datetimes,
/// `DbApiError::Interface` for values with no wire mapping.
pub fn bind_params(params: &Params) -> Result<BoundParams, DbApiError> {
    params
        .iter()
        .map(|(name, value)| Ok((name.to_string(), bind_value(name, value)?)))
        .collect()
}

/// Convert one parameter value.
///
/// # Errors
/// See [`bind_params`].
pub fn bind_value(name: &str, value: &Value) -> Result<WireValue, DbApiError> {
    let wire = match value {
        Value::Null => WireValue::Null,
        Value::Bool(b) => WireValue::Integer(i64::from(*b)),
        Value::Int(i) => WireValue::Integer(*i),
        Value::BigInt(i) => WireValue::Integer(i64::try_from(*i).map_err(|_| {
            DbApiError::data(format!(
                "parameter '{name}': integer {i} does not fit in a signed 64-bit column"
            ))
        })?),
        Value::Float(f) => WireValue::Real(*f),
        Value::Text(s) => WireValue::Text(s.clone().into_bytes()),
        Value::Binary(b) => WireValue::Blob(b.0.clone()),
        Value::Datetime(dt) => {
            let rounded = dt.to_fixed().and_then(round_to_millis).ok_or_else(|| {
                DbApiError::data(format!("parameter '{name}': datetime {dt} out of range"))
            })?;
            WireValue::Datetime(rounded)
        }
        Value::Interval(_) => {
            return Err(DbApiError::interface(format!(
                "parameter '{name}' has unsupported type {}",
                value.type_name()
            )));
        }
    };
    Ok(wire)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::types::{Binary, Datetime};
    use chrono::{Datelike, FixedOffset, TimeDelta};

    #[test]
    fn binds_scalars() -> Result<(), DbApiError> {
        let params = Params::new()
            .bind("b", true)
            .bind("f", 0.125)
            .bind("i", i64::MAX)
            .bind("n", None::<i32>)
            .bind("s", "HELLO")
            .bind("x", Binary(vec![2, 1, 0]));
        let bound = bind_params(&params)?;
        assert_eq!(
            bound,
            vec![
                ("b".to_string(), WireValue::Integer(1)),
                ("f".to_string(), WireValue::Real(0.125)),
                ("i".to_string(), WireValue::Integer(i64::MAX)),
                ("n".to_string(), WireValue::Null),
                ("s".to_string(), WireValue::Text(b"HELLO".to_vec())),
                ("x".to_string(), WireValue::Blob(vec![2, 1, 0])),
            ]
        );
        Ok(())
    }

    #[test]
    fn rejects_integers_outside_64_bits() {
        let too_big = Params::new().bind("i", (1_u128 << 64) + 1);
        let err = bind_params(&too_big).expect_err("out of range");
        assert_eq!(err.kind(), ErrorKind::Data);
        assert!(err.message().contains("'i'"));

        let too_small = Params::new().bind("i", i128::from(i64::MIN) - 1);
        assert_eq!(bind_params(&too_small).map_err(|e| e.kind()), Err(ErrorKind::Data));

        let edge = Params::new().bind("i", i128::from(i64::MIN));
        assert!(bind_params(&edge).is_ok());
    }

    #[test]
    fn unmappable_values_name_the_parameter() {
        let params = Params::new().bind("gap", TimeDelta::seconds(5));
        let err = bind_params(&params).expect_err("interval");
        assert_eq!(err.kind(), ErrorKind::Interface);
        assert!(err.message().contains("'gap'"));
    }

    #[test]
    fn naive_datetimes_bind_as_utc_rounded() -> Result<(), DbApiError> {
        let naive = Datetime::new(2016, 2, 28, 23, 59, 59, 999_500, None)?;
        let wire = bind_value("d", &Value::Datetime(naive))?;
        let expected = Datetime::new(2016, 2, 29, 0, 0, 0, 0, FixedOffset::east_opt(0))?;
        assert_eq!(wire, expected.to_fixed().map(WireValue::Datetime).expect("in range"));
        Ok(())
    }

    #[test]
    fn datetime_without_an_instant_is_a_data_error() -> Result<(), DbApiError> {
        let first_year = chrono::NaiveDate::MIN.year();
        let edge = Datetime::new(first_year, 1, 1, 0, 0, 0, 0, FixedOffset::east_opt(3600))?;
        let err = bind_value("when", &Value::Datetime(edge)).expect_err("no instant");
        assert_eq!(err.kind(), ErrorKind::Data);
        assert!(err.message().contains("'when'"));
        Ok(())
    }

    #[test]
    fn aware_datetimes_keep_their_offset() -> Result<(), DbApiError> {
        let tz = FixedOffset::west_opt(5 * 3600);
        let dt = Datetime::new(2009, 2, 13, 18, 31, 30, 234_000, tz)?;
        match bind_value("d", &Value::Datetime(dt))? {
            WireValue::Datetime(fixed) => {
                assert_eq!(fixed.offset().local_minus_utc(), -5 * 3600);
                assert_eq!(Datetime::from_aware(&fixed), dt);
            }
            other => panic!("unexpected {other:?}"),
        }
        Ok(())
    }

    #[test]
    fn params_macro_matches_builder() {
        let built = crate::params! { "k" => 3, "v" => None::<i64> };
        assert_eq!(built.len(), 2);
        assert_eq!(built.get("k"), Some(&Value::Int(3)));
        assert_eq!(built.get("v"), Some(&Value::Null));
        assert!(crate::params! {}.is_empty());
    }
}
