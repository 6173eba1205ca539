use std::fmt;

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};

use crate::error::{Error, Result};
use crate::types::{SqlTimestampStruct, SQLSMALLINT};

/// A dynamically typed scalar exchanged with the backend.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
    /// Calendar timestamp, no zone attached.
    Timestamp(NaiveDateTime),
    /// A column type outside the closed set, as raw bytes.
    Other {
        type_code: SQLSMALLINT,
        bytes: Vec<u8>,
    },
}

impl Value {
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(value) => Some(*value),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(value) => Some(*value),
            _ => None,
        }
    }

    /// Floats, and integers widened to `f64`.
    #[must_use]
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(value) => Some(*value),
            Value::Int(value) => Some(*value as f64),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(value) => Some(value),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(value) => Some(value),
            Value::Other { bytes, .. } => Some(bytes),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_timestamp(&self) -> Option<&NaiveDateTime> {
        match self {
            Value::Timestamp(value) => Some(value),
            _ => None,
        }
    }

    /// Short name of the variant, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Text(_) => "text",
            Value::Bytes(_) => "bytes",
            Value::Timestamp(_) => "timestamp",
            Value::Other { .. } => "other",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("NULL"),
            Value::Bool(value) => write!(f, "{value}"),
            Value::Int(value) => write!(f, "{value}"),
            Value::Float(value) => write!(f, "{value}"),
            Value::Text(value) => f.write_str(value),
            Value::Bytes(bytes) | Value::Other { bytes, .. } => {
                for byte in bytes {
                    write!(f, "{byte:02X}")?;
                }
                Ok(())
            }
            Value::Timestamp(value) => write!(f, "{}", value.format("%Y-%m-%d %H:%M:%S%.f")),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(i64::from(value))
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_owned())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<Vec<u8>> for Value {
    fn from(value: Vec<u8>) -> Self {
        Value::Bytes(value)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(value: NaiveDateTime) -> Self {
        Value::Timestamp(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

pub(crate) fn timestamp_from_struct(ts: &SqlTimestampStruct) -> Result<NaiveDateTime> {
    NaiveDate::from_ymd_opt(i32::from(ts.year), u32::from(ts.month), u32::from(ts.day))
        .and_then(|date| {
            date.and_hms_nano_opt(
                u32::from(ts.hour),
                u32::from(ts.minute),
                u32::from(ts.second),
                ts.fraction,
            )
        })
        .ok_or_else(|| {
            Error::Conversion(format!(
                "invalid timestamp {:04}-{:02}-{:02} {:02}:{:02}:{:02}.{:09}",
                ts.year, ts.month, ts.day, ts.hour, ts.minute, ts.second, ts.fraction
            ))
        })
}

pub(crate) fn struct_from_timestamp(value: &NaiveDateTime) -> Result<SqlTimestampStruct> {
    let year = SQLSMALLINT::try_from(value.year())
        .map_err(|_| Error::Conversion(format!("year {} out of range", value.year())))?;
    Ok(SqlTimestampStruct {
        year,
        month: value.month() as u16,
        day: value.day() as u16,
        hour: value.hour() as u16,
        minute: value.minute() as u16,
        second: value.second() as u16,
        fraction: value.nanosecond(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accessors_match_variants() {
        assert!(Value::Null.is_null());
        assert_eq!(Value::from(42_i64).as_int(), Some(42));
        assert_eq!(Value::from(42_i32).as_float(), Some(42.0));
        assert_eq!(Value::from("abc").as_text(), Some("abc"));
        assert_eq!(Value::from(true).as_bool(), Some(true));
        assert_eq!(Value::from(Option::<i64>::None), Value::Null);
        assert_eq!(Value::Text("1".into()).as_int(), None);
    }

    #[test]
    fn timestamp_struct_conversion() {
        let ts = NaiveDate::from_ymd_opt(2024, 2, 29)
            .unwrap()
            .and_hms_micro_opt(23, 59, 58, 123_456)
            .unwrap();
        let raw = struct_from_timestamp(&ts).unwrap();
        assert_eq!(raw.year, 2024);
        assert_eq!(raw.fraction, 123_456_000);
        assert_eq!(timestamp_from_struct(&raw).unwrap(), ts);
    }

    #[test]
    fn invalid_timestamp_is_conversion_error() {
        let raw = SqlTimestampStruct {
            year: 2023,
            month: 2,
            day: 30,
            ..Default::default()
        };
        assert!(matches!(
            timestamp_from_struct(&raw),
            Err(Error::Conversion(_))
        ));
    }

    #[test]
    fn bytes_display_as_hex() {
        assert_eq!(Value::Bytes(vec![0xde, 0xad, 0x01]).to_string(), "DEAD01");
    }
}
