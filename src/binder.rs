//! Parameter binding: from a [`Value`] to an owned buffer plus the
//! `SQLBindParameter` descriptor that points into it.

use std::mem::size_of;
use std::ptr;

use crate::api::NativeApi;
use crate::error::{Error, Result};
use crate::types::*;
use crate::value::{self, Value};

/// Arguments to `SQLBindParameter`, minus the buffer pointers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BindDescriptor {
    pub value_type: SQLSMALLINT,
    pub parameter_type: SQLSMALLINT,
    pub column_size: SQLULEN,
    pub decimal_digits: SQLSMALLINT,
    pub buffer_length: SQLLEN,
    pub indicator: SQLLEN,
}

#[derive(Debug)]
enum Storage {
    None,
    Bit(u8),
    Long(i32),
    BigInt(i64),
    Double(f64),
    Bytes(Vec<u8>),
    Timestamp(SqlTimestampStruct),
}

/// The memory one bound parameter points at.
///
/// The driver reads the buffer and the indicator at execute time, so a
/// `ParamBuffer` must not move or drop between binding and the next parameter
/// reset (or statement free).
#[derive(Debug)]
pub struct ParamBuffer {
    storage: Storage,
    descriptor: BindDescriptor,
}

impl ParamBuffer {
    /// Builds the buffer for 1-based parameter `index`.
    pub fn new(index: u16, value: &Value) -> Result<Self> {
        let (storage, descriptor) = match value {
            Value::Null => (
                Storage::None,
                BindDescriptor {
                    value_type: SQL_C_DEFAULT,
                    parameter_type: SQL_VARCHAR,
                    column_size: 1,
                    decimal_digits: 0,
                    buffer_length: 0,
                    indicator: SQL_NULL_DATA,
                },
            ),
            Value::Bool(value) => (
                Storage::Bit(u8::from(*value)),
                fixed(SQL_C_BIT, SQL_BIT, 1, size_of::<u8>()),
            ),
            Value::Int(value) => match i32::try_from(*value) {
                Ok(narrow) => (
                    Storage::Long(narrow),
                    fixed(SQL_C_LONG, SQL_INTEGER, 10, size_of::<i32>()),
                ),
                Err(_) => (
                    Storage::BigInt(*value),
                    fixed(SQL_C_SBIGINT, SQL_BIGINT, 19, size_of::<i64>()),
                ),
            },
            Value::Float(value) => (
                Storage::Double(*value),
                fixed(SQL_C_DOUBLE, SQL_DOUBLE, 15, size_of::<f64>()),
            ),
            Value::Text(text) => {
                let len = text.len();
                let mut bytes = Vec::with_capacity(len + 1);
                bytes.extend_from_slice(text.as_bytes());
                bytes.push(0);
                (
                    Storage::Bytes(bytes),
                    BindDescriptor {
                        value_type: SQL_C_CHAR,
                        parameter_type: SQL_VARCHAR,
                        column_size: len.max(1),
                        decimal_digits: 0,
                        buffer_length: (len + 1) as SQLLEN,
                        indicator: len as SQLLEN,
                    },
                )
            }
            Value::Bytes(bytes) => {
                let len = bytes.len();
                (
                    Storage::Bytes(bytes.clone()),
                    BindDescriptor {
                        value_type: SQL_C_BINARY,
                        parameter_type: SQL_VARBINARY,
                        column_size: len.max(1),
                        decimal_digits: 0,
                        buffer_length: len as SQLLEN,
                        indicator: len as SQLLEN,
                    },
                )
            }
            Value::Timestamp(timestamp) => {
                let raw = value::struct_from_timestamp(timestamp)?;
                let digits = fraction_digits(raw.fraction);
                let column_size = if digits == 0 { 19 } else { 20 + digits as SQLULEN };
                (
                    Storage::Timestamp(raw),
                    BindDescriptor {
                        value_type: SQL_C_TYPE_TIMESTAMP,
                        parameter_type: SQL_TYPE_TIMESTAMP,
                        column_size,
                        decimal_digits: digits,
                        buffer_length: size_of::<SqlTimestampStruct>() as SQLLEN,
                        indicator: size_of::<SqlTimestampStruct>() as SQLLEN,
                    },
                )
            }
            Value::Other { .. } => {
                return Err(Error::UnsupportedValue {
                    index,
                    kind: value.kind(),
                })
            }
        };
        Ok(Self {
            storage,
            descriptor,
        })
    }

    pub fn descriptor(&self) -> &BindDescriptor {
        &self.descriptor
    }

    pub fn is_null(&self) -> bool {
        self.descriptor.indicator == SQL_NULL_DATA
    }

    /// Types a null parameter; `SQL_UNKNOWN_TYPE` keeps the varchar default.
    pub fn set_null_type(&mut self, sql_type: SQLSMALLINT) {
        if self.is_null() && sql_type != SQL_UNKNOWN_TYPE {
            self.descriptor.parameter_type = sql_type;
        }
    }

    fn value_ptr(&mut self) -> SQLPOINTER {
        match &mut self.storage {
            Storage::None => ptr::null_mut(),
            Storage::Bit(value) => value as *mut u8 as SQLPOINTER,
            Storage::Long(value) => value as *mut i32 as SQLPOINTER,
            Storage::BigInt(value) => value as *mut i64 as SQLPOINTER,
            Storage::Double(value) => value as *mut f64 as SQLPOINTER,
            Storage::Bytes(bytes) => bytes.as_mut_ptr() as SQLPOINTER,
            Storage::Timestamp(value) => value as *mut SqlTimestampStruct as SQLPOINTER,
        }
    }

    /// Issues `SQLBindParameter` for this buffer.
    ///
    /// # Safety
    ///
    /// `stmt` must be a live statement handle of `api`, and `self` must stay in
    /// place until the statement's parameters are reset or it is freed.
    pub(crate) unsafe fn bind(
        &mut self,
        api: &dyn NativeApi,
        stmt: SQLHSTMT,
        index: SQLUSMALLINT,
    ) -> SQLRETURN {
        let value = self.value_ptr();
        let descriptor = self.descriptor;
        api.bind_parameter(
            stmt,
            index,
            SQL_PARAM_INPUT,
            descriptor.value_type,
            descriptor.parameter_type,
            descriptor.column_size,
            descriptor.decimal_digits,
            value,
            descriptor.buffer_length,
            &mut self.descriptor.indicator,
        )
    }
}

fn fixed(
    value_type: SQLSMALLINT,
    parameter_type: SQLSMALLINT,
    column_size: SQLULEN,
    len: usize,
) -> BindDescriptor {
    BindDescriptor {
        value_type,
        parameter_type,
        column_size,
        decimal_digits: 0,
        buffer_length: len as SQLLEN,
        indicator: 0,
    }
}

/// Fractional-second digits needed for `nanos`: 0, 3, 6 or 9.
fn fraction_digits(nanos: u32) -> SQLSMALLINT {
    if nanos == 0 {
        0
    } else if nanos % 1_000_000 == 0 {
        3
    } else if nanos % 1_000 == 0 {
        6
    } else {
        9
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn null_defaults_to_varchar() {
        let mut buffer = ParamBuffer::new(1, &Value::Null).unwrap();
        assert!(buffer.is_null());
        assert_eq!(buffer.descriptor().value_type, SQL_C_DEFAULT);
        assert_eq!(buffer.descriptor().parameter_type, SQL_VARCHAR);
        assert_eq!(buffer.descriptor().column_size, 1);
        assert!(buffer.value_ptr().is_null());

        buffer.set_null_type(SQL_UNKNOWN_TYPE);
        assert_eq!(buffer.descriptor().parameter_type, SQL_VARCHAR);
        buffer.set_null_type(SQL_INTEGER);
        assert_eq!(buffer.descriptor().parameter_type, SQL_INTEGER);
    }

    #[test]
    fn null_type_is_ignored_for_values() {
        let mut buffer = ParamBuffer::new(1, &Value::Int(1)).unwrap();
        buffer.set_null_type(SQL_VARCHAR);
        assert_eq!(buffer.descriptor().parameter_type, SQL_INTEGER);
    }

    #[test]
    fn integer_width_follows_range() {
        let small = ParamBuffer::new(1, &Value::Int(42)).unwrap();
        assert_eq!(small.descriptor().value_type, SQL_C_LONG);
        assert_eq!(small.descriptor().parameter_type, SQL_INTEGER);
        assert_eq!(small.descriptor().buffer_length, 4);

        let large = ParamBuffer::new(1, &Value::Int(i64::from(i32::MAX) + 1)).unwrap();
        assert_eq!(large.descriptor().value_type, SQL_C_SBIGINT);
        assert_eq!(large.descriptor().parameter_type, SQL_BIGINT);
        assert_eq!(large.descriptor().buffer_length, 8);
        assert_eq!(large.descriptor().column_size, 19);
    }

    #[test]
    fn bool_and_float() {
        let bit = ParamBuffer::new(1, &Value::Bool(true)).unwrap();
        assert_eq!(bit.descriptor().value_type, SQL_C_BIT);
        assert_eq!(bit.descriptor().column_size, 1);
        assert!(matches!(bit.storage, Storage::Bit(1)));

        let double = ParamBuffer::new(1, &Value::Float(1.5)).unwrap();
        assert_eq!(double.descriptor().value_type, SQL_C_DOUBLE);
        assert_eq!(double.descriptor().column_size, 15);
        assert_eq!(double.descriptor().buffer_length, 8);
    }

    #[test]
    fn text_sizes_come_from_encoded_bytes() {
        let buffer = ParamBuffer::new(1, &Value::from("héllo")).unwrap();
        let descriptor = buffer.descriptor();
        assert_eq!(descriptor.value_type, SQL_C_CHAR);
        assert_eq!(descriptor.parameter_type, SQL_VARCHAR);
        assert_eq!(descriptor.column_size, 6);
        assert_eq!(descriptor.indicator, 6);
        assert_eq!(descriptor.buffer_length, 7);

        let empty = ParamBuffer::new(1, &Value::from("")).unwrap();
        assert_eq!(empty.descriptor().column_size, 1);
        assert_eq!(empty.descriptor().indicator, 0);
    }

    #[test]
    fn timestamp_precision_tracks_fraction() {
        let at = |micros| {
            NaiveDate::from_ymd_opt(2021, 6, 1)
                .unwrap()
                .and_hms_micro_opt(12, 0, 0, micros)
                .unwrap()
        };
        let whole = ParamBuffer::new(1, &Value::Timestamp(at(0))).unwrap();
        assert_eq!(whole.descriptor().decimal_digits, 0);
        assert_eq!(whole.descriptor().column_size, 19);

        let millis = ParamBuffer::new(1, &Value::Timestamp(at(250_000))).unwrap();
        assert_eq!(millis.descriptor().decimal_digits, 3);
        assert_eq!(millis.descriptor().column_size, 23);

        let micros = ParamBuffer::new(1, &Value::Timestamp(at(250_001))).unwrap();
        assert_eq!(micros.descriptor().decimal_digits, 6);
        assert_eq!(micros.descriptor().column_size, 26);
    }

    #[test]
    fn other_is_unsupported() {
        let err = ParamBuffer::new(
            3,
            &Value::Other {
                type_code: SQL_GUID,
                bytes: vec![0; 16],
            },
        )
        .unwrap_err();
        assert!(matches!(
            err,
            Error::UnsupportedValue {
                index: 3,
                kind: "other"
            }
        ));
    }
}
