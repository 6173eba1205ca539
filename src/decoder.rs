//! Column metadata and the per-type-family `SQLGetData` strategies.

use std::mem::size_of;
use std::ptr;

use widestring::U16Str;

use crate::api::NativeApi;
use crate::diagnostics;
use crate::error::{Error, Result};
use crate::handle::HandleKind;
use crate::types::*;
use crate::value::{self, Value};
use crate::wide;

/// Extra UTF-16 units allocated past a character column's declared length.
const TEXT_HEADROOM: usize = 8;
/// Declared lengths above this are treated as unbounded and read in chunks.
const MAX_PREALLOCATED_UNITS: usize = 64 * 1024;
const CHUNK_UNITS: usize = 4096;
const CHUNK_BYTES: usize = 8192;

/// Decode strategy, chosen from a column's concise SQL type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeFamily {
    Bit,
    Integer,
    BigInt,
    Float,
    ExactNumeric,
    Character,
    DateTime,
    Binary,
    Other,
}

impl TypeFamily {
    pub fn of(sql_type: SQLSMALLINT) -> Self {
        match sql_type {
            SQL_BIT => TypeFamily::Bit,
            SQL_TINYINT | SQL_SMALLINT | SQL_INTEGER => TypeFamily::Integer,
            SQL_BIGINT => TypeFamily::BigInt,
            SQL_FLOAT | SQL_REAL | SQL_DOUBLE => TypeFamily::Float,
            SQL_NUMERIC | SQL_DECIMAL => TypeFamily::ExactNumeric,
            SQL_CHAR | SQL_VARCHAR | SQL_LONGVARCHAR | SQL_WCHAR | SQL_WVARCHAR
            | SQL_WLONGVARCHAR => TypeFamily::Character,
            SQL_TYPE_TIMESTAMP | SQL_TYPE_DATE | SQL_TYPE_TIME | SQL_DATETIME => {
                TypeFamily::DateTime
            }
            SQL_BINARY | SQL_VARBINARY | SQL_LONGVARBINARY => TypeFamily::Binary,
            _ => TypeFamily::Other,
        }
    }
}

/// What the decoder needs to know about a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ColumnType {
    pub sql_type: SQLSMALLINT,
    pub length: SQLLEN,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Nullability {
    NoNulls,
    Nullable,
    Unknown,
}

impl Nullability {
    fn from_raw(nullable: SQLSMALLINT) -> Self {
        match nullable {
            SQL_NO_NULLS => Nullability::NoNulls,
            SQL_NULLABLE => Nullability::Nullable,
            _ => Nullability::Unknown,
        }
    }
}

/// Column metadata from `SQLDescribeColW`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    pub sql_type: SQLSMALLINT,
    pub size: SQLULEN,
    pub decimal_digits: SQLSMALLINT,
    pub nullable: Nullability,
}

impl Field {
    pub fn family(&self) -> TypeFamily {
        TypeFamily::of(self.sql_type)
    }
}

pub(crate) fn describe_column(
    api: &dyn NativeApi,
    stmt: SQLHSTMT,
    column: SQLUSMALLINT,
) -> Result<Field> {
    let mut name: Vec<SQLWCHAR> = vec![0; 128];
    loop {
        let mut name_length: SQLSMALLINT = 0;
        let mut sql_type: SQLSMALLINT = 0;
        let mut size: SQLULEN = 0;
        let mut decimal_digits: SQLSMALLINT = 0;
        let mut nullable: SQLSMALLINT = SQL_NULLABLE_UNKNOWN;
        let buffer_length = SQLSMALLINT::try_from(name.len()).unwrap_or(SQLSMALLINT::MAX);
        let ret = unsafe {
            api.describe_col(
                stmt,
                column,
                name.as_mut_ptr(),
                buffer_length,
                &mut name_length,
                &mut sql_type,
                &mut size,
                &mut decimal_digits,
                &mut nullable,
            )
        };
        check(api, stmt, ret, "SQLDescribeColW")?;

        // Name truncated: retry with room for it.
        let needed = name_length.max(0) as usize;
        if needed >= name.len() && name.len() < SQLSMALLINT::MAX as usize {
            name.resize((needed + 1).min(SQLSMALLINT::MAX as usize), 0);
            continue;
        }

        return Ok(Field {
            name: wide::decode(&name[..needed.min(name.len())]),
            sql_type,
            size,
            decimal_digits,
            nullable: Nullability::from_raw(nullable),
        });
    }
}

pub(crate) fn column_type(
    api: &dyn NativeApi,
    stmt: SQLHSTMT,
    column: SQLUSMALLINT,
) -> Result<ColumnType> {
    let sql_type = numeric_attribute(api, stmt, column, SQL_DESC_CONCISE_TYPE)?;
    let length = numeric_attribute(api, stmt, column, SQL_DESC_LENGTH)?;
    Ok(ColumnType {
        sql_type: SQLSMALLINT::try_from(sql_type).unwrap_or(SQL_UNKNOWN_TYPE),
        length,
    })
}

fn numeric_attribute(
    api: &dyn NativeApi,
    stmt: SQLHSTMT,
    column: SQLUSMALLINT,
    field: SQLUSMALLINT,
) -> Result<SQLLEN> {
    let mut value: SQLLEN = 0;
    let ret = unsafe {
        api.col_attribute(
            stmt,
            column,
            field,
            ptr::null_mut(),
            0,
            ptr::null_mut(),
            &mut value,
        )
    };
    check(api, stmt, ret, "SQLColAttributeW")?;
    Ok(value)
}

/// Reads the current row's value of 1-based `column`.
pub(crate) fn decode(
    api: &dyn NativeApi,
    stmt: SQLHSTMT,
    column: SQLUSMALLINT,
    ty: ColumnType,
) -> Result<Value> {
    let value = match TypeFamily::of(ty.sql_type) {
        TypeFamily::Bit => {
            fetch_fixed::<u8>(api, stmt, column, SQL_C_BIT)?.map(|bit| Value::Bool(bit != 0))
        }
        TypeFamily::Integer => {
            fetch_fixed::<i32>(api, stmt, column, SQL_C_LONG)?.map(|v| Value::Int(i64::from(v)))
        }
        TypeFamily::BigInt => fetch_fixed::<i64>(api, stmt, column, SQL_C_SBIGINT)?.map(Value::Int),
        TypeFamily::Float => fetch_fixed::<f64>(api, stmt, column, SQL_C_DOUBLE)?.map(Value::Float),
        TypeFamily::ExactNumeric => fetch_numeric(api, stmt, column)?,
        TypeFamily::Character => fetch_text(api, stmt, column, ty.length)?,
        TypeFamily::DateTime => {
            match fetch_fixed::<SqlTimestampStruct>(api, stmt, column, SQL_C_TYPE_TIMESTAMP)? {
                Some(raw) => Some(Value::Timestamp(value::timestamp_from_struct(&raw)?)),
                None => None,
            }
        }
        TypeFamily::Binary => fetch_binary(api, stmt, column)?.map(Value::Bytes),
        TypeFamily::Other => fetch_raw(api, stmt, column, ty.length)?.map(|bytes| Value::Other {
            type_code: ty.sql_type,
            bytes,
        }),
    };
    Ok(value.unwrap_or(Value::Null))
}

fn check(api: &dyn NativeApi, stmt: SQLHSTMT, ret: SQLRETURN, function: &'static str) -> Result<()> {
    diagnostics::check(api, HandleKind::Statement, stmt, ret, function)
}

/// `SQL_NO_DATA` as an error: the column has nothing left to read.
fn no_data() -> Error {
    Error::Native {
        function: "SQLGetData",
        diagnostics: Default::default(),
    }
}

unsafe fn get_data(
    api: &dyn NativeApi,
    stmt: SQLHSTMT,
    column: SQLUSMALLINT,
    c_type: SQLSMALLINT,
    target: SQLPOINTER,
    buffer_length: usize,
    indicator: &mut SQLLEN,
) -> SQLRETURN {
    api.get_data(
        stmt,
        column,
        c_type,
        target,
        buffer_length as SQLLEN,
        indicator,
    )
}

/// Fixed-size fetch; `None` for null.
fn fetch_fixed<T: Default + Copy>(
    api: &dyn NativeApi,
    stmt: SQLHSTMT,
    column: SQLUSMALLINT,
    c_type: SQLSMALLINT,
) -> Result<Option<T>> {
    let mut value = T::default();
    let mut indicator: SQLLEN = 0;
    let ret = unsafe {
        get_data(
            api,
            stmt,
            column,
            c_type,
            &mut value as *mut T as SQLPOINTER,
            size_of::<T>(),
            &mut indicator,
        )
    };
    if ret == SQL_NO_DATA {
        return Err(no_data());
    }
    check(api, stmt, ret, "SQLGetData")?;
    if indicator == SQL_NULL_DATA {
        return Ok(None);
    }
    Ok(Some(value))
}

/// The raw `SQL_NUMERIC_STRUCT`, cut to the reported length.
fn fetch_numeric(api: &dyn NativeApi, stmt: SQLHSTMT, column: SQLUSMALLINT) -> Result<Option<Value>> {
    let mut raw = [0u8; SQL_NUMERIC_STRUCT_LEN];
    let mut indicator: SQLLEN = 0;
    let ret = unsafe {
        get_data(
            api,
            stmt,
            column,
            SQL_C_NUMERIC,
            raw.as_mut_ptr() as SQLPOINTER,
            raw.len(),
            &mut indicator,
        )
    };
    if ret == SQL_NO_DATA {
        return Err(no_data());
    }
    check(api, stmt, ret, "SQLGetData")?;
    if indicator == SQL_NULL_DATA {
        return Ok(None);
    }
    let len = if indicator > 0 {
        (indicator as usize).min(raw.len())
    } else {
        raw.len()
    };
    Ok(Some(Value::Bytes(raw[..len].to_vec())))
}

fn fetch_text(
    api: &dyn NativeApi,
    stmt: SQLHSTMT,
    column: SQLUSMALLINT,
    declared: SQLLEN,
) -> Result<Option<Value>> {
    let units = match usize::try_from(declared) {
        Ok(len) if len > 0 && len <= MAX_PREALLOCATED_UNITS => len + TEXT_HEADROOM,
        _ => CHUNK_UNITS,
    };
    let mut buffer: Vec<SQLWCHAR> = vec![0; units];
    let mut text: Vec<SQLWCHAR> = Vec::new();
    let mut first = true;

    loop {
        let mut indicator: SQLLEN = 0;
        let ret = unsafe {
            get_data(
                api,
                stmt,
                column,
                SQL_C_WCHAR,
                buffer.as_mut_ptr() as SQLPOINTER,
                buffer.len() * size_of::<SQLWCHAR>(),
                &mut indicator,
            )
        };
        if ret == SQL_NO_DATA {
            if first {
                return Err(no_data());
            }
            break;
        }
        check(api, stmt, ret, "SQLGetData")?;
        if indicator == SQL_NULL_DATA {
            return Ok(None);
        }

        // One unit is always spent on the terminator.
        let capacity = buffer.len() - 1;
        let complete = indicator != SQL_NO_TOTAL
            && (indicator.max(0) as usize) / size_of::<SQLWCHAR>() <= capacity;
        let received = if complete {
            indicator.max(0) as usize / size_of::<SQLWCHAR>()
        } else {
            capacity
        };
        text.extend_from_slice(&buffer[..received]);

        if complete || ret == SQL_SUCCESS {
            break;
        }
        first = false;
    }

    Ok(Some(Value::Text(U16Str::from_slice(&text).to_string_lossy())))
}

/// Probe for the length, then fetch exactly that many bytes.
fn fetch_binary(
    api: &dyn NativeApi,
    stmt: SQLHSTMT,
    column: SQLUSMALLINT,
) -> Result<Option<Vec<u8>>> {
    let mut probe = [0u8; 1];
    let mut indicator: SQLLEN = 0;
    let ret = unsafe {
        get_data(
            api,
            stmt,
            column,
            SQL_C_BINARY,
            probe.as_mut_ptr() as SQLPOINTER,
            0,
            &mut indicator,
        )
    };
    if ret == SQL_NO_DATA {
        return Err(no_data());
    }
    check(api, stmt, ret, "SQLGetData")?;

    match indicator {
        SQL_NULL_DATA => Ok(None),
        SQL_NO_TOTAL => fetch_chunked(api, stmt, column).map(Some),
        0 => Ok(Some(Vec::new())),
        len => {
            let mut bytes = vec![0u8; len.max(0) as usize];
            let ret = unsafe {
                get_data(
                    api,
                    stmt,
                    column,
                    SQL_C_BINARY,
                    bytes.as_mut_ptr() as SQLPOINTER,
                    bytes.len(),
                    &mut indicator,
                )
            };
            check(api, stmt, ret, "SQLGetData")?;
            if indicator >= 0 && (indicator as usize) < bytes.len() {
                bytes.truncate(indicator as usize);
            }
            Ok(Some(bytes))
        }
    }
}

fn fetch_chunked(api: &dyn NativeApi, stmt: SQLHSTMT, column: SQLUSMALLINT) -> Result<Vec<u8>> {
    let mut chunk = vec![0u8; CHUNK_BYTES];
    let mut bytes = Vec::new();
    loop {
        let mut indicator: SQLLEN = 0;
        let ret = unsafe {
            get_data(
                api,
                stmt,
                column,
                SQL_C_BINARY,
                chunk.as_mut_ptr() as SQLPOINTER,
                chunk.len(),
                &mut indicator,
            )
        };
        if ret == SQL_NO_DATA {
            break;
        }
        check(api, stmt, ret, "SQLGetData")?;
        let complete = indicator != SQL_NO_TOTAL && (indicator.max(0) as usize) <= chunk.len();
        let received = if complete {
            indicator.max(0) as usize
        } else {
            chunk.len()
        };
        bytes.extend_from_slice(&chunk[..received]);
        if complete || ret == SQL_SUCCESS {
            break;
        }
    }
    Ok(bytes)
}

/// Best effort for types the decoder does not know.
fn fetch_raw(
    api: &dyn NativeApi,
    stmt: SQLHSTMT,
    column: SQLUSMALLINT,
    declared: SQLLEN,
) -> Result<Option<Vec<u8>>> {
    let len = match usize::try_from(declared) {
        Ok(len) if len > 0 && len <= CHUNK_BYTES => len,
        _ => return fetch_binary(api, stmt, column),
    };
    let mut bytes = vec![0u8; len];
    let mut indicator: SQLLEN = 0;
    let ret = unsafe {
        get_data(
            api,
            stmt,
            column,
            SQL_C_BINARY,
            bytes.as_mut_ptr() as SQLPOINTER,
            bytes.len(),
            &mut indicator,
        )
    };
    if ret == SQL_NO_DATA {
        return Err(no_data());
    }
    check(api, stmt, ret, "SQLGetData")?;
    if indicator == SQL_NULL_DATA {
        return Ok(None);
    }
    if indicator >= 0 && (indicator as usize) < bytes.len() {
        bytes.truncate(indicator as usize);
    }
    Ok(Some(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn families() {
        assert_eq!(TypeFamily::of(SQL_BIT), TypeFamily::Bit);
        assert_eq!(TypeFamily::of(SQL_TINYINT), TypeFamily::Integer);
        assert_eq!(TypeFamily::of(SQL_SMALLINT), TypeFamily::Integer);
        assert_eq!(TypeFamily::of(SQL_BIGINT), TypeFamily::BigInt);
        assert_eq!(TypeFamily::of(SQL_REAL), TypeFamily::Float);
        assert_eq!(TypeFamily::of(SQL_DECIMAL), TypeFamily::ExactNumeric);
        assert_eq!(TypeFamily::of(SQL_WLONGVARCHAR), TypeFamily::Character);
        assert_eq!(TypeFamily::of(SQL_CHAR), TypeFamily::Character);
        assert_eq!(TypeFamily::of(SQL_TYPE_DATE), TypeFamily::DateTime);
        assert_eq!(TypeFamily::of(SQL_DATETIME), TypeFamily::DateTime);
        assert_eq!(TypeFamily::of(SQL_LONGVARBINARY), TypeFamily::Binary);
        assert_eq!(TypeFamily::of(SQL_GUID), TypeFamily::Other);
        assert_eq!(TypeFamily::of(SQL_UNKNOWN_TYPE), TypeFamily::Other);
    }

    #[test]
    fn nullability_from_raw() {
        assert_eq!(Nullability::from_raw(SQL_NO_NULLS), Nullability::NoNulls);
        assert_eq!(Nullability::from_raw(SQL_NULLABLE), Nullability::Nullable);
        assert_eq!(Nullability::from_raw(SQL_NULLABLE_UNKNOWN), Nullability::Unknown);
    }
}
