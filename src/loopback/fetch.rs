use std::mem::size_of;
use std::ptr;

use chrono::NaiveDateTime;

use super::attr::write_wide;
use super::handle::{record, StmtHandle};
use super::script::{Column, Outcome};
use crate::diagnostics::DiagnosticRecord;
use crate::types::*;
use crate::value::{self, Value};

pub(crate) fn fetch(stmt: &mut StmtHandle, cancelled: bool) -> SQLRETURN {
    if cancelled {
        stmt.close_cursor();
        return stmt.error("HY008", "Operation canceled");
    }
    let Some(Outcome::Rows(rows)) = &stmt.current else {
        return stmt.error("24000", "Invalid cursor state");
    };
    let (row_count, column_count) = (rows.rows.len(), rows.columns.len());

    stmt.row_index += 1;
    if stmt.row_index as usize >= row_count {
        stmt.row_index = row_count as isize;
        return SQL_NO_DATA;
    }
    stmt.read_offsets = vec![None; column_count];
    SQL_SUCCESS
}

pub(crate) fn num_result_cols(stmt: &StmtHandle) -> SQLSMALLINT {
    match &stmt.current {
        Some(Outcome::Rows(rows)) => rows.columns.len() as SQLSMALLINT,
        _ => 0,
    }
}

fn current_column(stmt: &StmtHandle, col_number: SQLUSMALLINT) -> Option<&Column> {
    match &stmt.current {
        Some(Outcome::Rows(rows)) => rows.columns.get((col_number as usize).wrapping_sub(1)),
        _ => None,
    }
}

#[allow(clippy::too_many_arguments)]
pub(crate) unsafe fn describe_col(
    stmt: &mut StmtHandle,
    col_number: SQLUSMALLINT,
    col_name: *mut SQLWCHAR,
    buffer_length: SQLSMALLINT,
    name_length: *mut SQLSMALLINT,
    data_type: *mut SQLSMALLINT,
    column_size: *mut SQLULEN,
    decimal_digits: *mut SQLSMALLINT,
    nullable: *mut SQLSMALLINT,
) -> SQLRETURN {
    let Some(col) = current_column(stmt, col_number) else {
        return stmt.error("07009", "Invalid descriptor index");
    };

    // Copy column name
    let name: Vec<u16> = col.name.encode_utf16().collect();
    let mut truncated = false;
    if !col_name.is_null() && buffer_length > 0 {
        let copy_len = name.len().min(buffer_length as usize - 1);
        ptr::copy_nonoverlapping(name.as_ptr(), col_name, copy_len);
        *col_name.add(copy_len) = 0;
        truncated = copy_len < name.len();
    }
    if !name_length.is_null() {
        *name_length = name.len() as SQLSMALLINT;
    }
    if !data_type.is_null() {
        *data_type = col.sql_type;
    }
    if !column_size.is_null() {
        *column_size = col.size;
    }
    if !decimal_digits.is_null() {
        *decimal_digits = col.decimal_digits;
    }
    if !nullable.is_null() {
        *nullable = col.nullable;
    }

    if truncated {
        stmt.diagnostics
            .push(record("01004", "String data, right truncated"));
        return SQL_SUCCESS_WITH_INFO;
    }
    SQL_SUCCESS
}

pub(crate) unsafe fn col_attribute(
    stmt: &mut StmtHandle,
    col_number: SQLUSMALLINT,
    field_identifier: SQLUSMALLINT,
    char_attr: SQLPOINTER,
    buffer_length: SQLSMALLINT,
    string_length: *mut SQLSMALLINT,
    numeric_attr: *mut SQLLEN,
) -> SQLRETURN {
    let write_num = |v: SQLLEN| -> SQLRETURN {
        if !numeric_attr.is_null() {
            *numeric_attr = v;
        }
        SQL_SUCCESS
    };

    // For SQL_DESC_COUNT, col_number is ignored
    if field_identifier == SQL_DESC_COUNT {
        return write_num(num_result_cols(stmt) as SQLLEN);
    }

    let Some(col) = current_column(stmt, col_number) else {
        return stmt.error("07009", "Invalid descriptor index");
    };

    match field_identifier {
        SQL_DESC_NAME => write_wide(&col.name, char_attr, buffer_length, string_length),
        SQL_DESC_CONCISE_TYPE | SQL_DESC_TYPE => write_num(col.sql_type as SQLLEN),
        SQL_DESC_LENGTH | SQL_DESC_PRECISION => write_num(col.size as SQLLEN),
        SQL_DESC_OCTET_LENGTH => {
            let width = match col.sql_type {
                SQL_WCHAR | SQL_WVARCHAR | SQL_WLONGVARCHAR => 2,
                _ => 1,
            };
            write_num((col.size * width) as SQLLEN)
        }
        SQL_DESC_SCALE => write_num(col.decimal_digits as SQLLEN),
        SQL_DESC_NULLABLE => write_num(col.nullable as SQLLEN),
        _ => stmt.error("HY091", "Invalid descriptor field identifier"),
    }
}

/// A cell converted to the requested C type.
enum Converted {
    Bit(u8),
    Short(i16),
    Long(i32),
    BigInt(i64),
    Real(f32),
    Double(f64),
    Numeric(SqlNumericStruct),
    Timestamp(SqlTimestampStruct),
    Wide(Vec<u16>),
    Narrow(Vec<u8>),
    Binary(Vec<u8>),
}

pub(crate) unsafe fn get_data(
    stmt: &mut StmtHandle,
    col: SQLUSMALLINT,
    target_type: SQLSMALLINT,
    target_value: SQLPOINTER,
    buffer_length: SQLLEN,
    str_len_or_ind: *mut SQLLEN,
) -> SQLRETURN {
    let Some(Outcome::Rows(rows)) = &stmt.current else {
        return stmt.error("24000", "Invalid cursor state");
    };
    if stmt.row_index < 0 || stmt.row_index as usize >= rows.rows.len() {
        stmt.diagnostics.push(record("24000", "Invalid cursor state"));
        return SQL_ERROR;
    }
    let col_idx = (col as usize).wrapping_sub(1); // 1-based to 0-based
    let Some(column) = rows.columns.get(col_idx) else {
        stmt.diagnostics.push(record("07009", "Invalid descriptor index"));
        return SQL_ERROR;
    };
    let cell = rows.rows[stmt.row_index as usize]
        .get(col_idx)
        .unwrap_or(&Value::Null);

    if cell.is_null() {
        if !str_len_or_ind.is_null() {
            *str_len_or_ind = SQL_NULL_DATA;
        }
        return SQL_SUCCESS;
    }

    let eff_type = if target_type == SQL_C_DEFAULT {
        default_c_type(column.sql_type)
    } else {
        target_type
    };

    let converted = match convert(cell, eff_type, column) {
        Ok(converted) => converted,
        Err(rec) => {
            stmt.diagnostics.push(rec);
            return SQL_ERROR;
        }
    };

    let offset = &mut stmt.read_offsets[col_idx];
    let ret = match converted {
        Converted::Bit(v) => write_fixed(v, target_value, str_len_or_ind),
        Converted::Short(v) => write_fixed(v, target_value, str_len_or_ind),
        Converted::Long(v) => write_fixed(v, target_value, str_len_or_ind),
        Converted::BigInt(v) => write_fixed(v, target_value, str_len_or_ind),
        Converted::Real(v) => write_fixed(v, target_value, str_len_or_ind),
        Converted::Double(v) => write_fixed(v, target_value, str_len_or_ind),
        Converted::Numeric(v) => write_fixed(v, target_value, str_len_or_ind),
        Converted::Timestamp(v) => write_fixed(v, target_value, str_len_or_ind),
        Converted::Wide(units) => {
            write_chunked(&units, offset, target_value, buffer_length, str_len_or_ind, true)
        }
        Converted::Narrow(bytes) => {
            write_chunked(&bytes, offset, target_value, buffer_length, str_len_or_ind, true)
        }
        Converted::Binary(bytes) => {
            write_chunked(&bytes, offset, target_value, buffer_length, str_len_or_ind, false)
        }
    };
    if ret == SQL_SUCCESS_WITH_INFO {
        stmt.diagnostics
            .push(record("01004", "String data, right truncated"));
    }
    ret
}

fn default_c_type(sql_type: SQLSMALLINT) -> SQLSMALLINT {
    match sql_type {
        SQL_INTEGER => SQL_C_LONG,
        SQL_SMALLINT | SQL_TINYINT => SQL_C_SHORT,
        SQL_BIGINT => SQL_C_SBIGINT,
        SQL_DOUBLE | SQL_FLOAT => SQL_C_DOUBLE,
        SQL_REAL => SQL_C_FLOAT,
        SQL_BIT => SQL_C_BIT,
        SQL_DECIMAL | SQL_NUMERIC => SQL_C_NUMERIC,
        SQL_TYPE_TIMESTAMP | SQL_TYPE_DATE | SQL_TYPE_TIME => SQL_C_TYPE_TIMESTAMP,
        SQL_BINARY | SQL_VARBINARY | SQL_LONGVARBINARY => SQL_C_BINARY,
        SQL_WCHAR | SQL_WVARCHAR | SQL_WLONGVARCHAR => SQL_C_WCHAR,
        _ => SQL_C_CHAR,
    }
}

fn out_of_range() -> DiagnosticRecord {
    record("22003", "Numeric value out of range")
}

fn invalid_cast() -> DiagnosticRecord {
    record("22018", "Invalid character value for cast specification")
}

fn restricted() -> DiagnosticRecord {
    record("07006", "Restricted data type attribute violation")
}

fn integer(value: &Value) -> Result<i64, DiagnosticRecord> {
    match value {
        Value::Int(v) => Ok(*v),
        Value::Bool(v) => Ok(i64::from(*v)),
        Value::Float(v) if v.is_finite() && *v >= i64::MIN as f64 && *v <= i64::MAX as f64 => {
            Ok(v.trunc() as i64)
        }
        Value::Float(_) => Err(out_of_range()),
        Value::Text(text) => text.trim().parse().map_err(|_| invalid_cast()),
        _ => Err(restricted()),
    }
}

fn double(value: &Value) -> Result<f64, DiagnosticRecord> {
    match value {
        Value::Float(v) => Ok(*v),
        Value::Int(v) => Ok(*v as f64),
        Value::Bool(v) => Ok(f64::from(u8::from(*v))),
        Value::Text(text) => text.trim().parse().map_err(|_| invalid_cast()),
        _ => Err(restricted()),
    }
}

/// Character form of a cell, as a driver would render it.
fn text(value: &Value) -> String {
    match value {
        Value::Bool(v) => if *v { "1" } else { "0" }.to_owned(),
        Value::Timestamp(ts) => ts.format("%Y-%m-%d %H:%M:%S%.f").to_string(),
        other => other.to_string(),
    }
}

fn convert(value: &Value, c_type: SQLSMALLINT, column: &Column) -> Result<Converted, DiagnosticRecord> {
    Ok(match c_type {
        SQL_C_BIT => match value {
            Value::Text(text) => match text.trim() {
                "0" => Converted::Bit(0),
                "1" => Converted::Bit(1),
                _ => return Err(invalid_cast()),
            },
            other => Converted::Bit(u8::from(integer(other)? != 0)),
        },
        SQL_C_SHORT => Converted::Short(i16::try_from(integer(value)?).map_err(|_| out_of_range())?),
        SQL_C_LONG | SQL_C_SLONG => {
            Converted::Long(i32::try_from(integer(value)?).map_err(|_| out_of_range())?)
        }
        SQL_C_SBIGINT => Converted::BigInt(integer(value)?),
        SQL_C_FLOAT => Converted::Real(double(value)? as f32),
        SQL_C_DOUBLE => Converted::Double(double(value)?),
        SQL_C_NUMERIC => Converted::Numeric(numeric(value, column)?),
        SQL_C_TYPE_TIMESTAMP => {
            let ts = match value {
                Value::Timestamp(ts) => *ts,
                Value::Text(text) => parse_timestamp(text).ok_or_else(invalid_cast)?,
                _ => return Err(restricted()),
            };
            Converted::Timestamp(
                value::struct_from_timestamp(&ts).map_err(|_| out_of_range())?,
            )
        }
        SQL_C_WCHAR => Converted::Wide(text(value).encode_utf16().collect()),
        SQL_C_CHAR => Converted::Narrow(text(value).into_bytes()),
        SQL_C_BINARY => match value {
            Value::Bytes(bytes) | Value::Other { bytes, .. } => Converted::Binary(bytes.clone()),
            Value::Text(text) => Converted::Binary(text.as_bytes().to_vec()),
            _ => return Err(restricted()),
        },
        _ => return Err(record("HY003", "Program type out of range")),
    })
}

fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f")
        .ok()
        .or_else(|| {
            chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

/// `SQL_NUMERIC_STRUCT` for integers, decimal text, or a raw struct.
fn numeric(value: &Value, column: &Column) -> Result<SqlNumericStruct, DiagnosticRecord> {
    let (negative, magnitude, scale) = match value {
        Value::Bytes(bytes) if bytes.len() == SQL_NUMERIC_STRUCT_LEN => {
            let mut raw = SqlNumericStruct::default();
            raw.precision = bytes[0];
            raw.scale = bytes[1] as i8;
            raw.sign = bytes[2];
            raw.val.copy_from_slice(&bytes[3..]);
            return Ok(raw);
        }
        Value::Int(v) => (*v < 0, u128::from(v.unsigned_abs()), 0),
        Value::Text(text) => parse_decimal(text.trim()).ok_or_else(invalid_cast)?,
        Value::Float(v) => {
            let digits = column.decimal_digits.max(0) as usize;
            parse_decimal(&format!("{v:.digits$}")).ok_or_else(out_of_range)?
        }
        _ => return Err(restricted()),
    };
    Ok(SqlNumericStruct {
        precision: column.size.min(38) as u8,
        scale,
        sign: u8::from(!negative),
        val: magnitude.to_le_bytes(),
    })
}

fn parse_decimal(s: &str) -> Option<(bool, u128, i8)> {
    let (negative, digits) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s.strip_prefix('+').unwrap_or(s)),
    };
    let (whole, fraction) = digits.split_once('.').unwrap_or((digits, ""));
    if whole.is_empty() && fraction.is_empty() {
        return None;
    }
    let mut magnitude: u128 = 0;
    for c in whole.chars().chain(fraction.chars()) {
        let digit = c.to_digit(10)?;
        magnitude = magnitude.checked_mul(10)?.checked_add(u128::from(digit))?;
    }
    let scale = i8::try_from(fraction.len()).ok()?;
    Some((negative, magnitude, scale))
}

unsafe fn write_fixed<T: Copy>(value: T, target: SQLPOINTER, ind: *mut SQLLEN) -> SQLRETURN {
    if !target.is_null() {
        ptr::write_unaligned(target as *mut T, value);
    }
    if !ind.is_null() {
        *ind = size_of::<T>() as SQLLEN;
    }
    SQL_SUCCESS
}

/// Copies the unread part of `data`, NUL-terminated for character data.
///
/// A zero-length buffer only reports the remaining length. Once everything
/// has been read, further calls return `SQL_NO_DATA`.
unsafe fn write_chunked<T: Copy + Default>(
    data: &[T],
    offset: &mut Option<usize>,
    target: SQLPOINTER,
    buffer_length: SQLLEN,
    ind: *mut SQLLEN,
    terminated: bool,
) -> SQLRETURN {
    let start = match *offset {
        Some(pos) if pos >= data.len() => return SQL_NO_DATA,
        Some(pos) => pos,
        None => 0,
    };
    let remaining = &data[start..];
    let unit = size_of::<T>();
    if !ind.is_null() {
        *ind = (remaining.len() * unit) as SQLLEN;
    }
    if target.is_null() || buffer_length <= 0 {
        return if remaining.is_empty() {
            SQL_SUCCESS
        } else {
            SQL_SUCCESS_WITH_INFO
        };
    }

    let capacity = buffer_length as usize / unit;
    let room = if terminated {
        capacity.saturating_sub(1)
    } else {
        capacity
    };
    let count = remaining.len().min(room);
    let dest = target as *mut T;
    ptr::copy_nonoverlapping(remaining.as_ptr(), dest, count);
    if terminated && capacity > 0 {
        *dest.add(count) = T::default();
    }
    *offset = Some(start + count);

    if count < remaining.len() {
        SQL_SUCCESS_WITH_INFO
    } else {
        SQL_SUCCESS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunked_reads_resume_and_finish() {
        let data: Vec<u16> = "abcdef".encode_utf16().collect();
        let mut offset = None;
        let mut buffer = [0u16; 4];
        let mut ind: SQLLEN = 0;

        let ret = unsafe {
            write_chunked(&data, &mut offset, buffer.as_mut_ptr() as SQLPOINTER, 8, &mut ind, true)
        };
        assert_eq!(ret, SQL_SUCCESS_WITH_INFO);
        assert_eq!(ind, 12);
        assert_eq!(&buffer[..3], &data[..3]);

        let ret = unsafe {
            write_chunked(&data, &mut offset, buffer.as_mut_ptr() as SQLPOINTER, 8, &mut ind, true)
        };
        assert_eq!(ret, SQL_SUCCESS);
        assert_eq!(ind, 6);
        assert_eq!(&buffer[..3], &data[3..]);

        let ret = unsafe {
            write_chunked(&data, &mut offset, buffer.as_mut_ptr() as SQLPOINTER, 8, &mut ind, true)
        };
        assert_eq!(ret, SQL_NO_DATA);
    }

    #[test]
    fn zero_length_probe_does_not_consume() {
        let data = [1u8, 2, 3];
        let mut offset = None;
        let mut ind: SQLLEN = 0;
        let ret = unsafe { write_chunked(&data, &mut offset, ptr::null_mut(), 0, &mut ind, false) };
        assert_eq!(ret, SQL_SUCCESS_WITH_INFO);
        assert_eq!(ind, 3);
        assert_eq!(offset, None);
    }

    #[test]
    fn decimal_text_to_numeric() {
        let column = Column::new("d", SQL_DECIMAL).size(10).decimal_digits(2);
        let raw = numeric(&Value::from("-12.34"), &column).unwrap();
        assert_eq!(raw.precision, 10);
        assert_eq!(raw.scale, 2);
        assert_eq!(raw.sign, 0);
        assert_eq!(u128::from_le_bytes(raw.val), 1234);
    }

    #[test]
    fn integer_conversions_check_range() {
        let column = Column::new("n", SQL_INTEGER);
        assert!(matches!(
            convert(&Value::Int(i64::MAX), SQL_C_LONG, &column),
            Err(rec) if rec.state == "22003"
        ));
        assert!(matches!(
            convert(&Value::from("x"), SQL_C_SBIGINT, &column),
            Err(rec) if rec.state == "22018"
        ));
        assert!(matches!(
            convert(&Value::from(" 17 "), SQL_C_SBIGINT, &column),
            Ok(Converted::BigInt(17))
        ));
    }
}
