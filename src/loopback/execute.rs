use std::collections::{HashMap, VecDeque};
use std::slice;

use chrono::NaiveDateTime;

use super::handle::{BoundParam, Prepared, Program, StmtHandle};
use super::script::{self, Column, Failure, Outcome, Response};
use crate::types::*;
use crate::value::{self, Value};

pub(crate) fn prepare(
    stmt: &mut StmtHandle,
    text: String,
    responses: &HashMap<String, Response>,
) -> SQLRETURN {
    stmt.close_cursor();
    stmt.prepared = None;

    let program = match responses.get(text.trim()) {
        Some(Response::Reject(records)) => {
            stmt.diagnostics.extend(records.iter().cloned());
            return SQL_ERROR;
        }
        Some(response) => Program::Registered(response.clone()),
        None => match script::compile(&text) {
            Ok(select) => Program::Select(select),
            Err(rec) => {
                stmt.diagnostics.push(rec);
                return SQL_ERROR;
            }
        },
    };
    let param_count = match &program {
        Program::Registered(_) => script::count_markers(&text),
        Program::Select(select) => select.markers,
    };
    stmt.prepared = Some(Prepared {
        text,
        program,
        param_count,
    });
    SQL_SUCCESS
}

/// Runs the prepared statement. Returns the text it ran alongside the code.
pub(crate) unsafe fn execute(stmt: &mut StmtHandle) -> (SQLRETURN, Option<String>) {
    if stmt.current.is_some() {
        return (stmt.error("24000", "Invalid cursor state"), None);
    }
    let Some(prepared) = &stmt.prepared else {
        return (stmt.error("HY010", "Function sequence error"), None);
    };
    let text = prepared.text.clone();

    let mut params = Vec::with_capacity(prepared.param_count);
    for number in 1..=prepared.param_count {
        let bound = stmt
            .bound_params
            .iter()
            .find(|param| usize::from(param.param_number) == number);
        match bound {
            Some(param) => params.push(read_param(param)),
            None => break,
        }
    }
    let outcomes = if params.len() < prepared.param_count {
        None
    } else {
        Some(match &prepared.program {
            Program::Registered(response) => script::respond(response),
            Program::Select(select) => Ok(script::run(select, &params)),
        })
    };

    let mut outcomes: VecDeque<Outcome> = match outcomes {
        None => return (stmt.error("07002", "COUNT field incorrect"), Some(text)),
        Some(Ok(outcomes)) => outcomes.into(),
        Some(Err(Failure::Diagnostics(records))) => {
            stmt.diagnostics.extend(records);
            return (SQL_ERROR, Some(text));
        }
        Some(Err(Failure::NeedData)) => return (SQL_NEED_DATA, Some(text)),
    };

    stmt.row_index = -1;
    stmt.read_offsets.clear();
    stmt.current = outcomes.pop_front();
    stmt.pending = outcomes;

    let ret = match stmt.current {
        Some(Outcome::Count(0)) => SQL_NO_DATA,
        _ => SQL_SUCCESS,
    };
    (ret, Some(text))
}

pub(crate) fn num_params(stmt: &mut StmtHandle, count: *mut SQLSMALLINT) -> SQLRETURN {
    let Some(prepared) = &stmt.prepared else {
        return stmt.error("HY010", "Function sequence error");
    };
    let params = SQLSMALLINT::try_from(prepared.param_count).unwrap_or(SQLSMALLINT::MAX);
    if !count.is_null() {
        unsafe { *count = params };
    }
    SQL_SUCCESS
}

/// Reports the types registered for the statement text, else `SQL_UNKNOWN_TYPE`.
pub(crate) unsafe fn describe_param(
    stmt: &mut StmtHandle,
    param_types: &HashMap<String, Vec<SQLSMALLINT>>,
    param_number: SQLUSMALLINT,
    data_type: *mut SQLSMALLINT,
    param_size: *mut SQLULEN,
    decimal_digits: *mut SQLSMALLINT,
    nullable: *mut SQLSMALLINT,
) -> SQLRETURN {
    let Some(prepared) = &stmt.prepared else {
        return stmt.error("HY010", "Function sequence error");
    };
    let (text, param_count) = (prepared.text.trim().to_owned(), prepared.param_count);
    let number = usize::from(param_number);
    if number == 0 || number > param_count {
        return stmt.error("07009", "Invalid descriptor index");
    }
    let sql_type = param_types
        .get(&text)
        .and_then(|types| types.get(number - 1).copied())
        .unwrap_or(SQL_UNKNOWN_TYPE);
    let column = Column::new("", sql_type);

    if !data_type.is_null() {
        *data_type = sql_type;
    }
    if !param_size.is_null() {
        *param_size = if sql_type == SQL_UNKNOWN_TYPE { 0 } else { column.size };
    }
    if !decimal_digits.is_null() {
        *decimal_digits = column.decimal_digits;
    }
    if !nullable.is_null() {
        *nullable = SQL_NULLABLE;
    }
    SQL_SUCCESS
}

#[allow(clippy::too_many_arguments)]
pub(crate) fn bind_parameter(
    stmt: &mut StmtHandle,
    param_number: SQLUSMALLINT,
    input_output_type: SQLSMALLINT,
    value_type: SQLSMALLINT,
    parameter_type: SQLSMALLINT,
    column_size: SQLULEN,
    decimal_digits: SQLSMALLINT,
    value_ptr: SQLPOINTER,
    _buffer_length: SQLLEN,
    len_ind_ptr: *mut SQLLEN,
) -> SQLRETURN {
    if param_number == 0 {
        return stmt.error("07009", "Invalid descriptor index");
    }
    if input_output_type != SQL_PARAM_INPUT {
        return stmt.error("HY105", "Invalid parameter type");
    }

    // Rebinding the same number replaces the earlier binding.
    stmt.bound_params.retain(|param| param.param_number != param_number);
    stmt.bound_params.push(BoundParam {
        param_number,
        value_type,
        parameter_type,
        column_size,
        decimal_digits,
        value_ptr,
        len_ind_ptr,
    });
    SQL_SUCCESS
}

pub(crate) fn free_stmt(stmt: &mut StmtHandle, option: SQLUSMALLINT) -> SQLRETURN {
    match option {
        SQL_CLOSE => stmt.close_cursor(),
        SQL_RESET_PARAMS => stmt.bound_params.clear(),
        SQL_UNBIND => {} // no column bindings
        _ => return stmt.error("HY092", "Invalid attribute/option identifier"),
    }
    SQL_SUCCESS
}

pub(crate) fn more_results(stmt: &mut StmtHandle) -> SQLRETURN {
    if stmt.current.is_none() {
        return SQL_NO_DATA;
    }
    stmt.current = stmt.pending.pop_front();
    stmt.row_index = -1;
    stmt.read_offsets.clear();
    if stmt.current.is_some() {
        SQL_SUCCESS
    } else {
        SQL_NO_DATA
    }
}

pub(crate) fn row_count(stmt: &mut StmtHandle, count: *mut SQLLEN) -> SQLRETURN {
    let rows = match stmt.current {
        Some(Outcome::Count(rows)) => rows as SQLLEN,
        _ => -1,
    };
    if !count.is_null() {
        unsafe { *count = rows };
    }
    SQL_SUCCESS
}

/// The value behind a bound parameter, with the column it echoes as.
unsafe fn read_param(param: &BoundParam) -> (Value, Column) {
    let column = Column {
        name: String::new(),
        sql_type: param.parameter_type,
        size: param.column_size,
        decimal_digits: param.decimal_digits,
        nullable: SQL_NULLABLE,
    };
    (read_param_value(param), column)
}

unsafe fn read_param_value(param: &BoundParam) -> Value {
    let len_ind = if param.len_ind_ptr.is_null() {
        SQL_NTS as SQLLEN
    } else {
        *param.len_ind_ptr
    };
    if len_ind == SQL_NULL_DATA || param.value_ptr.is_null() {
        return Value::Null;
    }

    let ptr = param.value_ptr;
    match param.value_type {
        SQL_C_BIT => Value::Bool(read::<u8>(ptr) != 0),
        SQL_C_LONG | SQL_C_SLONG => Value::Int(i64::from(read::<i32>(ptr))),
        SQL_C_SHORT => Value::Int(i64::from(read::<i16>(ptr))),
        SQL_C_SBIGINT => Value::Int(read::<i64>(ptr)),
        SQL_C_DOUBLE => Value::Float(read::<f64>(ptr)),
        SQL_C_FLOAT => Value::Float(f64::from(read::<f32>(ptr))),
        SQL_C_WCHAR => {
            let units = slice::from_raw_parts(ptr as *const u16, text_units(ptr as *const u16, len_ind, 2));
            Value::Text(String::from_utf16_lossy(units))
        }
        SQL_C_BINARY => {
            let len = usize::try_from(len_ind).unwrap_or(0);
            Value::Bytes(slice::from_raw_parts(ptr as *const u8, len).to_vec())
        }
        SQL_C_TYPE_TIMESTAMP => {
            let raw = read::<SqlTimestampStruct>(ptr);
            value::timestamp_from_struct(&raw)
                .map(Value::Timestamp)
                .unwrap_or_else(|_| Value::Timestamp(NaiveDateTime::default()))
        }
        // SQL_C_CHAR and anything else arrive as narrow text
        _ => {
            let bytes = slice::from_raw_parts(ptr as *const u8, text_units(ptr as *const u8, len_ind, 1));
            Value::Text(String::from_utf8_lossy(bytes).into_owned())
        }
    }
}

unsafe fn read<T: Copy>(ptr: SQLPOINTER) -> T {
    (ptr as *const T).read_unaligned()
}

/// Units of a character parameter: from the indicator, or up to the NUL.
unsafe fn text_units<T: Copy + Default + PartialEq>(ptr: *const T, len_ind: SQLLEN, unit: usize) -> usize {
    if len_ind >= 0 {
        return len_ind as usize / unit;
    }
    let mut n = 0;
    while *ptr.add(n) != T::default() {
        n += 1;
    }
    n
}

#[cfg(test)]
mod tests {
    use std::ptr;

    use super::*;

    fn bound(value_type: SQLSMALLINT, value_ptr: SQLPOINTER, len_ind_ptr: *mut SQLLEN) -> BoundParam {
        BoundParam {
            param_number: 1,
            value_type,
            parameter_type: SQL_VARCHAR,
            column_size: 0,
            decimal_digits: 0,
            value_ptr,
            len_ind_ptr,
        }
    }

    #[test]
    fn reads_narrow_text_by_indicator() {
        let mut text = *b"hello\0";
        let mut ind: SQLLEN = 5;
        let param = bound(SQL_C_CHAR, text.as_mut_ptr() as SQLPOINTER, &mut ind);
        assert_eq!(unsafe { read_param_value(&param) }, Value::from("hello"));
    }

    #[test]
    fn reads_nts_wide_text() {
        let mut text: Vec<u16> = "hé".encode_utf16().chain([0]).collect();
        let mut ind = SQL_NTS as SQLLEN;
        let param = bound(SQL_C_WCHAR, text.as_mut_ptr() as SQLPOINTER, &mut ind);
        assert_eq!(unsafe { read_param_value(&param) }, Value::from("hé"));
    }

    #[test]
    fn null_indicator_wins() {
        let mut value: i32 = 7;
        let mut ind = SQL_NULL_DATA;
        let param = bound(SQL_C_LONG, ptr::addr_of_mut!(value) as SQLPOINTER, &mut ind);
        assert_eq!(unsafe { read_param_value(&param) }, Value::Null);
    }

    #[test]
    fn missing_binding_is_count_error() {
        let mut stmt = StmtHandle::new();
        let ret = prepare(&mut stmt, "SELECT ?".to_owned(), &HashMap::new());
        assert_eq!(ret, SQL_SUCCESS);
        let (ret, text) = unsafe { execute(&mut stmt) };
        assert_eq!(ret, SQL_ERROR);
        assert_eq!(text.as_deref(), Some("SELECT ?"));
        assert_eq!(stmt.diagnostics[0].state, "07002");
    }

    #[test]
    fn zero_row_count_is_no_data() {
        let mut responses = HashMap::new();
        responses.insert("DELETE FROM t".to_owned(), Response::RowCount(0));
        let mut stmt = StmtHandle::new();
        assert_eq!(prepare(&mut stmt, "DELETE FROM t".to_owned(), &responses), SQL_SUCCESS);
        let (ret, _) = unsafe { execute(&mut stmt) };
        assert_eq!(ret, SQL_NO_DATA);
        let mut count: SQLLEN = -5;
        assert_eq!(row_count(&mut stmt, &mut count), SQL_SUCCESS);
        assert_eq!(count, 0);
    }
}
