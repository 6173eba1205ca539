use std::ptr;

use super::handle::{record, DbcHandle, EnvHandle, StmtHandle};
use super::Event;
use crate::types::*;

pub(crate) fn set_env_attr(env: &mut EnvHandle, attribute: SQLINTEGER, value: SQLPOINTER) -> SQLRETURN {
    match attribute {
        SQL_ATTR_ODBC_VERSION => match value as SQLINTEGER {
            version @ (SQL_OV_ODBC2 | SQL_OV_ODBC3 | SQL_OV_ODBC3_80) => {
                env.odbc_version = version;
                SQL_SUCCESS
            }
            _ => {
                env.diagnostics.push(record("HY024", "Invalid attribute value"));
                SQL_ERROR
            }
        },
        _ => SQL_SUCCESS, // ignore unknown
    }
}

pub(crate) fn set_connect_attr(
    conn: &mut DbcHandle,
    attribute: SQLINTEGER,
    value: SQLPOINTER,
    journal: &mut Vec<Event>,
) -> SQLRETURN {
    match attribute {
        SQL_ATTR_AUTOCOMMIT => {
            let new_autocommit = value as SQLULEN != SQL_AUTOCOMMIT_OFF;
            if conn.autocommit != new_autocommit {
                // Turning autocommit back on commits the open transaction.
                if new_autocommit && conn.in_transaction {
                    conn.in_transaction = false;
                    journal.push(Event::Commit);
                }
                conn.autocommit = new_autocommit;
                journal.push(Event::AutoCommit(new_autocommit));
            }
            SQL_SUCCESS
        }
        _ => SQL_SUCCESS,
    }
}

pub(crate) fn end_tran(
    conn: &mut DbcHandle,
    completion_type: SQLSMALLINT,
    journal: &mut Vec<Event>,
) -> SQLRETURN {
    if !conn.connected {
        return conn.error("08003", "Connection not open");
    }
    match completion_type {
        SQL_COMMIT => journal.push(Event::Commit),
        SQL_ROLLBACK => journal.push(Event::Rollback),
        _ => return conn.error("HY012", "Invalid transaction operation code"),
    }
    conn.in_transaction = false;
    SQL_SUCCESS
}

pub(crate) unsafe fn get_info(
    conn: &mut DbcHandle,
    info_type: SQLUSMALLINT,
    info_value: SQLPOINTER,
    buffer_length: SQLSMALLINT,
    string_length: *mut SQLSMALLINT,
) -> SQLRETURN {
    let value = match info_type {
        SQL_DRIVER_NAME => "libwickett-loopback".to_owned(),
        SQL_DRIVER_VER => format!("{:02}.{:02}.0000", major_version(), minor_version()),
        SQL_DRIVER_ODBC_VER => "03.80".to_owned(),
        SQL_DBMS_NAME => "Loopback".to_owned(),
        SQL_DBMS_VER => "01.00.0000".to_owned(),
        SQL_SERVER_NAME => conn.server.clone(),
        SQL_DATABASE_NAME => conn.database.clone(),
        SQL_USER_NAME => conn.user.clone(),
        SQL_DATA_SOURCE_NAME => String::new(),
        _ => return conn.error("HY096", "Information type out of range"),
    };
    let ret = write_wide(&value, info_value, buffer_length, string_length);
    if ret == SQL_SUCCESS_WITH_INFO {
        conn.diagnostics.push(record("01004", "String data, right truncated"));
    }
    ret
}

pub(crate) fn set_stmt_attr(stmt: &mut StmtHandle, attribute: SQLINTEGER, value: SQLPOINTER) -> SQLRETURN {
    match attribute {
        SQL_ATTR_CURSOR_SCROLLABLE => {
            stmt.scrollable = value as SQLULEN == SQL_SCROLLABLE;
            SQL_SUCCESS
        }
        _ => SQL_SUCCESS,
    }
}

/// Writes `s` as NUL-terminated UTF-16; `string_length` gets the full byte length.
pub(crate) unsafe fn write_wide(
    s: &str,
    target: SQLPOINTER,
    buffer_length: SQLSMALLINT,
    string_length: *mut SQLSMALLINT,
) -> SQLRETURN {
    let units: Vec<u16> = s.encode_utf16().collect();
    if !string_length.is_null() {
        *string_length = SQLSMALLINT::try_from(units.len() * 2).unwrap_or(SQLSMALLINT::MAX);
    }
    if target.is_null() || buffer_length < 2 {
        return SQL_SUCCESS;
    }
    let capacity = buffer_length as usize / 2 - 1;
    let copy_len = units.len().min(capacity);
    ptr::copy_nonoverlapping(units.as_ptr(), target as *mut u16, copy_len);
    *(target as *mut u16).add(copy_len) = 0;
    if copy_len < units.len() {
        SQL_SUCCESS_WITH_INFO
    } else {
        SQL_SUCCESS
    }
}

fn major_version() -> u32 {
    env!("CARGO_PKG_VERSION_MAJOR").parse().unwrap_or(0)
}

fn minor_version() -> u32 {
    env!("CARGO_PKG_VERSION_MINOR").parse().unwrap_or(0)
}
