use std::ptr;

use super::handle::DbcHandle;
use crate::config::ConnectionString;
use crate::diagnostics::DiagnosticRecord;
use crate::types::*;

/// Parses the target and connects if its server is one of `servers`.
pub(crate) unsafe fn driver_connect(
    conn: &mut DbcHandle,
    servers: &[String],
    conn_str: &str,
    out_conn_str: *mut SQLWCHAR,
    buffer_length: SQLSMALLINT,
    out_length: *mut SQLSMALLINT,
) -> SQLRETURN {
    if conn.connected {
        return conn.error("08002", "Connection name in use");
    }

    let attributes = match ConnectionString::parse(conn_str) {
        Ok(attributes) => attributes,
        Err(err) => return conn.error("HY000", &err.to_string()),
    };

    let server = attributes.get("server").unwrap_or("localhost").to_owned();
    if !servers.iter().any(|known| known.eq_ignore_ascii_case(&server)) {
        conn.diagnostics.push(DiagnosticRecord::new(
            "08001",
            10061,
            format!("[Loopback] Server '{server}' is not reachable."),
        ));
        conn.diagnostics.push(DiagnosticRecord::new(
            "HYT00",
            0,
            "[Loopback] Login timeout expired.",
        ));
        return SQL_ERROR;
    }

    conn.server = server;
    conn.database = attributes.get("database").unwrap_or("loopback").to_owned();
    conn.user = attributes.get("uid").unwrap_or_default().to_owned();
    conn.connected = true;

    // Completed connection string: what was asked for, minus the password.
    let mut completed = attributes;
    completed.remove("pwd");
    let completed: Vec<u16> = completed.to_string().encode_utf16().collect();
    if !out_length.is_null() {
        *out_length = SQLSMALLINT::try_from(completed.len()).unwrap_or(SQLSMALLINT::MAX);
    }
    if !out_conn_str.is_null() && buffer_length > 0 {
        let copy_len = completed.len().min(buffer_length as usize - 1);
        ptr::copy_nonoverlapping(completed.as_ptr(), out_conn_str, copy_len);
        *out_conn_str.add(copy_len) = 0;
    }
    SQL_SUCCESS
}

/// Statements must already be released by the caller.
pub(crate) fn disconnect(conn: &mut DbcHandle) -> SQLRETURN {
    if !conn.connected {
        return conn.error("08003", "Connection not open");
    }
    if conn.in_transaction {
        return conn.error("25000", "Invalid transaction state");
    }
    conn.connected = false;
    SQL_SUCCESS
}
