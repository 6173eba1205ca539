use std::collections::VecDeque;

use super::script::{Outcome, Response, Select};
use crate::diagnostics::DiagnosticRecord;
use crate::types::*;

/// Environment handle
#[derive(Default)]
pub(crate) struct EnvHandle {
    pub odbc_version: SQLINTEGER,
    pub diagnostics: Vec<DiagnosticRecord>,
}

/// Connection handle
pub(crate) struct DbcHandle {
    pub server: String,
    pub database: String,
    pub user: String,
    pub diagnostics: Vec<DiagnosticRecord>,
    pub connected: bool,
    pub autocommit: bool,
    pub in_transaction: bool,
}

impl DbcHandle {
    pub fn new() -> Self {
        Self {
            server: String::new(),
            database: String::new(),
            user: String::new(),
            diagnostics: Vec::new(),
            connected: false,
            autocommit: true,
            in_transaction: false,
        }
    }

    pub fn error(&mut self, state: &str, message: &str) -> SQLRETURN {
        self.diagnostics.push(record(state, message));
        SQL_ERROR
    }
}

/// Statement handle
pub(crate) struct StmtHandle {
    pub diagnostics: Vec<DiagnosticRecord>,
    pub prepared: Option<Prepared>,
    pub bound_params: Vec<BoundParam>,
    pub current: Option<Outcome>,
    pub pending: VecDeque<Outcome>, // results after the current one
    pub row_index: isize,           // -1 = before first row
    pub read_offsets: Vec<Option<usize>>, // per column, for chunked SQLGetData
    pub scrollable: bool,
}

// Bound parameter pointers are only read while the registry lock is held.
unsafe impl Send for StmtHandle {}

impl StmtHandle {
    pub fn new() -> Self {
        Self {
            diagnostics: Vec::new(),
            prepared: None,
            bound_params: Vec::new(),
            current: None,
            pending: VecDeque::new(),
            row_index: -1,
            read_offsets: Vec::new(),
            scrollable: false,
        }
    }

    pub fn close_cursor(&mut self) {
        self.current = None;
        self.pending.clear();
        self.row_index = -1;
        self.read_offsets.clear();
    }

    pub fn error(&mut self, state: &str, message: &str) -> SQLRETURN {
        self.diagnostics.push(record(state, message));
        SQL_ERROR
    }
}

pub(crate) fn record(state: &str, message: &str) -> DiagnosticRecord {
    DiagnosticRecord::new(state, 0, format!("[Loopback] {message}"))
}

/// Prepared statement text and what it runs.
pub(crate) struct Prepared {
    pub text: String,
    pub program: Program,
    pub param_count: usize,
}

pub(crate) enum Program {
    Registered(Response),
    Select(Select),
}

/// A bound parameter
pub(crate) struct BoundParam {
    pub param_number: u16,
    pub value_type: SQLSMALLINT,
    pub parameter_type: SQLSMALLINT,
    pub column_size: SQLULEN,
    pub decimal_digits: SQLSMALLINT,
    pub value_ptr: SQLPOINTER,
    pub len_ind_ptr: *mut SQLLEN,
}
