//! Folding a handle's diagnostic record chain into one value.

use std::fmt;

use log::debug;

use crate::api::NativeApi;
use crate::error::{Error, Result};
use crate::handle::HandleKind;
use crate::types::*;
use crate::wide;

/// One record of the chain, as `SQLGetDiagRecW` reports it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticRecord {
    pub state: String, // 5-char SQLSTATE e.g. "HY000"
    pub native_error: i32,
    pub message: String,
}

impl DiagnosticRecord {
    pub fn new(state: impl Into<String>, native_error: i32, message: impl Into<String>) -> Self {
        Self {
            state: state.into(),
            native_error,
            message: message.into(),
        }
    }
}

impl fmt::Display for DiagnosticRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] ({}) {}", self.state, self.native_error, self.message)
    }
}

/// The aggregate of a diagnostic chain.
///
/// `state` and `native_error` come from the first record; `message` is every
/// record's text concatenated in order. An empty chain still produces a value,
/// with empty state and message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnostics {
    pub state: String,
    pub native_error: i32,
    pub message: String,
    pub records: Vec<DiagnosticRecord>,
}

impl Diagnostics {
    pub fn push(&mut self, record: DiagnosticRecord) {
        if self.records.is_empty() {
            self.state = record.state.clone();
            self.native_error = record.native_error;
        }
        self.message.push_str(&record.message);
        self.records.push(record);
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }
}

impl FromIterator<DiagnosticRecord> for Diagnostics {
    fn from_iter<I: IntoIterator<Item = DiagnosticRecord>>(iter: I) -> Self {
        let mut diagnostics = Diagnostics::default();
        for record in iter {
            diagnostics.push(record);
        }
        diagnostics
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("no diagnostic records");
        }
        write!(f, "{} {}", self.state, self.message)
    }
}

/// Walks records 1, 2, … of `handle` until the backend reports no more data,
/// an invalid handle or an error.
pub fn collect(api: &dyn NativeApi, kind: HandleKind, handle: SQLHANDLE) -> Diagnostics {
    let mut diagnostics = Diagnostics::default();
    if handle.is_null() {
        return diagnostics;
    }

    let mut state: [SQLWCHAR; 6] = [0; 6];
    let mut message: Vec<SQLWCHAR> = vec![0; SQL_MAX_MESSAGE_LENGTH as usize];
    let mut record: SQLSMALLINT = 1;
    let mut grown = false;

    loop {
        let mut native_error: SQLINTEGER = 0;
        let mut text_length: SQLSMALLINT = 0;
        let buffer_length = SQLSMALLINT::try_from(message.len()).unwrap_or(SQLSMALLINT::MAX);
        let ret = unsafe {
            api.get_diag_rec(
                kind.as_raw(),
                handle,
                record,
                state.as_mut_ptr(),
                &mut native_error,
                message.as_mut_ptr(),
                buffer_length,
                &mut text_length,
            )
        };
        if ret != SQL_SUCCESS && ret != SQL_SUCCESS_WITH_INFO {
            break;
        }

        let text_length = text_length.max(0) as usize;
        if text_length >= message.len() && !grown {
            // Message did not fit; read the same record again.
            message.resize(text_length + 1, 0);
            grown = true;
            continue;
        }
        grown = false;

        let end = text_length.min(message.len());
        diagnostics.push(DiagnosticRecord {
            state: wide::decode(&state),
            native_error,
            message: wide::decode(&message[..end]),
        });

        if record == SQLSMALLINT::MAX {
            break;
        }
        record += 1;
    }

    diagnostics
}

/// Logs the records attached to a `SQL_SUCCESS_WITH_INFO` return.
pub fn log_diagnostics(api: &dyn NativeApi, kind: HandleKind, handle: SQLHANDLE, function: &str) {
    if !log::log_enabled!(log::Level::Debug) {
        return;
    }
    for record in collect(api, kind, handle).records {
        debug!("{function} returned with info: {record}");
    }
}

/// Maps a return code to `Ok(())` or the handle's diagnostics.
pub(crate) fn check(
    api: &dyn NativeApi,
    kind: HandleKind,
    handle: SQLHANDLE,
    ret: SQLRETURN,
    function: &'static str,
) -> Result<()> {
    match ret {
        SQL_SUCCESS => Ok(()),
        SQL_SUCCESS_WITH_INFO => {
            log_diagnostics(api, kind, handle, function);
            Ok(())
        }
        _ => Err(Error::Native {
            function,
            diagnostics: collect(api, kind, handle),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_record_supplies_identity() {
        let diagnostics: Diagnostics = vec![
            DiagnosticRecord::new("08001", 10061, "refused."),
            DiagnosticRecord::new("HYT00", 0, "timeout."),
        ]
        .into_iter()
        .collect();

        assert_eq!(diagnostics.state, "08001");
        assert_eq!(diagnostics.native_error, 10061);
        assert_eq!(diagnostics.message, "refused.timeout.");
        assert_eq!(diagnostics.len(), 2);
        assert_eq!(diagnostics.to_string(), "08001 refused.timeout.");
    }

    #[test]
    fn empty_chain_is_present_but_blank() {
        let diagnostics = Diagnostics::default();
        assert!(diagnostics.is_empty());
        assert!(diagnostics.state.is_empty());
        assert!(diagnostics.message.is_empty());
        assert_eq!(diagnostics.to_string(), "no diagnostic records");
    }

    #[test]
    fn null_handle_yields_nothing() {
        let loopback = crate::loopback::Loopback::new();
        let diagnostics = collect(&loopback, HandleKind::Statement, std::ptr::null_mut());
        assert!(diagnostics.is_empty());
    }
}
