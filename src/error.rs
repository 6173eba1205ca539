use thiserror::Error;

use crate::diagnostics::Diagnostics;
use crate::handle::HandleKind;

#[derive(Error, Debug)]
pub enum Error {
    #[error("ODBC environment setup failed: {0}")]
    Environment(Diagnostics),

    #[error("failed to allocate {kind} handle: {diagnostics}")]
    Allocation {
        kind: HandleKind,
        diagnostics: Diagnostics,
    },

    #[error("{function} failed: {diagnostics}")]
    Native {
        function: &'static str,
        diagnostics: Diagnostics,
    },

    #[error("unsupported value of kind {kind} for parameter {index}")]
    UnsupportedValue { index: u16, kind: &'static str },

    #[error("statement expects {expected} parameters, {supplied} supplied")]
    ParameterCount { expected: usize, supplied: usize },

    #[error("column index {index} out of range ({count} columns)")]
    ColumnOutOfRange { index: usize, count: usize },

    #[error("destination holds {len} values, row has {needed} columns")]
    DestinationTooShort { needed: usize, len: usize },

    #[error("{0} is closed")]
    Closed(HandleKind),

    #[error("conversion error: {0}")]
    Conversion(String),

    #[error("invalid connection string: {0}")]
    Config(String),

    #[error("the process-wide ODBC environment is already initialized")]
    AlreadyInitialized,
}

impl Error {
    /// The backend's diagnostic aggregate, for errors the backend reported.
    pub fn diagnostics(&self) -> Option<&Diagnostics> {
        match self {
            Error::Environment(diagnostics)
            | Error::Allocation { diagnostics, .. }
            | Error::Native { diagnostics, .. } => Some(diagnostics),
            _ => None,
        }
    }

    /// SQLSTATE of the first diagnostic record, if there was one.
    pub fn state(&self) -> Option<&str> {
        self.diagnostics()
            .map(|diagnostics| diagnostics.state.as_str())
            .filter(|state| !state.is_empty())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
