//! ODBC statement execution and value marshalling.
//!
//! An [`Environment`] owns the root handle and opens [`Connection`]s. A
//! connection prepares or directly executes [`Statement`]s, which bind
//! [`Value`] parameters and read result rows back as values:
//!
//! ```
//! use wickett::loopback::Loopback;
//! use wickett::{Environment, Value};
//!
//! let loopback = Loopback::new();
//! let env = Environment::new(loopback.api())?;
//! let conn = env.connect("Server=localhost;Database=demo")?;
//!
//! let mut stmt = conn.prepare("SELECT ? AS greeting, ? AS n")?;
//! stmt.execute(&[Value::from("hello"), Value::Int(7)])?;
//! for row in stmt.cursor() {
//!     let row = row?;
//!     assert_eq!(row.get_string(0), Some("hello"));
//!     assert_eq!(row.get_int(1), Some(7));
//! }
//! # Ok::<(), wickett::Error>(())
//! ```
//!
//! All native calls go through [`NativeApi`]. With the `unixodbc` feature the
//! crate links the system driver manager; the [`loopback`] driver runs in
//! process and backs the test suite.

pub mod api;
mod binder;
mod config;
mod connection;
mod cursor;
mod decoder;
pub mod diagnostics;
mod environment;
mod error;
mod handle;
pub mod loopback;
mod row;
mod statement;
#[cfg(feature = "unixodbc")]
pub mod sys;
mod transaction;
pub mod types;
mod value;
mod wide;

pub use crate::api::NativeApi;
pub use crate::binder::{BindDescriptor, ParamBuffer};
pub use crate::config::ConnectionString;
pub use crate::connection::{ClientInfo, Connection, ServerInfo};
pub use crate::cursor::{Cursor, FetchOutcome};
pub use crate::decoder::{Field, Nullability, TypeFamily};
pub use crate::diagnostics::{DiagnosticRecord, Diagnostics};
pub use crate::environment::{Environment, OdbcVersion};
pub use crate::error::{Error, Result};
pub use crate::handle::HandleKind;
pub use crate::row::Row;
pub use crate::statement::{CancelHandle, ParamDescription, Statement};
pub use crate::transaction::Transaction;
pub use crate::value::Value;

/// Connects through the process-wide system environment.
#[cfg(feature = "unixodbc")]
pub fn connect(target: &str) -> Result<Connection<'static>> {
    Environment::system()?.connect(target)
}
