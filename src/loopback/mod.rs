//! An ODBC driver that runs in-process.
//!
//! [`Loopback`] implements [`NativeApi`] over plain Rust state, so the whole
//! statement layer can run without a driver manager or a database. It keeps a
//! registry of live handles, journals connection-level events, and answers
//! statements from registered [`Response`]s or by echoing `SELECT` lists (see
//! [`script`]).
//!
//! ```
//! use wickett::loopback::Loopback;
//! use wickett::{Environment, Value};
//!
//! let loopback = Loopback::new();
//! let env = Environment::new(loopback.api()).unwrap();
//! let conn = env.connect("Driver=Loopback;Server=localhost").unwrap();
//! let mut stmt = conn.prepare("SELECT ? AS x").unwrap();
//! stmt.execute(&[Value::Int(42)]).unwrap();
//! let row = stmt.fetch_one().unwrap().unwrap();
//! assert_eq!(row.get_int(0), Some(42));
//! ```

mod attr;
mod connect;
mod diagnostics;
mod execute;
mod fetch;
mod handle;
pub mod script;

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::ptr;
use std::slice;
use std::sync::Arc;

use log::{debug, trace};
use parking_lot::Mutex;

use self::handle::{DbcHandle, EnvHandle, StmtHandle};
pub use self::script::{Column, ResultSet, Response};
use crate::api::NativeApi;
use crate::diagnostics::DiagnosticRecord;
use crate::handle::HandleKind;
use crate::types::*;

/// Connection-level activity, in the order the driver saw it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Connected { server: String },
    Disconnected,
    AutoCommit(bool),
    Commit,
    Rollback,
    Cancel,
    Executed(String),
}

enum Object {
    Env(EnvHandle),
    Dbc(DbcHandle),
    Stmt(StmtHandle),
}

impl Object {
    fn kind(&self) -> HandleKind {
        match self {
            Object::Env(_) => HandleKind::Environment,
            Object::Dbc(_) => HandleKind::Connection,
            Object::Stmt(_) => HandleKind::Statement,
        }
    }

    fn diagnostics(&self) -> &[DiagnosticRecord] {
        match self {
            Object::Env(env) => &env.diagnostics,
            Object::Dbc(dbc) => &dbc.diagnostics,
            Object::Stmt(stmt) => &stmt.diagnostics,
        }
    }
}

struct Entry {
    parent: Option<usize>,
    object: Object,
}

struct State {
    next_id: usize,
    handles: HashMap<usize, Entry>,
    invalid_frees: usize,
    cancelled: HashSet<usize>,
    servers: Vec<String>,
    responses: HashMap<String, Response>,
    param_types: HashMap<String, Vec<SQLSMALLINT>>,
    journal: Vec<Event>,
}

impl Default for State {
    fn default() -> Self {
        Self {
            next_id: 1,
            handles: HashMap::new(),
            invalid_frees: 0,
            cancelled: HashSet::new(),
            servers: vec!["localhost".to_owned()],
            responses: HashMap::new(),
            param_types: HashMap::new(),
            journal: Vec::new(),
        }
    }
}

fn id_of(handle: SQLHANDLE) -> usize {
    handle as usize
}

fn env_mut(handles: &mut HashMap<usize, Entry>, handle: SQLHANDLE) -> Option<&mut EnvHandle> {
    match handles.get_mut(&id_of(handle)) {
        Some(Entry {
            object: Object::Env(env),
            ..
        }) => Some(env),
        _ => None,
    }
}

fn dbc_mut(handles: &mut HashMap<usize, Entry>, handle: SQLHANDLE) -> Option<&mut DbcHandle> {
    match handles.get_mut(&id_of(handle)) {
        Some(Entry {
            object: Object::Dbc(dbc),
            ..
        }) => Some(dbc),
        _ => None,
    }
}

fn stmt_mut(handles: &mut HashMap<usize, Entry>, handle: SQLHANDLE) -> Option<&mut StmtHandle> {
    match handles.get_mut(&id_of(handle)) {
        Some(Entry {
            object: Object::Stmt(stmt),
            ..
        }) => Some(stmt),
        _ => None,
    }
}

/// Text passed with an explicit length or `SQL_NTS`.
unsafe fn read_text(text: *const SQLWCHAR, length: SQLINTEGER) -> Option<String> {
    if text.is_null() {
        return None;
    }
    let len = if length == SQL_NTS {
        let mut n = 0;
        while *text.add(n) != 0 {
            n += 1;
        }
        n
    } else {
        usize::try_from(length).ok()?
    };
    Some(String::from_utf16_lossy(slice::from_raw_parts(text, len)))
}

/// The in-process driver. Clones share one registry.
#[derive(Clone, Default)]
pub struct Loopback {
    state: Arc<Mutex<State>>,
}

impl fmt::Debug for Loopback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("Loopback")
            .field("handles", &state.handles.len())
            .field("servers", &state.servers)
            .finish_non_exhaustive()
    }
}

impl Loopback {
    /// A driver that knows the server `localhost`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a reachable server name.
    pub fn with_server(self, server: impl Into<String>) -> Self {
        self.state.lock().servers.push(server.into());
        self
    }

    /// Answers statements whose trimmed text is `text` with `response`.
    pub fn respond(&self, text: impl Into<String>, response: Response) {
        let text = text.into().trim().to_owned();
        self.state.lock().responses.insert(text, response);
    }

    /// Parameter types `SQLDescribeParam` reports for `text`.
    pub fn describe_params(&self, text: impl Into<String>, types: Vec<SQLSMALLINT>) {
        let text = text.into().trim().to_owned();
        self.state.lock().param_types.insert(text, types);
    }

    pub fn live_handles(&self, kind: HandleKind) -> usize {
        self.state
            .lock()
            .handles
            .values()
            .filter(|entry| entry.object.kind() == kind)
            .count()
    }

    /// Frees of unknown, already freed, or mistyped handles.
    pub fn invalid_frees(&self) -> usize {
        self.state.lock().invalid_frees
    }

    pub fn events(&self) -> Vec<Event> {
        self.state.lock().journal.clone()
    }

    pub fn api(&self) -> Arc<dyn NativeApi> {
        Arc::new(self.clone())
    }

    /// Runs `f` on a statement with its diagnostics cleared.
    fn with_stmt(&self, handle: SQLHSTMT, f: impl FnOnce(&mut StmtHandle) -> SQLRETURN) -> SQLRETURN {
        let mut state = self.state.lock();
        match stmt_mut(&mut state.handles, handle) {
            Some(stmt) => {
                stmt.diagnostics.clear();
                f(stmt)
            }
            None => SQL_INVALID_HANDLE,
        }
    }

    fn with_dbc(&self, handle: SQLHDBC, f: impl FnOnce(&mut DbcHandle) -> SQLRETURN) -> SQLRETURN {
        let mut state = self.state.lock();
        match dbc_mut(&mut state.handles, handle) {
            Some(dbc) => {
                dbc.diagnostics.clear();
                f(dbc)
            }
            None => SQL_INVALID_HANDLE,
        }
    }

    /// Marks the statement's connection as inside a transaction when
    /// autocommit is off.
    fn touch_transaction(state: &mut State, stmt: SQLHSTMT) {
        let parent = state.handles.get(&id_of(stmt)).and_then(|entry| entry.parent);
        if let Some(Entry {
            object: Object::Dbc(dbc),
            ..
        }) = parent.and_then(|id| state.handles.get_mut(&id))
        {
            if !dbc.autocommit {
                dbc.in_transaction = true;
            }
        }
    }

    fn run(state: &mut State, stmt: SQLHSTMT) -> SQLRETURN {
        let Some(handle) = stmt_mut(&mut state.handles, stmt) else {
            return SQL_INVALID_HANDLE;
        };
        let (ret, text) = unsafe { execute::execute(handle) };
        if let Some(text) = text {
            debug!("loopback executed {text:?}: {ret}");
            state.journal.push(Event::Executed(text));
        }
        if matches!(ret, SQL_SUCCESS | SQL_SUCCESS_WITH_INFO | SQL_NO_DATA) {
            Self::touch_transaction(state, stmt);
        }
        ret
    }
}

impl NativeApi for Loopback {
    unsafe fn alloc_handle(
        &self,
        handle_type: SQLSMALLINT,
        input_handle: SQLHANDLE,
        output_handle: *mut SQLHANDLE,
    ) -> SQLRETURN {
        if output_handle.is_null() {
            return SQL_ERROR;
        }
        *output_handle = ptr::null_mut();

        let mut state = self.state.lock();
        let (object, parent) = match HandleKind::from_raw(handle_type) {
            Some(HandleKind::Environment) => (Object::Env(EnvHandle::default()), None),
            Some(HandleKind::Connection) => {
                let Some(env) = env_mut(&mut state.handles, input_handle) else {
                    return SQL_INVALID_HANDLE;
                };
                env.diagnostics.clear();
                if env.odbc_version == 0 {
                    env.diagnostics
                        .push(handle::record("HY010", "Function sequence error"));
                    return SQL_ERROR;
                }
                (Object::Dbc(DbcHandle::new()), Some(id_of(input_handle)))
            }
            Some(HandleKind::Statement) => {
                let Some(dbc) = dbc_mut(&mut state.handles, input_handle) else {
                    return SQL_INVALID_HANDLE;
                };
                dbc.diagnostics.clear();
                if !dbc.connected {
                    return dbc.error("08003", "Connection not open");
                }
                (Object::Stmt(StmtHandle::new()), Some(id_of(input_handle)))
            }
            None => return SQL_ERROR,
        };

        let id = state.next_id;
        state.next_id += 1;
        trace!("loopback allocated {} handle {id}", object.kind());
        state.handles.insert(id, Entry { parent, object });
        *output_handle = id as SQLHANDLE;
        SQL_SUCCESS
    }

    unsafe fn free_handle(&self, handle_type: SQLSMALLINT, handle: SQLHANDLE) -> SQLRETURN {
        let mut state = self.state.lock();
        let id = id_of(handle);
        let kind = state.handles.get(&id).map(|entry| entry.object.kind());
        if kind.is_none() || kind != HandleKind::from_raw(handle_type) {
            state.invalid_frees += 1;
            return SQL_INVALID_HANDLE;
        }

        let has_children = state.handles.values().any(|entry| entry.parent == Some(id));
        match state.handles.get_mut(&id).map(|entry| &mut entry.object) {
            Some(Object::Env(env)) if has_children => {
                env.diagnostics
                    .push(handle::record("HY010", "Function sequence error"));
                return SQL_ERROR;
            }
            Some(Object::Dbc(dbc)) if dbc.connected => {
                dbc.diagnostics
                    .push(handle::record("HY010", "Function sequence error"));
                return SQL_ERROR;
            }
            _ => {}
        }

        state.handles.remove(&id);
        state.cancelled.remove(&id);
        trace!("loopback freed handle {id}");
        SQL_SUCCESS
    }

    unsafe fn set_env_attr(
        &self,
        env: SQLHENV,
        attribute: SQLINTEGER,
        value: SQLPOINTER,
        _string_length: SQLINTEGER,
    ) -> SQLRETURN {
        let mut state = self.state.lock();
        match env_mut(&mut state.handles, env) {
            Some(env) => {
                env.diagnostics.clear();
                attr::set_env_attr(env, attribute, value)
            }
            None => SQL_INVALID_HANDLE,
        }
    }

    unsafe fn get_diag_rec(
        &self,
        handle_type: SQLSMALLINT,
        handle: SQLHANDLE,
        rec_number: SQLSMALLINT,
        state: *mut SQLWCHAR,
        native_error: *mut SQLINTEGER,
        message_text: *mut SQLWCHAR,
        buffer_length: SQLSMALLINT,
        text_length: *mut SQLSMALLINT,
    ) -> SQLRETURN {
        let registry = self.state.lock();
        match registry.handles.get(&id_of(handle)) {
            Some(entry) if Some(entry.object.kind()) == HandleKind::from_raw(handle_type) => {
                diagnostics::get_diag_rec(
                    entry.object.diagnostics(),
                    rec_number,
                    state,
                    native_error,
                    message_text,
                    buffer_length,
                    text_length,
                )
            }
            _ => SQL_INVALID_HANDLE,
        }
    }

    unsafe fn driver_connect(
        &self,
        dbc: SQLHDBC,
        _window: SQLHWND,
        in_connection_string: *const SQLWCHAR,
        string_length1: SQLSMALLINT,
        out_connection_string: *mut SQLWCHAR,
        buffer_length: SQLSMALLINT,
        string_length2: *mut SQLSMALLINT,
        _driver_completion: SQLUSMALLINT,
    ) -> SQLRETURN {
        let mut state = self.state.lock();
        let State {
            handles,
            servers,
            journal,
            ..
        } = &mut *state;
        let Some(conn) = dbc_mut(handles, dbc) else {
            return SQL_INVALID_HANDLE;
        };
        conn.diagnostics.clear();
        let Some(target) = read_text(in_connection_string, SQLINTEGER::from(string_length1)) else {
            return conn.error("HY009", "Invalid use of null pointer");
        };

        let ret = connect::driver_connect(
            conn,
            servers,
            &target,
            out_connection_string,
            buffer_length,
            string_length2,
        );
        if ret == SQL_SUCCESS {
            debug!("loopback connected to {}", conn.server);
            journal.push(Event::Connected {
                server: conn.server.clone(),
            });
        }
        ret
    }

    unsafe fn disconnect(&self, dbc: SQLHDBC) -> SQLRETURN {
        let mut state = self.state.lock();
        let Some(conn) = dbc_mut(&mut state.handles, dbc) else {
            return SQL_INVALID_HANDLE;
        };
        conn.diagnostics.clear();
        let ret = connect::disconnect(conn);
        if ret == SQL_SUCCESS {
            let id = id_of(dbc);
            state.handles.retain(|_, entry| entry.parent != Some(id));
            state.journal.push(Event::Disconnected);
        }
        ret
    }

    unsafe fn set_connect_attr(
        &self,
        dbc: SQLHDBC,
        attribute: SQLINTEGER,
        value: SQLPOINTER,
        _string_length: SQLINTEGER,
    ) -> SQLRETURN {
        let mut state = self.state.lock();
        let State {
            handles, journal, ..
        } = &mut *state;
        match dbc_mut(handles, dbc) {
            Some(conn) => {
                conn.diagnostics.clear();
                attr::set_connect_attr(conn, attribute, value, journal)
            }
            None => SQL_INVALID_HANDLE,
        }
    }

    unsafe fn end_tran(
        &self,
        handle_type: SQLSMALLINT,
        handle: SQLHANDLE,
        completion_type: SQLSMALLINT,
    ) -> SQLRETURN {
        if handle_type != SQL_HANDLE_DBC {
            return SQL_INVALID_HANDLE;
        }
        let mut state = self.state.lock();
        let State {
            handles, journal, ..
        } = &mut *state;
        match dbc_mut(handles, handle) {
            Some(conn) => {
                conn.diagnostics.clear();
                attr::end_tran(conn, completion_type, journal)
            }
            None => SQL_INVALID_HANDLE,
        }
    }

    unsafe fn get_info(
        &self,
        dbc: SQLHDBC,
        info_type: SQLUSMALLINT,
        info_value: SQLPOINTER,
        buffer_length: SQLSMALLINT,
        string_length: *mut SQLSMALLINT,
    ) -> SQLRETURN {
        self.with_dbc(dbc, |conn| {
            attr::get_info(conn, info_type, info_value, buffer_length, string_length)
        })
    }

    unsafe fn prepare(
        &self,
        stmt: SQLHSTMT,
        text: *const SQLWCHAR,
        text_length: SQLINTEGER,
    ) -> SQLRETURN {
        let mut state = self.state.lock();
        let State {
            handles,
            responses,
            ..
        } = &mut *state;
        let Some(handle) = stmt_mut(handles, stmt) else {
            return SQL_INVALID_HANDLE;
        };
        handle.diagnostics.clear();
        match read_text(text, text_length) {
            Some(text) => execute::prepare(handle, text, responses),
            None => handle.error("HY009", "Invalid use of null pointer"),
        }
    }

    unsafe fn exec_direct(
        &self,
        stmt: SQLHSTMT,
        text: *const SQLWCHAR,
        text_length: SQLINTEGER,
    ) -> SQLRETURN {
        let ret = self.prepare(stmt, text, text_length);
        if ret != SQL_SUCCESS {
            return ret;
        }
        Self::run(&mut self.state.lock(), stmt)
    }

    unsafe fn execute(&self, stmt: SQLHSTMT) -> SQLRETURN {
        let mut state = self.state.lock();
        if let Some(handle) = stmt_mut(&mut state.handles, stmt) {
            handle.diagnostics.clear();
        }
        Self::run(&mut state, stmt)
    }

    unsafe fn num_params(&self, stmt: SQLHSTMT, count: *mut SQLSMALLINT) -> SQLRETURN {
        self.with_stmt(stmt, |handle| execute::num_params(handle, count))
    }

    unsafe fn describe_param(
        &self,
        stmt: SQLHSTMT,
        param_number: SQLUSMALLINT,
        data_type: *mut SQLSMALLINT,
        param_size: *mut SQLULEN,
        decimal_digits: *mut SQLSMALLINT,
        nullable: *mut SQLSMALLINT,
    ) -> SQLRETURN {
        let mut state = self.state.lock();
        let State {
            handles,
            param_types,
            ..
        } = &mut *state;
        let Some(handle) = stmt_mut(handles, stmt) else {
            return SQL_INVALID_HANDLE;
        };
        handle.diagnostics.clear();
        execute::describe_param(
            handle,
            param_types,
            param_number,
            data_type,
            param_size,
            decimal_digits,
            nullable,
        )
    }

    unsafe fn bind_parameter(
        &self,
        stmt: SQLHSTMT,
        param_number: SQLUSMALLINT,
        input_output_type: SQLSMALLINT,
        value_type: SQLSMALLINT,
        parameter_type: SQLSMALLINT,
        column_size: SQLULEN,
        decimal_digits: SQLSMALLINT,
        value: SQLPOINTER,
        buffer_length: SQLLEN,
        str_len_or_ind: *mut SQLLEN,
    ) -> SQLRETURN {
        self.with_stmt(stmt, |handle| {
            execute::bind_parameter(
                handle,
                param_number,
                input_output_type,
                value_type,
                parameter_type,
                column_size,
                decimal_digits,
                value,
                buffer_length,
                str_len_or_ind,
            )
        })
    }

    unsafe fn free_stmt(&self, stmt: SQLHSTMT, option: SQLUSMALLINT) -> SQLRETURN {
        self.with_stmt(stmt, |handle| execute::free_stmt(handle, option))
    }

    unsafe fn num_result_cols(&self, stmt: SQLHSTMT, count: *mut SQLSMALLINT) -> SQLRETURN {
        self.with_stmt(stmt, |handle| {
            if !count.is_null() {
                *count = fetch::num_result_cols(handle);
            }
            SQL_SUCCESS
        })
    }

    unsafe fn describe_col(
        &self,
        stmt: SQLHSTMT,
        column_number: SQLUSMALLINT,
        column_name: *mut SQLWCHAR,
        buffer_length: SQLSMALLINT,
        name_length: *mut SQLSMALLINT,
        data_type: *mut SQLSMALLINT,
        column_size: *mut SQLULEN,
        decimal_digits: *mut SQLSMALLINT,
        nullable: *mut SQLSMALLINT,
    ) -> SQLRETURN {
        self.with_stmt(stmt, |handle| {
            fetch::describe_col(
                handle,
                column_number,
                column_name,
                buffer_length,
                name_length,
                data_type,
                column_size,
                decimal_digits,
                nullable,
            )
        })
    }

    unsafe fn col_attribute(
        &self,
        stmt: SQLHSTMT,
        column_number: SQLUSMALLINT,
        field_identifier: SQLUSMALLINT,
        character_attribute: SQLPOINTER,
        buffer_length: SQLSMALLINT,
        string_length: *mut SQLSMALLINT,
        numeric_attribute: *mut SQLLEN,
    ) -> SQLRETURN {
        self.with_stmt(stmt, |handle| {
            fetch::col_attribute(
                handle,
                column_number,
                field_identifier,
                character_attribute,
                buffer_length,
                string_length,
                numeric_attribute,
            )
        })
    }

    unsafe fn fetch(&self, stmt: SQLHSTMT) -> SQLRETURN {
        let mut state = self.state.lock();
        let cancelled = state.cancelled.remove(&id_of(stmt));
        match stmt_mut(&mut state.handles, stmt) {
            Some(handle) => {
                handle.diagnostics.clear();
                fetch::fetch(handle, cancelled)
            }
            None => SQL_INVALID_HANDLE,
        }
    }

    unsafe fn get_data(
        &self,
        stmt: SQLHSTMT,
        column_number: SQLUSMALLINT,
        target_type: SQLSMALLINT,
        target_value: SQLPOINTER,
        buffer_length: SQLLEN,
        str_len_or_ind: *mut SQLLEN,
    ) -> SQLRETURN {
        self.with_stmt(stmt, |handle| {
            fetch::get_data(
                handle,
                column_number,
                target_type,
                target_value,
                buffer_length,
                str_len_or_ind,
            )
        })
    }

    unsafe fn row_count(&self, stmt: SQLHSTMT, count: *mut SQLLEN) -> SQLRETURN {
        self.with_stmt(stmt, |handle| execute::row_count(handle, count))
    }

    unsafe fn more_results(&self, stmt: SQLHSTMT) -> SQLRETURN {
        self.with_stmt(stmt, execute::more_results)
    }

    unsafe fn cancel(&self, stmt: SQLHSTMT) -> SQLRETURN {
        let mut state = self.state.lock();
        match stmt_mut(&mut state.handles, stmt) {
            Some(handle) => handle.diagnostics.clear(),
            None => return SQL_INVALID_HANDLE,
        }
        state.cancelled.insert(id_of(stmt));
        state.journal.push(Event::Cancel);
        SQL_SUCCESS
    }

    unsafe fn set_stmt_attr(
        &self,
        stmt: SQLHSTMT,
        attribute: SQLINTEGER,
        value: SQLPOINTER,
        _string_length: SQLINTEGER,
    ) -> SQLRETURN {
        self.with_stmt(stmt, |handle| attr::set_stmt_attr(handle, attribute, value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alloc(api: &Loopback, kind: HandleKind, parent: SQLHANDLE) -> (SQLRETURN, SQLHANDLE) {
        let mut handle = ptr::null_mut();
        let ret = unsafe { api.alloc_handle(kind.as_raw(), parent, &mut handle) };
        (ret, handle)
    }

    #[test]
    fn double_free_is_counted() {
        let loopback = Loopback::new();
        let (ret, env) = alloc(&loopback, HandleKind::Environment, ptr::null_mut());
        assert_eq!(ret, SQL_SUCCESS);
        assert_eq!(unsafe { loopback.free_handle(SQL_HANDLE_ENV, env) }, SQL_SUCCESS);
        assert_eq!(
            unsafe { loopback.free_handle(SQL_HANDLE_ENV, env) },
            SQL_INVALID_HANDLE
        );
        assert_eq!(loopback.invalid_frees(), 1);
    }

    #[test]
    fn connection_needs_odbc_version() {
        let loopback = Loopback::new();
        let (_, env) = alloc(&loopback, HandleKind::Environment, ptr::null_mut());
        let (ret, dbc) = alloc(&loopback, HandleKind::Connection, env);
        assert_eq!(ret, SQL_ERROR);
        assert!(dbc.is_null());
        let diagnostics = crate::diagnostics::collect(&loopback, HandleKind::Environment, env);
        assert_eq!(diagnostics.state, "HY010");
    }

    #[test]
    fn environment_with_children_stays() {
        let loopback = Loopback::new();
        let (_, env) = alloc(&loopback, HandleKind::Environment, ptr::null_mut());
        unsafe {
            loopback.set_env_attr(env, SQL_ATTR_ODBC_VERSION, SQL_OV_ODBC3 as usize as SQLPOINTER, 0);
        }
        let (ret, dbc) = alloc(&loopback, HandleKind::Connection, env);
        assert_eq!(ret, SQL_SUCCESS);
        assert_eq!(unsafe { loopback.free_handle(SQL_HANDLE_ENV, env) }, SQL_ERROR);
        assert_eq!(unsafe { loopback.free_handle(SQL_HANDLE_DBC, dbc) }, SQL_SUCCESS);
        assert_eq!(unsafe { loopback.free_handle(SQL_HANDLE_ENV, env) }, SQL_SUCCESS);
        assert_eq!(loopback.invalid_frees(), 0);
    }

    #[test]
    fn nts_text_reads_to_nul() {
        let text: Vec<u16> = "SELECT 1".encode_utf16().chain([0, 65]).collect();
        let read = unsafe { read_text(text.as_ptr(), SQL_NTS) };
        assert_eq!(read.as_deref(), Some("SELECT 1"));
        let read = unsafe { read_text(text.as_ptr(), 6) };
        assert_eq!(read.as_deref(), Some("SELECT"));
    }
}
