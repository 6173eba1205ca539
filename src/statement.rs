use std::marker::PhantomData;
use std::sync::Arc;

use log::warn;
use parking_lot::RwLock;

use crate::api::NativeApi;
use crate::binder::ParamBuffer;
use crate::decoder::{self, ColumnType, Field};
use crate::diagnostics;
use crate::error::{Error, Result};
use crate::handle::{HandleKind, OwnedHandle};
use crate::types::*;
use crate::value::Value;
use crate::wide;

/// The statement handle, shared between a [`Statement`] and its cancel handles.
#[derive(Debug)]
pub(crate) struct SharedStatement {
    slot: RwLock<Option<OwnedHandle>>,
}

impl SharedStatement {
    /// Runs `f` with the live handle, holding the read side of the lock.
    pub(crate) fn with<T>(&self, f: impl FnOnce(&dyn NativeApi, SQLHSTMT) -> Result<T>) -> Result<T> {
        let guard = self.slot.read();
        let handle = guard.as_ref().ok_or(Error::Closed(HandleKind::Statement))?;
        f(handle.api(), handle.raw())
    }
}

/// A prepared or directly executed statement on a [`Connection`](crate::Connection).
///
/// Parameter buffers stay owned by the statement from bind until the next
/// execution or close.
#[derive(Debug)]
pub struct Statement<'c> {
    pub(crate) shared: Arc<SharedStatement>,
    params: Vec<ParamBuffer>,
    pub(crate) columns: Option<Vec<ColumnType>>,
    pub(crate) names: Option<Arc<[String]>>,
    prepared: bool,
    executed: bool,
    scrollable: bool,
    pub(crate) exhausted: bool,
    _connection: PhantomData<&'c ()>,
}

/// Describes a parameter marker, from `SQLDescribeParam`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamDescription {
    pub data_type: SQLSMALLINT,
    pub size: SQLULEN,
    pub decimal_digits: SQLSMALLINT,
    pub nullable: SQLSMALLINT,
}

fn check(api: &dyn NativeApi, stmt: SQLHSTMT, ret: SQLRETURN, function: &'static str) -> Result<()> {
    diagnostics::check(api, HandleKind::Statement, stmt, ret, function)
}

/// Execution returns: `SQL_NO_DATA` is an empty success, `SQL_NEED_DATA` is
/// accepted without sending deferred data.
fn check_execution(
    api: &dyn NativeApi,
    stmt: SQLHSTMT,
    ret: SQLRETURN,
    function: &'static str,
) -> Result<()> {
    match ret {
        SQL_NO_DATA => Ok(()),
        SQL_NEED_DATA => {
            warn!("{function} asked for data-at-execution parameters; none will be sent");
            Ok(())
        }
        _ => check(api, stmt, ret, function),
    }
}

impl<'c> Statement<'c> {
    pub(crate) fn new(handle: OwnedHandle) -> Self {
        Self {
            shared: Arc::new(SharedStatement {
                slot: RwLock::new(Some(handle)),
            }),
            params: Vec::new(),
            columns: None,
            names: None,
            prepared: false,
            executed: false,
            scrollable: false,
            exhausted: false,
            _connection: PhantomData,
        }
    }

    pub(crate) fn prepare_text(&mut self, text: &str) -> Result<()> {
        let text = wide::encode(text);
        let len = text_length(text.len())?;
        self.shared.with(|api, stmt| {
            let ret = unsafe { api.prepare(stmt, text.as_ptr(), len) };
            check(api, stmt, ret, "SQLPrepareW")
        })?;
        self.prepared = true;
        Ok(())
    }

    pub(crate) fn exec_direct_text(&mut self, text: &str) -> Result<()> {
        let text = wide::encode(text);
        let len = text_length(text.len())?;
        self.shared.with(|api, stmt| {
            let ret = unsafe { api.exec_direct(stmt, text.as_ptr(), len) };
            check_execution(api, stmt, ret, "SQLExecDirectW")
        })?;
        self.mark_executed();
        Ok(())
    }

    fn mark_executed(&mut self) {
        self.executed = true;
        self.exhausted = false;
        self.columns = None;
        self.names = None;
    }

    /// Executes a prepared statement with `params` bound in order.
    ///
    /// With no parameters, whatever was bound before stays bound.
    pub fn execute(&mut self, params: &[Value]) -> Result<()> {
        if !params.is_empty() {
            self.bind_params(params)?;
        }
        let reopen = self.executed;
        self.shared.with(|api, stmt| {
            if reopen {
                let ret = unsafe { api.free_stmt(stmt, SQL_CLOSE) };
                check(api, stmt, ret, "SQLFreeStmt")?;
            }
            let ret = unsafe { api.execute(stmt) };
            check_execution(api, stmt, ret, "SQLExecute")
        })?;
        self.mark_executed();
        Ok(())
    }

    fn bind_params(&mut self, params: &[Value]) -> Result<()> {
        let expected = usize::try_from(self.try_num_params()?).unwrap_or(0);
        if expected != params.len() {
            return Err(Error::ParameterCount {
                expected,
                supplied: params.len(),
            });
        }

        let mut buffers = Vec::with_capacity(params.len());
        for (position, value) in params.iter().enumerate() {
            let index = param_index(position)?;
            let mut buffer = ParamBuffer::new(index, value)?;
            if buffer.is_null() {
                let described = self.param_type(index)?;
                buffer.set_null_type(described.data_type);
            }
            buffers.push(buffer);
        }

        // The old buffers may only go once the driver has dropped its pointers.
        self.shared.with(|api, stmt| {
            let ret = unsafe { api.free_stmt(stmt, SQL_RESET_PARAMS) };
            check(api, stmt, ret, "SQLFreeStmt")
        })?;
        self.params = buffers;

        let params = &mut self.params;
        self.shared.with(|api, stmt| {
            for (position, buffer) in params.iter_mut().enumerate() {
                let index = param_index(position)?;
                let ret = unsafe { buffer.bind(api, stmt, index) };
                check(api, stmt, ret, "SQLBindParameter")?;
            }
            Ok(())
        })
    }

    pub fn is_prepared(&self) -> bool {
        self.prepared
    }

    pub fn is_executed(&self) -> bool {
        self.executed
    }

    pub fn is_scrollable(&self) -> bool {
        self.scrollable
    }

    /// Sets `SQL_ATTR_CURSOR_SCROLLABLE`; takes effect on the next execution.
    pub fn set_scrollable(&mut self, scrollable: bool) -> Result<()> {
        let value = if scrollable {
            SQL_SCROLLABLE
        } else {
            SQL_NONSCROLLABLE
        };
        self.shared.with(|api, stmt| {
            let ret = unsafe {
                api.set_stmt_attr(stmt, SQL_ATTR_CURSOR_SCROLLABLE, value as SQLPOINTER, 0)
            };
            check(api, stmt, ret, "SQLSetStmtAttr")
        })?;
        self.scrollable = scrollable;
        Ok(())
    }

    pub fn rows_affected(&self) -> Result<i64> {
        self.shared.with(|api, stmt| {
            let mut count: SQLLEN = 0;
            let ret = unsafe { api.row_count(stmt, &mut count) };
            check(api, stmt, ret, "SQLRowCount")?;
            Ok(count as i64)
        })
    }

    pub fn try_num_params(&self) -> Result<i16> {
        self.shared.with(|api, stmt| {
            let mut count: SQLSMALLINT = 0;
            let ret = unsafe { api.num_params(stmt, &mut count) };
            check(api, stmt, ret, "SQLNumParams")?;
            Ok(count)
        })
    }

    /// Number of parameter markers, or `-1` if the backend cannot tell.
    pub fn num_params(&self) -> i16 {
        self.try_num_params().unwrap_or(-1)
    }

    /// Type the backend expects for 1-based parameter `index`.
    pub fn param_type(&self, index: u16) -> Result<ParamDescription> {
        self.shared.with(|api, stmt| {
            let mut description = ParamDescription {
                data_type: SQL_UNKNOWN_TYPE,
                size: 0,
                decimal_digits: 0,
                nullable: SQL_NULLABLE_UNKNOWN,
            };
            let ret = unsafe {
                api.describe_param(
                    stmt,
                    index,
                    &mut description.data_type,
                    &mut description.size,
                    &mut description.decimal_digits,
                    &mut description.nullable,
                )
            };
            check(api, stmt, ret, "SQLDescribeParam")?;
            Ok(description)
        })
    }

    pub fn num_fields(&self) -> Result<usize> {
        self.shared.with(|api, stmt| {
            let mut count: SQLSMALLINT = 0;
            let ret = unsafe { api.num_result_cols(stmt, &mut count) };
            check(api, stmt, ret, "SQLNumResultCols")?;
            Ok(count.max(0) as usize)
        })
    }

    /// Whether the last execution reported affected rows. Advisory: `false`
    /// when the count is unknown.
    pub fn has_rows(&self) -> bool {
        matches!(self.rows_affected(), Ok(count) if count > 0)
    }

    /// Moves to the next result set; `false` once there are no more.
    pub fn next_result(&mut self) -> Result<bool> {
        let more = self.shared.with(|api, stmt| {
            let ret = unsafe { api.more_results(stmt) };
            if ret == SQL_NO_DATA {
                return Ok(false);
            }
            check(api, stmt, ret, "SQLMoreResults")?;
            Ok(true)
        })?;
        self.columns = None;
        self.names = None;
        self.exhausted = !more;
        Ok(more)
    }

    /// Requests cancellation of the statement's current work.
    pub fn cancel(&self) -> Result<()> {
        cancel(&self.shared)
    }

    /// A handle that can cancel this statement from another thread.
    pub fn cancel_handle(&self) -> CancelHandle<'c> {
        CancelHandle {
            shared: Arc::clone(&self.shared),
            _connection: PhantomData,
        }
    }

    /// Metadata of 0-based column `index`.
    pub fn column_metadata(&self, index: usize) -> Result<Field> {
        let count = self.num_fields()?;
        if index >= count {
            return Err(Error::ColumnOutOfRange { index, count });
        }
        let column = column_number(index)?;
        self.shared
            .with(|api, stmt| decoder::describe_column(api, stmt, column))
    }

    /// Column names of the current result set.
    pub fn columns(&self) -> Result<Vec<String>> {
        let count = self.num_fields()?;
        (0..count)
            .map(|index| self.column_metadata(index).map(|field| field.name))
            .collect()
    }

    pub(crate) fn column_names(&mut self) -> Result<Arc<[String]>> {
        if let Some(names) = &self.names {
            return Ok(Arc::clone(names));
        }
        let names: Arc<[String]> = self.columns()?.into();
        self.names = Some(Arc::clone(&names));
        Ok(names)
    }

    pub(crate) fn column_type(&mut self, index: usize) -> Result<ColumnType> {
        if self.columns.is_none() {
            let count = self.num_fields()?;
            let types = self.shared.with(|api, stmt| {
                (0..count)
                    .map(|index| decoder::column_type(api, stmt, column_number(index)?))
                    .collect::<Result<Vec<_>>>()
            })?;
            self.columns = Some(types);
        }
        let columns = self.columns.as_deref().unwrap_or_default();
        columns
            .get(index)
            .copied()
            .ok_or(Error::ColumnOutOfRange {
                index,
                count: columns.len(),
            })
    }

    /// Frees the native handle; later calls are no-ops.
    pub fn close(&mut self) -> Result<()> {
        let handle = self.shared.slot.write().take();
        let result = handle.map_or(Ok(()), OwnedHandle::free);
        self.params.clear();
        self.columns = None;
        self.names = None;
        result
    }

    pub fn is_closed(&self) -> bool {
        self.shared.slot.read().is_none()
    }
}

impl Drop for Statement<'_> {
    fn drop(&mut self) {
        // Free while the bound buffers are still alive.
        drop(self.shared.slot.write().take());
    }
}

/// Cancels a statement from another thread.
#[derive(Debug, Clone)]
pub struct CancelHandle<'c> {
    shared: Arc<SharedStatement>,
    _connection: PhantomData<&'c ()>,
}

impl CancelHandle<'_> {
    pub fn cancel(&self) -> Result<()> {
        cancel(&self.shared)
    }
}

fn cancel(shared: &SharedStatement) -> Result<()> {
    shared.with(|api, stmt| {
        let ret = unsafe { api.cancel(stmt) };
        check(api, stmt, ret, "SQLCancel")
    })
}

fn text_length(len: usize) -> Result<SQLINTEGER> {
    SQLINTEGER::try_from(len)
        .map_err(|_| Error::Conversion(format!("statement text of {len} units is too long")))
}

fn param_index(position: usize) -> Result<SQLUSMALLINT> {
    SQLUSMALLINT::try_from(position + 1)
        .map_err(|_| Error::Conversion(format!("parameter {} out of range", position + 1)))
}

pub(crate) fn column_number(index: usize) -> Result<SQLUSMALLINT> {
    SQLUSMALLINT::try_from(index + 1).map_err(|_| Error::ColumnOutOfRange {
        index,
        count: SQLUSMALLINT::MAX as usize,
    })
}
