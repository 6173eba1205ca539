use std::cell::Cell;
use std::marker::PhantomData;

use log::warn;

use crate::environment::Environment;
use crate::error::{Error, Result};
use crate::handle::{HandleKind, OwnedHandle};
use crate::statement::Statement;
use crate::types::*;
use crate::wide;

/// Byte size of the buffer used for `SQLGetInfoW` string queries.
const INFO_BUFFER_BYTES: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerInfo {
    pub database_name: String,
    pub dbms_version: String,
    pub server_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientInfo {
    pub driver_name: String,
    pub odbc_version: String,
    pub driver_version: String,
}

/// An open connection; statements borrow it.
#[derive(Debug)]
pub struct Connection<'env> {
    handle: Option<OwnedHandle>,
    autocommit: Cell<bool>,
    _environment: PhantomData<&'env Environment>,
}

impl<'env> Connection<'env> {
    pub(crate) fn new(handle: OwnedHandle) -> Self {
        Self {
            handle: Some(handle),
            autocommit: Cell::new(true),
            _environment: PhantomData,
        }
    }

    fn handle(&self) -> Result<&OwnedHandle> {
        self.handle
            .as_ref()
            .ok_or(Error::Closed(HandleKind::Connection))
    }

    pub fn is_connected(&self) -> bool {
        self.handle.is_some()
    }

    pub fn is_auto_commit(&self) -> bool {
        self.autocommit.get()
    }

    pub fn auto_commit(&self, enabled: bool) -> Result<()> {
        let handle = self.handle()?;
        let value = if enabled {
            SQL_AUTOCOMMIT_ON
        } else {
            SQL_AUTOCOMMIT_OFF
        };
        let ret = unsafe {
            handle.api().set_connect_attr(
                handle.raw(),
                SQL_ATTR_AUTOCOMMIT,
                value as SQLPOINTER,
                SQL_IS_UINTEGER,
            )
        };
        handle.check(ret, "SQLSetConnectAttrW")?;
        self.autocommit.set(enabled);
        Ok(())
    }

    /// Turns autocommit off; the transaction ends with [`commit`](Self::commit)
    /// or [`rollback`](Self::rollback).
    pub fn begin_transaction(&self) -> Result<()> {
        self.auto_commit(false)
    }

    pub fn commit(&self) -> Result<()> {
        self.end_transaction(SQL_COMMIT)
    }

    pub fn rollback(&self) -> Result<()> {
        self.end_transaction(SQL_ROLLBACK)
    }

    fn end_transaction(&self, completion: SQLSMALLINT) -> Result<()> {
        let handle = self.handle()?;
        let ret = unsafe { handle.api().end_tran(SQL_HANDLE_DBC, handle.raw(), completion) };
        handle.check(ret, "SQLEndTran")
    }

    pub fn server_info(&self) -> Result<ServerInfo> {
        Ok(ServerInfo {
            database_name: self.info_string(SQL_DATABASE_NAME)?,
            dbms_version: self.info_string(SQL_DBMS_VER)?,
            server_name: self.info_string(SQL_SERVER_NAME)?,
        })
    }

    pub fn client_info(&self) -> Result<ClientInfo> {
        Ok(ClientInfo {
            driver_name: self.info_string(SQL_DRIVER_NAME)?,
            odbc_version: self.info_string(SQL_DRIVER_ODBC_VER)?,
            driver_version: self.info_string(SQL_DRIVER_VER)?,
        })
    }

    /// String-valued `SQLGetInfoW`; longer values are cut at the buffer size.
    fn info_string(&self, info_type: SQLUSMALLINT) -> Result<String> {
        let handle = self.handle()?;
        let mut buffer: [SQLWCHAR; INFO_BUFFER_BYTES / 2] = [0; INFO_BUFFER_BYTES / 2];
        let mut length: SQLSMALLINT = 0;
        let ret = unsafe {
            handle.api().get_info(
                handle.raw(),
                info_type,
                buffer.as_mut_ptr() as SQLPOINTER,
                INFO_BUFFER_BYTES as SQLSMALLINT,
                &mut length,
            )
        };
        handle.check(ret, "SQLGetInfoW")?;
        let units = (length.max(0) as usize / 2).min(buffer.len() - 1);
        Ok(wide::decode(&buffer[..units]))
    }

    fn alloc_statement(&self) -> Result<Statement<'_>> {
        let handle = self.handle()?;
        let statement = OwnedHandle::alloc(handle.api_arc(), HandleKind::Statement, Some(handle))?;
        Ok(Statement::new(statement))
    }

    /// Prepares `text` for repeated [`execute`](Statement::execute) calls.
    pub fn prepare(&self, text: &str) -> Result<Statement<'_>> {
        let mut statement = self.alloc_statement()?;
        statement.prepare_text(text)?;
        Ok(statement)
    }

    /// Executes `text` immediately.
    pub fn exec_direct(&self, text: &str) -> Result<Statement<'_>> {
        let mut statement = self.alloc_statement()?;
        statement.exec_direct_text(text)?;
        Ok(statement)
    }

    /// Disconnects and frees the handle. Closing a closed connection is a no-op.
    ///
    /// If the disconnect fails the connection stays open, so the caller can
    /// roll back and try again.
    pub fn close(&mut self) -> Result<()> {
        let Some(handle) = self.handle.as_ref() else {
            return Ok(());
        };
        let ret = unsafe { handle.api().disconnect(handle.raw()) };
        handle.check(ret, "SQLDisconnect")?;
        match self.handle.take() {
            Some(handle) => handle.free(),
            None => Ok(()),
        }
    }
}

impl Drop for Connection<'_> {
    fn drop(&mut self) {
        let Err(err) = self.close() else {
            return;
        };
        warn!("closing connection on drop failed: {err}; rolling back");
        if let Err(err) = self.rollback() {
            warn!("rollback before disconnect failed: {err}");
        }
        if let Err(err) = self.close() {
            warn!("closing connection on drop failed again: {err}");
        }
    }
}
