use std::ptr;
use std::sync::Arc;

use once_cell::sync::OnceCell;

use crate::api::NativeApi;
use crate::connection::Connection;
use crate::error::{Error, Result};
use crate::handle::{HandleKind, OwnedHandle};
use crate::types::*;
use crate::wide;

/// Capacity, in characters, of the completed connection string buffer.
const OUT_CONNECTION_STRING_LEN: usize = 1024;

static GLOBAL: OnceCell<Environment> = OnceCell::new();

/// Value of `SQL_ATTR_ODBC_VERSION`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OdbcVersion {
    #[default]
    Odbc3,
    Odbc3_80,
}

impl OdbcVersion {
    fn as_raw(self) -> SQLINTEGER {
        match self {
            OdbcVersion::Odbc3 => SQL_OV_ODBC3,
            OdbcVersion::Odbc3_80 => SQL_OV_ODBC3_80,
        }
    }
}

/// The root handle; connections are children of it.
///
/// Most programs use one process-wide environment ([`install`](Self::install)
/// or, with the `unixodbc` feature, [`system`](Self::system)). Environments
/// built with [`new`](Self::new) are independent and free their handle on drop.
#[derive(Debug)]
pub struct Environment {
    handle: OwnedHandle,
    version: OdbcVersion,
}

impl Environment {
    pub fn new(api: Arc<dyn NativeApi>) -> Result<Self> {
        Self::with_version(api, OdbcVersion::default())
    }

    pub fn with_version(api: Arc<dyn NativeApi>, version: OdbcVersion) -> Result<Self> {
        let handle = OwnedHandle::alloc(&api, HandleKind::Environment, None).map_err(|err| match err {
            Error::Allocation { diagnostics, .. } => Error::Environment(diagnostics),
            other => other,
        })?;

        let ret = unsafe {
            api.set_env_attr(
                handle.raw(),
                SQL_ATTR_ODBC_VERSION,
                version.as_raw() as usize as SQLPOINTER,
                0,
            )
        };
        handle.check(ret, "SQLSetEnvAttr").map_err(|err| match err {
            Error::Native { diagnostics, .. } => Error::Environment(diagnostics),
            other => other,
        })?;

        Ok(Self { handle, version })
    }

    /// Installs the process-wide environment. Fails if one is already installed.
    pub fn install(api: Arc<dyn NativeApi>) -> Result<&'static Environment> {
        let mut created = false;
        let env = GLOBAL.get_or_try_init(|| {
            created = true;
            Environment::new(api)
        })?;
        if created {
            Ok(env)
        } else {
            Err(Error::AlreadyInitialized)
        }
    }

    /// The process-wide environment, if installed.
    pub fn global() -> Option<&'static Environment> {
        GLOBAL.get()
    }

    /// The process-wide environment on the system driver manager, installing
    /// it on first use.
    #[cfg(feature = "unixodbc")]
    pub fn system() -> Result<&'static Environment> {
        GLOBAL.get_or_try_init(|| Environment::new(Arc::new(crate::sys::DriverManager)))
    }

    pub fn version(&self) -> OdbcVersion {
        self.version
    }

    pub fn api(&self) -> &Arc<dyn NativeApi> {
        self.handle.api_arc()
    }

    /// Connects with an ODBC connection string, without prompting.
    pub fn connect(&self, target: &str) -> Result<Connection<'_>> {
        let handle = OwnedHandle::alloc(self.api(), HandleKind::Connection, Some(&self.handle))?;

        let target = wide::encode(target);
        let target_len = SQLSMALLINT::try_from(target.len())
            .map_err(|_| Error::Config(format!("{} characters is too long", target.len())))?;
        let mut completed: Vec<SQLWCHAR> = vec![0; OUT_CONNECTION_STRING_LEN];
        let mut completed_len: SQLSMALLINT = 0;
        let ret = unsafe {
            handle.api().driver_connect(
                handle.raw(),
                ptr::null_mut(),
                target.as_ptr(),
                target_len,
                completed.as_mut_ptr(),
                OUT_CONNECTION_STRING_LEN as SQLSMALLINT,
                &mut completed_len,
                SQL_DRIVER_NOPROMPT,
            )
        };
        // On failure `handle` drops here, after its diagnostics are read.
        handle.check(ret, "SQLDriverConnectW")?;

        Ok(Connection::new(handle))
    }
}
