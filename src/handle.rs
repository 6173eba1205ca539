use std::fmt;
use std::ptr;
use std::sync::Arc;

use log::{debug, warn};

use crate::api::NativeApi;
use crate::diagnostics::{self, Diagnostics};
use crate::error::{Error, Result};
use crate::types::*;

/// The three handle types the crate allocates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandleKind {
    Environment,
    Connection,
    Statement,
}

impl HandleKind {
    pub fn as_raw(self) -> SQLSMALLINT {
        match self {
            HandleKind::Environment => SQL_HANDLE_ENV,
            HandleKind::Connection => SQL_HANDLE_DBC,
            HandleKind::Statement => SQL_HANDLE_STMT,
        }
    }

    pub fn from_raw(handle_type: SQLSMALLINT) -> Option<Self> {
        match handle_type {
            SQL_HANDLE_ENV => Some(HandleKind::Environment),
            SQL_HANDLE_DBC => Some(HandleKind::Connection),
            SQL_HANDLE_STMT => Some(HandleKind::Statement),
            _ => None,
        }
    }
}

impl fmt::Display for HandleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            HandleKind::Environment => "environment",
            HandleKind::Connection => "connection",
            HandleKind::Statement => "statement",
        })
    }
}

/// `SQL_SUCCESS` or `SQL_SUCCESS_WITH_INFO`.
pub fn succeeded(ret: SQLRETURN) -> bool {
    ret == SQL_SUCCESS || ret == SQL_SUCCESS_WITH_INFO
}

/// A native handle released exactly once, by [`free`](OwnedHandle::free) or on drop.
pub(crate) struct OwnedHandle {
    api: Arc<dyn NativeApi>,
    raw: SQLHANDLE,
    kind: HandleKind,
}

// Handles are plain driver-side identifiers; the driver serializes access.
unsafe impl Send for OwnedHandle {}
unsafe impl Sync for OwnedHandle {}

impl OwnedHandle {
    /// Allocates a handle of `kind` under `parent` (none for environments).
    ///
    /// On failure the diagnostics come from the new handle if the backend
    /// produced one, otherwise from the parent.
    pub(crate) fn alloc(
        api: &Arc<dyn NativeApi>,
        kind: HandleKind,
        parent: Option<&OwnedHandle>,
    ) -> Result<Self> {
        let input = parent.map_or(ptr::null_mut(), |parent| parent.raw);
        let mut raw: SQLHANDLE = ptr::null_mut();
        let ret = unsafe { api.alloc_handle(kind.as_raw(), input, &mut raw) };

        if !succeeded(ret) || raw.is_null() {
            let diagnostics = if !raw.is_null() {
                let diagnostics = diagnostics::collect(api.as_ref(), kind, raw);
                unsafe { api.free_handle(kind.as_raw(), raw) };
                diagnostics
            } else if let Some(parent) = parent {
                diagnostics::collect(api.as_ref(), parent.kind, parent.raw)
            } else {
                Diagnostics::default()
            };
            return Err(Error::Allocation { kind, diagnostics });
        }
        if ret == SQL_SUCCESS_WITH_INFO {
            diagnostics::log_diagnostics(api.as_ref(), kind, raw, "SQLAllocHandle");
        }

        debug!("allocated {kind} handle {raw:?}");
        Ok(Self {
            api: Arc::clone(api),
            raw,
            kind,
        })
    }

    pub(crate) fn raw(&self) -> SQLHANDLE {
        self.raw
    }

    pub(crate) fn api(&self) -> &dyn NativeApi {
        self.api.as_ref()
    }

    pub(crate) fn api_arc(&self) -> &Arc<dyn NativeApi> {
        &self.api
    }

    /// Maps `ret`, returned by `function` on this handle, to a result.
    pub(crate) fn check(&self, ret: SQLRETURN, function: &'static str) -> Result<()> {
        diagnostics::check(self.api(), self.kind, self.raw, ret, function)
    }

    /// Frees the handle now, reporting failure instead of logging it.
    pub(crate) fn free(mut self) -> Result<()> {
        let raw = std::mem::replace(&mut self.raw, ptr::null_mut());
        let ret = unsafe { self.api.free_handle(self.kind.as_raw(), raw) };
        if succeeded(ret) {
            debug!("freed {} handle {raw:?}", self.kind);
            return Ok(());
        }
        Err(Error::Native {
            function: "SQLFreeHandle",
            diagnostics: diagnostics::collect(self.api(), self.kind, raw),
        })
    }
}

impl Drop for OwnedHandle {
    fn drop(&mut self) {
        if self.raw.is_null() {
            return;
        }
        let ret = unsafe { self.api.free_handle(self.kind.as_raw(), self.raw) };
        if succeeded(ret) {
            debug!("freed {} handle {:?}", self.kind, self.raw);
        } else {
            warn!(
                "SQLFreeHandle failed for {} handle {:?} (return code {ret})",
                self.kind, self.raw
            );
        }
    }
}

impl fmt::Debug for OwnedHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OwnedHandle")
            .field("kind", &self.kind)
            .field("raw", &self.raw)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loopback::Loopback;

    #[test]
    fn handle_kind_round_trips_raw_tags() {
        for kind in [
            HandleKind::Environment,
            HandleKind::Connection,
            HandleKind::Statement,
        ] {
            assert_eq!(HandleKind::from_raw(kind.as_raw()), Some(kind));
        }
        assert_eq!(HandleKind::from_raw(4), None);
    }

    #[test]
    fn drop_frees_once() {
        let loopback = Loopback::new();
        let api = loopback.api();
        {
            let _env = OwnedHandle::alloc(&api, HandleKind::Environment, None).unwrap();
            assert_eq!(loopback.live_handles(HandleKind::Environment), 1);
        }
        assert_eq!(loopback.live_handles(HandleKind::Environment), 0);
        assert_eq!(loopback.invalid_frees(), 0);
    }

    #[test]
    fn explicit_free_disarms_drop() {
        let loopback = Loopback::new();
        let api = loopback.api();
        let env = OwnedHandle::alloc(&api, HandleKind::Environment, None).unwrap();
        env.free().unwrap();
        assert_eq!(loopback.live_handles(HandleKind::Environment), 0);
        assert_eq!(loopback.invalid_frees(), 0);
    }

    #[test]
    fn statement_on_unconnected_dbc_reports_parent_diagnostics() {
        let loopback = Loopback::new();
        let api = loopback.api();
        let env = OwnedHandle::alloc(&api, HandleKind::Environment, None).unwrap();
        let ret = unsafe {
            api.set_env_attr(
                env.raw(),
                SQL_ATTR_ODBC_VERSION,
                SQL_OV_ODBC3 as usize as SQLPOINTER,
                0,
            )
        };
        assert_eq!(ret, SQL_SUCCESS);
        let dbc = OwnedHandle::alloc(&api, HandleKind::Connection, Some(&env)).unwrap();

        let err = OwnedHandle::alloc(&api, HandleKind::Statement, Some(&dbc)).unwrap_err();
        match err {
            Error::Allocation { kind, diagnostics } => {
                assert_eq!(kind, HandleKind::Statement);
                assert_eq!(diagnostics.state, "08003");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(loopback.live_handles(HandleKind::Statement), 0);
    }
}
