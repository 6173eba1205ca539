//! The native call interface.
//!
//! Every ODBC entry point the crate uses is one method of [`NativeApi`]. The
//! methods mirror the C signatures (wide-character variants where text is
//! involved) and keep the C calling convention's contract: raw handles, raw
//! buffers, and a `SQLRETURN` code. Two implementations ship with the crate:
//! the system driver manager (`sys::DriverManager`, feature `unixodbc`) and the
//! in-process [`Loopback`](crate::loopback::Loopback) driver.

use crate::types::*;

/// One method per ODBC function.
///
/// # Safety
///
/// Every method has the safety contract of the ODBC function it names: handles
/// must have been allocated through the same implementation and not yet freed,
/// and every pointer must be null (where the function allows it) or valid for
/// the documented buffer length. Buffers bound with
/// [`bind_parameter`](NativeApi::bind_parameter) must stay valid until the
/// parameters are reset or the statement is freed.
#[allow(clippy::too_many_arguments)]
pub trait NativeApi: Send + Sync {
    unsafe fn alloc_handle(
        &self,
        handle_type: SQLSMALLINT,
        input_handle: SQLHANDLE,
        output_handle: *mut SQLHANDLE,
    ) -> SQLRETURN;

    unsafe fn free_handle(&self, handle_type: SQLSMALLINT, handle: SQLHANDLE) -> SQLRETURN;

    unsafe fn set_env_attr(
        &self,
        env: SQLHENV,
        attribute: SQLINTEGER,
        value: SQLPOINTER,
        string_length: SQLINTEGER,
    ) -> SQLRETURN;

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
    ) -> SQLRETURN;

    unsafe fn driver_connect(
        &self,
        dbc: SQLHDBC,
        window: SQLHWND,
        in_connection_string: *const SQLWCHAR,
        string_length1: SQLSMALLINT,
        out_connection_string: *mut SQLWCHAR,
        buffer_length: SQLSMALLINT,
        string_length2: *mut SQLSMALLINT,
        driver_completion: SQLUSMALLINT,
    ) -> SQLRETURN;

    unsafe fn disconnect(&self, dbc: SQLHDBC) -> SQLRETURN;

    unsafe fn set_connect_attr(
        &self,
        dbc: SQLHDBC,
        attribute: SQLINTEGER,
        value: SQLPOINTER,
        string_length: SQLINTEGER,
    ) -> SQLRETURN;

    unsafe fn end_tran(
        &self,
        handle_type: SQLSMALLINT,
        handle: SQLHANDLE,
        completion_type: SQLSMALLINT,
    ) -> SQLRETURN;

    unsafe fn get_info(
        &self,
        dbc: SQLHDBC,
        info_type: SQLUSMALLINT,
        info_value: SQLPOINTER,
        buffer_length: SQLSMALLINT,
        string_length: *mut SQLSMALLINT,
    ) -> SQLRETURN;

    unsafe fn prepare(
        &self,
        stmt: SQLHSTMT,
        text: *const SQLWCHAR,
        text_length: SQLINTEGER,
    ) -> SQLRETURN;

    unsafe fn exec_direct(
        &self,
        stmt: SQLHSTMT,
        text: *const SQLWCHAR,
        text_length: SQLINTEGER,
    ) -> SQLRETURN;

    unsafe fn execute(&self, stmt: SQLHSTMT) -> SQLRETURN;

    unsafe fn num_params(&self, stmt: SQLHSTMT, count: *mut SQLSMALLINT) -> SQLRETURN;

    unsafe fn describe_param(
        &self,
        stmt: SQLHSTMT,
        param_number: SQLUSMALLINT,
        data_type: *mut SQLSMALLINT,
        param_size: *mut SQLULEN,
        decimal_digits: *mut SQLSMALLINT,
        nullable: *mut SQLSMALLINT,
    ) -> SQLRETURN;

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
    ) -> SQLRETURN;

    unsafe fn free_stmt(&self, stmt: SQLHSTMT, option: SQLUSMALLINT) -> SQLRETURN;

    unsafe fn num_result_cols(&self, stmt: SQLHSTMT, count: *mut SQLSMALLINT) -> SQLRETURN;

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
    ) -> SQLRETURN;

    unsafe fn col_attribute(
        &self,
        stmt: SQLHSTMT,
        column_number: SQLUSMALLINT,
        field_identifier: SQLUSMALLINT,
        character_attribute: SQLPOINTER,
        buffer_length: SQLSMALLINT,
        string_length: *mut SQLSMALLINT,
        numeric_attribute: *mut SQLLEN,
    ) -> SQLRETURN;

    unsafe fn fetch(&self, stmt: SQLHSTMT) -> SQLRETURN;

    unsafe fn get_data(
        &self,
        stmt: SQLHSTMT,
        column_number: SQLUSMALLINT,
        target_type: SQLSMALLINT,
        target_value: SQLPOINTER,
        buffer_length: SQLLEN,
        str_len_or_ind: *mut SQLLEN,
    ) -> SQLRETURN;

    unsafe fn row_count(&self, stmt: SQLHSTMT, count: *mut SQLLEN) -> SQLRETURN;

    unsafe fn more_results(&self, stmt: SQLHSTMT) -> SQLRETURN;

    unsafe fn cancel(&self, stmt: SQLHSTMT) -> SQLRETURN;

    unsafe fn set_stmt_attr(
        &self,
        stmt: SQLHSTMT,
        attribute: SQLINTEGER,
        value: SQLPOINTER,
        string_length: SQLINTEGER,
    ) -> SQLRETURN;
}
