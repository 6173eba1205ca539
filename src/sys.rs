//! [`NativeApi`] over the system driver manager.

use crate::api::NativeApi;
use crate::types::*;

#[allow(non_snake_case)]
#[cfg_attr(windows, link(name = "odbc32"))]
#[cfg_attr(not(windows), link(name = "odbc"))]
extern "system" {
    fn SQLAllocHandle(
        handle_type: SQLSMALLINT,
        input_handle: SQLHANDLE,
        output_handle: *mut SQLHANDLE,
    ) -> SQLRETURN;
    fn SQLFreeHandle(handle_type: SQLSMALLINT, handle: SQLHANDLE) -> SQLRETURN;
    fn SQLSetEnvAttr(
        env: SQLHENV,
        attribute: SQLINTEGER,
        value: SQLPOINTER,
        string_length: SQLINTEGER,
    ) -> SQLRETURN;
    fn SQLGetDiagRecW(
        handle_type: SQLSMALLINT,
        handle: SQLHANDLE,
        rec_number: SQLSMALLINT,
        state: *mut SQLWCHAR,
        native_error: *mut SQLINTEGER,
        message_text: *mut SQLWCHAR,
        buffer_length: SQLSMALLINT,
        text_length: *mut SQLSMALLINT,
    ) -> SQLRETURN;
    fn SQLDriverConnectW(
        dbc: SQLHDBC,
        window: SQLHWND,
        in_connection_string: *const SQLWCHAR,
        string_length1: SQLSMALLINT,
        out_connection_string: *mut SQLWCHAR,
        buffer_length: SQLSMALLINT,
        string_length2: *mut SQLSMALLINT,
        driver_completion: SQLUSMALLINT,
    ) -> SQLRETURN;
    fn SQLDisconnect(dbc: SQLHDBC) -> SQLRETURN;
    fn SQLSetConnectAttrW(
        dbc: SQLHDBC,
        attribute: SQLINTEGER,
        value: SQLPOINTER,
        string_length: SQLINTEGER,
    ) -> SQLRETURN;
    fn SQLEndTran(
        handle_type: SQLSMALLINT,
        handle: SQLHANDLE,
        completion_type: SQLSMALLINT,
    ) -> SQLRETURN;
    fn SQLGetInfoW(
        dbc: SQLHDBC,
        info_type: SQLUSMALLINT,
        info_value: SQLPOINTER,
        buffer_length: SQLSMALLINT,
        string_length: *mut SQLSMALLINT,
    ) -> SQLRETURN;
    fn SQLPrepareW(stmt: SQLHSTMT, text: *const SQLWCHAR, text_length: SQLINTEGER) -> SQLRETURN;
    fn SQLExecDirectW(stmt: SQLHSTMT, text: *const SQLWCHAR, text_length: SQLINTEGER)
        -> SQLRETURN;
    fn SQLExecute(stmt: SQLHSTMT) -> SQLRETURN;
    fn SQLNumParams(stmt: SQLHSTMT, count: *mut SQLSMALLINT) -> SQLRETURN;
    fn SQLDescribeParam(
        stmt: SQLHSTMT,
        param_number: SQLUSMALLINT,
        data_type: *mut SQLSMALLINT,
        param_size: *mut SQLULEN,
        decimal_digits: *mut SQLSMALLINT,
        nullable: *mut SQLSMALLINT,
    ) -> SQLRETURN;
    fn SQLBindParameter(
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
    fn SQLFreeStmt(stmt: SQLHSTMT, option: SQLUSMALLINT) -> SQLRETURN;
    fn SQLNumResultCols(stmt: SQLHSTMT, count: *mut SQLSMALLINT) -> SQLRETURN;
    fn SQLDescribeColW(
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
    fn SQLColAttributeW(
        stmt: SQLHSTMT,
        column_number: SQLUSMALLINT,
        field_identifier: SQLUSMALLINT,
        character_attribute: SQLPOINTER,
        buffer_length: SQLSMALLINT,
        string_length: *mut SQLSMALLINT,
        numeric_attribute: *mut SQLLEN,
    ) -> SQLRETURN;
    fn SQLFetch(stmt: SQLHSTMT) -> SQLRETURN;
    fn SQLGetData(
        stmt: SQLHSTMT,
        column_number: SQLUSMALLINT,
        target_type: SQLSMALLINT,
        target_value: SQLPOINTER,
        buffer_length: SQLLEN,
        str_len_or_ind: *mut SQLLEN,
    ) -> SQLRETURN;
    fn SQLRowCount(stmt: SQLHSTMT, count: *mut SQLLEN) -> SQLRETURN;
    fn SQLMoreResults(stmt: SQLHSTMT) -> SQLRETURN;
    fn SQLCancel(stmt: SQLHSTMT) -> SQLRETURN;
    fn SQLSetStmtAttrW(
        stmt: SQLHSTMT,
        attribute: SQLINTEGER,
        value: SQLPOINTER,
        string_length: SQLINTEGER,
    ) -> SQLRETURN;
}

/// The platform driver manager (`libodbc` / `odbc32`).
#[derive(Debug, Clone, Copy, Default)]
pub struct DriverManager;

impl NativeApi for DriverManager {
    unsafe fn alloc_handle(
        &self,
        handle_type: SQLSMALLINT,
        input_handle: SQLHANDLE,
        output_handle: *mut SQLHANDLE,
    ) -> SQLRETURN {
        SQLAllocHandle(handle_type, input_handle, output_handle)
    }

    unsafe fn free_handle(&self, handle_type: SQLSMALLINT, handle: SQLHANDLE) -> SQLRETURN {
        SQLFreeHandle(handle_type, handle)
    }

    unsafe fn set_env_attr(
        &self,
        env: SQLHENV,
        attribute: SQLINTEGER,
        value: SQLPOINTER,
        string_length: SQLINTEGER,
    ) -> SQLRETURN {
        SQLSetEnvAttr(env, attribute, value, string_length)
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
        SQLGetDiagRecW(
            handle_type,
            handle,
            rec_number,
            state,
            native_error,
            message_text,
            buffer_length,
            text_length,
        )
    }

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
    ) -> SQLRETURN {
        SQLDriverConnectW(
            dbc,
            window,
            in_connection_string,
            string_length1,
            out_connection_string,
            buffer_length,
            string_length2,
            driver_completion,
        )
    }

    unsafe fn disconnect(&self, dbc: SQLHDBC) -> SQLRETURN {
        SQLDisconnect(dbc)
    }

    unsafe fn set_connect_attr(
        &self,
        dbc: SQLHDBC,
        attribute: SQLINTEGER,
        value: SQLPOINTER,
        string_length: SQLINTEGER,
    ) -> SQLRETURN {
        SQLSetConnectAttrW(dbc, attribute, value, string_length)
    }

    unsafe fn end_tran(
        &self,
        handle_type: SQLSMALLINT,
        handle: SQLHANDLE,
        completion_type: SQLSMALLINT,
    ) -> SQLRETURN {
        SQLEndTran(handle_type, handle, completion_type)
    }

    unsafe fn get_info(
        &self,
        dbc: SQLHDBC,
        info_type: SQLUSMALLINT,
        info_value: SQLPOINTER,
        buffer_length: SQLSMALLINT,
        string_length: *mut SQLSMALLINT,
    ) -> SQLRETURN {
        SQLGetInfoW(dbc, info_type, info_value, buffer_length, string_length)
    }

    unsafe fn prepare(
        &self,
        stmt: SQLHSTMT,
        text: *const SQLWCHAR,
        text_length: SQLINTEGER,
    ) -> SQLRETURN {
        SQLPrepareW(stmt, text, text_length)
    }

    unsafe fn exec_direct(
        &self,
        stmt: SQLHSTMT,
        text: *const SQLWCHAR,
        text_length: SQLINTEGER,
    ) -> SQLRETURN {
        SQLExecDirectW(stmt, text, text_length)
    }

    unsafe fn execute(&self, stmt: SQLHSTMT) -> SQLRETURN {
        SQLExecute(stmt)
    }

    unsafe fn num_params(&self, stmt: SQLHSTMT, count: *mut SQLSMALLINT) -> SQLRETURN {
        SQLNumParams(stmt, count)
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
        SQLDescribeParam(
            stmt,
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
        SQLBindParameter(
            stmt,
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
    }

    unsafe fn free_stmt(&self, stmt: SQLHSTMT, option: SQLUSMALLINT) -> SQLRETURN {
        SQLFreeStmt(stmt, option)
    }

    unsafe fn num_result_cols(&self, stmt: SQLHSTMT, count: *mut SQLSMALLINT) -> SQLRETURN {
        SQLNumResultCols(stmt, count)
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
        SQLDescribeColW(
            stmt,
            column_number,
            column_name,
            buffer_length,
            name_length,
            data_type,
            column_size,
            decimal_digits,
            nullable,
        )
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
        SQLColAttributeW(
            stmt,
            column_number,
            field_identifier,
            character_attribute,
            buffer_length,
            string_length,
            numeric_attribute,
        )
    }

    unsafe fn fetch(&self, stmt: SQLHSTMT) -> SQLRETURN {
        SQLFetch(stmt)
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
        SQLGetData(
            stmt,
            column_number,
            target_type,
            target_value,
            buffer_length,
            str_len_or_ind,
        )
    }

    unsafe fn row_count(&self, stmt: SQLHSTMT, count: *mut SQLLEN) -> SQLRETURN {
        SQLRowCount(stmt, count)
    }

    unsafe fn more_results(&self, stmt: SQLHSTMT) -> SQLRETURN {
        SQLMoreResults(stmt)
    }

    unsafe fn cancel(&self, stmt: SQLHSTMT) -> SQLRETURN {
        SQLCancel(stmt)
    }

    unsafe fn set_stmt_attr(
        &self,
        stmt: SQLHSTMT,
        attribute: SQLINTEGER,
        value: SQLPOINTER,
        string_length: SQLINTEGER,
    ) -> SQLRETURN {
        SQLSetStmtAttrW(stmt, attribute, value, string_length)
    }
}
