//! ODBC C ABI types and constants used across the crate.

#![allow(non_camel_case_types)]

use std::os::raw::c_void;

pub type SQLSMALLINT = i16;
pub type SQLUSMALLINT = u16;
pub type SQLINTEGER = i32;
pub type SQLUINTEGER = u32;
pub type SQLLEN = isize;
pub type SQLULEN = usize;
pub type SQLRETURN = i16;
pub type SQLPOINTER = *mut c_void;
pub type SQLHANDLE = *mut c_void;
pub type SQLHENV = SQLHANDLE;
pub type SQLHDBC = SQLHANDLE;
pub type SQLHSTMT = SQLHANDLE;
pub type SQLHWND = *mut c_void;
pub type SQLCHAR = u8;
pub type SQLWCHAR = u16;

// Return codes
pub const SQL_SUCCESS: SQLRETURN = 0;
pub const SQL_SUCCESS_WITH_INFO: SQLRETURN = 1;
pub const SQL_STILL_EXECUTING: SQLRETURN = 2;
pub const SQL_NEED_DATA: SQLRETURN = 99;
pub const SQL_NO_DATA: SQLRETURN = 100;
pub const SQL_ERROR: SQLRETURN = -1;
pub const SQL_INVALID_HANDLE: SQLRETURN = -2;

// Handle types
pub const SQL_HANDLE_ENV: SQLSMALLINT = 1;
pub const SQL_HANDLE_DBC: SQLSMALLINT = 2;
pub const SQL_HANDLE_STMT: SQLSMALLINT = 3;

// Length / indicator sentinels
pub const SQL_NTS: SQLINTEGER = -3;
pub const SQL_NULL_DATA: SQLLEN = -1;
pub const SQL_DATA_AT_EXEC: SQLLEN = -2;
pub const SQL_NO_TOTAL: SQLLEN = -4;
pub const SQL_IS_UINTEGER: SQLINTEGER = -5;
pub const SQL_MAX_MESSAGE_LENGTH: SQLSMALLINT = 512;

// Environment attributes
pub const SQL_ATTR_ODBC_VERSION: SQLINTEGER = 200;
pub const SQL_OV_ODBC2: SQLINTEGER = 2;
pub const SQL_OV_ODBC3: SQLINTEGER = 3;
pub const SQL_OV_ODBC3_80: SQLINTEGER = 380;

// Connection attributes
pub const SQL_ATTR_AUTOCOMMIT: SQLINTEGER = 102;
pub const SQL_AUTOCOMMIT_OFF: SQLULEN = 0;
pub const SQL_AUTOCOMMIT_ON: SQLULEN = 1;
pub const SQL_DRIVER_NOPROMPT: SQLUSMALLINT = 0;

// Statement attributes
pub const SQL_ATTR_CURSOR_SCROLLABLE: SQLINTEGER = -1;
pub const SQL_NONSCROLLABLE: SQLULEN = 0;
pub const SQL_SCROLLABLE: SQLULEN = 1;

// SQLEndTran completion types
pub const SQL_COMMIT: SQLSMALLINT = 0;
pub const SQL_ROLLBACK: SQLSMALLINT = 1;

// SQLFreeStmt options
pub const SQL_CLOSE: SQLUSMALLINT = 0;
pub const SQL_DROP: SQLUSMALLINT = 1;
pub const SQL_UNBIND: SQLUSMALLINT = 2;
pub const SQL_RESET_PARAMS: SQLUSMALLINT = 3;

// Parameter direction
pub const SQL_PARAM_INPUT: SQLSMALLINT = 1;

// SQLGetInfo types
pub const SQL_DATA_SOURCE_NAME: SQLUSMALLINT = 2;
pub const SQL_DRIVER_NAME: SQLUSMALLINT = 6;
pub const SQL_DRIVER_VER: SQLUSMALLINT = 7;
pub const SQL_SERVER_NAME: SQLUSMALLINT = 13;
pub const SQL_DATABASE_NAME: SQLUSMALLINT = 16;
pub const SQL_DBMS_NAME: SQLUSMALLINT = 17;
pub const SQL_DBMS_VER: SQLUSMALLINT = 18;
pub const SQL_USER_NAME: SQLUSMALLINT = 47;
pub const SQL_DRIVER_ODBC_VER: SQLUSMALLINT = 77;

// Descriptor fields for SQLColAttribute
pub const SQL_DESC_CONCISE_TYPE: SQLUSMALLINT = 2;
pub const SQL_DESC_COUNT: SQLUSMALLINT = 1001;
pub const SQL_DESC_TYPE: SQLUSMALLINT = 1002;
pub const SQL_DESC_LENGTH: SQLUSMALLINT = 1003;
pub const SQL_DESC_PRECISION: SQLUSMALLINT = 1005;
pub const SQL_DESC_SCALE: SQLUSMALLINT = 1006;
pub const SQL_DESC_NULLABLE: SQLUSMALLINT = 1008;
pub const SQL_DESC_NAME: SQLUSMALLINT = 1011;
pub const SQL_DESC_OCTET_LENGTH: SQLUSMALLINT = 1013;

// Nullability
pub const SQL_NO_NULLS: SQLSMALLINT = 0;
pub const SQL_NULLABLE: SQLSMALLINT = 1;
pub const SQL_NULLABLE_UNKNOWN: SQLSMALLINT = 2;

// SQL data types
pub const SQL_UNKNOWN_TYPE: SQLSMALLINT = 0;
pub const SQL_CHAR: SQLSMALLINT = 1;
pub const SQL_NUMERIC: SQLSMALLINT = 2;
pub const SQL_DECIMAL: SQLSMALLINT = 3;
pub const SQL_INTEGER: SQLSMALLINT = 4;
pub const SQL_SMALLINT: SQLSMALLINT = 5;
pub const SQL_FLOAT: SQLSMALLINT = 6;
pub const SQL_REAL: SQLSMALLINT = 7;
pub const SQL_DOUBLE: SQLSMALLINT = 8;
pub const SQL_DATETIME: SQLSMALLINT = 9;
pub const SQL_VARCHAR: SQLSMALLINT = 12;
pub const SQL_TYPE_DATE: SQLSMALLINT = 91;
pub const SQL_TYPE_TIME: SQLSMALLINT = 92;
pub const SQL_TYPE_TIMESTAMP: SQLSMALLINT = 93;
pub const SQL_LONGVARCHAR: SQLSMALLINT = -1;
pub const SQL_BINARY: SQLSMALLINT = -2;
pub const SQL_VARBINARY: SQLSMALLINT = -3;
pub const SQL_LONGVARBINARY: SQLSMALLINT = -4;
pub const SQL_BIGINT: SQLSMALLINT = -5;
pub const SQL_TINYINT: SQLSMALLINT = -6;
pub const SQL_BIT: SQLSMALLINT = -7;
pub const SQL_WCHAR: SQLSMALLINT = -8;
pub const SQL_WVARCHAR: SQLSMALLINT = -9;
pub const SQL_WLONGVARCHAR: SQLSMALLINT = -10;
pub const SQL_GUID: SQLSMALLINT = -11;

// C data types
const SQL_SIGNED_OFFSET: SQLSMALLINT = -20;
pub const SQL_C_CHAR: SQLSMALLINT = SQL_CHAR;
pub const SQL_C_NUMERIC: SQLSMALLINT = SQL_NUMERIC;
pub const SQL_C_LONG: SQLSMALLINT = SQL_INTEGER;
pub const SQL_C_SHORT: SQLSMALLINT = SQL_SMALLINT;
pub const SQL_C_FLOAT: SQLSMALLINT = SQL_REAL;
pub const SQL_C_DOUBLE: SQLSMALLINT = SQL_DOUBLE;
pub const SQL_C_DEFAULT: SQLSMALLINT = 99;
pub const SQL_C_BIT: SQLSMALLINT = SQL_BIT;
pub const SQL_C_BINARY: SQLSMALLINT = SQL_BINARY;
pub const SQL_C_WCHAR: SQLSMALLINT = SQL_WCHAR;
pub const SQL_C_SLONG: SQLSMALLINT = SQL_C_LONG + SQL_SIGNED_OFFSET;
pub const SQL_C_SBIGINT: SQLSMALLINT = SQL_BIGINT + SQL_SIGNED_OFFSET;
pub const SQL_C_TYPE_DATE: SQLSMALLINT = SQL_TYPE_DATE;
pub const SQL_C_TYPE_TIME: SQLSMALLINT = SQL_TYPE_TIME;
pub const SQL_C_TYPE_TIMESTAMP: SQLSMALLINT = SQL_TYPE_TIMESTAMP;

/// `SQL_TIMESTAMP_STRUCT`
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SqlTimestampStruct {
    pub year: SQLSMALLINT,
    pub month: SQLUSMALLINT,
    pub day: SQLUSMALLINT,
    pub hour: SQLUSMALLINT,
    pub minute: SQLUSMALLINT,
    pub second: SQLUSMALLINT,
    pub fraction: SQLUINTEGER, // nanoseconds
}

pub const SQL_MAX_NUMERIC_LEN: usize = 16;

/// `SQL_NUMERIC_STRUCT`: precision, scale, sign (1 = positive) and a
/// little-endian scaled magnitude. 19 bytes, no padding.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SqlNumericStruct {
    pub precision: SQLCHAR,
    pub scale: i8,
    pub sign: SQLCHAR,
    pub val: [SQLCHAR; SQL_MAX_NUMERIC_LEN],
}

pub const SQL_NUMERIC_STRUCT_LEN: usize = std::mem::size_of::<SqlNumericStruct>();
