use std::ptr;

use crate::diagnostics::DiagnosticRecord;
use crate::types::*;

/// `SQLGetDiagRecW` over one handle's records.
pub(crate) unsafe fn get_diag_rec(
    diagnostics: &[DiagnosticRecord],
    rec_number: SQLSMALLINT,
    sql_state: *mut SQLWCHAR,
    native_error: *mut SQLINTEGER,
    message_text: *mut SQLWCHAR,
    buffer_length: SQLSMALLINT,
    text_length: *mut SQLSMALLINT,
) -> SQLRETURN {
    if rec_number < 1 {
        return SQL_ERROR;
    }
    let Some(rec) = diagnostics.get(rec_number as usize - 1) else {
        return SQL_NO_DATA;
    };

    // SQLSTATE: 5 chars + NUL
    if !sql_state.is_null() {
        let state: Vec<u16> = rec.state.encode_utf16().take(5).collect();
        ptr::copy_nonoverlapping(state.as_ptr(), sql_state, state.len());
        for i in state.len()..6 {
            *sql_state.add(i) = 0;
        }
    }

    if !native_error.is_null() {
        *native_error = rec.native_error;
    }

    let message: Vec<u16> = rec.message.encode_utf16().collect();
    if !text_length.is_null() {
        *text_length = SQLSMALLINT::try_from(message.len()).unwrap_or(SQLSMALLINT::MAX);
    }

    if !message_text.is_null() && buffer_length > 0 {
        let copy_len = message.len().min(buffer_length as usize - 1);
        ptr::copy_nonoverlapping(message.as_ptr(), message_text, copy_len);
        *message_text.add(copy_len) = 0;
        if copy_len < message.len() {
            return SQL_SUCCESS_WITH_INFO;
        }
    }

    SQL_SUCCESS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncates_long_messages() {
        let records = vec![DiagnosticRecord::new("01004", 7, "abcdef")];
        let mut state = [0u16; 6];
        let mut native = 0;
        let mut message = [0u16; 4];
        let mut length = 0;
        let ret = unsafe {
            get_diag_rec(
                &records,
                1,
                state.as_mut_ptr(),
                &mut native,
                message.as_mut_ptr(),
                message.len() as SQLSMALLINT,
                &mut length,
            )
        };
        assert_eq!(ret, SQL_SUCCESS_WITH_INFO);
        assert_eq!(length, 6);
        assert_eq!(native, 7);
        assert_eq!(crate::wide::decode(&state), "01004");
        assert_eq!(crate::wide::decode(&message), "abc");
    }

    #[test]
    fn past_the_end_is_no_data() {
        let ret = unsafe {
            get_diag_rec(
                &[],
                1,
                ptr::null_mut(),
                ptr::null_mut(),
                ptr::null_mut(),
                0,
                ptr::null_mut(),
            )
        };
        assert_eq!(ret, SQL_NO_DATA);
    }
}
