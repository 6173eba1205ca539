use widestring::{U16Str, U16String};

use crate::types::SQLWCHAR;

/// Encodes text for the `W` entry points. Not NUL-terminated; pass the length.
pub(crate) fn encode(text: &str) -> U16String {
    U16String::from_str(text)
}

/// Decodes a wide buffer up to the first NUL (or its end).
pub(crate) fn decode(buffer: &[SQLWCHAR]) -> String {
    let end = buffer.iter().position(|&unit| unit == 0).unwrap_or(buffer.len());
    U16Str::from_slice(&buffer[..end]).to_string_lossy()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_stops_at_nul() {
        let mut buffer: Vec<u16> = "abc".encode_utf16().collect();
        buffer.extend_from_slice(&[0, 'x' as u16]);
        assert_eq!(decode(&buffer), "abc");
    }

    #[test]
    fn encode_keeps_surrogate_pairs() {
        let encoded = encode("a\u{1F600}");
        assert_eq!(encoded.len(), 3);
        assert_eq!(decode(encoded.as_slice()), "a\u{1F600}");
    }
}
