//! Binary detection and decoding utilities.
//!
//! Binary detection using NULL byte scanning.

use memchr::memchr;

use crate::error::IoError;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Binary detection - any NULL byte in the buffer.
///
/// The whole buffer is scanned; callers bound its size before reading.
/// UTF-16 SQL exports also count as binary; the line model is UTF-8 only.
#[must_use]
pub fn is_binary(buffer: &[u8]) -> bool {
    memchr(0, buffer).is_some()
}

fn split_bom(buffer: &mut Vec<u8>) -> Result<bool, IoError> {
    if is_binary(buffer) {
        return Err(IoError::BinaryFile);
    }
    let had_bom = buffer.starts_with(UTF8_BOM);
    if had_bom {
        buffer.drain(..UTF8_BOM.len());
    }
    Ok(had_bom)
}

/// Decode bytes to String, splitting off a leading UTF-8 BOM.
///
/// Returns `(had_bom, text)`. Invalid UTF-8 is an error.
///
/// # Errors
/// `BinaryFile` when binary content is detected, `Encoding` on invalid UTF-8.
pub fn decode_buffer(mut buffer: Vec<u8>) -> Result<(bool, String), IoError> {
    let had_bom = split_bom(&mut buffer)?;
    let text = String::from_utf8(buffer).map_err(|_| IoError::Encoding)?;
    Ok((had_bom, text))
}

/// Like [`decode_buffer`], but invalid UTF-8 sequences become U+FFFD.
///
/// For read-only inputs such as change lists.
///
/// # Errors
/// Returns `IoError::BinaryFile` when binary content is detected.
pub fn decode_buffer_lossy(mut buffer: Vec<u8>) -> Result<(bool, String), IoError> {
    let had_bom = split_bom(&mut buffer)?;
    let text = match String::from_utf8(buffer) {
        Ok(s) => s,
        Err(e) => String::from_utf8_lossy(&e.into_bytes()).into_owned(),
    };
    Ok((had_bom, text))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bom_is_split_off() {
        let (bom, text) = decode_buffer(b"\xEF\xBB\xBFSELECT 1".to_vec()).expect("decode");
        assert!(bom);
        assert_eq!(text, "SELECT 1");
    }

    #[test]
    fn test_utf16_is_binary() {
        // "SE" in UTF-16LE
        assert!(is_binary(b"S\x00E\x00"));
        assert!(matches!(
            decode_buffer(b"S\x00E\x00".to_vec()),
            Err(IoError::BinaryFile)
        ));
    }

    #[test]
    fn test_nul_past_first_block_is_binary() {
        let mut buffer = b"FROM CITI_A..T1\n".to_vec();
        buffer.extend(std::iter::repeat_n(b'-', 9000));
        buffer.extend_from_slice(b"\0\n");
        assert!(is_binary(&buffer));
        assert!(matches!(decode_buffer(buffer), Err(IoError::BinaryFile)));
    }

    #[test]
    fn test_windows_1252_is_rejected() {
        let buffer = b"-- caf\xe9\nFROM CITI_A..T1\n".to_vec();
        assert!(matches!(
            decode_buffer(buffer.clone()),
            Err(IoError::Encoding)
        ));
        let (_, text) = decode_buffer_lossy(buffer).expect("decode");
        assert_eq!(text, "-- caf\u{fffd}\nFROM CITI_A..T1\n");
    }
}
