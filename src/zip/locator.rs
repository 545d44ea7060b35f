//! End of Central Directory lookup.
//!
//! The EOCD record is followed by a variable-length comment, so its offset
//! cannot be computed from the archive size and has to be found by scanning
//! backwards from the tail.

use byteorder::{ByteOrder, LittleEndian};

use super::structures::{END_CENTRAL_DIR_SIGNATURE, LOCAL_FILE_SIGNATURE};

/// Whether `buf` starts with a Local File Header signature.
pub fn has_local_file_signature(buf: &[u8]) -> bool {
    buf.len() >= 4 && LittleEndian::read_u32(&buf[..4]) == LOCAL_FILE_SIGNATURE
}

/// Find the offset of the last EOCD signature in `buf`.
///
/// The scan starts 4 bytes before the end and walks back one byte at a time.
/// Offset 0 is never a candidate.
pub fn find_end_central_dir(buf: &[u8]) -> Option<usize> {
    let last = buf.len().checked_sub(4)?;
    (1..=last).rev().find(|&offset| {
        LittleEndian::read_u32(&buf[offset..offset + 4]) == END_CENTRAL_DIR_SIGNATURE
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const EOCD: &[u8] = b"PK\x05\x06";

    #[test]
    fn test_finds_record_at_tail() {
        let mut buf = b"PK\x03\x04 some data".to_vec();
        let expected = buf.len();
        buf.extend_from_slice(EOCD);
        buf.extend_from_slice(&[0u8; 18]);
        assert_eq!(find_end_central_dir(&buf), Some(expected));
    }

    #[test]
    fn test_finds_record_before_comment() {
        let mut buf = b"PK\x03\x04 some data".to_vec();
        let expected = buf.len();
        buf.extend_from_slice(EOCD);
        buf.extend_from_slice(&[0u8; 16]);
        buf.extend_from_slice(&9u16.to_le_bytes());
        buf.extend_from_slice(b"a comment");
        assert_eq!(find_end_central_dir(&buf), Some(expected));
    }

    #[test]
    fn test_signature_in_last_four_bytes() {
        let mut buf = vec![0u8; 10];
        buf.extend_from_slice(EOCD);
        assert_eq!(find_end_central_dir(&buf), Some(10));
    }

    #[test]
    fn test_missing_or_leading_signature() {
        assert_eq!(find_end_central_dir(b"PK\x03\x04 no trailer here"), None);
        assert_eq!(find_end_central_dir(EOCD), None);
        assert_eq!(find_end_central_dir(b"PK"), None);
        assert_eq!(find_end_central_dir(b""), None);
    }

    #[test]
    fn test_local_signature() {
        assert!(has_local_file_signature(b"PK\x03\x04rest"));
        assert!(!has_local_file_signature(b"PK\x05\x06rest"));
        assert!(!has_local_file_signature(b"PK\x03"));
    }
}
