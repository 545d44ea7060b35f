//! File name encoding: explicit labels, detection and decoding.
//!
//! ZIP writers traditionally store names in the system code page (CP437,
//! Shift_JIS, GBK, ...) and only sometimes in UTF-8. The encoding is resolved
//! once per archive and applied to every name.

use encoding_rs::{Encoding, UTF_8};
use tracing::debug;

use crate::error::{Error, Result};

/// Number of leading file names fed to the detector
pub const DETECTION_SAMPLE: usize = 100;

/// Resolve an encoding label such as `"utf-8"`, `"ms932"` or `"Shift_JIS"`.
pub fn resolve(label: &str) -> Result<&'static Encoding> {
    Encoding::for_label(label.trim().as_bytes())
        .ok_or_else(|| Error::UnknownEncoding(label.to_string()))
}

/// Guess the encoding of a set of raw file names.
///
/// Valid UTF-8 (which includes plain ASCII) is taken as UTF-8, everything
/// else is left to chardetng.
pub fn detect<'n, I>(names: I) -> &'static Encoding
where
    I: IntoIterator<Item = &'n [u8]>,
{
    let sample: Vec<u8> = names
        .into_iter()
        .take(DETECTION_SAMPLE)
        .flat_map(|name| name.iter().copied())
        .collect();

    if std::str::from_utf8(&sample).is_ok() {
        return UTF_8;
    }

    let mut detector = chardetng::EncodingDetector::new();
    detector.feed(&sample, true);
    let encoding = detector.guess(None, true);
    debug!("Guessing file name encoding: picked {}", encoding.name());
    encoding
}

/// Decode a file name, replacing malformed sequences.
pub fn decode(encoding: &'static Encoding, raw: &[u8]) -> String {
    let (text, _) = encoding.decode_without_bom_handling(raw);
    text.into_owned()
}
