//! Text decoding for dictionaries and input files.
//!
//! Encodings are named with WHATWG labels (`"shift_jis"`, `"windows-1252"`,
//! ...). When no label is configured the encoding is sniffed from a BOM or
//! guessed from the content.

use crate::errors::EngineError;
use chardetng::EncodingDetector;
use encoding_rs::Encoding;
use std::path::Path;

/// Labels offered to users; every one resolves with [`Encoding::for_label`].
pub const COMMON_LABELS: &[(&str, &str)] = &[
    ("utf-8", "Unicode (UTF-8)"),
    ("utf-16le", "Unicode (UTF-16 little endian)"),
    ("utf-16be", "Unicode (UTF-16 big endian)"),
    ("windows-1252", "Western (Windows-1252)"),
    ("shift_jis", "Japanese (Shift_JIS / CP932)"),
    ("euc-jp", "Japanese (EUC-JP)"),
    ("gbk", "Chinese simplified (GBK)"),
    ("gb18030", "Chinese simplified (GB18030)"),
    ("big5", "Chinese traditional (Big5)"),
    ("iso-8859-1", "Western (ISO-8859-1)"),
    ("iso-8859-2", "Central European (ISO-8859-2)"),
];

/// Resolve a configured label, or detect the encoding of `bytes` when there is none.
pub fn resolve(label: Option<&str>, bytes: &[u8]) -> Result<&'static Encoding, EngineError> {
    match label.map(str::trim).filter(|l| !l.is_empty()) {
        Some(label) => Encoding::for_label(label.as_bytes())
            .ok_or_else(|| EngineError::UnknownEncoding(label.to_string())),
        None => Ok(detect(bytes)),
    }
}

/// BOM first, then a statistical guess.
pub fn detect(bytes: &[u8]) -> &'static Encoding {
    if let Some((encoding, _)) = Encoding::for_bom(bytes) {
        return encoding;
    }
    let mut detector = EncodingDetector::new();
    detector.feed(bytes, true);
    let encoding = detector.guess(None, true);
    log::debug!("detected encoding {}", encoding.name());
    encoding
}

/// Decode without replacement; malformed input is an error.
pub fn decode_strict(
    bytes: &[u8],
    encoding: &'static Encoding,
    path: &Path,
) -> Result<String, EngineError> {
    let (text, had_errors) = encoding.decode_with_bom_removal(bytes);
    if had_errors {
        return Err(EngineError::EncodingFailure {
            path: path.to_path_buf(),
            encoding: encoding.name().to_string(),
        });
    }
    Ok(text.into_owned())
}

/// Decode, replacing malformed sequences with U+FFFD.
pub fn decode_lossy(bytes: &[u8], encoding: &'static Encoding, path: &Path) -> String {
    let (text, actual, had_errors) = encoding.decode(bytes);
    if had_errors {
        log::warn!(
            "{} is not valid {}; malformed sequences were replaced",
            path.display(),
            actual.name()
        );
    }
    text.into_owned()
}
