//! Value-field codec for patch rows.
//!
//! A value is either a list of hex byte tokens (`"0xAA 0xBB"`, `"48,65,6C"`)
//! or literal text. Anything that does not parse cleanly as hex bytes is
//! treated as UTF-8 text, so decoding never fails.

/// Decode a value field into raw bytes.
///
/// The field is split on whitespace and commas. With two or more tokens that
/// are all `0x`-prefixed or made of hex digits only, each token becomes one
/// byte. Otherwise the trimmed field is encoded as UTF-8.
///
/// # Examples
///
/// ```
/// use text_replacer::hex::decode;
///
/// assert_eq!(decode("0xAA 0xBB"), vec![0xAA, 0xBB]);
/// assert_eq!(decode("48, 65, 6C"), b"Hel".to_vec());
/// assert_eq!(decode("Hello"), b"Hello".to_vec());
/// // a single token is never read as hex
/// assert_eq!(decode("41"), b"41".to_vec());
/// ```
pub fn decode(field: &str) -> Vec<u8> {
    let field = field.trim();
    let tokens: Vec<&str> = field
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|t| !t.is_empty())
        .collect();

    if tokens.len() > 1 && tokens.iter().all(|t| looks_like_hex(t)) {
        if let Some(bytes) = parse_tokens(&tokens) {
            return bytes;
        }
    }

    field.as_bytes().to_vec()
}

/// Render bytes as space-separated `0xNN` tokens.
///
/// The output decodes back to the same bytes whenever there are at least two
/// of them; a single byte renders as one token, which [`decode`] reads as text.
pub fn encode(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("0x{b:02X}"))
        .collect::<Vec<_>>()
        .join(" ")
}

fn looks_like_hex(token: &str) -> bool {
    has_hex_prefix(token) || token.chars().all(|c| c.is_ascii_hexdigit())
}

fn has_hex_prefix(token: &str) -> bool {
    token.starts_with("0x") || token.starts_with("0X")
}

fn parse_tokens(tokens: &[&str]) -> Option<Vec<u8>> {
    tokens
        .iter()
        .map(|t| {
            let digits = if has_hex_prefix(t) { &t[2..] } else { t };
            u8::from_str_radix(digits, 16).ok()
        })
        .collect()
}
