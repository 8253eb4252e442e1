//! MIME encoding and decoding utilities.
//!
//! Supports Base64, Quoted-Printable, and RFC 2047 header encoding.

use crate::error::{Error, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::fmt::Write as _;

/// Maximum encoded line length for Base64 and Quoted-Printable bodies.
pub const MAX_LINE_LENGTH: usize = 76;

/// Raw bytes carried by one RFC 2047 encoded word (52 Base64 characters).
const ENCODED_WORD_CHUNK: usize = 39;

/// Encodes data as Base64 on a single line.
#[must_use]
pub fn encode_base64(data: &[u8]) -> String {
    STANDARD.encode(data)
}

/// Encodes data as Base64, wrapped at [`MAX_LINE_LENGTH`] with CRLF.
///
/// No line break follows the last line.
#[must_use]
pub fn encode_base64_wrapped(data: &[u8]) -> String {
    let encoded = STANDARD.encode(data);
    let mut result = String::with_capacity(encoded.len() + 2 * (encoded.len() / MAX_LINE_LENGTH));

    for (i, line) in encoded.as_bytes().chunks(MAX_LINE_LENGTH).enumerate() {
        if i > 0 {
            result.push_str("\r\n");
        }
        result.push_str(&String::from_utf8_lossy(line));
    }

    result
}

/// Decodes Base64 data, ignoring embedded whitespace and line breaks.
///
/// # Errors
///
/// Returns an error if the input is not valid Base64.
pub fn decode_base64(data: &str) -> Result<Vec<u8>> {
    let cleaned: String = data.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    STANDARD.decode(cleaned).map_err(Into::into)
}

/// Encodes text using Quoted-Printable encoding (RFC 2045).
#[must_use]
pub fn encode_quoted_printable(text: &str) -> String {
    encode_quoted_printable_bytes(text.as_bytes())
}

/// Encodes bytes using Quoted-Printable encoding (RFC 2045).
///
/// - CRLF pairs are kept as hard line breaks.
/// - `=`, control bytes (lone CR and LF included), DEL and bytes >= 0x80 are
///   written as `=XX`.
/// - Space and tab are escaped when a line break or the end of input
///   follows them.
/// - Soft line breaks (`=` CRLF) keep every line within [`MAX_LINE_LENGTH`].
#[must_use]
pub fn encode_quoted_printable_bytes(data: &[u8]) -> String {
    let mut result = String::with_capacity(data.len() + data.len() / 2);
    let mut line_length = 0;
    let mut i = 0;

    while i < data.len() {
        let byte = data[i];

        if byte == b'\r' && data.get(i + 1) == Some(&b'\n') {
            result.push_str("\r\n");
            line_length = 0;
            i += 2;
            continue;
        }

        let before_line_end = match data.get(i + 1) {
            None => true,
            Some(b'\r') => data.get(i + 2) == Some(&b'\n'),
            Some(_) => false,
        };

        let literal = match byte {
            b'!'..=b'<' | b'>'..=b'~' => true,
            b' ' | b'\t' => !before_line_end,
            _ => false,
        };
        let width = if literal { 1 } else { 3 };

        // Leave room for the trailing '=' of a soft break.
        if line_length + width > MAX_LINE_LENGTH - 1 {
            result.push_str("=\r\n");
            line_length = 0;
        }

        if literal {
            result.push(char::from(byte));
        } else {
            let _ = write!(result, "={byte:02X}");
        }
        line_length += width;
        i += 1;
    }

    result
}

/// Decodes Quoted-Printable text (RFC 2045) into bytes.
///
/// # Errors
///
/// Returns an error if the input contains invalid escape sequences.
pub fn decode_quoted_printable_bytes(text: &str) -> Result<Vec<u8>> {
    let bytes = text.as_bytes();
    let mut result = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] != b'=' {
            result.push(bytes[i]);
            i += 1;
            continue;
        }

        // Soft line break
        match bytes.get(i + 1) {
            Some(b'\n') => {
                i += 2;
                continue;
            }
            Some(b'\r') if bytes.get(i + 2) == Some(&b'\n') => {
                i += 3;
                continue;
            }
            _ => {}
        }

        // Hex encoded byte
        let high = bytes.get(i + 1).copied().and_then(hex_value);
        let low = bytes.get(i + 2).copied().and_then(hex_value);
        match (high, low) {
            (Some(high), Some(low)) => {
                result.push(high << 4 | low);
                i += 3;
            }
            _ => {
                return Err(Error::InvalidEncoding(format!(
                    "Invalid escape sequence at offset {i}"
                )));
            }
        }
    }

    Ok(result)
}

/// Decodes Quoted-Printable text (RFC 2045) into a UTF-8 string.
///
/// # Errors
///
/// Returns an error for invalid escapes or if the result is not UTF-8.
pub fn decode_quoted_printable(text: &str) -> Result<String> {
    String::from_utf8(decode_quoted_printable_bytes(text)?).map_err(Into::into)
}

fn hex_value(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        _ => None,
    }
}

/// Encodes a header value using RFC 2047 `B` encoding if needed.
///
/// Pure ASCII text is returned unchanged as a single word. Otherwise the text
/// is split on character boundaries into encoded words of the form
/// `=?charset?B?encoded-text?=`, each short enough to sit on its own folded
/// header line.
#[must_use]
pub fn encode_rfc2047(text: &str, charset: &str) -> Vec<String> {
    if text.is_ascii() {
        return vec![text.to_string()];
    }

    let mut words = Vec::new();
    let mut chunk_start = 0;
    let mut chunk_end = 0;

    for (offset, ch) in text.char_indices() {
        let next_end = offset + ch.len_utf8();
        if next_end - chunk_start > ENCODED_WORD_CHUNK && chunk_end > chunk_start {
            words.push(encoded_word(&text[chunk_start..chunk_end], charset));
            chunk_start = chunk_end;
        }
        chunk_end = next_end;
    }
    words.push(encoded_word(&text[chunk_start..chunk_end], charset));

    words
}

fn encoded_word(text: &str, charset: &str) -> String {
    format!("=?{charset}?B?{}?=", encode_base64(text.as_bytes()))
}
