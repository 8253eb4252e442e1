//! SMTP reply parser.
//!
//! Reply grammar: `<3-digit code><'-' or ' '><text>`. A logical reply may span
//! several lines; every line but the last carries a non-space separator, and
//! only the last line's code is authoritative.

use crate::error::{Error, Result};
use crate::types::{Reply, ReplyCode};

/// One parsed reply line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplyLine<'a> {
    /// Status code.
    pub code: ReplyCode,
    /// True when this line ends the logical reply.
    pub is_last: bool,
    /// Text after the separator.
    pub text: &'a str,
}

/// Strips the trailing CRLF (or bare LF) from a raw line.
#[must_use]
pub fn trim_line_ending(line: &str) -> &str {
    line.trim_end_matches(['\r', '\n'])
}

/// Parses a single reply line.
///
/// The first three characters must be digits forming a code in `100..=599`.
/// A space (or nothing at all) in the fourth position marks the final line.
///
/// # Errors
///
/// Returns [`Error::MalformedReply`] if the code is missing or not numeric.
pub fn parse_reply_line(line: &str) -> Result<ReplyLine<'_>> {
    let line = trim_line_ending(line);

    let digits = line
        .get(..3)
        .filter(|d| d.bytes().all(|b| b.is_ascii_digit()))
        .ok_or_else(|| Error::MalformedReply(line.to_string()))?;

    let code = digits
        .parse::<u16>()
        .ok()
        .and_then(ReplyCode::new)
        .ok_or_else(|| Error::MalformedReply(line.to_string()))?;

    let mut rest = line[3..].chars();
    let is_last = matches!(rest.next(), None | Some(' '));

    Ok(ReplyLine {
        code,
        is_last,
        text: rest.as_str(),
    })
}

/// Checks if a line is the last line of a multi-line reply.
///
/// Lines without a numeric code, or too short to carry a separator, are
/// treated as final so that the caller parses (and rejects or accepts) them
/// instead of waiting for more.
#[must_use]
pub fn is_last_reply_line(line: &str) -> bool {
    let bytes = trim_line_ending(line).as_bytes();
    bytes.len() <= 3 || bytes[3] == b' ' || !bytes[..3].iter().all(u8::is_ascii_digit)
}

/// Parses a complete reply from its lines.
///
/// Only the final line is validated; earlier lines contribute their text.
///
/// # Errors
///
/// Returns an error if `lines` is empty or the final line is malformed.
pub fn parse_reply(lines: &[String]) -> Result<Reply> {
    let (last, earlier) = lines
        .split_last()
        .ok_or_else(|| Error::MalformedReply("Empty reply".into()))?;

    let final_line = parse_reply_line(last)?;

    let mut message: Vec<String> = earlier
        .iter()
        .map(|line| {
            let line = trim_line_ending(line);
            line.get(4..).unwrap_or_default().to_string()
        })
        .collect();
    message.push(final_line.text.to_string());

    Ok(Reply::new(final_line.code, message))
}
