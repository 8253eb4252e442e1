//! SMTP reply types.

use std::fmt;

/// SMTP reply from server.
///
/// A reply may span several lines; `message` keeps the text of every line in
/// order, while `code` always comes from the final line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    /// Reply code of the final line (e.g., 250).
    pub code: ReplyCode,
    /// Reply message lines.
    pub message: Vec<String>,
}

impl Reply {
    /// Creates a new reply.
    #[must_use]
    #[allow(clippy::missing_const_for_fn)] // Vec is not const-compatible
    pub fn new(code: ReplyCode, message: Vec<String>) -> Self {
        Self { code, message }
    }

    /// Returns the class of the reply.
    #[must_use]
    pub const fn class(&self) -> ReplyClass {
        self.code.class()
    }

    /// Returns true if this is a success reply (2xx).
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.code.is_success()
    }

    /// Returns true if this is an intermediate reply (3xx).
    #[must_use]
    pub const fn is_intermediate(&self) -> bool {
        self.code.is_intermediate()
    }

    /// Returns true if this is a transient error (4xx).
    #[must_use]
    pub const fn is_transient_error(&self) -> bool {
        self.code.is_transient()
    }

    /// Returns true if this is a permanent error (5xx).
    #[must_use]
    pub const fn is_permanent_error(&self) -> bool {
        self.code.is_permanent()
    }

    /// Returns the text of the final (authoritative) line.
    #[must_use]
    pub fn last_line(&self) -> &str {
        self.message.last().map_or("", String::as_str)
    }

    /// Returns the full message as a single string.
    #[must_use]
    pub fn message_text(&self) -> String {
        self.message.join("\n")
    }
}

/// Reply class: the hundreds digit of a reply code (RFC 5321 §4.2.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReplyClass {
    /// 1yz
    PositivePreliminary,
    /// 2yz
    PositiveCompletion,
    /// 3yz
    PositiveIntermediate,
    /// 4yz
    TransientNegative,
    /// 5yz
    PermanentNegative,
}

impl ReplyClass {
    /// Maps a leading digit to its class.
    #[must_use]
    pub const fn from_digit(digit: u16) -> Option<Self> {
        match digit {
            1 => Some(Self::PositivePreliminary),
            2 => Some(Self::PositiveCompletion),
            3 => Some(Self::PositiveIntermediate),
            4 => Some(Self::TransientNegative),
            5 => Some(Self::PermanentNegative),
            _ => None,
        }
    }

    /// Returns the leading digit of this class.
    #[must_use]
    pub const fn digit(self) -> u16 {
        match self {
            Self::PositivePreliminary => 1,
            Self::PositiveCompletion => 2,
            Self::PositiveIntermediate => 3,
            Self::TransientNegative => 4,
            Self::PermanentNegative => 5,
        }
    }
}

impl fmt::Display for ReplyClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}xx", self.digit())
    }
}

/// SMTP reply code, always in `100..=599`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ReplyCode(u16);

impl ReplyCode {
    /// Creates a reply code, returning `None` outside `100..=599`.
    #[must_use]
    pub const fn new(code: u16) -> Option<Self> {
        if code >= 100 && code < 600 {
            Some(Self(code))
        } else {
            None
        }
    }

    /// Returns the numeric code.
    #[must_use]
    pub const fn as_u16(self) -> u16 {
        self.0
    }

    /// Returns the class of this code.
    #[must_use]
    pub const fn class(self) -> ReplyClass {
        match ReplyClass::from_digit(self.0 / 100) {
            Some(class) => class,
            // Construction keeps codes in 100..=599.
            None => ReplyClass::PermanentNegative,
        }
    }

    /// Returns true if this is a success code (2xx).
    #[must_use]
    pub const fn is_success(self) -> bool {
        self.0 >= 200 && self.0 < 300
    }

    /// Returns true if this is a transient error (4xx).
    #[must_use]
    pub const fn is_transient(self) -> bool {
        self.0 >= 400 && self.0 < 500
    }

    /// Returns true if this is a permanent error (5xx).
    #[must_use]
    pub const fn is_permanent(self) -> bool {
        self.0 >= 500 && self.0 < 600
    }

    /// Returns true if this is an intermediate reply (3xx).
    #[must_use]
    pub const fn is_intermediate(self) -> bool {
        self.0 >= 300 && self.0 < 400
    }
}

impl fmt::Display for ReplyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::redundant_clone, clippy::manual_string_new, clippy::needless_collect, clippy::unreadable_literal, clippy::used_underscore_items, clippy::similar_names)]
mod tests {
    use super::*;

    fn code(n: u16) -> ReplyCode {
        ReplyCode::new(n).unwrap()
    }

    mod reply_code_tests {
        use super::*;

        #[test]
        fn range_is_enforced() {
            assert!(ReplyCode::new(99).is_none());
            assert!(ReplyCode::new(100).is_some());
            assert!(ReplyCode::new(599).is_some());
            assert!(ReplyCode::new(600).is_none());
        }

        #[test]
        fn class_is_hundreds_digit() {
            assert_eq!(
                code(150).class(),
                ReplyClass::PositivePreliminary
            );
            assert_eq!(code(250).class(), ReplyClass::PositiveCompletion);
            assert_eq!(
                code(354).class(),
                ReplyClass::PositiveIntermediate
            );
            assert_eq!(
                code(450).class(),
                ReplyClass::TransientNegative
            );
            assert_eq!(
                code(599).class(),
                ReplyClass::PermanentNegative
            );
        }

        #[test]
        fn success_codes() {
            assert!(code(250).is_success());
            assert!(code(220).is_success());
            assert!(code(235).is_success());
            assert!(!code(250).is_intermediate());
        }

        #[test]
        fn intermediate_codes() {
            assert!(code(334).is_intermediate());
            assert!(code(354).is_intermediate());
        }

        #[test]
        fn error_codes() {
            assert!(code(451).is_transient());
            assert!(code(421).is_transient());
            assert!(code(535).is_permanent());
            assert!(code(550).is_permanent());
        }

        #[test]
        fn display() {
            assert_eq!(format!("{}", code(250)), "250");
            assert_eq!(format!("{}", ReplyClass::PositiveIntermediate), "3xx");
        }
    }

    mod reply_tests {
        use super::*;

        #[test]
        fn last_line_is_final_text() {
            let reply = Reply::new(
                code(250),
                vec!["Hello".to_string(), "SIZE 1000".to_string(), "HELP".to_string()],
            );
            assert_eq!(reply.last_line(), "HELP");
            assert_eq!(reply.message_text(), "Hello\nSIZE 1000\nHELP");
            assert_eq!(reply.class(), ReplyClass::PositiveCompletion);
        }

        #[test]
        fn empty_message() {
            let reply = Reply::new(code(250), vec![]);
            assert_eq!(reply.last_line(), "");
            assert_eq!(reply.message_text(), "");
        }

        #[test]
        fn error_predicates() {
            let reply = Reply::new(code(550), vec!["no such user".into()]);
            assert!(reply.is_permanent_error());
            assert!(!reply.is_transient_error());
            assert!(!reply.is_success());
        }
    }
}
