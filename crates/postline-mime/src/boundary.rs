//! Multipart boundary tokens.

use crate::error::{Error, Result};
use rand::Rng;
use std::fmt::{self, Write as _};

const PREFIX: &str = "__NextPart_";

/// Maximum boundary length allowed by RFC 2046.
const MAX_LENGTH: usize = 70;

/// A multipart boundary token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Boundary(String);

impl Boundary {
    /// Generates a fresh boundary: a fixed prefix plus 128 random bits in hex.
    #[must_use]
    pub fn generate() -> Self {
        let mut bytes = [0_u8; 16];
        rand::thread_rng().fill(&mut bytes);

        let mut token = String::with_capacity(PREFIX.len() + 32);
        token.push_str(PREFIX);
        for byte in bytes {
            let _ = write!(token, "{byte:02x}");
        }
        Self(token)
    }

    /// Wraps a caller-chosen token.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidBoundary`] if the token is empty, longer than
    /// 70 characters, ends in a space or uses characters outside the RFC 2046
    /// boundary alphabet.
    pub fn new(token: impl Into<String>) -> Result<Self> {
        let token = token.into();
        let valid = !token.is_empty()
            && token.len() <= MAX_LENGTH
            && !token.ends_with(' ')
            && token.chars().all(is_bchar);
        if valid {
            Ok(Self(token))
        } else {
            Err(Error::InvalidBoundary(token))
        }
    }

    /// The bare token.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Line that opens a part: `--token`.
    #[must_use]
    pub fn delimiter(&self) -> String {
        format!("--{}", self.0)
    }

    /// Line that closes the multipart body: `--token--`.
    #[must_use]
    pub fn close_delimiter(&self) -> String {
        format!("--{}--", self.0)
    }

    /// True if any line of `section` starts with this boundary's delimiter.
    #[must_use]
    pub fn occurs_in(&self, section: &str) -> bool {
        let delimiter = self.delimiter();
        section
            .split('\n')
            .any(|line| line.starts_with(delimiter.as_str()))
    }
}

fn is_bchar(c: char) -> bool {
    c.is_ascii_alphanumeric() || "'()+_,-./:=? ".contains(c)
}

impl fmt::Display for Boundary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Boundary {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_shape() {
        let boundary = Boundary::generate();
        let token = boundary.as_str();
        assert!(token.starts_with("__NextPart_"));
        let hex = &token["__NextPart_".len()..];
        assert_eq!(hex.len(), 32);
        assert!(hex.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_generate_is_random() {
        assert_ne!(Boundary::generate(), Boundary::generate());
    }

    #[test]
    fn test_new_validates() {
        assert!(Boundary::new("simple-boundary").is_ok());
        assert!(Boundary::new("").is_err());
        assert!(Boundary::new("trailing ").is_err());
        assert!(Boundary::new("x".repeat(71)).is_err());
        assert!(Boundary::new("semi;colon").is_err());
        assert!(Boundary::new("line\r\nbreak").is_err());
    }

    #[test]
    fn test_delimiters() {
        let boundary = Boundary::new("abc").unwrap();
        assert_eq!(boundary.delimiter(), "--abc");
        assert_eq!(boundary.close_delimiter(), "--abc--");
    }

    #[test]
    fn test_occurs_in() {
        let boundary = Boundary::new("abc").unwrap();
        assert!(boundary.occurs_in("--abc"));
        assert!(boundary.occurs_in("first\r\n--abcdef\r\n"));
        assert!(!boundary.occurs_in("text --abc inline"));
        assert!(!boundary.occurs_in(""));
    }
}
