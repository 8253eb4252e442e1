//! MIME header handling.
//!
//! Headers keep insertion order and render with CRLF line endings. Every
//! name, value and continuation line is checked for line breaks on insert, so
//! caller input can never start a header of its own.

use crate::encoding::encode_rfc2047;
use crate::error::{Error, Result};
use std::fmt;

/// A single header field, optionally folded over several lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderField {
    name: String,
    value: String,
    continuations: Vec<String>,
}

impl HeaderField {
    /// Header name as given.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Value on the first line.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Folded continuation lines, each starting with a space or tab.
    #[must_use]
    pub fn continuations(&self) -> &[String] {
        &self.continuations
    }
}

/// Ordered collection of email headers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    fields: Vec<HeaderField>,
}

impl Headers {
    /// Creates a new empty header collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a single-line header.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidHeader`] if the name is not a valid field name
    /// or the value contains CR or LF.
    pub fn add(&mut self, name: impl Into<String>, value: impl Into<String>) -> Result<()> {
        self.add_folded(name, value, Vec::<String>::new())
    }

    /// Appends a header folded over several lines.
    ///
    /// Each continuation line must begin with a space or tab.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidHeader`] for an invalid name, a line break in
    /// any part, or a continuation line without leading whitespace.
    pub fn add_folded<I, S>(
        &mut self,
        name: impl Into<String>,
        value: impl Into<String>,
        continuations: I,
    ) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let name = name.into();
        let value = value.into();

        if name.is_empty()
            || !name
                .bytes()
                .all(|b| b.is_ascii_graphic() && b != b':')
        {
            return Err(Error::InvalidHeader(format!("Invalid field name: {name:?}")));
        }
        check_line(&name, &value)?;

        let continuations: Vec<String> = continuations.into_iter().map(Into::into).collect();
        for line in &continuations {
            check_line(&name, line)?;
            if !line.starts_with([' ', '\t']) {
                return Err(Error::InvalidHeader(format!(
                    "{name}: continuation line must start with whitespace"
                )));
            }
        }

        self.fields.push(HeaderField {
            name,
            value,
            continuations,
        });
        Ok(())
    }

    /// Appends an unstructured text header, RFC 2047 encoding it when it is
    /// not plain ASCII. Long encoded values are folded one word per line.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidHeader`] if the raw text contains CR or LF.
    pub fn add_text(&mut self, name: impl Into<String>, text: &str) -> Result<()> {
        let name = name.into();
        check_line(&name, text)?;

        let mut words = encode_rfc2047(text, "UTF-8").into_iter();
        let first = words.next().unwrap_or_default();
        self.add_folded(name, first, words.map(|w| format!(" {w}")))
    }

    /// Gets the first value for a header (case-insensitive).
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.name.eq_ignore_ascii_case(name))
            .map(HeaderField::value)
    }

    /// Returns an iterator over all header fields in order.
    pub fn iter(&self) -> impl Iterator<Item = &HeaderField> {
        self.fields.iter()
    }

    /// Number of header fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// True when no headers were added.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

fn check_line(name: &str, text: &str) -> Result<()> {
    if text.contains(['\r', '\n']) {
        return Err(Error::InvalidHeader(format!(
            "{name}: line break in header value"
        )));
    }
    Ok(())
}

impl fmt::Display for Headers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for field in &self.fields {
            write!(f, "{}: {}\r\n", field.name, field.value)?;
            for line in &field.continuations {
                write!(f, "{line}\r\n")?;
            }
        }
        Ok(())
    }
}
