//! Recipient list normalization.

use std::fmt;

/// Ordered recipient addresses. Each entry becomes one `RCPT TO`, in order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecipientList(Vec<String>);

impl RecipientList {
    /// Builds a list from individual entries, trimming each and dropping
    /// empty ones.
    pub fn new<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self(
            entries
                .into_iter()
                .map(|entry| entry.as_ref().trim().to_string())
                .filter(|entry| !entry.is_empty())
                .collect(),
        )
    }

    /// Splits a comma-separated string.
    #[must_use]
    pub fn parse(list: &str) -> Self {
        Self::new(list.split(','))
    }

    /// Addresses in order.
    #[must_use]
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    /// Number of recipients.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when there are no recipients.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over the addresses.
    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.0.iter()
    }
}

impl From<&str> for RecipientList {
    fn from(list: &str) -> Self {
        Self::parse(list)
    }
}

impl From<String> for RecipientList {
    fn from(list: String) -> Self {
        Self::parse(&list)
    }
}

impl From<Vec<String>> for RecipientList {
    fn from(entries: Vec<String>) -> Self {
        Self::new(entries)
    }
}

impl From<&[&str]> for RecipientList {
    fn from(entries: &[&str]) -> Self {
        Self::new(entries)
    }
}

impl<const N: usize> From<[&str; N]> for RecipientList {
    fn from(entries: [&str; N]) -> Self {
        Self::new(entries)
    }
}

impl<'a> IntoIterator for &'a RecipientList {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for RecipientList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join(", "))
    }
}
