//! Outgoing message content: body, attachments and their encodings.

use std::fmt;

/// Content type used for the body when none is given.
pub const DEFAULT_CONTENT_TYPE: &str = "text/html";

/// Charset label used for the body when none is given.
pub const DEFAULT_CHARSET: &str = "utf8";

/// Transfer encodings produced by the composer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferEncoding {
    /// Base64 encoding, used for attachments.
    Base64,
    /// Quoted-Printable encoding, used for the body.
    QuotedPrintable,
}

impl fmt::Display for TransferEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Base64 => write!(f, "base64"),
            Self::QuotedPrintable => write!(f, "quoted-printable"),
        }
    }
}

/// A file attached to an outgoing message.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Attachment {
    /// Name shown to the recipient.
    pub filename: String,
    /// MIME type, e.g. `application/pdf`.
    pub content_type: String,
    /// Raw file content.
    pub content: Vec<u8>,
}

impl Attachment {
    /// Creates an attachment.
    #[must_use]
    pub fn new(
        filename: impl Into<String>,
        content_type: impl Into<String>,
        content: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            filename: filename.into(),
            content_type: content_type.into(),
            content: content.into(),
        }
    }
}

/// Subject, body and attachments of one message.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OutgoingMessage {
    /// Subject line.
    pub subject: String,
    /// Body text, sent as-is (HTML by default).
    pub body: String,
    /// Body content type.
    pub content_type: String,
    /// Charset label written on the body part.
    pub charset: String,
    /// Attachments in the order they are appended.
    pub attachments: Vec<Attachment>,
}

impl OutgoingMessage {
    /// Creates a message with the default `text/html` body in `utf8`.
    #[must_use]
    pub fn new(subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            body: body.into(),
            content_type: DEFAULT_CONTENT_TYPE.to_string(),
            charset: DEFAULT_CHARSET.to_string(),
            attachments: Vec::new(),
        }
    }

    /// Sets the body content type.
    #[must_use]
    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }

    /// Sets the body charset label.
    #[must_use]
    pub fn charset(mut self, charset: impl Into<String>) -> Self {
        self.charset = charset.into();
        self
    }

    /// Appends an attachment.
    #[must_use]
    pub fn attach(mut self, attachment: Attachment) -> Self {
        self.attachments.push(attachment);
        self
    }
}
