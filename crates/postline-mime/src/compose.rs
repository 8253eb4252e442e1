//! Multipart message composition.
//!
//! Produces the exact DATA payload for one message: top-level headers, a
//! fixed preamble, a quoted-printable body part and one base64 part per
//! attachment, all separated by a boundary that is guaranteed not to start
//! any line of the encoded content.

use crate::boundary::Boundary;
use crate::content_type::ContentType;
use crate::encoding::{encode_base64_wrapped, encode_quoted_printable, encode_rfc2047};
use crate::error::{Error, Result};
use crate::header::Headers;
use crate::message::{Attachment, OutgoingMessage, TransferEncoding};
use std::fmt;

/// Text placed between the top-level headers and the first part.
pub const PREAMBLE: &str = "This is a multi-part message in MIME format.";

/// Builds `multipart/mixed` payloads for a fixed sender.
#[derive(Debug, Clone)]
pub struct MessageComposer {
    from: String,
    display_name: Option<String>,
    boundary: Option<Boundary>,
}

/// A fully rendered message, ready for the DATA phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposedMessage {
    boundary: Boundary,
    content: String,
}

struct EncodedPart {
    headers: Headers,
    content: String,
}

impl MessageComposer {
    /// Creates a composer sending as `from`.
    #[must_use]
    pub fn new(from: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            display_name: None,
            boundary: None,
        }
    }

    /// Sets the display name appended to the `From` header.
    #[must_use]
    pub fn display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    /// Uses a fixed boundary instead of a random one.
    #[must_use]
    pub fn with_boundary(mut self, boundary: Boundary) -> Self {
        self.boundary = Some(boundary);
        self
    }

    /// Renders `message` for `recipients`.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidHeader`] if there are no recipients, or any header
    ///   input (subject, addresses, display name, charset, filename) contains
    ///   a line break or otherwise cannot be written safely
    /// - [`Error::InvalidContentType`] for an unparseable or multipart body
    ///   type, or an unparseable attachment type
    /// - [`Error::BoundaryCollision`] if a fixed boundary occurs in the content
    pub fn compose<R: AsRef<str>>(
        &self,
        recipients: &[R],
        message: &OutgoingMessage,
    ) -> Result<ComposedMessage> {
        let body = encode_body(message)?;
        let attachments = message
            .attachments
            .iter()
            .map(encode_attachment)
            .collect::<Result<Vec<_>>>()?;

        let boundary = self.pick_boundary(|b| {
            std::iter::once(&body)
                .chain(&attachments)
                .any(|part| b.occurs_in(&part.content))
        })?;

        let headers = self.top_headers(recipients, message, &boundary)?;
        let delimiter = boundary.delimiter();

        let mut content = String::with_capacity(
            body.content.len()
                + attachments.iter().map(|p| p.content.len() + 256).sum::<usize>()
                + 1024,
        );
        content.push_str(&headers.to_string());
        content.push_str("\r\n");
        content.push_str(PREAMBLE);
        content.push_str("\r\n\r\n");

        for part in std::iter::once(&body).chain(&attachments) {
            content.push_str(&delimiter);
            content.push_str("\r\n");
            content.push_str(&part.headers.to_string());
            content.push_str("\r\n");
            content.push_str(&part.content);
            content.push_str("\r\n\r\n");
        }

        content.push_str(&boundary.close_delimiter());
        content.push_str("\r\n");

        Ok(ComposedMessage { boundary, content })
    }

    fn pick_boundary(&self, collides: impl Fn(&Boundary) -> bool) -> Result<Boundary> {
        if let Some(fixed) = &self.boundary {
            if collides(fixed) {
                return Err(Error::BoundaryCollision(fixed.to_string()));
            }
            return Ok(fixed.clone());
        }

        let mut boundary = Boundary::generate();
        while collides(&boundary) {
            boundary = Boundary::generate();
        }
        Ok(boundary)
    }

    fn top_headers<R: AsRef<str>>(
        &self,
        recipients: &[R],
        message: &OutgoingMessage,
        boundary: &Boundary,
    ) -> Result<Headers> {
        if recipients.is_empty() {
            return Err(Error::InvalidHeader("No recipients".into()));
        }

        let to = recipients
            .iter()
            .map(|r| format!("<{}>", r.as_ref()))
            .collect::<Vec<_>>()
            .join(", ");

        let mut headers = Headers::new();
        headers.add_text("Subject", &message.subject)?;
        headers.add("To", to)?;

        let from = format!("<{}>", self.from);
        match &self.display_name {
            Some(name) => {
                let mut words = encode_rfc2047(name, "UTF-8").into_iter();
                let first = words.next().unwrap_or_default();
                headers.add_folded("From", from + &first, words.map(|w| format!(" {w}")))?;
            }
            None => headers.add("From", from)?,
        }

        headers.add("MIME-Version", "1.0")?;
        headers.add(
            "Content-Type",
            ContentType::multipart_mixed(boundary.as_str()).to_string(),
        )?;
        Ok(headers)
    }
}

fn encode_body(message: &OutgoingMessage) -> Result<EncodedPart> {
    let content_type = ContentType::parse(&message.content_type)?;
    if content_type.is_multipart() {
        return Err(Error::InvalidContentType(format!(
            "Body cannot be {}",
            content_type.essence()
        )));
    }

    let charset = &message.charset;
    if charset.is_empty()
        || !charset
            .chars()
            .all(|c| c.is_ascii_graphic() && c != '"' && c != ';')
    {
        return Err(Error::InvalidHeader(format!("Invalid charset: {charset:?}")));
    }

    let mut headers = Headers::new();
    headers.add(
        "Content-Type",
        format!("{}; charset=\"{charset}\"", content_type.essence()),
    )?;
    headers.add(
        "Content-Transfer-Encoding",
        TransferEncoding::QuotedPrintable.to_string(),
    )?;

    Ok(EncodedPart {
        headers,
        content: encode_quoted_printable(&message.body),
    })
}

fn encode_attachment(attachment: &Attachment) -> Result<EncodedPart> {
    let content_type = ContentType::parse(&attachment.content_type)?;
    let filename = quoted_filename(&attachment.filename)?;

    let mut headers = Headers::new();
    headers.add_folded(
        "Content-Type",
        format!("{content_type};"),
        [format!("\tname=\"{filename}\"")],
    )?;
    headers.add(
        "Content-Transfer-Encoding",
        TransferEncoding::Base64.to_string(),
    )?;
    headers.add("Content-Description", filename.as_str())?;
    headers.add_folded(
        "Content-Disposition",
        "attachment;",
        [format!("\tfilename=\"{filename}\"")],
    )?;

    Ok(EncodedPart {
        headers,
        content: encode_base64_wrapped(&attachment.content),
    })
}

/// Filename as written inside a quoted parameter. Non-ASCII names become
/// RFC 2047 encoded words.
fn quoted_filename(filename: &str) -> Result<String> {
    if filename.is_empty() || filename.contains(['"', '\\', '\r', '\n']) {
        return Err(Error::InvalidHeader(format!(
            "Invalid attachment filename: {filename:?}"
        )));
    }
    Ok(encode_rfc2047(filename, "UTF-8").join(" "))
}

impl ComposedMessage {
    /// Boundary separating the parts.
    #[must_use]
    pub const fn boundary(&self) -> &Boundary {
        &self.boundary
    }

    /// The rendered message.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.content
    }

    /// The rendered message as bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        self.content.as_bytes()
    }

    /// Consumes the message, returning the rendered text.
    #[must_use]
    pub fn into_string(self) -> String {
        self.content
    }
}

impl fmt::Display for ComposedMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.content)
    }
}
