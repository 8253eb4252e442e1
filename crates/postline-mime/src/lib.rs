//! # postline-mime
//!
//! MIME composition for outgoing mail: one quoted-printable body plus any
//! number of base64 attachments inside a `multipart/mixed` envelope.
//!
//! ## Features
//!
//! - **Composition**: byte-stable `multipart/mixed` payloads with CRLF line endings
//! - **Encoding/Decoding**: Base64, Quoted-Printable, RFC 2047 header encoding
//! - **Boundaries**: random 128-bit tokens, checked against the encoded content
//! - **Header safety**: line breaks in caller input are rejected, never written
//!
//! ## Quick Start
//!
//! ```ignore
//! use postline_mime::{Attachment, MessageComposer, OutgoingMessage};
//!
//! let message = OutgoingMessage::new("Report", "<p>See attached.</p>")
//!     .attach(Attachment::new("report.pdf", "application/pdf", pdf_bytes));
//!
//! let composed = MessageComposer::new("sender@example.com")
//!     .display_name("Reports")
//!     .compose(&["recipient@example.com"], &message)?;
//!
//! println!("{composed}");
//! ```
//!
//! ### Encoding/Decoding
//!
//! ```ignore
//! use postline_mime::encoding::{decode_base64, encode_base64, encode_quoted_printable};
//!
//! let encoded = encode_base64(b"Hello, World!");
//! let decoded = decode_base64(&encoded)?;
//!
//! let encoded = encode_quoted_printable("Héllo, Wørld!");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod boundary;
mod compose;
mod content_type;
mod error;
mod header;
mod message;

pub mod encoding;

pub use boundary::Boundary;
pub use compose::{ComposedMessage, MessageComposer, PREAMBLE};
pub use content_type::ContentType;
pub use error::{Error, Result};
pub use header::{HeaderField, Headers};
pub use message::{
    Attachment, DEFAULT_CHARSET, DEFAULT_CONTENT_TYPE, OutgoingMessage, TransferEncoding,
};
