//! # postline-core
//!
//! Delivery logic for `postline`.
//!
//! This crate provides:
//! - Sender configuration, loadable from JSON
//! - Recipient list normalization
//! - [`MailSender`], which composes a message and drives one SMTP
//!   transaction per send

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod config;
mod error;
pub mod recipients;
pub mod service;

pub use config::{Security, SenderConfig, SenderConfigBuilder};
pub use error::{Error, Result};
pub use postline_mime::{Attachment, DEFAULT_CHARSET, DEFAULT_CONTENT_TYPE, OutgoingMessage};
pub use recipients::RecipientList;
pub use service::{ErrorKind, MailSender, SendError};
