//! Core services for email operations.
//!
//! This module bridges configuration and message content with the
//! underlying SMTP and MIME libraries.

pub mod sender;

pub use sender::{ErrorKind, MailSender, SendError};
