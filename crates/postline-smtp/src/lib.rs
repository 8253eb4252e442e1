//! # postline-smtp
//!
//! The SMTP submission engine behind `postline`: reply parsing, command
//! serialization and a state-tracked session that drives one mail
//! transaction over any async byte stream.
//!
//! ## Features
//!
//! - **Reply grammar**: single and multi-line replies, only the final line's
//!   code is authoritative
//! - **State machine**: out-of-order commands are refused before they reach
//!   the wire, any failed step is terminal
//! - **Authentication**: `AUTH LOGIN`
//! - **Transports**: plain TCP and implicit TLS via `rustls`, or any
//!   `AsyncRead + AsyncWrite` stream you supply
//! - **Deadlines**: connect timeout and per-reply I/O timeout
//!
//! ## Quick Start
//!
//! ```ignore
//! use std::time::Duration;
//! use postline_smtp::{Address, Security, Session};
//! use postline_smtp::connection::connect;
//!
//! #[tokio::main]
//! async fn main() -> postline_smtp::Result<()> {
//!     let stream = connect("smtp.example.com", 465, Security::Ssl, Duration::from_secs(15)).await?;
//!     let mut session = Session::new(stream);
//!
//!     session.read_greeting().await?;
//!     session.ehlo("client.example.com").await?;
//!     session.auth_login("user@example.com", "password").await?;
//!     session.mail_from(&Address::new("sender@example.com")?).await?;
//!     session.rcpt_to(&Address::new("recipient@example.com")?).await?;
//!     session.data().await?;
//!     session.send_message(b"Subject: Test\r\n\r\nHello, World!\r\n").await?;
//!     session.quit().await?;
//!     session.close().await
//! }
//! ```
//!
//! ## Modules
//!
//! - [`command`]: SMTP command builders
//! - [`connection`]: transport, session state and session engine
//! - [`parser`]: reply parser
//! - [`types`]: addresses and replies

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod command;
pub mod connection;
mod error;
pub mod parser;
pub mod types;

pub use connection::{Security, Session, SessionState, SmtpStream};
pub use error::{Error, Result};
pub use types::{Address, Reply, ReplyClass, ReplyCode};
