//! SMTP submission session.
//!
//! A [`Session`] owns the transport for one mail transaction and walks the
//! [`SessionState`] machine one command at a time. Each step writes its
//! command, reads a complete (possibly multi-line) reply and checks the class
//! of the final line. Any error moves the session to [`SessionState::Failed`].

use std::time::Duration;

use tokio::io::{
    AsyncBufRead, AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader,
};
use tracing::{debug, trace};

use super::SessionState;
use crate::command::Command;
use crate::error::{Error, Result};
use crate::parser::{is_last_reply_line, parse_reply, trim_line_ending};
use crate::types::{Address, Reply, ReplyClass};

/// Default deadline for a complete reply to arrive.
pub const DEFAULT_IO_TIMEOUT: Duration = Duration::from_secs(60);

/// Longest reply line accepted, CRLF included (RFC 5321 4.5.3.1.5).
pub const MAX_REPLY_LINE: usize = 512;

/// SMTP client session over any byte stream.
#[derive(Debug)]
pub struct Session<S> {
    stream: BufReader<S>,
    state: SessionState,
    io_timeout: Option<Duration>,
}

impl<S> Session<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Wraps an open transport. No bytes are exchanged until
    /// [`read_greeting`](Self::read_greeting).
    pub fn new(stream: S) -> Self {
        Self {
            stream: BufReader::new(stream),
            state: SessionState::Connecting,
            io_timeout: Some(DEFAULT_IO_TIMEOUT),
        }
    }

    /// Sets the per-reply deadline. `None` waits indefinitely.
    #[must_use]
    pub const fn with_io_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.io_timeout = timeout;
        self
    }

    /// Returns the current state.
    #[must_use]
    pub const fn state(&self) -> SessionState {
        self.state
    }

    /// Reads the server banner (expects 2xx).
    ///
    /// # Errors
    ///
    /// Returns an error if the banner is not a 2xx reply or cannot be read.
    pub async fn read_greeting(&mut self) -> Result<Reply> {
        self.step(
            SessionState::AwaitingGreeting,
            None,
            ReplyClass::PositiveCompletion,
        )
        .await
    }

    /// Sends `EHLO` (expects 2xx).
    ///
    /// # Errors
    ///
    /// Returns an error if the server does not accept the greeting.
    pub async fn ehlo(&mut self, hostname: &str) -> Result<Reply> {
        let cmd = Command::Ehlo {
            hostname: hostname.to_string(),
        };
        self.step(
            SessionState::AwaitingEhloReply,
            Some(cmd),
            ReplyClass::PositiveCompletion,
        )
        .await
    }

    /// Authenticates with `AUTH LOGIN`.
    ///
    /// `AUTH LOGIN` and the username expect 3xx, the password expects 2xx.
    ///
    /// # Errors
    ///
    /// Returns an error at the first reply of the wrong class.
    pub async fn auth_login(&mut self, username: &str, password: &str) -> Result<Reply> {
        self.step(
            SessionState::AwaitingAuthChallenge,
            Some(Command::AuthLogin),
            ReplyClass::PositiveIntermediate,
        )
        .await?;

        self.step(
            SessionState::AwaitingUsernameAck,
            Some(Command::AuthResponse {
                credential: username.to_string(),
            }),
            ReplyClass::PositiveIntermediate,
        )
        .await?;

        self.step(
            SessionState::AwaitingPasswordAck,
            Some(Command::AuthResponse {
                credential: password.to_string(),
            }),
            ReplyClass::PositiveCompletion,
        )
        .await
    }

    /// Sends `MAIL FROM` (expects 2xx).
    ///
    /// # Errors
    ///
    /// Returns an error if the sender is refused.
    pub async fn mail_from(&mut self, from: &Address) -> Result<Reply> {
        let cmd = Command::MailFrom { from: from.clone() };
        self.step(
            SessionState::AwaitingMailFromAck,
            Some(cmd),
            ReplyClass::PositiveCompletion,
        )
        .await
    }

    /// Sends `RCPT TO` for one recipient (expects 2xx).
    ///
    /// # Errors
    ///
    /// Returns an error if the recipient is refused.
    pub async fn rcpt_to(&mut self, to: &Address) -> Result<Reply> {
        let cmd = Command::RcptTo { to: to.clone() };
        self.step(
            SessionState::AwaitingRcptAck,
            Some(cmd),
            ReplyClass::PositiveCompletion,
        )
        .await
    }

    /// Sends `DATA` (expects 3xx).
    ///
    /// # Errors
    ///
    /// Returns an error if the server does not invite message input.
    pub async fn data(&mut self) -> Result<Reply> {
        self.step(
            SessionState::AwaitingDataIntermediate,
            Some(Command::Data),
            ReplyClass::PositiveIntermediate,
        )
        .await
    }

    /// Writes the message content followed by the end-of-data line
    /// (expects 2xx).
    ///
    /// Line endings are normalized to CRLF and lines starting with `.` are
    /// dot-stuffed.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails or the server rejects the message.
    pub async fn send_message(&mut self, message: &[u8]) -> Result<Reply> {
        self.advance(SessionState::SendingBody)?;

        let payload = dot_stuff(message);
        debug!(bytes = payload.len(), "sending message body");
        if let Err(err) = self.write(&payload).await {
            self.state = SessionState::Failed;
            return Err(err);
        }

        self.step(
            SessionState::AwaitingFinalAck,
            Some(Command::EndOfData),
            ReplyClass::PositiveCompletion,
        )
        .await
    }

    /// Sends `QUIT` after an accepted message. The reply is not read.
    ///
    /// # Errors
    ///
    /// Returns an error if the message was not accepted yet or the write
    /// fails.
    pub async fn quit(&mut self) -> Result<()> {
        self.advance(SessionState::Completed)?;
        let cmd = Command::Quit;
        debug!(command = %cmd.redacted(), "C:");
        self.write(&cmd.serialize()).await
    }

    /// Shuts the transport down, releasing it.
    ///
    /// # Errors
    ///
    /// Returns an error if the shutdown itself fails; the stream is dropped
    /// either way.
    pub async fn close(mut self) -> Result<()> {
        self.stream.get_mut().shutdown().await?;
        Ok(())
    }

    /// Returns the underlying stream.
    pub fn into_inner(self) -> S {
        self.stream.into_inner()
    }

    fn advance(&mut self, next: SessionState) -> Result<()> {
        if self.state.can_advance_to(next) {
            self.state = next;
            Ok(())
        } else {
            Err(Error::InvalidState(format!(
                "cannot move from {} to {next}",
                self.state
            )))
        }
    }

    async fn step(
        &mut self,
        next: SessionState,
        command: Option<Command>,
        expected: ReplyClass,
    ) -> Result<Reply> {
        self.advance(next)?;

        let result = self.exchange(command, expected).await;
        if let Err(err) = &result {
            debug!(state = %self.state, error = %err, "step failed");
            self.state = SessionState::Failed;
        }
        result
    }

    async fn exchange(&mut self, command: Option<Command>, expected: ReplyClass) -> Result<Reply> {
        if let Some(cmd) = command {
            debug!(command = %cmd.redacted(), "C:");
            self.write(&cmd.serialize()).await?;
        }

        let reply = self.read_reply().await?;
        debug!(code = reply.code.as_u16(), text = reply.last_line(), "S:");

        if reply.class() != expected {
            return Err(Error::reply(reply.code.as_u16(), reply.last_line()));
        }

        Ok(reply)
    }

    async fn write(&mut self, data: &[u8]) -> Result<()> {
        let stream = self.stream.get_mut();
        stream.write_all(data).await?;
        stream.flush().await?;
        Ok(())
    }

    async fn read_reply(&mut self) -> Result<Reply> {
        match self.io_timeout {
            Some(timeout) => tokio::time::timeout(timeout, read_reply_lines(&mut self.stream))
                .await
                .map_err(|_| Error::ReadTimeout(timeout))?,
            None => read_reply_lines(&mut self.stream).await,
        }
    }
}

/// Reads lines until one marks the end of the reply, then parses them.
///
/// Lines are read as bytes; text that is not UTF-8 is decoded lossily since
/// only the code has to be ASCII.
async fn read_reply_lines<R>(reader: &mut R) -> Result<Reply>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = Vec::new();
    loop {
        let mut raw = Vec::new();
        let read = (&mut *reader)
            .take(MAX_REPLY_LINE as u64 + 1)
            .read_until(b'\n', &mut raw)
            .await?;
        if read == 0 {
            return Err(Error::ConnectionClosed);
        }
        if raw.len() > MAX_REPLY_LINE {
            return Err(Error::MalformedReply(format!(
                "reply line longer than {MAX_REPLY_LINE} bytes"
            )));
        }

        let raw = String::from_utf8_lossy(&raw);
        let line = trim_line_ending(&raw);
        if line.is_empty() {
            continue;
        }
        trace!(line = %line, "reply line");

        let is_last = is_last_reply_line(line);
        lines.push(line.to_string());

        if is_last {
            break;
        }
    }

    parse_reply(&lines)
}

/// Normalizes line endings to CRLF and byte-stuffs lines starting with `.`.
fn dot_stuff(message: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(message.len() + message.len() / 64 + 2);

    for line in message.split(|&b| b == b'\n') {
        let line = line.strip_suffix(b"\r").unwrap_or(line);

        if line.first() == Some(&b'.') {
            out.push(b'.');
        }

        out.extend_from_slice(line);
        out.extend_from_slice(b"\r\n");
    }

    out
}
