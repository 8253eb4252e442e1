//! Mail sending service.
//!
//! [`MailSender`] validates and composes a message, then drives one SMTP
//! transaction for it: greeting, EHLO, optional `AUTH LOGIN`, envelope, DATA
//! and QUIT. The connection is closed on every exit path.

use std::fmt;

use postline_mime::{ComposedMessage, MessageComposer, OutgoingMessage};
use postline_smtp::connection::connect;
use postline_smtp::{Address, Session};
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, info, warn};

use crate::config::SenderConfig;
use crate::recipients::RecipientList;

/// Category of a delivery failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The relay could not be reached.
    Connection,
    /// The relay answered with an unexpected reply class.
    Protocol,
    /// The connection closed, stalled or sent garbage mid-dialogue.
    TransportRead,
    /// The message or its addresses could not be built.
    Composition,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connection => write!(f, "connection"),
            Self::Protocol => write!(f, "protocol"),
            Self::TransportRead => write!(f, "transport read"),
            Self::Composition => write!(f, "composition"),
        }
    }
}

/// Errors that can occur while sending a message.
#[derive(Debug, thiserror::Error)]
pub enum SendError {
    /// Connection failed.
    #[error("Could not connect to SMTP host: {0}")]
    Connection(#[source] postline_smtp::Error),

    /// Server rejected a step.
    #[error("Server replied {code}: {message}")]
    Protocol {
        /// Reply code of the final line.
        code: u16,
        /// Text of the final line.
        message: String,
    },

    /// Connection lost or unreadable during the dialogue.
    #[error("Connection failed during SMTP dialogue: {0}")]
    TransportRead(#[source] postline_smtp::Error),

    /// Invalid recipients, sender or message content.
    #[error("Cannot compose message: {0}")]
    Composition(String),
}

impl SendError {
    /// The failure category.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Connection(_) => ErrorKind::Connection,
            Self::Protocol { .. } => ErrorKind::Protocol,
            Self::TransportRead(_) => ErrorKind::TransportRead,
            Self::Composition(_) => ErrorKind::Composition,
        }
    }
}

impl From<postline_smtp::Error> for SendError {
    fn from(err: postline_smtp::Error) -> Self {
        use postline_smtp::Error;

        match err {
            Error::Reply { code, message } => Self::Protocol { code, message },
            Error::Connect { .. } | Error::ConnectTimeout { .. } => Self::Connection(err),
            Error::InvalidAddress(address) => Self::Composition(format!("Invalid address: {address}")),
            Error::Io(_)
            | Error::MalformedReply(_)
            | Error::ConnectionClosed
            | Error::ReadTimeout(_)
            | Error::InvalidState(_) => Self::TransportRead(err),
        }
    }
}

impl From<postline_mime::Error> for SendError {
    fn from(err: postline_mime::Error) -> Self {
        Self::Composition(err.to_string())
    }
}

/// A validated envelope plus the rendered payload.
struct Envelope {
    from: Address,
    recipients: Vec<Address>,
    payload: ComposedMessage,
}

/// Sends mail through one configured relay.
#[derive(Debug, Clone)]
pub struct MailSender {
    config: SenderConfig,
}

impl MailSender {
    /// Creates a sender for `config`.
    #[must_use]
    pub const fn new(config: SenderConfig) -> Self {
        Self { config }
    }

    /// The relay configuration.
    #[must_use]
    pub const fn config(&self) -> &SenderConfig {
        &self.config
    }

    /// Sends `message` to `recipients`, returning whether the relay accepted it.
    ///
    /// Failures are logged with their structured cause; use
    /// [`MailSender::try_send`] to inspect them.
    pub async fn send_mail(
        &self,
        recipients: impl Into<RecipientList>,
        message: &OutgoingMessage,
    ) -> bool {
        match self.try_send(recipients, message).await {
            Ok(()) => true,
            Err(e) => {
                warn!(
                    host = %self.config.host,
                    kind = %e.kind(),
                    error = %e,
                    "Mail delivery failed"
                );
                false
            }
        }
    }

    /// Connects to the relay and sends `message` to `recipients`.
    ///
    /// Nothing is sent over the network if the recipients, the sender or the
    /// message are invalid.
    ///
    /// # Errors
    ///
    /// Returns a [`SendError`] describing the first failed step.
    pub async fn try_send(
        &self,
        recipients: impl Into<RecipientList>,
        message: &OutgoingMessage,
    ) -> Result<(), SendError> {
        let envelope = self.prepare(&recipients.into(), message)?;

        let host = &self.config.host;
        let port = self.config.port();
        debug!(
            %host,
            port,
            security = self.config.security.display_name(),
            "Connecting to relay"
        );

        let stream = connect(
            host,
            port,
            self.config.security.into(),
            self.config.connect_timeout(),
        )
        .await
        .map_err(SendError::Connection)?;

        self.run(stream, &envelope).await
    }

    /// Sends `message` over an already open stream.
    ///
    /// The stream must be positioned before the server greeting. It is shut
    /// down before this returns, whatever the outcome.
    ///
    /// # Errors
    ///
    /// Returns a [`SendError`] describing the first failed step.
    pub async fn deliver<S>(
        &self,
        stream: S,
        recipients: impl Into<RecipientList>,
        message: &OutgoingMessage,
    ) -> Result<(), SendError>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let envelope = self.prepare(&recipients.into(), message)?;
        self.run(stream, &envelope).await
    }

    fn prepare(
        &self,
        recipients: &RecipientList,
        message: &OutgoingMessage,
    ) -> Result<Envelope, SendError> {
        if recipients.is_empty() {
            return Err(SendError::Composition("No recipients specified".into()));
        }

        let from = Address::new(&self.config.from)?;
        let addresses = recipients
            .iter()
            .map(Address::new)
            .collect::<Result<Vec<_>, _>>()?;

        let mut composer = MessageComposer::new(from.as_str());
        if let Some(name) = self.config.name.as_deref().filter(|n| !n.is_empty()) {
            composer = composer.display_name(name);
        }
        let payload = composer.compose(recipients.as_slice(), message)?;

        Ok(Envelope {
            from,
            recipients: addresses,
            payload,
        })
    }

    async fn run<S>(&self, stream: S, envelope: &Envelope) -> Result<(), SendError>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let mut session = Session::new(stream).with_io_timeout(Some(self.config.io_timeout()));

        let outcome = self.transaction(&mut session, envelope).await;

        if outcome.is_ok() {
            if let Err(e) = session.quit().await {
                warn!(error = %e, "Failed to send QUIT");
            }
        }
        if let Err(e) = session.close().await {
            debug!(error = %e, "Error closing connection");
        }

        outcome
    }

    async fn transaction<S>(
        &self,
        session: &mut Session<S>,
        envelope: &Envelope,
    ) -> Result<(), SendError>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        session.read_greeting().await?;
        session.ehlo(&self.config.helo_name).await?;

        if self.config.has_credentials() {
            session
                .auth_login(&self.config.username, &self.config.password)
                .await?;
        }

        session.mail_from(&envelope.from).await?;
        for recipient in &envelope.recipients {
            session.rcpt_to(recipient).await?;
        }

        session.data().await?;
        let accepted = session.send_message(envelope.payload.as_bytes()).await?;

        info!(
            host = %self.config.host,
            recipients = envelope.recipients.len(),
            reply = %accepted.last_line(),
            "Message accepted for delivery"
        );
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        let err = SendError::from(postline_smtp::Error::reply(550, "no such user"));
        assert_eq!(err.kind(), ErrorKind::Protocol);
        assert_eq!(err.to_string(), "Server replied 550: no such user");

        let err = SendError::from(postline_smtp::Error::ConnectionClosed);
        assert_eq!(err.kind(), ErrorKind::TransportRead);

        let err = SendError::from(postline_smtp::Error::ReadTimeout(
            std::time::Duration::from_secs(1),
        ));
        assert_eq!(err.kind(), ErrorKind::TransportRead);

        let err = SendError::from(postline_smtp::Error::MalformedReply("??".into()));
        assert_eq!(err.kind(), ErrorKind::TransportRead);

        let err = SendError::from(postline_smtp::Error::InvalidAddress("nope".into()));
        assert_eq!(err.kind(), ErrorKind::Composition);

        let err = SendError::from(postline_mime::Error::InvalidHeader("x".into()));
        assert_eq!(err.kind(), ErrorKind::Composition);
    }

    #[test]
    fn test_connect_errors_are_connection_kind() {
        let err = SendError::from(postline_smtp::Error::ConnectTimeout {
            host: "relay".into(),
            port: 25,
            timeout: std::time::Duration::from_secs(15),
        });
        assert_eq!(err.kind(), ErrorKind::Connection);
    }

    #[test]
    fn test_prepare_rejects_bad_input() {
        let config = SenderConfig::builder("relay", "me@example.com").build().unwrap();
        let sender = MailSender::new(config);
        let message = OutgoingMessage::new("S", "x");

        let err = sender.prepare(&RecipientList::from(""), &message).err().unwrap();
        assert_eq!(err.kind(), ErrorKind::Composition);

        let err = sender
            .prepare(&RecipientList::from("good@x.com, not-an-address"), &message)
            .err()
            .unwrap();
        assert_eq!(err.kind(), ErrorKind::Composition);

        let bad_subject = OutgoingMessage::new("a\r\nBcc: v@x.com", "x");
        let err = sender
            .prepare(&RecipientList::from("good@x.com"), &bad_subject)
            .err()
            .unwrap();
        assert_eq!(err.kind(), ErrorKind::Composition);
    }

    #[test]
    fn test_prepare_rejects_bad_sender() {
        let config = SenderConfig::builder("relay", "not an address").build().unwrap();
        let err = MailSender::new(config)
            .prepare(&RecipientList::from("a@x.com"), &OutgoingMessage::new("S", "x"))
            .err()
            .unwrap();
        assert_eq!(err.kind(), ErrorKind::Composition);
    }
}
