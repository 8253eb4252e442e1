//! SMTP connection management: transport, session state and the session
//! engine.

mod session;
mod state;
mod stream;

pub use session::{DEFAULT_IO_TIMEOUT, MAX_REPLY_LINE, Session};
pub use state::SessionState;
pub use stream::{SmtpStream, connect};

/// How the transport is opened.
///
/// `Ssl` and `Tls` both negotiate TLS before the first SMTP byte (implicit
/// TLS, usually port 465). There is no STARTTLS upgrade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Security {
    /// Plain TCP.
    #[default]
    None,
    /// Implicit TLS, `ssl://` style.
    Ssl,
    /// Implicit TLS, `tls://` style.
    Tls,
}

impl Security {
    /// Returns the conventional port for this security mode.
    #[must_use]
    pub const fn default_port(self) -> u16 {
        match self {
            Self::None => 25,
            Self::Ssl | Self::Tls => 465,
        }
    }
}
