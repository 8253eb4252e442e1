//! Submission session state machine.
//!
//! ```text
//! Connecting -> AwaitingGreeting -> AwaitingEhloReply
//!     -> [AwaitingAuthChallenge -> AwaitingUsernameAck -> AwaitingPasswordAck]
//!     -> AwaitingMailFromAck -> AwaitingRcptAck (xN)
//!     -> AwaitingDataIntermediate -> SendingBody -> AwaitingFinalAck -> Completed
//! ```
//!
//! `Failed` is reachable from every non-terminal state.

use std::fmt;

/// Position of a session in the mail transaction.
///
/// Each `Awaiting*` state names the reply the session most recently asked
/// for. Once that reply has been checked the session stays in the state until
/// the next step begins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SessionState {
    /// Transport open, nothing read yet.
    #[default]
    Connecting,
    /// Waiting for the 220 banner.
    AwaitingGreeting,
    /// `EHLO` sent.
    AwaitingEhloReply,
    /// `AUTH LOGIN` sent.
    AwaitingAuthChallenge,
    /// Username sent.
    AwaitingUsernameAck,
    /// Password sent.
    AwaitingPasswordAck,
    /// `MAIL FROM` sent.
    AwaitingMailFromAck,
    /// `RCPT TO` sent (repeats per recipient).
    AwaitingRcptAck,
    /// `DATA` sent.
    AwaitingDataIntermediate,
    /// Message content being written.
    SendingBody,
    /// End-of-data line sent.
    AwaitingFinalAck,
    /// Message accepted and `QUIT` sent.
    Completed,
    /// A step failed; the session accepts no further commands.
    Failed,
}

impl SessionState {
    /// Returns true if the session has reached `next` legally from `self`.
    #[must_use]
    pub const fn can_advance_to(self, next: Self) -> bool {
        use SessionState as S;

        matches!(
            (self, next),
            (S::Connecting, S::AwaitingGreeting)
                | (S::AwaitingGreeting, S::AwaitingEhloReply)
                | (
                    S::AwaitingEhloReply,
                    S::AwaitingAuthChallenge | S::AwaitingMailFromAck
                )
                | (S::AwaitingAuthChallenge, S::AwaitingUsernameAck)
                | (S::AwaitingUsernameAck, S::AwaitingPasswordAck)
                | (S::AwaitingPasswordAck, S::AwaitingMailFromAck)
                | (S::AwaitingMailFromAck, S::AwaitingRcptAck)
                | (
                    S::AwaitingRcptAck,
                    S::AwaitingRcptAck | S::AwaitingDataIntermediate
                )
                | (S::AwaitingDataIntermediate, S::SendingBody)
                | (S::SendingBody, S::AwaitingFinalAck)
                | (S::AwaitingFinalAck, S::Completed)
        )
    }

    /// Returns true for `Completed` and `Failed`.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Connecting => "connecting",
            Self::AwaitingGreeting => "awaiting greeting",
            Self::AwaitingEhloReply => "awaiting EHLO reply",
            Self::AwaitingAuthChallenge => "awaiting AUTH challenge",
            Self::AwaitingUsernameAck => "awaiting username ack",
            Self::AwaitingPasswordAck => "awaiting password ack",
            Self::AwaitingMailFromAck => "awaiting MAIL FROM ack",
            Self::AwaitingRcptAck => "awaiting RCPT TO ack",
            Self::AwaitingDataIntermediate => "awaiting DATA go-ahead",
            Self::SendingBody => "sending body",
            Self::AwaitingFinalAck => "awaiting final ack",
            Self::Completed => "completed",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}
