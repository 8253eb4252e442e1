//! Sender configuration.
//!
//! A [`SenderConfig`] names the relay, how to reach it and who the mail is
//! from. It is usually loaded from a JSON file:
//!
//! ```json
//! {
//!   "host": "smtp.example.com",
//!   "port": 465,
//!   "security": "ssl",
//!   "username": "user@example.com",
//!   "password": "secret",
//!   "from": "user@example.com",
//!   "name": "Example Sender"
//! }
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default connect timeout in seconds.
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 15;

/// Default per-reply read timeout in seconds.
pub const DEFAULT_IO_TIMEOUT_SECS: u64 = 60;

/// Default hostname announced in EHLO.
pub const DEFAULT_HELO_NAME: &str = "localhost";

/// Security/encryption mode for the relay connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Security {
    /// Plain TCP.
    #[default]
    None,
    /// Implicit TLS.
    Ssl,
    /// Implicit TLS (same handshake as `Ssl`).
    Tls,
}

impl Security {
    /// Get display name for the security mode.
    #[must_use]
    pub const fn display_name(&self) -> &'static str {
        match self {
            Self::None => "None (insecure)",
            Self::Ssl => "SSL",
            Self::Tls => "TLS",
        }
    }
}

impl From<Security> for postline_smtp::Security {
    fn from(security: Security) -> Self {
        match security {
            Security::None => Self::None,
            Security::Ssl => Self::Ssl,
            Security::Tls => Self::Tls,
        }
    }
}

/// Relay and sender settings. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SenderConfig {
    /// Relay hostname.
    #[serde(alias = "smtpHost")]
    pub host: String,
    /// Relay port; defaults from `security` when absent.
    #[serde(default, alias = "smtpPort", skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    /// Connection security.
    #[serde(default)]
    pub security: Security,
    /// Login name; empty disables authentication.
    #[serde(default, alias = "user")]
    pub username: String,
    /// Password; empty disables authentication.
    #[serde(default)]
    pub password: String,
    /// Envelope and header sender address.
    pub from: String,
    /// Display name appended to the `From` header.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Hostname announced in EHLO.
    #[serde(default = "default_helo_name")]
    pub helo_name: String,
    /// Connect timeout in seconds.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    /// Per-reply read timeout in seconds.
    #[serde(default = "default_io_timeout")]
    pub io_timeout_secs: u64,
}

fn default_helo_name() -> String {
    DEFAULT_HELO_NAME.to_string()
}

const fn default_connect_timeout() -> u64 {
    DEFAULT_CONNECT_TIMEOUT_SECS
}

const fn default_io_timeout() -> u64 {
    DEFAULT_IO_TIMEOUT_SECS
}

impl SenderConfig {
    /// Starts a builder for the given relay and sender address.
    #[must_use]
    pub fn builder(host: impl Into<String>, from: impl Into<String>) -> SenderConfigBuilder {
        SenderConfigBuilder {
            config: Self {
                host: host.into(),
                port: None,
                security: Security::default(),
                username: String::new(),
                password: String::new(),
                from: from.into(),
                name: None,
                helo_name: default_helo_name(),
                connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
                io_timeout_secs: DEFAULT_IO_TIMEOUT_SECS,
            },
        }
    }

    /// Parses and validates a JSON configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Serde`] for malformed JSON and [`Error::Config`] if
    /// validation fails.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and validates a JSON configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the file cannot be read, otherwise as
    /// [`SenderConfig::from_json`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Checks the settings that cannot be fixed up later.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] describing the first problem found.
    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(Error::Config("SMTP host is required".into()));
        }
        if self.port == Some(0) {
            return Err(Error::Config("SMTP port must be 1-65535".into()));
        }
        if self.from.trim().is_empty() {
            return Err(Error::Config("Sender address is required".into()));
        }
        if self.helo_name.trim().is_empty() || self.helo_name.contains(char::is_whitespace) {
            return Err(Error::Config(format!(
                "Invalid EHLO hostname: {:?}",
                self.helo_name
            )));
        }
        if self.connect_timeout_secs == 0 || self.io_timeout_secs == 0 {
            return Err(Error::Config("Timeouts must be at least one second".into()));
        }
        Ok(())
    }

    /// Port to connect to: the configured one, or the security default.
    #[must_use]
    pub fn port(&self) -> u16 {
        self.port
            .unwrap_or_else(|| postline_smtp::Security::from(self.security).default_port())
    }

    /// True when both username and password are set.
    #[must_use]
    pub fn has_credentials(&self) -> bool {
        !self.username.is_empty() && !self.password.is_empty()
    }

    /// Connect timeout.
    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Per-reply read timeout.
    #[must_use]
    pub const fn io_timeout(&self) -> Duration {
        Duration::from_secs(self.io_timeout_secs)
    }
}

/// Builder for [`SenderConfig`].
#[derive(Debug, Clone)]
pub struct SenderConfigBuilder {
    config: SenderConfig,
}

impl SenderConfigBuilder {
    /// Sets the relay port.
    #[must_use]
    pub const fn port(mut self, port: u16) -> Self {
        self.config.port = Some(port);
        self
    }

    /// Sets the connection security.
    #[must_use]
    pub const fn security(mut self, security: Security) -> Self {
        self.config.security = security;
        self
    }

    /// Sets login credentials.
    #[must_use]
    pub fn credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.config.username = username.into();
        self.config.password = password.into();
        self
    }

    /// Sets the display name.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.config.name = Some(name.into());
        self
    }

    /// Sets the EHLO hostname.
    #[must_use]
    pub fn helo_name(mut self, helo_name: impl Into<String>) -> Self {
        self.config.helo_name = helo_name.into();
        self
    }

    /// Sets the connect timeout.
    #[must_use]
    pub const fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout_secs = timeout.as_secs();
        self
    }

    /// Sets the per-reply read timeout.
    #[must_use]
    pub const fn io_timeout(mut self, timeout: Duration) -> Self {
        self.config.io_timeout_secs = timeout.as_secs();
        self
    }

    /// Validates and returns the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if validation fails.
    pub fn build(self) -> Result<SenderConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
