//! Error types for mikrossh.

use std::io;
use std::time::Duration;

use thiserror::Error;

/// Main error type for mikrossh operations.
#[derive(Error, Debug)]
pub enum Error {
    /// SSH transport-level errors
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Channel operation errors
    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),

    /// Driver-level errors
    #[error("Driver error: {0}")]
    Driver(#[from] DriverError),

    /// Platform errors
    #[error("Platform error: {0}")]
    Platform(#[from] PlatformError),
}

impl Error {
    /// True when this error is a read that did not see its pattern in time.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Channel(ChannelError::PatternTimeout { .. }))
    }

    /// True when the session or its stream has been closed.
    pub fn is_closed(&self) -> bool {
        matches!(
            self,
            Error::Channel(ChannelError::Closed)
                | Error::Driver(DriverError::SessionClosed)
                | Error::Transport(TransportError::Disconnected)
        )
    }
}

impl From<regex::Error> for Error {
    fn from(err: regex::Error) -> Self {
        Error::Channel(ChannelError::InvalidPattern(err))
    }
}

/// Transport layer errors (SSH connection, authentication).
#[derive(Error, Debug)]
pub enum TransportError {
    /// SSH handshake or protocol error
    #[error("SSH error: {0}")]
    Ssh(#[from] russh::Error),

    /// Authentication failed
    #[error("Authentication failed for user '{user}'")]
    AuthenticationFailed { user: String },

    /// SSH key error
    #[error("SSH key error: {0}")]
    Key(String),

    /// Host is not present in known_hosts and verification is strict
    #[error("Host key for {host}:{port} is unknown")]
    HostKeyUnknown { host: String, port: u16 },

    /// Host key differs from the one recorded in known_hosts
    #[error("Host key for {host}:{port} changed (known_hosts line {line})")]
    HostKeyChanged { host: String, port: u16, line: usize },

    /// known_hosts could not be read or written
    #[error("known_hosts error: {0}")]
    KnownHosts(String),

    /// Connection was closed unexpectedly
    #[error("Connection disconnected")]
    Disconnected,

    /// Connecting timed out
    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Channel layer errors (pattern matching, reads and writes).
#[derive(Error, Debug)]
pub enum ChannelError {
    /// Failed to open PTY channel
    #[error("Failed to open PTY channel")]
    PtyOpenFailed,

    /// The expected pattern was not seen before the read timeout
    #[error("Pattern '{pattern}' not found after {elapsed:?}")]
    PatternTimeout { pattern: String, elapsed: Duration },

    /// Channel closed by the remote end
    #[error("Channel closed")]
    Closed,

    /// SSH protocol error on the channel
    #[error("Channel SSH error: {0}")]
    Ssh(russh::Error),

    /// Invalid regex pattern
    #[error("Invalid regex pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}

/// Driver layer errors (session lifecycle, prompt handling).
#[derive(Error, Debug)]
pub enum DriverError {
    /// Session has no open stream yet
    #[error("Session not connected - call open() first")]
    NotConnected,

    /// Session was already opened
    #[error("Session already connected")]
    AlreadyConnected,

    /// Session has been closed; no further operations are possible
    #[error("Session closed")]
    SessionClosed,

    /// The device prompt could not be recognized
    #[error("Router prompt not found in '{output}'")]
    PromptNotFound { output: String },

    /// Invalid configuration in the driver builder
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },
}

/// Platform lookup errors.
#[derive(Error, Debug)]
pub enum PlatformError {
    /// No platform with this name
    #[error("Unknown platform: '{name}'")]
    UnknownPlatform { name: String },
}

/// Result type alias using mikrossh's Error.
pub type Result<T> = std::result::Result<T, Error>;
