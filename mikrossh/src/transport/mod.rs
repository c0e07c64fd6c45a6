//! SSH transport layer wrapping russh.
//!
//! Connection setup and authentication live here. Everything after the shell
//! channel is open goes through the [`ByteStream`](crate::channel::ByteStream)
//! returned by a [`Connector`].

pub mod config;
mod ssh;

use std::future::Future;

pub use config::{AuthMethod, HostKeyVerification, SshConfig};
pub use ssh::{SshChannel, SshConnector, SshTransport};

use crate::channel::ByteStream;
use crate::error::Result;

/// Opens authenticated byte streams to a device.
pub trait Connector: Send + Sync {
    /// The stream type produced once connected.
    type Stream: ByteStream;

    /// The configured username, before any login options are appended.
    fn username(&self) -> &str;

    /// Connect and authenticate as `username`, returning an interactive stream.
    fn connect(&self, username: &str) -> impl Future<Output = Result<Self::Stream>> + Send;
}
