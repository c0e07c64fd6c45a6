//! SSH transport implementation using russh.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use log::{debug, warn};
use russh::client::{self, Handle, Msg};
use russh::keys::{PrivateKeyWithHashAlg, PublicKey, load_secret_key};
use russh::{Channel, ChannelMsg};
use secrecy::ExposeSecret;

use super::Connector;
use super::config::{AuthMethod, HostKeyVerification, SshConfig};
use crate::channel::ByteStream;
use crate::error::{ChannelError, Error, Result, TransportError};

/// SSH transport wrapping a russh client session.
pub struct SshTransport {
    /// The russh session handle.
    session: Handle<SshHandler>,
}

impl SshTransport {
    /// Connect to the SSH server and authenticate as `username`.
    ///
    /// `username` is passed through untouched; RouterOS login options must
    /// already be appended.
    pub async fn connect(config: &SshConfig, username: &str) -> Result<Self> {
        let ssh_config = Arc::new(client::Config {
            inactivity_timeout: None,
            ..Default::default()
        });

        let host_key_error: Arc<Mutex<Option<TransportError>>> = Arc::new(Mutex::new(None));

        let handler = SshHandler {
            host: config.host.clone(),
            port: config.port,
            host_key_verification: config.host_key_verification.clone(),
            known_hosts_path: config.known_hosts_path.clone(),
            host_key_error: host_key_error.clone(),
        };

        debug!("connecting to {}", config.socket_addr());
        let mut session = tokio::time::timeout(
            config.timeout,
            client::connect(ssh_config, (config.host.as_str(), config.port), handler),
        )
        .await
        .map_err(|_| TransportError::Timeout(config.timeout))?
        .map_err(|e| {
            // Prefer the detailed host key error over russh's generic one.
            match host_key_error.lock().ok().and_then(|mut slot| slot.take()) {
                Some(hk_err) => hk_err,
                None => TransportError::Ssh(e),
            }
        })?;

        Self::authenticate(&mut session, config, username).await?;
        debug!("authenticated as {:?}", username);

        Ok(Self { session })
    }

    /// Open a PTY shell channel on this connection.
    pub async fn open_channel(self, config: &SshConfig) -> Result<SshChannel> {
        let channel = self
            .session
            .channel_open_session()
            .await
            .map_err(TransportError::Ssh)?;

        channel
            .request_pty(
                true,
                &config.terminal_type,
                config.terminal_width,
                config.terminal_height,
                0,
                0,
                &[],
            )
            .await
            .map_err(|_| ChannelError::PtyOpenFailed)?;

        channel
            .request_shell(true)
            .await
            .map_err(|_| ChannelError::PtyOpenFailed)?;

        Ok(SshChannel {
            channel,
            session: self.session,
        })
    }

    async fn authenticate(
        session: &mut Handle<SshHandler>,
        config: &SshConfig,
        username: &str,
    ) -> Result<()> {
        let success = match &config.auth {
            AuthMethod::None => session
                .authenticate_none(username)
                .await
                .map_err(TransportError::Ssh)?
                .success(),
            AuthMethod::Password(password) => session
                .authenticate_password(username, password.expose_secret())
                .await
                .map_err(TransportError::Ssh)?
                .success(),
            AuthMethod::PrivateKey { path, passphrase } => {
                let key = load_secret_key(path, passphrase.as_ref().map(|p| p.expose_secret()))
                    .map_err(|e| TransportError::Key(e.to_string()))?;

                let hash_alg = session
                    .best_supported_rsa_hash()
                    .await
                    .map_err(TransportError::Ssh)?
                    .flatten();

                session
                    .authenticate_publickey(
                        username,
                        PrivateKeyWithHashAlg::new(Arc::new(key), hash_alg),
                    )
                    .await
                    .map_err(TransportError::Ssh)?
                    .success()
            }
        };

        if !success {
            return Err(TransportError::AuthenticationFailed {
                user: username.to_string(),
            }
            .into());
        }

        Ok(())
    }
}

/// An interactive shell channel, keeping its SSH session alive.
pub struct SshChannel {
    channel: Channel<Msg>,
    session: Handle<SshHandler>,
}

impl ByteStream for SshChannel {
    async fn write(&mut self, data: &[u8]) -> Result<()> {
        self.channel.data(data).await.map_err(channel_error)
    }

    async fn read_chunk(&mut self) -> Result<Option<Vec<u8>>> {
        loop {
            match self.channel.wait().await {
                Some(ChannelMsg::Data { data }) => return Ok(Some(data.to_vec())),
                Some(ChannelMsg::ExtendedData { data, .. }) => return Ok(Some(data.to_vec())),
                Some(ChannelMsg::Eof) | Some(ChannelMsg::Close) | None => return Ok(None),
                Some(other) => debug!("ignoring channel message: {:?}", other),
            }
        }
    }

    async fn close(&mut self) -> Result<()> {
        // The device may already have dropped the channel.
        if let Err(e) = self.channel.eof().await {
            debug!("sending eof failed: {}", e);
        }
        self.session
            .disconnect(russh::Disconnect::ByApplication, "", "en")
            .await
            .map_err(channel_error)
    }
}

/// Classify a russh error from an open channel. A dropped connection
/// surfaces as [`TransportError::Disconnected`].
fn channel_error(err: russh::Error) -> Error {
    match err {
        russh::Error::Disconnect | russh::Error::SendError => TransportError::Disconnected.into(),
        other => ChannelError::Ssh(other).into(),
    }
}

/// [`Connector`] that opens a PTY shell over SSH.
#[derive(Debug)]
pub struct SshConnector {
    config: SshConfig,
}

impl SshConnector {
    pub fn new(config: SshConfig) -> Self {
        Self { config }
    }

    /// Get the SSH configuration.
    pub fn config(&self) -> &SshConfig {
        &self.config
    }
}

impl Connector for SshConnector {
    type Stream = SshChannel;

    fn username(&self) -> &str {
        &self.config.username
    }

    async fn connect(&self, username: &str) -> Result<SshChannel> {
        let transport = SshTransport::connect(&self.config, username).await?;
        transport.open_channel(&self.config).await
    }
}

/// SSH client handler for russh.
struct SshHandler {
    host: String,
    port: u16,
    host_key_verification: HostKeyVerification,
    known_hosts_path: Option<PathBuf>,
    /// Detailed host key error for connect() to surface.
    host_key_error: Arc<Mutex<Option<TransportError>>>,
}

impl SshHandler {
    /// Check the host key against known_hosts.
    ///
    /// Returns `Ok(true)` if matched, `Ok(false)` if the host is not listed.
    fn check_known_hosts(&self, pubkey: &PublicKey) -> std::result::Result<bool, TransportError> {
        let result = if let Some(ref path) = self.known_hosts_path {
            russh::keys::check_known_hosts_path(&self.host, self.port, pubkey, path)
        } else {
            russh::keys::check_known_hosts(&self.host, self.port, pubkey)
        };

        match result {
            Ok(matched) => Ok(matched),
            Err(russh::keys::Error::KeyChanged { line }) => Err(TransportError::HostKeyChanged {
                host: self.host.clone(),
                port: self.port,
                line,
            }),
            Err(e) => Err(TransportError::KnownHosts(e.to_string())),
        }
    }

    /// Save a new host key to known_hosts.
    fn learn_host_key(&self, pubkey: &PublicKey) -> std::result::Result<(), TransportError> {
        let result = if let Some(ref path) = self.known_hosts_path {
            russh::keys::known_hosts::learn_known_hosts_path(&self.host, self.port, pubkey, path)
        } else {
            russh::keys::known_hosts::learn_known_hosts(&self.host, self.port, pubkey)
        };

        result.map_err(|e| TransportError::KnownHosts(e.to_string()))
    }

    fn reject(&self, error: TransportError) -> bool {
        if let Ok(mut slot) = self.host_key_error.lock() {
            *slot = Some(error);
        }
        false
    }
}

impl client::Handler for SshHandler {
    type Error = russh::Error;

    async fn check_server_key(
        &mut self,
        server_public_key: &PublicKey,
    ) -> std::result::Result<bool, Self::Error> {
        match self.host_key_verification {
            HostKeyVerification::Disabled => Ok(true),

            HostKeyVerification::AcceptNew => match self.check_known_hosts(server_public_key) {
                Ok(true) => Ok(true),
                Ok(false) => {
                    if let Err(e) = self.learn_host_key(server_public_key) {
                        warn!("Failed to save host key: {}", e);
                    }
                    Ok(true)
                }
                Err(e) => Ok(self.reject(e)),
            },

            HostKeyVerification::Strict => match self.check_known_hosts(server_public_key) {
                Ok(true) => Ok(true),
                Ok(false) => Ok(self.reject(TransportError::HostKeyUnknown {
                    host: self.host.clone(),
                    port: self.port,
                })),
                Err(e) => Ok(self.reject(e)),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dropped_connection_is_disconnected() {
        for err in [russh::Error::Disconnect, russh::Error::SendError] {
            let err = channel_error(err);
            assert!(matches!(err, Error::Transport(TransportError::Disconnected)));
            assert!(err.is_closed());
        }
    }

    #[test]
    fn test_other_channel_errors_are_kept() {
        let err = channel_error(russh::Error::WrongChannel);
        assert!(matches!(err, Error::Channel(ChannelError::Ssh(_))));
        assert!(!err.is_closed());
    }
}
