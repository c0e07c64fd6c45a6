//! Builder for creating MikroTik sessions over SSH.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;

use super::options::SessionOptions;
use super::session::Session;
use crate::error::{DriverError, Result};
use crate::platform::{LoginOptions, Platform};
use crate::transport::{AuthMethod, HostKeyVerification, SshConfig, SshConnector};

/// Builder for constructing SSH sessions.
///
/// # Example
///
/// ```rust,no_run
/// use mikrossh::driver::DriverBuilder;
///
/// # fn example() -> Result<(), mikrossh::Error> {
/// let session = DriverBuilder::new("192.168.88.1")
///     .username("admin")
///     .password("secret")
///     .platform("mikrotik_routeros")
///     .build()?;
/// # Ok(())
/// # }
/// ```
pub struct DriverBuilder {
    host: String,
    port: u16,
    username: Option<String>,
    auth: AuthMethod,
    platform_name: Option<String>,
    options: SessionOptions,
    login: LoginOptions,
    host_key_verification: HostKeyVerification,
    known_hosts_path: Option<PathBuf>,
}

impl DriverBuilder {
    /// Create a new builder for the specified host.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: 22,
            username: None,
            auth: AuthMethod::None,
            platform_name: None,
            options: SessionOptions::default(),
            login: LoginOptions::default(),
            host_key_verification: HostKeyVerification::default(),
            known_hosts_path: None,
        }
    }

    /// Set the SSH port (default: 22).
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the username as configured on the device.
    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Set password authentication.
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.auth = AuthMethod::Password(SecretString::from(password.into()));
        self
    }

    /// Set private key authentication.
    pub fn private_key(mut self, key_path: impl Into<PathBuf>) -> Self {
        self.auth = AuthMethod::PrivateKey {
            path: key_path.into(),
            passphrase: None,
        };
        self
    }

    /// Set private key authentication with passphrase.
    pub fn private_key_with_passphrase(
        mut self,
        key_path: impl Into<PathBuf>,
        passphrase: impl Into<String>,
    ) -> Self {
        self.auth = AuthMethod::PrivateKey {
            path: key_path.into(),
            passphrase: Some(SecretString::from(passphrase.into())),
        };
        self
    }

    /// Set the platform name (`mikrotik_routeros` or `mikrotik_switchos`).
    pub fn platform(mut self, platform: impl Into<String>) -> Self {
        self.platform_name = Some(platform.into());
        self
    }

    /// Set the connection and read timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.options.timeout = timeout;
        self
    }

    /// Replace all session options. Overrides an earlier `timeout`.
    pub fn options(mut self, options: SessionOptions) -> Self {
        self.options = options;
        self
    }

    /// Set the console options appended to the username.
    pub fn login_options(mut self, login: LoginOptions) -> Self {
        self.login = login;
        self
    }

    /// Set how the server's host key is checked.
    pub fn host_key_verification(mut self, mode: HostKeyVerification) -> Self {
        self.host_key_verification = mode;
        self
    }

    /// Use a known_hosts file other than `~/.ssh/known_hosts`.
    pub fn known_hosts_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.known_hosts_path = Some(path.into());
        self
    }

    /// Build the session.
    ///
    /// This does not connect. Call `open()` on the returned session. The PTY
    /// is sized from the login options so it matches the console RouterOS
    /// sets up.
    pub fn build(self) -> Result<Session<SshConnector>> {
        let username = self.username.ok_or_else(|| DriverError::InvalidConfig {
            message: "Username is required".to_string(),
        })?;

        let platform = match self.platform_name {
            Some(name) => name.parse::<Platform>()?,
            None => Platform::default(),
        };

        let ssh_config = SshConfig {
            host: self.host,
            port: self.port,
            username,
            auth: self.auth,
            timeout: self.options.timeout,
            terminal_type: "xterm".to_string(),
            terminal_width: self.login.width,
            terminal_height: self.login.height,
            host_key_verification: self.host_key_verification,
            known_hosts_path: self.known_hosts_path,
        };

        Ok(Session::new(SshConnector::new(ssh_config), platform, self.options)
            .with_login_options(self.login))
    }
}
