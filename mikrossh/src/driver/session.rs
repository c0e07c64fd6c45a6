//! MikroTik session: prompt detection, command sends and capability stubs.

use log::debug;
use regex::bytes::Regex;
use tokio::time::Instant;

use super::Driver;
use super::echo::RepaintEcho;
use super::generic::GenericHandler;
use super::options::{SendOptions, SessionOptions, TimingOptions};
use super::privilege::{NoEnable, PrivilegeMode};
use super::prompt;
use super::response::Response;
use super::state::SessionState;
use crate::channel::{PtyChannel, PtyConfig, patterns};
use crate::error::{DriverError, Result};
use crate::platform::{DEFAULT_ENTER, INITIAL_READ_TERMINATORS, LoginOptions, PROMPT_TERMINATOR, Platform};
use crate::transport::Connector;

/// A command session with a MikroTik device.
///
/// Wraps the stream produced by a [`Connector`] and turns the device's noisy,
/// repainting console into clean per-command [`Response`]s. Obtain one from
/// [`DriverBuilder`](super::DriverBuilder) or [`Session::new`], then call
/// [`open`](Session::open).
///
/// ```no_run
/// use mikrossh::{Driver, DriverBuilder};
///
/// # async fn run() -> Result<(), mikrossh::Error> {
/// let mut session = DriverBuilder::new("192.168.88.1")
///     .username("admin")
///     .password("secret")
///     .build()?;
///
/// session.open().await?;
/// let response = session.send_command("/system identity print").await?;
/// println!("{}", response.result);
/// session.close().await?;
/// # Ok(())
/// # }
/// ```
pub struct Session<C: Connector> {
    connector: C,
    platform: Platform,
    options: SessionOptions,
    login: LoginOptions,
    channel: Option<PtyChannel<C::Stream>>,
    state: SessionState,

    /// Trimmed prompt captured by `set_base_prompt`.
    base_prompt: String,

    /// `base_prompt` anchored to the end of the buffer.
    prompt_pattern: Option<Regex>,

    /// Set and cleared by `config_mode`/`exit_config_mode` only. RouterOS has
    /// no configuration mode, so nothing on the device tracks it.
    in_config_mode: bool,

    line_terminator: String,
    ansi_escape_enabled: bool,

    generic: GenericHandler,
    echo: RepaintEcho,
    privilege: NoEnable,
}

impl<C: Connector> Session<C> {
    /// Create an unopened session.
    pub fn new(connector: C, platform: Platform, options: SessionOptions) -> Self {
        let echo = RepaintEcho {
            probe: options.repaint_probe,
        };

        Self {
            connector,
            platform,
            options,
            login: LoginOptions::default(),
            channel: None,
            state: SessionState::Unauthenticated,
            base_prompt: String::new(),
            prompt_pattern: None,
            in_config_mode: false,
            line_terminator: DEFAULT_ENTER.to_string(),
            ansi_escape_enabled: true,
            generic: GenericHandler,
            echo,
            privilege: NoEnable,
        }
    }

    /// Replace the login options appended to the username.
    pub fn with_login_options(mut self, login: LoginOptions) -> Self {
        self.login = login;
        self
    }

    /// Connect, detect the prompt and settle the session.
    ///
    /// The username is shaped with the login options before the connector
    /// authenticates. If connecting or preparing fails, the stream is closed
    /// and the session is left unauthenticated so `open` can be retried.
    pub async fn open(&mut self) -> Result<()> {
        match self.state {
            SessionState::Unauthenticated => {}
            SessionState::Closed => return Err(DriverError::SessionClosed.into()),
            _ => return Err(DriverError::AlreadyConnected.into()),
        }

        let username = self.login.shape_username(self.connector.username());
        self.set_state(SessionState::Authenticating);

        let stream = match self.connector.connect(&username).await {
            Ok(stream) => stream,
            Err(e) => {
                self.set_state(SessionState::Unauthenticated);
                return Err(e);
            }
        };

        self.channel = Some(PtyChannel::new(
            stream,
            PtyConfig {
                timeout: self.options.timeout,
                search_depth: self.options.search_depth,
            },
        ));

        if let Err(e) = self.prepare_session().await {
            self.abandon_channel().await;
            return Err(e);
        }
        Ok(())
    }

    /// Elicit the current prompt and return it without storing it.
    pub async fn find_prompt(&mut self) -> Result<String> {
        let result = self.read_prompt().await;
        self.track(result)
    }

    /// Send a command with explicit expect-read options.
    pub async fn send_command_with(&mut self, command: &str, options: SendOptions) -> Result<Response> {
        let result = self.send_expect(command, &options).await;
        self.track(result)
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// The stored prompt, empty until detected.
    pub fn base_prompt(&self) -> &str {
        &self.base_prompt
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }

    fn set_state(&mut self, state: SessionState) {
        if self.state != state {
            debug!("session state: {} -> {}", self.state, state);
            self.state = state;
        }
    }

    /// Drop a stream that never became usable, so `open` can be retried.
    async fn abandon_channel(&mut self) {
        if let Some(mut channel) = self.channel.take()
            && let Err(e) = channel.close().await
        {
            debug!("closing unprepared channel failed: {}", e);
        }
        self.base_prompt.clear();
        self.prompt_pattern = None;
        self.set_state(SessionState::Unauthenticated);
    }

    /// Move to `Closed` when `result` says the stream is gone.
    fn track<T>(&mut self, result: Result<T>) -> Result<T> {
        if let Err(e) = &result
            && e.is_closed()
        {
            self.set_state(SessionState::Closed);
        }
        result
    }

    async fn prepare(&mut self) -> Result<()> {
        let channel = live_channel(self.state, &mut self.channel)?;
        channel.set_strip_ansi(self.ansi_escape_enabled);

        let banner = channel
            .read_until_any_of(INITIAL_READ_TERMINATORS, self.options.timeout)
            .await?;
        let rest = channel.read_available().await?;
        debug!("login banner: {:?}{:?}", banner, rest);

        self.set_base_prompt().await?;
        self.clear_buffer().await?;
        self.set_state(SessionState::Ready);
        Ok(())
    }

    async fn read_prompt(&mut self) -> Result<String> {
        let channel = live_channel(self.state, &mut self.channel)?;
        let terminator = patterns::terminator_pattern(&[PROMPT_TERMINATOR])?;

        self.generic
            .write_command(channel, "", &self.line_terminator)
            .await?;
        let output = channel
            .read_until_prompt(&terminator, self.options.timeout)
            .await?;

        prompt::extract_prompt(&self.generic, &output)
    }

    async fn store_base_prompt(&mut self) -> Result<String> {
        let found = self.read_prompt().await?;
        self.prompt_pattern = Some(patterns::base_prompt_pattern(&found)?);
        self.base_prompt = found;
        debug!("base prompt: {:?}", self.base_prompt);

        if self.state == SessionState::Authenticating {
            self.set_state(SessionState::PromptDetected);
        }
        Ok(self.base_prompt.clone())
    }

    async fn send_expect(&mut self, command: &str, options: &SendOptions) -> Result<Response> {
        let start = Instant::now();
        let channel = live_channel(self.state, &mut self.channel)?;
        let Some(prompt) = &self.prompt_pattern else {
            return Err(DriverError::PromptNotFound {
                output: String::new(),
            }
            .into());
        };

        let raw = self
            .generic
            .send_command(channel, &self.echo, command, &self.line_terminator, prompt, options)
            .await?;

        Ok(self.response(command, raw, options.strip_command, options.strip_prompt, start))
    }

    async fn send_timing(&mut self, command: &str, options: TimingOptions) -> Result<Response> {
        let start = Instant::now();
        let channel = live_channel(self.state, &mut self.channel)?;

        // The echo is read even when the caller opted out, or the repaint
        // lands in the output.
        let options = TimingOptions {
            cmd_verify: true,
            last_read: options.last_read.or(Some(self.options.timing_last_read)),
            read_timeout: options.read_timeout.or(Some(self.options.timing_read_timeout)),
            ..options
        };

        let raw = self
            .generic
            .send_command_timing(channel, &self.echo, command, &self.line_terminator, &options)
            .await?;

        Ok(self.response(command, raw, options.strip_command, options.strip_prompt, start))
    }

    fn response(
        &self,
        command: &str,
        raw: String,
        strip_command: bool,
        strip_prompt: bool,
        start: Instant,
    ) -> Response {
        let mut result = raw.clone();
        if strip_command {
            result = self.generic.strip_command(command, &result);
        }
        if strip_prompt {
            result = Driver::strip_prompt(self, &result);
        }

        let failure = self.platform.detect_failure(&result);
        if let Some(pattern) = failure {
            debug!("{:?} failed: output contains {:?}", command, pattern);
        }

        Response::new(
            command,
            result,
            raw,
            self.base_prompt.as_str(),
            start.elapsed(),
            failure,
        )
    }
}

/// The channel, if the session is in a state that may use it.
fn live_channel<S>(state: SessionState, channel: &mut Option<PtyChannel<S>>) -> Result<&mut PtyChannel<S>> {
    match state {
        SessionState::Closed => Err(DriverError::SessionClosed.into()),
        SessionState::Unauthenticated => Err(DriverError::NotConnected.into()),
        _ => channel.as_mut().ok_or_else(|| DriverError::NotConnected.into()),
    }
}

impl<C: Connector> Driver for Session<C> {
    async fn prepare_session(&mut self) -> Result<()> {
        let result = self.prepare().await;
        self.track(result)
    }

    /// Store the prompt as the base prompt. Safe to call again at any time.
    async fn set_base_prompt(&mut self) -> Result<String> {
        let result = self.store_base_prompt().await;
        self.track(result)
    }

    async fn send_command(&mut self, command: &str) -> Result<Response> {
        self.send_command_with(command, SendOptions::default()).await
    }

    async fn send_command_timing(&mut self, command: &str, options: TimingOptions) -> Result<Response> {
        let result = self.send_timing(command, options).await;
        self.track(result)
    }

    async fn clear_buffer(&mut self) -> Result<String> {
        let result = match live_channel(self.state, &mut self.channel) {
            Ok(channel) => {
                self.generic
                    .clear_buffer(
                        channel,
                        true,
                        self.options.clear_buffer_delay_factor,
                        self.options.backoff_max,
                    )
                    .await
            }
            Err(e) => Err(e),
        };
        self.track(result)
    }

    /// RouterOS never pages when logged in with a large terminal height.
    async fn disable_paging(&mut self) -> Result<String> {
        Ok(String::new())
    }

    /// RouterOS applies every change immediately.
    async fn save_config(&mut self) -> Result<String> {
        Ok(String::new())
    }

    async fn config_mode(&mut self) -> Result<String> {
        self.in_config_mode = true;
        Ok(String::new())
    }

    async fn exit_config_mode(&mut self) -> Result<String> {
        self.in_config_mode = false;
        Ok(String::new())
    }

    fn check_config_mode(&self) -> bool {
        self.in_config_mode
    }

    async fn enable(&mut self) -> Result<String> {
        Ok(self.privilege.enable())
    }

    async fn exit_enable_mode(&mut self) -> Result<String> {
        Ok(self.privilege.exit_enable_mode())
    }

    fn check_enable_mode(&self) -> bool {
        self.privilege.check_enable_mode()
    }

    fn strip_prompt(&self, text: &str) -> String {
        prompt::strip_prompt(&self.generic, text, &self.base_prompt)
    }

    async fn close(&mut self) -> Result<()> {
        if self.state == SessionState::Closed {
            return Ok(());
        }
        self.set_state(SessionState::Closed);

        match self.channel.take() {
            Some(mut channel) => channel.close().await,
            None => Ok(()),
        }
    }

    fn is_open(&self) -> bool {
        self.state == SessionState::Ready && self.channel.as_ref().is_some_and(|c| c.is_open())
    }
}
