//! Device-independent command handling.
//!
//! [`GenericHandler`] holds the base algorithms: writing a command, reading its
//! output by prompt or by timing, linefeed normalization, and echo and prompt
//! stripping. Device-specific code composes it and overrides defaults instead
//! of reimplementing the reads.

use std::future::Future;
use std::time::Duration;

use regex::bytes::Regex;

use super::options::{SendOptions, TimingOptions};
use crate::channel::{ByteStream, PtyChannel};
use crate::error::{DriverError, Result};

/// Line delimiter of normalized output.
pub const RESPONSE_RETURN: &str = "\n";

/// Quiet period ending a timed read when the caller sets none.
pub const DEFAULT_LAST_READ: Duration = Duration::from_secs(2);

/// Overall timed-read limit when the caller sets none.
pub const DEFAULT_TIMING_READ_TIMEOUT: Duration = Duration::from_secs(120);

/// Consumes the device's echo of a just-written command.
pub trait CommandEcho: Send + Sync {
    /// Read past the echo of `command`, returning what should be treated as
    /// the echoed text.
    fn read_echo<S: ByteStream>(
        &self,
        channel: &mut PtyChannel<S>,
        command: &str,
        read_timeout: Duration,
    ) -> impl Future<Output = Result<String>> + Send;
}

/// The base command-handling strategy.
#[derive(Debug, Clone, Default)]
pub struct GenericHandler;

impl GenericHandler {
    /// Convert `\r\n`, `\r\r\n`, `\n\r` and stray `\r` into `\n`.
    pub fn normalize_linefeeds(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        let mut chars = text.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                '\r' => {
                    while chars.peek() == Some(&'\r') {
                        chars.next();
                    }
                    if chars.peek() == Some(&'\n') {
                        chars.next();
                    }
                    out.push('\n');
                }
                '\n' => {
                    if chars.peek() == Some(&'\r') {
                        chars.next();
                    }
                    out.push('\n');
                }
                _ => out.push(c),
            }
        }
        out
    }

    /// Drop the last line when it contains `base_prompt`.
    pub fn strip_prompt(&self, text: &str, base_prompt: &str) -> String {
        match text.rsplit_once(RESPONSE_RETURN) {
            Some((body, last)) if last.contains(base_prompt) => body.to_string(),
            None if text.contains(base_prompt) => String::new(),
            _ => text.to_string(),
        }
    }

    /// Drop the echoed command (the first line) from `output`.
    pub fn strip_command(&self, command: &str, output: &str) -> String {
        let output = self.strip_backspaces(output);
        match output.split_once(RESPONSE_RETURN) {
            Some((first, rest)) if first.contains(command.trim()) => rest.to_string(),
            None if output.contains(command.trim()) => String::new(),
            _ => output,
        }
    }

    /// Remove backspace characters left over from line editing.
    pub fn strip_backspaces(&self, text: &str) -> String {
        text.replace('\u{8}', "")
    }

    /// Discard pending output, settling for `0.1s * delay_factor` first.
    pub async fn clear_buffer<S: ByteStream>(
        &self,
        channel: &mut PtyChannel<S>,
        backoff: bool,
        delay_factor: f64,
        backoff_max: Duration,
    ) -> Result<String> {
        let settle = Duration::try_from_secs_f64(0.1 * delay_factor.max(0.0)).map_err(|_| {
            DriverError::InvalidConfig {
                message: format!("clear buffer delay factor {} is out of range", delay_factor),
            }
        })?;
        channel.clear_buffer(settle, backoff, backoff_max).await
    }

    /// Write `command` followed by `enter`.
    pub async fn write_command<S: ByteStream>(
        &self,
        channel: &mut PtyChannel<S>,
        command: &str,
        enter: &str,
    ) -> Result<()> {
        channel
            .write(&format!("{}{}", command.trim_end(), enter))
            .await
    }

    /// Send a command and read until `prompt` (or `expect_string`) appears.
    ///
    /// Returns the echo (when verified) and the output, linefeed-normalized
    /// and unstripped.
    pub async fn send_command<S: ByteStream, E: CommandEcho>(
        &self,
        channel: &mut PtyChannel<S>,
        echo: &E,
        command: &str,
        enter: &str,
        prompt: &Regex,
        options: &SendOptions,
    ) -> Result<String> {
        let read_timeout = options.read_timeout.unwrap_or(channel.timeout());
        let expect = match &options.expect_string {
            Some(pattern) => Some(Regex::new(pattern)?),
            None => None,
        };

        self.write_command(channel, command, enter).await?;

        let mut output = String::new();
        if options.cmd_verify {
            output.push_str(&echo.read_echo(channel, command.trim(), read_timeout).await?);
        }

        let data = match &expect {
            Some(pattern) => channel.read_until_pattern(pattern, read_timeout).await?,
            None => channel.read_until_prompt(prompt, read_timeout).await?,
        };
        output.push_str(&data);

        Ok(self.normalize_linefeeds(&output))
    }

    /// Send a command and read until the device goes quiet.
    pub async fn send_command_timing<S: ByteStream, E: CommandEcho>(
        &self,
        channel: &mut PtyChannel<S>,
        echo: &E,
        command: &str,
        enter: &str,
        options: &TimingOptions,
    ) -> Result<String> {
        let last_read = options.last_read.unwrap_or(DEFAULT_LAST_READ);
        let read_timeout = options.read_timeout.unwrap_or(DEFAULT_TIMING_READ_TIMEOUT);

        self.write_command(channel, command, enter).await?;

        let mut output = String::new();
        if options.cmd_verify {
            output.push_str(&echo.read_echo(channel, command.trim(), read_timeout).await?);
        }

        output.push_str(&channel.read_timing(last_read, read_timeout).await?);

        Ok(self.normalize_linefeeds(&output))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::testing::ScriptedStream;
    use tokio::time::Instant;
    use tokio_test::{assert_err, assert_ok};

    #[test]
    fn test_normalize_linefeeds() {
        let generic = GenericHandler;
        assert_eq!(generic.normalize_linefeeds("a\r\nb\r\r\nc\n\rd\re"), "a\nb\nc\nd\ne");
        assert_eq!(generic.normalize_linefeeds("no breaks"), "no breaks");
        assert_eq!(generic.normalize_linefeeds("\r\n\r\n"), "\n\n");
    }

    #[test]
    fn test_strip_prompt_last_line_only() {
        let generic = GenericHandler;
        assert_eq!(
            generic.strip_prompt("output\n[admin@r1] >", "[admin@r1] >"),
            "output"
        );
        assert_eq!(
            generic.strip_prompt("[admin@r1] > mid\nlast", "[admin@r1] >"),
            "[admin@r1] > mid\nlast"
        );
        assert_eq!(generic.strip_prompt("[admin@r1] >", "[admin@r1] >"), "");
    }

    #[test]
    fn test_strip_command() {
        let generic = GenericHandler;
        assert_eq!(
            generic.strip_command("/system identity print", "/system identity print\n  name: r1"),
            "  name: r1"
        );
        assert_eq!(
            generic.strip_command("/system identity print", "  name: r1\nmore"),
            "  name: r1\nmore"
        );
        assert_eq!(generic.strip_command("/quit", "/quit"), "");
    }

    #[test]
    fn test_strip_backspaces() {
        let generic = GenericHandler;
        assert_eq!(generic.strip_backspaces("abc\u{8}\u{8}"), "abc");
    }

    #[tokio::test(start_paused = true)]
    async fn test_clear_buffer_delay_factor() {
        let mut channel = PtyChannel::with_defaults(ScriptedStream::new().chunk("banner\r\n"));

        let start = Instant::now();
        let discarded = assert_ok!(
            GenericHandler
                .clear_buffer(&mut channel, false, 10.0, Duration::from_secs(3))
                .await
        );
        assert_eq!(discarded, "banner\r\n");
        // 0.1s per unit of delay factor, twice: one round with data, one without.
        assert_eq!(start.elapsed(), Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_clear_buffer_rejects_huge_delay_factor() {
        let mut channel = PtyChannel::with_defaults(ScriptedStream::new());

        let err = assert_err!(
            GenericHandler
                .clear_buffer(&mut channel, true, 1e30, Duration::from_secs(3))
                .await
        );
        assert!(matches!(err, Error::Driver(DriverError::InvalidConfig { .. })));
    }
}
