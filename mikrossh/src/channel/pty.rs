//! PTY channel abstraction for interactive sessions.

use std::time::Duration;

use log::trace;
use regex::bytes::Regex;
use tokio::time::{Instant, timeout, timeout_at};

use super::buffer::PatternBuffer;
use super::stream::ByteStream;
use crate::error::{ChannelError, Result};

/// Upper bound on settle rounds in [`PtyChannel::clear_buffer`].
const CLEAR_BUFFER_ROUNDS: usize = 10;

/// Stand-in deadline for timeouts too large to add to an `Instant`.
const FAR_FUTURE: Duration = Duration::from_secs(86400 * 365 * 30);

fn deadline_after(start: Instant, timeout: Duration) -> Instant {
    start
        .checked_add(timeout)
        .unwrap_or_else(|| start + FAR_FUTURE)
}

/// Configuration for PTY channel behavior.
#[derive(Debug, Clone)]
pub struct PtyConfig {
    /// Default timeout for reads.
    pub timeout: Duration,

    /// Search depth for prompt matching.
    pub search_depth: usize,
}

impl Default for PtyConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            search_depth: 1000,
        }
    }
}

/// High-level PTY channel for interactive device sessions.
///
/// Wraps a raw [`ByteStream`] and provides pattern-based reads with timeout
/// handling. Output read past a match is kept for the next read.
pub struct PtyChannel<S> {
    /// The underlying byte stream.
    stream: S,

    /// Configuration for this channel.
    config: PtyConfig,

    /// Unread output.
    buffer: PatternBuffer,

    /// Cleared once the remote end closes the stream or `close()` is called.
    is_open: bool,
}

impl<S: ByteStream> PtyChannel<S> {
    /// Wrap a stream with the given configuration.
    pub fn new(stream: S, config: PtyConfig) -> Self {
        Self {
            buffer: PatternBuffer::new(config.search_depth),
            stream,
            config,
            is_open: true,
        }
    }

    /// Wrap a stream with default configuration.
    pub fn with_defaults(stream: S) -> Self {
        Self::new(stream, PtyConfig::default())
    }

    /// Check if the channel is open.
    pub fn is_open(&self) -> bool {
        self.is_open
    }

    /// Get the default timeout.
    pub fn timeout(&self) -> Duration {
        self.config.timeout
    }

    /// Remove ANSI escape sequences from output read from now on.
    pub fn set_strip_ansi(&mut self, strip: bool) {
        self.buffer.set_strip_ansi(strip);
    }

    /// Get a reference to the unread buffer.
    pub fn buffer(&self) -> &PatternBuffer {
        &self.buffer
    }

    /// Write raw text to the device.
    pub async fn write(&mut self, data: &str) -> Result<()> {
        self.ensure_open()?;
        trace!("write_channel: {:?}", data);
        self.stream.write(data.as_bytes()).await
    }

    /// Read until `pattern` matches anywhere in the unread output.
    ///
    /// Returns everything up to and including the first match. Bytes after
    /// the match stay buffered.
    pub async fn read_until_pattern(&mut self, pattern: &Regex, timeout: Duration) -> Result<String> {
        self.read_until(pattern.as_str(), timeout, |buffer| {
            buffer.search_full(pattern).map(|m| m.end)
        })
        .await
    }

    /// Read until `pattern` matches in the tail of the unread output.
    ///
    /// Used with end-anchored prompt patterns. Only the last `search_depth`
    /// bytes are searched.
    pub async fn read_until_prompt(&mut self, pattern: &Regex, timeout: Duration) -> Result<String> {
        self.read_until(pattern.as_str(), timeout, |buffer| {
            buffer.search_tail(pattern).map(|m| m.end)
        })
        .await
    }

    /// Read until any byte from `charset` appears.
    ///
    /// Returns everything up to and including that byte.
    pub async fn read_until_any_of(&mut self, charset: &[u8], timeout: Duration) -> Result<String> {
        let describe = format!("[{}]", String::from_utf8_lossy(charset));
        self.read_until(&describe, timeout, |buffer| {
            buffer.find_any_of(charset).map(|pos| pos + 1)
        })
        .await
    }

    /// Read until the device goes quiet.
    ///
    /// Once some output has arrived, reading stops after `last_read` passes
    /// with no new data. Fails if `read_timeout` elapses first.
    pub async fn read_timing(&mut self, last_read: Duration, read_timeout: Duration) -> Result<String> {
        self.ensure_open()?;
        let start = Instant::now();
        let deadline = deadline_after(start, read_timeout);

        loop {
            let wait_until = if self.buffer.is_empty() {
                deadline
            } else {
                deadline_after(Instant::now(), last_read).min(deadline)
            };

            match timeout_at(wait_until, self.stream.read_chunk()).await {
                Ok(Ok(Some(chunk))) => self.append(&chunk),
                Ok(Ok(None)) => {
                    self.is_open = false;
                    if self.buffer.is_empty() {
                        return Err(ChannelError::Closed.into());
                    }
                    return Ok(self.take_string());
                }
                Ok(Err(e)) => return Err(e),
                Err(_) if !self.buffer.is_empty() && wait_until < deadline => {
                    return Ok(self.take_string());
                }
                Err(_) => {
                    return Err(ChannelError::PatternTimeout {
                        pattern: format!("<quiet for {:?}>", last_read),
                        elapsed: start.elapsed(),
                    }
                    .into());
                }
            }
        }
    }

    /// Drain whatever is buffered or immediately readable, without waiting.
    pub async fn read_available(&mut self) -> Result<String> {
        while self.is_open {
            match timeout(Duration::ZERO, self.stream.read_chunk()).await {
                Ok(Ok(Some(chunk))) => self.append(&chunk),
                Ok(Ok(None)) => self.is_open = false,
                Ok(Err(e)) => return Err(e),
                Err(_) => break,
            }
        }
        Ok(self.take_string())
    }

    /// Discard pending output, waiting for the device to settle.
    ///
    /// Sleeps `settle`, drains, and repeats while data keeps arriving. With
    /// `backoff` the sleep doubles after every non-empty round, capped at
    /// `backoff_max`. Returns everything that was discarded.
    pub async fn clear_buffer(
        &mut self,
        settle: Duration,
        backoff: bool,
        backoff_max: Duration,
    ) -> Result<String> {
        self.ensure_open()?;
        let mut output = self.take_string();
        let mut sleep_time = settle;

        for _ in 0..CLEAR_BUFFER_ROUNDS {
            tokio::time::sleep(sleep_time).await;
            let data = self.read_available().await?;
            if data.is_empty() {
                break;
            }
            output.push_str(&data);

            if backoff {
                sleep_time = sleep_time.saturating_mul(2).min(backoff_max);
            }
        }

        trace!("clear_buffer: discarded {} bytes", output.len());
        Ok(output)
    }

    /// Close the underlying stream.
    pub async fn close(&mut self) -> Result<()> {
        if !self.is_open {
            return Ok(());
        }
        self.is_open = false;
        self.stream.close().await
    }

    async fn read_until<F>(&mut self, describe: &str, timeout: Duration, mut locate: F) -> Result<String>
    where
        F: FnMut(&PatternBuffer) -> Option<usize>,
    {
        self.ensure_open()?;
        let start = Instant::now();
        let deadline = deadline_after(start, timeout);

        loop {
            if let Some(end) = locate(&self.buffer) {
                let data = self.buffer.consume_to(end);
                return Ok(String::from_utf8_lossy(&data).into_owned());
            }

            match timeout_at(deadline, self.stream.read_chunk()).await {
                Ok(Ok(Some(chunk))) => self.append(&chunk),
                Ok(Ok(None)) => {
                    self.is_open = false;
                    return Err(ChannelError::Closed.into());
                }
                Ok(Err(e)) => return Err(e),
                Err(_) => {
                    return Err(ChannelError::PatternTimeout {
                        pattern: describe.to_string(),
                        elapsed: start.elapsed(),
                    }
                    .into());
                }
            }
        }
    }

    fn append(&mut self, chunk: &[u8]) {
        trace!("read_channel: {:?}", String::from_utf8_lossy(chunk));
        self.buffer.extend(chunk);
    }

    fn take_string(&mut self) -> String {
        String::from_utf8_lossy(&self.buffer.take()).into_owned()
    }

    fn ensure_open(&self) -> Result<()> {
        if self.is_open {
            Ok(())
        } else {
            Err(ChannelError::Closed.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::patterns;
    use crate::testing::ScriptedStream;
    use tokio_test::{assert_err, assert_ok};

    fn channel(stream: ScriptedStream) -> PtyChannel<ScriptedStream> {
        PtyChannel::with_defaults(stream)
    }

    #[tokio::test(start_paused = true)]
    async fn test_read_until_pattern_keeps_remainder() {
        let stream = ScriptedStream::new().chunk("/system identity print\r\n  name: r1\r\n");
        let mut channel = channel(stream);

        let pattern = patterns::literal("/system identity print").unwrap();
        let data = assert_ok!(channel.read_until_pattern(&pattern, Duration::from_secs(1)).await);
        assert_eq!(data, "/system identity print");
        assert_eq!(channel.buffer().as_slice(), b"\r\n  name: r1\r\n");
    }

    #[tokio::test(start_paused = true)]
    async fn test_read_until_pattern_across_chunks() {
        let stream = ScriptedStream::new().chunk("/interface pr").chunk("int\r\n");
        let mut channel = channel(stream);

        let pattern = patterns::literal("/interface print").unwrap();
        let data = assert_ok!(channel.read_until_pattern(&pattern, Duration::from_secs(1)).await);
        assert_eq!(data, "/interface print");
    }

    #[tokio::test(start_paused = true)]
    async fn test_read_timeout_names_pattern() {
        let mut channel = channel(ScriptedStream::new().chunk("unrelated"));

        let pattern = patterns::literal("never").unwrap();
        let start = Instant::now();
        let err = assert_err!(channel.read_until_pattern(&pattern, Duration::from_secs(2)).await);
        assert!(err.is_timeout());
        assert!(err.to_string().contains("never"));
        assert_eq!(start.elapsed(), Duration::from_secs(2));
        // Nothing read during the timed-out wait is lost.
        assert_eq!(channel.buffer().as_slice(), b"unrelated");
    }

    #[tokio::test(start_paused = true)]
    async fn test_unbounded_timeouts() {
        let stream = ScriptedStream::new()
            .chunk("/system identity print\r\n")
            .chunk("  name: r1\r\n");
        let mut channel = channel(stream);

        let pattern = patterns::literal("/system identity print").unwrap();
        assert_ok!(channel.read_until_pattern(&pattern, Duration::MAX).await);

        let start = Instant::now();
        let data = assert_ok!(channel.read_timing(Duration::from_secs(2), Duration::MAX).await);
        assert_eq!(data, "\r\n  name: r1\r\n");
        assert_eq!(start.elapsed(), Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_read_until_any_of() {
        let mut channel = channel(ScriptedStream::new().chunk("MikroTik RouterOS\r\n[admin@r1] > "));
        let data = assert_ok!(channel.read_until_any_of(b"]>", Duration::from_secs(1)).await);
        assert_eq!(data, "MikroTik RouterOS\r\n[admin@r1]");
        assert_eq!(channel.buffer().as_slice(), b" > ");
    }

    #[tokio::test(start_paused = true)]
    async fn test_read_until_prompt_ignores_mid_buffer_prompt() {
        let stream = ScriptedStream::new()
            .chunk("[admin@r1] > /log print\r\n")
            .chunk("12:00 [admin@r1] > logged in\r\n\r\n[admin@r1] > ");
        let mut channel = channel(stream);

        let pattern = patterns::base_prompt_pattern("[admin@r1] >").unwrap();
        let data = assert_ok!(channel.read_until_prompt(&pattern, Duration::from_secs(1)).await);
        assert!(data.ends_with("\r\n\r\n[admin@r1] > "));
        assert!(data.contains("logged in"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_closed_stream() {
        let mut channel = channel(ScriptedStream::new().chunk("partial").eof());

        let pattern = patterns::literal("never").unwrap();
        let err = assert_err!(channel.read_until_pattern(&pattern, Duration::from_secs(1)).await);
        assert!(err.is_closed());
        assert!(!channel.is_open());
        assert!(channel.write("x").await.unwrap_err().is_closed());
    }

    #[tokio::test(start_paused = true)]
    async fn test_read_timing_stops_when_quiet() {
        let stream = ScriptedStream::new()
            .chunk("line 1\r\n")
            .chunk("line 2\r\n");
        let mut channel = channel(stream);

        let start = Instant::now();
        let data = assert_ok!(
            channel
                .read_timing(Duration::from_secs(2), Duration::from_secs(120))
                .await
        );
        assert_eq!(data, "line 1\r\nline 2\r\n");
        assert_eq!(start.elapsed(), Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_read_timing_without_output_times_out() {
        let mut channel = channel(ScriptedStream::new());
        let err = assert_err!(
            channel
                .read_timing(Duration::from_secs(2), Duration::from_secs(10))
                .await
        );
        assert!(err.is_timeout());
    }

    #[tokio::test(start_paused = true)]
    async fn test_clear_buffer_backoff() {
        let stream = ScriptedStream::new().chunk("banner\r\n").delayed_chunk(
            Duration::from_millis(1500),
            "[admin@r1] > ",
        );
        let mut channel = channel(stream);

        let start = Instant::now();
        let discarded = assert_ok!(
            channel
                .clear_buffer(Duration::from_secs(1), true, Duration::from_secs(3))
                .await
        );
        assert_eq!(discarded, "banner\r\n[admin@r1] > ");
        // 1s settle, then 2s (doubled), then 3s (capped) with nothing left.
        assert_eq!(start.elapsed(), Duration::from_secs(6));
        assert!(channel.buffer().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_clear_buffer_backoff_saturates() {
        let mut channel = channel(ScriptedStream::new().chunk("banner\r\n"));

        let discarded = assert_ok!(
            channel
                .clear_buffer(Duration::MAX, true, Duration::MAX)
                .await
        );
        assert_eq!(discarded, "banner\r\n");
    }
}
