//! Session and per-command tunables.

use std::time::Duration;

use serde::{Deserialize, Deserializer};

/// Timing and buffering settings for a [`Session`](super::Session).
///
/// Durations deserialize from seconds (`{"timeout": 10, "repaint_probe": 0.5}`).
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SessionOptions {
    /// Read timeout for prompt detection and expect-based sends.
    #[serde(deserialize_with = "seconds")]
    pub timeout: Duration,

    /// How long to wait for a repainted second command echo.
    #[serde(deserialize_with = "seconds")]
    pub repaint_probe: Duration,

    /// Delay factor for buffer clearing; each unit is 100ms of first settle time.
    pub clear_buffer_delay_factor: f64,

    /// Cap on the doubled settle time while clearing the buffer.
    #[serde(deserialize_with = "seconds")]
    pub backoff_max: Duration,

    /// Quiet period that ends a timed read.
    #[serde(deserialize_with = "seconds")]
    pub timing_last_read: Duration,

    /// Overall limit for a timed read.
    #[serde(deserialize_with = "seconds")]
    pub timing_read_timeout: Duration,

    /// Bytes from the end of the buffer searched for the prompt.
    pub search_depth: usize,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            repaint_probe: Duration::from_millis(1500),
            clear_buffer_delay_factor: 10.0,
            backoff_max: Duration::from_secs(3),
            timing_last_read: Duration::from_secs(2),
            timing_read_timeout: Duration::from_secs(120),
            search_depth: 1000,
        }
    }
}

fn seconds<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let secs = f64::deserialize(deserializer)?;
    Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom)
}

/// Options for an expect-based send.
#[derive(Debug, Clone)]
pub struct SendOptions {
    /// Regex to wait for instead of the base prompt.
    pub expect_string: Option<String>,

    /// Overrides the session read timeout.
    pub read_timeout: Option<Duration>,

    /// Remove trailing prompt lines from the result.
    pub strip_prompt: bool,

    /// Remove the echoed command line from the result.
    pub strip_command: bool,

    /// Consume the command echo before reading output.
    pub cmd_verify: bool,
}

impl Default for SendOptions {
    fn default() -> Self {
        Self {
            expect_string: None,
            read_timeout: None,
            strip_prompt: true,
            strip_command: true,
            cmd_verify: true,
        }
    }
}

/// Options for a timing-based send.
#[derive(Debug, Clone)]
pub struct TimingOptions {
    /// Consume the command echo before reading output. Sessions on repainting
    /// consoles force this on.
    pub cmd_verify: bool,

    /// Overrides the session quiet period.
    pub last_read: Option<Duration>,

    /// Overrides the session overall timed-read limit.
    pub read_timeout: Option<Duration>,

    pub strip_prompt: bool,
    pub strip_command: bool,
}

impl Default for TimingOptions {
    fn default() -> Self {
        Self {
            cmd_verify: false,
            last_read: None,
            read_timeout: None,
            strip_prompt: true,
            strip_command: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = SessionOptions::default();
        assert_eq!(options.repaint_probe, Duration::from_millis(1500));
        assert_eq!(options.clear_buffer_delay_factor, 10.0);
    }

    #[test]
    fn test_deserialize_seconds() {
        let options: SessionOptions =
            serde_json::from_str(r#"{"timeout": 10, "repaint_probe": 0.5}"#).unwrap();
        assert_eq!(options.timeout, Duration::from_secs(10));
        assert_eq!(options.repaint_probe, Duration::from_millis(500));
        assert_eq!(options.backoff_max, Duration::from_secs(3));
    }

    #[test]
    fn test_deserialize_rejects_negative() {
        assert!(serde_json::from_str::<SessionOptions>(r#"{"timeout": -1}"#).is_err());
    }
}
