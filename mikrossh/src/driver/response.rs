//! Command results.

use std::fmt;
use std::time::Duration;

/// Output of one command sent through a [`Session`](super::Session).
#[derive(Debug, Clone)]
pub struct Response {
    /// The command that was sent.
    pub command: String,

    /// Cleaned output: echo and trailing prompt removed.
    pub result: String,

    /// Output as read, after ANSI stripping and linefeed normalization.
    pub raw_result: String,

    /// Base prompt the output was delimited by.
    pub prompt: String,

    /// Time from write to the end of the read.
    pub elapsed: Duration,

    /// Failure pattern found in the output, if any.
    pub failure_message: Option<String>,
}

impl Response {
    /// Build a response, marking it failed when `failure` is set.
    pub(crate) fn new(
        command: impl Into<String>,
        result: impl Into<String>,
        raw_result: impl Into<String>,
        prompt: impl Into<String>,
        elapsed: Duration,
        failure: Option<&str>,
    ) -> Self {
        Self {
            command: command.into(),
            result: result.into(),
            raw_result: raw_result.into(),
            prompt: prompt.into(),
            elapsed,
            failure_message: failure.map(str::to_string),
        }
    }

    /// True when no failure pattern was found.
    pub fn is_success(&self) -> bool {
        self.failure_message.is_none()
    }

    /// Iterate over result lines.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.result.lines()
    }

    /// Check if the result contains a substring.
    pub fn contains(&self, pattern: &str) -> bool {
        self.result.contains(pattern)
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_response() {
        let response = Response::new(
            "/sytem resource print",
            "bad command name sytem (line 1 column 2)",
            "/sytem resource print\nbad command name sytem (line 1 column 2)\n[admin@r1] >",
            "[admin@r1] >",
            Duration::from_millis(40),
            Some("bad command name"),
        );
        assert!(!response.is_success());
        assert_eq!(response.failure_message.as_deref(), Some("bad command name"));
    }

    #[test]
    fn test_lines_and_display() {
        let response = Response::new(
            "/system identity print",
            "  name: r1",
            "",
            "[admin@r1] >",
            Duration::ZERO,
            None,
        );
        assert!(response.is_success());
        assert_eq!(response.lines().collect::<Vec<_>>(), vec!["  name: r1"]);
        assert!(response.contains("r1"));
        assert_eq!(response.to_string(), "  name: r1");
    }
}
