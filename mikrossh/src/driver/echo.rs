//! Command echo reconciliation for repainting consoles.
//!
//! RouterOS echoes a typed command and then often repaints the whole line,
//! prompt included:
//!
//! ```text
//! ping count=5 1.0.0.1
//! [admin@hostname] > ping count=5 1.0.0.1
//!
//!   SEQ HOST                                     SIZE TTL TIME  STATUS
//!     0 1.0.0.1                                    56  60 23ms
//! ```
//!
//! Both copies must be consumed before output is read, or the repaint shows up
//! at the top of the result.

use std::time::Duration;

use log::{debug, trace};

use super::generic::CommandEcho;
use crate::channel::{ByteStream, PtyChannel, patterns};
use crate::error::Result;

/// Echo reader that absorbs an optional second, repainted echo.
#[derive(Debug, Clone)]
pub struct RepaintEcho {
    /// How long to wait for the repaint before assuming there is none.
    pub probe: Duration,
}

impl Default for RepaintEcho {
    fn default() -> Self {
        Self {
            probe: Duration::from_millis(1500),
        }
    }
}

impl CommandEcho for RepaintEcho {
    /// Always returns `command` itself.
    ///
    /// Anything read together with the second echo is discarded. Output is
    /// expected to start after it.
    async fn read_echo<S: ByteStream>(
        &self,
        channel: &mut PtyChannel<S>,
        command: &str,
        read_timeout: Duration,
    ) -> Result<String> {
        let pattern = patterns::literal(command)?;

        let first = channel.read_until_pattern(&pattern, read_timeout).await?;
        trace!("command echo: {:?}", first);

        match channel.read_until_pattern(&pattern, self.probe).await {
            Ok(repaint) => trace!("command repaint: {:?}", repaint),
            Err(e) if e.is_timeout() => debug!("no repaint of {:?} within {:?}", command, self.probe),
            Err(e) => return Err(e),
        }

        Ok(command.to_string())
    }
}
