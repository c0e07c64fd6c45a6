//! Channel layer for pattern matching and PTY operations.
//!
//! This module turns a raw [`ByteStream`] into timed, pattern-driven reads,
//! including ANSI stripping and tail-limited prompt search.

mod buffer;
pub mod patterns;
mod pty;
mod stream;

pub use buffer::PatternBuffer;
pub use pty::{PtyChannel, PtyConfig};
pub use stream::ByteStream;
