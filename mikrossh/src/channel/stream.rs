//! Raw byte stream abstraction the channel layer reads from.

use std::future::Future;

use crate::error::Result;

/// An already-authenticated, interactive byte stream (e.g. an SSH shell channel).
///
/// Implementations only move bytes. Timeouts, buffering and pattern matching
/// are layered on top by [`PtyChannel`](super::PtyChannel).
///
/// `read_chunk` must be cancel-safe: the channel wraps it in a timeout and
/// drops the future when the timeout fires.
pub trait ByteStream: Send {
    /// Write raw bytes to the device.
    fn write(&mut self, data: &[u8]) -> impl Future<Output = Result<()>> + Send;

    /// Wait for the next chunk of output.
    ///
    /// Returns `Ok(None)` once the remote end has closed the stream.
    fn read_chunk(&mut self) -> impl Future<Output = Result<Option<Vec<u8>>>> + Send;

    /// Close the stream.
    fn close(&mut self) -> impl Future<Output = Result<()>> + Send;
}
