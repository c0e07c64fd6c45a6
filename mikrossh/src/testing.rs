//! Scripted device doubles for unit tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::time::Instant;

use crate::channel::ByteStream;
use crate::error::{Result, TransportError};
use crate::transport::Connector;

/// One scripted output event. `data == None` means EOF.
#[derive(Debug, Clone)]
struct Event {
    at: Option<Instant>,
    data: Option<Vec<u8>>,
}

/// Replays canned device output and records everything written.
#[derive(Debug, Default)]
pub struct ScriptedStream {
    events: VecDeque<Event>,
    /// Output released by successive writes, each chunk delayed relative to
    /// its write. `None` means EOF.
    replies: VecDeque<Vec<(Duration, Option<Vec<u8>>)>>,
    writes: Arc<Mutex<Vec<String>>>,
    closed: Arc<Mutex<bool>>,
}

impl ScriptedStream {
    pub fn new() -> Self {
        Self::default()
    }

    /// Output available immediately.
    pub fn chunk(mut self, data: &str) -> Self {
        self.events.push_back(Event {
            at: None,
            data: Some(data.as_bytes().to_vec()),
        });
        self
    }

    /// Output that becomes readable `delay` after the script was built.
    pub fn delayed_chunk(mut self, delay: Duration, data: &str) -> Self {
        self.events.push_back(Event {
            at: Some(Instant::now() + delay),
            data: Some(data.as_bytes().to_vec()),
        });
        self
    }

    /// The remote end closes the stream.
    pub fn eof(mut self) -> Self {
        self.events.push_back(Event { at: None, data: None });
        self
    }

    /// Output sent in response to the next unanswered write.
    pub fn reply(mut self, chunks: &[&str]) -> Self {
        self.replies.push_back(
            chunks
                .iter()
                .map(|c| (Duration::ZERO, Some(c.as_bytes().to_vec())))
                .collect(),
        );
        self
    }

    /// Like [`reply`](Self::reply), with each chunk arriving after its delay.
    pub fn reply_delayed(mut self, chunks: &[(Duration, &str)]) -> Self {
        self.replies.push_back(
            chunks
                .iter()
                .map(|(delay, c)| (*delay, Some(c.as_bytes().to_vec())))
                .collect(),
        );
        self
    }

    /// The remote end closes the stream after the last queued reply.
    pub fn hangup(mut self) -> Self {
        match self.replies.back_mut() {
            Some(group) => group.push((Duration::ZERO, None)),
            None => self.replies.push_back(vec![(Duration::ZERO, None)]),
        }
        self
    }

    /// A handle to the write log that stays usable after the stream is moved.
    pub fn write_log(&self) -> WriteLog {
        WriteLog {
            writes: self.writes.clone(),
            closed: self.closed.clone(),
        }
    }
}

impl ByteStream for ScriptedStream {
    async fn write(&mut self, data: &[u8]) -> Result<()> {
        self.writes
            .lock()
            .unwrap()
            .push(String::from_utf8_lossy(data).into_owned());

        if let Some(group) = self.replies.pop_front() {
            let now = Instant::now();
            self.events.extend(group.into_iter().map(|(delay, data)| Event {
                at: (!delay.is_zero()).then(|| now + delay),
                data,
            }));
        }
        Ok(())
    }

    async fn read_chunk(&mut self) -> Result<Option<Vec<u8>>> {
        let at = match self.events.front() {
            None => std::future::pending().await,
            Some(event) => event.at,
        };

        if let Some(at) = at {
            tokio::time::sleep_until(at).await;
        }

        match self.events.pop_front() {
            Some(Event { data: Some(data), .. }) => Ok(Some(data)),
            _ => Ok(None),
        }
    }

    async fn close(&mut self) -> Result<()> {
        *self.closed.lock().unwrap() = true;
        Ok(())
    }
}

/// Shared view of what a [`ScriptedStream`] has been sent.
#[derive(Debug, Clone)]
pub struct WriteLog {
    writes: Arc<Mutex<Vec<String>>>,
    closed: Arc<Mutex<bool>>,
}

impl WriteLog {
    pub fn writes(&self) -> Vec<String> {
        self.writes.lock().unwrap().clone()
    }

    pub fn count(&self) -> usize {
        self.writes.lock().unwrap().len()
    }

    pub fn is_closed(&self) -> bool {
        *self.closed.lock().unwrap()
    }
}

/// Hands out one scripted stream and records the username it was given.
#[derive(Debug, Default)]
pub struct ScriptedConnector {
    stream: Mutex<Option<ScriptedStream>>,
    usernames: Arc<Mutex<Vec<String>>>,
}

impl ScriptedConnector {
    pub fn new(stream: ScriptedStream) -> Self {
        Self {
            stream: Mutex::new(Some(stream)),
            usernames: Arc::default(),
        }
    }

    /// A connector whose authentication always fails.
    pub fn rejecting() -> Self {
        Self::default()
    }

    pub fn usernames(&self) -> Arc<Mutex<Vec<String>>> {
        self.usernames.clone()
    }
}

impl Connector for ScriptedConnector {
    type Stream = ScriptedStream;

    fn username(&self) -> &str {
        "admin"
    }

    async fn connect(&self, username: &str) -> Result<ScriptedStream> {
        self.usernames.lock().unwrap().push(username.to_string());
        self.stream.lock().unwrap().take().ok_or_else(|| {
            TransportError::AuthenticationFailed {
                user: username.to_string(),
            }
            .into()
        })
    }
}
