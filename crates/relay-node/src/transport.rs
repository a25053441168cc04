//! # Outbox Transport
//!
//! Writes channel events as JSON lines for an external relayer to carry to
//! the peer chain.

use std::io::Write;

use async_trait::async_trait;
use icp_02_token_relay::{ChannelEvent, RelayError, RelayTransport};
use parking_lot::Mutex;
use serde::Serialize;

/// An outbox event as written on the wire.
#[derive(Debug, Serialize)]
struct OutboxLine<'a> {
    /// Hex of the encoded event; the action bytes the peer proves.
    action: String,
    event: &'a ChannelEvent,
}

/// `RelayTransport` writing one JSON line per event.
pub struct JsonLinesTransport<W: Write + Send> {
    out: Mutex<W>,
}

impl<W: Write + Send> JsonLinesTransport<W> {
    /// Wrap a writer.
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    /// Recover the writer.
    pub fn into_inner(self) -> W {
        self.out.into_inner()
    }
}

impl JsonLinesTransport<std::io::Stdout> {
    /// Transport writing to stdout.
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

#[async_trait]
impl<W: Write + Send> RelayTransport for JsonLinesTransport<W> {
    async fn deliver(&self, event: ChannelEvent) -> Result<(), RelayError> {
        let line = OutboxLine {
            action: hex::encode(event.encode()?),
            event: &event,
        };
        let json = serde_json::to_string(&line).map_err(|e| RelayError::Codec(e.to_string()))?;
        let mut out = self.out.lock();
        writeln!(out, "{json}").map_err(|e| RelayError::Transport(e.to_string()))?;
        out.flush().map_err(|e| RelayError::Transport(e.to_string()))
    }
}
