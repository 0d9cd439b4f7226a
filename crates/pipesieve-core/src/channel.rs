//! Duplex Channel: an ordered conduit with one write endpoint and one read endpoint.
//!
//! Endpoints are not `Clone`. Handing the [`Reader`] to a new stage is a move, so the
//! spawning context can never read from its own downstream channel, and the reader
//! observes end-of-stream exactly when the [`Writer`] is dropped.
use thiserror::Error;
use tokio::sync::mpsc;

/// The reader side is gone; carries the value that could not be delivered.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("channel closed, value {0} not delivered")]
pub struct ChannelClosed(pub u32);

/// Creates a connected endpoint pair holding at most `capacity` values in flight.
///
/// A capacity of zero is raised to one.
pub fn channel(capacity: usize) -> (Writer, Reader) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (Writer { tx }, Reader { rx })
}

#[derive(Debug)]
pub struct Writer {
    tx: mpsc::Sender<u32>,
}

impl Writer {
    /// Sends a value, waiting while the channel is full.
    pub async fn send(&self, value: u32) -> Result<(), ChannelClosed> {
        self.tx.send(value).await.map_err(|err| ChannelClosed(err.0))
    }

    /// Whether the reader has been dropped.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    pub fn close(self) {
        drop(self);
    }
}

#[derive(Debug)]
pub struct Reader {
    rx: mpsc::Receiver<u32>,
}

impl Reader {
    /// Receives the next value; `None` means end-of-stream.
    pub async fn recv(&mut self) -> Option<u32> {
        self.rx.recv().await
    }

    pub fn close(self) {
        drop(self);
    }
}
