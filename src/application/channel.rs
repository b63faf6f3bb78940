//! Ordered, closable handoff of tree values from one producer to one consumer.
//!
//! Closing is tied to ownership: [`SequenceSender::close`] consumes the sender,
//! so nothing can be written after close and a channel cannot be closed twice.
//! Dropping a sender closes it as well, which covers early returns and panics.

use crossbeam::channel::{self, RecvError};
use thiserror::Error;
use tracing::trace;

use crate::config::Capacity;

/// The consumer is gone; nothing sent from now on will be read.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("sequence receiver disconnected")]
pub struct Disconnected;

/// Outcome of a single read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Received {
    Value(i64),
    /// The producer closed the channel and every value has been read
    Closed,
}

impl Received {
    pub fn value(self) -> Option<i64> {
        match self {
            Received::Value(v) => Some(v),
            Received::Closed => None,
        }
    }
}

/// Create a connected sender/receiver pair.
pub fn sequence(capacity: Capacity) -> (SequenceSender, SequenceReceiver) {
    let (tx, rx) = match capacity {
        Capacity::Rendezvous => channel::bounded(0),
        Capacity::Bounded(n) => channel::bounded(n),
        Capacity::Unbounded => channel::unbounded(),
    };
    (SequenceSender { inner: tx }, SequenceReceiver { inner: rx })
}

#[derive(Debug)]
pub struct SequenceSender {
    inner: channel::Sender<i64>,
}

impl SequenceSender {
    /// Blocks while the channel is full (always, for a rendezvous channel,
    /// until the receiver takes the value).
    pub fn send(&self, value: i64) -> Result<(), Disconnected> {
        self.inner.send(value).map_err(|_| Disconnected)
    }

    /// Signal end of sequence.
    pub fn close(self) {
        trace!("closing sequence");
        drop(self);
    }
}

#[derive(Debug)]
pub struct SequenceReceiver {
    inner: channel::Receiver<i64>,
}

impl SequenceReceiver {
    /// Blocks until a value arrives or the sender closes.
    pub fn recv(&self) -> Received {
        match self.inner.recv() {
            Ok(value) => Received::Value(value),
            Err(RecvError) => Received::Closed,
        }
    }
}

impl Iterator for SequenceReceiver {
    type Item = i64;

    fn next(&mut self) -> Option<Self::Item> {
        self.recv().value()
    }
}
