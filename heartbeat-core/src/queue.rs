//! Session event queue.
//!
//! A FIFO backed by an `mpsc` channel: one consumer (the orchestrator's
//! drain loop) and any number of producers. Producers hold an
//! [`EventSender`], which is `Clone + Send`, so an execution adapter may
//! enqueue fills from a broker notification thread.

use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};

use thiserror::Error;

use crate::event::Event;

/// The consumer side has been dropped; the session is over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("event queue closed: session has ended")]
pub struct QueueClosed;

/// Single-consumer FIFO of events.
pub struct EventQueue {
    tx: Sender<Event>,
    rx: Receiver<Event>,
}

impl EventQueue {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        Self { tx, rx }
    }

    /// A producer handle for this queue.
    pub fn sender(&self) -> EventSender {
        EventSender {
            tx: self.tx.clone(),
        }
    }

    /// Pop the head of the queue. `None` means the queue is currently empty,
    /// which is the normal signal to advance the heartbeat.
    pub fn pop(&self) -> Option<Event> {
        match self.rx.try_recv() {
            Ok(event) => Some(event),
            // The queue keeps its own sender alive, so disconnection cannot
            // be observed here.
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new()
    }
}

/// Producer handle onto the session queue.
#[derive(Debug, Clone)]
pub struct EventSender {
    tx: Sender<Event>,
}

impl EventSender {
    /// Append an event to the tail of the queue.
    pub fn push(&self, event: impl Into<Event>) -> Result<(), QueueClosed> {
        self.tx.send(event.into()).map_err(|_| QueueClosed)
    }
}
