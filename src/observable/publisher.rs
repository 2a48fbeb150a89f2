//! Broadcast publisher fanning events out to independent subscribers.

use crossbeam::channel::{unbounded, Receiver, Sender};
use tracing::trace;

/// Delivers each emitted event to every live subscriber, FIFO per subscriber.
///
/// Subscribers only see events emitted after they subscribed. After
/// [`close`](Self::close), emitting is a no-op and receivers observe a
/// disconnected channel instead of blocking.
#[derive(Debug)]
pub struct EventPublisher<E> {
    subscribers: Vec<Sender<E>>,
    closed: bool,
}

impl<E> Default for EventPublisher<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> EventPublisher<E> {
    pub fn new() -> Self {
        Self {
            subscribers: Vec::new(),
            closed: false,
        }
    }

    pub fn subscribe(&mut self) -> Receiver<E> {
        let (tx, rx) = unbounded();
        if !self.closed {
            self.subscribers.push(tx);
        }
        rx
    }

    pub fn close(&mut self) {
        self.closed = true;
        // dropping the senders disconnects every receiver
        self.subscribers.clear();
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

impl<E: Clone> EventPublisher<E> {
    pub fn emit(&mut self, event: E) {
        if self.closed {
            trace!("publisher closed, dropping event");
            return;
        }
        // receivers that were dropped are pruned
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }
}
