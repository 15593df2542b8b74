//! Actor Mailbox
//!
//! Bounded FIFO of pending messages. The sending half (`Mailbox`) is owned by
//! the `Actor` and cloned freely; the receiving half (`Inbox`) is owned by the
//! actor's processing loop, the only consumer.
//!
//! Enqueue suspends while the mailbox is full. Shutdown is signalled out of
//! band so that a stop issued from inside a handler never waits on the loop
//! that is running it.

use crate::error::AskError;
use crate::protocol::Message;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::debug;

/// Outcome delivered to an `ask` caller
pub type AskResult<M> = Result<<M as Message>::Response, AskError<<M as Message>::Error>>;

/// A queued message and, for `ask`, the slot its caller waits on
pub struct PendingMessage<M: Message> {
    message: M,
    reply: Option<oneshot::Sender<AskResult<M>>>,
}

impl<M: Message> PendingMessage<M> {
    pub fn ask(message: M) -> (Self, oneshot::Receiver<AskResult<M>>) {
        let (tx, rx) = oneshot::channel();
        (
            Self {
                message,
                reply: Some(tx),
            },
            rx,
        )
    }

    pub fn tell(message: M) -> Self {
        Self {
            message,
            reply: None,
        }
    }

    pub fn message(&self) -> &M {
        &self.message
    }

    pub fn expects_reply(&self) -> bool {
        self.reply.is_some()
    }

    /// Split into the message and a completion handle for its slot
    pub fn into_parts(self) -> (M, ReplySlot<M>) {
        (
            self.message,
            ReplySlot {
                sender: self.reply,
            },
        )
    }
}

/// Single-assignment result slot of one pending message
pub struct ReplySlot<M: Message> {
    sender: Option<oneshot::Sender<AskResult<M>>>,
}

impl<M: Message> ReplySlot<M> {
    /// Resolve the slot; a `tell` has nobody waiting and only logs failures
    pub fn complete(self, result: AskResult<M>) {
        match self.sender {
            Some(sender) => {
                // The caller may have given up waiting
                let _ = sender.send(result);
            }
            None => {
                if let Err(error) = result {
                    debug!(error = %error, "Told message failed");
                }
            }
        }
    }
}

/// Sending half of a mailbox
pub struct Mailbox<M: Message> {
    sender: mpsc::Sender<PendingMessage<M>>,
    shutdown: std::sync::Arc<watch::Sender<bool>>,
}

impl<M: Message> Clone for Mailbox<M> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
            shutdown: std::sync::Arc::clone(&self.shutdown),
        }
    }
}

/// Receiving half of a mailbox
pub struct Inbox<M: Message> {
    receiver: mpsc::Receiver<PendingMessage<M>>,
    shutdown: watch::Receiver<bool>,
}

impl<M: Message> Mailbox<M> {
    pub fn new(capacity: usize) -> (Self, Inbox<M>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let mailbox = Self {
            sender,
            shutdown: std::sync::Arc::new(shutdown_tx),
        };
        let inbox = Inbox {
            receiver,
            shutdown: shutdown_rx,
        };
        (mailbox, inbox)
    }

    /// Enqueue, waiting for room; returns `false` once the mailbox is shut
    pub async fn enqueue(&self, pending: PendingMessage<M>) -> bool {
        if self.is_shutdown() {
            return false;
        }
        self.sender.send(pending).await.is_ok()
    }

    /// Messages waiting to be dequeued
    pub fn queued(&self) -> usize {
        self.sender.max_capacity() - self.sender.capacity()
    }

    pub fn is_shutdown(&self) -> bool {
        *self.shutdown.borrow()
    }

    /// Signal shutdown; returns `false` if it was already signalled
    pub fn shutdown(&self) -> bool {
        !self.shutdown.send_replace(true)
    }
}

impl<M: Message> Inbox<M> {
    /// Next message in FIFO order, or `None` once the mailbox is shut down
    ///
    /// On shutdown every queued message is discarded without resolving its
    /// slot.
    pub async fn next(&mut self) -> Option<PendingMessage<M>> {
        let shutdown = &mut self.shutdown;
        let stopped = async move {
            // A dropped sender counts as shutdown too
            let _ = shutdown.wait_for(|stopped| *stopped).await;
        };

        tokio::select! {
            biased;

            _ = stopped => {
                let discarded = self.discard_queued();
                debug!(discarded, "Mailbox shut down");
                None
            }
            pending = self.receiver.recv() => pending,
        }
    }

    fn discard_queued(&mut self) -> usize {
        self.receiver.close();
        let mut discarded = 0;
        while self.receiver.try_recv().is_ok() {
            discarded += 1;
        }
        discarded
    }
}
