//! Actor
//!
//! A running actor is its path, the sending half of its mailbox, and the set
//! of children created through its `Context`. The processing loop that owns
//! the receiving half is spawned by the behavior (see `behavior`).
//!
//! Lifecycle is `Running -> Stopped`; a stopped actor is never restarted.
//! - `ask` on a stopped actor, or one whose message was discarded by `stop`,
//!   never completes. Callers apply their own timeout.
//! - `tell` to a stopped actor is dropped.
//!
//! `LocalActor` erases the message type so the system registry and the remote
//! endpoint can hold actors of every kind side by side.

use crate::context::Context;
use crate::envelope::{Command, Envelope, WireEnvelope, WireReply};
use crate::error::ActorSystemError;
use crate::mailbox::{AskResult, Inbox, Mailbox, PendingMessage};
use crate::path::ActorPath;
use crate::protocol::{Message, ReplyEncoder};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::any::Any;
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, Instrument};

static NEXT_ACTOR_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique actor identity
///
/// Paths can be reused after a stop; ids never are.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ActorId(u64);

impl ActorId {
    pub fn next() -> Self {
        Self(NEXT_ACTOR_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "actor-{}", self.0)
    }
}

/// De-registration callback run once when an actor stops
pub type OnStop = Arc<dyn Fn(ActorId) + Send + Sync>;

/// Children created through an actor's `Context`
pub(crate) type Children = Arc<Mutex<ChildSet>>;

/// Live children of one actor; closed for good once the actor stops
#[derive(Default)]
pub(crate) struct ChildSet {
    closed: bool,
    actors: Vec<Arc<dyn LocalActor>>,
}

impl ChildSet {
    /// Track `child`; refused once the owner has stopped
    pub(crate) fn adopt(&mut self, child: Arc<dyn LocalActor>) -> bool {
        if self.closed {
            return false;
        }
        if !child.is_stopped() {
            self.actors.push(child);
        }
        true
    }

    pub(crate) fn remove(&mut self, id: ActorId) {
        self.actors.retain(|child| child.id() != id);
    }

    /// Refuse further children and hand back the current ones
    pub(crate) fn close(&mut self) -> Vec<Arc<dyn LocalActor>> {
        self.closed = true;
        std::mem::take(&mut self.actors)
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.closed
    }

    pub(crate) fn len(&self) -> usize {
        self.actors.len()
    }
}

/// Message-type-erased view of a local actor
#[async_trait]
pub trait LocalActor: Send + Sync + 'static {
    fn id(&self) -> ActorId;

    fn path(&self) -> &ActorPath;

    fn is_stopped(&self) -> bool;

    /// Stop the actor and its children; returns the discarded message count
    fn stop(&self) -> usize;

    /// Route a decoded wire envelope to `ask`, `tell` or `stop`
    async fn run_op(&self, wire: WireEnvelope) -> WireReply;

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

/// A running actor speaking message set `M`
pub struct Actor<M: Message> {
    id: ActorId,
    path: ActorPath,
    mailbox: Mailbox<M>,
    children: Children,
    on_stop: OnStop,
}

impl<M: Message> fmt::Debug for Actor<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Actor")
            .field("id", &self.id)
            .field("path", &self.path.to_string())
            .field("stopped", &self.mailbox.is_shutdown())
            .finish()
    }
}

impl<M: Message> Actor<M> {
    /// Create the mailbox, spawn `run` over its inbox and return the actor
    ///
    /// `run` is the processing loop; it must return once the inbox yields
    /// `None`.
    pub fn spawn<F, Fut>(context: &Context, on_stop: OnStop, mailbox_size: usize, run: F) -> Self
    where
        F: FnOnce(Inbox<M>) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let (mailbox, inbox) = Mailbox::new(mailbox_size);
        let path = context.self_path().clone();
        let span = tracing::info_span!("actor", actor_path = %path);

        tokio::spawn(run(inbox).instrument(span));

        Self {
            id: ActorId::next(),
            path,
            mailbox,
            children: context.children(),
            on_stop,
        }
    }

    pub fn id(&self) -> ActorId {
        self.id
    }

    pub fn path(&self) -> &ActorPath {
        &self.path
    }

    pub fn is_stopped(&self) -> bool {
        self.mailbox.is_shutdown()
    }

    /// Enqueue and wait for the reply
    pub async fn ask(&self, message: M) -> AskResult<M> {
        let (pending, slot) = PendingMessage::ask(message);
        if !self.mailbox.enqueue(pending).await {
            debug!(actor_path = %self.path, "Ask to stopped actor will never complete");
            return std::future::pending().await;
        }

        match slot.await {
            Ok(result) => result,
            // Discarded by stop
            Err(_) => std::future::pending().await,
        }
    }

    /// Enqueue without waiting for the outcome
    pub async fn tell(&self, message: M) {
        let tag = message.tag();
        if !self.mailbox.enqueue(PendingMessage::tell(message)).await {
            debug!(actor_path = %self.path, tag, "Dropped tell to stopped actor");
        }
    }

    /// Stop this actor and, recursively, its children
    ///
    /// Does not wait for the processing loop: a handler may stop its own
    /// actor. Queued messages are discarded without resolving their slots.
    pub fn stop(&self) -> usize {
        let discarded = self.mailbox.queued();
        if !self.mailbox.shutdown() {
            return 0;
        }

        let children = self.children.lock().close();
        for child in children {
            child.stop();
        }

        (self.on_stop)(self.id);
        info!(actor_path = %self.path, discarded, "Actor stopped");
        discarded
    }

    async fn run_command(&self, command: Command<M>) -> Result<WireReply, ActorSystemError> {
        let encoder = ReplyEncoder::<M>::default();
        let reply = match command {
            Command::Ask(message) => match self.ask(message).await {
                Ok(response) => WireReply::response(encoder.encode_response(&response)?),
                Err(error) => WireReply::error(encoder.encode_error(&error)?),
            },
            Command::Tell(message) => {
                self.tell(message).await;
                WireReply::default()
            }
            Command::Stop => WireReply::stops(self.stop()),
        };
        Ok(reply)
    }
}

#[async_trait]
impl<M: Message> LocalActor for Actor<M> {
    fn id(&self) -> ActorId {
        self.id
    }

    fn path(&self) -> &ActorPath {
        &self.path
    }

    fn is_stopped(&self) -> bool {
        Actor::is_stopped(self)
    }

    fn stop(&self) -> usize {
        Actor::stop(self)
    }

    async fn run_op(&self, wire: WireEnvelope) -> WireReply {
        let outcome = match Envelope::<M>::from_wire(wire) {
            Ok(envelope) => self.run_command(envelope.command).await,
            Err(error) => Err(error),
        };
        outcome.unwrap_or_else(|error| WireReply::system_error(&error))
    }

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}
