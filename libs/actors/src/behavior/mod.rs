//! Behaviors
//!
//! A behavior turns a mailbox and a starting state into a running processing
//! loop. Three strategies share one contract, `AbstractStateful`, so that
//! `ActorSystem::make` treats them uniformly:
//!
//! - [`StatefulBehavior`]: plain in-memory state, committed per message
//! - [`EventSourcedBehavior`]: state rebuilt from, and persisted to, a journal
//! - [`ProxyBehavior`]: a fully custom loop over the raw inbox
//!
//! Every loop handles one message at a time, which is what makes an actor a
//! single logical thread.

mod event_sourced;
mod proxy;
mod stateful;

pub use event_sourced::{EventSourcedBehavior, EventSourcedStateful, Reaction, ReactionOf};
pub use proxy::{ActorProxy, ProxyBehavior};
pub use stateful::{Stateful, StatefulBehavior};

use crate::actor::{Actor, OnStop};
use crate::context::Context;
use crate::error::Result;
use crate::protocol::Message;
use crate::supervisor::Supervisor;
use async_trait::async_trait;

/// Contract every behavior strategy satisfies
#[async_trait]
pub trait AbstractStateful: Send + 'static {
    type Message: Message;
    type State: Send + 'static;

    /// Materialize a running actor
    ///
    /// Any setup (such as journal replay) completes before this returns, so
    /// it strictly precedes the first message the actor processes. Failures
    /// are reported to the caller of `make` as `ErrorMakingActorException`.
    async fn make_actor(
        self,
        supervisor: Supervisor,
        context: Context,
        on_stop: OnStop,
        mailbox_size: usize,
        initial_state: Self::State,
    ) -> Result<Actor<Self::Message>>;
}
