//! Proxy behavior: the actor supplies its own processing loop.

use super::AbstractStateful;
use crate::actor::{Actor, OnStop};
use crate::context::Context;
use crate::error::Result;
use crate::mailbox::Inbox;
use crate::protocol::Message;
use crate::supervisor::Supervisor;
use async_trait::async_trait;

/// Custom processing loop over the raw inbox
///
/// The loop owns its state and decides how to resolve each pending
/// message's slot. It must return once `inbox.next()` yields `None`, and
/// should handle one message at a time to keep the actor single-threaded.
#[async_trait]
pub trait ActorProxy: Send + Sync + 'static {
    type Message: Message;
    type State: Send + 'static;

    async fn run(
        &self,
        state: Self::State,
        inbox: Inbox<Self::Message>,
        context: Context,
        supervisor: Supervisor,
    );
}

/// `AbstractStateful` strategy for an `ActorProxy`
pub struct ProxyBehavior<P> {
    proxy: P,
}

impl<P: ActorProxy> ProxyBehavior<P> {
    pub fn new(proxy: P) -> Self {
        Self { proxy }
    }
}

#[async_trait]
impl<P: ActorProxy> AbstractStateful for ProxyBehavior<P> {
    type Message = P::Message;
    type State = P::State;

    async fn make_actor(
        self,
        supervisor: Supervisor,
        context: Context,
        on_stop: OnStop,
        mailbox_size: usize,
        initial_state: P::State,
    ) -> Result<Actor<P::Message>> {
        let proxy = self.proxy;
        let loop_context = context.clone();
        Ok(Actor::spawn(&context, on_stop, mailbox_size, move |inbox| async move {
            proxy
                .run(initial_state, inbox, loop_context, supervisor)
                .await
        }))
    }
}
