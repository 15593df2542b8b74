//! Stateful behavior: handler mutates a private copy of the state, which
//! becomes authoritative only when the handler succeeds.

use super::AbstractStateful;
use crate::actor::{Actor, OnStop};
use crate::context::Context;
use crate::error::{AskError, Result};
use crate::mailbox::Inbox;
use crate::protocol::Message;
use crate::supervisor::Supervisor;
use async_trait::async_trait;
use std::time::Instant;
use tracing::{debug, warn};

/// Message handler of a plain stateful actor
#[async_trait]
pub trait Stateful: Send + Sync + 'static {
    type Message: Message;
    type State: Clone + Send + Sync + 'static;

    /// Handle one message against a fresh copy of the current state
    ///
    /// Changes to `state` are committed only if this returns `Ok`. The same
    /// message may be handled again under supervision.
    async fn receive(
        &self,
        state: &mut Self::State,
        message: Self::Message,
        context: &Context,
    ) -> std::result::Result<
        <Self::Message as Message>::Response,
        <Self::Message as Message>::Error,
    >;
}

/// `AbstractStateful` strategy for a `Stateful` handler
pub struct StatefulBehavior<T> {
    handler: T,
}

impl<T: Stateful> StatefulBehavior<T> {
    pub fn new(handler: T) -> Self {
        Self { handler }
    }
}

#[async_trait]
impl<T: Stateful> AbstractStateful for StatefulBehavior<T> {
    type Message = T::Message;
    type State = T::State;

    async fn make_actor(
        self,
        supervisor: Supervisor,
        context: Context,
        on_stop: OnStop,
        mailbox_size: usize,
        initial_state: T::State,
    ) -> Result<Actor<T::Message>> {
        let loop_context = context.clone();
        Ok(Actor::spawn(&context, on_stop, mailbox_size, move |inbox| {
            run(self.handler, initial_state, supervisor, loop_context, inbox)
        }))
    }
}

type Outcome<T> = std::result::Result<
    (
        <T as Stateful>::State,
        <<T as Stateful>::Message as Message>::Response,
    ),
    AskError<<<T as Stateful>::Message as Message>::Error>,
>;

async fn invoke<T: Stateful>(
    handler: &T,
    state: &T::State,
    message: T::Message,
    context: &Context,
) -> Outcome<T> {
    let mut cell = state.clone();
    let response = handler
        .receive(&mut cell, message, context)
        .await
        .map_err(AskError::Handler)?;
    Ok((cell, response))
}

async fn run<T: Stateful>(
    handler: T,
    mut state: T::State,
    supervisor: Supervisor,
    context: Context,
    mut inbox: Inbox<T::Message>,
) {
    let metrics = context.system().metrics();
    debug!("Processing loop started");

    while let Some(pending) = inbox.next().await {
        let started = Instant::now();
        let (message, slot) = pending.into_parts();
        let tag = message.tag();

        let outcome = match invoke(&handler, &state, message.clone(), &context).await {
            Ok(done) => Ok(done),
            Err(error) => {
                metrics.record_handler_failure();
                warn!(tag, error = %error, "Handler failed");

                let (handler, state, message, context, metrics) =
                    (&handler, &state, &message, &context, &metrics);
                supervisor
                    .supervise(error, move || async move {
                        metrics.record_supervisor_retry();
                        invoke(handler, state, message.clone(), context).await
                    })
                    .await
            }
        };

        metrics.record_message_handled(started.elapsed());
        match outcome {
            Ok((next, response)) => {
                state = next;
                slot.complete(Ok(response));
            }
            Err(error) => slot.complete(Err(error)),
        }
    }

    debug!("Processing loop finished");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::system::ActorSystem;
    use serde::{Deserialize, Serialize};

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    #[serde(tag = "_tag")]
    enum Tally {
        Add { amount: i64 },
        Total,
    }

    impl Message for Tally {
        type Response = i64;
        type Error = String;
        const TAGS: &'static [&'static str] = &["Add", "Total"];

        fn tag(&self) -> &'static str {
            match self {
                Tally::Add { .. } => "Add",
                Tally::Total => "Total",
            }
        }
    }

    /// Rejects negative amounts after partially applying them
    struct TallyHandler;

    #[async_trait]
    impl Stateful for TallyHandler {
        type Message = Tally;
        type State = i64;

        async fn receive(
            &self,
            state: &mut i64,
            message: Tally,
            _context: &Context,
        ) -> std::result::Result<i64, String> {
            match message {
                Tally::Add { amount } => {
                    *state += amount;
                    if amount < 0 {
                        return Err(format!("negative amount {amount}"));
                    }
                    Ok(*state)
                }
                Tally::Total => Ok(*state),
            }
        }
    }

    #[tokio::test]
    async fn test_failed_handler_does_not_commit_state() {
        let system = ActorSystem::new("sys1", None).unwrap();
        let tally = system
            .make(
                "tally",
                Supervisor::none(),
                StatefulBehavior::new(TallyHandler),
                10,
            )
            .await
            .unwrap();

        assert_eq!(tally.ask(Tally::Add { amount: 5 }).await, Ok(15));
        assert_eq!(
            tally.ask(Tally::Add { amount: -3 }).await,
            Err(AskError::Handler("negative amount -3".to_string()))
        );
        assert_eq!(tally.ask(Tally::Total).await, Ok(15));

        let stats = system.metrics().snapshot();
        assert_eq!(stats.handler_failures, 1);
        assert_eq!(stats.supervisor_retries, 0);
        assert_eq!(stats.messages_processed, 3);
    }
}
