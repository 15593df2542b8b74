//! Event-sourced behavior
//!
//! State is never mutated directly. A handler reacts to a message with the
//! events it wants persisted and a function deriving the reply from the
//! resulting state:
//!
//! 1. No events: read-only, the reply is derived from the current state and
//!    nothing is written.
//! 2. Events: they are folded onto the current state with `source_event`,
//!    persisted together with the candidate state, and only then is the
//!    candidate committed and the reply derived from it.
//!
//! A journal failure surfaces as `JournalException` and leaves the state
//! untouched. On startup the journal entry is replayed before the first
//! message is dequeued.

use super::AbstractStateful;
use crate::actor::{Actor, OnStop};
use crate::context::Context;
use crate::error::{ActorSystemError, AskError, Result};
use crate::journal::{Journal, PersistenceId};
use crate::mailbox::Inbox;
use crate::protocol::Message;
use crate::supervisor::Supervisor;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Events to persist plus the reply derived from the resulting state
pub struct Reaction<E, S, R> {
    events: Vec<E>,
    reply: Box<dyn FnOnce(&S) -> R + Send>,
}

impl<E, S, R> Reaction<E, S, R> {
    /// Persist `events`, then reply from the state they lead to
    pub fn persist<F>(events: Vec<E>, reply: F) -> Self
    where
        F: FnOnce(&S) -> R + Send + 'static,
    {
        Self {
            events,
            reply: Box::new(reply),
        }
    }

    /// Reply from the current state without persisting anything
    pub fn reply<F>(reply: F) -> Self
    where
        F: FnOnce(&S) -> R + Send + 'static,
    {
        Self::persist(Vec::new(), reply)
    }

    pub fn events(&self) -> &[E] {
        &self.events
    }
}

/// `Reaction` produced by handler `T`
pub type ReactionOf<T> = Reaction<
    <T as EventSourcedStateful>::Event,
    <T as EventSourcedStateful>::State,
    <<T as EventSourcedStateful>::Message as Message>::Response,
>;

/// Handler and event fold of an event-sourced actor
#[async_trait]
pub trait EventSourcedStateful: Send + Sync + 'static {
    type Message: Message;
    type State: Clone + Serialize + DeserializeOwned + Send + Sync + 'static;
    type Event: Serialize + DeserializeOwned + Send + Sync + 'static;

    /// Journal entry this actor persists to and replays from
    fn persistence_id(&self) -> PersistenceId;

    /// Decide which events a message produces
    async fn receive(
        &self,
        state: &Self::State,
        message: Self::Message,
        context: &Context,
    ) -> std::result::Result<ReactionOf<Self>, <Self::Message as Message>::Error>;

    /// Apply one event; must be a pure function of its inputs
    fn source_event(&self, state: Self::State, event: &Self::Event) -> Self::State;
}

/// `AbstractStateful` strategy for an `EventSourcedStateful` handler
pub struct EventSourcedBehavior<T> {
    handler: T,
}

impl<T: EventSourcedStateful> EventSourcedBehavior<T> {
    pub fn new(handler: T) -> Self {
        Self { handler }
    }
}

/// Fold `events` onto `state` in order
fn replay<'a, T, I>(handler: &T, state: T::State, events: I) -> T::State
where
    T: EventSourcedStateful,
    I: IntoIterator<Item = &'a T::Event>,
{
    events
        .into_iter()
        .fold(state, |state, event| handler.source_event(state, event))
}

#[async_trait]
impl<T: EventSourcedStateful> AbstractStateful for EventSourcedBehavior<T> {
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
        let handler = self.handler;
        let id = handler.persistence_id();
        let journal = context.journal();

        let (snapshot, events) = journal
            .load_typed::<T::Event, T::State>(&id)
            .await
            .map_err(ActorSystemError::journal)?;

        let from_snapshot = snapshot.is_some();
        let state = replay(&handler, snapshot.unwrap_or(initial_state), &events);
        info!(
            persistence_id = %id,
            from_snapshot,
            replayed_events = events.len(),
            "Recovered event-sourced state"
        );

        let loop_context = context.clone();
        Ok(Actor::spawn(&context, on_stop, mailbox_size, move |inbox| {
            run(
                Persistent {
                    handler,
                    journal,
                    id,
                },
                state,
                supervisor,
                loop_context,
                inbox,
            )
        }))
    }
}

struct Persistent<T> {
    handler: T,
    journal: Arc<dyn Journal>,
    id: PersistenceId,
}

type Outcome<T> = std::result::Result<
    (
        Option<<T as EventSourcedStateful>::State>,
        <<T as EventSourcedStateful>::Message as Message>::Response,
    ),
    AskError<<<T as EventSourcedStateful>::Message as Message>::Error>,
>;

impl<T: EventSourcedStateful> Persistent<T> {
    /// Handle one message; `Some(state)` is a persisted state to commit
    async fn invoke(&self, state: &T::State, message: T::Message, context: &Context) -> Outcome<T> {
        let Reaction { events, reply } = self
            .handler
            .receive(state, message, context)
            .await
            .map_err(AskError::Handler)?;

        if events.is_empty() {
            return Ok((None, reply(state)));
        }

        let candidate = replay(&self.handler, state.clone(), &events);
        self.journal
            .persist_typed(&self.id, &events, Some(&candidate))
            .await
            .map_err(|e| AskError::System(ActorSystemError::journal(e)))?;

        debug!(persistence_id = %self.id, events = events.len(), "Persisted events");
        let response = reply(&candidate);
        Ok((Some(candidate), response))
    }
}

async fn run<T: EventSourcedStateful>(
    persistent: Persistent<T>,
    mut state: T::State,
    supervisor: Supervisor,
    context: Context,
    mut inbox: Inbox<T::Message>,
) {
    let metrics = context.system().metrics();

    while let Some(pending) = inbox.next().await {
        let started = Instant::now();
        let (message, slot) = pending.into_parts();
        let tag = message.tag();

        let outcome = match persistent.invoke(&state, message.clone(), &context).await {
            Ok(done) => Ok(done),
            Err(error) => {
                metrics.record_handler_failure();
                warn!(tag, persistence_id = %persistent.id, error = %error, "Handler failed");

                let (persistent, state, message, context, metrics) =
                    (&persistent, &state, &message, &context, &metrics);
                supervisor
                    .supervise(error, move || async move {
                        metrics.record_supervisor_retry();
                        persistent.invoke(state, message.clone(), context).await
                    })
                    .await
            }
        };

        metrics.record_message_handled(started.elapsed());
        match outcome {
            Ok((committed, response)) => {
                if let Some(next) = committed {
                    state = next;
                }
                slot.complete(Ok(response));
            }
            Err(error) => slot.complete(Err(error)),
        }
    }

    debug!(persistence_id = %persistent.id, "Processing loop finished");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::journal::{InMemoryJournal, JournalEntry, JournalError, JournalFactory};
    use crate::system::ActorSystem;
    use serde::Deserialize;
    use serde_json::Value;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    #[serde(tag = "_tag")]
    enum Account {
        Deposit { amount: u64 },
        Balance,
    }

    impl Message for Account {
        type Response = u64;
        type Error = String;
        const TAGS: &'static [&'static str] = &["Deposit", "Balance"];

        fn tag(&self) -> &'static str {
            match self {
                Account::Deposit { .. } => "Deposit",
                Account::Balance => "Balance",
            }
        }
    }

    #[derive(Clone, Debug, Serialize, Deserialize)]
    struct Deposited(u64);

    struct AccountHandler;

    #[async_trait]
    impl EventSourcedStateful for AccountHandler {
        type Message = Account;
        type State = u64;
        type Event = Deposited;

        fn persistence_id(&self) -> PersistenceId {
            PersistenceId::new("account-1")
        }

        async fn receive(
            &self,
            _state: &u64,
            message: Account,
            _context: &Context,
        ) -> std::result::Result<ReactionOf<Self>, String> {
            match message {
                Account::Deposit { amount: 0 } => Err("empty deposit".to_string()),
                Account::Deposit { amount } => {
                    Ok(Reaction::persist(vec![Deposited(amount)], |balance| *balance))
                }
                Account::Balance => Ok(Reaction::reply(|balance| *balance)),
            }
        }

        fn source_event(&self, state: u64, event: &Deposited) -> u64 {
            state + event.0
        }
    }

    /// Journal whose writes can be switched off
    #[derive(Default)]
    struct FlakyJournal {
        inner: InMemoryJournal,
        failing: AtomicBool,
    }

    #[async_trait]
    impl Journal for FlakyJournal {
        async fn persist_entry(
            &self,
            id: &PersistenceId,
            events: Vec<Value>,
            snapshot: Option<Value>,
        ) -> std::result::Result<(), JournalError> {
            if self.failing.load(Ordering::SeqCst) {
                return Err(JournalError::storage("disk full"));
            }
            self.inner.persist_entry(id, events, snapshot).await
        }

        async fn get_entry(
            &self,
            id: &PersistenceId,
        ) -> std::result::Result<JournalEntry, JournalError> {
            self.inner.get_entry(id).await
        }
    }

    struct FlakyFactory(Arc<FlakyJournal>);

    impl JournalFactory for FlakyFactory {
        fn get_journal(&self, _system_name: &str) -> Arc<dyn Journal> {
            Arc::clone(&self.0) as Arc<dyn Journal>
        }
    }

    #[test]
    fn test_replay_is_a_pure_fold() {
        let events = vec![Deposited(3), Deposited(4), Deposited(5)];
        let first = replay(&AccountHandler, 1, &events);
        let second = replay(&AccountHandler, 1, &events);
        assert_eq!(first, 13);
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_journal_failure_blocks_commit() {
        let journal = Arc::new(FlakyJournal::default());
        let system = ActorSystem::builder("sys1")
            .journal_factory(Arc::new(FlakyFactory(Arc::clone(&journal))))
            .build()
            .unwrap();

        let account = system
            .make(
                "account",
                Supervisor::retry(3),
                EventSourcedBehavior::new(AccountHandler),
                0,
            )
            .await
            .unwrap();

        assert_eq!(account.ask(Account::Deposit { amount: 10 }).await, Ok(10));

        journal.failing.store(true, Ordering::SeqCst);
        let error = account
            .ask(Account::Deposit { amount: 5 })
            .await
            .unwrap_err();
        assert!(matches!(
            error,
            AskError::System(ActorSystemError::Journal { .. })
        ));
        // Runtime failures are not retried
        assert_eq!(system.metrics().snapshot().supervisor_retries, 0);

        journal.failing.store(false, Ordering::SeqCst);
        assert_eq!(account.ask(Account::Balance).await, Ok(10));
        assert_eq!(
            journal.inner.event_count(&AccountHandler.persistence_id()),
            1
        );
    }

    #[tokio::test]
    async fn test_handler_errors_are_retried_then_surface() {
        let system = ActorSystem::new("sys1", None).unwrap();
        let account = system
            .make(
                "account",
                Supervisor::retry(2),
                EventSourcedBehavior::new(AccountHandler),
                0,
            )
            .await
            .unwrap();

        assert_eq!(
            account.ask(Account::Deposit { amount: 0 }).await,
            Err(AskError::Handler("empty deposit".to_string()))
        );
        assert_eq!(system.metrics().snapshot().supervisor_retries, 2);
    }
}
