//! Location-Transparent Actor Runtime
//!
//! Typed actors with bounded mailboxes, supervision, optional event sourcing
//! and HTTP remoting. Every actor has a path
//! `zio://<system>@<host>:<port>/<hierarchical/path>`; a reference obtained
//! from that path behaves the same whether the actor lives in this process or
//! on another node.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────┐          ┌──────────────────────────┐
//! │ ActorSystem "sys1"       │          │ ActorSystem "sys2"       │
//! │                          │          │                          │
//! │  ActorRef::Local ──┐     │  POST    │  RemoteServer  /cmd      │
//! │                    ▼     │  /cmd    │       │                  │
//! │  Mailbox ─▶ loop ─▶ state│◀─────────│       ▼                  │
//! │                          │──────────▶  registry ─▶ run_op      │
//! │  ActorRef::Remote ───────┼──────────┼─▶ Mailbox ─▶ loop        │
//! └──────────────────────────┘          └──────────────────────────┘
//! ```
//!
//! # Guarantees
//!
//! - One message at a time per actor, in FIFO enqueue order
//! - Event-sourced actors replay their journal before serving messages
//! - Business errors are supervised; runtime errors never are
//!
//! # Examples
//!
//! ```rust,no_run
//! use actor_runtime::{
//!     ActorSystem, Context, Message, Stateful, StatefulBehavior, Supervisor,
//! };
//! use async_trait::async_trait;
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Clone, Debug, Serialize, Deserialize)]
//! #[serde(tag = "_tag")]
//! enum Counter {
//!     Increment,
//! }
//!
//! impl Message for Counter {
//!     type Response = u64;
//!     type Error = String;
//!     const TAGS: &'static [&'static str] = &["Increment"];
//!
//!     fn tag(&self) -> &'static str {
//!         "Increment"
//!     }
//! }
//!
//! struct Counting;
//!
//! #[async_trait]
//! impl Stateful for Counting {
//!     type Message = Counter;
//!     type State = u64;
//!
//!     async fn receive(&self, count: &mut u64, _msg: Counter, _ctx: &Context)
//!         -> Result<u64, String>
//!     {
//!         *count += 1;
//!         Ok(*count)
//!     }
//! }
//!
//! # async fn run() -> actor_runtime::Result<()> {
//! let system = ActorSystem::new("sys1", None)?;
//! let counter = system
//!     .make("counter", Supervisor::none(), StatefulBehavior::new(Counting), 0)
//!     .await?;
//! assert_eq!(counter.ask(Counter::Increment).await, Ok(1));
//! # Ok(())
//! # }
//! ```

pub mod actor;
pub mod actor_ref;
pub mod behavior;
pub mod context;
pub mod envelope;
pub mod error;
pub mod journal;
pub mod mailbox;
pub mod metrics;
pub mod path;
pub mod protocol;
pub mod registry;
pub mod remote;
pub mod supervisor;
pub mod system;

pub use actor::{Actor, ActorId, LocalActor, OnStop};
pub use actor_ref::{ActorRef, ActorRefLocal, ActorRefRemote};
pub use behavior::{
    AbstractStateful, ActorProxy, EventSourcedBehavior, EventSourcedStateful, ProxyBehavior,
    Reaction, ReactionOf, Stateful, StatefulBehavior,
};
pub use context::Context;
pub use envelope::{Command, Envelope, Op, WireEnvelope, WireReply};
pub use error::{ActorSystemError, AskError, Result, Retryable};
pub use journal::{
    InMemoryJournal, InMemoryJournalFactory, Journal, JournalEntry, JournalError, JournalFactory,
    PersistenceId,
};
pub use mailbox::{AskResult, Inbox, Mailbox, PendingMessage, ReplySlot};
pub use metrics::{SystemMetrics, SystemStats};
pub use path::ActorPath;
pub use protocol::{decode_command, DecodedCommand, Message, ReplyEncoder};
pub use registry::ActorRegistry;
pub use remote::{RemoteClient, RemoteServer};
pub use supervisor::{Backoff, FailureReport, RetrySchedule, Supervisor};
pub use system::{ActorSystem, ActorSystemBuilder};

pub use actor_config::RemoteConfig;
