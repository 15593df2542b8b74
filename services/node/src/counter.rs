//! Journaled counter served by the node

use actor_runtime::{Context, EventSourcedStateful, Message, PersistenceId, Reaction};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "_tag")]
pub enum CounterCommand {
    Increment { by: u64 },
    Reset,
    Get,
}

impl Message for CounterCommand {
    type Response = u64;
    type Error = String;
    const TAGS: &'static [&'static str] = &["Increment", "Reset", "Get"];

    fn tag(&self) -> &'static str {
        match self {
            Self::Increment { .. } => "Increment",
            Self::Reset => "Reset",
            Self::Get => "Get",
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "_tag")]
pub enum CounterEvent {
    Incremented { by: u64 },
    Reset,
}

pub struct Counter {
    id: PersistenceId,
}

impl Counter {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: PersistenceId::new(id),
        }
    }
}

#[async_trait]
impl EventSourcedStateful for Counter {
    type Message = CounterCommand;
    type State = u64;
    type Event = CounterEvent;

    fn persistence_id(&self) -> PersistenceId {
        self.id.clone()
    }

    async fn receive(
        &self,
        count: &u64,
        message: CounterCommand,
        _context: &Context,
    ) -> Result<Reaction<CounterEvent, u64, u64>, String> {
        match message {
            CounterCommand::Increment { by: 0 } => Err("increment must be positive".to_string()),
            CounterCommand::Increment { by } => {
                if count.checked_add(by).is_none() {
                    return Err(format!("counter would overflow past {}", count));
                }
                Ok(Reaction::persist(
                    vec![CounterEvent::Incremented { by }],
                    |count| *count,
                ))
            }
            CounterCommand::Reset if *count == 0 => Ok(Reaction::reply(|count| *count)),
            CounterCommand::Reset => Ok(Reaction::persist(vec![CounterEvent::Reset], |count| {
                *count
            })),
            CounterCommand::Get => Ok(Reaction::reply(|count| *count)),
        }
    }

    fn source_event(&self, count: u64, event: &CounterEvent) -> u64 {
        match event {
            CounterEvent::Incremented { by } => count + by,
            CounterEvent::Reset => 0,
        }
    }
}
