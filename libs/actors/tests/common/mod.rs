//! Actors shared by the integration tests

#![allow(dead_code)]

use actor_runtime::{
    Context, EventSourcedBehavior, EventSourcedStateful, Message, PersistenceId, Reaction,
    Stateful, StatefulBehavior, Supervisor,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Ask timeout used wherever a reply is expected never to arrive
pub const NEVER: Duration = Duration::from_millis(200);

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "_tag")]
pub enum Counter {
    Increment,
    Add { amount: u64 },
    Get,
    Reject,
}

impl Message for Counter {
    type Response = u64;
    type Error = String;
    const TAGS: &'static [&'static str] = &["Increment", "Add", "Get", "Reject"];

    fn tag(&self) -> &'static str {
        match self {
            Counter::Increment => "Increment",
            Counter::Add { .. } => "Add",
            Counter::Get => "Get",
            Counter::Reject => "Reject",
        }
    }
}

/// In-memory counter
pub struct Counting;

#[async_trait]
impl Stateful for Counting {
    type Message = Counter;
    type State = u64;

    async fn receive(
        &self,
        count: &mut u64,
        message: Counter,
        _context: &Context,
    ) -> Result<u64, String> {
        match message {
            Counter::Increment => *count += 1,
            Counter::Add { amount } => *count += amount,
            Counter::Get => {}
            Counter::Reject => return Err("rejected".to_string()),
        }
        Ok(*count)
    }
}

pub fn counting() -> StatefulBehavior<Counting> {
    StatefulBehavior::new(Counting)
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Added(pub u64);

/// Journaled counter
pub struct JournaledCounter {
    pub id: &'static str,
}

#[async_trait]
impl EventSourcedStateful for JournaledCounter {
    type Message = Counter;
    type State = u64;
    type Event = Added;

    fn persistence_id(&self) -> PersistenceId {
        PersistenceId::new(self.id)
    }

    async fn receive(
        &self,
        _count: &u64,
        message: Counter,
        _context: &Context,
    ) -> Result<Reaction<Added, u64, u64>, String> {
        match message {
            Counter::Increment => Ok(Reaction::persist(vec![Added(1)], |count| *count)),
            Counter::Add { amount: 0 } => Ok(Reaction::persist(Vec::new(), |count| *count)),
            Counter::Add { amount } => Ok(Reaction::persist(vec![Added(amount)], |count| *count)),
            Counter::Get => Ok(Reaction::reply(|count| *count)),
            Counter::Reject => Err("rejected".to_string()),
        }
    }

    fn source_event(&self, count: u64, event: &Added) -> u64 {
        count + event.0
    }
}

pub fn journaled(id: &'static str) -> EventSourcedBehavior<JournaledCounter> {
    EventSourcedBehavior::new(JournaledCounter { id })
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "_tag")]
pub enum Journal {
    Record { seq: u32 },
    History,
}

impl Message for Journal {
    type Response = Vec<u32>;
    type Error = String;
    const TAGS: &'static [&'static str] = &["Record", "History"];

    fn tag(&self) -> &'static str {
        match self {
            Journal::Record { .. } => "Record",
            Journal::History => "History",
        }
    }
}

/// Records message order and counts overlapping handler invocations
#[derive(Clone, Default)]
pub struct Recorder {
    pub busy: Arc<AtomicBool>,
    pub overlaps: Arc<AtomicU32>,
}

#[async_trait]
impl Stateful for Recorder {
    type Message = Journal;
    type State = Vec<u32>;

    async fn receive(
        &self,
        history: &mut Vec<u32>,
        message: Journal,
        _context: &Context,
    ) -> Result<Vec<u32>, String> {
        if self.busy.swap(true, Ordering::SeqCst) {
            self.overlaps.fetch_add(1, Ordering::SeqCst);
        }
        tokio::time::sleep(Duration::from_millis(1)).await;

        if let Journal::Record { seq } = message {
            history.push(seq);
        }
        self.busy.store(false, Ordering::SeqCst);
        Ok(history.clone())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "_tag")]
pub enum Family {
    Spawn { name: String },
    StopSelf,
    StopThenSpawn { name: String },
}

impl Message for Family {
    type Response = String;
    type Error = String;
    const TAGS: &'static [&'static str] = &["Spawn", "StopSelf", "StopThenSpawn"];

    fn tag(&self) -> &'static str {
        match self {
            Family::Spawn { .. } => "Spawn",
            Family::StopSelf => "StopSelf",
            Family::StopThenSpawn { .. } => "StopThenSpawn",
        }
    }
}

/// Creates counter children through its context
pub struct Parent;

#[async_trait]
impl Stateful for Parent {
    type Message = Family;
    type State = ();

    async fn receive(
        &self,
        _state: &mut (),
        message: Family,
        context: &Context,
    ) -> Result<String, String> {
        match message {
            Family::Spawn { name } => {
                let child = context
                    .make(&name, Supervisor::none(), counting(), 0)
                    .await
                    .map_err(|e| e.to_string())?;
                Ok(child.path().to_string())
            }
            Family::StopSelf => {
                let me = context
                    .self_ref::<Family>()
                    .map_err(|e| e.to_string())?;
                let discarded = me.stop().await.map_err(|e| e.to_string())?;
                Ok(discarded.to_string())
            }
            Family::StopThenSpawn { name } => {
                let me = context
                    .self_ref::<Family>()
                    .map_err(|e| e.to_string())?;
                me.stop().await.map_err(|e| e.to_string())?;
                let child = context
                    .make(&name, Supervisor::none(), counting(), 0)
                    .await
                    .map_err(|e| e.to_string())?;
                Ok(child.path().to_string())
            }
        }
    }
}
