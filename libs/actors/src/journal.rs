//! Event Journal
//!
//! Append-only event store keyed by `PersistenceId`, one journal per actor
//! system name. Entries are stored encoded (JSON values); the typed helpers on
//! `dyn Journal` encode and decode through serde on the way in and out.
//!
//! The in-memory journal ignores snapshots by default and always replays the
//! full event list. `InMemoryJournal::with_snapshots` keeps the latest
//! snapshot and only replays events written after it, which is how a durable
//! implementation bounds replay cost.

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

/// Identity of an event-sourced actor's journal entry
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PersistenceId(String);

impl PersistenceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PersistenceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PersistenceId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Stored events plus the latest snapshot, if the journal keeps one
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JournalEntry {
    pub snapshot: Option<Value>,
    pub events: Vec<Value>,
}

/// Journal failures
#[derive(Error, Debug)]
pub enum JournalError {
    #[error("Journal codec error: {0}")]
    Codec(#[from] serde_json::Error),

    #[error("Journal storage error: {message}")]
    Storage { message: String },
}

impl JournalError {
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }
}

/// Append-only event store
#[async_trait]
pub trait Journal: Send + Sync + 'static {
    /// Append `events` to the entry for `id`, creating it if absent
    async fn persist_entry(
        &self,
        id: &PersistenceId,
        events: Vec<Value>,
        snapshot: Option<Value>,
    ) -> Result<(), JournalError>;

    /// Snapshot (if kept) and the events to replay on top of it
    async fn get_entry(&self, id: &PersistenceId) -> Result<JournalEntry, JournalError>;
}

impl dyn Journal {
    /// Encode and append typed events, with the state they lead to
    pub async fn persist_typed<E, S>(
        &self,
        id: &PersistenceId,
        events: &[E],
        snapshot: Option<&S>,
    ) -> Result<(), JournalError>
    where
        E: Serialize,
        S: Serialize,
    {
        let events = events
            .iter()
            .map(serde_json::to_value)
            .collect::<Result<Vec<_>, _>>()?;
        let snapshot = snapshot.map(serde_json::to_value).transpose()?;
        self.persist_entry(id, events, snapshot).await
    }

    /// Load and decode the entry for `id`
    pub async fn load_typed<E, S>(
        &self,
        id: &PersistenceId,
    ) -> Result<(Option<S>, Vec<E>), JournalError>
    where
        E: DeserializeOwned,
        S: DeserializeOwned,
    {
        let entry = self.get_entry(id).await?;
        let snapshot = entry.snapshot.map(serde_json::from_value).transpose()?;
        let events = entry
            .events
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<_>, _>>()?;
        Ok((snapshot, events))
    }
}

/// Hands out one journal per actor system name
pub trait JournalFactory: Send + Sync + 'static {
    fn get_journal(&self, system_name: &str) -> Arc<dyn Journal>;
}

#[derive(Debug, Default)]
struct StoredEntry {
    events: Vec<Value>,
    snapshot: Option<Value>,
    /// Number of events already folded into `snapshot`
    snapshot_seq: usize,
}

/// In-memory reference journal
#[derive(Debug, Default)]
pub struct InMemoryJournal {
    entries: RwLock<HashMap<PersistenceId, StoredEntry>>,
    keep_snapshots: bool,
}

impl InMemoryJournal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Journal that keeps the latest snapshot and replays only newer events
    pub fn with_snapshots() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            keep_snapshots: true,
        }
    }

    /// Total events ever appended for `id`
    pub fn event_count(&self, id: &PersistenceId) -> usize {
        self.entries
            .read()
            .get(id)
            .map(|entry| entry.events.len())
            .unwrap_or(0)
    }
}

#[async_trait]
impl Journal for InMemoryJournal {
    async fn persist_entry(
        &self,
        id: &PersistenceId,
        events: Vec<Value>,
        snapshot: Option<Value>,
    ) -> Result<(), JournalError> {
        let mut entries = self.entries.write();
        let entry = entries.entry(id.clone()).or_default();
        entry.events.extend(events);

        if self.keep_snapshots {
            if let Some(snapshot) = snapshot {
                entry.snapshot = Some(snapshot);
                entry.snapshot_seq = entry.events.len();
            }
        }

        debug!(
            persistence_id = %id,
            total_events = entry.events.len(),
            "Persisted journal entry"
        );
        Ok(())
    }

    async fn get_entry(&self, id: &PersistenceId) -> Result<JournalEntry, JournalError> {
        let entries = self.entries.read();
        let Some(entry) = entries.get(id) else {
            return Ok(JournalEntry::default());
        };

        if self.keep_snapshots {
            Ok(JournalEntry {
                snapshot: entry.snapshot.clone(),
                events: entry.events[entry.snapshot_seq..].to_vec(),
            })
        } else {
            Ok(JournalEntry {
                snapshot: None,
                events: entry.events.clone(),
            })
        }
    }
}

/// Memoizing factory of in-memory journals
#[derive(Debug, Default)]
pub struct InMemoryJournalFactory {
    journals: Mutex<HashMap<String, Arc<InMemoryJournal>>>,
    keep_snapshots: bool,
}

impl InMemoryJournalFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Factory whose journals keep snapshots
    pub fn with_snapshots() -> Self {
        Self {
            journals: Mutex::new(HashMap::new()),
            keep_snapshots: true,
        }
    }

    /// Concrete journal for `system_name`, created on first use
    pub fn journal(&self, system_name: &str) -> Arc<InMemoryJournal> {
        let mut journals = self.journals.lock();
        Arc::clone(journals.entry(system_name.to_string()).or_insert_with(|| {
            info!(system = system_name, "Creating in-memory journal");
            Arc::new(if self.keep_snapshots {
                InMemoryJournal::with_snapshots()
            } else {
                InMemoryJournal::new()
            })
        }))
    }
}

impl JournalFactory for InMemoryJournalFactory {
    fn get_journal(&self, system_name: &str) -> Arc<dyn Journal> {
        self.journal(system_name)
    }
}
