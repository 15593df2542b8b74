//! Actor Registry
//!
//! The one piece of shared mutable state of an actor system: hierarchical
//! path (`/parent/child`) to running actor. Inserts happen on `make`, removals
//! on stop; both go through the same lock.

use crate::actor::{ActorId, LocalActor};
use crate::error::{ActorSystemError, Result};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Path-keyed table of local actors
#[derive(Default)]
pub struct ActorRegistry {
    actors: RwLock<HashMap<String, Arc<dyn LocalActor>>>,
}

impl ActorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `actor` under `name`; an occupied name is left untouched
    pub fn register(&self, name: &str, actor: Arc<dyn LocalActor>) -> Result<()> {
        let mut actors = self.actors.write();
        if actors.contains_key(name) {
            return Err(ActorSystemError::already_exists(name));
        }
        debug!(actor_name = name, actor_id = %actor.id(), "Registering actor");
        actors.insert(name.to_string(), actor);
        Ok(())
    }

    /// Remove `name` only if it is still held by actor `id`
    pub fn unregister(&self, name: &str, id: ActorId) -> Option<Arc<dyn LocalActor>> {
        let mut actors = self.actors.write();
        match actors.get(name) {
            Some(actor) if actor.id() == id => {
                debug!(actor_name = name, actor_id = %id, "Unregistering actor");
                actors.remove(name)
            }
            Some(_) => None,
            None => {
                warn!(actor_name = name, actor_id = %id, "Attempted to unregister unknown actor");
                None
            }
        }
    }

    pub fn find(&self, name: &str) -> Option<Arc<dyn LocalActor>> {
        self.actors.read().get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.actors.read().contains_key(name)
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.actors.read().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.actors.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.actors.read().is_empty()
    }
}
