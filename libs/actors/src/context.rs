//! Actor Context
//!
//! Handed to every handler invocation: the actor's own path, a view of the
//! actor system rooted at that path, and the set of children it creates.

use crate::actor::{Actor, Children, LocalActor};
use crate::actor_ref::{ActorRef, ActorRefLocal};
use crate::behavior::AbstractStateful;
use crate::error::{ActorSystemError, Result};
use crate::journal::Journal;
use crate::path::ActorPath;
use crate::protocol::Message;
use crate::supervisor::Supervisor;
use crate::system::ActorSystem;
use std::sync::Arc;

#[derive(Clone)]
pub struct Context {
    self_path: ActorPath,
    system: ActorSystem,
    children: Children,
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("self_path", &self.self_path.to_string())
            .field("children", &self.children.lock().len())
            .finish()
    }
}

impl Context {
    pub(crate) fn new(self_path: ActorPath, system: ActorSystem) -> Self {
        Self {
            self_path,
            system,
            children: Children::default(),
        }
    }

    pub fn self_path(&self) -> &ActorPath {
        &self.self_path
    }

    /// System view whose `make` creates actors under this actor's path
    pub fn system(&self) -> &ActorSystem {
        &self.system
    }

    pub(crate) fn children(&self) -> Children {
        Arc::clone(&self.children)
    }

    /// Reference to this actor; resolvable once `make` has returned
    pub fn self_ref<M: Message>(&self) -> Result<ActorRef<M>> {
        self.system.select(&self.self_path.to_string())
    }

    /// Create a child actor, stopped whenever this actor stops
    ///
    /// Fails once this actor has stopped; a child finished after that point
    /// is stopped before the error is returned.
    pub async fn make<B: AbstractStateful>(
        &self,
        name: &str,
        supervisor: Supervisor,
        behavior: B,
        initial_state: B::State,
    ) -> Result<ActorRef<B::Message>> {
        if self.children.lock().is_closed() {
            return Err(self.parent_stopped());
        }

        let child: Arc<Actor<B::Message>> = self
            .system
            .make_local(name, supervisor, behavior, initial_state, Some(&self.children))
            .await?;

        let adopted = self
            .children
            .lock()
            .adopt(Arc::clone(&child) as Arc<dyn LocalActor>);
        if !adopted {
            child.stop();
            return Err(self.parent_stopped());
        }

        Ok(ActorRef::Local(ActorRefLocal::new(child)))
    }

    fn parent_stopped(&self) -> ActorSystemError {
        ActorSystemError::error_making_actor(format!("parent {} is stopped", self.self_path))
    }

    pub fn select<M: Message>(&self, address: &str) -> Result<ActorRef<M>> {
        self.system.select(address)
    }

    /// Journal of the owning system
    pub fn journal(&self) -> Arc<dyn Journal> {
        self.system.journal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::ChildSet;
    use crate::behavior::{Stateful, StatefulBehavior};
    use async_trait::async_trait;
    use serde::{Deserialize, Serialize};

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    #[serde(tag = "_tag")]
    enum Brood {
        Hatch { name: String },
        Count,
    }

    impl Message for Brood {
        type Response = usize;
        type Error = String;
        const TAGS: &'static [&'static str] = &["Hatch", "Count"];

        fn tag(&self) -> &'static str {
            match self {
                Brood::Hatch { .. } => "Hatch",
                Brood::Count => "Count",
            }
        }
    }

    struct Nest;

    #[async_trait]
    impl Stateful for Nest {
        type Message = Brood;
        type State = ();

        async fn receive(
            &self,
            _state: &mut (),
            message: Brood,
            context: &Context,
        ) -> std::result::Result<usize, String> {
            if let Brood::Hatch { name } = message {
                context
                    .make(&name, Supervisor::none(), StatefulBehavior::new(Nest), ())
                    .await
                    .map_err(|e| e.to_string())?;
            }
            Ok(context.children().lock().len())
        }
    }

    #[tokio::test]
    async fn test_stopped_child_leaves_parent_set() {
        let system = ActorSystem::new("sys1", None).unwrap();
        let nest = system
            .make("nest", Supervisor::none(), StatefulBehavior::new(Nest), ())
            .await
            .unwrap();

        for name in ["a", "b", "c"] {
            nest.ask(Brood::Hatch {
                name: name.to_string(),
            })
            .await
            .unwrap();
        }
        assert_eq!(nest.ask(Brood::Count).await, Ok(3));

        for name in ["a", "b"] {
            let child = system
                .select::<Brood>(&format!("zio://sys1@0.0.0.0:0000/nest/{name}"))
                .unwrap();
            child.stop().await.unwrap();
        }
        // No new child is made, so the set must shrink on stop alone
        assert_eq!(nest.ask(Brood::Count).await, Ok(1));

        nest.stop().await.unwrap();
        assert!(system.actor_names().is_empty());
    }

    #[tokio::test]
    async fn test_closed_set_refuses_children() {
        let system = ActorSystem::new("sys1", None).unwrap();
        system
            .make("late", Supervisor::none(), StatefulBehavior::new(Nest), ())
            .await
            .unwrap();
        let late = system
            .find_local(&ActorPath::parse("zio://sys1@0.0.0.0:0000/late").unwrap())
            .unwrap();

        let mut set = ChildSet::default();
        assert!(set.close().is_empty());
        assert!(set.is_closed());
        assert!(!set.adopt(late));
        assert_eq!(set.len(), 0);
    }
}
