//! Actor System
//!
//! Owns the path registry, the journal factory and the remote client of one
//! named system, and creates and resolves actors.
//!
//! `ActorSystem` is a cheap handle. Each actor's `Context` carries a view of
//! the same system whose `parent_actor` is that actor's path, so actors made
//! through it are named `/<parent>/<name>`.
//!
//! ```rust,no_run
//! use actor_runtime::{ActorSystem, RemoteConfig};
//!
//! # fn main() -> actor_runtime::Result<()> {
//! let local = ActorSystem::new("sys1", None)?;
//! let remote = ActorSystem::builder("sys2")
//!     .remote(RemoteConfig::new("127.0.0.1", 9000))
//!     .mailbox_size(1_024)
//!     .build()?;
//! # Ok(())
//! # }
//! ```

use crate::actor::{Actor, ActorId, ChildSet, Children, LocalActor, OnStop};
use crate::actor_ref::{ActorRef, ActorRefLocal, ActorRefRemote};
use crate::behavior::AbstractStateful;
use crate::context::Context;
use crate::error::{ActorSystemError, Result};
use crate::journal::{InMemoryJournalFactory, Journal, JournalFactory};
use crate::metrics::SystemMetrics;
use crate::path::{validate_actor_name, validate_system_name, ActorPath};
use crate::protocol::Message;
use crate::registry::ActorRegistry;
use crate::remote::RemoteClient;
use crate::supervisor::Supervisor;
use actor_config::{defaults, RemoteConfig, RuntimeConfig};
use parking_lot::Mutex;
use std::fmt;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Handle to a named actor system
#[derive(Clone)]
pub struct ActorSystem {
    shared: Arc<SystemShared>,
    /// Path of the actor this view belongs to, `None` at the root
    parent_actor: Option<String>,
}

struct SystemShared {
    name: String,
    remote: Option<RemoteConfig>,
    coordinates: RemoteConfig,
    registry: ActorRegistry,
    journals: Arc<dyn JournalFactory>,
    mailbox_size: usize,
    client: RemoteClient,
    metrics: Arc<SystemMetrics>,
}

impl fmt::Debug for ActorSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActorSystem")
            .field("name", &self.shared.name)
            .field("remote", &self.shared.remote)
            .field("parent_actor", &self.parent_actor)
            .field("actors", &self.shared.registry.len())
            .finish()
    }
}

/// Builder for `ActorSystem`
pub struct ActorSystemBuilder {
    name: String,
    remote: Option<RemoteConfig>,
    mailbox_size: usize,
    remote_timeout: Duration,
    journal_factory: Option<Arc<dyn JournalFactory>>,
}

impl ActorSystemBuilder {
    /// Advertise and serve at these coordinates
    pub fn remote(mut self, remote: RemoteConfig) -> Self {
        self.remote = Some(remote);
        self
    }

    pub fn mailbox_size(mut self, mailbox_size: usize) -> Self {
        self.mailbox_size = mailbox_size;
        self
    }

    /// Timeout of calls made through remote refs
    pub fn remote_timeout(mut self, timeout: Duration) -> Self {
        self.remote_timeout = timeout;
        self
    }

    /// Share journals with other systems built from the same factory
    pub fn journal_factory(mut self, factory: Arc<dyn JournalFactory>) -> Self {
        self.journal_factory = Some(factory);
        self
    }

    pub fn build(self) -> Result<ActorSystem> {
        validate_system_name(&self.name)?;

        let metrics = Arc::new(SystemMetrics::default());
        let client = RemoteClient::new(self.remote_timeout, Arc::clone(&metrics))?;
        let coordinates = self.remote.clone().unwrap_or_else(RemoteConfig::unspecified);
        let journals = self
            .journal_factory
            .unwrap_or_else(|| Arc::new(InMemoryJournalFactory::new()));

        info!(
            system = %self.name,
            host = %coordinates.host,
            port = coordinates.port,
            remoting = self.remote.is_some(),
            "Creating actor system"
        );

        Ok(ActorSystem {
            shared: Arc::new(SystemShared {
                name: self.name,
                remote: self.remote,
                coordinates,
                registry: ActorRegistry::new(),
                journals,
                mailbox_size: self.mailbox_size,
                client,
                metrics,
            }),
            parent_actor: None,
        })
    }
}

impl ActorSystem {
    /// System with default settings; `None` disables remoting
    pub fn new(name: &str, remote: Option<RemoteConfig>) -> Result<Self> {
        let builder = Self::builder(name);
        match remote {
            Some(remote) => builder.remote(remote).build(),
            None => builder.build(),
        }
    }

    pub fn builder(name: impl Into<String>) -> ActorSystemBuilder {
        ActorSystemBuilder {
            name: name.into(),
            remote: None,
            mailbox_size: defaults::MAILBOX_SIZE,
            remote_timeout: Duration::from_millis(defaults::REMOTE_TIMEOUT_MS),
            journal_factory: None,
        }
    }

    /// System described by loaded configuration, with in-memory journals
    pub fn from_config(config: &RuntimeConfig) -> Result<Self> {
        let mut builder = Self::builder(config.system.name.clone())
            .mailbox_size(config.system.mailbox_size);
        if let Some(remote) = &config.remote {
            builder = builder
                .remote(remote.remote_config())
                .remote_timeout(Duration::from_millis(remote.timeout_ms));
        }
        builder.build()
    }

    pub fn name(&self) -> &str {
        &self.shared.name
    }

    /// Configured remoting, if any
    pub fn remote_config(&self) -> Option<&RemoteConfig> {
        self.shared.remote.as_ref()
    }

    /// Coordinates written into local actor paths
    pub fn coordinates(&self) -> &RemoteConfig {
        &self.shared.coordinates
    }

    pub fn parent_actor(&self) -> Option<&str> {
        self.parent_actor.as_deref()
    }

    pub fn metrics(&self) -> Arc<SystemMetrics> {
        Arc::clone(&self.shared.metrics)
    }

    /// Journal for this system's name
    pub fn journal(&self) -> Arc<dyn Journal> {
        self.shared.journals.get_journal(&self.shared.name)
    }

    /// Hierarchical paths of every registered actor
    pub fn actor_names(&self) -> Vec<String> {
        self.shared.registry.names()
    }

    /// Look up a local actor by hierarchical path
    pub(crate) fn find_local(&self, path: &ActorPath) -> Option<Arc<dyn LocalActor>> {
        if path.coordinates() != self.shared.coordinates {
            return None;
        }
        self.shared.registry.find(path.path())
    }

    /// Create and register an actor under this view's parent path
    pub async fn make<B: AbstractStateful>(
        &self,
        name: &str,
        supervisor: Supervisor,
        behavior: B,
        initial_state: B::State,
    ) -> Result<ActorRef<B::Message>> {
        let actor = self
            .make_local(name, supervisor, behavior, initial_state, None)
            .await?;
        Ok(ActorRef::Local(ActorRefLocal::new(actor)))
    }

    pub(crate) async fn make_local<B: AbstractStateful>(
        &self,
        name: &str,
        supervisor: Supervisor,
        behavior: B,
        initial_state: B::State,
        parent: Option<&Children>,
    ) -> Result<Arc<Actor<B::Message>>> {
        validate_actor_name(name)?;
        let final_name = format!("{}/{}", self.parent_actor.as_deref().unwrap_or(""), name);

        if self.shared.registry.contains(&final_name) {
            return Err(ActorSystemError::already_exists(final_name));
        }

        let path = ActorPath::new(&self.shared.name, &self.shared.coordinates, &final_name)?;
        let child_view = Self {
            shared: Arc::clone(&self.shared),
            parent_actor: Some(final_name.clone()),
        };
        let context = Context::new(path.clone(), child_view);
        let on_stop = self.deregistration(final_name.clone(), parent.map(Arc::downgrade));

        let actor = behavior
            .make_actor(
                supervisor,
                context,
                on_stop,
                self.shared.mailbox_size,
                initial_state,
            )
            .await
            .map_err(|e| {
                warn!(actor_path = %path, error = %e, "Failed to make actor");
                ActorSystemError::error_making_actor(e)
            })?;
        let actor = Arc::new(actor);

        // The name may have been taken while the behavior was starting
        if let Err(e) = self
            .shared
            .registry
            .register(&final_name, Arc::clone(&actor) as Arc<dyn LocalActor>)
        {
            actor.stop();
            return Err(e);
        }

        self.shared.metrics.record_actor_spawned();
        info!(actor_path = %path, actor_id = %actor.id(), "Actor created");
        Ok(actor)
    }

    /// Stop callback: drop the registry entry and the parent's child handle
    fn deregistration(&self, name: String, parent: Option<Weak<Mutex<ChildSet>>>) -> OnStop {
        let shared: Weak<SystemShared> = Arc::downgrade(&self.shared);
        Arc::new(move |id: ActorId| {
            if let Some(shared) = shared.upgrade() {
                if shared.registry.unregister(&name, id).is_some() {
                    shared.metrics.record_actor_stopped();
                }
            }
            if let Some(children) = parent.as_ref().and_then(Weak::upgrade) {
                children.lock().remove(id);
            }
        })
    }

    /// Resolve an address to a reference
    ///
    /// Addresses at this system's coordinates must name a registered actor
    /// speaking `M`; any other coordinates yield a remote reference whose
    /// existence is checked on first use.
    pub fn select<M: Message>(&self, address: &str) -> Result<ActorRef<M>> {
        let path = ActorPath::parse(address)?;

        if path.coordinates() != self.shared.coordinates {
            debug!(actor_path = %path, "Selected remote actor");
            return Ok(ActorRef::Remote(ActorRefRemote::new(
                path,
                self.shared.client.clone(),
            )));
        }

        let actor = self
            .shared
            .registry
            .find(path.path())
            .ok_or_else(|| ActorSystemError::no_such_actor(address))?;
        let actor = actor
            .into_any()
            .downcast::<Actor<M>>()
            .map_err(|_| ActorSystemError::no_such_actor(address))?;
        Ok(ActorRef::Local(ActorRefLocal::new(actor)))
    }

    /// Stop every registered actor, parents before children
    ///
    /// Returns the total number of discarded messages.
    pub fn shutdown(&self) -> usize {
        info!(system = %self.shared.name, "Shutting down actor system");
        let mut discarded = 0;
        for name in self.shared.registry.names() {
            if let Some(actor) = self.shared.registry.find(&name) {
                discarded += actor.stop();
            }
        }
        info!(system = %self.shared.name, discarded, "Actor system shut down");
        discarded
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::behavior::{Stateful, StatefulBehavior};
    use crate::journal::InMemoryJournalFactory;
    use async_trait::async_trait;
    use serde::{Deserialize, Serialize};

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    #[serde(tag = "_tag")]
    enum Probe {
        Ping,
    }

    impl Message for Probe {
        type Response = String;
        type Error = String;
        const TAGS: &'static [&'static str] = &["Ping"];

        fn tag(&self) -> &'static str {
            "Ping"
        }
    }

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    #[serde(tag = "_tag")]
    enum Other {
        Nothing,
    }

    impl Message for Other {
        type Response = ();
        type Error = String;
        const TAGS: &'static [&'static str] = &["Nothing"];

        fn tag(&self) -> &'static str {
            "Nothing"
        }
    }

    /// Replies with its own path
    struct Whoami;

    #[async_trait]
    impl Stateful for Whoami {
        type Message = Probe;
        type State = ();

        async fn receive(
            &self,
            _state: &mut (),
            _message: Probe,
            context: &Context,
        ) -> std::result::Result<String, String> {
            Ok(context.self_path().to_string())
        }
    }

    fn whoami() -> StatefulBehavior<Whoami> {
        StatefulBehavior::new(Whoami)
    }

    #[tokio::test]
    async fn test_make_assigns_local_path() {
        let system = ActorSystem::new("sys1", None).unwrap();
        let actor = system
            .make("a", Supervisor::none(), whoami(), ())
            .await
            .unwrap();

        assert_eq!(actor.path().to_string(), "zio://sys1@0.0.0.0:0000/a");
        assert_eq!(
            actor.ask(Probe::Ping).await,
            Ok("zio://sys1@0.0.0.0:0000/a".to_string())
        );
        assert_eq!(system.metrics().snapshot().actors_spawned, 1);
    }

    #[tokio::test]
    async fn test_invalid_names_are_rejected() {
        let system = ActorSystem::new("sys1", None).unwrap();
        let error = system
            .make("", Supervisor::none(), whoami(), ())
            .await
            .unwrap_err();
        assert_eq!(error, ActorSystemError::invalid_name(""));

        assert!(matches!(
            ActorSystem::new("bad name", None),
            Err(ActorSystemError::InvalidActorName { .. })
        ));
    }

    #[tokio::test]
    async fn test_select_local_and_missing() {
        let system = ActorSystem::new("sys1", None).unwrap();
        system
            .make("a", Supervisor::none(), whoami(), ())
            .await
            .unwrap();

        let found = system
            .select::<Probe>("zio://sys1@0.0.0.0:0000/a")
            .unwrap();
        assert!(found.is_local());

        assert_eq!(
            system
                .select::<Probe>("zio://sys1@0.0.0.0:0000/missing")
                .unwrap_err(),
            ActorSystemError::no_such_actor("zio://sys1@0.0.0.0:0000/missing")
        );
        // Registered, but speaking another message set
        assert!(matches!(
            system.select::<Other>("zio://sys1@0.0.0.0:0000/a"),
            Err(ActorSystemError::NoSuchActor { .. })
        ));
        assert!(matches!(
            system.select::<Probe>("not a path"),
            Err(ActorSystemError::InvalidActorPath { .. })
        ));
    }

    #[tokio::test]
    async fn test_shutdown_stops_everything() {
        let system = ActorSystem::builder("sys1")
            .journal_factory(Arc::new(InMemoryJournalFactory::new()))
            .build()
            .unwrap();
        for name in ["a", "b"] {
            system
                .make(name, Supervisor::none(), whoami(), ())
                .await
                .unwrap();
        }
        assert_eq!(system.actor_names(), vec!["/a", "/b"]);

        system.shutdown();
        assert!(system.actor_names().is_empty());
        assert_eq!(system.metrics().snapshot().actors_stopped, 2);
    }

    #[test]
    fn test_from_config() {
        let mut config = RuntimeConfig::default();
        config.system.name = "node1".to_string();
        config.system.mailbox_size = 16;
        config.remote = Some(actor_config::RemoteSettings {
            host: "10.0.0.1".to_string(),
            port: 9100,
            timeout_ms: 500,
        });

        let system = ActorSystem::from_config(&config).unwrap();
        assert_eq!(system.name(), "node1");
        assert_eq!(system.coordinates(), &RemoteConfig::new("10.0.0.1", 9100));
        assert!(system.remote_config().is_some());
    }
}
