//! Actor References
//!
//! Location-transparent handles: `ActorRef::Local` delegates straight to the
//! actor, `ActorRef::Remote` ships an envelope to the owning node's command
//! endpoint.
//!
//! A reference serializes as its path string. To get a usable reference back
//! from a decoded path, resolve it explicitly with `ActorSystem::select` or
//! `Context::select`.

use crate::actor::Actor;
use crate::envelope::{Command, Envelope};
use crate::error::{ActorSystemError, AskError, Result};
use crate::mailbox::AskResult;
use crate::path::ActorPath;
use crate::protocol::{decode_error, decode_response, Message};
use crate::remote::RemoteClient;
use serde::{Serialize, Serializer};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::debug;

/// Handle to an actor in this process
pub struct ActorRefLocal<M: Message> {
    actor: Arc<Actor<M>>,
}

impl<M: Message> Clone for ActorRefLocal<M> {
    fn clone(&self) -> Self {
        Self {
            actor: Arc::clone(&self.actor),
        }
    }
}

impl<M: Message> ActorRefLocal<M> {
    pub(crate) fn new(actor: Arc<Actor<M>>) -> Self {
        Self { actor }
    }

    pub fn path(&self) -> &ActorPath {
        self.actor.path()
    }

    pub async fn ask(&self, message: M) -> AskResult<M> {
        self.actor.ask(message).await
    }

    pub async fn tell(&self, message: M) -> Result<()> {
        self.actor.tell(message).await;
        Ok(())
    }

    pub fn stop(&self) -> usize {
        self.actor.stop()
    }
}

/// Handle to an actor on another node
pub struct ActorRefRemote<M: Message> {
    path: ActorPath,
    client: RemoteClient,
    _message: PhantomData<fn() -> M>,
}

impl<M: Message> Clone for ActorRefRemote<M> {
    fn clone(&self) -> Self {
        Self {
            path: self.path.clone(),
            client: self.client.clone(),
            _message: PhantomData,
        }
    }
}

impl<M: Message> ActorRefRemote<M> {
    pub(crate) fn new(path: ActorPath, client: RemoteClient) -> Self {
        Self {
            path,
            client,
            _message: PhantomData,
        }
    }

    pub fn path(&self) -> &ActorPath {
        &self.path
    }

    async fn post(&self, command: Command<M>) -> Result<crate::envelope::WireReply> {
        let wire = Envelope::new(command, self.path.clone()).to_wire()?;
        self.client.post(&self.path.coordinates(), &wire).await
    }

    /// Decodes `response`, or `error` back into the reply union
    pub async fn ask(&self, message: M) -> AskResult<M> {
        let reply = self.post(Command::Ask(message)).await?;

        if let Some(error) = reply.error {
            return Err(decode_error::<M>(error)?);
        }
        let response = reply
            .response
            .ok_or_else(|| ActorSystemError::command_parser("reply has no response"))?;
        Ok(decode_response::<M>(response)?)
    }

    /// Completes once the remote node has accepted the message
    ///
    /// An `error` in the reply, such as an unknown recipient, is logged and
    /// otherwise ignored.
    pub async fn tell(&self, message: M) -> Result<()> {
        let reply = self.post(Command::Tell(message)).await?;
        if let Some(error) = reply.error {
            debug!(actor_path = %self.path, %error, "Remote tell reported an error");
        }
        Ok(())
    }

    /// Best-effort count of messages the remote stop discarded
    pub async fn stop(&self) -> Result<usize> {
        let reply = self.post(Command::Stop).await?;

        if let Some(error) = reply.error {
            return Err(match decode_error::<M>(error)? {
                AskError::System(e) => e,
                AskError::Handler(e) => ActorSystemError::command_parser(e),
            });
        }
        Ok(reply.stops.map_or(0, |stops| stops.len()))
    }
}

/// Location-transparent actor handle
pub enum ActorRef<M: Message> {
    Local(ActorRefLocal<M>),
    Remote(ActorRefRemote<M>),
}

impl<M: Message> Clone for ActorRef<M> {
    fn clone(&self) -> Self {
        match self {
            Self::Local(local) => Self::Local(local.clone()),
            Self::Remote(remote) => Self::Remote(remote.clone()),
        }
    }
}

impl<M: Message> fmt::Debug for ActorRef<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = if self.is_local() { "Local" } else { "Remote" };
        write!(f, "ActorRef::{}({})", kind, self.path())
    }
}

impl<M: Message> Serialize for ActorRef<M> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.path().serialize(serializer)
    }
}

impl<M: Message> ActorRef<M> {
    pub fn path(&self) -> &ActorPath {
        match self {
            Self::Local(local) => local.path(),
            Self::Remote(remote) => remote.path(),
        }
    }

    pub fn is_local(&self) -> bool {
        matches!(self, Self::Local(_))
    }

    /// Send and wait for the reply
    ///
    /// A local ask to a stopped actor never completes; remote asks fail with
    /// `TimeoutException` after the configured timeout.
    pub async fn ask(&self, message: M) -> AskResult<M> {
        match self {
            Self::Local(local) => local.ask(message).await,
            Self::Remote(remote) => remote.ask(message).await,
        }
    }

    pub async fn tell(&self, message: M) -> Result<()> {
        match self {
            Self::Local(local) => local.tell(message).await,
            Self::Remote(remote) => remote.tell(message).await,
        }
    }

    /// Stop the actor and its children; returns the discarded message count
    pub async fn stop(&self) -> Result<usize> {
        match self {
            Self::Local(local) => Ok(local.stop()),
            Self::Remote(remote) => remote.stop().await,
        }
    }
}
