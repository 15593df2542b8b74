//! Actor System Error Types
//!
//! Closed taxonomy of runtime/infrastructure failures, plus the reply union
//! that lets callers tell runtime failures apart from the business errors a
//! message type declares.

use serde::{Deserialize, Serialize};
use std::fmt::Display;
use thiserror::Error;

/// Runtime and infrastructure errors
///
/// Serialized with a `_tag` discriminator so the same value crosses the wire
/// between nodes unchanged.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "_tag")]
pub enum ActorSystemError {
    #[error("Actor already exists: {actor_name}")]
    #[serde(rename = "ActorAlreadyExistsException", rename_all = "camelCase")]
    ActorAlreadyExists { actor_name: String },

    #[error("No such actor: {path}")]
    #[serde(rename = "NoSuchActorException")]
    NoSuchActor { path: String },

    #[error("Remoting is not configured for this actor system")]
    #[serde(rename = "NoRemoteSupportException")]
    NoRemoteSupport,

    #[error("Invalid actor name: {name:?}")]
    #[serde(rename = "InvalidActorNameException")]
    InvalidActorName { name: String },

    #[error("Invalid actor path: {path}")]
    #[serde(rename = "InvalidActorPathException")]
    InvalidActorPath { path: String },

    #[error("Error making actor: {exception}")]
    #[serde(rename = "ErrorMakingActorException")]
    ErrorMakingActor { exception: String },

    #[error("Command parser error: {exception}")]
    #[serde(rename = "CommandParserException")]
    CommandParser { exception: String },

    #[error("Remote post failed: {exception}")]
    #[serde(rename = "PostOperationException")]
    PostOperation { exception: String },

    #[error("Remote call timed out")]
    #[serde(rename = "TimeoutException")]
    Timeout,

    #[error("Journal error: {exception}")]
    #[serde(rename = "JournalException")]
    Journal { exception: String },
}

/// Result type alias for actor system operations
pub type Result<T, E = ActorSystemError> = std::result::Result<T, E>;

impl ActorSystemError {
    pub fn already_exists(actor_name: impl Into<String>) -> Self {
        Self::ActorAlreadyExists {
            actor_name: actor_name.into(),
        }
    }

    pub fn no_such_actor(path: impl Into<String>) -> Self {
        Self::NoSuchActor { path: path.into() }
    }

    pub fn invalid_name(name: impl Into<String>) -> Self {
        Self::InvalidActorName { name: name.into() }
    }

    pub fn invalid_path(path: impl Into<String>) -> Self {
        Self::InvalidActorPath { path: path.into() }
    }

    /// Wrap a behavior construction failure
    pub fn error_making_actor(exception: impl Display) -> Self {
        Self::ErrorMakingActor {
            exception: exception.to_string(),
        }
    }

    /// Wrap a decode failure of an incoming command or reply
    pub fn command_parser(exception: impl Display) -> Self {
        Self::CommandParser {
            exception: exception.to_string(),
        }
    }

    /// Wrap a remote transport failure
    pub fn post_operation(exception: impl Display) -> Self {
        Self::PostOperation {
            exception: exception.to_string(),
        }
    }

    pub fn journal(exception: impl Display) -> Self {
        Self::Journal {
            exception: exception.to_string(),
        }
    }

    /// Short category name for structured logs
    pub fn category(&self) -> &'static str {
        match self {
            Self::ActorAlreadyExists { .. } => "already_exists",
            Self::NoSuchActor { .. } => "no_such_actor",
            Self::NoRemoteSupport => "no_remote_support",
            Self::InvalidActorName { .. } => "invalid_name",
            Self::InvalidActorPath { .. } => "invalid_path",
            Self::ErrorMakingActor { .. } => "make_actor",
            Self::CommandParser { .. } => "command_parser",
            Self::PostOperation { .. } => "post_operation",
            Self::Timeout => "timeout",
            Self::Journal { .. } => "journal",
        }
    }
}

/// Failure of an `ask`: a runtime error or the error a message type declares
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AskError<E> {
    #[error(transparent)]
    System(#[from] ActorSystemError),

    #[error("{0}")]
    Handler(E),
}

impl<E> AskError<E> {
    /// The runtime error, if this is one
    pub fn as_system(&self) -> Option<&ActorSystemError> {
        match self {
            Self::System(e) => Some(e),
            Self::Handler(_) => None,
        }
    }

    /// The declared business error, if this is one
    pub fn into_handler(self) -> Option<E> {
        match self {
            Self::System(_) => None,
            Self::Handler(e) => Some(e),
        }
    }
}

/// Whether a failure may be retried by a supervisor
pub trait Retryable {
    fn is_retryable(&self) -> bool;
}

impl<E> Retryable for AskError<E> {
    /// Only declared handler errors are retried; runtime errors never are
    fn is_retryable(&self) -> bool {
        matches!(self, Self::Handler(_))
    }
}

impl Retryable for ActorSystemError {
    fn is_retryable(&self) -> bool {
        false
    }
}
