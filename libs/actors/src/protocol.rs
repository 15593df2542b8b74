//! Message Protocol
//!
//! Each actor speaks one closed message set: a serde enum tagged by `_tag`,
//! matched exhaustively by its behavior. The `Message` impl of that enum plays
//! the role of the message registry:
//! - `TAGS` lists every request tag the actor accepts
//! - `Response` and `Error` fix the reply shapes
//! - `decode_command` turns an untyped wire payload into the typed message and
//!   hands back the encoder for its reply
//!
//! ```rust
//! use actor_runtime::Message;
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Clone, Debug, Serialize, Deserialize)]
//! #[serde(tag = "_tag")]
//! enum Counter {
//!     Increment,
//!     Get,
//! }
//!
//! impl Message for Counter {
//!     type Response = u64;
//!     type Error = String;
//!     const TAGS: &'static [&'static str] = &["Increment", "Get"];
//!
//!     fn tag(&self) -> &'static str {
//!         match self {
//!             Counter::Increment => "Increment",
//!             Counter::Get => "Get",
//!         }
//!     }
//! }
//! ```

use crate::error::{ActorSystemError, AskError, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::fmt::{Debug, Display};
use std::marker::PhantomData;

/// Wire field carrying the message tag
pub const TAG_FIELD: &str = "_tag";

/// A closed set of messages understood by one kind of actor
pub trait Message: Clone + Debug + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Successful reply
    type Response: Debug + Serialize + DeserializeOwned + Send + 'static;

    /// Declared business error, retried by supervisors
    type Error: Debug + Display + Serialize + DeserializeOwned + Send + Sync + 'static;

    /// Tags of every variant
    const TAGS: &'static [&'static str];

    /// Tag of this variant, as written in the `_tag` field
    fn tag(&self) -> &'static str;
}

/// A wire command decoded into its typed message
#[derive(Debug)]
pub struct DecodedCommand<M: Message> {
    pub message: M,
    pub encoder: ReplyEncoder<M>,
}

/// Encodes replies to a decoded message
pub struct ReplyEncoder<M: Message> {
    _phantom: PhantomData<fn() -> M>,
}

impl<M: Message> Debug for ReplyEncoder<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReplyEncoder")
            .field("message", &std::any::type_name::<M>())
            .finish()
    }
}

impl<M: Message> Default for ReplyEncoder<M> {
    fn default() -> Self {
        Self {
            _phantom: PhantomData,
        }
    }
}

impl<M: Message> Clone for ReplyEncoder<M> {
    fn clone(&self) -> Self {
        Self::default()
    }
}

impl<M: Message> ReplyEncoder<M> {
    pub fn encode_response(&self, response: &M::Response) -> Result<Value> {
        serde_json::to_value(response).map_err(ActorSystemError::command_parser)
    }

    /// Always encodes the runtime/declared error union
    pub fn encode_error(&self, error: &AskError<M::Error>) -> Result<Value> {
        serde_json::to_value(error).map_err(ActorSystemError::command_parser)
    }
}

/// Validate an untyped payload against the message set and decode it
pub fn decode_command<M: Message>(payload: Value) -> Result<DecodedCommand<M>> {
    let tag = payload
        .get(TAG_FIELD)
        .and_then(Value::as_str)
        .ok_or_else(|| ActorSystemError::command_parser("missing _tag"))?;

    if !M::TAGS.contains(&tag) {
        return Err(ActorSystemError::command_parser(format!(
            "unknown tag {:?} for {}",
            tag,
            std::any::type_name::<M>()
        )));
    }

    let message = serde_json::from_value::<M>(payload).map_err(ActorSystemError::command_parser)?;

    Ok(DecodedCommand {
        message,
        encoder: ReplyEncoder::default(),
    })
}

pub fn encode_request<M: Message>(message: &M) -> Result<Value> {
    serde_json::to_value(message).map_err(ActorSystemError::command_parser)
}

pub fn decode_response<M: Message>(payload: Value) -> Result<M::Response> {
    serde_json::from_value(payload).map_err(ActorSystemError::command_parser)
}

pub fn decode_error<M: Message>(payload: Value) -> Result<AskError<M::Error>> {
    serde_json::from_value(payload).map_err(ActorSystemError::command_parser)
}
