//! Actor Envelopes
//!
//! The unit of remote delivery: an operation (`Ask`, `Tell`, `Stop`) paired
//! with the recipient path. Correlation is implicit in the HTTP
//! request/response pairing, so no envelope carries an id.
//!
//! Wire body: `{ "_tag", "op", "path", "request" }` (`_tag` and `request` are
//! omitted for `Stop`).

use crate::error::{ActorSystemError, Result};
use crate::path::ActorPath;
use crate::protocol::{decode_command, encode_request, Message};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Operation requested of an actor
#[derive(Debug, Clone, PartialEq)]
pub enum Command<M> {
    Ask(M),
    Tell(M),
    Stop,
}

impl<M: Message> Command<M> {
    pub fn op(&self) -> Op {
        match self {
            Command::Ask(_) => Op::Ask,
            Command::Tell(_) => Op::Tell,
            Command::Stop => Op::Stop,
        }
    }
}

/// Wire name of a command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Op {
    Ask,
    Tell,
    Stop,
}

/// Typed envelope
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope<M> {
    pub command: Command<M>,
    pub recipient: ActorPath,
}

/// Untyped envelope as it travels over HTTP
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireEnvelope {
    #[serde(rename = "_tag", default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    pub op: Op,
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request: Option<Value>,
}

/// Reply body of the command endpoint
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WireReply {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stops: Option<Vec<()>>,
}

impl<M: Message> Envelope<M> {
    pub fn new(command: Command<M>, recipient: ActorPath) -> Self {
        Self { command, recipient }
    }

    pub fn to_wire(&self) -> Result<WireEnvelope> {
        let (tag, request) = match &self.command {
            Command::Ask(msg) | Command::Tell(msg) => {
                (Some(msg.tag().to_string()), Some(encode_request(msg)?))
            }
            Command::Stop => (None, None),
        };

        Ok(WireEnvelope {
            tag,
            op: self.command.op(),
            path: self.recipient.to_string(),
            request,
        })
    }

    pub fn from_wire(wire: WireEnvelope) -> Result<Self> {
        let recipient = ActorPath::parse(&wire.path)?;

        let command = match wire.op {
            Op::Stop => Command::Stop,
            Op::Ask | Op::Tell => {
                let request = wire
                    .request
                    .ok_or_else(|| ActorSystemError::command_parser("missing request"))?;
                let message = decode_command::<M>(request)?.message;
                if let Some(tag) = wire.tag.as_deref() {
                    if tag != message.tag() {
                        return Err(ActorSystemError::command_parser(format!(
                            "envelope tag {tag} does not match request tag {}",
                            message.tag()
                        )));
                    }
                }
                if wire.op == Op::Ask {
                    Command::Ask(message)
                } else {
                    Command::Tell(message)
                }
            }
        };

        Ok(Self { command, recipient })
    }
}

impl WireReply {
    pub fn response(value: Value) -> Self {
        Self {
            response: Some(value),
            ..Self::default()
        }
    }

    pub fn error(value: Value) -> Self {
        Self {
            error: Some(value),
            ..Self::default()
        }
    }

    /// One `null` per discarded message
    pub fn stops(discarded: usize) -> Self {
        Self {
            stops: Some(vec![(); discarded]),
            ..Self::default()
        }
    }

    pub fn system_error(error: &ActorSystemError) -> Self {
        let value = serde_json::to_value(crate::error::AskError::<()>::System(error.clone()))
            .unwrap_or(Value::Null);
        Self::error(value)
    }
}
