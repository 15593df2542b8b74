//! Remote delivery over HTTP
//!
//! Remote refs POST envelopes to `http://<host>:<port>/cmd`; the node that
//! owns the recipient serves that route and replies with `{response}`,
//! `{error}`, `{stops}` or `{}`.

mod client;
mod server;

pub use client::RemoteClient;
pub use server::RemoteServer;
