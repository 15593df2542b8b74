//! Command endpoint: `POST /cmd` with a wire envelope, dispatched to the
//! addressed local actor through its `run_op`.

use crate::envelope::{WireEnvelope, WireReply};
use crate::error::{ActorSystemError, Result};
use crate::path::ActorPath;
use crate::system::ActorSystem;
use actor_config::defaults;
use hyper::service::{make_service_fn, service_fn};
use hyper::{Body, Method, Request, Response, Server, StatusCode};
use std::convert::Infallible;
use std::future::Future;
use std::net::{SocketAddr, TcpListener};
use tracing::{debug, error, info};

/// HTTP server exposing one actor system to remote refs
pub struct RemoteServer {
    system: ActorSystem,
}

impl RemoteServer {
    /// Fails with `NoRemoteSupportException` unless the system has remoting
    pub fn new(system: ActorSystem) -> Result<Self> {
        if system.remote_config().is_none() {
            return Err(ActorSystemError::NoRemoteSupport);
        }
        Ok(Self { system })
    }

    /// Address the system advertises
    pub fn advertised_addr(&self) -> Result<SocketAddr> {
        let remote = self
            .system
            .remote_config()
            .ok_or(ActorSystemError::NoRemoteSupport)?;
        format!("{}:{}", remote.host, remote.port)
            .parse()
            .map_err(|_| ActorSystemError::post_operation(format!("bad address {}", remote.host)))
    }

    /// Bind the advertised address and serve until `shutdown` resolves
    pub async fn serve(self, shutdown: impl Future<Output = ()> + Send) -> Result<()> {
        let addr = self.advertised_addr()?;
        let listener = TcpListener::bind(addr).map_err(ActorSystemError::post_operation)?;
        self.serve_listener(listener, shutdown).await
    }

    /// Serve on an already bound listener until `shutdown` resolves
    pub async fn serve_listener(
        self,
        listener: TcpListener,
        shutdown: impl Future<Output = ()> + Send,
    ) -> Result<()> {
        listener
            .set_nonblocking(true)
            .map_err(ActorSystemError::post_operation)?;
        let local_addr = listener
            .local_addr()
            .map_err(ActorSystemError::post_operation)?;
        let system = self.system;

        let make_svc = make_service_fn(move |_conn| {
            let system = system.clone();
            async move {
                Ok::<_, Infallible>(service_fn(move |req| {
                    let system = system.clone();
                    handle_request(req, system)
                }))
            }
        });

        let server = Server::from_tcp(listener)
            .map_err(ActorSystemError::post_operation)?
            .serve(make_svc)
            .with_graceful_shutdown(shutdown);

        info!(
            addr = %local_addr,
            route = defaults::COMMAND_ROUTE,
            "Remote command endpoint listening"
        );

        if let Err(e) = server.await {
            error!(error = %e, "Remote command endpoint failed");
            return Err(ActorSystemError::post_operation(e));
        }
        info!(addr = %local_addr, "Remote command endpoint stopped");
        Ok(())
    }
}

async fn handle_request(
    req: Request<Body>,
    system: ActorSystem,
) -> std::result::Result<Response<Body>, Infallible> {
    debug!(method = %req.method(), path = %req.uri().path(), "Command endpoint request");

    if req.uri().path() != defaults::COMMAND_ROUTE {
        return Ok(plain(StatusCode::NOT_FOUND, "Not found"));
    }
    if req.method() != Method::POST {
        return Ok(plain(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed"));
    }

    let reply = match hyper::body::to_bytes(req.into_body()).await {
        Ok(body) => dispatch(&system, &body).await,
        Err(e) => WireReply::system_error(&ActorSystemError::command_parser(e)),
    };
    Ok(json(&reply))
}

/// Decode the envelope and run it against the addressed actor
async fn dispatch(system: &ActorSystem, body: &[u8]) -> WireReply {
    let wire: WireEnvelope = match serde_json::from_slice(body) {
        Ok(wire) => wire,
        Err(e) => return WireReply::system_error(&ActorSystemError::command_parser(e)),
    };

    let path = match ActorPath::parse(&wire.path) {
        Ok(path) => path,
        Err(e) => return WireReply::system_error(&e),
    };

    match system.find_local(&path) {
        Some(actor) => {
            debug!(actor_path = %path, op = ?wire.op, "Dispatching remote command");
            actor.run_op(wire).await
        }
        None => WireReply::system_error(&ActorSystemError::no_such_actor(wire.path)),
    }
}

fn json(reply: &WireReply) -> Response<Body> {
    let body = serde_json::to_vec(reply).unwrap_or_else(|_| b"{}".to_vec());
    Response::builder()
        .status(StatusCode::OK)
        .header("content-type", "application/json")
        .body(Body::from(body))
        .unwrap_or_else(|_| Response::new(Body::empty()))
}

fn plain(status: StatusCode, message: &'static str) -> Response<Body> {
    let mut response = Response::new(Body::from(message));
    *response.status_mut() = status;
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    #[test]
    fn test_requires_remoting() {
        let system = ActorSystem::new("sys1", None).unwrap();
        assert_eq!(
            RemoteServer::new(system).err(),
            Some(ActorSystemError::NoRemoteSupport)
        );
    }

    #[tokio::test]
    async fn test_malformed_body_is_a_parser_error() {
        let system = ActorSystem::new("sys1", None).unwrap();
        let reply = dispatch(&system, b"{not json").await;
        let error = serde_json::to_value(reply).unwrap();
        assert_eq!(error["error"]["System"]["_tag"], "CommandParserException");
    }

    #[tokio::test]
    async fn test_unknown_actor_is_reported() {
        let system = ActorSystem::new("sys1", None).unwrap();
        let body = json!({"op": "Stop", "path": "zio://sys1@0.0.0.0:0000/ghost"}).to_string();

        let reply: Value = serde_json::to_value(dispatch(&system, body.as_bytes()).await).unwrap();
        assert_eq!(
            reply["error"]["System"],
            json!({"_tag": "NoSuchActorException", "path": "zio://sys1@0.0.0.0:0000/ghost"})
        );
    }
}
