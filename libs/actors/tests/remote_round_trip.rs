//! Remoting integration tests
//!
//! Runs two actor systems in one process, the second serving its command
//! endpoint on a loopback port:
//! - Selecting foreign coordinates yields a remote reference
//! - Ask, tell and stop travel over HTTP with the same results as locally
//! - Handler and runtime errors are decoded back into the reply union

mod common;

use actor_runtime::{
    ActorSystem, ActorSystemError, AskError, RemoteConfig, RemoteServer, Supervisor,
};
use common::{counting, Counter};
use serde_json::{json, Value};
use std::net::TcpListener;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

struct Node {
    system: ActorSystem,
    port: u16,
    shutdown: oneshot::Sender<()>,
    server: JoinHandle<actor_runtime::Result<()>>,
}

/// Build a system named `name` serving on an ephemeral loopback port
fn serve(name: &str) -> Node {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    let system = ActorSystem::new(name, Some(RemoteConfig::new("127.0.0.1", port))).unwrap();

    let (shutdown, signal) = oneshot::channel::<()>();
    let server = RemoteServer::new(system.clone()).unwrap();
    let server = tokio::spawn(server.serve_listener(listener, async {
        let _ = signal.await;
    }));

    Node {
        system,
        port,
        shutdown,
        server,
    }
}

#[tokio::test]
async fn test_select_on_foreign_coordinates_is_remote() {
    let system = ActorSystem::new("sys1", None).unwrap();
    let remote = system
        .select::<Counter>("zio://sys1@1.2.3.4:9999/x")
        .unwrap();

    assert!(!remote.is_local());
    assert_eq!(remote.path().to_string(), "zio://sys1@1.2.3.4:9999/x");
}

#[tokio::test]
async fn test_ask_tell_and_stop_over_http() {
    let node = serve("sys2");
    node.system
        .make("counter", Supervisor::none(), counting(), 0)
        .await
        .unwrap();

    let caller = ActorSystem::new("sys1", None).unwrap();
    let address = format!("zio://sys2@127.0.0.1:{}/counter", node.port);
    let counter = caller.select::<Counter>(&address).unwrap();
    assert!(!counter.is_local());

    assert_eq!(counter.ask(Counter::Increment).await, Ok(1));
    assert_eq!(counter.ask(Counter::Add { amount: 2 }).await, Ok(3));

    counter.tell(Counter::Increment).await.unwrap();
    assert_eq!(counter.ask(Counter::Get).await, Ok(4));

    assert_eq!(
        counter.ask(Counter::Reject).await,
        Err(AskError::Handler("rejected".to_string()))
    );

    assert_eq!(counter.stop().await, Ok(0));
    assert!(node.system.actor_names().is_empty());

    let stats = caller.metrics().snapshot();
    assert_eq!(stats.remote_calls, 6);
    assert_eq!(stats.remote_failures, 0);

    node.shutdown.send(()).unwrap();
    node.server.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_unknown_remote_actor_is_a_system_error() {
    let node = serve("sys2");
    let caller = ActorSystem::new("sys1", None).unwrap();
    let address = format!("zio://sys2@127.0.0.1:{}/ghost", node.port);

    let ghost = caller.select::<Counter>(&address).unwrap();
    assert_eq!(
        ghost.ask(Counter::Get).await,
        Err(AskError::System(ActorSystemError::no_such_actor(
            address.clone()
        )))
    );
    assert_eq!(
        ghost.stop().await,
        Err(ActorSystemError::no_such_actor(address))
    );

    // The node answers with an error body; tell still only reports delivery
    assert_eq!(ghost.tell(Counter::Increment).await, Ok(()));
    assert_eq!(caller.metrics().snapshot().remote_failures, 0);

    node.shutdown.send(()).unwrap();
    node.server.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_command_endpoint_wire_format() {
    let node = serve("sys2");
    node.system
        .make("counter", Supervisor::none(), counting(), 41)
        .await
        .unwrap();

    let url = RemoteConfig::new("127.0.0.1", node.port).command_url();
    let path = format!("zio://sys2@127.0.0.1:{}/counter", node.port);
    let http = reqwest::Client::new();

    let post = |body: Value| {
        let request = http.post(&url).json(&body);
        async move {
            request
                .send()
                .await
                .unwrap()
                .json::<Value>()
                .await
                .unwrap()
        }
    };

    let reply = post(json!({
        "_tag": "Increment",
        "op": "Ask",
        "path": path,
        "request": {"_tag": "Increment"},
    }))
    .await;
    assert_eq!(reply, json!({"response": 42}));

    let reply = post(json!({
        "_tag": "Reject",
        "op": "Ask",
        "path": path,
        "request": {"_tag": "Reject"},
    }))
    .await;
    assert_eq!(reply, json!({"error": {"Handler": "rejected"}}));

    let reply = post(json!({
        "_tag": "Increment",
        "op": "Tell",
        "path": path,
        "request": {"_tag": "Increment"},
    }))
    .await;
    assert_eq!(reply, json!({}));

    let reply = post(json!({
        "_tag": "Get",
        "op": "Ask",
        "path": path,
        "request": {"_tag": "Get"},
    }))
    .await;
    assert_eq!(reply, json!({"response": 43}));

    let reply = post(json!({"op": "Stop", "path": path})).await;
    assert_eq!(reply, json!({"stops": []}));

    let missing = http
        .get(format!("http://127.0.0.1:{}/other", node.port))
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status(), reqwest::StatusCode::NOT_FOUND);

    node.shutdown.send(()).unwrap();
    node.server.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_unreachable_node_is_a_post_failure() {
    // Bind then drop to get a port nothing listens on
    let port = TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port();

    let caller = ActorSystem::builder("sys1")
        .remote_timeout(Duration::from_secs(2))
        .build()
        .unwrap();
    let counter = caller
        .select::<Counter>(&format!("zio://sys2@127.0.0.1:{}/counter", port))
        .unwrap();

    assert!(matches!(
        counter.ask(Counter::Get).await,
        Err(AskError::System(ActorSystemError::PostOperation { .. }))
    ));
    assert!(matches!(
        counter.tell(Counter::Increment).await,
        Err(ActorSystemError::PostOperation { .. })
    ));
    assert_eq!(caller.metrics().snapshot().remote_failures, 2);
}

#[tokio::test]
async fn test_ask_after_remote_stop_reports_missing_actor() {
    let node = serve("sys2");
    node.system
        .make("counter", Supervisor::none(), counting(), 0)
        .await
        .unwrap();

    let caller = ActorSystem::new("sys1", None).unwrap();
    let address = format!("zio://sys2@127.0.0.1:{}/counter", node.port);
    let counter = caller.select::<Counter>(&address).unwrap();

    counter.stop().await.unwrap();
    assert_eq!(
        counter.ask(Counter::Get).await,
        Err(AskError::System(ActorSystemError::no_such_actor(address)))
    );

    node.shutdown.send(()).unwrap();
    node.server.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_silent_node_times_out() {
    // Connections are accepted by the kernel but never answered
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();

    let caller = ActorSystem::builder("sys1")
        .remote_timeout(Duration::from_millis(200))
        .build()
        .unwrap();
    let counter = caller
        .select::<Counter>(&format!("zio://sys2@127.0.0.1:{}/counter", port))
        .unwrap();

    assert_eq!(
        counter.ask(Counter::Get).await,
        Err(AskError::System(ActorSystemError::Timeout))
    );
    drop(listener);
}
