//! HTTP surface tests against a live listener.

mod common;

use std::net::SocketAddr;
use std::sync::Arc;

use reqwest::StatusCode;
use serde_json::{json, Value};
use tokio::net::TcpListener;

use common::Harness;
use lazy_fleet::control::ControlAction;
use lazy_fleet::router::{ClientId, DirectiveKind};
use lazy_fleet::{HttpServer, Shutdown};

const KEY: &str = "test-key";

struct TestServer {
    addr: SocketAddr,
    client: reqwest::Client,
    shutdown: Arc<Shutdown>,
    handle: tokio::task::JoinHandle<std::io::Result<()>>,
}

impl TestServer {
    async fn start(h: &Harness) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let shutdown = Arc::new(Shutdown::new());
        let server = HttpServer::new(h.fleet.clone(), &shutdown);
        let handle = tokio::spawn(server.run(listener));

        Self {
            addr,
            client: reqwest::Client::new(),
            shutdown,
            handle,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.client.get(self.url(path)).bearer_auth(KEY)
    }

    fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.client.post(self.url(path)).bearer_auth(KEY)
    }

    fn put(&self, path: &str) -> reqwest::RequestBuilder {
        self.client.put(self.url(path)).bearer_auth(KEY)
    }

    async fn stop(self) {
        self.shutdown.trigger();
        self.handle.await.unwrap().unwrap();
    }
}

#[tokio::test]
async fn test_requests_without_key_are_rejected() {
    let h = Harness::new();
    let server = TestServer::start(&h).await;

    let res = server.client.get(server.url("/admin/status")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = server
        .client
        .post(server.url("/router/connect"))
        .bearer_auth("wrong")
        .json(&json!({"client": "alice", "target": "survival"}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    server.stop().await;
}

#[tokio::test]
async fn test_status_reports_managed_backends_and_request_id() {
    let h = Harness::new();
    let server = TestServer::start(&h).await;

    let res = server.get("/admin/status").send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.headers().contains_key("x-request-id"));

    let body: Value = res.json().await.unwrap();
    assert_eq!(body["managed_backends"], 2);
    assert_eq!(body["status"], "operational");
    assert_eq!(body["routers_connected"], 1);

    server.stop().await;
}

#[tokio::test]
async fn test_mode_round_trip_and_errors() {
    let h = Harness::new();
    let server = TestServer::start(&h).await;

    let res = server.get("/admin/backends/survival/mode").send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.json::<Value>().await.unwrap()["mode"], "STANDARD");

    let res = server
        .put("/admin/backends/survival/mode")
        .json(&json!({"mode": "soft-force-on"}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let reply: Value = res.json().await.unwrap();
    assert_eq!(reply["ok"], true);
    assert_eq!(reply["message"], "Set survival -> SOFT_FORCE_ON.");

    let res = server.get("/admin/backends/survival/mode").send().await.unwrap();
    assert_eq!(res.json::<Value>().await.unwrap()["mode"], "SOFT_FORCE_ON");

    let res = server
        .put("/admin/backends/survival/mode")
        .json(&json!({"mode": "turbo"}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = server.get("/admin/backends/nether/mode").send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let reply: Value = res.json().await.unwrap();
    assert_eq!(reply["ok"], false);

    server.stop().await;
}

#[tokio::test]
async fn test_start_and_stop_endpoints() {
    let h = Harness::new();
    let server = TestServer::start(&h).await;

    let res = server.post("/admin/backends/survival/start").send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let res = server.post("/admin/backends/survival/stop").send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(
        h.control.calls(),
        vec![
            ("uuid-survival".to_string(), ControlAction::Start),
            ("uuid-survival".to_string(), ControlAction::Stop),
        ]
    );

    h.control.set_behavior(common::ControlBehavior::Unreachable);
    let res = server.post("/admin/backends/survival/start").send().await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_GATEWAY);

    let res = server.post("/admin/backends/nether/stop").send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    server.stop().await;
}

#[tokio::test]
async fn test_connect_hook_returns_gate_decision() {
    let h = Harness::new();
    h.probe.set_online("lobby", true);
    let server = TestServer::start(&h).await;

    let res = server
        .post("/router/connect")
        .json(&json!({"client": "alice", "target": "survival"}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let decision: Value = res.json().await.unwrap();
    assert_eq!(decision["action"], "deny");
    assert_eq!(decision["reason"], "starting");
    assert_eq!(decision["redirect_to"], "lobby");

    let res = server
        .post("/router/connect")
        .json(&json!({"client": "alice", "target": "lobby"}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.json::<Value>().await.unwrap(), json!({"action": "allow"}));

    server.stop().await;
}

#[tokio::test]
async fn test_sessions_and_online_hook() {
    let mut h = Harness::new();
    let server = TestServer::start(&h).await;

    let res = server
        .post("/router/sessions")
        .json(&json!({"client": "bob", "backend": "survival"}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let backends: Value = server.get("/admin/backends").send().await.unwrap().json().await.unwrap();
    let survival = backends
        .as_array()
        .unwrap()
        .iter()
        .find(|b| b["id"] == "survival")
        .unwrap();
    assert_eq!(survival["players"], 1);
    assert_eq!(survival["online"], false);

    h.fleet
        .coordinator
        .enqueue_pending("survival", ClientId::from("alice"))
        .unwrap();
    let res = server.post("/router/backends/survival/online").send().await.unwrap();
    assert_eq!(res.json::<Value>().await.unwrap()["delivered"], 1);
    assert_eq!(
        h.transfers(),
        vec![(ClientId::from("alice"), "survival".to_string())]
    );

    let res = server.post("/router/backends/nether/online").send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = server
        .client
        .delete(server.url("/router/sessions/bob"))
        .bearer_auth(KEY)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
    let res = server
        .client
        .delete(server.url("/router/sessions/bob"))
        .bearer_auth(KEY)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    server.stop().await;
}

#[tokio::test]
async fn test_direct_request_hook_connects_online_backend() {
    let mut h = Harness::new();
    h.probe.set_online("survival", true);
    let server = TestServer::start(&h).await;

    let res = server
        .post("/router/request")
        .json(&json!({"client": "alice", "target": "survival"}))
        .send()
        .await
        .unwrap();
    let outcome: Value = res.json().await.unwrap();
    assert_eq!(outcome, json!({"outcome": "connected", "backend": "survival"}));
    assert!(h.directives().iter().any(|kind| matches!(
        kind,
        DirectiveKind::Transfer { backend, .. } if backend == "survival"
    )));

    server.stop().await;
}
