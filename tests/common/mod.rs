//! Shared utilities for integration tests.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::Request;
use axum::http::{header, StatusCode};
use axum::Router;
use tokio::net::TcpListener;

use api_gateway::config::{GatewayConfig, RouteConfig};
use api_gateway::forward::build_client;
use api_gateway::{GatewayServer, Shutdown};

/// One request as seen by a mock downstream service.
#[derive(Debug, Clone, PartialEq)]
pub struct Recorded {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub content_type: Option<String>,
    pub request_id: Option<String>,
    pub body: String,
}

#[allow(dead_code)]
impl Recorded {
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.body).unwrap()
    }
}

/// A running mock downstream service and what it has observed.
#[derive(Clone)]
pub struct MockDownstream {
    pub addr: SocketAddr,
    calls: Arc<Mutex<Vec<Recorded>>>,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
    completed: Arc<AtomicUsize>,
}

#[allow(dead_code)]
impl MockDownstream {
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn calls(&self) -> Vec<Recorded> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Highest number of requests handled at the same time.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// Requests that have been answered.
    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }
}

/// Start a programmable downstream that answers every path and method.
///
/// `respond` receives the recorded request and returns `(status, body)`;
/// responses are sent as `application/json`.
pub async fn start_downstream<F, Fut>(respond: F) -> MockDownstream
where
    F: Fn(Recorded) -> Fut + Clone + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let mock = MockDownstream {
        addr: listener.local_addr().unwrap(),
        calls: Arc::default(),
        in_flight: Arc::default(),
        max_in_flight: Arc::default(),
        completed: Arc::default(),
    };

    let state = mock.clone();
    let app = Router::new().fallback(move |request: Request| {
        let state = state.clone();
        let respond = respond.clone();
        async move {
            let (parts, body) = request.into_parts();
            let body = axum::body::to_bytes(body, usize::MAX).await.unwrap();
            let header_text = |name: &str| {
                parts
                    .headers
                    .get(name)
                    .and_then(|v| v.to_str().ok())
                    .map(String::from)
            };
            let recorded = Recorded {
                method: parts.method.to_string(),
                path: parts.uri.path().to_string(),
                query: parts.uri.query().map(String::from),
                content_type: header_text("content-type"),
                request_id: header_text("x-request-id"),
                body: String::from_utf8_lossy(&body).into_owned(),
            };
            state.calls.lock().unwrap().push(recorded.clone());

            let now = state.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            state.max_in_flight.fetch_max(now, Ordering::SeqCst);

            let (status, reply) = respond(recorded).await;

            state.in_flight.fetch_sub(1, Ordering::SeqCst);
            state.completed.fetch_add(1, Ordering::SeqCst);

            (
                StatusCode::from_u16(status).unwrap(),
                [(header::CONTENT_TYPE, "application/json")],
                reply,
            )
        }
    });

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    mock
}

/// An address nothing is listening on.
#[allow(dead_code)]
pub async fn refused_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

/// Reference route table pointed at the given downstream addresses, fan-out off.
#[allow(dead_code)]
pub fn gateway_config(analyze: SocketAddr, ask: SocketAddr) -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.listener.bind_address = "127.0.0.1:0".to_string();
    config.routes = vec![
        RouteConfig::new("analyze", "/analyze/", format!("http://{}", analyze), "url"),
        RouteConfig::new("ask", "/ask/", format!("http://{}", ask), "question")
            .with_param_label("user-input"),
    ];
    config.fanout.enabled = false;
    config
}

/// Serve `config` on an ephemeral port.
#[allow(dead_code)]
pub async fn start_gateway(config: GatewayConfig) -> (SocketAddr, Shutdown) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    let client = build_client(&config.timeouts);
    let server = GatewayServer::new(config, client);

    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    (addr, shutdown)
}

#[allow(dead_code)]
pub fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
