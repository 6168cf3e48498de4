// polyglot-api/tests/common/mod.rs
// ============================================================================
// Module: API Test Harness
// Description: Spawns the catalog server on an ephemeral loopback port.
// Purpose: Share server setup and HTTP helpers across API suites.
// Dependencies: polyglot-api, reqwest, tokio
// ============================================================================

#![allow(dead_code, reason = "Test helpers are selectively used across suites.")]

use std::sync::Arc;
use std::sync::Mutex;

use polyglot_api::ApiRequestEvent;
use polyglot_api::ApiServer;
use polyglot_api::AuditSink;
use polyglot_api::AuthzAuditEvent;
use polyglot_config::PolyglotConfig;
use polyglot_config::ServerAuthMode;
use polyglot_core::InMemoryAccountStore;
use polyglot_core::InMemoryTranslationStore;
use polyglot_core::SharedAccountStore;
use polyglot_core::SharedTranslationStore;
use reqwest::Client;
use reqwest::RequestBuilder;
use serde_json::Value;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Audit sink that keeps every event as JSON.
#[derive(Default)]
pub struct RecordingAudit {
    /// Recorded events in emission order.
    events: Mutex<Vec<Value>>,
}

impl RecordingAudit {
    /// Returns a snapshot of recorded events.
    pub fn events(&self) -> Vec<Value> {
        self.events.lock().map(|events| events.clone()).unwrap_or_default()
    }

    /// Records one serializable event.
    fn push(&self, event: &impl serde::Serialize) {
        if let (Ok(value), Ok(mut events)) = (serde_json::to_value(event), self.events.lock()) {
            events.push(value);
        }
    }
}

impl AuditSink for RecordingAudit {
    fn record_request(&self, event: &ApiRequestEvent) {
        self.push(event);
    }

    fn record_authz(&self, event: &AuthzAuditEvent) {
        self.push(event);
    }
}

/// Running server plus a client pointed at it.
pub struct TestServer {
    /// `http://127.0.0.1:<port>`.
    pub base_url: String,
    /// Shared HTTP client.
    pub client: Client,
    /// Captured audit events.
    pub audit: Arc<RecordingAudit>,
    /// Server task.
    handle: JoinHandle<()>,
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Status code and decoded JSON body.
pub type Reply = (u16, Value);

impl TestServer {
    /// Sends a JSON POST.
    pub async fn post(&self, path: &str, token: Option<&str>, body: &Value) -> Result<Reply, String> {
        let request = self.client.post(self.url(path)).json(body);
        send(with_token(request, token)).await
    }

    /// Sends a POST with a raw body.
    pub async fn post_raw(&self, path: &str, token: Option<&str>, body: Vec<u8>) -> Result<Reply, String> {
        let request = self
            .client
            .post(self.url(path))
            .header("content-type", "application/json")
            .body(body);
        send(with_token(request, token)).await
    }

    /// Sends a GET.
    pub async fn get(&self, path: &str, token: Option<&str>) -> Result<Reply, String> {
        send(with_token(self.client.get(self.url(path)), token)).await
    }

    /// Joins a path onto the base URL.
    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

/// Attaches a bearer token when given.
fn with_token(request: RequestBuilder, token: Option<&str>) -> RequestBuilder {
    match token {
        Some(token) => request.bearer_auth(token),
        None => request,
    }
}

/// Sends a request and decodes the JSON envelope.
async fn send(request: RequestBuilder) -> Result<Reply, String> {
    let response = request.send().await.map_err(|err| err.to_string())?;
    let status = response.status().as_u16();
    let body = response.json::<Value>().await.map_err(|err| err.to_string())?;
    Ok((status, body))
}

/// Loopback config with a generous deadline for unoptimized test builds.
pub fn base_config() -> PolyglotConfig {
    let mut config = PolyglotConfig::default();
    config.server.bind = Some("127.0.0.1:0".to_string());
    config.server.request_timeout_ms = 60_000;
    config.server.audit.enabled = false;
    config
}

/// Loopback config requiring bearer tokens, with one static token.
pub fn bearer_config(token: &str) -> PolyglotConfig {
    let mut config = base_config();
    config.server.auth.mode = ServerAuthMode::BearerToken;
    config.server.auth.bearer_tokens = vec![token.to_string()];
    config
}

/// Spawns a server over fresh in-memory stores.
pub async fn spawn_server(config: PolyglotConfig) -> Result<TestServer, String> {
    let translations = SharedTranslationStore::from_store(InMemoryTranslationStore::new());
    spawn_with_store(config, translations).await
}

/// Spawns a server over the given translation store.
pub async fn spawn_with_store(
    config: PolyglotConfig,
    translations: SharedTranslationStore,
) -> Result<TestServer, String> {
    let accounts = SharedAccountStore::from_store(InMemoryAccountStore::new());
    let audit = Arc::new(RecordingAudit::default());
    let server = ApiServer::from_parts(config, translations, accounts, audit.clone())
        .map_err(|err| err.to_string())?;
    spawn(server, audit).await
}

/// Spawns a server built from configuration alone.
pub async fn spawn_from_config(config: PolyglotConfig) -> Result<TestServer, String> {
    let server = ApiServer::from_config(config).map_err(|err| err.to_string())?;
    spawn(server, Arc::new(RecordingAudit::default())).await
}

/// Binds an ephemeral port and runs the server in the background.
async fn spawn(server: ApiServer, audit: Arc<RecordingAudit>) -> Result<TestServer, String> {
    let listener = TcpListener::bind("127.0.0.1:0").await.map_err(|err| err.to_string())?;
    let addr = listener.local_addr().map_err(|err| err.to_string())?;
    let handle = tokio::spawn(async move {
        let _ = server.serve_listener(listener).await;
    });
    Ok(TestServer {
        base_url: format!("http://{addr}"),
        client: Client::new(),
        audit,
        handle,
    })
}
