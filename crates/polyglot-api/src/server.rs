// polyglot-api/src/server.rs
// ============================================================================
// Module: API Server
// Description: HTTP server wiring for the translation catalog.
// Purpose: Build stores and services from config and serve the JSON API.
// Dependencies: axum, tokio, polyglot-config, polyglot-core, polyglot-store-sqlite
// ============================================================================

//! ## Overview
//! The server builds the configured stores, wraps them in the catalog,
//! search, and account services, and serves the `/api` routes over HTTP.
//! Store work runs on the blocking pool under the configured request
//! deadline; a call that misses it is abandoned and reported as unavailable.
//! Security posture: inputs are untrusted and must be validated.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::get;
use axum::routing::post;
use polyglot_config::PolyglotConfig;
use polyglot_config::ServerAuditConfig;
use polyglot_config::ServerAuthMode;
use polyglot_config::ServerConfig;
use polyglot_config::StoreConfig;
use polyglot_config::StoreType;
use polyglot_core::InMemoryAccountStore;
use polyglot_core::InMemoryTranslationStore;
use polyglot_core::SearchEngine;
use polyglot_core::SharedAccountStore;
use polyglot_core::SharedTranslationStore;
use polyglot_core::TranslationCatalog;
use polyglot_store_sqlite::SqliteCatalogStore;
use tokio::net::TcpListener;

use crate::accounts::AccountService;
use crate::audit::AuditSink;
use crate::audit::FileAuditSink;
use crate::audit::NoopAuditSink;
use crate::audit::RequestIdGenerator;
use crate::audit::StderrAuditSink;
use crate::auth::AuthContext;
use crate::auth::AuthzAuditEvent;
use crate::auth::DefaultRequestAuthz;
use crate::auth::RequestAuthz;
use crate::auth::RequestContext;
use crate::handlers;
use crate::response::ApiError;

// ============================================================================
// SECTION: API Server
// ============================================================================

/// Catalog HTTP server instance.
pub struct ApiServer {
    /// Server configuration.
    config: PolyglotConfig,
    /// Shared handler state.
    state: Arc<ServerState>,
}

impl ApiServer {
    /// Builds a server from configuration, opening the configured stores and
    /// audit sink.
    ///
    /// # Errors
    ///
    /// Returns [`ApiServerError`] when validation or initialization fails.
    pub fn from_config(config: PolyglotConfig) -> Result<Self, ApiServerError> {
        config.validate().map_err(|err| ApiServerError::Config(err.to_string()))?;
        let (translations, accounts) = build_stores(&config.store)?;
        let audit = build_audit_sink(&config.server.audit)?;
        Self::from_parts(config, translations, accounts, audit)
    }

    /// Builds a server over caller-supplied stores and audit sink.
    ///
    /// # Errors
    ///
    /// Returns [`ApiServerError::Config`] when the configuration is invalid.
    pub fn from_parts(
        config: PolyglotConfig,
        translations: SharedTranslationStore,
        accounts: SharedAccountStore,
        audit: Arc<dyn AuditSink>,
    ) -> Result<Self, ApiServerError> {
        config.validate().map_err(|err| ApiServerError::Config(err.to_string()))?;
        let authz = Arc::new(DefaultRequestAuthz::from_config(
            &config.server.auth,
            accounts.clone(),
        ));
        let state = ServerState {
            catalog: TranslationCatalog::new(translations.clone()),
            search: SearchEngine::new(translations, config.search.content_match),
            accounts: AccountService::new(accounts, config.accounts.clone()),
            authz,
            audit,
            request_ids: RequestIdGenerator::new(),
            max_body_bytes: config.server.max_body_bytes,
            request_timeout: config.server.request_timeout(),
        };
        emit_local_only_warning(&config.server);
        Ok(Self {
            config,
            state: Arc::new(state),
        })
    }

    /// Returns the axum router for this server.
    #[must_use]
    pub fn router(&self) -> Router {
        build_router(Arc::clone(&self.state), self.config.server.max_body_bytes)
    }

    /// Binds the configured address and serves until the server fails.
    ///
    /// # Errors
    ///
    /// Returns [`ApiServerError`] when binding or serving fails.
    pub async fn serve(self) -> Result<(), ApiServerError> {
        let addr = self
            .config
            .server
            .bind_addr()
            .map_err(|err| ApiServerError::Config(err.to_string()))?;
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|_| ApiServerError::Transport("http bind failed".to_string()))?;
        self.serve_listener(listener).await
    }

    /// Serves on an already bound listener.
    ///
    /// # Errors
    ///
    /// Returns [`ApiServerError::Transport`] when serving fails.
    pub async fn serve_listener(self, listener: TcpListener) -> Result<(), ApiServerError> {
        let app = self.router();
        axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
            .await
            .map_err(|_| ApiServerError::Transport("http server failed".to_string()))
    }
}

/// Builds the translation and account stores from store configuration.
///
/// The sqlite backend shares one database file and connection between both.
///
/// # Errors
///
/// Returns [`ApiServerError`] when the store cannot be opened.
pub fn build_stores(
    config: &StoreConfig,
) -> Result<(SharedTranslationStore, SharedAccountStore), ApiServerError> {
    match config.store_type {
        StoreType::Memory => Ok((
            SharedTranslationStore::from_store(InMemoryTranslationStore::new()),
            SharedAccountStore::from_store(InMemoryAccountStore::new()),
        )),
        StoreType::Sqlite => {
            let sqlite = config.sqlite_config().ok_or_else(|| {
                ApiServerError::Config("sqlite store requires path".to_string())
            })?;
            let store = SqliteCatalogStore::new(&sqlite)
                .map_err(|err| ApiServerError::Init(err.to_string()))?;
            Ok((
                SharedTranslationStore::from_store(store.clone()),
                SharedAccountStore::from_store(store),
            ))
        }
    }
}

/// Builds the audit sink from audit configuration.
fn build_audit_sink(config: &ServerAuditConfig) -> Result<Arc<dyn AuditSink>, ApiServerError> {
    if !config.enabled {
        return Ok(Arc::new(NoopAuditSink));
    }
    match &config.path {
        Some(path) => {
            let sink = FileAuditSink::new(Path::new(path))
                .map_err(|err| ApiServerError::Init(format!("audit log open failed: {err}")))?;
            Ok(Arc::new(sink))
        }
        None => Ok(Arc::new(StderrAuditSink)),
    }
}

/// Registers the `/api` routes.
fn build_router(state: Arc<ServerState>, max_body_bytes: usize) -> Router {
    Router::new()
        .route("/api/register-user", post(handlers::register_user))
        .route("/api/login", post(handlers::login))
        .route("/api/get-current-user", get(handlers::current_user))
        .route("/api/logout", post(handlers::logout))
        .route(
            "/api/translations",
            post(handlers::create_translation).get(handlers::find_translation),
        )
        .route("/api/translations/search", get(handlers::search_translations))
        .route("/api/translations/export", get(handlers::export_translations))
        .route("/api/translations/{id}", post(handlers::update_translation))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .with_state(state)
}

/// Warns when the server relies on loopback trust alone.
fn emit_local_only_warning(server: &ServerConfig) {
    if server.auth.mode == ServerAuthMode::LocalOnly {
        let _ = writeln!(
            std::io::stderr(),
            "polyglot-api: WARNING: server running in local-only mode; configure server.auth to \
             enable bearer_token"
        );
    }
}

// ============================================================================
// SECTION: Server State
// ============================================================================

/// Shared state for route handlers.
pub(crate) struct ServerState {
    /// Translation lifecycle service.
    pub(crate) catalog: TranslationCatalog<SharedTranslationStore>,
    /// Search engine.
    pub(crate) search: SearchEngine<SharedTranslationStore>,
    /// Account and session service.
    pub(crate) accounts: AccountService,
    /// Request gate.
    pub(crate) authz: Arc<dyn RequestAuthz>,
    /// Audit sink.
    pub(crate) audit: Arc<dyn AuditSink>,
    /// Request identifier source.
    pub(crate) request_ids: RequestIdGenerator,
    /// Maximum allowed request body size.
    pub(crate) max_body_bytes: usize,
    /// Deadline for one request's store work.
    pub(crate) request_timeout: Duration,
}

impl ServerState {
    /// Runs the gate and records the decision.
    pub(crate) fn authorize(
        &self,
        ctx: &RequestContext,
        route: &'static str,
    ) -> Result<AuthContext, ApiError> {
        match self.authz.authorize(ctx) {
            Ok(auth) => {
                self.audit.record_authz(&AuthzAuditEvent::allowed(ctx, route, &auth));
                Ok(auth)
            }
            Err(err) => {
                self.audit.record_authz(&AuthzAuditEvent::denied(ctx, route, &err));
                Err(err.into())
            }
        }
    }
}

/// Runs store work on the blocking pool under the request deadline.
pub(crate) async fn run_blocking<T, F>(state: &Arc<ServerState>, work: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&ServerState) -> Result<T, ApiError> + Send + 'static,
{
    let shared = Arc::clone(state);
    let task = tokio::task::spawn_blocking(move || work(&shared));
    match tokio::time::timeout(state.request_timeout, task).await {
        Ok(Ok(result)) => result,
        Ok(Err(_)) => Err(ApiError::Internal("request worker failed".to_string())),
        Err(_) => Err(ApiError::Unavailable("request deadline exceeded".to_string())),
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// API server errors.
#[derive(Debug, thiserror::Error)]
pub enum ApiServerError {
    /// Configuration errors.
    #[error("config error: {0}")]
    Config(String),
    /// Initialization errors.
    #[error("init error: {0}")]
    Init(String),
    /// Transport errors.
    #[error("transport error: {0}")]
    Transport(String),
}
