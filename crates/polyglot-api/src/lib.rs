// polyglot-api/src/lib.rs
// ============================================================================
// Module: Polyglot API Library
// Description: HTTP surface for the translation catalog.
// Purpose: Expose catalog, search, and account operations over JSON/HTTP.
// Dependencies: polyglot-core, polyglot-config, polyglot-store-sqlite, axum
// ============================================================================

//! ## Overview
//! `polyglot-api` serves the catalog over HTTP. Every catalog route passes
//! through a fail-closed auth gate before the store is touched, and every
//! request and auth decision is emitted as a JSON-lines audit event.
//! Security posture: request bodies, query strings, and headers are untrusted.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod accounts;
pub mod audit;
pub mod auth;
mod handlers;
pub mod response;
pub mod server;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use accounts::AccountError;
pub use accounts::AccountService;
pub use accounts::IssuedSession;
pub use accounts::LoginRequest;
pub use accounts::RegisterRequest;
pub use audit::ApiRequestEvent;
pub use audit::ApiRequestEventParams;
pub use audit::AuditSink;
pub use audit::FileAuditSink;
pub use audit::NoopAuditSink;
pub use audit::RequestIdGenerator;
pub use audit::StderrAuditSink;
pub use auth::AuthContext;
pub use auth::AuthError;
pub use auth::AuthzAuditEvent;
pub use auth::DefaultRequestAuthz;
pub use auth::Principal;
pub use auth::RequestAuthz;
pub use auth::RequestContext;
pub use response::ApiError;
pub use response::ApiSuccess;
pub use server::ApiServer;
pub use server::ApiServerError;
pub use server::build_stores;
