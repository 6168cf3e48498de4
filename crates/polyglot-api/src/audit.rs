// polyglot-api/src/audit.rs
// ============================================================================
// Module: API Audit Logging
// Description: Structured audit events for HTTP request handling.
// Purpose: Emit JSON-lines request and auth records without a global logger.
// Dependencies: rand, serde, serde_json
// ============================================================================

//! ## Overview
//! Every request produces one `api_request` event and every gate decision one
//! `api_authz` event. Sinks write JSON lines to stderr or an append-only file;
//! deployments route those lines to their own pipeline.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

use rand::RngCore;
use rand::rngs::OsRng;
use serde::Serialize;

use crate::auth::AuthzAuditEvent;
use crate::auth::now_ms;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Per-request audit payload.
#[derive(Debug, Clone, Serialize)]
pub struct ApiRequestEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Server-issued request identifier.
    pub request_id: String,
    /// HTTP method.
    pub method: &'static str,
    /// Route template.
    pub route: &'static str,
    /// Response status code.
    pub status: u16,
    /// `ok` or `error`.
    pub outcome: &'static str,
    /// Error kind label on failure.
    pub error_kind: Option<&'static str>,
    /// Caller IP address when available.
    pub peer_ip: Option<String>,
    /// Handler latency in milliseconds.
    pub latency_ms: u64,
}

/// Inputs required to construct a request audit event.
pub struct ApiRequestEventParams {
    /// Server-issued request identifier.
    pub request_id: String,
    /// HTTP method.
    pub method: &'static str,
    /// Route template.
    pub route: &'static str,
    /// Response status code.
    pub status: u16,
    /// Error kind label on failure.
    pub error_kind: Option<&'static str>,
    /// Caller IP address when available.
    pub peer_ip: Option<String>,
    /// Handler latency in milliseconds.
    pub latency_ms: u64,
}

impl ApiRequestEvent {
    /// Creates a new request event stamped with the current time.
    #[must_use]
    pub fn new(params: ApiRequestEventParams) -> Self {
        Self {
            event: "api_request",
            timestamp_ms: now_ms(),
            request_id: params.request_id,
            method: params.method,
            route: params.route,
            status: params.status,
            outcome: if params.error_kind.is_some() { "error" } else { "ok" },
            error_kind: params.error_kind,
            peer_ip: params.peer_ip,
            latency_ms: params.latency_ms,
        }
    }
}

// ============================================================================
// SECTION: Trait
// ============================================================================

/// Audit sink for API events.
pub trait AuditSink: Send + Sync {
    /// Record a request event.
    fn record_request(&self, event: &ApiRequestEvent);

    /// Record an auth decision event.
    fn record_authz(&self, event: &AuthzAuditEvent);
}

// ============================================================================
// SECTION: Sinks
// ============================================================================

/// Audit sink that logs JSON lines to stderr.
pub struct StderrAuditSink;

impl StderrAuditSink {
    /// Writes one serialized event line.
    fn emit(payload: &impl Serialize) {
        if let Ok(line) = serde_json::to_string(payload) {
            let _ = writeln!(io::stderr(), "{line}");
        }
    }
}

impl AuditSink for StderrAuditSink {
    fn record_request(&self, event: &ApiRequestEvent) {
        Self::emit(event);
    }

    fn record_authz(&self, event: &AuthzAuditEvent) {
        Self::emit(event);
    }
}

/// Audit sink that logs JSON lines to a file.
pub struct FileAuditSink {
    /// File handle used for append-only logging.
    file: Mutex<std::fs::File>,
}

impl FileAuditSink {
    /// Opens the audit log file in append mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub fn new(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }

    /// Appends one serialized event line.
    fn emit(&self, payload: &impl Serialize) {
        if let Ok(line) = serde_json::to_string(payload)
            && let Ok(mut file) = self.file.lock()
        {
            let _ = writeln!(file, "{line}");
            let _ = file.flush();
        }
    }
}

impl AuditSink for FileAuditSink {
    fn record_request(&self, event: &ApiRequestEvent) {
        self.emit(event);
    }

    fn record_authz(&self, event: &AuthzAuditEvent) {
        self.emit(event);
    }
}

/// No-op audit sink.
pub struct NoopAuditSink;

impl AuditSink for NoopAuditSink {
    fn record_request(&self, _event: &ApiRequestEvent) {}

    fn record_authz(&self, _event: &AuthzAuditEvent) {}
}

// ============================================================================
// SECTION: Request Ids
// ============================================================================

/// Boot-scoped request identifier generator.
///
/// # Invariants
/// - Issued identifiers are unique within the process lifetime.
#[derive(Debug)]
pub struct RequestIdGenerator {
    /// Random identifier for this process.
    boot_id: u64,
    /// Monotonic counter for identifiers issued in this process.
    counter: AtomicU64,
}

impl RequestIdGenerator {
    /// Creates a generator with a fresh boot identifier.
    #[must_use]
    pub fn new() -> Self {
        let mut bytes = [0u8; 8];
        OsRng.fill_bytes(&mut bytes);
        Self {
            boot_id: u64::from_be_bytes(bytes),
            counter: AtomicU64::new(1),
        }
    }

    /// Issues the next request identifier.
    #[must_use]
    pub fn issue(&self) -> String {
        let seq = self.counter.fetch_add(1, Ordering::Relaxed);
        format!("req-{:016x}-{seq:016x}", self.boot_id)
    }
}

impl Default for RequestIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
