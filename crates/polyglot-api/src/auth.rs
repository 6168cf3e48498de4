// polyglot-api/src/auth.rs
// ============================================================================
// Module: API Authn
// Description: Authentication gate for catalog and account routes.
// Purpose: Provide a strict, fail-closed gate in front of every store call.
// Dependencies: polyglot-config, polyglot-core, serde
// ============================================================================

//! ## Overview
//! This module defines the request gate for protected routes and the default
//! policy for local-only and bearer-token deployments. A caller is identified
//! as the loopback operator, a static service token, or a login session.
//! Decisions are fail-closed and each one yields an audit event carrying the
//! token fingerprint, never the token.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::net::IpAddr;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use polyglot_config::ServerAuthConfig;
use polyglot_config::ServerAuthMode;
use polyglot_core::AccountStore;
use polyglot_core::SharedAccountStore;
use polyglot_core::Timestamp;
use polyglot_core::UserId;
use polyglot_core::hash_bytes;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Largest accepted `Authorization` header.
const MAX_AUTH_HEADER_BYTES: usize = 8 * 1024;

// ============================================================================
// SECTION: Request Context
// ============================================================================

/// Per-request context used for auth decisions.
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Peer IP address when available.
    pub peer_ip: Option<IpAddr>,
    /// Authorization header value.
    pub auth_header: Option<String>,
    /// Server-issued request identifier for auditing.
    pub request_id: Option<String>,
}

impl RequestContext {
    /// Builds an HTTP request context.
    #[must_use]
    pub const fn http(peer_ip: Option<IpAddr>, auth_header: Option<String>) -> Self {
        Self {
            peer_ip,
            auth_header,
            request_id: None,
        }
    }

    /// Returns a copy with the request identifier set.
    #[must_use]
    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    /// Returns true when the peer IP is loopback.
    #[must_use]
    pub fn peer_is_loopback(&self) -> bool {
        self.peer_ip.is_some_and(|ip| ip.is_loopback())
    }
}

// ============================================================================
// SECTION: Auth Context
// ============================================================================

/// Who the caller turned out to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Principal {
    /// Loopback caller in local-only mode.
    Local,
    /// Holder of a configured static service token.
    ServiceToken,
    /// Holder of a live login session.
    User(UserId),
}

/// Authenticated caller context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthContext {
    /// Resolved principal.
    pub principal: Principal,
    /// SHA-256 fingerprint of the presented token, if any.
    pub token_fingerprint: Option<String>,
}

impl AuthContext {
    /// Returns the user behind a session principal.
    #[must_use]
    pub const fn user_id(&self) -> Option<UserId> {
        match self.principal {
            Principal::User(id) => Some(id),
            Principal::Local | Principal::ServiceToken => None,
        }
    }

    /// Stable method label for audit events.
    const fn method_label(&self) -> &'static str {
        match self.principal {
            Principal::Local => "local",
            Principal::ServiceToken => "service_token",
            Principal::User(_) => "session",
        }
    }

    /// Subject label for audit events.
    fn subject(&self) -> String {
        match self.principal {
            Principal::Local => "loopback".to_string(),
            Principal::ServiceToken => "service".to_string(),
            Principal::User(id) => format!("user:{id}"),
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Authentication failures.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Missing or invalid authentication.
    #[error("unauthenticated: {0}")]
    Unauthenticated(String),
    /// The session store could not be consulted.
    #[error("auth unavailable: {0}")]
    Unavailable(String),
}

// ============================================================================
// SECTION: Traits
// ============================================================================

/// Request gate consulted before protected routes touch the store.
pub trait RequestAuthz: Send + Sync {
    /// Authenticates a request. Returns the caller context on success.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError`] when the caller cannot be admitted.
    fn authorize(&self, ctx: &RequestContext) -> Result<AuthContext, AuthError>;
}

// ============================================================================
// SECTION: Default Policy
// ============================================================================

/// Default gate derived from server auth configuration.
pub struct DefaultRequestAuthz {
    /// Configured auth mode.
    mode: ServerAuthMode,
    /// Accepted static service tokens.
    bearer_tokens: BTreeSet<String>,
    /// Session lookup.
    sessions: SharedAccountStore,
}

impl DefaultRequestAuthz {
    /// Builds the gate from server auth configuration.
    #[must_use]
    pub fn from_config(config: &ServerAuthConfig, sessions: SharedAccountStore) -> Self {
        Self {
            mode: config.mode,
            bearer_tokens: config.bearer_tokens.iter().cloned().collect(),
            sessions,
        }
    }

    /// Returns the configured auth mode.
    #[must_use]
    pub const fn mode(&self) -> ServerAuthMode {
        self.mode
    }

    /// Resolves a token against live sessions.
    fn session_auth(&self, token: &str) -> Result<Option<AuthContext>, AuthError> {
        let fingerprint = token_fingerprint(token);
        let session = self
            .sessions
            .find_session(&fingerprint, Timestamp::now())
            .map_err(|err| AuthError::Unavailable(err.to_string()))?;
        Ok(session.map(|session| AuthContext {
            principal: Principal::User(session.user_id),
            token_fingerprint: Some(fingerprint),
        }))
    }
}

impl RequestAuthz for DefaultRequestAuthz {
    fn authorize(&self, ctx: &RequestContext) -> Result<AuthContext, AuthError> {
        match self.mode {
            ServerAuthMode::LocalOnly => {
                if !ctx.peer_is_loopback() {
                    return Err(AuthError::Unauthenticated(
                        "local-only mode requires loopback access".to_string(),
                    ));
                }
                if let Ok(token) = parse_bearer_token(ctx.auth_header.as_deref())
                    && let Some(auth) = self.session_auth(&token)?
                {
                    return Ok(auth);
                }
                Ok(AuthContext {
                    principal: Principal::Local,
                    token_fingerprint: None,
                })
            }
            ServerAuthMode::BearerToken => {
                let token = parse_bearer_token(ctx.auth_header.as_deref())?;
                if self.bearer_tokens.contains(&token) {
                    return Ok(AuthContext {
                        principal: Principal::ServiceToken,
                        token_fingerprint: Some(token_fingerprint(&token)),
                    });
                }
                self.session_auth(&token)?
                    .ok_or_else(|| AuthError::Unauthenticated("invalid bearer token".to_string()))
            }
        }
    }
}

// ============================================================================
// SECTION: Audit Events
// ============================================================================

/// Auth decision audit payload.
#[derive(Debug, Clone, Serialize)]
pub struct AuthzAuditEvent {
    /// Event identifier.
    event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    timestamp_ms: u128,
    /// Decision outcome.
    decision: &'static str,
    /// Route label.
    route: &'static str,
    /// Caller IP address (if available).
    peer_ip: Option<String>,
    /// Auth method label.
    auth_method: Option<&'static str>,
    /// Caller subject label.
    subject: Option<String>,
    /// Token fingerprint (sha256).
    token_fingerprint: Option<String>,
    /// Failure reason (for deny events).
    reason: Option<String>,
    /// Request identifier.
    request_id: Option<String>,
}

impl AuthzAuditEvent {
    /// Builds an allow event.
    #[must_use]
    pub fn allowed(ctx: &RequestContext, route: &'static str, auth: &AuthContext) -> Self {
        Self {
            event: "api_authz",
            timestamp_ms: now_ms(),
            decision: "allow",
            route,
            peer_ip: ctx.peer_ip.map(|ip| ip.to_string()),
            auth_method: Some(auth.method_label()),
            subject: Some(auth.subject()),
            token_fingerprint: auth.token_fingerprint.clone(),
            reason: None,
            request_id: ctx.request_id.clone(),
        }
    }

    /// Builds a deny event. The fingerprint of a presented token is kept so
    /// repeated failures can be correlated.
    #[must_use]
    pub fn denied(ctx: &RequestContext, route: &'static str, error: &AuthError) -> Self {
        let token_fingerprint = parse_bearer_token(ctx.auth_header.as_deref())
            .ok()
            .map(|token| token_fingerprint(&token));
        Self {
            event: "api_authz",
            timestamp_ms: now_ms(),
            decision: "deny",
            route,
            peer_ip: ctx.peer_ip.map(|ip| ip.to_string()),
            auth_method: None,
            subject: None,
            token_fingerprint,
            reason: Some(error.to_string()),
            request_id: ctx.request_id.clone(),
        }
    }

    /// Returns the decision label.
    #[must_use]
    pub const fn decision(&self) -> &'static str {
        self.decision
    }

    /// Returns the recorded token fingerprint.
    #[must_use]
    pub fn token_fingerprint(&self) -> Option<&str> {
        self.token_fingerprint.as_deref()
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Returns the hex SHA-256 fingerprint used to persist and log tokens.
#[must_use]
pub fn token_fingerprint(token: &str) -> String {
    hash_bytes(token.as_bytes()).value
}

/// Extracts the token from a `Bearer` authorization header.
///
/// # Errors
///
/// Returns [`AuthError::Unauthenticated`] when the header is missing,
/// oversized, or not a bearer credential.
pub fn parse_bearer_token(auth_header: Option<&str>) -> Result<String, AuthError> {
    let header = auth_header
        .ok_or_else(|| AuthError::Unauthenticated("missing authorization".to_string()))?;
    if header.len() > MAX_AUTH_HEADER_BYTES {
        return Err(AuthError::Unauthenticated("authorization header too large".to_string()));
    }
    let mut parts = header.trim().splitn(2, ' ');
    let scheme = parts.next().unwrap_or_default();
    let token = parts.next().unwrap_or_default().trim();
    if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() {
        return Err(AuthError::Unauthenticated("invalid authorization header".to_string()));
    }
    Ok(token.to_string())
}

/// Milliseconds since the epoch for audit timestamps.
pub(crate) fn now_ms() -> u128 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis()
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(
        clippy::panic,
        clippy::unwrap_used,
        clippy::expect_used,
        reason = "Test-only assertions."
    )]

    use std::net::Ipv4Addr;

    use polyglot_core::InMemoryAccountStore;
    use polyglot_core::NewUser;
    use polyglot_core::SessionRecord;

    use super::*;

    fn sessions_with(token: &str) -> (SharedAccountStore, UserId) {
        let store = InMemoryAccountStore::new();
        let user = store
            .create_user(NewUser {
                name: "Ada".to_string(),
                email: "ada@example.com".to_string(),
                password_hash: "unused".to_string(),
            })
            .unwrap();
        let now = Timestamp::now();
        store
            .create_session(SessionRecord {
                token_fingerprint: token_fingerprint(token),
                user_id: user.id,
                created_at: now,
                expires_at: now.plus_secs(3_600),
            })
            .unwrap();
        (SharedAccountStore::from_store(store), user.id)
    }

    fn config(mode: ServerAuthMode, tokens: &[&str]) -> ServerAuthConfig {
        ServerAuthConfig {
            mode,
            bearer_tokens: tokens.iter().map(|token| (*token).to_string()).collect(),
        }
    }

    fn loopback(header: Option<&str>) -> RequestContext {
        RequestContext::http(Some(IpAddr::V4(Ipv4Addr::LOCALHOST)), header.map(str::to_string))
    }

    fn remote(header: Option<&str>) -> RequestContext {
        RequestContext::http(
            Some(IpAddr::V4(Ipv4Addr::new(203, 0, 113, 9))),
            header.map(str::to_string),
        )
    }

    #[test]
    fn local_only_admits_loopback_and_rejects_remote() {
        let (sessions, _) = sessions_with("session-token");
        let authz = DefaultRequestAuthz::from_config(&config(ServerAuthMode::LocalOnly, &[]), sessions);
        let auth = authz.authorize(&loopback(None)).unwrap();
        assert_eq!(auth.principal, Principal::Local);
        assert!(authz.authorize(&remote(None)).is_err());
    }

    #[test]
    fn local_only_still_identifies_session_users() {
        let (sessions, user_id) = sessions_with("session-token");
        let authz = DefaultRequestAuthz::from_config(&config(ServerAuthMode::LocalOnly, &[]), sessions);
        let auth = authz.authorize(&loopback(Some("Bearer session-token"))).unwrap();
        assert_eq!(auth.user_id(), Some(user_id));
        let auth = authz.authorize(&loopback(Some("Bearer stale"))).unwrap();
        assert_eq!(auth.principal, Principal::Local);
    }

    #[test]
    fn bearer_mode_accepts_static_and_session_tokens() {
        let (sessions, user_id) = sessions_with("session-token");
        let authz = DefaultRequestAuthz::from_config(
            &config(ServerAuthMode::BearerToken, &["service-token"]),
            sessions,
        );
        let auth = authz.authorize(&remote(Some("Bearer service-token"))).unwrap();
        assert_eq!(auth.principal, Principal::ServiceToken);
        assert_eq!(auth.token_fingerprint, Some(token_fingerprint("service-token")));
        let auth = authz.authorize(&remote(Some("bearer session-token"))).unwrap();
        assert_eq!(auth.user_id(), Some(user_id));
    }

    #[test]
    fn bearer_mode_rejects_missing_and_unknown_tokens() {
        let (sessions, _) = sessions_with("session-token");
        let authz = DefaultRequestAuthz::from_config(
            &config(ServerAuthMode::BearerToken, &["service-token"]),
            sessions,
        );
        assert!(matches!(authz.authorize(&loopback(None)), Err(AuthError::Unauthenticated(_))));
        assert!(authz.authorize(&remote(Some("Bearer nope"))).is_err());
        assert!(authz.authorize(&remote(Some("Basic c2VydmljZS10b2tlbg=="))).is_err());
    }

    #[test]
    fn parse_bearer_token_enforces_header_cap() {
        let header = format!("Bearer {}", "a".repeat(MAX_AUTH_HEADER_BYTES));
        assert!(parse_bearer_token(Some(&header)).is_err());
        assert!(parse_bearer_token(Some("Bearer ")).is_err());
        assert_eq!(parse_bearer_token(Some("  Bearer abc  ")).unwrap(), "abc");
    }

    #[test]
    fn audit_events_carry_fingerprint_not_token() {
        let ctx = remote(Some("Bearer secret-value")).with_request_id("req-1");
        let error = AuthError::Unauthenticated("invalid bearer token".to_string());
        let event = AuthzAuditEvent::denied(&ctx, "GET /api/translations", &error);
        let payload = serde_json::to_string(&event).unwrap();
        assert!(!payload.contains("secret-value"));
        assert_eq!(event.token_fingerprint(), Some(token_fingerprint("secret-value").as_str()));
        assert_eq!(event.decision(), "deny");
    }
}
