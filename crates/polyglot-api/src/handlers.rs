// polyglot-api/src/handlers.rs
// ============================================================================
// Module: API Handlers
// Description: Route handlers for accounts and translations.
// Purpose: Decode requests, run the gate and service call, audit the result.
// Dependencies: axum, polyglot-core, serde
// ============================================================================

//! ## Overview
//! Each handler follows one shape: capture request metadata, run the gate
//! and the service call on the blocking pool, then render the envelope and
//! emit an `api_request` audit event. Protected routes authenticate before
//! decoding the body so unauthenticated callers learn nothing about payloads.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::body::Bytes;
use axum::extract::ConnectInfo;
use axum::extract::Path;
use axum::extract::Query;
use axum::extract::State;
use axum::extract::rejection::BytesRejection;
use axum::extract::rejection::QueryRejection;
use axum::http::HeaderMap;
use axum::http::StatusCode;
use axum::http::header::AUTHORIZATION;
use axum::response::IntoResponse;
use axum::response::Response;
use polyglot_core::DEFAULT_EXPORT_PAGE_SIZE;
use polyglot_core::EntryId;
use polyglot_core::EntryPatch;
use polyglot_core::NewEntry;
use polyglot_core::UserAccount;
use polyglot_core::ValidationErrors;
use serde::Deserialize;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Map;
use serde_json::Value;

use crate::accounts::LoginRequest;
use crate::accounts::RegisterRequest;
use crate::audit::ApiRequestEvent;
use crate::audit::ApiRequestEventParams;
use crate::auth::RequestContext;
use crate::response::ApiError;
use crate::response::ApiSuccess;
use crate::server::ServerState;
use crate::server::run_blocking;

// ============================================================================
// SECTION: Request Metadata
// ============================================================================

/// Metadata captured when a request arrives.
struct ApiCall {
    /// HTTP method.
    method: &'static str,
    /// Route template.
    route: &'static str,
    /// Gate context including the request id.
    context: RequestContext,
    /// Arrival time.
    started: Instant,
}

impl ApiCall {
    /// Captures metadata and assigns a request id.
    fn begin(
        state: &ServerState,
        method: &'static str,
        route: &'static str,
        peer: SocketAddr,
        headers: &HeaderMap,
    ) -> Self {
        let auth_header =
            headers.get(AUTHORIZATION).and_then(|value| value.to_str().ok()).map(str::to_string);
        let context = RequestContext::http(Some(peer.ip()), auth_header)
            .with_request_id(state.request_ids.issue());
        Self {
            method,
            route,
            context,
            started: Instant::now(),
        }
    }

    /// Renders the outcome and records the request event.
    fn finish(self, state: &ServerState, result: Result<ApiSuccess, ApiError>) -> Response {
        let (status, error_kind, response) = match result {
            Ok(success) => (success.status(), None, success.into_response()),
            Err(err) => (err.status(), Some(err.kind()), err.into_response()),
        };
        let latency_ms = u64::try_from(self.started.elapsed().as_millis()).unwrap_or(u64::MAX);
        state.audit.record_request(&ApiRequestEvent::new(ApiRequestEventParams {
            request_id: self.context.request_id.unwrap_or_default(),
            method: self.method,
            route: self.route,
            status: status.as_u16(),
            error_kind,
            peer_ip: self.context.peer_ip.map(|ip| ip.to_string()),
            latency_ms,
        }));
        response
    }
}

// ============================================================================
// SECTION: Payloads
// ============================================================================

/// `{"user": ..}` payload.
#[derive(Serialize)]
struct UserPayload {
    /// Account.
    user: UserAccount,
}

/// Query for the key and locale lookup.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct FindQuery {
    /// Translation key.
    key: Option<String>,
    /// Locale code.
    locale: Option<String>,
}

/// Query for search.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct SearchQuery {
    /// Free-text query.
    search: Option<String>,
}

/// Query for export paging.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ExportQuery {
    /// Last id of the previous page.
    after: Option<String>,
    /// Page size.
    limit: Option<String>,
}

// ============================================================================
// SECTION: Account Routes
// ============================================================================

/// `POST /api/register-user`.
pub(crate) async fn register_user(
    State(state): State<Arc<ServerState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let call = ApiCall::begin(&state, "POST", "/api/register-user", peer, &headers);
    let body = read_body(&state, body);
    let result = run_blocking(&state, move |state| {
        let request: RegisterRequest = decode_json(body?, REGISTER_FIELDS)?;
        let issued = state.accounts.register(request)?;
        ApiSuccess::created("User registered successfully", &issued)
    })
    .await;
    call.finish(&state, result)
}

/// `POST /api/login`.
pub(crate) async fn login(
    State(state): State<Arc<ServerState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let call = ApiCall::begin(&state, "POST", "/api/login", peer, &headers);
    let body = read_body(&state, body);
    let result = run_blocking(&state, move |state| {
        let request: LoginRequest = decode_json(body?, LOGIN_FIELDS)?;
        let issued = state.accounts.login(request)?;
        ApiSuccess::ok("Login successful", &issued)
    })
    .await;
    call.finish(&state, result)
}

/// `GET /api/get-current-user`.
pub(crate) async fn current_user(
    State(state): State<Arc<ServerState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
) -> Response {
    let call = ApiCall::begin(&state, "GET", "/api/get-current-user", peer, &headers);
    let ctx = call.context.clone();
    let route = call.route;
    let result = run_blocking(&state, move |state| {
        let auth = state.authorize(&ctx, route)?;
        let user_id = auth.user_id().ok_or_else(session_required)?;
        let user = state.accounts.current_user(user_id)?;
        ApiSuccess::ok("Success", &UserPayload {
            user,
        })
    })
    .await;
    call.finish(&state, result)
}

/// `POST /api/logout`.
pub(crate) async fn logout(
    State(state): State<Arc<ServerState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
) -> Response {
    let call = ApiCall::begin(&state, "POST", "/api/logout", peer, &headers);
    let ctx = call.context.clone();
    let route = call.route;
    let result = run_blocking(&state, move |state| {
        let auth = state.authorize(&ctx, route)?;
        let fingerprint = match (auth.user_id(), auth.token_fingerprint) {
            (Some(_), Some(fingerprint)) => fingerprint,
            _ => return Err(session_required()),
        };
        state.accounts.logout(&fingerprint)?;
        ApiSuccess::ok("Successfully logged out", &Map::new())
    })
    .await;
    call.finish(&state, result)
}

// ============================================================================
// SECTION: Translation Routes
// ============================================================================

/// `POST /api/translations`.
pub(crate) async fn create_translation(
    State(state): State<Arc<ServerState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let call = ApiCall::begin(&state, "POST", "/api/translations", peer, &headers);
    let body = read_body(&state, body);
    let ctx = call.context.clone();
    let route = call.route;
    let result = run_blocking(&state, move |state| {
        state.authorize(&ctx, route)?;
        let entry: NewEntry = decode_json(body?, ENTRY_FIELDS)?;
        let created = state.catalog.create(entry)?;
        ApiSuccess::created("Translation created successfully", &created)
    })
    .await;
    call.finish(&state, result)
}

/// `POST /api/translations/{id}`.
pub(crate) async fn update_translation(
    State(state): State<Arc<ServerState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    Path(id): Path<String>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let call = ApiCall::begin(&state, "POST", "/api/translations/{id}", peer, &headers);
    let body = read_body(&state, body);
    let ctx = call.context.clone();
    let route = call.route;
    let result = run_blocking(&state, move |state| {
        state.authorize(&ctx, route)?;
        let id = EntryId::parse(&id).ok_or_else(ApiError::translation_not_found)?;
        let patch: EntryPatch = decode_json(body?, ENTRY_FIELDS)?;
        let updated = state.catalog.update(id, &patch)?;
        ApiSuccess::ok("Translation updated successfully", &updated)
    })
    .await;
    call.finish(&state, result)
}

/// `GET /api/translations?key=&locale=`.
pub(crate) async fn find_translation(
    State(state): State<Arc<ServerState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    query: Result<Query<FindQuery>, QueryRejection>,
) -> Response {
    let call = ApiCall::begin(&state, "GET", "/api/translations", peer, &headers);
    let query = read_query(query);
    let ctx = call.context.clone();
    let route = call.route;
    let result = run_blocking(&state, move |state| {
        state.authorize(&ctx, route)?;
        let query = query?;
        let key = query.key.unwrap_or_default();
        let locale = query.locale.unwrap_or_default();
        let mut errors = ValidationErrors::new();
        if key.is_empty() {
            errors.add("key", "The key field is required.");
        }
        if locale.is_empty() {
            errors.add("locale", "The locale field is required.");
        }
        errors.into_result().map_err(ApiError::Validation)?;
        let entry = state
            .catalog
            .find_by_key_and_locale(&key, &locale)?
            .ok_or_else(ApiError::translation_not_found)?;
        ApiSuccess::ok("Success", &entry)
    })
    .await;
    call.finish(&state, result)
}

/// `GET /api/translations/search?search=`.
pub(crate) async fn search_translations(
    State(state): State<Arc<ServerState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    query: Result<Query<SearchQuery>, QueryRejection>,
) -> Response {
    let call = ApiCall::begin(&state, "GET", "/api/translations/search", peer, &headers);
    let query = read_query(query);
    let ctx = call.context.clone();
    let route = call.route;
    let result = run_blocking(&state, move |state| {
        state.authorize(&ctx, route)?;
        let text = query?.search.unwrap_or_default();
        let hits = state.search.search(&text)?;
        ApiSuccess::ok("Success", &hits)
    })
    .await;
    call.finish(&state, result)
}

/// `GET /api/translations/export?after=&limit=`.
pub(crate) async fn export_translations(
    State(state): State<Arc<ServerState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    query: Result<Query<ExportQuery>, QueryRejection>,
) -> Response {
    let call = ApiCall::begin(&state, "GET", "/api/translations/export", peer, &headers);
    let query = read_query(query);
    let ctx = call.context.clone();
    let route = call.route;
    let result = run_blocking(&state, move |state| {
        state.authorize(&ctx, route)?;
        let (after, limit) = parse_export_query(query?)?;
        let page = state.catalog.export_page(after, limit)?;
        ApiSuccess::ok("Success", &page)
    })
    .await;
    call.finish(&state, result)
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Error for routes that need a login session rather than any principal.
fn session_required() -> ApiError {
    ApiError::Unauthenticated("session token required".to_string())
}

/// Resolves the body extractor and enforces the body limit.
fn read_body(state: &ServerState, body: Result<Bytes, BytesRejection>) -> Result<Bytes, ApiError> {
    let bytes = body.map_err(|rejection| {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::PayloadTooLarge
        } else {
            ApiError::BadRequest("unreadable request body".to_string())
        }
    })?;
    if bytes.len() > state.max_body_bytes {
        return Err(ApiError::PayloadTooLarge);
    }
    Ok(bytes)
}

/// Resolves the query extractor.
fn read_query<T>(query: Result<Query<T>, QueryRejection>) -> Result<T, ApiError> {
    query
        .map(|Query(value)| value)
        .map_err(|_| ApiError::BadRequest("malformed query string".to_string()))
}

/// Expected JSON type of a body field.
#[derive(Debug, Clone, Copy)]
enum FieldShape {
    /// A string; `null` counts as absent.
    Text,
    /// An array of strings; `null` counts as an empty array.
    TextList,
}

/// Field shapes of a translation create or update body.
const ENTRY_FIELDS: &[(&str, FieldShape)] = &[
    ("key", FieldShape::Text),
    ("locale", FieldShape::Text),
    ("content", FieldShape::Text),
    ("tags", FieldShape::TextList),
];
/// Field shapes of a registration body.
const REGISTER_FIELDS: &[(&str, FieldShape)] =
    &[("name", FieldShape::Text), ("email", FieldShape::Text), ("password", FieldShape::Text)];
/// Field shapes of a login body.
const LOGIN_FIELDS: &[(&str, FieldShape)] =
    &[("email", FieldShape::Text), ("password", FieldShape::Text)];

/// Decodes a JSON object body; an empty body decodes as `{}`.
///
/// Fields of the wrong JSON type are reported per field as validation
/// errors. Only unparseable bodies and non-object bodies are bad requests.
fn decode_json<T: DeserializeOwned>(
    bytes: Bytes,
    fields: &[(&str, FieldShape)],
) -> Result<T, ApiError> {
    let raw: &[u8] = if bytes.iter().all(u8::is_ascii_whitespace) { b"{}" } else { &bytes };
    let value: Value = serde_json::from_slice(raw)
        .map_err(|_| ApiError::BadRequest("malformed request body".to_string()))?;
    let Value::Object(mut object) = value else {
        return Err(ApiError::BadRequest("request body must be a JSON object".to_string()));
    };
    let mut errors = ValidationErrors::new();
    for (field, shape) in fields {
        match object.get(*field) {
            None => {}
            Some(Value::Null) => {
                if matches!(shape, FieldShape::Text) {
                    object.remove(*field);
                }
            }
            Some(value) => check_shape(&mut errors, field, *shape, value),
        }
    }
    errors.into_result().map_err(ApiError::Validation)?;
    serde_json::from_value(Value::Object(object))
        .map_err(|_| ApiError::BadRequest("malformed request body".to_string()))
}

/// Records a validation error when `value` does not have the expected shape.
fn check_shape(errors: &mut ValidationErrors, field: &str, shape: FieldShape, value: &Value) {
    match (shape, value) {
        (FieldShape::Text, Value::String(_)) => {}
        (FieldShape::Text, _) => errors.add(field, format!("The {field} field must be a string.")),
        (FieldShape::TextList, Value::Array(items)) => {
            for (index, item) in items.iter().enumerate() {
                if !item.is_string() {
                    let path = format!("{field}.{index}");
                    errors.add(&path, format!("The {path} field must be a string."));
                }
            }
        }
        (FieldShape::TextList, _) => {
            errors.add(field, format!("The {field} field must be an array."));
        }
    }
}

/// Parses export paging parameters.
fn parse_export_query(query: ExportQuery) -> Result<(Option<EntryId>, usize), ApiError> {
    let mut errors = ValidationErrors::new();
    let after = match query.after.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => {
            let parsed = EntryId::parse(raw);
            if parsed.is_none() {
                errors.add("after", "The after must be a positive integer.");
            }
            parsed
        }
    };
    let limit = match query.limit.as_deref().map(str::trim) {
        None | Some("") => DEFAULT_EXPORT_PAGE_SIZE,
        Some(raw) => raw.parse::<usize>().unwrap_or_else(|_| {
            errors.add("limit", "The limit must be an integer.");
            DEFAULT_EXPORT_PAGE_SIZE
        }),
    };
    errors.into_result().map_err(ApiError::Validation)?;
    Ok((after, limit))
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

    use super::*;

    fn export(after: Option<&str>, limit: Option<&str>) -> Result<(Option<EntryId>, usize), ApiError> {
        parse_export_query(ExportQuery {
            after: after.map(str::to_string),
            limit: limit.map(str::to_string),
        })
    }

    #[test]
    fn export_query_defaults() {
        let (after, limit) = export(None, None).unwrap();
        assert_eq!(after, None);
        assert_eq!(limit, DEFAULT_EXPORT_PAGE_SIZE);
        let (after, limit) = export(Some("12"), Some("3")).unwrap();
        assert_eq!(after, EntryId::from_raw(12));
        assert_eq!(limit, 3);
    }

    #[test]
    fn export_query_reports_both_bad_fields() {
        let Err(ApiError::Validation(errors)) = export(Some("0"), Some("ten")) else {
            panic!("expected validation error");
        };
        assert!(errors.has_field("after"));
        assert!(errors.has_field("limit"));
    }

    #[test]
    fn empty_body_decodes_as_empty_object() {
        let patch: EntryPatch = decode_json(Bytes::from_static(b"  "), ENTRY_FIELDS).unwrap();
        assert!(patch.is_empty());
        let result: Result<EntryPatch, ApiError> =
            decode_json(Bytes::from_static(b"{nope"), ENTRY_FIELDS);
        assert!(matches!(result, Err(ApiError::BadRequest(_))));
        let result: Result<EntryPatch, ApiError> =
            decode_json(Bytes::from_static(b"[1, 2]"), ENTRY_FIELDS);
        assert!(matches!(result, Err(ApiError::BadRequest(_))));
    }

    #[test]
    fn missing_entry_fields_surface_as_validation() {
        let entry: NewEntry =
            decode_json(Bytes::from_static(br#"{"locale":"en"}"#), ENTRY_FIELDS).unwrap();
        assert!(entry.key.is_empty());
        assert!(entry.tags.is_empty());
    }

    #[test]
    fn mistyped_entry_fields_are_validation_errors() {
        let body = br#"{"key":123,"locale":"en","content":"x","tags":"mobile"}"#;
        let result: Result<NewEntry, ApiError> =
            decode_json(Bytes::from_static(body), ENTRY_FIELDS);
        let Err(ApiError::Validation(errors)) = result else {
            panic!("expected validation error");
        };
        assert_eq!(errors.messages("key"), ["The key field must be a string."]);
        assert_eq!(errors.messages("tags"), ["The tags field must be an array."]);
        assert!(!errors.has_field("locale"));
    }

    #[test]
    fn non_string_tag_elements_are_cited_by_index() {
        let body = br#"{"tags":["web",7,null]}"#;
        let result: Result<EntryPatch, ApiError> =
            decode_json(Bytes::from_static(body), ENTRY_FIELDS);
        let Err(ApiError::Validation(errors)) = result else {
            panic!("expected validation error");
        };
        assert!(!errors.has_field("tags.0"));
        assert!(errors.has_field("tags.1"));
        assert!(errors.has_field("tags.2"));
    }

    #[test]
    fn null_text_is_absent_and_null_tags_clear() {
        let entry: NewEntry = decode_json(
            Bytes::from_static(br#"{"key":null,"locale":"en","content":"x","tags":null}"#),
            ENTRY_FIELDS,
        )
        .unwrap();
        assert!(entry.key.is_empty());
        assert!(entry.tags.is_empty());
        let patch: EntryPatch =
            decode_json(Bytes::from_static(br#"{"content":null,"tags":null}"#), ENTRY_FIELDS)
                .unwrap();
        assert_eq!(patch.content, None);
        assert_eq!(patch.tags, Some(Vec::new()));
        let patch: EntryPatch = decode_json(Bytes::from_static(b"{}"), ENTRY_FIELDS).unwrap();
        assert_eq!(patch.tags, None);
    }

    #[test]
    fn mistyped_login_fields_are_validation_errors() {
        let result: Result<LoginRequest, ApiError> =
            decode_json(Bytes::from_static(br#"{"email":["a@b.c"],"password":"x"}"#), LOGIN_FIELDS);
        let Err(ApiError::Validation(errors)) = result else {
            panic!("expected validation error");
        };
        assert!(errors.has_field("email"));
    }
}
