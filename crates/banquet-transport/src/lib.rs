//! HTTP transport abstraction for Banquet.
//!
//! Provides the [`HttpTransport`] trait plus the plain request/response
//! descriptors that travel through it. The session layer above only ever
//! sees these types, which keeps it testable without a network: tests plug
//! in a scripted transport, production plugs in [`ReqwestTransport`].
//!
//! # Feature Flags
//!
//! - `reqwest` (default) — HTTP transport via `reqwest`

#![allow(async_fn_in_trait)]

mod error;
#[cfg(feature = "reqwest")]
mod http_client;

pub use error::TransportError;
#[cfg(feature = "reqwest")]
pub use http_client::{ReqwestTransport, ReqwestTransportBuilder};

use std::fmt;

use bytes::Bytes;
use http::header::{self, HeaderMap, HeaderName, HeaderValue};
use http::{Method, StatusCode};
use serde::{Serialize, de::DeserializeOwned};

/// Opaque identifier for one outbound request, used to correlate log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestId(u64);

impl RequestId {
    /// Creates a new `RequestId` from a raw `u64`.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the underlying `u64` value.
    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "req-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// ApiRequest
// ---------------------------------------------------------------------------

/// An outbound HTTP request descriptor: method, path, headers, body.
///
/// `Clone` matters: the session coordinator may issue the same request a
/// second time after refreshing an expired access token, so the body is held
/// as [`Bytes`] (cheap to clone, reference counted).
///
/// `path` is joined onto the transport's base URL. An absolute
/// `http://`/`https://` URL is used as-is.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub headers: HeaderMap,
    pub body: Option<Bytes>,
}

impl ApiRequest {
    /// Creates a request with no headers and no body.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: HeaderMap::new(),
            body: None,
        }
    }

    /// Shorthand for a `GET` request.
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    /// Shorthand for a `POST` request.
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    /// Sets (replaces) a header.
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Sets a raw body.
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Serializes `value` as the JSON body and sets `content-type`.
    ///
    /// # Errors
    /// Returns [`TransportError::Body`] if `value` cannot be serialized.
    pub fn json<T: Serialize>(self, value: &T) -> Result<Self, TransportError> {
        let body = serde_json::to_vec(value)
            .map_err(|e| TransportError::Body(e.to_string()))?;
        Ok(self
            .header(
                header::CONTENT_TYPE,
                HeaderValue::from_static("application/json"),
            )
            .body(body))
    }

    /// Attaches `token` as a bearer credential, replacing any existing
    /// `authorization` header.
    ///
    /// # Errors
    /// Returns [`TransportError::InvalidHeader`] if the token contains bytes
    /// that are not allowed in a header value.
    pub fn bearer(self, token: &str) -> Result<Self, TransportError> {
        let mut value = HeaderValue::try_from(format!("Bearer {token}"))
            .map_err(|_| {
                TransportError::InvalidHeader("authorization".into())
            })?;
        value.set_sensitive(true);
        Ok(self.header(header::AUTHORIZATION, value))
    }

    /// `true` when `path` is a full `http://`/`https://` URL rather than a
    /// path under the transport's base URL.
    pub fn is_absolute(&self) -> bool {
        let scheme = self.path.split_once("://").map(|(scheme, _)| scheme);
        scheme.is_some_and(|scheme| {
            scheme.eq_ignore_ascii_case("http") || scheme.eq_ignore_ascii_case("https")
        })
    }

    /// Returns the bearer token currently attached, if any.
    pub fn bearer_token(&self) -> Option<&str> {
        self.headers
            .get(header::AUTHORIZATION)?
            .to_str()
            .ok()?
            .strip_prefix("Bearer ")
    }
}

// ---------------------------------------------------------------------------
// ApiResponse
// ---------------------------------------------------------------------------

/// A fully-read HTTP response.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl ApiResponse {
    /// Creates a response with the given status and an empty body.
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }

    /// Creates a response carrying `value` as a JSON body.
    pub fn with_json<T: Serialize>(status: StatusCode, value: &T) -> Self {
        let body = serde_json::to_vec(value).unwrap_or_default();
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        Self {
            status,
            headers,
            body: body.into(),
        }
    }

    /// `true` for any 2xx status.
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// `true` for `401 Unauthorized`.
    pub fn is_unauthorized(&self) -> bool {
        self.status == StatusCode::UNAUTHORIZED
    }

    /// The body decoded as UTF-8 (lossy).
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Parses the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }
}

// ---------------------------------------------------------------------------
// HttpTransport
// ---------------------------------------------------------------------------

/// Sends requests and returns responses.
///
/// Implementations must return every HTTP status as an [`ApiResponse`];
/// `Err` is reserved for "no response at all".
pub trait HttpTransport: Send + Sync + 'static {
    /// Issues one request and reads the whole response.
    fn send(
        &self,
        request: ApiRequest,
    ) -> impl std::future::Future<Output = Result<ApiResponse, TransportError>>
    + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_id_new_and_into_inner() {
        let id = RequestId::new(42);
        assert_eq!(id.into_inner(), 42);
    }

    #[test]
    fn test_request_id_display() {
        let id = RequestId::new(7);
        assert_eq!(id.to_string(), "req-7");
    }

    #[test]
    fn test_bearer_sets_authorization_header() {
        let req = ApiRequest::get("/api/users").bearer("A1").unwrap();
        assert_eq!(req.bearer_token(), Some("A1"));
        assert!(req.headers[header::AUTHORIZATION].is_sensitive());
    }

    #[test]
    fn test_bearer_replaces_previous_token() {
        let req = ApiRequest::get("/x")
            .bearer("old")
            .unwrap()
            .bearer("new")
            .unwrap();
        assert_eq!(req.bearer_token(), Some("new"));
        assert_eq!(req.headers.get_all(header::AUTHORIZATION).iter().count(), 1);
    }

    #[test]
    fn test_bearer_rejects_control_characters() {
        let result = ApiRequest::get("/x").bearer("bad\ntoken");
        assert!(matches!(result, Err(TransportError::InvalidHeader(_))));
    }

    #[test]
    fn test_json_sets_content_type_and_body() {
        let req = ApiRequest::post("/api/auth/login")
            .json(&serde_json::json!({ "username": "ada" }))
            .unwrap();
        assert_eq!(req.headers[header::CONTENT_TYPE], "application/json");
        assert_eq!(req.body.as_deref(), Some(&br#"{"username":"ada"}"#[..]));
    }

    #[test]
    fn test_is_absolute_only_for_full_urls() {
        assert!(ApiRequest::get("https://elsewhere.example/x").is_absolute());
        assert!(ApiRequest::get("HTTP://elsewhere.example").is_absolute());
        assert!(!ApiRequest::get("/api/users").is_absolute());
        assert!(!ApiRequest::get("api/users").is_absolute());
        assert!(!ApiRequest::get("/search?next=https://x").is_absolute());
    }

    #[test]
    fn test_request_without_bearer_has_no_token() {
        assert_eq!(ApiRequest::get("/x").bearer_token(), None);
    }

    #[test]
    fn test_response_status_helpers() {
        assert!(ApiResponse::new(StatusCode::NO_CONTENT).is_success());
        let unauthorized = ApiResponse::new(StatusCode::UNAUTHORIZED);
        assert!(unauthorized.is_unauthorized());
        assert!(!unauthorized.is_success());
    }

    #[test]
    fn test_response_json_parses_body() {
        let resp = ApiResponse::with_json(
            StatusCode::OK,
            &serde_json::json!({ "id": 3 }),
        );
        let value: serde_json::Value = resp.json().unwrap();
        assert_eq!(value["id"], 3);
        assert_eq!(resp.text(), r#"{"id":3}"#);
    }
}
