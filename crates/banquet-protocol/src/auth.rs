//! Request and response bodies of the `/api/auth/*` endpoints.
//!
//! The API speaks camelCase JSON; the `#[serde(rename_all)]` attributes map
//! it onto snake_case fields.

use serde::{Deserialize, Deserializer, Serialize};

/// Access-token lifetime assumed when the server does not declare one (15 min).
pub const DEFAULT_ACCESS_TTL_SECS: u64 = 15 * 60;

/// Session storage lifetime assumed when the server does not declare one (7 days).
pub const DEFAULT_SESSION_MAX_AGE_SECS: u64 = 7 * 24 * 60 * 60;

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// Body of `POST /api/auth/login`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Hand-written so passwords never end up in logs.
impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Body of `POST /api/auth/refresh`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: String,
}

// ---------------------------------------------------------------------------
// TokenGrant
// ---------------------------------------------------------------------------

/// A freshly issued credential pair, returned by both login and refresh.
///
/// ```json
/// {
///   "token": "<access token>",
///   "refreshToken": "<refresh token>",
///   "accessTokenExpiresInSeconds": 900,
///   "sessionMaxAgeSeconds": 604800
/// }
/// ```
///
/// The two lifetimes are optional. A value that is present but not a
/// number (`"900"`, `null`) is treated the same as an absent one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenGrant {
    #[serde(default)]
    pub token: String,

    #[serde(default)]
    pub refresh_token: String,

    #[serde(
        default,
        deserialize_with = "lenient_secs",
        skip_serializing_if = "Option::is_none"
    )]
    pub access_token_expires_in_seconds: Option<u64>,

    #[serde(
        default,
        deserialize_with = "lenient_secs",
        skip_serializing_if = "Option::is_none"
    )]
    pub session_max_age_seconds: Option<u64>,
}

impl TokenGrant {
    /// Server-declared access-token lifetime, or 900 seconds.
    pub fn access_ttl_secs(&self) -> u64 {
        self.access_token_expires_in_seconds
            .unwrap_or(DEFAULT_ACCESS_TTL_SECS)
    }

    /// Server-declared session storage lifetime, or 7 days.
    pub fn session_max_age_secs(&self) -> u64 {
        self.session_max_age_seconds
            .unwrap_or(DEFAULT_SESSION_MAX_AGE_SECS)
    }

    /// Checks that both tokens are present.
    ///
    /// # Errors
    /// [`ProtocolError::InvalidMessage`](crate::ProtocolError::InvalidMessage)
    /// naming the first missing field.
    pub fn validate(&self) -> Result<(), crate::ProtocolError> {
        if self.token.is_empty() {
            return Err(crate::ProtocolError::InvalidMessage(
                "token grant is missing `token`".into(),
            ));
        }
        if self.refresh_token.is_empty() {
            return Err(crate::ProtocolError::InvalidMessage(
                "token grant is missing `refreshToken`".into(),
            ));
        }
        Ok(())
    }
}

/// Accepts any JSON value; keeps it only if it is a non-negative number.
fn lenient_secs<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Lenient {
        Number(f64),
        Other(serde::de::IgnoredAny),
    }

    Ok(match Lenient::deserialize(deserializer)? {
        Lenient::Number(n) if n.is_finite() && n >= 0.0 => Some(n as u64),
        _ => None,
    })
}

// ---------------------------------------------------------------------------
// ErrorBody
// ---------------------------------------------------------------------------

/// Failure payload returned with a non-2xx login response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}
