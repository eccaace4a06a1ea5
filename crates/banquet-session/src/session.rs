//! Session types: the data structures that represent an authenticated client.
//!
//! A "session" here is the client's record of its own credentials. It tracks:
//! - WHAT to send with each request (the access token)
//! - HOW to get a new one (the refresh token)
//! - HOW LONG the server said the access token lives (the TTL)

use std::fmt;
use std::time::Duration;

use banquet_protocol::{
    DEFAULT_ACCESS_TTL_SECS, DEFAULT_SESSION_MAX_AGE_SECS, TokenGrant,
};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// SessionConfig
// ---------------------------------------------------------------------------

/// Configuration for session behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// How close (in seconds) to its `exp` claim an access token may get
    /// before a request refreshes it first.
    ///
    /// Default: 5 seconds. 0 means "refresh only once already expired".
    pub refresh_margin_secs: u64,

    /// Access-token lifetime assumed when a grant does not declare one.
    ///
    /// Default: 900 seconds (15 minutes).
    pub default_access_ttl_secs: u64,

    /// How long a stored session lives when a grant does not declare
    /// `sessionMaxAgeSeconds`.
    ///
    /// Default: 604800 seconds (7 days).
    pub default_session_max_age_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            refresh_margin_secs: 5,
            default_access_ttl_secs: DEFAULT_ACCESS_TTL_SECS,
            default_session_max_age_secs: DEFAULT_SESSION_MAX_AGE_SECS,
        }
    }
}

impl SessionConfig {
    /// Largest accepted refresh margin. Anything bigger would refresh on
    /// nearly every request for typical 15-minute tokens.
    pub const MAX_REFRESH_MARGIN_SECS: u64 = 60;

    /// Clamp out-of-range values so the config is safe to use.
    pub fn validated(mut self) -> Self {
        if self.refresh_margin_secs > Self::MAX_REFRESH_MARGIN_SECS {
            tracing::warn!(
                margin = self.refresh_margin_secs,
                max = Self::MAX_REFRESH_MARGIN_SECS,
                "refresh_margin_secs exceeds maximum, clamping"
            );
            self.refresh_margin_secs = Self::MAX_REFRESH_MARGIN_SECS;
        }
        self
    }

    /// The refresh margin as a [`Duration`].
    pub fn refresh_margin(&self) -> Duration {
        Duration::from_secs(self.refresh_margin_secs)
    }

    /// How long the session `grant` describes should stay in storage.
    pub fn session_max_age(&self, grant: &TokenGrant) -> Duration {
        Duration::from_secs(
            grant
                .session_max_age_seconds
                .unwrap_or(self.default_session_max_age_secs),
        )
    }
}

// ---------------------------------------------------------------------------
// SessionState
// ---------------------------------------------------------------------------

/// The observed state of the client session.
///
/// Never persisted; derived from what is in the store and whether a
/// refresh is in flight.
///
/// ```text
///                       login
///   Unauthenticated ───────────→ Authenticated
///         ↑                          │ exp within margin / 401
///         │ refresh failed           ▼
///         └──────────────────── Refreshing ←── ExpiredPendingRefresh
///                                    │
///                                    └──(refresh ok)──→ Authenticated
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No usable access/refresh pair.
    Unauthenticated,
    /// An access token is stored and not (known to be) near expiry.
    Authenticated,
    /// The stored access token is expired or about to be; the next request
    /// will refresh it.
    ExpiredPendingRefresh,
    /// A refresh call is in flight; requests queue behind it.
    Refreshing,
}

// ---------------------------------------------------------------------------
// AuthSession
// ---------------------------------------------------------------------------

/// The credential triple held by the client.
///
/// All three fields are written together at login, replaced together at
/// every refresh, and cleared together. There is no way to hold an access
/// token without a refresh token.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthSession {
    /// Short-lived bearer credential.
    pub access_token: String,

    /// Longer-lived credential, rotated on every refresh.
    pub refresh_token: String,

    /// Server-declared lifetime of `access_token`, in seconds.
    pub access_ttl_secs: u64,
}

impl AuthSession {
    /// Builds the session a login or refresh grant describes.
    ///
    /// Callers validate the grant first; this only copies fields and
    /// applies the configured TTL default.
    pub fn from_grant(grant: &TokenGrant, config: &SessionConfig) -> Self {
        Self {
            access_token: grant.token.clone(),
            refresh_token: grant.refresh_token.clone(),
            access_ttl_secs: grant
                .access_token_expires_in_seconds
                .unwrap_or(config.default_access_ttl_secs),
        }
    }

    /// The access-token TTL as a [`Duration`].
    pub fn access_ttl(&self) -> Duration {
        Duration::from_secs(self.access_ttl_secs)
    }
}

/// Tokens are credentials; `Debug` only shows their length.
impl fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthSession")
            .field(
                "access_token",
                &format_args!("<{} bytes>", self.access_token.len()),
            )
            .field(
                "refresh_token",
                &format_args!("<{} bytes>", self.refresh_token.len()),
            )
            .field("access_ttl_secs", &self.access_ttl_secs)
            .finish()
    }
}
