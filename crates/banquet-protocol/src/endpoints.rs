//! Paths of the auth API, relative to the API origin.
//!
//! The dashboard reaches the API server through an `/api` proxy, so every
//! path carries that prefix.

/// `POST` — exchange username/password for a [`TokenGrant`](crate::TokenGrant).
pub const LOGIN_PATH: &str = "/api/auth/login";

/// `POST` — exchange a refresh token for a new [`TokenGrant`](crate::TokenGrant).
pub const REFRESH_PATH: &str = "/api/auth/refresh";

/// `GET`, bearer-authenticated — liveness probe for the current session.
pub const ME_PATH: &str = "/api/auth/me";

/// `POST`, bearer-authenticated — server-side logout. Best effort.
pub const LOGOUT_PATH: &str = "/api/auth/logout";

/// `GET`, bearer-authenticated — staff/user accounts.
pub const USERS_PATH: &str = "/api/users";
