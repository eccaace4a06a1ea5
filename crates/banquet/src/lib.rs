//! # Banquet
//!
//! Authenticated-session client for the catering admin API.
//!
//! Banquet keeps a dashboard signed in: it stores the access/refresh token
//! pair, attaches the access token to every API call, refreshes it before
//! it expires or after the server rejects it, and makes sure only one
//! refresh is ever in flight. An idle guard signs the user out after a
//! period without interaction.
//!
//! ```text
//! SessionCoordinator (this crate)  ← authenticated_request / login / logout
//!     ↕
//! banquet-session  ← AuthSession, SessionStore, token expiry peek
//! banquet-idle     ← IdleGuard
//!     ↕
//! banquet-protocol ← TokenGrant and friends, JSON codec
//!     ↕
//! banquet-transport ← HttpTransport, ReqwestTransport
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use banquet::prelude::*;
//!
//! # async fn run() -> Result<(), BanquetError> {
//! let session = SessionCoordinator::new(
//!     ReqwestTransport::new("https://admin.example.com")?,
//!     Arc::new(FileStore::new("session.json")),
//!     SessionConfig::default(),
//! );
//!
//! session.login("ada", "correct horse").await?;
//! let (idle, activity) = session.start_idle_guard(IdleConfig::default());
//! activity.record(Activity::KeyPress);
//!
//! let reservations = session
//!     .authenticated_request(ApiRequest::get("/api/reservations"))
//!     .await?;
//! if reservations.is_unauthorized() {
//!     // Refresh could not help: back to the login screen.
//!     let to = login_redirect(Some(LogoutReason::SessionExpired), Some("/reservations"));
//!     println!("redirect to {to}");
//! }
//! # let _ = idle.timeout();
//! # Ok(())
//! # }
//! ```

mod coordinator;
mod error;

pub mod guard;
pub mod telemetry;

pub use coordinator::{SessionCheck, SessionCoordinator};
pub use error::BanquetError;

pub use banquet_idle::{Activity, IdleConfig, IdleGuard, IdleHandle, SessionEnd};
pub use banquet_protocol::{ProtocolError, TokenGrant, endpoints};
pub use banquet_session::{
    AuthSession, FileStore, LogoutReason, MemoryStore, SessionConfig,
    SessionError, SessionState, SessionStore,
};
pub use banquet_transport::{
    ApiRequest, ApiResponse, HttpTransport, ReqwestTransport, TransportError,
};

/// Everything needed to drive a session, in one import.
pub mod prelude {
    pub use crate::guard::{RouteDecision, RouteGuard, login_redirect};
    pub use crate::{
        Activity, ApiRequest, ApiResponse, AuthSession, BanquetError,
        FileStore, HttpTransport, IdleConfig, IdleGuard, IdleHandle,
        LogoutReason, MemoryStore, ReqwestTransport, SessionCheck,
        SessionConfig, SessionCoordinator, SessionError, SessionState,
        SessionStore, TransportError,
    };
}
