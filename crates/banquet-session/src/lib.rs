//! Client-held session state for Banquet.
//!
//! This crate owns everything about the credential pair the dashboard keeps
//! between requests:
//!
//! 1. **The record** — [`AuthSession`]: access token, refresh token and the
//!    access-token TTL, always stored and cleared together.
//! 2. **Storage** — the [`SessionStore`] trait with an in-memory
//!    ([`MemoryStore`]) and an on-disk ([`FileStore`]) implementation.
//! 3. **Expiry peek** — [`token`] reads the `exp` claim out of an access
//!    token so callers can refresh *before* the server starts saying 401.
//! 4. **Endings** — [`LogoutReason`], the code the login screen shows after
//!    a forced logout.
//!
//! # How it fits in the stack
//!
//! ```text
//! Coordinator (above)  ← decides when to refresh, issues requests
//!     ↕
//! Session Layer (this crate)  ← what is stored, and whether it is stale
//!     ↕
//! Protocol Layer (below)  ← provides TokenGrant
//! ```

mod error;
mod reason;
mod session;
mod store;

pub mod token;

pub use error::SessionError;
pub use reason::LogoutReason;
pub use session::{AuthSession, SessionConfig, SessionState};
pub use store::{FileStore, MemoryStore, SessionStore};
