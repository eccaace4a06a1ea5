//! Wire protocol for the catering admin auth API.
//!
//! This crate defines what the client and the API server exchange on the
//! `/api/auth/*` endpoints:
//!
//! - **Types** ([`LoginRequest`], [`RefreshRequest`], [`TokenGrant`],
//!   [`ErrorBody`]) — the JSON bodies that travel on the wire.
//! - **Endpoints** ([`endpoints`]) — the paths those bodies are sent to.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]) — how bodies are converted
//!   to/from bytes.
//! - **Errors** ([`ProtocolError`]) — what can go wrong during
//!   encoding/decoding.
//!
//! It knows nothing about HTTP clients or storage; it only knows shapes.

mod auth;
mod codec;
mod error;

pub mod endpoints;

pub use auth::{
    DEFAULT_ACCESS_TTL_SECS, DEFAULT_SESSION_MAX_AGE_SECS, ErrorBody,
    LoginRequest, RefreshRequest, TokenGrant,
};
pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
