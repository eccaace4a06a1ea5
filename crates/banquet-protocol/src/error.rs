//! Error types for the protocol layer.
//!
//! Each crate in Banquet defines its own error enum. When you see a
//! `ProtocolError`, the problem is in the shape of a body, not in
//! networking or storage.

/// Errors that can occur in the protocol layer.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a Rust type into bytes).
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed (turning bytes into a Rust type).
    ///
    /// Common causes: an HTML error page where JSON was expected,
    /// truncated bodies, or wrong data types.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The body parsed but violates the protocol, e.g. a token grant
    /// with an empty `refreshToken`.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}
