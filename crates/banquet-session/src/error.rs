//! Error types for the session layer.

/// Errors that can occur while establishing or persisting a session.
///
/// `Clone` because a single refresh outcome is handed to every caller that
/// was waiting on it.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SessionError {
    /// The session store could not be read or written.
    #[error("session store failure: {0}")]
    Store(String),

    /// The server refused the login. `message` is the server's own
    /// explanation when it gave one.
    #[error("login rejected ({status}): {message}")]
    LoginRejected { status: u16, message: String },

    /// The server answered 2xx but the token grant was unusable.
    #[error("invalid token grant: {0}")]
    InvalidGrant(String),
}
