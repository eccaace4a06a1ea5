//! Unified error type for Banquet.

use banquet_protocol::ProtocolError;
use banquet_session::SessionError;
use banquet_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// When using the `banquet` crate, you deal with this single error type
/// instead of importing errors from each sub-crate. The `#[from]` attribute
/// on each variant auto-generates `From` impls, so the `?` operator
/// converts sub-crate errors automatically.
///
/// A rejected credential is not an error: a terminal `401` comes back from
/// [`SessionCoordinator::authenticated_request`](crate::SessionCoordinator::authenticated_request)
/// as an ordinary response.
#[derive(Debug, thiserror::Error)]
pub enum BanquetError {
    /// No response at all (connection refused, DNS, timeout).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A body had the wrong shape.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// Login rejected, unusable grant, or storage failure.
    #[error(transparent)]
    Session(#[from] SessionError),
}

/// Outcome error of the shared refresh future.
///
/// Every task awaiting one refresh receives its own copy of the result, so
/// this must be `Clone`; `ProtocolError` is not, and protocol failures
/// during refresh clear the session rather than erroring anyway.
#[derive(Debug, Clone)]
pub(crate) enum RefreshFailure {
    Transport(TransportError),
    Session(SessionError),
}

impl From<RefreshFailure> for BanquetError {
    fn from(failure: RefreshFailure) -> Self {
        match failure {
            RefreshFailure::Transport(e) => Self::Transport(e),
            RefreshFailure::Session(e) => Self::Session(e),
        }
    }
}

impl From<TransportError> for RefreshFailure {
    fn from(e: TransportError) -> Self {
        Self::Transport(e)
    }
}

impl From<SessionError> for RefreshFailure {
    fn from(e: SessionError) -> Self {
        Self::Session(e)
    }
}
