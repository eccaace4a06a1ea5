/// Errors that can occur in the transport layer.
///
/// HTTP status codes are never errors here. A 401 or a 500 is a perfectly
/// good [`ApiResponse`](crate::ApiResponse); only failures to get *any*
/// response end up in this enum.
#[derive(Debug, Clone, thiserror::Error)]
pub enum TransportError {
    /// The transport could not be built (bad base URL, TLS setup, ...).
    #[error("invalid transport configuration: {0}")]
    Configuration(String),

    /// A header name or value could not be encoded.
    #[error("invalid header: {0}")]
    InvalidHeader(String),

    /// The request never produced a response: connection refused,
    /// DNS failure, TLS handshake failure, or timeout.
    #[error("request failed: {0}")]
    Request(String),

    /// The request or response body could not be produced or read.
    #[error("body error: {0}")]
    Body(String),
}
