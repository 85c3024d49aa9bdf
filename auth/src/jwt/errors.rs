use thiserror::Error;

/// Error type for token operations.
///
/// Callers deciding whether a request is authenticated treat every decode
/// failure (`Expired`, `InvalidToken`) the same way.
#[derive(Debug, Clone, Error)]
pub enum TokenError {
    #[error("Invalid signing key: {0}")]
    InvalidSigningKey(String),

    #[error("Failed to encode token: {0}")]
    EncodingFailed(String),

    #[error("Token is expired")]
    Expired,

    #[error("Token is invalid: {0}")]
    InvalidToken(String),
}
