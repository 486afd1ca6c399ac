use thiserror::Error;

/// Errors surfaced by the client crate.
///
/// Everything the network can do to us is folded into this taxonomy at the
/// API boundary; no raw HTTP status ever reaches a caller.
#[derive(Error, Debug)]
pub enum ClientError {
    /// The upstream SMS delivery of an OTP failed.
    #[error("OTP delivery failed upstream")]
    DeliveryFailure,

    /// The submitted OTP did not match the most recently issued code.
    #[error("Invalid or expired OTP code")]
    InvalidCredentials,

    /// The session token was missing, unknown, or revoked.
    #[error("Missing or invalid session token")]
    Unauthorized,

    /// The referenced user or record does not exist.
    #[error("Record not found")]
    NotFound,

    /// An authenticated call was attempted without a live session.
    #[error("No active session")]
    NoSession,

    /// The server throttled an OTP send for this phone number.
    #[error("Too many OTP requests; try again later")]
    Throttled,

    /// Transport-level failure (DNS, connect, timeout, body decode).
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// A status code the contract does not define.
    #[error("Unexpected response status: {0}")]
    UnexpectedStatus(reqwest::StatusCode),
}

impl ClientError {
    /// True when the server affirmatively rejected the credential, as
    /// opposed to the request failing in transit.  Drives the decision to
    /// discard a persisted token.
    pub fn is_auth_rejection(&self) -> bool {
        matches!(self, ClientError::Unauthorized | ClientError::NotFound)
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ClientError>;
