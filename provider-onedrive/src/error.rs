//! Error types for the OneDrive provider

use thiserror::Error;

/// OneDrive provider errors
#[derive(Error, Debug)]
pub enum OneDriveError {
    /// A required input combination was not supplied; no request was made
    #[error("Not all the parameters are correctly set: {0}")]
    InvalidParameters(String),

    /// A response lacked required fields, or a library search found no match
    #[error("Cannot parse the body of the drive request: {0}")]
    ParseError(String),

    /// API request returned a non-JSON error body
    #[error("Graph API error (status {status_code}): {message}")]
    ApiError { status_code: u16, message: String },

    #[error("Throttled, retry after {0} seconds")]
    Throttled(u64),

    #[error("Authentication required")]
    AuthRequired,

    /// Transport failure from the underlying HTTP client
    #[error(transparent)]
    Bridge(#[from] bridge_traits::error::BridgeError),
}

pub type Result<T> = std::result::Result<T, OneDriveError>;

impl From<OneDriveError> for bridge_traits::error::BridgeError {
    fn from(error: OneDriveError) -> Self {
        use bridge_traits::error::BridgeError;

        match error {
            OneDriveError::Bridge(e) => e,
            other => BridgeError::OperationFailed(other.to_string()),
        }
    }
}
