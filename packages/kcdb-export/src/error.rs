use thiserror::Error;

/// Why a single request produced no records.
///
/// None of these are fatal: callers log them against the scope or identifier
/// that failed and carry on with zero records for that unit of work.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Network(String),
    #[error("unexpected HTTP status {status}")]
    HttpStatus { status: u16 },
    #[error("response is not JSON (content-type: {content_type}): {reason}")]
    Decode { content_type: String, reason: String },
    #[error("no list of records found in response")]
    Empty,
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            return FetchError::HttpStatus {
                status: status.as_u16(),
            };
        }
        FetchError::Network(err.to_string())
    }
}
