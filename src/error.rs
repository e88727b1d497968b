use thiserror::Error;

/// Errors are `Clone` so a single upstream failure can be handed to every
/// caller waiting on the same in-flight request.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Rate limit exceeded, please try again later")]
    RateLimited,

    #[error("Upstream unavailable (HTTP {status}) after {attempts} attempts")]
    TransientUpstream { status: u16, attempts: u32 },

    #[error("Upstream rejected request (HTTP {status}): {url}")]
    PermanentUpstream { status: u16, url: String },

    #[error("Player not found: {0}")]
    PlayerNotFound(String),

    #[error("HTTP error: {0}")]
    HttpError(String),

    #[error("JSON parsing error: {0}")]
    JsonError(String),
}

impl AppError {
    /// HTTP status carried by upstream failures, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            AppError::TransientUpstream { status, .. } | AppError::PermanentUpstream { status, .. } => {
                Some(*status)
            }
            _ => None,
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(e: serde_json::Error) -> Self {
        AppError::JsonError(e.to_string())
    }
}
