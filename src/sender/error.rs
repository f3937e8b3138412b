use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Authentication failed: {reason}")]
    Auth { reason: String },

    #[error("Unexpected status {status} from {route}: {body}")]
    UnexpectedStatus {
        route: String,
        status: u16,
        body: String,
    },

    #[error("Network error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Malformed response from {route}: {reason}")]
    Decode { route: String, reason: String },

    #[error("Request encoding failed: {0}")]
    Encode(String),

    #[error("Application '{name}' already exists but could not be loaded")]
    ConflictUnresolved { name: String },
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::UnexpectedStatus { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether re-sending the same request later can succeed.
    pub fn is_retryable(&self) -> bool {
        if let Some(status) = self.status() {
            return matches!(status, 408 | 429) || (500..600).contains(&status);
        }
        match self {
            Self::Auth { .. } | Self::Transport(_) | Self::Decode { .. } => true,
            Self::ConflictUnresolved { .. } => true,
            Self::UnexpectedStatus { .. } => false,
            Self::InvalidConfiguration(_) | Self::Encode(_) => false,
        }
    }
}

#[derive(Error, Debug)]
pub enum SendError {
    #[error("Application '{name}' not found")]
    ApplicationNotFound { name: String },

    #[error(transparent)]
    Api(#[from] ApiError),
}

impl SendError {
    /// Retryable errors send the events back to the caller; the rest drop them.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::ApplicationNotFound { .. } => false,
            Self::Api(err) => err.is_retryable(),
        }
    }
}
