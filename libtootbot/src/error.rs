//! Error types for Tootbot

use thiserror::Error;

pub type Result<T> = std::result::Result<T, TootbotError>;

/// Status codes that make a failed status creation worth retrying
pub const RETRYABLE_STATUS_CODES: [u16; 7] = [408, 500, 502, 503, 504, 522, 524];

/// Status assumed when a posting failure carries no HTTP status
pub const DEFAULT_POST_ERROR_STATUS: u16 = 503;

#[derive(Error, Debug)]
pub enum TootbotError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Prompt error: {0}")]
    Prompt(#[from] PromptError),

    #[error("Upstream error: {0}")]
    Upstream(#[from] UpstreamError),

    #[error("Generated text stayed above {max_length} characters after {attempts} attempts")]
    ValidationExhausted { attempts: u32, max_length: usize },

    #[error("Failed to write output: {0}")]
    Output(#[from] std::io::Error),
}

impl TootbotError {
    /// Returns the appropriate exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            TootbotError::Config(_) | TootbotError::Prompt(_) => 2,
            TootbotError::Upstream(e) if matches!(e.status(), Some(401) | Some(403)) => 3,
            TootbotError::Upstream(_) | TootbotError::Output(_) => 1,
            TootbotError::ValidationExhausted { .. } => 4,
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVariable(String),

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),
}

#[derive(Error, Debug)]
pub enum PromptError {
    #[error("Failed to read prompt file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Prompt file {0} is empty")]
    Empty(String),
}

/// Failure reported by one of the remote collaborators
#[derive(Error, Debug, Clone)]
pub enum UpstreamError {
    #[error("Completion request failed: {message}")]
    Completion { status: Option<u16>, message: String },

    #[error("Image generation failed: {message}")]
    ImageGeneration { status: Option<u16>, message: String },

    #[error("Image download failed: {message}")]
    Download { status: Option<u16>, message: String },

    #[error("Media upload failed: {message}")]
    MediaUpload { status: Option<u16>, message: String },

    #[error("Posting failed: {message}")]
    Posting { status: Option<u16>, message: String },
}

impl UpstreamError {
    /// HTTP status attached to the failure, if the collaborator reported one
    pub fn status(&self) -> Option<u16> {
        match self {
            UpstreamError::Completion { status, .. }
            | UpstreamError::ImageGeneration { status, .. }
            | UpstreamError::Download { status, .. }
            | UpstreamError::MediaUpload { status, .. }
            | UpstreamError::Posting { status, .. } => *status,
        }
    }

    /// Whether this is a status creation failure eligible for backoff retry
    ///
    /// Only `Posting` errors qualify. A missing status is treated as 503.
    pub fn is_transient_post_error(&self) -> bool {
        match self {
            UpstreamError::Posting { status, .. } => {
                is_retryable_status(status.unwrap_or(DEFAULT_POST_ERROR_STATUS))
            }
            _ => false,
        }
    }
}

pub fn is_retryable_status(code: u16) -> bool {
    RETRYABLE_STATUS_CODES.contains(&code)
}
