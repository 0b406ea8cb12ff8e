use thiserror::Error;

/// Errors raised by the shared Psynth types.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Malformed {what} response: {reason}")]
    MalformedResponse { what: &'static str, reason: String },

    #[error("Detail anchored to {anchor_uid} has no anchor type")]
    MissingAnchorType { anchor_uid: String },
}
