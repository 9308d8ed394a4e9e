use thiserror::Error;

/// All errors produced by the rewards pipeline.
#[derive(Error, Debug)]
pub enum RewardsError {
    /// A required field is missing or unparseable across an entire input
    /// set (e.g. no valid ages from which to compute a median).
    #[error("Validation failed: {0}")]
    Validation(String),

    /// An event payload did not match any expected variant shape.
    #[error("Cannot decode event payload at row {row}: {detail}")]
    Decode { row: usize, detail: String },

    /// A foreign-key reference in the event log has no match.
    #[error("Referential integrity violation at row {row}: {detail}")]
    Referential { row: usize, detail: String },

    /// An externally supplied policy table or parameter is malformed.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Pass-through for raw I/O errors from the loading layer.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// A JSON document could not be parsed.
    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// Catch-all for errors from third-party crates via `anyhow`.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Convenience alias used throughout the rewards crates.
pub type Result<T> = std::result::Result<T, RewardsError>;
