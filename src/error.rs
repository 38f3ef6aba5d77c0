use thiserror::Error;

#[derive(Error, Debug)]
pub enum TranscriptError {
    #[error("Malformed structured record: {0}")]
    MalformedEvent(#[from] serde_json::Error),

    #[error("Invalid idle pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, TranscriptError>;
