use std::path::PathBuf;

use thiserror::Error;

/// Failures talking to the text-generation service.
#[derive(Debug, Error)]
pub enum AssistantError {
    #[error("no API credential configured")]
    MissingCredential,

    #[error("API credential is malformed: {0}")]
    InvalidCredential(String),

    #[error("failed to set up chat session: {0}")]
    Setup(String),

    /// The wrapped error never carries the request URL, which holds the key.
    #[error("request to Gemini API failed: {0}")]
    Transport(reqwest::Error),

    #[error("Gemini API returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Gemini API quota or rate limit exceeded: {0}")]
    RateLimited(String),

    #[error("Gemini API response could not be used: {0}")]
    MalformedResponse(String),
}

/// Failures loading the portfolio document.
#[derive(Debug, Error)]
pub enum PortfolioError {
    #[error("failed to read portfolio file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse portfolio {origin}: {source}")]
    Parse {
        origin: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid portfolio: {0}")]
    Invalid(String),
}
