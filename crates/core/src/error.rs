use thiserror::Error;

#[derive(Error, Debug)]
pub enum CrontentionError {
    #[error("Malformed table: {0}")]
    Table(#[from] csv::Error),

    #[error("Malformed error body: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Failure response whose body is not a structured rejection.
    #[error("Evaluation service returned {status}: {body}")]
    Service { status: u16, body: String },

    #[error("Invalid pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("Unknown time zone: {0}")]
    InvalidTimeZone(String),

    #[error("Invariant violated: {0}")]
    Invariant(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T, E = CrontentionError> = std::result::Result<T, E>;
