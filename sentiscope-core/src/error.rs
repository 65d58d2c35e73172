use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalysisError {
    // Input validation
    #[error("no text provided for analysis")]
    EmptyBatch,

    #[error("failed to read input files: {0}")]
    FileRead(String),

    // Remote call
    #[error("request to model provider failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("model provider error: {0}")]
    Provider(String),

    // Response contract
    #[error("invalid response format from model: {0}")]
    MalformedResponse(String),

    #[error("response was not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("schema validation failed: {0}")]
    SchemaValidation(String),

    // Export
    #[error("export failed: {0}")]
    Export(String),

    // Configuration
    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, AnalysisError>;

impl From<config::ConfigError> for AnalysisError {
    fn from(value: config::ConfigError) -> Self {
        AnalysisError::Config(value.to_string())
    }
}

impl AnalysisError {
    /// True for failures of the response contract itself, as opposed to
    /// transport or provider failures.
    pub fn is_malformed_response(&self) -> bool {
        matches!(self, AnalysisError::MalformedResponse(_))
    }
}
