use thiserror::Error;

#[derive(Error, Debug)]
pub enum AssistantError {
    #[error("No API key configured. Set one with :key or the OPENAI_API_KEY environment variable.")]
    MissingCredential,

    #[error("No dataset loaded. Load a CSV or Excel file with :load <path>.")]
    MissingDataset,

    #[error("Dataset error: {0}")]
    Dataset(String),

    #[error("Completion error: {0}")]
    Completion(String),

    #[error("Execution error: {0}")]
    Execution(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Polars error: {0}")]
    Polars(#[from] polars::prelude::PolarsError),
}

pub type Result<T> = std::result::Result<T, AssistantError>;
