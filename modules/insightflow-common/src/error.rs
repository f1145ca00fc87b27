use thiserror::Error;

#[derive(Error, Debug)]
pub enum InsightFlowError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation error: {0}")]
    Validation(String),
}
