use thiserror::Error;

#[derive(Error, Debug)]
pub enum TapestryError {
    #[error("Invalid log type selector: {0}")]
    InvalidLogType(String),

    #[error("Invalid analysis mode selector: {0}")]
    InvalidAnalysisMode(String),
}
