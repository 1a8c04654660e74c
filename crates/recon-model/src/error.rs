use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReconError {
    #[error("invalid option {field}: {reason}")]
    InvalidOption { field: &'static str, reason: String },
}

pub type Result<T> = std::result::Result<T, ReconError>;
