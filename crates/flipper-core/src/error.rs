//! Error types for Flipper Core

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FlipperError {
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Parse error: {0}")]
    Parse(String),
}

pub type FlipperResult<T> = Result<T, FlipperError>;
