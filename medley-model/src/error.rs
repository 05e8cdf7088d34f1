use std::fmt::{self, Display};

/// Errors produced by model constructors and validation routines.
#[derive(Debug)]
pub enum ModelError {
    /// A status code outside the defined set was supplied.
    InvalidStatus(i16),
    /// A comment failed construction-time validation.
    InvalidComment(String),
    /// An engine configuration payload could not be decoded.
    InvalidEngineData(serde_json::Error),
}

impl Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelError::InvalidStatus(code) => {
                write!(f, "invalid comment status code: {code}")
            }
            ModelError::InvalidComment(msg) => {
                write!(f, "invalid comment: {msg}")
            }
            ModelError::InvalidEngineData(err) => {
                write!(f, "invalid engine data: {err}")
            }
        }
    }
}

impl std::error::Error for ModelError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ModelError::InvalidEngineData(err) => Some(err),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for ModelError {
    fn from(err: serde_json::Error) -> Self {
        ModelError::InvalidEngineData(err)
    }
}

pub type Result<T> = std::result::Result<T, ModelError>;
