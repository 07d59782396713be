use thiserror::Error;

/// Errors that can occur while building VAST documents or recording events
#[derive(Error, Debug)]
pub enum AdServerError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Invalid field '{field}': {reason}")]
    InvalidField {
        field: &'static str,
        reason: String,
    },

    #[error("URL error: {0}")]
    UrlError(#[from] url::ParseError),

    #[error("Event store error: {0}")]
    StoreError(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, AdServerError>;
