//! View engine error types

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ViewError {
    /// Template parsing or rendering error
    #[error("Template error: {0}")]
    TemplateError(String),

    /// A template file is not valid UTF-8
    #[error("Template '{0}' is not valid UTF-8")]
    Encoding(String),

    /// IO error while reading override templates
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}
