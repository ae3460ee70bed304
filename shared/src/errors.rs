//! Error types shared by the backend and the WASM bindings

use thiserror::Error;

/// Rejected user input. Display strings are shown to the user as-is.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Please upload an image (JPG, PNG) or PDF.")]
    UnsupportedFileType { content_type: String },

    #[error("File size too large. Max 10MB.")]
    FileTooLarge { size: usize, max: usize },

    #[error("{field}: {message}")]
    InvalidField { field: String, message: String },
}

impl ValidationError {
    pub fn field(field: &str, message: impl Into<String>) -> Self {
        ValidationError::InvalidField {
            field: field.to_string(),
            message: message.into(),
        }
    }

    /// Offending field, when the error concerns one
    pub fn field_name(&self) -> Option<&str> {
        match self {
            ValidationError::InvalidField { field, .. } => Some(field),
            ValidationError::UnsupportedFileType { .. } | ValidationError::FileTooLarge { .. } => {
                Some("file")
            }
        }
    }
}

/// Backup document could not be restored
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ImportError {
    /// Not parseable as JSON at all
    #[error("Backup file is not valid JSON: {0}")]
    Malformed(String),

    /// JSON, but not a backup document
    #[error("Invalid backup file format: {0}")]
    InvalidFormat(String),
}

/// Export document could not be produced
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV serialization error: {0}")]
    Csv(String),
}
