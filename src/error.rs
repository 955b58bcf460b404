//! Error types for the extraction engine.
//!
//! Only two conditions abort an extraction run: a missing input file and a
//! document the backend cannot open. Every heuristic miss (no chapter, no
//! hinge, an unowned table) is represented in the output data, never here.

use std::path::PathBuf;

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur during extraction or classification.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The input file does not exist
    #[error("Input not found: {}", .0.display())]
    InputNotFound(PathBuf),

    /// The input exists but the PDF backend could not open it
    #[error("Failed to open document: {0}")]
    DocumentOpen(String),

    /// The backend failed while reading or rendering an opened document
    #[error("Backend error: {0}")]
    Backend(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// PNG encoding error
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// Invalid or unreadable topic taxonomy
    #[error("Taxonomy error: {0}")]
    Taxonomy(String),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Whether this error means the input document itself is unusable.
    pub fn is_input_failure(&self) -> bool {
        matches!(self, Error::InputNotFound(_) | Error::DocumentOpen(_))
    }
}
