/// Errors that can occur while writing a persisted document
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Filesystem failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Document could not be encoded
    #[error("Failed to encode document: {0}")]
    Encode(#[from] serde_json::Error),
}
