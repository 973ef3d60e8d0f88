//! Error types for the document pipeline.
//!
//! Encoding and layout failures abort a document outright. `AssetUnavailable`
//! is the one variant composers recover from locally (the image is skipped).

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while encoding tokens or building documents.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Token payload does not fit the fixed QR profile
    #[error("Token payload too large: {len} bytes exceeds capacity of {capacity} bytes")]
    PayloadTooLarge {
        /// Payload length in bytes
        len: usize,
        /// Byte capacity of the token profile
        capacity: usize,
    },

    /// Card requested for a record whose token cannot be resolved
    #[error("No scannable token available for student {0}")]
    MissingToken(String),

    /// Draw operation issued against a page that was already sealed
    #[error("Write to sealed page {page}")]
    StaleCanvas {
        /// Zero-based index of the sealed page
        page: usize,
    },

    /// Photo or logo asset could not be loaded
    #[error("Asset unavailable: {0}")]
    AssetUnavailable(String),

    /// Record failed validation
    #[error("Invalid student record: {0}")]
    InvalidRecord(String),

    /// Column layout is inconsistent with the page
    #[error("Invalid column layout: {0}")]
    InvalidLayout(String),

    /// Configuration value cannot be used
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Image decode or encode error
    #[error("Image error: {0}")]
    Image(String),

    /// QR symbol construction error
    #[error("Barcode error: {0}")]
    Barcode(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Whether a composer may recover from this error by degrading output.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Error::AssetUnavailable(_))
    }
}
