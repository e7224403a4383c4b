//! Error types for pdfium-viewer

use thiserror::Error;

/// Result type for pdfium-viewer operations
pub type Result<T> = std::result::Result<T, PdfError>;

/// Error types for PDF operations
#[derive(Error, Debug)]
pub enum PdfError {
    /// The native engine could not be initialized. Reported on every
    /// `ensure_ready` after the first failure; there is no retry.
    #[error("Failed to initialize PDFium library: {reason}")]
    EngineInitializationFailed { reason: String },

    /// The engine has not been initialized yet
    #[error("PDFium library is not initialized")]
    EngineNotReady,

    /// The engine was shut down (or a shutdown is pending)
    #[error("PDFium library has been shut down")]
    EngineShutDown,

    /// Failed to open PDF document
    #[error("Failed to open PDF document: {reason}")]
    OpenFailed { reason: String },

    /// Page index out of bounds
    #[error("Page index {index} out of bounds (document has {count} pages)")]
    PageIndexOutOfBounds { index: usize, count: usize },

    /// Failed to render page
    #[error("Failed to render page {index}: {reason}")]
    RenderFailed { index: usize, reason: String },

    /// Failed to save document
    #[error("Failed to save document: {reason}")]
    SaveFailed { reason: String },

    /// Operation on a document or handle that was already closed
    #[error("Document has already been closed")]
    UseAfterClose,

    /// The rendering surface refused to hand out a drawing context
    #[error("Rendering surface error: {reason}")]
    Surface { reason: String },

    /// Invalid parameter
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// PNG encoding error
    #[error("PNG encoding error: {0}")]
    PngEncoding(String),

    /// JPEG encoding error
    #[error("JPEG encoding error: {0}")]
    JpegEncoding(String),
}

impl PdfError {
    /// True when the error is specific to one request and the document stays usable.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            PdfError::RenderFailed { .. }
                | PdfError::SaveFailed { .. }
                | PdfError::PageIndexOutOfBounds { .. }
                | PdfError::Surface { .. }
                | PdfError::InvalidParameter(_)
                | PdfError::Io(_)
                | PdfError::PngEncoding(_)
                | PdfError::JpegEncoding(_)
        )
    }
}
