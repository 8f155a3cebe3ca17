use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CompressionError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image processing error: {0}")]
    ImageProcessing(#[from] image::ImageError),

    #[error("PNG optimization error: {0}")]
    PngOptimization(String),

    #[error("Palette quantization error: {0}")]
    Quantization(String),

    #[error("WebP encoding error: {0}")]
    WebPEncoding(String),

    #[error("Invalid options payload: {0}")]
    InvalidOptions(#[from] serde_json::Error),

    #[error("Invalid upload: {0}")]
    InvalidUpload(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    #[error("No images supplied")]
    NoImagesSupplied,

    #[error("No image files found in input path: {0}")]
    NoImageFilesFound(String),

    #[error("Walkdir error: {0}")]
    WalkdirError(#[from] walkdir::Error),

    #[error("Batch memory limit exceeded: estimated {0}MB, maximum allowed {1}MB")]
    BatchMemoryLimitExceeded(u64, u64),

    #[error("Batch file count limit exceeded: {0} files, maximum allowed {1}")]
    BatchFileLimitExceeded(usize, usize),

    #[error(
        "Insufficient available memory: estimated batch requires {0}MB, but only {1}MB available"
    )]
    InsufficientMemory(u64, u64),

    #[error("None of the {failed} images could be compressed (first failure: {first})")]
    AllItemsFailed { failed: usize, first: String },

    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("Worker pool error: {0}")]
    WorkerPool(String),
}

impl CompressionError {
    /// Short error kind used as the `error` field of the transport envelope.
    pub fn kind(&self) -> &'static str {
        match self {
            CompressionError::NoImagesSupplied => "No files uploaded",
            CompressionError::InvalidOptions(_) => "Invalid options",
            CompressionError::InvalidUpload(_) => "Invalid upload",
            CompressionError::BatchFileLimitExceeded(..)
            | CompressionError::BatchMemoryLimitExceeded(..)
            | CompressionError::InsufficientMemory(..) => "Batch too large",
            _ => "Compression failed",
        }
    }

    /// HTTP status the transport layer reports for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            CompressionError::NoImagesSupplied
            | CompressionError::InvalidOptions(_)
            | CompressionError::InvalidUpload(_)
            | CompressionError::NoImageFilesFound(_)
            | CompressionError::UnsupportedFormat(_) => 400,
            CompressionError::BatchFileLimitExceeded(..)
            | CompressionError::BatchMemoryLimitExceeded(..) => 413,
            CompressionError::AllItemsFailed { .. } => 422,
            CompressionError::InsufficientMemory(..) => 503,
            _ => 500,
        }
    }

    /// True for errors raised before any image is processed.
    pub fn is_input_error(&self) -> bool {
        self.status_code() == 400 || self.status_code() == 413
    }
}

pub type Result<T> = std::result::Result<T, CompressionError>;
