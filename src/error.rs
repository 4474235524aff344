use thiserror::Error;

#[derive(Error, Debug)]
pub enum OcrError {
    #[error("Failed to initialize OCR engine: {0}")]
    InitializationError(String),

    #[error("Failed to process image: {0}")]
    ProcessingError(String),

    #[error("Unsupported pixel format: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid region: {0}")]
    InvalidRegion(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Unknown engine variable: {0}")]
    UnknownVariable(String),

    #[error("Renderer '{format}' failed: {message}")]
    RenderError { format: String, message: String },

    #[error("Recognition was cancelled")]
    Cancelled,

    #[error("Input file not found: {0}")]
    MissingFile(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl OcrError {
    /// Stable machine-readable code for this error category
    pub fn code(&self) -> &'static str {
        match self {
            OcrError::InitializationError(_) => "INIT_ERROR",
            OcrError::ProcessingError(_) => "PROCESSING_ERROR",
            OcrError::UnsupportedFormat(_) => "UNSUPPORTED_FORMAT",
            OcrError::InvalidRegion(_) => "INVALID_REGION",
            OcrError::InvalidArgument(_) => "INVALID_ARGUMENT",
            OcrError::UnknownVariable(_) => "UNKNOWN_VARIABLE",
            OcrError::RenderError { .. } => "RENDER_ERROR",
            OcrError::Cancelled => "CANCELLED",
            OcrError::MissingFile(_) => "MISSING_FILE",
            OcrError::Io(_) => "IO_ERROR",
            OcrError::Image(_) => "IMAGE_ERROR",
            OcrError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl From<std::ffi::NulError> for OcrError {
    fn from(err: std::ffi::NulError) -> Self {
        OcrError::InvalidArgument(format!("string contains an interior NUL byte: {}", err))
    }
}
