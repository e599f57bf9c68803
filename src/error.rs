//! Error types for entropy coding operations.

use thiserror::Error;

/// Result type alias for entropy coding operations.
pub type Result<T> = core::result::Result<T, Error>;

/// Entropy coding error types.
#[derive(Debug, Error)]
pub enum Error {
    /// Input data is corrupted or invalid.
    #[error("corrupted data: {message}")]
    CorruptedData { message: String },

    /// Destination buffer too small for output.
    #[error("destination too small: need {required} bytes, got {provided}")]
    DstTooSmall { required: usize, provided: usize },

    /// Input exceeds the maximum block size.
    #[error("source too large: {size} bytes exceeds block limit of {max}")]
    SrcTooLarge { size: usize, max: usize },

    /// A symbol value exceeds the declared alphabet bound.
    #[error("symbol value {value} exceeds maximum {max}")]
    MaxSymbolTooLarge { value: u32, max: u32 },

    /// Requested table log exceeds the supported maximum.
    #[error("table log {value} exceeds maximum {max}")]
    TableLogTooLarge { value: u32, max: u32 },

    /// Caller-provided scratch space is too small.
    #[error("workspace too small: need {required} entries, got {provided}")]
    WorkspaceTooSmall { required: usize, provided: usize },

    /// Unexpected end of input stream.
    #[error("unexpected end of stream after {bits_read} bits")]
    UnexpectedEof { bits_read: usize },

    /// Catch-all for conditions the caller cannot act upon.
    #[error("{0}")]
    Generic(&'static str),
}

impl Error {
    /// Create a corrupted data error.
    pub fn corrupted(message: impl Into<String>) -> Self {
        Error::CorruptedData {
            message: message.into(),
        }
    }

    /// Create a destination too small error.
    pub fn dst_too_small(required: usize, provided: usize) -> Self {
        Error::DstTooSmall { required, provided }
    }

    /// Create an unexpected EOF error.
    pub fn unexpected_eof(bits_read: usize) -> Self {
        Error::UnexpectedEof { bits_read }
    }

    /// Get the error tag for metrics and classification.
    ///
    /// Tags distinguish input corruption from usage bugs: `corrupted_data`
    /// and `unexpected_eof` point at the data, everything else at the call.
    pub fn category(&self) -> &'static str {
        match self {
            Error::CorruptedData { .. } => "corrupted_data",
            Error::DstTooSmall { .. } => "dst_too_small",
            Error::SrcTooLarge { .. } => "src_too_large",
            Error::MaxSymbolTooLarge { .. } => "max_symbol_too_large",
            Error::TableLogTooLarge { .. } => "table_log_too_large",
            Error::WorkspaceTooSmall { .. } => "workspace_too_small",
            Error::UnexpectedEof { .. } => "unexpected_eof",
            Error::Generic(_) => "generic",
        }
    }

    /// Whether the error indicates malformed input rather than a usage bug.
    pub fn is_data_error(&self) -> bool {
        matches!(
            self,
            Error::CorruptedData { .. } | Error::UnexpectedEof { .. }
        )
    }
}
