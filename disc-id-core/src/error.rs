use thiserror::Error;

/// Errors produced while inspecting a disc image.
#[derive(Debug, Error)]
pub enum DiscError {
    /// The file's extension is not one this pipeline accepts.
    #[error("unsupported file extension: {0}")]
    NotSupportedFile(String),

    /// A descriptor failed its tag checksum, a reserved field was
    /// non-zero, or a tag identifier was unexpected in context.
    #[error("corrupt descriptor: {0}")]
    CorruptDescriptor(String),

    /// The image uses a feature this reader does not implement
    /// (an allocation type other than short/embedded, a partition
    /// map type other than 1, a non-OSTA-compliant volume, ...).
    #[error("unsupported feature: {0}")]
    UnsupportedFeature(String),

    /// Every candidate serial number was exhausted without a
    /// database match.
    #[error("game not found in database")]
    NotFoundInDatabase,

    /// An underlying I/O operation failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl DiscError {
    pub fn not_supported_file(extension: impl Into<String>) -> Self {
        Self::NotSupportedFile(extension.into())
    }

    pub fn corrupt(message: impl Into<String>) -> Self {
        Self::CorruptDescriptor(message.into())
    }

    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::UnsupportedFeature(message.into())
    }
}
