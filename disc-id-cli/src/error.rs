use thiserror::Error;

/// Errors that can occur during CLI command execution.
#[derive(Debug, Error)]
pub(crate) enum CliError {
    /// I/O error
    #[error("{0}")]
    Io(#[from] std::io::Error),

    /// Disc identification or database loading failed
    #[error("{0}")]
    Identify(#[from] disc_id_core::DiscError),
}
