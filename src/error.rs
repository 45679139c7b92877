//! Error taxonomy shared by every layer above the ports.

use std::path::PathBuf;

use crate::reconcile::Change;

/// Errors surfaced by the reconciliation pipeline and its commands.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid configuration, flags or declarations. Always fatal.
    #[error("configuration error: {0}")]
    Config(String),

    /// A structurally malformed line in the mapping file.
    #[error("{}:{line}: {message}", .path.display())]
    Mapping {
        /// Mapping file being parsed.
        path: PathBuf,
        /// One-based line number.
        line: usize,
        /// What is wrong with the line.
        message: String,
    },

    /// The service credential could not be acquired or released.
    #[error("credential error: {0}")]
    Credential(String),

    /// The directory could not be reached or rejected a query.
    #[error("directory error: {0}")]
    Directory(String),

    /// A resolver could not compute a membership set.
    #[error("resolver query failed: {0}")]
    Resolve(String),

    /// A grant or revoke was rejected or did not reach the service.
    #[error("{operation} {user} on {entitlement} failed: {cause}")]
    Mutation {
        /// Entitlement being changed.
        entitlement: String,
        /// Direction of the change.
        operation: Change,
        /// User being changed.
        user: String,
        /// Reason reported by the transport or the service.
        cause: String,
    },

    /// Reading or writing a local file failed.
    #[error("failed to access {}: {message}", .path.display())]
    Io {
        /// File being accessed.
        path: PathBuf,
        /// Underlying failure.
        message: String,
    },

    /// The run completed but some operations failed.
    #[error("{0} operation(s) failed")]
    OperationsFailed(usize),

    /// A command was invoked without anything to do.
    #[error("No actions specified.")]
    NoActions,
}

impl Error {
    /// Returns `true` for errors that must abort a run before any mutation.
    #[must_use]
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_) | Self::Mapping { .. })
    }
}

/// Convenience alias for results carrying [`Error`].
pub type Result<T, E = Error> = std::result::Result<T, E>;
