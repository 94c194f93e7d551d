//! Error types for rigbridge.
//!
//! All fallible operations across the workspace return [`Result<T>`], which
//! uses [`Error`] as the error type. Validation failures, wire failures and
//! transport failures are all captured here so that callers (including the
//! rigctld server) can map each one to a distinct outcome.

use crate::types::Mode;

/// The error type for all rigbridge operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No connection to the rig has been established, or the coordinator
    /// has been shut down.
    #[error("not connected")]
    NotConnected,

    /// Timed out waiting for a response from the rig.
    ///
    /// This typically indicates the rig is powered off, the baud rate is
    /// wrong, or the CI-V address is incorrect.
    #[error("timeout waiting for response")]
    Timeout,

    /// The rig answered, but the bytes did not form the reply we expected
    /// (bad preamble, wrong mnemonic, echo mismatch, undecodable payload).
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// The rig explicitly rejected the command (CI-V NAK, CAT `?;`).
    #[error("command failed: {0}")]
    CommandFailed(String),

    /// The requested operation is not supported by this rig model.
    #[error("unsupported operation: {0}")]
    UnsupportedOperation(String),

    /// An invalid parameter was passed to a rig command.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// The frequency lies outside every range the rig can tune.
    #[error("frequency out of range: {0} Hz")]
    FrequencyOutOfRange(u64),

    /// The rig model cannot operate in the requested mode.
    #[error("mode not supported: {0}")]
    ModeNotSupported(Mode),

    /// A transport-level error (serial port open, configuration).
    #[error("transport error: {0}")]
    Transport(String),

    /// An underlying I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether this error leaves unread or stale bytes on the link, so the
    /// next exchange must start from a flushed input buffer.
    pub fn desyncs_link(&self) -> bool {
        matches!(self, Error::Timeout | Error::InvalidResponse(_))
    }
}

/// A convenience `Result` alias using [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;
