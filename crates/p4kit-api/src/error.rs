use std::io;

use thiserror::Error;

use crate::marshal::WireError;
use crate::record::Record;

/// Top-level error type for the `p4kit-api` crate.
///
/// Covers process spawning, the marshal stream, and the diagnostics the
/// server reports. `p4kit-core` maps these into domain errors.
#[derive(Debug, Error)]
pub enum Error {
    // ── Command ─────────────────────────────────────────────────────
    /// The server reported an error above the caller's threshold, or the
    /// process wrote to stderr.
    #[error("p4 command failed: {message}")]
    CommandExecution {
        message: String,
        /// Full argument vector, enough to rerun the command by hand.
        command: Vec<String>,
        /// The offending record, when the failure came from stdout.
        record: Option<Record>,
    },

    /// The ticket expired or no password was set; log in again.
    #[error("Perforce connection expired -- password is required")]
    SessionExpired,

    /// `p4 login` rejected the password.
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    // ── Process ─────────────────────────────────────────────────────
    /// The binary could not be started (missing, not executable, ...).
    #[error("failed to spawn `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    /// Pipe or wait failure while talking to the child process.
    #[error("process I/O error: {0}")]
    Io(#[from] io::Error),

    // ── Data ────────────────────────────────────────────────────────
    #[error("marshal stream error: {0}")]
    Wire(#[from] WireError),
}

impl Error {
    /// Returns `true` if logging in again might resolve this error.
    pub fn is_session_expired(&self) -> bool {
        matches!(self, Self::SessionExpired)
    }

    /// The argument vector of the failing command, if known.
    pub fn command(&self) -> Option<&[String]> {
        match self {
            Self::CommandExecution { command, .. } => Some(command),
            _ => None,
        }
    }

    /// The raw diagnostic record, if the failure came from one.
    pub fn record(&self) -> Option<&Record> {
        match self {
            Self::CommandExecution { record, .. } => record.as_ref(),
            _ => None,
        }
    }
}
