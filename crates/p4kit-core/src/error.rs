// ── Core error types ──
//
// Domain errors from p4kit-core. Transport details (pipes, marshal bytes)
// are folded into a few variants; lookups and entity construction get
// their own. The `From<p4kit_api::Error>` impl does the translation.

use p4kit_api::Record;
use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Lookup errors ────────────────────────────────────────────────
    #[error("User '{name}' does not exist")]
    UserNotFound { name: String },

    #[error("Workspace '{name}' does not exist")]
    WorkspaceNotFound { name: String },

    #[error("Change {change} unknown")]
    ChangeUnknown { change: u32 },

    // ── Data errors ──────────────────────────────────────────────────
    /// A record could not be turned into a typed entity.
    #[error("Invalid {entity} field '{field}': {message}")]
    Validation {
        entity: &'static str,
        field: String,
        message: String,
    },

    // ── Command errors ───────────────────────────────────────────────
    #[error("p4 command failed: {message}")]
    CommandFailed {
        message: String,
        command: Vec<String>,
        record: Option<Record>,
    },

    #[error("Perforce session expired -- log in again")]
    SessionExpired,

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    /// The `p4` process could not be started or talked to.
    #[error("p4 process error: {message}")]
    Process { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    pub(crate) fn validation(
        entity: &'static str,
        field: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Validation {
            entity,
            field: field.into(),
            message: message.into(),
        }
    }

    /// Lookup failures: missing user, workspace or changelist.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::UserNotFound { .. } | Self::WorkspaceNotFound { .. } | Self::ChangeUnknown { .. }
        )
    }

    /// Failures that logging in again could fix.
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::SessionExpired | Self::AuthenticationFailed { .. })
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<p4kit_api::Error> for CoreError {
    fn from(err: p4kit_api::Error) -> Self {
        match err {
            p4kit_api::Error::CommandExecution {
                message,
                command,
                record,
            } => CoreError::CommandFailed {
                message,
                command,
                record,
            },
            p4kit_api::Error::SessionExpired => CoreError::SessionExpired,
            p4kit_api::Error::Authentication { message } => {
                CoreError::AuthenticationFailed { message }
            }
            p4kit_api::Error::Spawn { program, source } => CoreError::Process {
                message: format!("cannot run `{program}`: {source}"),
            },
            p4kit_api::Error::Io(e) => CoreError::Process {
                message: e.to_string(),
            },
            p4kit_api::Error::Wire(e) => {
                CoreError::Internal(format!("Malformed p4 output: {e}"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_execution_keeps_command_and_record() {
        let mut record = Record::new();
        record.insert("data".into(), "boom".into());
        let err = CoreError::from(p4kit_api::Error::CommandExecution {
            message: "boom".into(),
            command: vec!["p4".into(), "info".into()],
            record: Some(record.clone()),
        });
        match err {
            CoreError::CommandFailed {
                command,
                record: Some(r),
                ..
            } => {
                assert_eq!(command, ["p4", "info"]);
                assert_eq!(r, record);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn session_expired_is_auth() {
        let err = CoreError::from(p4kit_api::Error::SessionExpired);
        assert!(err.is_auth());
        assert!(!err.is_not_found());
    }

    #[test]
    fn lookups_are_not_found() {
        assert!(CoreError::ChangeUnknown { change: 9 }.is_not_found());
        assert!(
            CoreError::UserNotFound {
                name: "bob".into()
            }
            .is_not_found()
        );
    }
}
