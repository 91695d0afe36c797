//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text and a process exit code.

use miette::Diagnostic;
use thiserror::Error;

use p4kit_config::ConfigError;
use p4kit_core::CoreError;

pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const COMMAND: i32 = 5;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("No Perforce server configured for profile '{profile}'")]
    #[diagnostic(
        code(p4kit::no_port),
        help(
            "Pass --port, set P4PORT, or add a profile to\n\
             {path}"
        )
    )]
    NoPort { profile: String, path: String },

    #[error("Could not run p4: {message}")]
    #[diagnostic(
        code(p4kit::process),
        help("Check that `p4` is on PATH, or set `program` in your profile.")
    )]
    Process { message: String },

    // ── Authentication ───────────────────────────────────────────────
    #[error("Perforce session expired")]
    #[diagnostic(code(p4kit::session_expired), help("Run: p4kit login"))]
    SessionExpired,

    #[error("Login failed: {message}")]
    #[diagnostic(
        code(p4kit::auth_failed),
        help(
            "Check the password for profile '{profile}'.\n\
             Stored passwords come from password_env, P4PASSWD, the keyring\n\
             or the config file, in that order. Use --prompt to type one."
        )
    )]
    AuthFailed { message: String, profile: String },

    #[error("No password available for profile '{profile}'")]
    #[diagnostic(
        code(p4kit::no_password),
        help("Set P4PASSWD, or run: p4kit login --prompt --save")
    )]
    NoPassword { profile: String },

    // ── Resources ────────────────────────────────────────────────────
    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(p4kit::not_found),
        help("Run: p4kit {list_command} to see what exists")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
        list_command: String,
    },

    // ── Commands ─────────────────────────────────────────────────────
    #[error("`{command}` failed: {message}")]
    #[diagnostic(code(p4kit::command_failed))]
    CommandFailed { command: String, message: String },

    #[error("Unexpected server data: {message}")]
    #[diagnostic(
        code(p4kit::unexpected_data),
        help("The server sent a record p4kit could not interpret. Re-run with -vv for details.")
    )]
    UnexpectedData { message: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(p4kit::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error(transparent)]
    #[diagnostic(code(p4kit::config))]
    Config(ConfigError),

    // ── IO / Serialization ───────────────────────────────────────────
    #[error("Could not render output: {message}")]
    #[diagnostic(code(p4kit::render))]
    Render { message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::SessionExpired | Self::AuthFailed { .. } | Self::NoPassword { .. } => {
                exit_code::AUTH
            }
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::CommandFailed { .. } => exit_code::COMMAND,
            Self::Validation { .. } | Self::NoPort { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::UserNotFound { name } => CliError::NotFound {
                resource_type: "user".into(),
                identifier: name,
                list_command: "users".into(),
            },

            CoreError::WorkspaceNotFound { name } => CliError::NotFound {
                resource_type: "workspace".into(),
                identifier: name,
                list_command: "run clients".into(),
            },

            CoreError::ChangeUnknown { change } => CliError::NotFound {
                resource_type: "change".into(),
                identifier: change.to_string(),
                list_command: "changes".into(),
            },

            CoreError::Validation {
                entity,
                field,
                message,
            } => CliError::UnexpectedData {
                message: format!("{entity} field '{field}': {message}"),
            },

            CoreError::CommandFailed {
                message, command, ..
            } => CliError::CommandFailed {
                command: command.join(" "),
                message,
            },

            CoreError::SessionExpired => CliError::SessionExpired,

            CoreError::AuthenticationFailed { message } => CliError::AuthFailed {
                message,
                profile: "current".into(),
            },

            CoreError::Process { message } => CliError::Process { message },

            CoreError::Internal(message) => CliError::UnexpectedData { message },
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::NoPort { profile } => CliError::NoPort {
                profile,
                path: p4kit_config::config_path().display().to_string(),
            },
            ConfigError::NoPassword { profile } => CliError::NoPassword { profile },
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            other => CliError::Config(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookups_exit_with_not_found() {
        let err = CliError::from(CoreError::ChangeUnknown { change: 999 });
        assert_eq!(err.exit_code(), exit_code::NOT_FOUND);
        assert_eq!(err.to_string(), "change '999' not found");
    }

    #[test]
    fn failed_commands_keep_their_arguments() {
        let err = CliError::from(CoreError::CommandFailed {
            message: "//depot/x - no such file(s).".into(),
            command: vec!["sync".into(), "//depot/x".into()],
            record: None,
        });
        assert_eq!(err.exit_code(), exit_code::COMMAND);
        assert_eq!(
            err.to_string(),
            "`sync //depot/x` failed: //depot/x - no such file(s)."
        );
    }

    #[test]
    fn session_and_password_problems_are_auth_failures() {
        assert_eq!(
            CliError::from(CoreError::SessionExpired).exit_code(),
            exit_code::AUTH
        );
        let err = CliError::from(ConfigError::NoPassword {
            profile: "work".into(),
        });
        assert_eq!(err.exit_code(), exit_code::AUTH);
    }

    #[test]
    fn missing_port_is_a_usage_error() {
        let err = CliError::from(ConfigError::NoPort {
            profile: "default".into(),
        });
        assert_eq!(err.exit_code(), exit_code::USAGE);
    }
}
