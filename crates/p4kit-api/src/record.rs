// Raw record types
//
// Every object `p4 -G` writes is a flat dictionary of strings. The `code`
// field says whether it is a structured result (`stat`), human feedback
// (`info`) or a diagnostic (`error`); diagnostics carry a numeric severity.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

/// One decoded object from the marshal stream, in server emission order.
pub type Record = IndexMap<String, String>;

/// Values of the mandatory `code` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum MarshalCode {
    /// Structured status output.
    Stat,
    /// Feedback from the command, the text lives in `data`.
    Info,
    /// A diagnostic, the text lives in `data` and the level in `severity`.
    Error,
}

/// Severity of an `error` record, ordered from harmless to fatal.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// No error.
    #[default]
    Empty,
    /// Something good happened.
    Info,
    /// Something not good happened.
    Warning,
    /// The command failed, the user did something wrong.
    Failed,
    /// The system is broken and cannot continue.
    Fatal,
}

impl Severity {
    /// Map the integer carried on the wire. Values past `Fatal` saturate.
    pub fn from_code(code: i64) -> Self {
        match code {
            i64::MIN..=0 => Self::Empty,
            1 => Self::Info,
            2 => Self::Warning,
            3 => Self::Failed,
            _ => Self::Fatal,
        }
    }

    pub fn code(self) -> u8 {
        match self {
            Self::Empty => 0,
            Self::Info => 1,
            Self::Warning => 2,
            Self::Failed => 3,
            Self::Fatal => 4,
        }
    }
}

/// Generic message level attached to `info` records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum MessageLevel {
    /// Miscellaneous.
    None,
    /// Request is not consistent with documentation.
    Usage,
    /// Using an unknown entity.
    Unknown,
    /// Using an entity in the wrong context.
    Context,
    /// Not permitted.
    Illegal,
    /// Something must be fixed first.
    NotYet,
    /// Protections prevented the operation.
    Protect,
    /// The action returned empty results.
    Empty,
    /// Inexplicable program fault.
    Fault,
    /// Client side program error.
    Client,
    /// Server administrative action required.
    Admin,
    /// Client configuration is inadequate.
    Config,
    /// Client or server too old to interact.
    Upgrade,
    /// Communications error.
    Comm,
    /// Too big to handle.
    TooBig,
}

impl MessageLevel {
    pub fn from_code(code: u32) -> Option<Self> {
        let level = match code {
            0x00 => Self::None,
            0x01 => Self::Usage,
            0x02 => Self::Unknown,
            0x03 => Self::Context,
            0x04 => Self::Illegal,
            0x05 => Self::NotYet,
            0x06 => Self::Protect,
            0x11 => Self::Empty,
            0x21 => Self::Fault,
            0x22 => Self::Client,
            0x23 => Self::Admin,
            0x24 => Self::Config,
            0x25 => Self::Upgrade,
            0x26 => Self::Comm,
            0x27 => Self::TooBig,
            _ => return None,
        };
        Some(level)
    }
}

/// Typed accessors for the protocol fields every record may carry.
pub trait RecordExt {
    /// The parsed `code` field, `None` when missing or unrecognized.
    fn code(&self) -> Option<MarshalCode>;

    /// Effective severity. An `error` record without a readable severity
    /// counts as fatal; other records default to empty.
    fn severity(&self) -> Severity;

    /// The trimmed `data` text, empty when absent.
    fn message(&self) -> &str;
}

impl RecordExt for Record {
    fn code(&self) -> Option<MarshalCode> {
        self.get("code").and_then(|c| c.parse().ok())
    }

    fn severity(&self) -> Severity {
        match self.get("severity").and_then(|s| s.trim().parse::<i64>().ok()) {
            Some(code) => Severity::from_code(code),
            None if self.code() == Some(MarshalCode::Error) => Severity::Fatal,
            None => Severity::Empty,
        }
    }

    fn message(&self) -> &str {
        self.get("data").map_or("", |d| d.trim())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn record(pairs: &[(&str, &str)]) -> Record {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    #[test]
    fn severity_is_ordered() {
        assert!(Severity::Empty < Severity::Info);
        assert!(Severity::Info < Severity::Warning);
        assert!(Severity::Warning < Severity::Failed);
        assert!(Severity::Failed < Severity::Fatal);
    }

    #[test]
    fn severity_from_code_saturates() {
        assert_eq!(Severity::from_code(-3), Severity::Empty);
        assert_eq!(Severity::from_code(2), Severity::Warning);
        assert_eq!(Severity::from_code(42), Severity::Fatal);
        assert_eq!(Severity::Failed.code(), 3);
    }

    #[test]
    fn code_parses_known_values() {
        assert_eq!(record(&[("code", "stat")]).code(), Some(MarshalCode::Stat));
        assert_eq!(record(&[("code", "info")]).code(), Some(MarshalCode::Info));
        assert_eq!(record(&[("code", "error")]).code(), Some(MarshalCode::Error));
        assert_eq!(record(&[("code", "bogus")]).code(), None);
        assert_eq!(record(&[]).code(), None);
    }

    #[test]
    fn error_without_severity_is_fatal() {
        let r = record(&[("code", "error"), ("data", "boom")]);
        assert_eq!(r.severity(), Severity::Fatal);

        let r = record(&[("code", "stat")]);
        assert_eq!(r.severity(), Severity::Empty);
    }

    #[test]
    fn message_is_trimmed() {
        let r = record(&[("code", "info"), ("data", "  hello\n")]);
        assert_eq!(r.message(), "hello");
        assert_eq!(record(&[]).message(), "");
    }

    #[test]
    fn message_level_codes() {
        assert_eq!(MessageLevel::from_code(0), Some(MessageLevel::None));
        assert_eq!(MessageLevel::from_code(0x11), Some(MessageLevel::Empty));
        assert_eq!(MessageLevel::from_code(0x27), Some(MessageLevel::TooBig));
        assert_eq!(MessageLevel::from_code(0x07), None);
    }
}
