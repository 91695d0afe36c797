// ── Changelist domain types ──

use std::fmt;

use chrono::{DateTime, Utc};
use p4kit_api::Record;
use serde::{Deserialize, Serialize, Serializer};
use strum::{Display, EnumString};

/// Changelist status.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ChangeStatus {
    Pending,
    Shelved,
    Submitted,
    /// A spec from `change -o` with no number yet.
    New,
}

/// Changelist visibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ChangeType {
    Restricted,
    Public,
}

/// A changelist a file is opened in. The server writes `default` for the
/// default changelist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeRef {
    Default,
    Number(u32),
}

impl fmt::Display for ChangeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Default => f.write_str("default"),
            Self::Number(n) => write!(f, "{n}"),
        }
    }
}

impl Serialize for ChangeRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Default => serializer.serialize_str("default"),
            Self::Number(n) => serializer.serialize_u32(*n),
        }
    }
}

/// A full changelist specification, as `change -o` prints it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Changelist {
    /// `None` for a spec that has not been saved yet (`Change: new`).
    pub change: Option<u32>,
    pub client: String,
    pub user: String,
    /// Last modification.
    pub date: Option<DateTime<Utc>>,
    pub description: String,
    pub status: ChangeStatus,
    pub change_type: ChangeType,
    /// Depot paths opened in the changelist.
    pub files: Vec<String>,
    pub shelve_access: Option<DateTime<Utc>>,
    pub shelve_update: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Record::is_empty")]
    pub extra: Record,
}

/// One line of `changes`: no file list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChangelistSummary {
    pub change: u32,
    pub client: String,
    pub user: String,
    pub date: DateTime<Utc>,
    pub description: String,
    pub status: ChangeStatus,
    pub change_type: ChangeType,
    #[serde(skip_serializing_if = "Record::is_empty")]
    pub extra: Record,
}
