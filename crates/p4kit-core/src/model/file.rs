// ── File domain types ──
//
// Results of the file commands: open-for-add/edit/delete, sync, fstat,
// filelog and opened.

use chrono::{DateTime, Utc};
use indexmap::IndexSet;
use p4kit_api::{MessageLevel, Record};
use serde::Serialize;
use strum::{Display, EnumString};

use super::change::ChangeRef;

/// What was done to a file revision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum FileAction {
    Add,
    Edit,
    Delete,
    Branch,
    #[serde(rename = "move/add")]
    #[strum(serialize = "move/add")]
    MoveAdd,
    #[serde(rename = "move/delete")]
    #[strum(serialize = "move/delete")]
    MoveDelete,
    Integrate,
    Import,
    Purge,
    Archive,
}

impl FileAction {
    /// `delete` and `move/delete`: the head revision has no content.
    pub fn is_deletion(self) -> bool {
        matches!(self, Self::Delete | Self::MoveDelete)
    }
}

/// Feedback line from a file action, e.g.
/// `//depot/a.txt - can't add existing file`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionMessage {
    /// Text before the last ` - `. Empty when the line had no separator.
    pub path: String,
    pub message: String,
    pub level: MessageLevel,
}

/// A file opened (or reverted) by an action command.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionResult {
    /// Kept as text: `revert` reports `reverted`/`abandoned` here.
    pub action: String,
    pub client_file: String,
    pub depot_file: String,
    /// Absent from `revert` output.
    pub file_type: Option<String>,
    /// Revision opened. Absent from `revert` output.
    pub work_rev: Option<u32>,
    #[serde(skip_serializing_if = "Record::is_empty")]
    pub extra: Record,
}

/// One revision from `filelog`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileRevision {
    pub action: FileAction,
    /// Submitting changelist.
    pub change: u32,
    pub client: String,
    pub depot_file: String,
    pub description: String,
    /// MD5 of the content. `None` for deletions.
    pub digest: Option<String>,
    /// Length in bytes. `None` for deletions.
    pub file_size: Option<u64>,
    pub revision: u32,
    pub time: DateTime<Utc>,
    pub file_type: String,
    pub user: String,
    #[serde(skip_serializing_if = "Record::is_empty")]
    pub extra: Record,
}

/// One file updated by `sync`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SyncResult {
    /// `added`, `updated`, `deleted`, `refreshed`, ...
    pub action: String,
    pub client_file: String,
    pub depot_file: String,
    pub revision: u32,
    /// `None` when the file was removed from the workspace.
    pub file_size: Option<u64>,
    #[serde(skip_serializing_if = "Record::is_empty")]
    pub extra: Record,
}

/// Aggregate counters the server puts on the first `sync` record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SyncTotals {
    pub file_count: u64,
    pub file_size: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SyncReport {
    pub totals: Option<SyncTotals>,
    pub files: Vec<SyncResult>,
}

/// The `head*` fields of an `fstat` record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeadRevisionInfo {
    pub action: FileAction,
    pub change: u32,
    /// Head revision, or the revision asked for with a revision specifier.
    pub revision: u32,
    pub file_type: String,
    /// Changelist time of the revision.
    pub time: DateTime<Utc>,
    /// Local modification time before submit.
    pub mod_time: DateTime<Utc>,
    /// Only set for unicode servers.
    pub charset: Option<String>,
}

/// Another workspace that has the file open.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OtherOpenEntry {
    pub action: FileAction,
    pub change: ChangeRef,
    pub user: String,
    pub client: String,
}

/// One file from `fstat`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileStat {
    pub client_file: String,
    pub depot_file: String,
    /// `None` for files that only exist as pending adds.
    pub head: Option<HeadRevisionInfo>,
    /// Revision synced to the workspace.
    pub have_rev: Option<u32>,
    /// Mapped through the current workspace view.
    pub is_mapped: bool,
    pub others_open: Vec<OtherOpenEntry>,
    #[serde(skip_serializing_if = "Record::is_empty")]
    pub extra: Record,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FstatReport {
    pub files: Vec<FileStat>,
    /// Paths the server reported as `no such file(s).`: they exist on disk
    /// only.
    pub local_paths: IndexSet<String>,
}

/// One file from `opened`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OpenedFile {
    pub depot_file: String,
    pub client_file: Option<String>,
    pub revision: u32,
    pub have_rev: Option<u32>,
    pub action: FileAction,
    pub change: ChangeRef,
    pub file_type: String,
    pub user: String,
    pub client: String,
    #[serde(skip_serializing_if = "Record::is_empty")]
    pub extra: Record,
}
