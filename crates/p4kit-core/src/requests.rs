// ── Typed option structs for command operations ──
//
// Each operation that takes flags gets one of these instead of a loose
// argument list. They only render flags; filespecs are passed separately.

use serde::{Deserialize, Serialize};

use crate::model::ChangeStatus;

/// Flags shared by `add`, `edit`, `delete` and `revert`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionOptions {
    /// Open in this changelist instead of the default one.
    pub changelist: Option<u32>,
    /// Report what would happen without changing anything (`-n`).
    pub preview: bool,
}

impl ActionOptions {
    pub(crate) fn push_flags(&self, command: &mut Vec<String>) {
        if let Some(change) = self.changelist {
            command.extend(["-c".to_owned(), change.to_string()]);
        }
        if self.preview {
            command.push("-n".to_owned());
        }
    }
}

/// Filters for `changes`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangesRequest {
    pub user: Option<String>,
    pub status: Option<ChangeStatus>,
    /// At most this many, newest first.
    pub max: Option<u32>,
    /// Full descriptions instead of the first 31 characters.
    pub long_output: bool,
    /// Only changes affecting these files.
    pub filespecs: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncOptions {
    /// Overwrite writable files and resync unchanged ones (`-f`).
    pub force: bool,
    pub preview: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FstatOptions {
    /// Keep files whose head action is `delete` or `move/delete`.
    pub include_deleted: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilelogOptions {
    pub long_output: bool,
    /// Revisions per file.
    pub max: Option<u32>,
}
