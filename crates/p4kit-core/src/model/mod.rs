// ── Domain model ──
//
// Typed views of the records `p4 -G` prints. Each entity keeps the keys it
// does not understand in `extra`, so newer servers never break decoding.

pub mod change;
pub mod file;
pub mod user;
pub mod workspace;

// ── Re-exports ──────────────────────────────────────────────────────

pub use change::{ChangeRef, ChangeStatus, ChangeType, Changelist, ChangelistSummary};
pub use file::{
    ActionMessage, ActionResult, FileAction, FileRevision, FileStat, FstatReport,
    HeadRevisionInfo, OpenedFile, OtherOpenEntry, SyncReport, SyncResult, SyncTotals,
};
pub use user::{AuthMethod, User, UserType};
pub use workspace::{SubmitOptions, View, Workspace, WorkspaceOptions, WorkspaceType};
