// p4kit-core: typed Perforce entities and command operations over p4kit-api.

pub mod convert;
pub mod error;
pub mod model;
pub mod perforce;
pub mod requests;
pub mod reshape;

// ── Primary re-exports ──────────────────────────────────────────────
pub use error::CoreError;
pub use perforce::{ActionOutput, Perforce};
pub use requests::{ActionOptions, ChangesRequest, FilelogOptions, FstatOptions, SyncOptions};

// Re-export model types at the crate root for ergonomics.
pub use model::{
    // Specs
    AuthMethod, ChangeRef, ChangeStatus, ChangeType, Changelist, ChangelistSummary, SubmitOptions,
    User, UserType, View, Workspace, WorkspaceOptions, WorkspaceType,
    // Files
    ActionMessage, ActionResult, FileAction, FileRevision, FileStat, FstatReport,
    HeadRevisionInfo, OpenedFile, OtherOpenEntry, SyncReport, SyncResult, SyncTotals,
};

// The transport types callers need to build a `Perforce`.
pub use p4kit_api::{Connection, Execute, MessageLevel, Record, Runner, Severity};
