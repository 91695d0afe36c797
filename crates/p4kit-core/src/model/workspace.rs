// ── Workspace (client) domain types ──

use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use p4kit_api::Record;
use serde::Serialize;
use strum::{Display, EnumString};

/// Workspace type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum WorkspaceType {
    Writeable,
    Readonly,
    Partitioned,
}

/// Default behavior of `p4 submit` for unchanged files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display, EnumString)]
pub enum SubmitOptions {
    #[serde(rename = "submitunchanged")]
    #[strum(serialize = "submitunchanged")]
    SubmitUnchanged,
    #[serde(rename = "submitunchanged+reopen")]
    #[strum(serialize = "submitunchanged+reopen")]
    SubmitUnchangedReopen,
    #[serde(rename = "revertunchanged")]
    #[strum(serialize = "revertunchanged")]
    RevertUnchanged,
    #[serde(rename = "revertunchanged+reopen")]
    #[strum(serialize = "revertunchanged+reopen")]
    RevertUnchangedReopen,
    #[serde(rename = "leaveunchanged")]
    #[strum(serialize = "leaveunchanged")]
    LeaveUnchanged,
    #[serde(rename = "leaveunchanged+reopen")]
    #[strum(serialize = "leaveunchanged+reopen")]
    LeaveUnchangedReopen,
}

/// The `Options:` toggles of a workspace.
///
/// Each flag is the positive token (`allwrite`, `clobber`, ...); a missing
/// token means the `no` form.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WorkspaceOptions {
    pub allwrite: bool,
    pub clobber: bool,
    pub compress: bool,
    pub locked: bool,
    pub modtime: bool,
    pub rmdir: bool,
}

impl WorkspaceOptions {
    /// Read a space separated option line such as
    /// `noallwrite clobber nocompress unlocked nomodtime normdir`.
    pub fn parse(line: &str) -> Self {
        let mut options = Self::default();
        for token in line.split_whitespace() {
            match token {
                "allwrite" => options.allwrite = true,
                "clobber" => options.clobber = true,
                "compress" => options.compress = true,
                "locked" => options.locked = true,
                "modtime" => options.modtime = true,
                "rmdir" => options.rmdir = true,
                _ => {}
            }
        }
        options
    }
}

impl fmt::Display for WorkspaceOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let toggle = |on: bool, name: &'static str| if on { name.to_owned() } else { format!("no{name}") };
        write!(
            f,
            "{} {} {} {} {} {}",
            toggle(self.allwrite, "allwrite"),
            toggle(self.clobber, "clobber"),
            toggle(self.compress, "compress"),
            toggle(self.locked, "locked"),
            toggle(self.modtime, "modtime"),
            toggle(self.rmdir, "rmdir"),
        )
    }
}

/// One view mapping line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct View {
    /// Depot side, possibly prefixed with `-` or `+`.
    pub depot: String,
    /// Workspace side.
    pub workspace: String,
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let quote = |s: &str| {
            if s.contains(char::is_whitespace) {
                format!("\"{s}\"")
            } else {
                s.to_owned()
            }
        };
        write!(f, "{} {}", quote(&self.depot), quote(&self.workspace))
    }
}

/// A client workspace specification.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Workspace {
    pub name: String,
    pub owner: String,
    /// Workstation the workspace lives on. Empty when unrestricted.
    pub host: String,
    pub description: String,
    /// Local directory the view is relative to.
    pub root: PathBuf,
    pub options: WorkspaceOptions,
    pub submit_options: SubmitOptions,
    pub workspace_type: WorkspaceType,
    pub stream: Option<String>,
    pub access: DateTime<Utc>,
    pub update: DateTime<Utc>,
    pub views: Vec<View>,
    #[serde(skip_serializing_if = "Record::is_empty")]
    pub extra: Record,
}
