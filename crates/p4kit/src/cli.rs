//! Clap derive structures for the `p4kit` CLI.
//!
//! Global connection flags mirror `p4` itself (`-p`, `-u`, `-c`), so
//! per-command changelist options use `-C`.

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

use p4kit_core::{ChangeStatus, Severity};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// p4kit -- typed Perforce queries from the command line
#[derive(Debug, Parser)]
#[command(
    name = "p4kit",
    version,
    about = "Query and drive a Perforce server with typed, structured output",
    long_about = "Runs `p4 -G` under the hood, decodes its marshalled records and\n\
        prints users, workspaces, changelists and file state as tables,\n\
        JSON or YAML.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Configuration profile to use
    #[arg(long, env = "P4KIT_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Server address (overrides profile and P4PORT)
    #[arg(long, short = 'p', global = true)]
    pub port: Option<String>,

    /// Perforce user (overrides profile and P4USER)
    #[arg(long, short = 'u', global = true)]
    pub user: Option<String>,

    /// Client workspace (overrides profile and P4CLIENT)
    #[arg(long, short = 'c', global = true)]
    pub client: Option<String>,

    /// Output format [default: from config, else table]
    #[arg(long, short = 'o', env = "P4KIT_OUTPUT", global = true)]
    pub output: Option<OutputFormat>,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,
}

impl GlobalOpts {
    /// The selected output format, once `main` has folded in the config default.
    pub fn format(&self) -> OutputFormat {
        self.output.clone().unwrap_or(OutputFormat::Table)
    }
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show one user's specification
    User {
        /// User name
        name: String,
    },

    /// List users, optionally filtered by name patterns
    Users {
        /// Name patterns (e.g. `b*`)
        patterns: Vec<String>,

        /// At most this many users
        #[arg(long, short = 'm')]
        max: Option<u32>,
    },

    /// Show one workspace (client) specification
    #[command(alias = "client")]
    Workspace {
        /// Workspace name
        name: String,
    },

    /// Show one changelist specification
    Change {
        /// Changelist number
        change: u32,
    },

    /// List changelists
    Changes(ChangesArgs),

    /// Create a pending changelist and print it
    NewChange {
        /// Changelist description
        description: String,
    },

    /// Open files for add
    Add(ActionArgs),

    /// Open files for edit
    Edit(ActionArgs),

    /// Open files for delete
    Delete(ActionArgs),

    /// Discard changes to opened files
    Revert(ActionArgs),

    /// List files opened in the current workspace
    Opened {
        /// Files to look at (all opened files when empty)
        files: Vec<String>,

        /// Only files in this changelist
        #[arg(long = "change", short = 'C')]
        changelist: Option<u32>,
    },

    /// Bring the workspace up to date
    Sync(SyncArgs),

    /// Show file state
    Fstat(FstatArgs),

    /// Show revision history
    Filelog(FilelogArgs),

    /// Log in and obtain a ticket
    Login(LoginArgs),

    /// Run any p4 command and print the raw records
    Run(RunArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Command arguments ────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ChangesArgs {
    /// Only changelists owned by this user
    #[arg(long)]
    pub owner: Option<String>,

    /// Only changelists with this status
    #[arg(long, short = 's', value_parser = parse_status)]
    pub status: Option<ChangeStatus>,

    /// At most this many changelists, newest first
    #[arg(long, short = 'm')]
    pub max: Option<u32>,

    /// Full descriptions
    #[arg(long, short = 'l')]
    pub long: bool,

    /// Only changelists affecting these files
    pub files: Vec<String>,
}

#[derive(Debug, Args)]
pub struct ActionArgs {
    /// Files to act on
    #[arg(required = true)]
    pub files: Vec<String>,

    /// Changelist to open the files in
    #[arg(long = "change", short = 'C')]
    pub changelist: Option<u32>,

    /// Report what would happen without doing it
    #[arg(long, short = 'n')]
    pub preview: bool,
}

#[derive(Debug, Args)]
pub struct SyncArgs {
    /// Files to sync (the whole workspace when empty)
    pub files: Vec<String>,

    /// Resync files that are already up to date
    #[arg(long, short = 'f')]
    pub force: bool,

    /// Report what would happen without doing it
    #[arg(long, short = 'n')]
    pub preview: bool,
}

#[derive(Debug, Args)]
pub struct FstatArgs {
    /// Files to stat
    #[arg(required = true)]
    pub files: Vec<String>,

    /// Keep files whose head revision is a delete
    #[arg(long)]
    pub deleted: bool,
}

#[derive(Debug, Args)]
pub struct FilelogArgs {
    /// Files to show history for
    #[arg(required = true)]
    pub files: Vec<String>,

    /// Full descriptions
    #[arg(long, short = 'l')]
    pub long: bool,

    /// Revisions per file
    #[arg(long, short = 'm')]
    pub max: Option<u32>,
}

#[derive(Debug, Args)]
pub struct LoginArgs {
    /// Always prompt, ignoring stored credentials
    #[arg(long)]
    pub prompt: bool,

    /// Store the prompted password in the system keyring
    #[arg(long)]
    pub save: bool,
}

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Highest severity accepted before the command counts as failed
    #[arg(long, default_value = "empty")]
    pub max_severity: SeverityArg,

    /// Command and arguments, e.g. `info` or `describe -s 42`
    #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
    pub command: Vec<String>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum SeverityArg {
    Empty,
    Info,
    Warning,
    Failed,
    Fatal,
}

impl From<SeverityArg> for Severity {
    fn from(arg: SeverityArg) -> Self {
        match arg {
            SeverityArg::Empty => Self::Empty,
            SeverityArg::Info => Self::Info,
            SeverityArg::Warning => Self::Warning,
            SeverityArg::Failed => Self::Failed,
            SeverityArg::Fatal => Self::Fatal,
        }
    }
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: Shell,
}

fn parse_status(value: &str) -> Result<ChangeStatus, String> {
    value
        .parse()
        .map_err(|_| format!("expected pending, shelved or submitted, got '{value}'"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_tree_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn changelist_flag_does_not_clash_with_client() {
        let cli = Cli::try_parse_from(["p4kit", "-c", "ws", "edit", "-C", "12", "a.txt"]).ok();
        let Some(Cli {
            global,
            command: Command::Edit(args),
        }) = cli
        else {
            panic!("edit did not parse");
        };
        assert_eq!(global.client.as_deref(), Some("ws"));
        assert_eq!(args.changelist, Some(12));
        assert_eq!(args.files, vec!["a.txt".to_owned()]);
    }

    #[test]
    fn run_keeps_hyphenated_arguments() {
        let cli = Cli::try_parse_from(["p4kit", "run", "describe", "-s", "42"]).ok();
        let Some(Cli {
            command: Command::Run(args),
            ..
        }) = cli
        else {
            panic!("run did not parse");
        };
        assert_eq!(args.command, ["describe", "-s", "42"]);
    }

    #[test]
    fn status_values_are_parsed() {
        assert_eq!(parse_status("shelved"), Ok(ChangeStatus::Shelved));
        assert!(parse_status("open").is_err());
    }
}
