// ── Perforce operations ──
//
// The top layer. Each operation builds a `p4` command, runs it through the
// executor with its own severity threshold, and routes every record either
// into a message list or through an entity builder.

use p4kit_api::{Connection, Execute, MarshalCode, Record, RecordExt, Runner, Severity};
use secrecy::SecretString;
use tracing::{debug, info};

use crate::convert;
use crate::error::CoreError;
use crate::model::{
    ActionMessage, ActionResult, Changelist, ChangelistSummary, FileRevision, FileStat,
    FstatReport, OpenedFile, SyncReport, SyncResult, SyncTotals, User, Workspace,
};
use crate::requests::{ActionOptions, ChangesRequest, FilelogOptions, FstatOptions, SyncOptions};
use crate::reshape::{REVISION_KEY, extract_indexed_composite, extract_indexed_list};

/// Benign `sync` warning for files already at the requested revision.
const UP_TO_DATE: &str = "file(s) up-to-date.";

/// `fstat` error for a path that exists on disk only. Matched literally, so
/// a localized server message will not be recognized.
const NO_SUCH_FILE: &str = "no such file(s).";

/// `fstat -F` filter that drops deleted head revisions.
const NOT_DELETED: &str = "^headAction=delete ^headAction=move/delete";

/// Feedback and opened files from an action command.
pub type ActionOutput = (Vec<ActionMessage>, Vec<ActionResult>);

// ── Perforce ─────────────────────────────────────────────────────

/// Typed operations against one server, as one user and workspace.
///
/// Holds no state besides the connection: every call is a fresh `p4`
/// process, so a `Perforce` can be shared freely.
#[derive(Debug, Clone)]
pub struct Perforce<E = Runner> {
    connection: Connection,
    executor: E,
}

impl Perforce<Runner> {
    /// Operations through `p4` on `PATH`.
    pub fn new(connection: Connection) -> Self {
        Self::with_executor(connection, Runner::new())
    }
}

impl<E: Execute> Perforce<E> {
    pub fn with_executor(connection: Connection, executor: E) -> Self {
        Self {
            connection,
            executor,
        }
    }

    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    fn p4(&self, command: &[String], max_severity: Severity) -> Result<Vec<Record>, CoreError> {
        Ok(self
            .executor
            .execute(&self.connection, command, None, max_severity)?)
    }

    // ── Specs ────────────────────────────────────────────────────────

    /// `p4 user -o NAME`.
    ///
    /// The server prints a template for unknown users; a spec without an
    /// `Update` date is reported as [`CoreError::UserNotFound`].
    pub fn user(&self, name: &str) -> Result<User, CoreError> {
        let records = self.p4(&args(&["user", "-o", name]), Severity::Empty)?;
        match records.into_iter().next() {
            Some(record) if record.contains_key("Update") => convert::user_from_spec(record),
            _ => Err(CoreError::UserNotFound {
                name: name.to_owned(),
            }),
        }
    }

    /// `p4 users [-m MAX] [PATTERN...]`.
    pub fn users(&self, patterns: &[String], max: Option<u32>) -> Result<Vec<User>, CoreError> {
        let mut command = args(&["users"]);
        if let Some(max) = max {
            command.extend(["-m".to_owned(), max.to_string()]);
        }
        command.extend(patterns.iter().cloned());

        self.p4(&command, Severity::Empty)?
            .into_iter()
            .filter(is_structured)
            .map(convert::user_from_listing)
            .collect()
    }

    /// `p4 client -o NAME`. Same not-found rule as [`user`](Self::user).
    pub fn workspace(&self, name: &str) -> Result<Workspace, CoreError> {
        let records = self.p4(&args(&["client", "-o", name]), Severity::Empty)?;
        match records.into_iter().next() {
            Some(record) if record.contains_key("Update") => Workspace::try_from(record),
            _ => Err(CoreError::WorkspaceNotFound {
                name: name.to_owned(),
            }),
        }
    }

    /// `p4 change -o N`.
    pub fn change(&self, change: u32) -> Result<Changelist, CoreError> {
        let command = args(&["change", "-o", &change.to_string()]);
        let unknown = format!("Change {change} unknown.");

        let records = match self
            .executor
            .execute(&self.connection, &command, None, Severity::Empty)
        {
            Ok(records) => records,
            Err(err) if err.record().is_some_and(|r| r.message() == unknown) => {
                return Err(CoreError::ChangeUnknown { change });
            }
            Err(err) => return Err(err.into()),
        };
        Changelist::try_from(first(records, &command)?)
    }

    /// Create an empty pending changelist and return it.
    ///
    /// Fetches a fresh spec, sets the description, drops the files the
    /// server pre-fills from the default changelist, saves it, then reads
    /// back the newest change of the current user.
    pub fn create_changelist(&self, description: &str) -> Result<ChangelistSummary, CoreError> {
        let template = args(&["change", "-o"]);
        let mut spec = first(self.p4(&template, Severity::Empty)?, &template)?;
        spec.insert("Description".to_owned(), description.to_owned());
        let moved = extract_indexed_list(&mut spec, "Files");
        debug!(files = moved.len(), "left default changelist files out of new change");

        self.executor.execute(
            &self.connection,
            &args(&["change", "-i"]),
            Some(&spec),
            Severity::Empty,
        )?;

        let latest = args(&["changes", "--me", "-m", "1", "-l"]);
        let summary = ChangelistSummary::try_from(first(self.p4(&latest, Severity::Empty)?, &latest)?)?;
        info!(change = summary.change, "created changelist");
        Ok(summary)
    }

    /// `p4 changes` with the request's filters.
    pub fn changes(&self, request: &ChangesRequest) -> Result<Vec<ChangelistSummary>, CoreError> {
        let mut command = args(&["changes"]);
        if let Some(user) = &request.user {
            command.extend(["-u".to_owned(), user.clone()]);
        }
        if let Some(status) = request.status {
            command.extend(["-s".to_owned(), status.to_string()]);
        }
        if let Some(max) = request.max {
            command.extend(["-m".to_owned(), max.to_string()]);
        }
        if request.long_output {
            command.push("-l".to_owned());
        }
        command.extend(request.filespecs.iter().cloned());

        self.p4(&command, Severity::Empty)?
            .into_iter()
            .filter(is_structured)
            .map(ChangelistSummary::try_from)
            .collect()
    }

    // ── File actions ─────────────────────────────────────────────────

    /// Open files for add.
    pub fn add(&self, filespecs: &[String], options: ActionOptions) -> Result<ActionOutput, CoreError> {
        self.file_action("add", filespecs, options)
    }

    /// Open files for edit.
    pub fn edit(&self, filespecs: &[String], options: ActionOptions) -> Result<ActionOutput, CoreError> {
        self.file_action("edit", filespecs, options)
    }

    /// Open files for delete.
    pub fn delete(&self, filespecs: &[String], options: ActionOptions) -> Result<ActionOutput, CoreError> {
        self.file_action("delete", filespecs, options)
    }

    /// Discard changes to open files.
    pub fn revert(&self, filespecs: &[String], options: ActionOptions) -> Result<ActionOutput, CoreError> {
        self.file_action("revert", filespecs, options)
    }

    fn file_action(
        &self,
        action: &str,
        filespecs: &[String],
        options: ActionOptions,
    ) -> Result<ActionOutput, CoreError> {
        let mut command = args(&[action]);
        options.push_flags(&mut command);
        command.extend(filespecs.iter().cloned());

        let mut messages = Vec::new();
        let mut results = Vec::new();
        for record in self.p4(&command, Severity::Empty)? {
            if is_structured(&record) {
                results.push(ActionResult::try_from(record)?);
            } else {
                messages.push(ActionMessage::try_from(record)?);
            }
        }
        debug!(action, messages = messages.len(), files = results.len(), "file action done");
        Ok((messages, results))
    }

    /// `p4 opened [-c N] [FILES...]`.
    pub fn opened(&self, filespecs: &[String], changelist: Option<u32>) -> Result<Vec<OpenedFile>, CoreError> {
        let mut command = args(&["opened"]);
        if let Some(change) = changelist {
            command.extend(["-c".to_owned(), change.to_string()]);
        }
        command.extend(filespecs.iter().cloned());

        self.p4(&command, Severity::Empty)?
            .into_iter()
            .filter(is_structured)
            .map(OpenedFile::try_from)
            .collect()
    }

    // ── Workspace content ────────────────────────────────────────────

    /// Bring files in the workspace to their head (or requested) revision.
    ///
    /// Files already up to date are skipped silently. The first result
    /// carries the totals for the whole sync.
    pub fn sync(&self, filespecs: &[String], options: SyncOptions) -> Result<SyncReport, CoreError> {
        let mut command = args(&["sync"]);
        if options.force {
            command.push("-f".to_owned());
        }
        if options.preview {
            command.push("-n".to_owned());
        }
        command.extend(filespecs.iter().cloned());

        let mut report = SyncReport::default();
        for mut record in self.p4(&command, Severity::Warning)? {
            match record.code() {
                Some(MarshalCode::Error) => {
                    if split_feedback(record.message()).1 == UP_TO_DATE {
                        debug!(message = record.message(), "already synced");
                    } else {
                        return Err(command_failed(&command, record));
                    }
                }
                Some(MarshalCode::Info) => info!("{}", record.message()),
                _ => {
                    if report.files.is_empty() && record.contains_key("totalFileCount") {
                        let totals = take_totals(&mut record)?;
                        info!(files = totals.file_count, bytes = totals.file_size, "syncing");
                        report.totals = Some(totals);
                    }
                    report.files.push(SyncResult::try_from(record)?);
                }
            }
        }
        Ok(report)
    }

    /// File status.
    ///
    /// Paths the server does not know at all are collected into
    /// `local_paths` instead of failing the call.
    pub fn fstat(&self, filespecs: &[String], options: FstatOptions) -> Result<FstatReport, CoreError> {
        let mut command = args(&["fstat"]);
        if !options.include_deleted {
            command.extend(["-F".to_owned(), NOT_DELETED.to_owned()]);
        }
        command.extend(filespecs.iter().cloned());

        let mut report = FstatReport::default();
        for record in self.p4(&command, Severity::Warning)? {
            match record.code() {
                Some(MarshalCode::Error) => {
                    let (path, message) = split_feedback(record.message());
                    if message == NO_SUCH_FILE {
                        debug!(path, "not in depot");
                        report.local_paths.insert(path.to_owned());
                    } else {
                        return Err(command_failed(&command, record));
                    }
                }
                Some(MarshalCode::Info) => debug!(message = record.message(), "fstat feedback"),
                _ => report.files.push(FileStat::try_from(record)?),
            }
        }
        Ok(report)
    }

    /// All revisions of every matching file, one inner list per file.
    ///
    /// Revisions come in the order the server emitted them; no sorting is
    /// applied.
    pub fn filelog(
        &self,
        filespecs: &[String],
        options: FilelogOptions,
    ) -> Result<Vec<Vec<FileRevision>>, CoreError> {
        let mut command = args(&["filelog"]);
        if options.long_output {
            command.push("-l".to_owned());
        }
        if let Some(max) = options.max {
            command.extend(["-m".to_owned(), max.to_string()]);
        }
        command.extend(filespecs.iter().cloned());

        self.p4(&command, Severity::Empty)?
            .into_iter()
            .filter(is_structured)
            .map(|record| {
                extract_indexed_composite(record, &REVISION_KEY)
                    .into_values()
                    .map(FileRevision::try_from)
                    .collect::<Result<Vec<_>, _>>()
            })
            .collect()
    }

    // ── Session ──────────────────────────────────────────────────────

    /// Obtain a ticket for the connection's user.
    pub fn login(&self, password: &SecretString) -> Result<(), CoreError> {
        self.executor.login(&self.connection, password)?;
        info!(user = ?self.connection.user(), port = self.connection.port(), "logged in");
        Ok(())
    }

    /// Run any command and get the raw records back.
    pub fn run(&self, command: &[String], max_severity: Severity) -> Result<Vec<Record>, CoreError> {
        self.p4(command, max_severity)
    }
}

// ── Helpers ────────────────────────────────────────────────────────

fn args(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|s| (*s).to_owned()).collect()
}

/// `stat` records and anything without a recognized code.
fn is_structured(record: &Record) -> bool {
    !matches!(record.code(), Some(MarshalCode::Info | MarshalCode::Error))
}

fn first(records: Vec<Record>, command: &[String]) -> Result<Record, CoreError> {
    records.into_iter().next().ok_or_else(|| {
        CoreError::Internal(format!("`p4 {}` printed no records", command.join(" ")))
    })
}

/// `//depot/a.txt - no such file(s).` -> (`//depot/a.txt`, `no such file(s).`)
fn split_feedback(text: &str) -> (&str, &str) {
    match text.rsplit_once(" - ") {
        Some((path, message)) => (path.trim(), message.trim()),
        None => ("", text.trim()),
    }
}

fn command_failed(command: &[String], record: Record) -> CoreError {
    CoreError::CommandFailed {
        message: record.message().to_owned(),
        command: command.to_vec(),
        record: Some(record),
    }
}

fn take_totals(record: &mut Record) -> Result<SyncTotals, CoreError> {
    let mut count = |key: &str| -> Result<u64, CoreError> {
        match record.shift_remove(key) {
            Some(raw) => raw.trim().parse().map_err(|_| {
                CoreError::validation("SyncTotals", key, format!("unexpected value '{raw}'"))
            }),
            None => Ok(0),
        }
    };
    Ok(SyncTotals {
        file_count: count("totalFileCount")?,
        file_size: count("totalFileSize")?,
    })
}
