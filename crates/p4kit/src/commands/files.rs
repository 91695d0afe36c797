//! File command handlers: open/revert, opened, sync, fstat, filelog.

use serde::Serialize;
use tabled::Tabled;

use p4kit_core::{
    ActionMessage, ActionOptions, ActionResult, FileRevision, FileStat, FilelogOptions,
    FstatOptions, FstatReport, OpenedFile, Perforce, SyncOptions, SyncReport, SyncResult,
};

use crate::cli::{ActionArgs, FilelogArgs, FstatArgs, GlobalOpts, OutputFormat, SyncArgs};
use crate::error::CliError;
use crate::output;

/// The file operations sharing [`ActionArgs`].
#[derive(Debug, Clone, Copy)]
pub enum Action {
    Add,
    Edit,
    Delete,
    Revert,
}

/// Structured output for add/edit/delete/revert.
#[derive(Serialize)]
struct ActionReport<'a> {
    messages: &'a [ActionMessage],
    results: &'a [ActionResult],
}

// ── Table rows ──────────────────────────────────────────────────────

#[derive(Tabled)]
struct ActionRow {
    #[tabled(rename = "Action")]
    action: String,
    #[tabled(rename = "Depot File")]
    depot_file: String,
    #[tabled(rename = "Rev")]
    work_rev: String,
    #[tabled(rename = "Type")]
    file_type: String,
}

impl From<&ActionResult> for ActionRow {
    fn from(r: &ActionResult) -> Self {
        Self {
            action: r.action.clone(),
            depot_file: r.depot_file.clone(),
            work_rev: r.work_rev.map(|n| format!("#{n}")).unwrap_or_default(),
            file_type: r.file_type.clone().unwrap_or_default(),
        }
    }
}

#[derive(Tabled)]
struct OpenedRow {
    #[tabled(rename = "Depot File")]
    depot_file: String,
    #[tabled(rename = "Rev")]
    revision: String,
    #[tabled(rename = "Action")]
    action: String,
    #[tabled(rename = "Change")]
    change: String,
    #[tabled(rename = "Type")]
    file_type: String,
}

impl From<&OpenedFile> for OpenedRow {
    fn from(f: &OpenedFile) -> Self {
        Self {
            depot_file: f.depot_file.clone(),
            revision: format!("#{}", f.revision),
            action: f.action.to_string(),
            change: f.change.to_string(),
            file_type: f.file_type.clone(),
        }
    }
}

#[derive(Tabled)]
struct SyncRow {
    #[tabled(rename = "Action")]
    action: String,
    #[tabled(rename = "Depot File")]
    depot_file: String,
    #[tabled(rename = "Rev")]
    revision: String,
    #[tabled(rename = "Size")]
    file_size: String,
}

impl From<&SyncResult> for SyncRow {
    fn from(r: &SyncResult) -> Self {
        Self {
            action: r.action.clone(),
            depot_file: r.depot_file.clone(),
            revision: format!("#{}", r.revision),
            file_size: r.file_size.map(|n| n.to_string()).unwrap_or_default(),
        }
    }
}

#[derive(Tabled)]
struct StatRow {
    #[tabled(rename = "Depot File")]
    depot_file: String,
    #[tabled(rename = "Have")]
    have: String,
    #[tabled(rename = "Head")]
    head: String,
    #[tabled(rename = "Head Action")]
    head_action: String,
    #[tabled(rename = "Opened By")]
    others: String,
}

impl From<&FileStat> for StatRow {
    fn from(s: &FileStat) -> Self {
        Self {
            depot_file: s.depot_file.clone(),
            have: s.have_rev.map(|n| format!("#{n}")).unwrap_or_default(),
            head: s
                .head
                .as_ref()
                .map(|h| format!("#{}", h.revision))
                .unwrap_or_default(),
            head_action: s
                .head
                .as_ref()
                .map(|h| h.action.to_string())
                .unwrap_or_default(),
            others: s
                .others_open
                .iter()
                .map(|o| format!("{}@{}", o.user, o.client))
                .collect::<Vec<_>>()
                .join(", "),
        }
    }
}

#[derive(Tabled)]
struct RevisionRow {
    #[tabled(rename = "Depot File")]
    depot_file: String,
    #[tabled(rename = "Rev")]
    revision: String,
    #[tabled(rename = "Change")]
    change: u32,
    #[tabled(rename = "Action")]
    action: String,
    #[tabled(rename = "Date")]
    time: String,
    #[tabled(rename = "User")]
    user: String,
    #[tabled(rename = "Description")]
    description: String,
}

impl From<&FileRevision> for RevisionRow {
    fn from(r: &FileRevision) -> Self {
        Self {
            depot_file: r.depot_file.clone(),
            revision: format!("#{}", r.revision),
            change: r.change,
            action: r.action.to_string(),
            time: output::format_time(&r.time),
            user: r.user.clone(),
            description: output::first_line(&r.description),
        }
    }
}

// ── Handlers ────────────────────────────────────────────────────────

pub fn handle_action(
    p4: &Perforce,
    action: Action,
    args: ActionArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let options = ActionOptions {
        changelist: args.changelist,
        preview: args.preview,
    };
    let (messages, results) = match action {
        Action::Add => p4.add(&args.files, options),
        Action::Edit => p4.edit(&args.files, options),
        Action::Delete => p4.delete(&args.files, options),
        Action::Revert => p4.revert(&args.files, options),
    }?;

    let format = global.format();
    if format == OutputFormat::Table || format == OutputFormat::Plain {
        output::print_messages(&messages, output::should_color(&global.color), global.quiet);
        let out = output::render_list(
            &format,
            &results,
            |r| ActionRow::from(r),
            |r| r.depot_file.clone(),
        )?;
        output::print_output(&out, global.quiet);
        return Ok(());
    }

    let report = ActionReport {
        messages: &messages,
        results: &results,
    };
    let out = output::render_single(&format, &report, |_| String::new(), |_| String::new())?;
    output::print_output(&out, global.quiet);
    Ok(())
}

pub fn handle_opened(
    p4: &Perforce,
    files: &[String],
    changelist: Option<u32>,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let opened = p4.opened(files, changelist)?;
    let out = output::render_list(
        &global.format(),
        &opened,
        |f| OpenedRow::from(f),
        |f| f.depot_file.clone(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}

pub fn handle_sync(p4: &Perforce, args: SyncArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let options = SyncOptions {
        force: args.force,
        preview: args.preview,
    };
    let report = p4.sync(&args.files, options)?;

    let format = global.format();
    let out = match format {
        OutputFormat::Table | OutputFormat::Plain => {
            let mut out = output::render_list(
                &format,
                &report.files,
                |r| SyncRow::from(r),
                |r| r.depot_file.clone(),
            )?;
            if format == OutputFormat::Table {
                if !out.is_empty() {
                    out.push('\n');
                }
                out.push_str(&sync_summary(&report));
            }
            out
        }
        _ => output::render_single(&format, &report, sync_summary, |_| String::new())?,
    };
    output::print_output(&out, global.quiet);
    Ok(())
}

fn sync_summary(report: &SyncReport) -> String {
    match &report.totals {
        Some(totals) => format!(
            "{} file(s), {} bytes",
            totals.file_count, totals.file_size
        ),
        None if report.files.is_empty() => "up to date".into(),
        None => format!("{} file(s)", report.files.len()),
    }
}

pub fn handle_fstat(p4: &Perforce, args: FstatArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let options = FstatOptions {
        include_deleted: args.deleted,
    };
    let report = p4.fstat(&args.files, options)?;

    let format = global.format();
    let out = match format {
        OutputFormat::Table | OutputFormat::Plain => {
            let mut lines = vec![output::render_list(
                &format,
                &report.files,
                |s| StatRow::from(s),
                |s| s.depot_file.clone(),
            )?];
            lines.extend(local_lines(&report, &format));
            lines.retain(|l| !l.is_empty());
            lines.join("\n")
        }
        _ => output::render_single(&format, &report, |_| String::new(), |_| String::new())?,
    };
    output::print_output(&out, global.quiet);
    Ok(())
}

fn local_lines(report: &FstatReport, format: &OutputFormat) -> Vec<String> {
    report
        .local_paths
        .iter()
        .map(|path| match format {
            OutputFormat::Plain => path.clone(),
            _ => format!("{path} (not in depot)"),
        })
        .collect()
}

pub fn handle_filelog(
    p4: &Perforce,
    args: FilelogArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let options = FilelogOptions {
        long_output: args.long,
        max: args.max,
    };
    let history = p4.filelog(&args.files, options)?;

    let format = global.format();
    let out = match format {
        OutputFormat::Table | OutputFormat::Plain => {
            let revisions: Vec<&FileRevision> = history.iter().flatten().collect();
            output::render_list(
                &format,
                &revisions,
                |r| RevisionRow::from(*r),
                |r| format!("{}#{}", r.depot_file, r.revision),
            )?
        }
        _ => output::render_single(&format, &history, |_| String::new(), |_| String::new())?,
    };
    output::print_output(&out, global.quiet);
    Ok(())
}
