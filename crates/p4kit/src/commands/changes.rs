//! Changelist command handlers.

use tabled::Tabled;

use p4kit_core::{Changelist, ChangelistSummary, ChangesRequest, Perforce};

use crate::cli::{ChangesArgs, GlobalOpts};
use crate::error::CliError;
use crate::output;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct ChangeRow {
    #[tabled(rename = "Change")]
    change: u32,
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "User")]
    user: String,
    #[tabled(rename = "Client")]
    client: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Description")]
    description: String,
}

impl From<&ChangelistSummary> for ChangeRow {
    fn from(c: &ChangelistSummary) -> Self {
        Self {
            change: c.change,
            date: output::format_time(&c.date),
            user: c.user.clone(),
            client: c.client.clone(),
            status: c.status.to_string(),
            description: output::first_line(&c.description),
        }
    }
}

fn detail(c: &Changelist) -> String {
    let mut lines = vec![
        format!(
            "Change:      {}",
            c.change.map_or_else(|| "new".into(), |n| n.to_string())
        ),
        format!("Date:        {}", output::format_optional_time(c.date.as_ref())),
        format!("Client:      {}", c.client),
        format!("User:        {}", c.user),
        format!("Status:      {}", c.status),
        format!("Type:        {}", c.change_type),
    ];
    if let Some(time) = &c.shelve_update {
        lines.push(format!("Shelved:     {}", output::format_time(time)));
    }
    lines.push("Description:".into());
    lines.extend(c.description.lines().map(|l| format!("  {l}")));
    if !c.files.is_empty() {
        lines.push("Files:".into());
        lines.extend(c.files.iter().map(|f| format!("  {f}")));
    }
    lines.join("\n")
}

fn summary_detail(c: &ChangelistSummary) -> String {
    format!(
        "Change {} created by {}@{} on {}\n  {}",
        c.change,
        c.user,
        c.client,
        output::format_time(&c.date),
        output::first_line(&c.description),
    )
}

// ── Handlers ────────────────────────────────────────────────────────

pub fn handle_one(p4: &Perforce, change: u32, global: &GlobalOpts) -> Result<(), CliError> {
    let changelist = p4.change(change)?;
    let out = output::render_single(&global.format(), &changelist, detail, |c| {
        c.change.map(|n| n.to_string()).unwrap_or_default()
    })?;
    output::print_output(&out, global.quiet);
    Ok(())
}

pub fn handle_list(p4: &Perforce, args: ChangesArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let request = ChangesRequest {
        user: args.owner,
        status: args.status,
        max: args.max,
        long_output: args.long,
        filespecs: args.files,
    };
    let changes = p4.changes(&request)?;
    let out = output::render_list(
        &global.format(),
        &changes,
        |c| ChangeRow::from(c),
        |c| c.change.to_string(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}

pub fn handle_new(p4: &Perforce, description: &str, global: &GlobalOpts) -> Result<(), CliError> {
    if description.trim().is_empty() {
        return Err(CliError::Validation {
            field: "description".into(),
            reason: "a changelist needs a description".into(),
        });
    }
    let created = p4.create_changelist(description)?;
    let out = output::render_single(&global.format(), &created, summary_detail, |c| {
        c.change.to_string()
    })?;
    output::print_output(&out, global.quiet);
    Ok(())
}
