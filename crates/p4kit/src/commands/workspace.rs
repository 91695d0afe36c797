//! Workspace command handler.

use std::fmt::Write;

use p4kit_core::{Perforce, Workspace};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

fn detail(w: &Workspace) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Client:        {}", w.name);
    let _ = writeln!(out, "Owner:         {}", w.owner);
    let _ = writeln!(out, "Host:          {}", if w.host.is_empty() { "-" } else { &w.host });
    let _ = writeln!(out, "Root:          {}", w.root.display());
    let _ = writeln!(out, "Options:       {}", w.options);
    let _ = writeln!(out, "SubmitOptions: {}", w.submit_options);
    let _ = writeln!(out, "Type:          {}", w.workspace_type);
    if let Some(stream) = &w.stream {
        let _ = writeln!(out, "Stream:        {stream}");
    }
    let _ = writeln!(out, "Access:        {}", output::format_time(&w.access));
    let _ = writeln!(out, "Update:        {}", output::format_time(&w.update));
    let _ = writeln!(out, "Description:   {}", output::first_line(&w.description));
    let _ = writeln!(out, "View:");
    for view in &w.views {
        let _ = writeln!(out, "  {view}");
    }
    out.trim_end().to_owned()
}

pub fn handle(p4: &Perforce, name: &str, global: &GlobalOpts) -> Result<(), CliError> {
    let workspace = p4.workspace(name)?;
    let out = output::render_single(&global.format(), &workspace, detail, |w| w.name.clone())?;
    output::print_output(&out, global.quiet);
    Ok(())
}
