//! User command handlers.

use tabled::Tabled;

use p4kit_core::{Perforce, User};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct UserRow {
    #[tabled(rename = "User")]
    name: String,
    #[tabled(rename = "Email")]
    email: String,
    #[tabled(rename = "Full Name")]
    full_name: String,
    #[tabled(rename = "Type")]
    user_type: String,
    #[tabled(rename = "Last Access")]
    access: String,
}

impl From<&User> for UserRow {
    fn from(u: &User) -> Self {
        Self {
            name: u.name.clone(),
            email: u.email.clone(),
            full_name: u.full_name.clone(),
            user_type: u.user_type.to_string(),
            access: output::format_time(&u.access),
        }
    }
}

fn detail(u: &User) -> String {
    [
        format!("User:      {}", u.name),
        format!("Email:     {}", u.email),
        format!("FullName:  {}", u.full_name),
        format!("Type:      {}", u.user_type),
        format!(
            "Auth:      {}",
            u.auth_method.map_or_else(|| "-".into(), |m| m.to_string())
        ),
        format!("Access:    {}", output::format_time(&u.access)),
        format!("Update:    {}", output::format_time(&u.update)),
    ]
    .join("\n")
}

// ── Handlers ────────────────────────────────────────────────────────

pub fn handle_one(p4: &Perforce, name: &str, global: &GlobalOpts) -> Result<(), CliError> {
    let user = p4.user(name)?;
    let out = output::render_single(&global.format(), &user, detail, |u| u.name.clone())?;
    output::print_output(&out, global.quiet);
    Ok(())
}

pub fn handle_list(
    p4: &Perforce,
    patterns: &[String],
    max: Option<u32>,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let users = p4.users(patterns, max)?;
    let out = output::render_list(
        &global.format(),
        &users,
        |u| UserRow::from(u),
        |u| u.name.clone(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}
