//! Command dispatch: bridges CLI args -> core operations -> output formatting.

pub mod changes;
pub mod files;
pub mod login;
pub mod run;
pub mod users;
pub mod workspace;

use crate::cli::{Command, GlobalOpts};
use crate::config::Session;
use crate::error::CliError;

/// Dispatch a server-bound command to the appropriate handler.
pub fn dispatch(cmd: Command, session: &Session, global: &GlobalOpts) -> Result<(), CliError> {
    let p4 = &session.perforce;
    match cmd {
        Command::User { name } => users::handle_one(p4, &name, global),
        Command::Users { patterns, max } => users::handle_list(p4, &patterns, max, global),
        Command::Workspace { name } => workspace::handle(p4, &name, global),
        Command::Change { change } => changes::handle_one(p4, change, global),
        Command::Changes(args) => changes::handle_list(p4, args, global),
        Command::NewChange { description } => changes::handle_new(p4, &description, global),
        Command::Add(args) => files::handle_action(p4, files::Action::Add, args, global),
        Command::Edit(args) => files::handle_action(p4, files::Action::Edit, args, global),
        Command::Delete(args) => files::handle_action(p4, files::Action::Delete, args, global),
        Command::Revert(args) => files::handle_action(p4, files::Action::Revert, args, global),
        Command::Opened { files, changelist } => {
            files::handle_opened(p4, &files, changelist, global)
        }
        Command::Sync(args) => files::handle_sync(p4, args, global),
        Command::Fstat(args) => files::handle_fstat(p4, args, global),
        Command::Filelog(args) => files::handle_filelog(p4, args, global),
        Command::Login(args) => login::handle(session, args, global),
        Command::Run(args) => run::handle(p4, args, global),
        Command::Completions(_) => Err(CliError::Validation {
            field: "command".into(),
            reason: "completions do not need a server".into(),
        }),
    }
}
