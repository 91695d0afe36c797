//! Login command handler.

use secrecy::SecretString;

use p4kit_config::ConfigError;

use crate::cli::{GlobalOpts, LoginArgs};
use crate::config::Session;
use crate::error::CliError;
use crate::output;

/// Map a terminal prompt failure into CliError.
fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

fn prompt_password(session: &Session) -> Result<SecretString, CliError> {
    let connection = session.perforce.connection();
    let label = format!(
        "Password for {}@{}: ",
        connection.user().unwrap_or("(default user)"),
        connection.port()
    );
    let secret = rpassword::prompt_password(label).map_err(prompt_err)?;
    if secret.is_empty() {
        return Err(CliError::Validation {
            field: "password".into(),
            reason: "value cannot be empty".into(),
        });
    }
    Ok(SecretString::from(secret))
}

pub fn handle(session: &Session, args: LoginArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let prompted = args.prompt || args.save;
    let password = if prompted {
        prompt_password(session)?
    } else {
        match p4kit_config::resolve_password(session.settings.as_ref(), &session.profile) {
            Ok(password) => password,
            Err(ConfigError::NoPassword { .. }) => prompt_password(session)?,
            Err(err) => return Err(err.into()),
        }
    };

    session
        .perforce
        .login(&password)
        .map_err(|err| match CliError::from(err) {
            CliError::AuthFailed { message, .. } => CliError::AuthFailed {
                message,
                profile: session.profile.clone(),
            },
            other => other,
        })?;

    if args.save {
        p4kit_config::store_password(&session.profile, &password)?;
        tracing::info!(profile = %session.profile, "password stored in keyring");
    }

    let connection = session.perforce.connection();
    let out = format!(
        "Logged in to {} as {}",
        connection.port(),
        connection.user().unwrap_or("(default user)")
    );
    output::print_output(&out, global.quiet);
    Ok(())
}
