//! CLI configuration: thin wrapper around `p4kit_config`.
//!
//! Adds resolution that respects `GlobalOpts` overrides (`--port`,
//! `--user`, `--client`) on top of profiles and the P4 variables.

use p4kit_config::{Config, ConfigError, Profile};
use p4kit_core::{Connection, Perforce};

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// A ready-to-use client plus the profile it came from.
pub struct Session {
    pub perforce: Perforce,
    pub profile: String,
    /// The profile's settings, when it exists in the config file.
    pub settings: Option<Profile>,
}

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    p4kit_config::active_profile_name(config, global.profile.as_deref()).to_owned()
}

/// Build the client for this invocation. Flags win over the profile, the
/// profile wins over `P4PORT`/`P4USER`/`P4CLIENT`.
pub fn session(global: &GlobalOpts, config: &Config) -> Result<Session, CliError> {
    let profile = active_profile_name(global, config);
    let base = match p4kit_config::resolve_connection(config, &profile) {
        Ok(connection) => Some(connection),
        Err(ConfigError::NoPort { .. }) if global.port.is_some() => None,
        Err(err) => return Err(err.into()),
    };
    let connection = apply_overrides(base, global).ok_or_else(|| CliError::NoPort {
        profile: profile.clone(),
        path: p4kit_config::config_path().display().to_string(),
    })?;

    tracing::debug!(%connection, profile = %profile, "resolved connection");
    let runner = p4kit_config::runner_for(config, &profile);
    Ok(Session {
        perforce: Perforce::with_executor(connection, runner),
        settings: config.profiles.get(&profile).cloned(),
        profile,
    })
}

fn apply_overrides(base: Option<Connection>, global: &GlobalOpts) -> Option<Connection> {
    let port = global
        .port
        .clone()
        .or_else(|| base.as_ref().map(|c| c.port().to_owned()))?;
    let user = global
        .user
        .clone()
        .or_else(|| base.as_ref().and_then(|c| c.user()).map(str::to_owned));
    let client = global
        .client
        .clone()
        .or_else(|| base.as_ref().and_then(|c| c.client()).map(str::to_owned));

    let mut connection = Connection::new(port);
    if let Some(user) = user {
        connection = connection.with_user(user);
    }
    if let Some(client) = client {
        connection = connection.with_client(client);
    }
    Some(connection)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{ColorMode, GlobalOpts};

    fn global() -> GlobalOpts {
        GlobalOpts {
            profile: None,
            port: None,
            user: None,
            client: None,
            output: None,
            color: ColorMode::Never,
            verbose: 0,
            quiet: false,
        }
    }

    #[test]
    fn flags_replace_profile_values() {
        let base = Connection::new("ssl:p4:1666")
            .with_user("alice")
            .with_client("alice-ws");
        let mut opts = global();
        opts.client = Some("build-ws".into());

        let connection = apply_overrides(Some(base), &opts);
        assert_eq!(
            connection,
            Some(
                Connection::new("ssl:p4:1666")
                    .with_user("alice")
                    .with_client("build-ws")
            )
        );
    }

    #[test]
    fn port_flag_stands_alone() {
        let mut opts = global();
        opts.port = Some("localhost:1666".into());
        opts.user = Some("bob".into());

        let connection = apply_overrides(None, &opts);
        assert_eq!(
            connection,
            Some(Connection::new("localhost:1666").with_user("bob"))
        );
    }

    #[test]
    fn nothing_to_connect_to() {
        assert_eq!(apply_overrides(None, &global()), None);
    }
}
