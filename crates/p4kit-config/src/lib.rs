//! Shared configuration for p4kit.
//!
//! TOML profiles layered with `P4KIT_*` environment variables, fallback to
//! the standard `P4PORT`/`P4USER`/`P4CLIENT` variables, and password
//! resolution (env + keyring + plaintext). The CLI adds flag overrides on
//! top.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use p4kit_core::{Connection, Runner};

/// Keyring service name.
const KEYRING_SERVICE: &str = "p4kit";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no server port for profile '{profile}' (set `port` or P4PORT)")]
    NoPort { profile: String },

    #[error("no password configured for profile '{profile}'")]
    NoPassword { profile: String },

    #[error("keyring error: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named server profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    /// `p4` binary to run. Looked up on `PATH` when unset.
    pub program: Option<PathBuf>,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            program: None,
        }
    }
}

fn default_output() -> String {
    "table".into()
}

/// A named server profile.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Profile {
    /// Server address (`host:port`, `ssl:host:port`, ...).
    pub port: String,

    /// Perforce user name.
    pub user: Option<String>,

    /// Client workspace name.
    pub client: Option<String>,

    /// Password (plaintext -- prefer keyring or env var).
    pub password: Option<String>,

    /// Environment variable name containing the password.
    pub password_env: Option<String>,

    /// Override the `p4` binary for this profile.
    pub program: Option<PathBuf>,
}

impl Profile {
    pub fn connection(&self) -> Connection {
        let mut connection = Connection::new(self.port.clone());
        if let Some(user) = &self.user {
            connection = connection.with_user(user.clone());
        }
        if let Some(client) = &self.client {
            connection = connection.with_client(client.clone());
        }
        connection
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "p4kit", "p4kit").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("p4kit");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from an explicit file. A missing file is not an error.
///
/// Environment keys nest on a double underscore:
/// `P4KIT_DEFAULTS__OUTPUT=json`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("P4KIT_").split("__"));

    let config: Config = figment.extract()?;
    debug!(path = %path.display(), profiles = config.profiles.len(), "config loaded");
    Ok(config)
}

/// Load config, returning a default if the file doesn't exist or is broken.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Connection resolution ───────────────────────────────────────────

/// Name of the profile to use: explicit, else the configured default.
pub fn active_profile_name<'a>(config: &'a Config, requested: Option<&'a str>) -> &'a str {
    requested
        .or(config.default_profile.as_deref())
        .unwrap_or("default")
}

/// Build a connection from the standard Perforce variables, read through
/// `lookup`. `None` without `P4PORT`.
pub fn connection_from_vars(lookup: impl Fn(&str) -> Option<String>) -> Option<Connection> {
    let mut connection = Connection::new(lookup("P4PORT")?);
    if let Some(user) = lookup("P4USER") {
        connection = connection.with_user(user);
    }
    if let Some(client) = lookup("P4CLIENT") {
        connection = connection.with_client(client);
    }
    Some(connection)
}

/// The profile's connection when it exists, else the process environment.
pub fn resolve_connection(config: &Config, profile_name: &str) -> Result<Connection, ConfigError> {
    if let Some(profile) = config.profiles.get(profile_name) {
        if profile.port.trim().is_empty() {
            return Err(ConfigError::NoPort {
                profile: profile_name.into(),
            });
        }
        return Ok(profile.connection());
    }
    connection_from_vars(|name| std::env::var(name).ok()).ok_or_else(|| ConfigError::NoPort {
        profile: profile_name.into(),
    })
}

/// The runner for a profile: profile program, then default program, then
/// `p4` on `PATH`.
pub fn runner_for(config: &Config, profile_name: &str) -> Runner {
    config
        .profiles
        .get(profile_name)
        .and_then(|p| p.program.clone())
        .or_else(|| config.defaults.program.clone())
        .map_or_else(Runner::new, Runner::with_program)
}

// ── Password resolution ─────────────────────────────────────────────

/// Resolve the password from the credential chain, no CLI prompt.
pub fn resolve_password(
    profile: Option<&Profile>,
    profile_name: &str,
) -> Result<SecretString, ConfigError> {
    resolve_password_with(profile, profile_name, |name| std::env::var(name).ok())
}

/// [`resolve_password`] with an explicit environment lookup.
pub fn resolve_password_with(
    profile: Option<&Profile>,
    profile_name: &str,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<SecretString, ConfigError> {
    // 1. Profile's password_env -> env var lookup
    if let Some(val) = profile
        .and_then(|p| p.password_env.as_deref())
        .and_then(&lookup)
    {
        return Ok(SecretString::from(val));
    }

    // 2. Standard Perforce variable
    if let Some(val) = lookup("P4PASSWD") {
        return Ok(SecretString::from(val));
    }

    // 3. System keyring
    if let Ok(entry) = keyring::Entry::new(KEYRING_SERVICE, &keyring_account(profile_name)) {
        if let Ok(secret) = entry.get_password() {
            return Ok(SecretString::from(secret));
        }
    }

    // 4. Plaintext in config
    if let Some(pw) = profile.and_then(|p| p.password.clone()) {
        return Ok(SecretString::from(pw));
    }

    Err(ConfigError::NoPassword {
        profile: profile_name.into(),
    })
}

/// Store a password in the system keyring for a profile.
pub fn store_password(profile_name: &str, password: &SecretString) -> Result<(), ConfigError> {
    let entry = keyring::Entry::new(KEYRING_SERVICE, &keyring_account(profile_name))?;
    entry.set_password(password.expose_secret())?;
    Ok(())
}

fn keyring_account(profile_name: &str) -> String {
    format!("{profile_name}/password")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn vars(pairs: &'static [(&'static str, &'static str)]) -> impl Fn(&str) -> Option<String> {
        move |name| {
            pairs
                .iter()
                .find(|(k, _)| *k == name)
                .map(|(_, v)| (*v).to_owned())
        }
    }

    #[test]
    fn loads_profiles_from_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
default_profile = "work"

[defaults]
output = "json"
program = "/opt/p4/bin/p4"

[profiles.work]
port = "ssl:perforce.example.com:1666"
user = "alice"
client = "alice-ws"
password_env = "WORK_P4PASSWD"
"#,
        )
        .unwrap();

        let config = load_config_from(&path).unwrap();
        let work = &config.profiles["work"];

        assert_eq!(active_profile_name(&config, None), "work");
        assert_eq!(config.defaults.output, "json");
        assert_eq!(work.connection().to_string(), "alice@ssl:perforce.example.com:1666 (alice-ws)");
        assert_eq!(
            runner_for(&config, "work").program(),
            Path::new("/opt/p4/bin/p4")
        );
    }

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.default_profile.as_deref(), Some("default"));
        assert_eq!(config.defaults.output, "table");
        assert_eq!(runner_for(&config, "default").program(), Path::new("p4"));
    }

    #[test]
    fn save_then_load_keeps_profiles() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut config = Config::default();
        config.profiles.insert(
            "default".into(),
            Profile {
                port: "localhost:1666".into(),
                user: Some("bob".into()),
                ..Profile::default()
            },
        );

        save_config_to(&config, &path).unwrap();
        let loaded = load_config_from(&path).unwrap();

        assert_eq!(loaded.profiles["default"].port, "localhost:1666");
        assert_eq!(loaded.profiles["default"].user.as_deref(), Some("bob"));
    }

    #[test]
    fn standard_variables_build_connection() {
        let conn = connection_from_vars(vars(&[
            ("P4PORT", "localhost:1666"),
            ("P4USER", "carol"),
        ]))
        .unwrap();
        assert_eq!(conn.port(), "localhost:1666");
        assert_eq!(conn.user(), Some("carol"));
        assert_eq!(conn.client(), None);

        assert!(connection_from_vars(vars(&[("P4USER", "carol")])).is_none());
    }

    #[test]
    fn empty_profile_port_is_rejected() {
        let mut config = Config::default();
        config.profiles.insert("blank".into(), Profile::default());
        assert!(matches!(
            resolve_connection(&config, "blank").unwrap_err(),
            ConfigError::NoPort { .. }
        ));
    }

    #[test]
    fn password_env_wins_over_p4passwd() {
        let profile = Profile {
            port: "localhost:1666".into(),
            password_env: Some("WORK_PW".into()),
            password: Some("plain".into()),
            ..Profile::default()
        };
        let secret = resolve_password_with(
            Some(&profile),
            "work",
            vars(&[("WORK_PW", "from-env"), ("P4PASSWD", "standard")]),
        )
        .unwrap();
        assert_eq!(secret.expose_secret(), "from-env");
    }

    #[test]
    fn p4passwd_is_used_without_profile() {
        let secret = resolve_password_with(None, "default", vars(&[("P4PASSWD", "standard")])).unwrap();
        assert_eq!(secret.expose_secret(), "standard");
    }
}
