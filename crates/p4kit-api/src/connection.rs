// Connection descriptor
//
// The `P4PORT` / `P4USER` / `P4CLIENT` triple every invocation is
// parameterized with. Built once per session and never mutated.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Where and as whom to run `p4` commands.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Connection {
    port: String,
    user: Option<String>,
    client: Option<String>,
}

impl Connection {
    /// A connection to `port` (`host:port`, optionally with a protocol prefix).
    pub fn new(port: impl Into<String>) -> Self {
        Self {
            port: port.into(),
            user: None,
            client: None,
        }
    }

    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    pub fn with_client(mut self, client: impl Into<String>) -> Self {
        self.client = Some(client.into());
        self
    }

    /// Server address (`P4PORT`).
    pub fn port(&self) -> &str {
        &self.port
    }

    /// Server user name (`P4USER`).
    pub fn user(&self) -> Option<&str> {
        self.user.as_deref()
    }

    /// Client workspace name (`P4CLIENT`).
    pub fn client(&self) -> Option<&str> {
        self.client.as_deref()
    }
}

impl fmt::Display for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(user) = &self.user {
            write!(f, "{user}@")?;
        }
        f.write_str(&self.port)?;
        if let Some(client) = &self.client {
            write!(f, " ({client})")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_sets_optional_parts() {
        let conn = Connection::new("ssl:perforce:1666")
            .with_user("alice")
            .with_client("alice-ws");
        assert_eq!(conn.port(), "ssl:perforce:1666");
        assert_eq!(conn.user(), Some("alice"));
        assert_eq!(conn.client(), Some("alice-ws"));
    }

    #[test]
    fn display_includes_known_parts() {
        assert_eq!(Connection::new("localhost:1666").to_string(), "localhost:1666");
        assert_eq!(
            Connection::new("localhost:1666")
                .with_user("bob")
                .with_client("ws")
                .to_string(),
            "bob@localhost:1666 (ws)"
        );
    }
}
