use crate::catalog::{RemoteCommand, Server};
use crate::config::AppConfig;

/// Wraps `value` in single quotes for a POSIX shell. Embedded quotes are
/// closed, escaped and reopened (`'\''`).
pub fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "'\\''"))
}

fn is_shell_safe(value: &str) -> bool {
    !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "@._-:%+=,/".contains(c))
}

/// Quotes only when the shell would otherwise split or expand `value`.
pub fn quote_if_needed(value: &str) -> String {
    if is_shell_safe(value) {
        value.to_string()
    } else {
        shell_quote(value)
    }
}

/// Builds the local shell line that opens the remote session.
///
/// The line is meant for `bash -c` inside a terminal window:
/// `ssh [-p PORT] user@host '<command>'`, followed by a local
/// wait-for-keypress when the command asks for the terminal to be held.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationBuilder {
    client: String,
    port: u16,
    hold_prompt: String,
}

impl InvocationBuilder {
    pub fn new(client: impl Into<String>, port: u16, hold_prompt: impl Into<String>) -> Self {
        Self {
            client: client.into(),
            port,
            hold_prompt: hold_prompt.into(),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(&config.ssh_client, config.ssh_port, &config.hold_prompt)
    }

    /// Runs locally after ssh returns; blocks until a key is pressed.
    pub fn hold_trailer(&self) -> String {
        format!("; echo; read -r -n 1 -s -p {}", shell_quote(&self.hold_prompt))
    }

    pub fn build(&self, user: &str, host: &str, command: &RemoteCommand) -> String {
        let mut line = self.client.clone();
        if self.port != 22 {
            line.push_str(&format!(" -p {}", self.port));
        }
        let destination = format!("{}@{}", user, host);
        // ssh would read a destination starting with '-' as an option.
        if destination.starts_with('-') {
            line.push_str(" --");
        }
        line.push(' ');
        line.push_str(&quote_if_needed(&destination));
        line.push(' ');
        line.push_str(&shell_quote(&command.command));

        if command.hold_terminal {
            line.push_str(&self.hold_trailer());
        }

        tracing::debug!(%user, %host, command = %command.name, invocation = %line, "built invocation");
        line
    }

    pub fn for_server(&self, server: &Server, command: &RemoteCommand) -> String {
        self.build(&server.user, &server.host, command)
    }
}

impl Default for InvocationBuilder {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}
