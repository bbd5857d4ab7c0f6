//! Server/command catalog.
//!
//! The catalog is the declarative description of what can be launched: the
//! servers, the commands attached to each server, commands attached to a
//! whole category, and global commands that target every server. The
//! dispatch engine only ever reads a snapshot of it; mutation goes through
//! [`editor`] followed by [`store::save`].

pub mod editor;
pub mod menu;
pub mod store;

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

pub const DEFAULT_CATEGORY: &str = "Uncategorized";

fn default_category() -> String {
    DEFAULT_CATEGORY.to_string()
}

/// A named shell snippet executed on the remote side.
///
/// `command` is opaque: it is never parsed or validated, only quoted for
/// transport.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct RemoteCommand {
    pub name: String,
    pub command: String,
    #[serde(default)]
    pub hold_terminal: bool,
}

impl RemoteCommand {
    pub fn new(name: impl Into<String>, command: impl Into<String>, hold_terminal: bool) -> Self {
        Self {
            name: name.into(),
            command: command.into(),
            hold_terminal,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Server {
    pub name: String,
    pub host: String,
    pub user: String,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default)]
    pub commands: Vec<RemoteCommand>,
}

impl Server {
    pub fn new(
        name: impl Into<String>,
        host: impl Into<String>,
        user: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            host: host.into(),
            user: user.into(),
            category: category.into(),
            commands: Vec::new(),
        }
    }

    /// `user@host`, the ssh destination.
    pub fn destination(&self) -> String {
        format!("{}@{}", self.user, self.host)
    }

    pub fn find_command(&self, name: &str) -> Option<&RemoteCommand> {
        self.commands.iter().find(|c| c.name == name)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    #[serde(default)]
    pub servers: Vec<Server>,
    #[serde(default)]
    pub global_commands: Vec<RemoteCommand>,
    #[serde(default)]
    pub category_commands: BTreeMap<String, Vec<RemoteCommand>>,
}

impl Catalog {
    /// Category names carried by at least one server, sorted by name.
    pub fn categories(&self) -> Vec<String> {
        self.servers
            .iter()
            .map(|s| s.category.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Servers currently carrying `category`, in catalog order.
    pub fn servers_in<'a>(&'a self, category: &'a str) -> impl Iterator<Item = &'a Server> + 'a {
        self.servers.iter().filter(move |s| s.category == category)
    }

    /// Commands attached to `category`; an unknown category has none.
    pub fn commands_for_category(&self, category: &str) -> &[RemoteCommand] {
        self.category_commands
            .get(category)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Finds a server by name. When `category` is given the lookup is scoped
    /// to it, which is the only unambiguous form when names repeat across
    /// categories.
    pub fn find_server(&self, name: &str, category: Option<&str>) -> Option<&Server> {
        self.servers
            .iter()
            .find(|s| s.name == name && category.map_or(true, |c| s.category == c))
    }

    pub fn find_global_command(&self, name: &str) -> Option<&RemoteCommand> {
        self.global_commands.iter().find(|c| c.name == name)
    }

    pub fn find_category_command(&self, category: &str, name: &str) -> Option<&RemoteCommand> {
        self.commands_for_category(category)
            .iter()
            .find(|c| c.name == name)
    }
}
