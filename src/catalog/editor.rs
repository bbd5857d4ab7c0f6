//! Catalog editing operations.
//!
//! These mirror the actions of the tree editor (add, edit, clone, move and
//! delete servers; add, edit and delete commands at server, category or
//! global scope). They only change the in-memory [`Catalog`]; callers
//! persist with [`super::store::save`].

use super::{Catalog, RemoteCommand, Server};
use crate::error::EditorError;
use std::fmt;

pub const CLONE_SUFFIX: &str = " (copy)";

/// Where a command lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandScope {
    Server {
        name: String,
        category: Option<String>,
    },
    Category(String),
    Global,
}

impl fmt::Display for CommandScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandScope::Server { name, .. } => write!(f, "server '{}'", name),
            CommandScope::Category(c) => write!(f, "category '{}'", c),
            CommandScope::Global => write!(f, "global commands"),
        }
    }
}

fn require(value: &str, field: &'static str) -> Result<(), EditorError> {
    if value.trim().is_empty() {
        Err(EditorError::EmptyField(field))
    } else {
        Ok(())
    }
}

/// ssh would take a value starting with '-' for an option.
fn reject_dash(value: &str, field: &'static str) -> Result<(), EditorError> {
    if value.trim_start().starts_with('-') {
        Err(EditorError::LeadingDash(field))
    } else {
        Ok(())
    }
}

fn validate_server(server: &Server) -> Result<(), EditorError> {
    require(&server.name, "server name")?;
    require(&server.host, "host")?;
    require(&server.user, "user")?;
    reject_dash(&server.host, "host")?;
    reject_dash(&server.user, "user")?;
    require(&server.category, "category")
}

fn validate_command(cmd: &RemoteCommand) -> Result<(), EditorError> {
    require(&cmd.name, "command name")?;
    require(&cmd.command, "command text")
}

impl Catalog {
    fn server_index(&self, name: &str, category: Option<&str>) -> Result<usize, EditorError> {
        self.servers
            .iter()
            .position(|s| s.name == name && category.map_or(true, |c| s.category == c))
            .ok_or_else(|| EditorError::UnknownServer(name.to_string()))
    }

    fn name_taken(&self, name: &str, category: &str, skip: Option<usize>) -> bool {
        self.servers
            .iter()
            .enumerate()
            .any(|(i, s)| Some(i) != skip && s.name == name && s.category == category)
    }

    pub fn add_server(&mut self, server: Server) -> Result<(), EditorError> {
        validate_server(&server)?;
        if self.name_taken(&server.name, &server.category, None) {
            return Err(EditorError::DuplicateServer {
                name: server.name,
                category: server.category,
            });
        }
        self.servers.push(server);
        Ok(())
    }

    /// Replaces a server's fields. The command list of `updated` is used
    /// as-is, so callers editing only connection details should copy the
    /// existing commands over first.
    pub fn update_server(
        &mut self,
        name: &str,
        category: Option<&str>,
        updated: Server,
    ) -> Result<(), EditorError> {
        validate_server(&updated)?;
        let idx = self.server_index(name, category)?;
        if self.name_taken(&updated.name, &updated.category, Some(idx)) {
            return Err(EditorError::DuplicateServer {
                name: updated.name,
                category: updated.category,
            });
        }
        self.servers[idx] = updated;
        Ok(())
    }

    pub fn remove_server(&mut self, name: &str, category: Option<&str>) -> Result<Server, EditorError> {
        let idx = self.server_index(name, category)?;
        Ok(self.servers.remove(idx))
    }

    /// Copies a server, commands included, under `"<name> (copy)"` in the
    /// same category. Returns the new name.
    pub fn clone_server(&mut self, name: &str, category: Option<&str>) -> Result<String, EditorError> {
        let idx = self.server_index(name, category)?;
        let mut copy = self.servers[idx].clone();
        copy.name.push_str(CLONE_SUFFIX);
        let new_name = copy.name.clone();
        self.add_server(copy)?;
        Ok(new_name)
    }

    pub fn move_server(
        &mut self,
        name: &str,
        from: Option<&str>,
        to: &str,
    ) -> Result<(), EditorError> {
        require(to, "category")?;
        let idx = self.server_index(name, from)?;
        if self.servers[idx].category == to {
            return Ok(());
        }
        if self.name_taken(name, to, Some(idx)) {
            return Err(EditorError::DuplicateServer {
                name: name.to_string(),
                category: to.to_string(),
            });
        }
        self.servers[idx].category = to.to_string();
        Ok(())
    }

    pub fn find_scoped_command(&self, scope: &CommandScope, name: &str) -> Option<&RemoteCommand> {
        match scope {
            CommandScope::Server {
                name: server,
                category,
            } => self
                .find_server(server, category.as_deref())?
                .find_command(name),
            CommandScope::Category(category) => self.find_category_command(category, name),
            CommandScope::Global => self.find_global_command(name),
        }
    }

    fn unknown_command(scope: &CommandScope, name: &str) -> EditorError {
        EditorError::UnknownCommand {
            scope: scope.to_string(),
            command: name.to_string(),
        }
    }

    /// Existing commands only; never creates a category entry.
    fn existing_commands_mut(
        &mut self,
        scope: &CommandScope,
        name: &str,
    ) -> Result<&mut Vec<RemoteCommand>, EditorError> {
        if let CommandScope::Category(category) = scope {
            if !self.category_commands.contains_key(category) {
                return Err(Self::unknown_command(scope, name));
            }
        }
        self.commands_mut(scope)
    }

    fn commands_mut(&mut self, scope: &CommandScope) -> Result<&mut Vec<RemoteCommand>, EditorError> {
        match scope {
            CommandScope::Server { name, category } => {
                let idx = self.server_index(name, category.as_deref())?;
                Ok(&mut self.servers[idx].commands)
            }
            CommandScope::Category(category) => {
                Ok(self.category_commands.entry(category.clone()).or_default())
            }
            CommandScope::Global => Ok(&mut self.global_commands),
        }
    }

    pub fn add_command(&mut self, scope: &CommandScope, cmd: RemoteCommand) -> Result<(), EditorError> {
        validate_command(&cmd)?;
        if let CommandScope::Category(c) = scope {
            require(c, "category")?;
        }
        let commands = self.commands_mut(scope)?;
        if commands.iter().any(|c| c.name == cmd.name) {
            return Err(EditorError::DuplicateCommand {
                scope: scope.to_string(),
                command: cmd.name,
            });
        }
        commands.push(cmd);
        Ok(())
    }

    pub fn update_command(
        &mut self,
        scope: &CommandScope,
        name: &str,
        updated: RemoteCommand,
    ) -> Result<(), EditorError> {
        validate_command(&updated)?;
        let commands = self.existing_commands_mut(scope, name)?;
        let idx = commands
            .iter()
            .position(|c| c.name == name)
            .ok_or_else(|| Self::unknown_command(scope, name))?;
        if commands
            .iter()
            .enumerate()
            .any(|(i, c)| i != idx && c.name == updated.name)
        {
            return Err(EditorError::DuplicateCommand {
                scope: scope.to_string(),
                command: updated.name,
            });
        }
        commands[idx] = updated;
        Ok(())
    }

    pub fn remove_command(&mut self, scope: &CommandScope, name: &str) -> Result<RemoteCommand, EditorError> {
        let commands = self.existing_commands_mut(scope, name)?;
        let removed = commands
            .iter()
            .position(|c| c.name == name)
            .map(|idx| commands.remove(idx));

        // Don't leave empty category entries behind.
        if let CommandScope::Category(category) = scope {
            if self
                .category_commands
                .get(category)
                .map_or(false, |cmds| cmds.is_empty())
            {
                self.category_commands.remove(category);
            }
        }

        removed.ok_or_else(|| Self::unknown_command(scope, name))
    }
}
