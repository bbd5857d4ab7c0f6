use crate::error::DispatchError;
use crate::ops::invocation::shell_quote;
use std::sync::Arc;

/// How a terminal program takes the thing it should run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Convention {
    /// Trailing arguments are a program and its argv, optionally after a
    /// marker flag (`-e`, `--`).
    Exec { flag: Option<&'static str> },
    /// The terminal takes one command string after `flag` and splits it
    /// itself, so the shell line has to be quoted into that string.
    ShellLine { flag: &'static str },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TerminalProgram {
    pub name: &'static str,
    pub convention: Convention,
}

pub const SUPPORTED_TERMINALS: &[TerminalProgram] = &[
    TerminalProgram {
        name: "konsole",
        convention: Convention::Exec { flag: Some("-e") },
    },
    TerminalProgram {
        name: "gnome-terminal",
        convention: Convention::Exec { flag: Some("--") },
    },
    TerminalProgram {
        name: "xfce4-terminal",
        convention: Convention::ShellLine { flag: "-e" },
    },
    TerminalProgram {
        name: "mate-terminal",
        convention: Convention::ShellLine { flag: "-e" },
    },
    TerminalProgram {
        name: "alacritty",
        convention: Convention::Exec { flag: Some("-e") },
    },
    TerminalProgram {
        name: "kitty",
        convention: Convention::Exec { flag: None },
    },
    TerminalProgram {
        name: "xterm",
        convention: Convention::Exec { flag: Some("-e") },
    },
];

/// Shell used inside the terminal; the hold trailer relies on bash `read`.
pub const WRAPPER_SHELL: &str = "bash";

impl TerminalProgram {
    pub fn lookup(name: &str) -> Option<Self> {
        SUPPORTED_TERMINALS.iter().copied().find(|t| t.name == name)
    }

    /// Arguments that make this terminal run `line` through `bash -c`.
    pub fn wrap(&self, line: &str) -> Vec<String> {
        match self.convention {
            Convention::Exec { flag } => {
                let mut args = Vec::with_capacity(4);
                if let Some(flag) = flag {
                    args.push(flag.to_string());
                }
                args.push(WRAPPER_SHELL.to_string());
                args.push("-c".to_string());
                args.push(line.to_string());
                args
            }
            Convention::ShellLine { flag } => vec![
                flag.to_string(),
                format!("{} -c {}", WRAPPER_SHELL, shell_quote(line)),
            ],
        }
    }
}

/// Answers whether an executable can be found.
pub trait ProgramLocator: Send + Sync {
    fn is_available(&self, program: &str) -> bool;
}

/// Looks programs up on `PATH`.
#[derive(Debug, Default, Clone, Copy)]
pub struct PathLocator;

impl ProgramLocator for PathLocator {
    fn is_available(&self, program: &str) -> bool {
        which::which(program).is_ok()
    }
}

/// Picks the first available terminal from a preference list.
#[derive(Clone)]
pub struct TerminalResolver {
    preference: Vec<TerminalProgram>,
    locator: Arc<dyn ProgramLocator>,
}

impl TerminalResolver {
    /// Unknown names are skipped with a warning.
    pub fn new(names: &[String], locator: Arc<dyn ProgramLocator>) -> Self {
        let preference = names
            .iter()
            .filter_map(|name| {
                let found = TerminalProgram::lookup(name.trim());
                if found.is_none() {
                    tracing::warn!(terminal = %name, "ignoring unsupported terminal program");
                }
                found
            })
            .collect();

        Self {
            preference,
            locator,
        }
    }

    pub fn preference(&self) -> &[TerminalProgram] {
        &self.preference
    }

    pub fn resolve(&self) -> Result<TerminalProgram, DispatchError> {
        self.preference
            .iter()
            .copied()
            .find(|t| self.locator.is_available(t.name))
            .ok_or_else(|| DispatchError::NoTerminalAvailable {
                tried: self.preference.iter().map(|t| t.name.to_string()).collect(),
            })
    }
}
