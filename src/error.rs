use std::path::PathBuf;
use thiserror::Error;

/// Failures of a single launch. Never fatal to the process.
#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("no terminal program available (tried: {})", tried.join(", "))]
    NoTerminalAvailable { tried: Vec<String> },

    #[error("failed to start terminal '{terminal}': {source}")]
    Spawn {
        terminal: String,
        #[source]
        source: std::io::Error,
    },
}

/// Which provisioning step failed.
#[derive(Error, Debug)]
pub enum ProvisionError {
    #[error("key generation failed: {0}")]
    KeyGeneration(String),

    #[error("key installation on {target} failed: {reason}")]
    Installation { target: String, reason: String },
}

impl ProvisionError {
    pub fn step(&self) -> &'static str {
        match self {
            ProvisionError::KeyGeneration(_) => "key-generation",
            ProvisionError::Installation { .. } => "installation",
        }
    }
}

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("failed to read catalog {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse catalog {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("failed to serialize catalog: {0}")]
    Serialize(#[source] serde_yaml::Error),

    #[error("failed to write catalog {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Validation failures raised by catalog editing operations.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum EditorError {
    #[error("server '{name}' already exists in category '{category}'")]
    DuplicateServer { name: String, category: String },

    #[error("server '{0}' not found")]
    UnknownServer(String),

    #[error("command '{command}' not found in {scope}")]
    UnknownCommand { scope: String, command: String },

    #[error("command '{command}' already exists in {scope}")]
    DuplicateCommand { scope: String, command: String },

    #[error("{0} must not be empty")]
    EmptyField(&'static str),

    #[error("{0} must not start with '-'")]
    LeadingDash(&'static str),
}
