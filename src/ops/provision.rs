//! Passwordless login setup: make sure a local key pair exists, then copy
//! its public half to the remote account.

use crate::catalog::Server;
use crate::config::AppConfig;
use crate::error::ProvisionError;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::Arc;

pub const KEYGEN_TOOL: &str = "ssh-keygen";
pub const INSTALL_TOOL: &str = "ssh-copy-id";

/// Runs an external tool to completion. `Err` carries a readable reason
/// for a spawn failure or a non-zero exit.
pub trait ToolRunner: Send + Sync {
    fn run(&self, program: &str, args: &[String]) -> Result<(), String>;
}

/// Runs tools with the caller's stdio so `ssh-copy-id` can ask for the
/// remote password.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl ToolRunner for SystemRunner {
    fn run(&self, program: &str, args: &[String]) -> Result<(), String> {
        let status = Command::new(program)
            .args(args)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .map_err(|e| format!("failed to run {}: {}", program, e))?;

        if status.success() {
            Ok(())
        } else {
            Err(format!("{} exited with {}", program, status))
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
    Existing,
    Generated,
}

pub struct Provisioner {
    key_path: PathBuf,
    key_type: String,
    key_bits: u32,
    port: u16,
    runner: Arc<dyn ToolRunner>,
}

impl Provisioner {
    pub fn new(
        key_path: PathBuf,
        key_type: impl Into<String>,
        key_bits: u32,
        port: u16,
        runner: Arc<dyn ToolRunner>,
    ) -> Self {
        Self {
            key_path,
            key_type: key_type.into(),
            key_bits,
            port,
            runner,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            config.private_key_path(),
            &config.key_type,
            config.key_bits,
            config.ssh_port,
            Arc::new(SystemRunner),
        )
    }

    pub fn key_path(&self) -> &Path {
        &self.key_path
    }

    pub fn public_key_path(&self) -> PathBuf {
        let mut name = self.key_path.as_os_str().to_os_string();
        name.push(".pub");
        PathBuf::from(name)
    }

    /// Generates the key pair unless the private key is already there.
    pub fn ensure_local_key(&self) -> Result<KeyOutcome, ProvisionError> {
        if self.key_path.exists() {
            tracing::debug!(path = %self.key_path.display(), "local key present");
            return Ok(KeyOutcome::Existing);
        }

        if let Some(dir) = self.key_path.parent() {
            create_private_dir(dir).map_err(|e| {
                ProvisionError::KeyGeneration(format!("cannot create {}: {}", dir.display(), e))
            })?;
        }

        let args = vec![
            "-t".to_string(),
            self.key_type.clone(),
            "-b".to_string(),
            self.key_bits.to_string(),
            "-N".to_string(),
            String::new(),
            "-f".to_string(),
            self.key_path.to_string_lossy().into_owned(),
            "-q".to_string(),
        ];
        self.runner
            .run(KEYGEN_TOOL, &args)
            .map_err(ProvisionError::KeyGeneration)?;

        if !self.key_path.exists() {
            return Err(ProvisionError::KeyGeneration(format!(
                "{} finished but {} is missing",
                KEYGEN_TOOL,
                self.key_path.display()
            )));
        }

        tracing::info!(path = %self.key_path.display(), "generated local key pair");
        Ok(KeyOutcome::Generated)
    }

    /// Copies the public key to `user@host`. Whether the key is already
    /// authorized is left to `ssh-copy-id`.
    pub fn install_key(&self, user: &str, host: &str) -> Result<(), ProvisionError> {
        let target = format!("{}@{}", user, host);
        let public_key = self.public_key_path();
        if !public_key.exists() {
            return Err(ProvisionError::Installation {
                target,
                reason: format!("public key {} not found", public_key.display()),
            });
        }

        let mut args = vec!["-i".to_string(), public_key.to_string_lossy().into_owned()];
        if self.port != 22 {
            args.push("-p".to_string());
            args.push(self.port.to_string());
        }
        args.push(target.clone());

        self.runner
            .run(INSTALL_TOOL, &args)
            .map_err(|reason| ProvisionError::Installation {
                target: target.clone(),
                reason,
            })?;

        tracing::info!(%target, "installed public key");
        Ok(())
    }

    /// Key generation first, installation second. Stops at the first failure.
    pub fn provision(&self, user: &str, host: &str) -> Result<KeyOutcome, ProvisionError> {
        let outcome = self.ensure_local_key()?;
        self.install_key(user, host)?;
        Ok(outcome)
    }

    pub fn provision_server(&self, server: &Server) -> Result<KeyOutcome, ProvisionError> {
        self.provision(&server.user, &server.host)
    }
}

#[cfg(unix)]
fn create_private_dir(dir: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::DirBuilderExt;
    if dir.exists() {
        return Ok(());
    }
    std::fs::DirBuilder::new()
        .recursive(true)
        .mode(0o700)
        .create(dir)
}

#[cfg(not(unix))]
fn create_private_dir(dir: &Path) -> std::io::Result<()> {
    std::fs::create_dir_all(dir)
}
