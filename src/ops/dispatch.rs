//! Launching remote sessions in terminal windows.
//!
//! Every launch is fire-and-forget: once the OS has accepted the terminal
//! process we return, and the session lives on independently of this
//! process. Broadcasts run one task per target, each owning its own copy of
//! the server and command.

use crate::catalog::menu::{DispatchTarget, MenuEntry};
use crate::catalog::{Catalog, RemoteCommand, Server};
use crate::config::AppConfig;
use crate::error::DispatchError;
use crate::ops::invocation::InvocationBuilder;
use crate::ops::terminal::{PathLocator, ProgramLocator, TerminalProgram, TerminalResolver};
use std::process::Stdio;
use std::sync::mpsc::{Receiver, Sender};
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Starts a process without keeping any claim on it.
pub trait ProcessSpawner: Send + Sync {
    fn spawn_detached(&self, program: &str, args: &[String]) -> std::io::Result<()>;
}

/// Spawns into a new process group with null stdio and drops the child
/// handle; tokio reaps it in the background once it exits.
#[derive(Debug, Default, Clone, Copy)]
pub struct DetachedSpawner;

impl ProcessSpawner for DetachedSpawner {
    fn spawn_detached(&self, program: &str, args: &[String]) -> std::io::Result<()> {
        let mut cmd = tokio::process::Command::new(program);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(false);
        #[cfg(unix)]
        cmd.process_group(0);

        let child = cmd.spawn()?;
        tracing::debug!(%program, pid = ?child.id(), "spawned detached process");
        drop(child);
        Ok(())
    }
}

/// What happened to one launch, for whoever displays results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchNotice {
    Launched { label: String, terminal: String },
    Failed { label: String, reason: String },
}

/// Takes every notice currently queued on `notices` and keeps the failures.
pub fn drain_failures(notices: &Receiver<DispatchNotice>) -> Vec<DispatchNotice> {
    notices
        .try_iter()
        .filter(|n| matches!(n, DispatchNotice::Failed { .. }))
        .collect()
}

/// A fan-out in flight. Dropping it detaches the tasks; awaiting
/// [`Broadcast::finished`] only waits for process creation, never for the
/// remote sessions.
#[derive(Debug)]
pub struct Broadcast {
    pub targets: Vec<String>,
    handles: Vec<JoinHandle<()>>,
}

impl Broadcast {
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub async fn finished(self) {
        futures::future::join_all(self.handles).await;
    }
}

pub struct Dispatcher {
    builder: InvocationBuilder,
    resolver: TerminalResolver,
    spawner: Arc<dyn ProcessSpawner>,
    notices: Option<Sender<DispatchNotice>>,
}

impl Dispatcher {
    pub fn new(
        builder: InvocationBuilder,
        resolver: TerminalResolver,
        spawner: Arc<dyn ProcessSpawner>,
    ) -> Self {
        Self {
            builder,
            resolver,
            spawner,
            notices: None,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        let locator: Arc<dyn ProgramLocator> = Arc::new(PathLocator);
        Self::new(
            InvocationBuilder::from_config(config),
            TerminalResolver::new(&config.terminals, locator),
            Arc::new(DetachedSpawner),
        )
    }

    /// Sends a [`DispatchNotice`] for every launch attempt to `notices`.
    pub fn with_notices(mut self, notices: Sender<DispatchNotice>) -> Self {
        self.notices = Some(notices);
        self
    }

    pub fn builder(&self) -> &InvocationBuilder {
        &self.builder
    }

    fn notify(&self, notice: DispatchNotice) {
        if let Some(tx) = &self.notices {
            let _ = tx.send(notice);
        }
    }

    /// Opens a terminal running `line` under bash. Shared by remote
    /// sessions and local helper commands.
    pub fn launch_shell_line(
        &self,
        label: &str,
        line: &str,
    ) -> Result<TerminalProgram, DispatchError> {
        let result = self.resolver.resolve().and_then(|terminal| {
            self.spawner
                .spawn_detached(terminal.name, &terminal.wrap(line))
                .map(|()| terminal)
                .map_err(|source| DispatchError::Spawn {
                    terminal: terminal.name.to_string(),
                    source,
                })
        });

        match &result {
            Ok(terminal) => {
                tracing::info!(%label, terminal = terminal.name, "launched");
                self.notify(DispatchNotice::Launched {
                    label: label.to_string(),
                    terminal: terminal.name.to_string(),
                });
            }
            Err(e) => {
                tracing::warn!(%label, error = %e, "launch failed");
                self.notify(DispatchNotice::Failed {
                    label: label.to_string(),
                    reason: e.to_string(),
                });
            }
        }

        result
    }

    /// Opens one terminal running `command` on `server`.
    pub fn launch_one(
        &self,
        server: &Server,
        command: &RemoteCommand,
    ) -> Result<TerminalProgram, DispatchError> {
        let line = self.builder.for_server(server, command);
        let label = format!("{} → {}", command.name, server.name);
        self.launch_shell_line(&label, &line)
    }

    fn fan_out<'a, I>(self: &Arc<Self>, servers: I, command: &RemoteCommand) -> Broadcast
    where
        I: IntoIterator<Item = &'a Server>,
    {
        let mut targets = Vec::new();
        let mut handles = Vec::new();

        for server in servers {
            targets.push(server.name.clone());

            let dispatcher = Arc::clone(self);
            let server = server.clone();
            let command = command.clone();
            handles.push(tokio::spawn(async move {
                // Failures are reported through notify(); siblings carry on.
                let _ = dispatcher.launch_one(&server, &command);
            }));
        }

        Broadcast { targets, handles }
    }

    /// Launches `command` on every server carrying `category` right now.
    pub fn launch_category(
        self: &Arc<Self>,
        catalog: &Catalog,
        category: &str,
        command: &RemoteCommand,
    ) -> Broadcast {
        let broadcast = self.fan_out(catalog.servers_in(category), command);
        tracing::info!(%category, command = %command.name, targets = broadcast.len(), "category broadcast");
        broadcast
    }

    /// Launches `command` on every server in the catalog.
    pub fn launch_global(self: &Arc<Self>, catalog: &Catalog, command: &RemoteCommand) -> Broadcast {
        let broadcast = self.fan_out(&catalog.servers, command);
        tracing::info!(command = %command.name, targets = broadcast.len(), "global broadcast");
        broadcast
    }

    /// Sends a menu entry to its target. Category and global membership is
    /// read from `catalog` at this point, not from when the menu was built.
    pub fn dispatch(self: &Arc<Self>, catalog: &Catalog, entry: &MenuEntry) -> Broadcast {
        match &entry.target {
            DispatchTarget::Single(server) => self.fan_out(std::iter::once(server), &entry.command),
            DispatchTarget::Category(category) => {
                self.launch_category(catalog, category, &entry.command)
            }
            DispatchTarget::Global => self.launch_global(catalog, &entry.command),
        }
    }
}
