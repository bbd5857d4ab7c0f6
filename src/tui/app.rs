use runonserver::catalog::menu::{self, MenuEntry};
use runonserver::catalog::{store, Catalog, Server};
use runonserver::config::AppConfig;
use runonserver::ops::dispatch::{DispatchNotice, Dispatcher};
use runonserver::ops::invocation::shell_quote;
use runonserver::ops::probe::{self, HostStatus, ProbeResult};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;

const MAX_NOTICES: usize = 200;

#[derive(Debug, Clone)]
pub enum RowKind {
    Header(String),
    Server(Server),
    Entry(MenuEntry),
}

#[derive(Debug, Clone)]
pub struct Row {
    pub depth: u16,
    pub kind: RowKind,
}

impl Row {
    fn selectable(&self) -> bool {
        !matches!(self.kind, RowKind::Header(_))
    }
}

/// Flattens the menu tree into display rows.
pub fn build_rows(catalog: &Catalog) -> Vec<Row> {
    let menu = menu::build(catalog);
    let mut rows = Vec::new();

    for section in menu.sections {
        rows.push(Row {
            depth: 0,
            kind: RowKind::Header(section.category),
        });
        for entry in section.group_entries {
            rows.push(Row {
                depth: 1,
                kind: RowKind::Entry(entry),
            });
        }
        for server_menu in section.servers {
            rows.push(Row {
                depth: 1,
                kind: RowKind::Server(server_menu.server),
            });
            for entry in server_menu.entries {
                rows.push(Row {
                    depth: 2,
                    kind: RowKind::Entry(entry),
                });
            }
        }
    }

    if !menu.global.is_empty() {
        rows.push(Row {
            depth: 0,
            kind: RowKind::Header(menu::GLOBAL_SECTION.to_string()),
        });
        for entry in menu.global {
            rows.push(Row {
                depth: 1,
                kind: RowKind::Entry(entry),
            });
        }
    }

    rows
}

pub struct App {
    pub should_quit: bool,
    pub config: AppConfig,
    pub catalog_path: PathBuf,
    pub catalog: Catalog,
    pub load_error: Option<String>,
    pub rows: Vec<Row>,
    pub selected: usize,
    pub host_status: HashMap<String, HostStatus>,
    pub notices: Vec<String>,
    dispatcher: Arc<Dispatcher>,
    notice_rx: Receiver<DispatchNotice>,
    probe_tx: Sender<ProbeResult>,
    probe_rx: Receiver<ProbeResult>,
}

impl App {
    pub fn new(config: AppConfig, catalog_path: PathBuf) -> Self {
        let (notice_tx, notice_rx) = mpsc::channel();
        let (probe_tx, probe_rx) = mpsc::channel();
        let dispatcher = Arc::new(Dispatcher::from_config(&config).with_notices(notice_tx));

        let mut app = Self {
            should_quit: false,
            config,
            catalog_path,
            catalog: Catalog::default(),
            load_error: None,
            rows: Vec::new(),
            selected: 0,
            host_status: HashMap::new(),
            notices: Vec::new(),
            dispatcher,
            notice_rx,
            probe_tx,
            probe_rx,
        };
        app.reload();
        app
    }

    /// Re-reads the catalog and restarts probing. A failed load keeps an
    /// empty menu and shows the error.
    pub fn reload(&mut self) {
        match store::load(&self.catalog_path) {
            Ok(catalog) => {
                self.catalog = catalog;
                self.load_error = None;
            }
            Err(e) => {
                self.catalog = Catalog::default();
                self.load_error = Some(e.to_string());
                self.push_notice(format!("❌ {}", e));
            }
        }

        self.rows = build_rows(&self.catalog);
        self.selected = self.rows.iter().position(Row::selectable).unwrap_or(0);
        self.host_status = self
            .catalog
            .servers
            .iter()
            .map(|s| (s.host.clone(), HostStatus::Unknown))
            .collect();
        self.start_probes();
    }

    fn start_probes(&self) {
        // Handles are dropped on purpose; results arrive on probe_rx.
        let _ = probe::probe_catalog(
            &self.catalog,
            self.config.ssh_port,
            self.config.probe_timeout(),
            self.probe_tx.clone(),
        );
    }

    pub fn on_tick(&mut self) {
        while let Ok(result) = self.probe_rx.try_recv() {
            self.host_status.insert(result.host, result.status);
        }
        while let Ok(notice) = self.notice_rx.try_recv() {
            let line = match notice {
                DispatchNotice::Launched { label, terminal } => {
                    format!("🚀 {} ({})", label, terminal)
                }
                DispatchNotice::Failed { label, reason } => format!("⚠️  {}: {}", label, reason),
            };
            self.push_notice(line);
        }
    }

    pub fn push_notice(&mut self, line: String) {
        let stamp = chrono::Local::now().format("%H:%M:%S");
        self.notices.push(format!("{} {}", stamp, line));
        if self.notices.len() > MAX_NOTICES {
            let excess = self.notices.len() - MAX_NOTICES;
            self.notices.drain(..excess);
        }
    }

    pub fn status_of(&self, host: &str) -> HostStatus {
        self.host_status
            .get(host)
            .copied()
            .unwrap_or(HostStatus::Unknown)
    }

    pub fn next(&mut self) {
        if let Some(idx) = (self.selected + 1..self.rows.len()).find(|&i| self.rows[i].selectable()) {
            self.selected = idx;
        }
    }

    pub fn previous(&mut self) {
        if let Some(idx) = (0..self.selected).rev().find(|&i| self.rows[i].selectable()) {
            self.selected = idx;
        }
    }

    pub fn selected_row(&self) -> Option<&Row> {
        self.rows.get(self.selected)
    }

    /// Dispatches the selected command entry.
    pub fn activate(&mut self) {
        let Some(Row {
            kind: RowKind::Entry(entry),
            ..
        }) = self.selected_row().cloned()
        else {
            return;
        };

        let broadcast = self.dispatcher.dispatch(&self.catalog, &entry);
        if broadcast.is_empty() {
            self.push_notice(format!("⚠️  {}: no matching servers", entry.label));
        }
    }

    /// Opens a terminal running `runonserver provision` for the selected
    /// server, so ssh-copy-id can prompt for the password there.
    pub fn provision_selected(&mut self) {
        let Some(Row {
            kind: RowKind::Server(server),
            ..
        }) = self.selected_row().cloned()
        else {
            self.push_notice("Select a server to provision".to_string());
            return;
        };

        let exe = match std::env::current_exe() {
            Ok(exe) => exe,
            Err(e) => {
                self.push_notice(format!("❌ Cannot locate own executable: {}", e));
                return;
            }
        };

        let line = format!(
            "{} --catalog {} provision {} --category {}{}",
            shell_quote(&exe.to_string_lossy()),
            shell_quote(&self.catalog_path.to_string_lossy()),
            shell_quote(&server.name),
            shell_quote(&server.category),
            self.dispatcher.builder().hold_trailer()
        );
        let label = format!("provision {}", server.name);
        let _ = self.dispatcher.launch_shell_line(&label, &line);
    }

    pub fn quit(&mut self) {
        self.should_quit = true;
    }
}
