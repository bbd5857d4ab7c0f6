use crate::catalog::store;
use crate::config::AppConfig;
use crate::ops::provision::{INSTALL_TOOL, KEYGEN_TOOL};
use crate::ops::terminal::{PathLocator, ProgramLocator, TerminalResolver};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub enum CheckStatus {
    Pass,
    Warning,
    Fail,
}

impl CheckStatus {
    pub fn icon(&self) -> &'static str {
        match self {
            CheckStatus::Pass => "✅",
            CheckStatus::Warning => "⚠️ ",
            CheckStatus::Fail => "❌",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DoctorCheck {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
}

impl DoctorCheck {
    fn new(name: &str, status: CheckStatus, message: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            status,
            message: message.into(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DoctorReport {
    pub checks: Vec<DoctorCheck>,
    pub overall_health: CheckStatus,
}

/// Checks that everything a launch or a provisioning run needs is in place.
pub struct Doctor {
    config: AppConfig,
    locator: Arc<dyn ProgramLocator>,
}

impl Doctor {
    pub fn new(config: AppConfig) -> Self {
        Self::with_locator(config, Arc::new(PathLocator))
    }

    pub fn with_locator(config: AppConfig, locator: Arc<dyn ProgramLocator>) -> Self {
        Self { config, locator }
    }

    pub fn run(&self, catalog_path: &Path) -> DoctorReport {
        let checks = vec![
            self.check_tool("SSH client", &self.config.ssh_client, CheckStatus::Fail),
            self.check_terminal(),
            self.check_catalog(catalog_path),
            self.check_tool("Key generator", KEYGEN_TOOL, CheckStatus::Warning),
            self.check_tool("Key installer", INSTALL_TOOL, CheckStatus::Warning),
            self.check_local_key(),
        ];

        let overall_health = if checks.iter().any(|c| matches!(c.status, CheckStatus::Fail)) {
            CheckStatus::Fail
        } else if checks
            .iter()
            .any(|c| matches!(c.status, CheckStatus::Warning))
        {
            CheckStatus::Warning
        } else {
            CheckStatus::Pass
        };

        DoctorReport {
            checks,
            overall_health,
        }
    }

    fn check_tool(&self, name: &str, program: &str, missing: CheckStatus) -> DoctorCheck {
        if self.locator.is_available(program) {
            DoctorCheck::new(name, CheckStatus::Pass, format!("'{}' found on PATH", program))
        } else {
            DoctorCheck::new(name, missing, format!("'{}' not found on PATH", program))
        }
    }

    fn check_terminal(&self) -> DoctorCheck {
        let resolver = TerminalResolver::new(&self.config.terminals, Arc::clone(&self.locator));
        match resolver.resolve() {
            Ok(terminal) => DoctorCheck::new(
                "Terminal",
                CheckStatus::Pass,
                format!("Sessions will open in '{}'", terminal.name),
            ),
            Err(e) => DoctorCheck::new("Terminal", CheckStatus::Fail, e.to_string()),
        }
    }

    fn check_catalog(&self, path: &Path) -> DoctorCheck {
        if !path.exists() {
            return DoctorCheck::new(
                "Catalog",
                CheckStatus::Warning,
                format!("{} missing. Run 'runonserver init'.", path.display()),
            );
        }

        match store::load(path) {
            Ok(catalog) if catalog.servers.is_empty() => DoctorCheck::new(
                "Catalog",
                CheckStatus::Warning,
                "Catalog has no servers",
            ),
            Ok(catalog) => DoctorCheck::new(
                "Catalog",
                CheckStatus::Pass,
                format!(
                    "{} servers in {} categories",
                    catalog.servers.len(),
                    catalog.categories().len()
                ),
            ),
            Err(e) => DoctorCheck::new("Catalog", CheckStatus::Fail, e.to_string()),
        }
    }

    fn check_local_key(&self) -> DoctorCheck {
        let key = self.config.private_key_path();
        if key.exists() {
            DoctorCheck::new(
                "Local key",
                CheckStatus::Pass,
                format!("{} present", key.display()),
            )
        } else {
            DoctorCheck::new(
                "Local key",
                CheckStatus::Warning,
                format!(
                    "{} missing. 'runonserver provision <server>' creates it.",
                    key.display()
                ),
            )
        }
    }
}
