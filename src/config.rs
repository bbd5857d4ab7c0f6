use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::PathBuf;

pub const APP_DIR_NAME: &str = "RunOnServer";
pub const CONFIG_FILE: &str = "config.toml";

/// Terminal programs tried in this order unless the config says otherwise.
pub const DEFAULT_TERMINALS: &[&str] = &[
    "konsole",
    "gnome-terminal",
    "xfce4-terminal",
    "mate-terminal",
    "alacritty",
    "kitty",
    "xterm",
];

pub const DEFAULT_HOLD_PROMPT: &str = "Press any key to close...";

/// `~/.config/RunOnServer`, shared by the catalog, the config and the log.
pub fn app_dir() -> PathBuf {
    dirs::home_dir()
        .map(|h| h.join(".config").join(APP_DIR_NAME))
        .unwrap_or_else(|| PathBuf::from(".").join(APP_DIR_NAME))
}

fn default_terminals() -> Vec<String> {
    DEFAULT_TERMINALS.iter().map(|s| s.to_string()).collect()
}

fn default_ssh_client() -> String {
    "ssh".to_string()
}

fn default_ssh_port() -> u16 {
    22
}

fn default_probe_timeout_ms() -> u64 {
    1500
}

fn default_key_type() -> String {
    "rsa".to_string()
}

fn default_key_bits() -> u32 {
    4096
}

fn default_hold_prompt() -> String {
    DEFAULT_HOLD_PROMPT.to_string()
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Terminal preference order; the first one found on PATH wins.
    #[serde(default = "default_terminals")]
    pub terminals: Vec<String>,
    #[serde(default = "default_ssh_client")]
    pub ssh_client: String,
    #[serde(default = "default_ssh_port")]
    pub ssh_port: u16,
    #[serde(default = "default_probe_timeout_ms")]
    pub probe_timeout_ms: u64,
    /// Private key location; `~/.ssh/id_rsa` when unset.
    #[serde(default)]
    pub key_path: Option<PathBuf>,
    #[serde(default = "default_key_type")]
    pub key_type: String,
    #[serde(default = "default_key_bits")]
    pub key_bits: u32,
    #[serde(default = "default_hold_prompt")]
    pub hold_prompt: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            terminals: default_terminals(),
            ssh_client: default_ssh_client(),
            ssh_port: default_ssh_port(),
            probe_timeout_ms: default_probe_timeout_ms(),
            key_path: None,
            key_type: default_key_type(),
            key_bits: default_key_bits(),
            hold_prompt: default_hold_prompt(),
        }
    }
}

impl AppConfig {
    pub fn path() -> PathBuf {
        app_dir().join(CONFIG_FILE)
    }

    pub fn load() -> anyhow::Result<Self> {
        let config_path = Self::path();

        let mut config: Self = if config_path.exists() {
            let content = fs::read_to_string(&config_path)?;
            toml::from_str(&content)?
        } else {
            Self::default()
        };

        if config.terminals.is_empty() {
            config.terminals = default_terminals();
        }
        if config.probe_timeout_ms == 0 {
            config.probe_timeout_ms = default_probe_timeout_ms();
        }

        Ok(config)
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let config_dir = app_dir();
        if !config_dir.exists() {
            fs::create_dir_all(&config_dir)?;
        }
        let content = toml::to_string_pretty(self)?;
        let mut file = fs::File::create(Self::path())?;
        file.write_all(content.as_bytes())?;
        Ok(())
    }

    pub fn probe_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.probe_timeout_ms)
    }

    /// Resolved private key path.
    pub fn private_key_path(&self) -> PathBuf {
        self.key_path.clone().unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".ssh")
                .join(format!("id_{}", self.key_type))
        })
    }
}
