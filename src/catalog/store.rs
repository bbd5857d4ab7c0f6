use super::{Catalog, RemoteCommand, Server};
use crate::config::app_dir;
use crate::error::CatalogError;
use std::fs;
use std::path::{Path, PathBuf};

pub const CATALOG_FILE: &str = "servers.yaml";
pub const CATALOG_ENV: &str = "RUNONSERVER_CATALOG";

/// `$RUNONSERVER_CATALOG`, or `~/.config/RunOnServer/servers.yaml`.
pub fn default_catalog_path() -> PathBuf {
    if let Ok(path) = std::env::var(CATALOG_ENV) {
        if !path.trim().is_empty() {
            return PathBuf::from(path.trim());
        }
    }
    app_dir().join(CATALOG_FILE)
}

/// Login name of the local user, used for the bootstrap catalog.
fn local_user() -> String {
    std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "root".to_string())
}

/// The catalog written on first start: a single localhost entry.
pub fn default_catalog() -> Catalog {
    let mut localhost = Server::new("Localhost", "localhost", local_user(), "Default");
    localhost
        .commands
        .push(RemoteCommand::new("List home", "ls ~/", true));

    Catalog {
        servers: vec![localhost],
        ..Catalog::default()
    }
}

pub fn load(path: &Path) -> Result<Catalog, CatalogError> {
    let content = fs::read_to_string(path).map_err(|source| CatalogError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    // An empty file parses as YAML null; treat it as an empty catalog.
    if content.trim().is_empty() {
        return Ok(Catalog::default());
    }

    serde_yaml::from_str(&content).map_err(|source| CatalogError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

pub fn save(path: &Path, catalog: &Catalog) -> Result<(), CatalogError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| CatalogError::Write {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let content = serde_yaml::to_string(catalog).map_err(CatalogError::Serialize)?;
    fs::write(path, content).map_err(|source| CatalogError::Write {
        path: path.to_path_buf(),
        source,
    })
}

/// Writes [`default_catalog`] if nothing exists at `path`. Returns whether a
/// file was created.
pub fn ensure_exists(path: &Path) -> Result<bool, CatalogError> {
    if path.exists() {
        return Ok(false);
    }
    save(path, &default_catalog())?;
    tracing::info!(path = %path.display(), "created default catalog");
    Ok(true)
}
