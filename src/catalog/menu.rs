//! Launcher menu derived from a catalog snapshot.
//!
//! Every actionable entry carries its own copy of the command and a
//! [`DispatchTarget`], so an entry can be dispatched long after the menu was
//! built without referring back into the catalog it came from.

use super::{Catalog, RemoteCommand, Server};

pub const GLOBAL_SECTION: &str = "Global Commands";

/// The closed set of things a menu entry can be sent to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchTarget {
    Single(Server),
    /// Every server carrying this category when the entry is dispatched.
    Category(String),
    /// Every server in the catalog when the entry is dispatched.
    Global,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuEntry {
    pub label: String,
    pub target: DispatchTarget,
    pub command: RemoteCommand,
}

#[derive(Debug, Clone)]
pub struct ServerMenu {
    pub server: Server,
    pub entries: Vec<MenuEntry>,
}

#[derive(Debug, Clone)]
pub struct CategorySection {
    pub category: String,
    pub group_entries: Vec<MenuEntry>,
    pub servers: Vec<ServerMenu>,
}

#[derive(Debug, Clone, Default)]
pub struct Menu {
    pub sections: Vec<CategorySection>,
    pub global: Vec<MenuEntry>,
}

impl Menu {
    /// All actionable entries in display order.
    pub fn entries(&self) -> impl Iterator<Item = &MenuEntry> {
        self.sections
            .iter()
            .flat_map(|s| {
                s.group_entries
                    .iter()
                    .chain(s.servers.iter().flat_map(|m| m.entries.iter()))
            })
            .chain(self.global.iter())
    }
}

/// Builds the menu. Sections are sorted by category name; servers keep
/// their catalog order inside a section.
pub fn build(catalog: &Catalog) -> Menu {
    let sections = catalog
        .categories()
        .into_iter()
        .map(|category| {
            let group_entries = catalog
                .commands_for_category(&category)
                .iter()
                .map(|cmd| MenuEntry {
                    label: format!("[{}] {}", category, cmd.name),
                    target: DispatchTarget::Category(category.clone()),
                    command: cmd.clone(),
                })
                .collect();

            let servers = catalog
                .servers_in(&category)
                .map(|server| ServerMenu {
                    server: server.clone(),
                    entries: server
                        .commands
                        .iter()
                        .map(|cmd| MenuEntry {
                            label: cmd.name.clone(),
                            target: DispatchTarget::Single(server.clone()),
                            command: cmd.clone(),
                        })
                        .collect(),
                })
                .collect();

            CategorySection {
                category,
                group_entries,
                servers,
            }
        })
        .collect();

    let global = catalog
        .global_commands
        .iter()
        .map(|cmd| MenuEntry {
            label: cmd.name.clone(),
            target: DispatchTarget::Global,
            command: cmd.clone(),
        })
        .collect();

    Menu { sections, global }
}
