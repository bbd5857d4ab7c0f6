use clap::{Arg, ArgAction, ArgMatches, Command};
use runonserver::catalog::editor::CommandScope;
use runonserver::catalog::{menu, store, Catalog, RemoteCommand, Server, DEFAULT_CATEGORY};
use runonserver::config::{app_dir, AppConfig};
use runonserver::doctor::Doctor;
use runonserver::ops::dispatch::{drain_failures, Broadcast, DispatchNotice, Dispatcher};
use runonserver::ops::probe::{self, HostStatus};
use runonserver::ops::provision::{KeyOutcome, Provisioner};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub mod tui;

const LOG_FILE: &str = "runonserver.log";

fn category_arg() -> Arg {
    Arg::new("category")
        .long("category")
        .short('c')
        .help("Category the server belongs to (disambiguates repeated names)")
}

fn cli() -> Command {
    Command::new("runonserver")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Launch predefined commands on remote servers over SSH")
        .arg(
            Arg::new("catalog")
                .long("catalog")
                .global(true)
                .help("Path to servers.yaml (default: ~/.config/RunOnServer/servers.yaml)"),
        )
        .subcommand(Command::new("menu").about("Interactive launcher (default)"))
        .subcommand(
            Command::new("list")
                .about("Show categories, servers and commands")
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Print the catalog as JSON"),
                ),
        )
        .subcommand(
            Command::new("run")
                .about("Run a server's command in a new terminal")
                .arg(Arg::new("server").required(true))
                .arg(Arg::new("command").required(true))
                .arg(category_arg()),
        )
        .subcommand(
            Command::new("group")
                .about("Run a category command on every server of the category")
                .arg(Arg::new("category").required(true))
                .arg(Arg::new("command").required(true)),
        )
        .subcommand(
            Command::new("global")
                .about("Run a global command on every server")
                .arg(Arg::new("command").required(true)),
        )
        .subcommand(
            Command::new("probe")
                .about("Check which servers accept SSH connections")
                .arg(Arg::new("server").required(false))
                .arg(category_arg()),
        )
        .subcommand(
            Command::new("provision")
                .about("Set up passwordless login for a server")
                .arg(Arg::new("server").required(true))
                .arg(category_arg()),
        )
        .subcommand(Command::new("doctor").about("Check tools, terminal, catalog and keys"))
        .subcommand(Command::new("init").about("Create the default catalog if missing"))
        .subcommand(
            Command::new("config")
                .about("Show or reset launcher settings")
                .subcommand(Command::new("show").about("Print the effective settings"))
                .subcommand(Command::new("reset").about("Write default settings")),
        )
        .subcommand(
            Command::new("server")
                .about("Edit servers")
                .subcommand(
                    Command::new("add")
                        .about("Add a server")
                        .arg(Arg::new("name").required(true))
                        .arg(Arg::new("host").long("host").required(true))
                        .arg(Arg::new("user").long("user").required(true))
                        .arg(category_arg().default_value(DEFAULT_CATEGORY)),
                )
                .subcommand(
                    Command::new("remove")
                        .about("Remove a server")
                        .arg(Arg::new("name").required(true))
                        .arg(category_arg()),
                )
                .subcommand(
                    Command::new("edit")
                        .about("Change a server's connection details, keeping its commands")
                        .arg(Arg::new("name").required(true))
                        .arg(Arg::new("host").long("host"))
                        .arg(Arg::new("user").long("user"))
                        .arg(Arg::new("rename").long("rename").help("New server name"))
                        .arg(category_arg()),
                )
                .subcommand(
                    Command::new("clone")
                        .about("Copy a server with its commands")
                        .arg(Arg::new("name").required(true))
                        .arg(category_arg()),
                )
                .subcommand(
                    Command::new("move")
                        .about("Move a server to another category")
                        .arg(Arg::new("name").required(true))
                        .arg(Arg::new("to").required(true))
                        .arg(category_arg()),
                ),
        )
        .subcommand(
            Command::new("command")
                .about("Edit server, category and global commands")
                .subcommand(
                    Command::new("add")
                        .about("Add a command")
                        .arg(Arg::new("name").required(true))
                        .arg(Arg::new("text").required(true))
                        .arg(
                            Arg::new("hold")
                                .long("hold")
                                .action(ArgAction::SetTrue)
                                .help("Keep the terminal open after the command finishes"),
                        )
                        .args(scope_args()),
                )
                .subcommand(
                    Command::new("edit")
                        .about("Change a command")
                        .arg(Arg::new("name").required(true))
                        .arg(Arg::new("text").long("text").help("New command text"))
                        .arg(Arg::new("rename").long("rename").help("New command name"))
                        .arg(
                            Arg::new("hold")
                                .long("hold")
                                .action(ArgAction::SetTrue)
                                .conflicts_with("no-hold")
                                .help("Keep the terminal open after the command finishes"),
                        )
                        .arg(
                            Arg::new("no-hold")
                                .long("no-hold")
                                .action(ArgAction::SetTrue)
                                .help("Close the terminal when the command finishes"),
                        )
                        .args(scope_args()),
                )
                .subcommand(
                    Command::new("remove")
                        .about("Remove a command")
                        .arg(Arg::new("name").required(true))
                        .args(scope_args()),
                ),
        )
}

fn scope_args() -> Vec<Arg> {
    vec![
        Arg::new("server")
            .long("server")
            .conflicts_with("global")
            .help("Attach to this server"),
        category_arg().help("Server category, or the category itself when no --server is given"),
        Arg::new("global")
            .long("global")
            .action(ArgAction::SetTrue)
            .help("Attach to the global command list"),
    ]
}

#[tokio::main]
async fn main() {
    let matches = cli().get_matches();
    let catalog_path = matches
        .get_one::<String>("catalog")
        .map(PathBuf::from)
        .unwrap_or_else(store::default_catalog_path);

    let interactive = matches!(matches.subcommand(), None | Some(("menu", _)));
    init_tracing(interactive);

    let config = match AppConfig::load() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("⚠️  Could not read {} ({}), using defaults", AppConfig::path().display(), e);
            AppConfig::default()
        }
    };

    let result = match matches.subcommand() {
        Some(("list", args)) => cmd_list(&catalog_path, args.get_flag("json")),
        Some(("run", args)) => cmd_run(&config, &catalog_path, args),
        Some(("group", args)) => cmd_group(&config, &catalog_path, args).await,
        Some(("global", args)) => cmd_global(&config, &catalog_path, args).await,
        Some(("probe", args)) => cmd_probe(&config, &catalog_path, args).await,
        Some(("provision", args)) => cmd_provision(&config, &catalog_path, args).await,
        Some(("doctor", _)) => cmd_doctor(config, &catalog_path),
        Some(("init", _)) => cmd_init(&catalog_path),
        Some(("config", sub)) => cmd_config(&config, sub),
        Some(("server", sub)) => cmd_server(&catalog_path, sub),
        Some(("command", sub)) => cmd_command(&catalog_path, sub),
        _ => run_launcher(config, catalog_path),
    };

    if let Err(e) = result {
        eprintln!("❌ {:#}", e);
        std::process::exit(1);
    }
}

/// Logs to stderr for one-shot commands; the launcher logs to a file so the
/// screen stays intact.
fn init_tracing(to_file: bool) {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "runonserver=info".into()),
    );

    if to_file {
        let dir = app_dir();
        let file = std::fs::create_dir_all(&dir).and_then(|()| {
            std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(dir.join(LOG_FILE))
        });
        if let Ok(file) = file {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_ansi(false)
                        .with_writer(std::sync::Mutex::new(file)),
                )
                .init();
        }
        return;
    }

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn load_catalog(path: &Path) -> anyhow::Result<Catalog> {
    Ok(store::load(path)?)
}

fn save_catalog(path: &Path, catalog: &Catalog) -> anyhow::Result<()> {
    Ok(store::save(path, catalog)?)
}

fn find_server<'a>(catalog: &'a Catalog, args: &ArgMatches) -> anyhow::Result<&'a Server> {
    let name = args
        .get_one::<String>("server")
        .ok_or_else(|| anyhow::anyhow!("No server given"))?;
    let category = args.get_one::<String>("category").map(String::as_str);
    catalog
        .find_server(name, category)
        .ok_or_else(|| anyhow::anyhow!("Server '{}' not found in catalog", name))
}

fn required<'a>(args: &'a ArgMatches, id: &str) -> &'a str {
    args.get_one::<String>(id).map(String::as_str).unwrap_or_default()
}

fn cmd_list(catalog_path: &Path, json: bool) -> anyhow::Result<()> {
    let catalog = load_catalog(catalog_path)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&catalog)?);
        return Ok(());
    }

    let menu = menu::build(&catalog);
    for section in &menu.sections {
        println!("📁 {}", section.category);
        for entry in &section.group_entries {
            println!("   🌐 {}", entry.label);
        }
        for server_menu in &section.servers {
            println!(
                "   🖥️  {} ({})",
                server_menu.server.name,
                server_menu.server.destination()
            );
            for entry in &server_menu.entries {
                let hold = if entry.command.hold_terminal { " [hold]" } else { "" };
                println!("      • {}{}", entry.label, hold);
            }
        }
    }
    if !menu.global.is_empty() {
        println!("🌍 {}", menu::GLOBAL_SECTION);
        for entry in &menu.global {
            println!("   • {}", entry.label);
        }
    }
    Ok(())
}

fn cmd_run(config: &AppConfig, catalog_path: &Path, args: &ArgMatches) -> anyhow::Result<()> {
    let catalog = load_catalog(catalog_path)?;
    let server = find_server(&catalog, args)?;
    let command_name = required(args, "command");
    let command = server.find_command(command_name).ok_or_else(|| {
        anyhow::anyhow!("Command '{}' not defined for '{}'", command_name, server.name)
    })?;

    let dispatcher = Dispatcher::from_config(config);
    let terminal = dispatcher.launch_one(server, command)?;
    println!("🚀 {} → {} ({})", command.name, server.name, terminal.name);
    Ok(())
}

async fn cmd_group(config: &AppConfig, catalog_path: &Path, args: &ArgMatches) -> anyhow::Result<()> {
    let catalog = load_catalog(catalog_path)?;
    let category = required(args, "category");
    let command_name = required(args, "command");
    let command = catalog
        .find_category_command(category, command_name)
        .ok_or_else(|| {
            anyhow::anyhow!("Command '{}' not defined for category '{}'", command_name, category)
        })?
        .clone();

    let (tx, rx) = mpsc::channel();
    let dispatcher = Arc::new(Dispatcher::from_config(config).with_notices(tx));
    let broadcast = dispatcher.launch_category(&catalog, category, &command);
    report_broadcast(&command, broadcast, &rx).await
}

async fn cmd_global(config: &AppConfig, catalog_path: &Path, args: &ArgMatches) -> anyhow::Result<()> {
    let catalog = load_catalog(catalog_path)?;
    let command_name = required(args, "command");
    let command = catalog
        .find_global_command(command_name)
        .ok_or_else(|| anyhow::anyhow!("Global command '{}' not defined", command_name))?
        .clone();

    let (tx, rx) = mpsc::channel();
    let dispatcher = Arc::new(Dispatcher::from_config(config).with_notices(tx));
    let broadcast = dispatcher.launch_global(&catalog, &command);
    report_broadcast(&command, broadcast, &rx).await
}

/// The tasks must get to spawn their terminals before this process exits;
/// the sessions themselves are not waited for.
async fn report_broadcast(
    command: &RemoteCommand,
    broadcast: Broadcast,
    notices: &Receiver<DispatchNotice>,
) -> anyhow::Result<()> {
    if broadcast.is_empty() {
        println!("⚠️  No servers to run '{}' on", command.name);
        return Ok(());
    }
    let total = broadcast.len();
    println!(
        "🌐 Launching '{}' on {} servers: {}",
        command.name,
        total,
        broadcast.targets.join(", ")
    );
    broadcast.finished().await;

    let failures = drain_failures(notices);
    for failure in &failures {
        if let DispatchNotice::Failed { label, reason } = failure {
            eprintln!("❌ {}: {}", label, reason);
        }
    }
    if !failures.is_empty() {
        anyhow::bail!("{} of {} launches failed", failures.len(), total);
    }
    Ok(())
}

async fn cmd_probe(config: &AppConfig, catalog_path: &Path, args: &ArgMatches) -> anyhow::Result<()> {
    let catalog = load_catalog(catalog_path)?;
    let servers: Vec<&Server> = if args.get_one::<String>("server").is_some() {
        vec![find_server(&catalog, args)?]
    } else {
        catalog.servers.iter().collect()
    };

    let checks = servers.iter().map(|server| async move {
        let reachable = probe::probe(&server.host, config.ssh_port, config.probe_timeout()).await;
        (server, HostStatus::from(reachable))
    });

    for (server, status) in futures::future::join_all(checks).await {
        let icon = if status == HostStatus::Online { "🟢" } else { "🔴" };
        println!("{} {} ({}) {}", icon, server.name, server.host, status.label());
    }
    Ok(())
}

async fn cmd_provision(config: &AppConfig, catalog_path: &Path, args: &ArgMatches) -> anyhow::Result<()> {
    let catalog = load_catalog(catalog_path)?;
    let server = find_server(&catalog, args)?.clone();
    let provisioner = Provisioner::from_config(config);

    println!("🔑 Provisioning {} ({})", server.name, server.destination());
    let outcome = tokio::task::spawn_blocking(move || provisioner.provision_server(&server)).await?;

    match outcome {
        Ok(KeyOutcome::Generated) => println!("✅ Generated a new key and installed it"),
        Ok(KeyOutcome::Existing) => println!("✅ Installed existing key"),
        Err(e) => anyhow::bail!("Provisioning failed at {}: {}", e.step(), e),
    }
    Ok(())
}

fn cmd_doctor(config: AppConfig, catalog_path: &Path) -> anyhow::Result<()> {
    let report = Doctor::new(config).run(catalog_path);
    for check in &report.checks {
        println!("{} {}: {}", check.status.icon(), check.name, check.message);
    }
    println!();
    println!("{} Overall: {:?}", report.overall_health.icon(), report.overall_health);
    Ok(())
}

fn cmd_init(catalog_path: &Path) -> anyhow::Result<()> {
    if store::ensure_exists(catalog_path)? {
        println!("✅ Created {}", catalog_path.display());
    } else {
        println!("Catalog already exists at {}", catalog_path.display());
    }
    Ok(())
}

fn cmd_config(config: &AppConfig, sub: &ArgMatches) -> anyhow::Result<()> {
    match sub.subcommand() {
        Some(("reset", _)) => {
            AppConfig::default().save()?;
            println!("✅ Wrote defaults to {}", AppConfig::path().display());
        }
        _ => {
            println!("# {}", AppConfig::path().display());
            print!("{}", toml::to_string_pretty(config)?);
        }
    }
    Ok(())
}

fn cmd_server(catalog_path: &Path, sub: &ArgMatches) -> anyhow::Result<()> {
    let mut catalog = load_catalog(catalog_path)?;

    match sub.subcommand() {
        Some(("add", args)) => {
            let server = Server::new(
                required(args, "name"),
                required(args, "host"),
                required(args, "user"),
                required(args, "category"),
            );
            catalog.add_server(server)?;
            println!("✅ Added server '{}'", required(args, "name"));
        }
        Some(("remove", args)) => {
            let category = args.get_one::<String>("category").map(String::as_str);
            let removed = catalog.remove_server(required(args, "name"), category)?;
            println!("🗑️  Removed server '{}'", removed.name);
        }
        Some(("edit", args)) => {
            let name = edit_server(&mut catalog, args)?;
            println!("✅ Updated server '{}'", name);
        }
        Some(("clone", args)) => {
            let category = args.get_one::<String>("category").map(String::as_str);
            let new_name = catalog.clone_server(required(args, "name"), category)?;
            println!("✅ Created '{}'", new_name);
        }
        Some(("move", args)) => {
            let category = args.get_one::<String>("category").map(String::as_str);
            catalog.move_server(required(args, "name"), category, required(args, "to"))?;
            println!("✅ Moved '{}' to '{}'", required(args, "name"), required(args, "to"));
        }
        _ => {
            println!("Use 'runonserver server --help'");
            return Ok(());
        }
    }

    save_catalog(catalog_path, &catalog)
}

/// Applies the given `server edit` options. Returns the server's final name.
fn edit_server(catalog: &mut Catalog, args: &ArgMatches) -> anyhow::Result<String> {
    let name = required(args, "name");
    let category = args.get_one::<String>("category").map(String::as_str);
    let mut updated = catalog
        .find_server(name, category)
        .ok_or_else(|| anyhow::anyhow!("Server '{}' not found in catalog", name))?
        .clone();

    if let Some(host) = args.get_one::<String>("host") {
        updated.host = host.clone();
    }
    if let Some(user) = args.get_one::<String>("user") {
        updated.user = user.clone();
    }
    if let Some(rename) = args.get_one::<String>("rename") {
        updated.name = rename.clone();
    }

    let final_name = updated.name.clone();
    catalog.update_server(name, category, updated)?;
    Ok(final_name)
}

fn edit_command(catalog: &mut Catalog, args: &ArgMatches) -> anyhow::Result<(CommandScope, String)> {
    let scope = command_scope(args)?;
    let name = required(args, "name");
    let mut updated = catalog
        .find_scoped_command(&scope, name)
        .ok_or_else(|| anyhow::anyhow!("Command '{}' not found in {}", name, scope))?
        .clone();

    if let Some(text) = args.get_one::<String>("text") {
        updated.command = text.clone();
    }
    if let Some(rename) = args.get_one::<String>("rename") {
        updated.name = rename.clone();
    }
    if args.get_flag("hold") {
        updated.hold_terminal = true;
    } else if args.get_flag("no-hold") {
        updated.hold_terminal = false;
    }

    let final_name = updated.name.clone();
    catalog.update_command(&scope, name, updated)?;
    Ok((scope, final_name))
}

fn command_scope(args: &ArgMatches) -> anyhow::Result<CommandScope> {
    let category = args.get_one::<String>("category").cloned();
    if args.get_flag("global") {
        return Ok(CommandScope::Global);
    }
    match (args.get_one::<String>("server"), category) {
        (Some(name), category) => Ok(CommandScope::Server {
            name: name.clone(),
            category,
        }),
        (None, Some(category)) => Ok(CommandScope::Category(category)),
        (None, None) => anyhow::bail!("Give --server, --category or --global"),
    }
}

fn cmd_command(catalog_path: &Path, sub: &ArgMatches) -> anyhow::Result<()> {
    let mut catalog = load_catalog(catalog_path)?;

    match sub.subcommand() {
        Some(("add", args)) => {
            let scope = command_scope(args)?;
            let cmd = RemoteCommand::new(
                required(args, "name"),
                required(args, "text"),
                args.get_flag("hold"),
            );
            catalog.add_command(&scope, cmd)?;
            println!("✅ Added '{}' to {}", required(args, "name"), scope);
        }
        Some(("edit", args)) => {
            let (scope, name) = edit_command(&mut catalog, args)?;
            println!("✅ Updated '{}' in {}", name, scope);
        }
        Some(("remove", args)) => {
            let scope = command_scope(args)?;
            let removed = catalog.remove_command(&scope, required(args, "name"))?;
            println!("🗑️  Removed '{}' from {}", removed.name, scope);
        }
        _ => {
            println!("Use 'runonserver command --help'");
            return Ok(());
        }
    }

    save_catalog(catalog_path, &catalog)
}

fn run_launcher(config: AppConfig, catalog_path: PathBuf) -> anyhow::Result<()> {
    use crossterm::{
        execute,
        terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    };
    use ratatui::backend::CrosstermBackend;
    use ratatui::Terminal;
    use std::io;

    // First start: give the operator something to click on.
    if let Err(e) = store::ensure_exists(&catalog_path) {
        eprintln!("⚠️  {}", e);
    }

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let app = tui::app::App::new(config, catalog_path);
    let res = tui::events::run_app(&mut terminal, app);

    // Restore Terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    res
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_group_command() {
        let matches = cli()
            .try_get_matches_from(["runonserver", "group", "Home", "Update"])
            .unwrap();
        let (name, args) = matches.subcommand().unwrap();
        assert_eq!(name, "group");
        assert_eq!(required(args, "category"), "Home");
        assert_eq!(required(args, "command"), "Update");
    }

    #[test]
    fn test_command_scope_resolution() {
        let matches = cli()
            .try_get_matches_from(["runonserver", "command", "add", "Up", "uptime", "--global"])
            .unwrap();
        let (_, sub) = matches.subcommand().unwrap();
        let (_, args) = sub.subcommand().unwrap();
        assert_eq!(command_scope(args).unwrap(), CommandScope::Global);

        let matches = cli()
            .try_get_matches_from([
                "runonserver", "command", "add", "Up", "uptime", "--server", "web", "-c", "Prod",
            ])
            .unwrap();
        let (_, sub) = matches.subcommand().unwrap();
        let (_, args) = sub.subcommand().unwrap();
        assert_eq!(
            command_scope(args).unwrap(),
            CommandScope::Server {
                name: "web".to_string(),
                category: Some("Prod".to_string()),
            }
        );

        let matches = cli()
            .try_get_matches_from(["runonserver", "command", "remove", "Up", "-c", "Home"])
            .unwrap();
        let (_, sub) = matches.subcommand().unwrap();
        let (_, args) = sub.subcommand().unwrap();
        assert_eq!(
            command_scope(args).unwrap(),
            CommandScope::Category("Home".to_string())
        );
    }

    /// Arguments of the innermost subcommand.
    fn leaf_args(argv: &[&str]) -> ArgMatches {
        fn leaf(matches: &ArgMatches) -> ArgMatches {
            match matches.subcommand() {
                Some((_, sub)) => leaf(sub),
                None => matches.clone(),
            }
        }
        leaf(&cli().try_get_matches_from(argv.iter().copied()).unwrap())
    }

    fn edit_catalog() -> Catalog {
        let mut web = Server::new("web", "10.0.0.5", "deploy", "Work");
        web.commands.push(RemoteCommand::new("Logs", "journalctl -f", false));
        let mut catalog = Catalog {
            servers: vec![web],
            ..Catalog::default()
        };
        catalog
            .global_commands
            .push(RemoteCommand::new("Uptime", "uptime", false));
        catalog
    }

    #[test]
    fn test_server_edit_keeps_commands() {
        let mut catalog = edit_catalog();
        let args = leaf_args(&[
            "runonserver", "server", "edit", "web", "--host", "10.0.0.6", "--user", "ops",
            "--rename", "web-1",
        ]);

        assert_eq!(edit_server(&mut catalog, &args).unwrap(), "web-1");
        let server = catalog.find_server("web-1", Some("Work")).unwrap();
        assert_eq!(server.destination(), "ops@10.0.0.6");
        assert_eq!(server.commands.len(), 1);
        assert!(catalog.find_server("web", None).is_none());
    }

    #[test]
    fn test_server_edit_unknown_server() {
        let mut catalog = edit_catalog();
        let args = leaf_args(&["runonserver", "server", "edit", "db", "--host", "x"]);
        assert!(edit_server(&mut catalog, &args).is_err());
    }

    #[test]
    fn test_command_edit_on_server_and_global() {
        let mut catalog = edit_catalog();
        let args = leaf_args(&[
            "runonserver", "command", "edit", "Logs", "--text", "journalctl -n 50", "--hold",
            "--server", "web",
        ]);
        let (scope, name) = edit_command(&mut catalog, &args).unwrap();
        assert_eq!(name, "Logs");
        assert_eq!(
            scope,
            CommandScope::Server {
                name: "web".to_string(),
                category: None
            }
        );
        let logs = catalog.find_server("web", None).unwrap().find_command("Logs").unwrap();
        assert_eq!(logs.command, "journalctl -n 50");
        assert!(logs.hold_terminal);

        let args = leaf_args(&[
            "runonserver", "command", "edit", "Uptime", "--rename", "Load", "--global",
        ]);
        edit_command(&mut catalog, &args).unwrap();
        assert!(catalog.find_global_command("Load").is_some());
        assert_eq!(catalog.find_global_command("Load").unwrap().command, "uptime");
    }

    #[test]
    fn test_command_edit_hold_flags_conflict() {
        let result = cli().try_get_matches_from([
            "runonserver", "command", "edit", "Up", "--hold", "--no-hold", "--global",
        ]);
        assert!(result.is_err());
    }

    struct NoPrograms;

    impl runonserver::ops::terminal::ProgramLocator for NoPrograms {
        fn is_available(&self, _program: &str) -> bool {
            false
        }
    }

    struct NeverSpawns;

    impl runonserver::ops::dispatch::ProcessSpawner for NeverSpawns {
        fn spawn_detached(&self, _program: &str, _args: &[String]) -> std::io::Result<()> {
            panic!("nothing should be spawned without a terminal")
        }
    }

    #[tokio::test]
    async fn test_broadcast_report_fails_when_no_terminal_launched() {
        use runonserver::ops::invocation::InvocationBuilder;
        use runonserver::ops::terminal::TerminalResolver;

        let mut catalog = edit_catalog();
        catalog.servers.push(Server::new("db", "10.0.0.7", "pg", "Work"));
        let (tx, rx) = mpsc::channel();
        let resolver = TerminalResolver::new(&["xterm".to_string()], Arc::new(NoPrograms));
        let dispatcher = Arc::new(
            Dispatcher::new(InvocationBuilder::default(), resolver, Arc::new(NeverSpawns))
                .with_notices(tx),
        );

        let command = catalog.global_commands[0].clone();
        let broadcast = dispatcher.launch_global(&catalog, &command);
        let err = report_broadcast(&command, broadcast, &rx).await.unwrap_err();
        assert_eq!(err.to_string(), "2 of 2 launches failed");
    }

    #[test]
    fn test_cli_global_catalog_flag_after_subcommand() {
        let matches = cli()
            .try_get_matches_from(["runonserver", "list", "--catalog", "/tmp/x.yaml"])
            .unwrap();
        assert_eq!(
            matches.get_one::<String>("catalog").map(String::as_str),
            Some("/tmp/x.yaml")
        );
    }
}
