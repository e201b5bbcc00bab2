use anyhow::{bail, Context, Result};
use colored::Colorize;
use lvlup::installer::ArkadeInstaller;
use lvlup::inventory::list_installed;
use lvlup::manifest::Manifest;
use lvlup::paths::LvlupPaths;
use lvlup::reconcile::{
    BinaryRemoval, InstallOutcome, InstallStatus, Options, Reconciler, RemoveOutcome, Report,
    Request, StatusReport, SyncSummary,
};
use lvlup::shell::{path_block, ShellKind, ShellSetup};
use lvlup::util::parse_tool_names;
use crate::cli::{LvlupCommand, CLI};

pub fn execute(cli: CLI) -> Result<()> {
    let paths = LvlupPaths::resolve().context("Error getting config directory")?;
    let Some((request, options)) = build_request(cli.command)? else {
        return execute_config_shell(&paths);
    };
    paths.ensure_dirs()?;
    let manifest = open_manifest(&paths)?;

    if request == (Request::Sync { force: true }) {
        println!("Force synchronization initiated...");
    }
    let mut reconciler = Reconciler::new(&paths, manifest, ArkadeInstaller::new());
    let report = reconciler.handle(&request, options)?;

    match report {
        Report::Install(outcomes) => print_installs(&outcomes),
        Report::Remove(outcomes) => print_removals(&outcomes),
        Report::Sync(summary) => print_sync(&summary),
        Report::Status(status) => print_status(&status),
    }
    Ok(())
}

fn open_manifest(paths: &LvlupPaths) -> Result<Manifest> {
    let (manifest, initialized) = Manifest::load_or_init(&paths.manifest, &paths.bin_dir)
        .with_context(|| format!("Error reading config {}", paths.manifest.display()))?;
    if initialized {
        println!("Config file not found. Initialized a new configuration file.");
        println!("Configuration file has been created at: {}", paths.manifest.display());
        if !manifest.is_empty() {
            println!("Tools added to the configuration: {}", manifest.tools().join(", "));
        }
        let skipped: Vec<String> = list_installed(&paths.bin_dir)?
            .into_iter()
            .filter(|name| !manifest.contains(name))
            .collect();
        if !skipped.is_empty() {
            println!(
                "{}",
                format!(
                    "Not added, not valid tool names: {}. `sync --force` will delete them.",
                    skipped.join(", ")
                )
                .yellow()
            );
        }
    }
    Ok(manifest)
}

/// Maps the command line onto a reconciler request. `config-shell` needs no
/// manifest and yields `None`.
fn build_request(command: Option<LvlupCommand>) -> Result<Option<(Request, Options)>> {
    let built = match command {
        None => (Request::Status, Options::default()),
        Some(LvlupCommand::Sync { force, passthrough }) => {
            (Request::Sync { force }, Options { show_output: passthrough })
        }
        Some(LvlupCommand::Get { tools, force, passthrough }) => {
            let tools = parse_tool_names(&tools);
            if tools.is_empty() {
                bail!("No valid tool names given");
            }
            (Request::Get { tools, force }, Options { show_output: passthrough })
        }
        Some(LvlupCommand::Remove { tools }) => {
            let tools = parse_tool_names(&tools);
            if tools.is_empty() {
                bail!("No valid tool names given");
            }
            (Request::Remove { tools }, Options::default())
        }
        Some(LvlupCommand::ConfigShell) => return Ok(None),
    };
    Ok(Some(built))
}

fn print_installs(outcomes: &[InstallOutcome]) {
    for outcome in outcomes {
        if outcome.added {
            println!("Added {} to the configuration file.", outcome.tool);
        }
        match &outcome.status {
            InstallStatus::Installed => {
                println!("{}", format!("Successfully installed {}.", outcome.tool).green());
            }
            InstallStatus::AlreadyInstalled => {
                println!("Tool: {} already installed. Skipping...", outcome.tool);
            }
            InstallStatus::Failed(reason) => {
                let message = format!(
                    "Error: Failed to install {} via arkade. Moving on to the next tool.",
                    outcome.tool
                );
                println!("{}", message.red());
                println!("  {}", reason.as_str().dimmed());
            }
        }
    }
}

fn print_removals(outcomes: &[RemoveOutcome]) {
    for outcome in outcomes {
        let tool = &outcome.tool;
        match outcome.undeclared {
            true => println!("Removed {} from the configuration file.", tool),
            false => println!("{}", format!("{} is not in the configuration file.", tool).dimmed()),
        }
        match &outcome.binary {
            BinaryRemoval::Deleted => println!("{}", format!("Deleted binary {}.", tool).green()),
            BinaryRemoval::Absent => {
                println!("{}", format!("No binary found for {}.", tool).dimmed())
            }
            BinaryRemoval::Failed(reason) => {
                println!("{}", format!("Failed to remove tool {}: {}", tool, reason).red());
            }
        }
    }
}

fn print_sync(summary: &SyncSummary) {
    if summary.forced {
        if summary.pruned.is_empty() {
            println!("No extraneous tools found.");
        }
        for pruned in &summary.pruned {
            let tool = &pruned.tool;
            match &pruned.binary {
                BinaryRemoval::Deleted => println!("Found extraneous tool: {}. Removed.", tool),
                BinaryRemoval::Absent => println!("Found extraneous tool: {}. Already gone.", tool),
                BinaryRemoval::Failed(reason) => println!(
                    "{}",
                    format!("Failed to remove extraneous tool {}: {}", tool, reason).red()
                ),
            }
        }
    }
    print_installs(&summary.installs);

    match summary.failures() {
        0 if summary.was_in_sync() => println!("{}", "Everything is in sync!".green().bold()),
        0 => println!("{}", "Synchronization complete.".green().bold()),
        n => println!("{}", format!("{} tool(s) could not be synced.", n).yellow()),
    }
}

fn print_status(status: &StatusReport) {
    println!("----- Sync State -----");
    if status.declared_not_installed.is_empty() {
        println!("{}", "All tools in the config are installed!".green());
    } else {
        println!("Tools in config but not installed: {}", status.declared_not_installed.join(", "));
    }
    if status.installed_not_declared.is_empty() {
        println!("{}", "All installed tools are in the config!".green());
    } else {
        println!("Tools installed but not in config: {}", status.installed_not_declared.join(", "));
    }
    println!("----------------------");
    if !status.is_in_sync() {
        println!("Run `arkade-lvlup sync` to install missing tools, `sync --force` to also prune.");
    }

    if status.managed.is_empty() {
        println!("No tools are currently managed by arkade-lvlup.");
    } else {
        println!("Tools managed by arkade-lvlup:");
        for tool in &status.managed {
            println!("- {}", tool);
        }
    }
}

fn execute_config_shell(paths: &LvlupPaths) -> Result<()> {
    let shell = std::env::var("SHELL").unwrap_or_default();
    let kind = ShellKind::detect(&shell)?;
    let exe = std::env::current_exe().context("Error determining the arkade-lvlup location")?;
    let exe_dir = exe.parent().context("Error determining the arkade-lvlup location")?;
    let home = paths.config_dir.parent().context("Error getting home directory")?;

    let block = path_block(home, &paths.bin_dir, exe_dir);
    let setup = ShellSetup::inspect(home, kind, block)?;
    if setup.configured {
        println!("Configuration already set up in {}.", setup.rc_path.display());
        return Ok(());
    }
    println!(
        "Add the following to {} to put your arkade tools on the PATH:",
        setup.rc_path.display()
    );
    println!();
    println!("{}", setup.block);
    Ok(())
}
