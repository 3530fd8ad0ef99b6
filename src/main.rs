mod common;
mod completions;
mod config;
mod error;
mod list;
mod package;
mod ui;

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use std::path::PathBuf;

use crate::common::privileges;
use crate::completions::CompletionCommands;
use crate::config::Config;
use crate::error::{DerpkgError, EXIT_FAILURE, EXIT_INTERRUPTED};
use crate::package::{
    Action, Detector, DispatchOptions, Dispatcher, DuctExecutor, SystemProbe, dispatch, prompt,
};
use crate::ui::prelude::*;

const EXAMPLES: &str = "\
Examples:
  derpkg search firefox              Search with the detected package manager
  derpkg install firefox             Install firefox
  derpkg install firefox -s apt      Install firefox using apt (case insensitive)
  derpkg install lutris -s Flatpak   Install lutris from Flathub
  derpkg install neofetch -s yay     Install neofetch using the yay AUR helper
  derpkg update                      Update all packages
  derpkg remove firefox -s pacman    Remove firefox with pacman
  derpkg list                        List package managers on this system";

/// Unified package manager interface
#[derive(Parser, Debug)]
#[command(name = "derpkg", author, version, about, long_about = None, after_help = EXAMPLES)]
struct Cli {
    /// Package manager to use instead of auto-detection (pacman, apt, zypper, flatpak, yay)
    #[arg(short, long, global = true, value_name = "MANAGER")]
    source: Option<String>,

    /// Pass the package manager's non-interactive confirmation flag
    #[arg(short, long, global = true)]
    yes: bool,

    /// Offer flatpak/yay instead of the detected native package manager
    #[arg(short, long, global = true)]
    ask: bool,

    /// Print the native command instead of running it
    #[arg(short = 'n', long, global = true)]
    dry_run: bool,

    /// Config file to use instead of the default location
    #[arg(short, long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Activate debug mode
    #[arg(short, long, global = true)]
    debug: bool,

    /// Output format
    #[arg(long, value_enum, global = true, default_value_t = OutputFormat::Text)]
    output: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Install packages
    #[command(visible_alias = "i")]
    Install {
        /// Packages to install
        packages: Vec<String>,
    },

    /// Remove packages
    #[command(visible_alias = "r")]
    Remove {
        /// Packages to remove
        packages: Vec<String>,
    },

    /// Update all packages
    #[command(visible_alias = "u")]
    Update,

    /// Search for packages
    #[command(visible_alias = "s")]
    Search {
        /// Search terms
        packages: Vec<String>,
        /// Render results as a table instead of the native output
        #[arg(short, long)]
        pretty: bool,
    },

    /// Remove unused runtimes (flatpak)
    Cleanup,

    /// List package managers and whether they are available
    #[command(visible_alias = "l")]
    List,

    /// Shell completion scripts
    Completions {
        #[command(subcommand)]
        command: CompletionCommands,
    },
}

impl Commands {
    fn action(&self) -> Option<Action> {
        match self {
            Commands::Install { .. } => Some(Action::Install),
            Commands::Remove { .. } => Some(Action::Remove),
            Commands::Update => Some(Action::Update),
            Commands::Search { .. } => Some(Action::Search),
            Commands::Cleanup => Some(Action::Cleanup),
            Commands::List | Commands::Completions { .. } => None,
        }
    }

    fn packages(&self) -> &[String] {
        match self {
            Commands::Install { packages }
            | Commands::Remove { packages }
            | Commands::Search { packages, .. } => packages,
            _ => &[],
        }
    }
}

pub fn cli_command() -> clap::Command {
    Cli::command()
}

fn main() {
    let cli = Cli::parse();

    ui::init(cli.output, ui::color_supported());
    ui::set_debug_mode(cli.debug);

    if let Err(e) = ctrlc::set_handler(on_interrupt) {
        emit(
            Level::Warn,
            "signal.handler",
            &format!("Could not install Ctrl-C handler: {e}"),
            None,
        );
    }

    let code = match run(cli) {
        Ok(code) => code,
        Err(err) => report(&err),
    };
    std::process::exit(code);
}

/// The child shares our terminal and gets the same SIGINT; stay alive so its
/// exit status can be relayed.
fn on_interrupt() {
    if dispatch::child_running() {
        return;
    }
    eprintln!();
    emit(
        Level::Warn,
        "signal.interrupted",
        "Operation cancelled by user",
        None,
    );
    std::process::exit(EXIT_INTERRUPTED);
}

fn run(cli: Cli) -> Result<i32> {
    // Completions must work even with a broken config.
    if let Commands::Completions { command } = cli.command {
        completions::handle_completions_command(command)?;
        return Ok(0);
    }

    let config = Config::load(cli.config.as_deref())?;
    emit(
        Level::Debug,
        "config.loaded",
        &format!("Using config: {config:?}"),
        None,
    );

    let probe = SystemProbe::new(config.fallback_dirs());
    let priority = config.priority()?;
    let detector = Detector::new(&probe, &priority);

    let Some(action) = cli.command.action() else {
        list::print_managers(&detector);
        return Ok(0);
    };

    let source = cli.source.as_deref().or(config.source.as_deref());
    let mut selection = detector.select(source)?;
    if cli.ask && source.is_none() {
        selection = detector.prefer_addon(selection, prompt::confirm_addon);
    }

    let table = config.command_table()?;
    let options = DispatchOptions {
        assume_yes: cli.yes || config.assume_yes,
        use_sudo: config.sudo && !privileges::is_root(),
        dry_run: cli.dry_run,
    };
    let dispatcher = Dispatcher::new(&table, &DuctExecutor, options);
    let packages = cli.command.packages();

    let code = match cli.command {
        Commands::Search { pretty: true, .. } => dispatcher.search_pretty(&selection, packages)?,
        _ => dispatcher.dispatch(&selection, action, packages)?,
    };
    Ok(code)
}

/// Print an error and its causes, returning the exit code it maps to.
fn report(err: &anyhow::Error) -> i32 {
    emit(Level::Error, "error", &err.to_string(), None);
    for cause in err.chain().skip(1) {
        emit(Level::Error, "error.cause", &format!("  caused by: {cause}"), None);
    }

    match err.downcast_ref::<DerpkgError>() {
        Some(derpkg_err) => {
            if let Some(hint) = derpkg_err.hint() {
                emit(Level::Hint, "error.hint", &hint, None);
            }
            derpkg_err.exit_code()
        }
        None => EXIT_FAILURE,
    }
}
