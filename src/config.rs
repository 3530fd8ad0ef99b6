//! Optional user configuration.
//!
//! Everything has a default, so a missing file is the same as an empty one:
//!
//! ```toml
//! source = "apt"
//! priority = ["pacman", "apt", "zypper"]
//! assume_yes = false
//! sudo = true
//! fallback_dirs = ["/usr/bin", "/usr/sbin"]
//!
//! [commands.apt]
//! install = [["apt-get", "install"]]
//! search = []
//! ```

use anyhow::{Context, Result, anyhow, bail};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::common::paths;
use crate::package::detect::DEFAULT_FALLBACK_DIRS;
use crate::package::{Action, CommandTable, PackageManager, Step};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Package manager to use instead of auto-detection
    pub source: Option<String>,
    /// Detection order
    pub priority: Option<Vec<String>>,
    /// Always pass the manager's non-interactive flag
    pub assume_yes: bool,
    /// Run native managers through sudo
    pub sudo: bool,
    /// Directories probed when a manager is not on PATH
    pub fallback_dirs: Option<Vec<PathBuf>>,
    /// Per-manager command table overrides, keyed by manager name
    pub commands: BTreeMap<String, ActionOverrides>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source: None,
            priority: None,
            assume_yes: false,
            sudo: true,
            fallback_dirs: None,
            commands: BTreeMap::new(),
        }
    }
}

/// Replacement steps for individual actions. An empty list removes the action.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ActionOverrides {
    pub install: Option<Vec<Vec<String>>>,
    pub remove: Option<Vec<Vec<String>>>,
    pub update: Option<Vec<Vec<String>>>,
    pub search: Option<Vec<Vec<String>>>,
    pub cleanup: Option<Vec<Vec<String>>>,
}

impl ActionOverrides {
    fn entries(&self) -> impl Iterator<Item = (Action, &Vec<Vec<String>>)> {
        [
            (Action::Install, &self.install),
            (Action::Remove, &self.remove),
            (Action::Update, &self.update),
            (Action::Search, &self.search),
            (Action::Cleanup, &self.cleanup),
        ]
        .into_iter()
        .filter_map(|(action, steps)| steps.as_ref().map(|s| (action, s)))
    }
}

impl Config {
    /// Load the config from `explicit`, or from the default location.
    ///
    /// An explicit path must exist; the default one is optional.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load_from_path(path);
        }

        let path = match paths::default_config_path() {
            Ok(path) => path,
            Err(_) => return Ok(Self::default()),
        };
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load_from_path(path)
    }

    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("loading config file {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).context("parsing derpkg config")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.priority()?;
        self.command_table()?;
        Ok(())
    }

    /// Detection order, without duplicates.
    pub fn priority(&self) -> Result<Vec<PackageManager>> {
        let Some(names) = &self.priority else {
            return Ok(PackageManager::DEFAULT_PRIORITY.to_vec());
        };
        if names.is_empty() {
            bail!("priority must name at least one package manager");
        }

        let mut order = Vec::with_capacity(names.len());
        for name in names {
            let manager = parse_manager(name).context("invalid entry in priority")?;
            if !order.contains(&manager) {
                order.push(manager);
            }
        }
        Ok(order)
    }

    pub fn fallback_dirs(&self) -> Vec<PathBuf> {
        self.fallback_dirs
            .clone()
            .unwrap_or_else(|| DEFAULT_FALLBACK_DIRS.iter().map(PathBuf::from).collect())
    }

    /// Built-in tables with the `[commands.*]` overrides applied.
    pub fn command_table(&self) -> Result<CommandTable> {
        let mut table = CommandTable::builtin();
        for (name, overrides) in &self.commands {
            let manager = parse_manager(name).context("invalid [commands] section")?;
            for (action, steps) in overrides.entries() {
                if steps.iter().any(|step| step.is_empty() || step[0].trim().is_empty()) {
                    bail!("commands.{name}.{action} contains an empty command");
                }
                let steps = steps
                    .iter()
                    .map(|argv| Step::new(action, argv.clone()))
                    .collect();
                table.set(manager, action, steps);
            }
        }
        Ok(table)
    }
}

fn parse_manager(name: &str) -> Result<PackageManager> {
    name.parse::<PackageManager>().map_err(|e| anyhow!(e))
}
