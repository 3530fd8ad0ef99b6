//! Static action → command tables for every manager.
//!
//! Adding a manager means adding a table here, not branching in the dispatcher.

use std::collections::BTreeMap;

use super::{Action, PackageManager};

/// A built-in command line; the first element is the program.
struct Template {
    args: &'static [&'static str],
    packages: bool,
}

/// Package names are appended if the action takes any.
const fn step(args: &'static [&'static str]) -> Template {
    Template {
        args,
        packages: true,
    }
}

/// Runs as written, even for actions that take packages.
const fn fixed(args: &'static [&'static str]) -> Template {
    Template {
        args,
        packages: false,
    }
}

/// Each action maps to the ordered steps it runs.
type Entries = &'static [(Action, &'static [Template])];

const PACMAN: Entries = &[
    (Action::Search, &[step(&["pacman", "-Ss"])]),
    (Action::Install, &[step(&["pacman", "-S"])]),
    (Action::Update, &[step(&["pacman", "-Syu"])]),
    (Action::Remove, &[step(&["pacman", "-Rs"])]),
];

const APT: Entries = &[
    (Action::Search, &[step(&["apt", "search"])]),
    (Action::Install, &[step(&["apt", "install"])]),
    (
        Action::Update,
        &[step(&["apt", "update"]), step(&["apt", "upgrade"])],
    ),
    (Action::Remove, &[step(&["apt", "autoremove", "--purge"])]),
];

const ZYPPER: Entries = &[
    (Action::Search, &[step(&["zypper", "search", "-s"])]),
    (Action::Install, &[step(&["zypper", "install"])]),
    (Action::Update, &[step(&["zypper", "dup"])]),
    (Action::Remove, &[step(&["zypper", "remove", "--clean-deps"])]),
];

// Removing an app leaves its runtimes behind, so remove also drops unused ones.
const FLATPAK: Entries = &[
    (Action::Search, &[step(&["flatpak", "search"])]),
    (Action::Install, &[step(&["flatpak", "install", "flathub"])]),
    (Action::Update, &[step(&["flatpak", "update"])]),
    (
        Action::Remove,
        &[
            step(&["flatpak", "uninstall"]),
            fixed(&["flatpak", "uninstall", "--unused"]),
        ],
    ),
    (Action::Cleanup, &[fixed(&["flatpak", "uninstall", "--unused"])]),
];

const YAY: Entries = &[
    (Action::Search, &[step(&["yay", "-Ss"])]),
    (Action::Install, &[step(&["yay", "-S"])]),
    (Action::Update, &[step(&["yay", "-Syu"])]),
    (Action::Remove, &[step(&["yay", "-Rs"])]),
];

fn builtin_entries(manager: PackageManager) -> Entries {
    match manager {
        PackageManager::Pacman => PACMAN,
        PackageManager::Apt => APT,
        PackageManager::Zypper => ZYPPER,
        PackageManager::Flatpak => FLATPAK,
        PackageManager::Yay => YAY,
    }
}

/// One native command line of a plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub argv: Vec<String>,
    /// Package names are appended to this step.
    pub with_packages: bool,
}

impl Step {
    /// A step of `action`, taking packages whenever the action does.
    pub fn new(action: Action, argv: Vec<String>) -> Self {
        Self {
            argv,
            with_packages: action.takes_packages(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandTable {
    entries: BTreeMap<(PackageManager, Action), Vec<Step>>,
}

impl CommandTable {
    /// The tables compiled into the binary.
    pub fn builtin() -> Self {
        let mut entries = BTreeMap::new();
        for manager in PackageManager::ALL {
            for (action, templates) in builtin_entries(manager) {
                let steps = templates
                    .iter()
                    .map(|template| Step {
                        argv: template.args.iter().map(|s| s.to_string()).collect(),
                        with_packages: template.packages && action.takes_packages(),
                    })
                    .collect();
                entries.insert((manager, *action), steps);
            }
        }
        Self { entries }
    }

    /// Replace the steps for one action. An empty list removes the mapping.
    pub fn set(&mut self, manager: PackageManager, action: Action, steps: Vec<Step>) {
        if steps.is_empty() {
            self.entries.remove(&(manager, action));
        } else {
            self.entries.insert((manager, action), steps);
        }
    }

    pub fn steps(&self, manager: PackageManager, action: Action) -> Option<&[Step]> {
        self.entries
            .get(&(manager, action))
            .map(Vec::as_slice)
            .filter(|steps| !steps.is_empty())
    }

    pub fn supports(&self, manager: PackageManager, action: Action) -> bool {
        self.steps(manager, action).is_some()
    }

    pub fn supported_actions(&self, manager: PackageManager) -> Vec<Action> {
        Action::ALL
            .into_iter()
            .filter(|action| self.supports(manager, *action))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_core_actions_everywhere() {
        let table = CommandTable::builtin();
        for manager in PackageManager::ALL {
            for action in [Action::Install, Action::Remove, Action::Update, Action::Search] {
                assert!(
                    table.supports(manager, action),
                    "{manager} should support {action}"
                );
            }
        }
    }

    #[test]
    fn test_builtin_steps_start_with_binary() {
        let table = CommandTable::builtin();
        for manager in PackageManager::ALL {
            for action in table.supported_actions(manager) {
                for step in table.steps(manager, action).unwrap() {
                    assert_eq!(step.argv[0], manager.binary());
                    assert!(step.argv.len() >= 2, "{manager} {action} has no subcommand");
                    assert!(!step.with_packages || action.takes_packages());
                }
            }
        }
    }

    #[test]
    fn test_cleanup_only_on_flatpak() {
        let table = CommandTable::builtin();
        let steps = table.steps(PackageManager::Flatpak, Action::Cleanup).unwrap();
        assert_eq!(steps.len(), 1);
        assert_eq!(steps[0].argv, vec!["flatpak", "uninstall", "--unused"]);
        assert!(!steps[0].with_packages);
        assert!(!table.supports(PackageManager::Pacman, Action::Cleanup));
        assert!(!table.supports(PackageManager::Apt, Action::Cleanup));
    }

    #[test]
    fn test_apt_update_is_two_steps() {
        let table = CommandTable::builtin();
        let steps = table.steps(PackageManager::Apt, Action::Update).unwrap();
        assert_eq!(steps.len(), 2);
        assert_eq!(steps[0].argv, vec!["apt", "update"]);
        assert_eq!(steps[1].argv, vec!["apt", "upgrade"]);
    }

    #[test]
    fn test_flatpak_remove_drops_unused_runtimes() {
        let table = CommandTable::builtin();
        let steps = table.steps(PackageManager::Flatpak, Action::Remove).unwrap();
        assert_eq!(steps.len(), 2);
        assert_eq!(steps[0].argv, vec!["flatpak", "uninstall"]);
        assert!(steps[0].with_packages);
        assert_eq!(steps[1].argv, vec!["flatpak", "uninstall", "--unused"]);
        assert!(!steps[1].with_packages);
    }

    #[test]
    fn test_set_empty_removes_mapping() {
        let mut table = CommandTable::builtin();
        table.set(PackageManager::Zypper, Action::Search, vec![]);
        assert!(!table.supports(PackageManager::Zypper, Action::Search));
        assert!(table.supports(PackageManager::Zypper, Action::Install));

        table.set(
            PackageManager::Apt,
            Action::Install,
            vec![Step::new(
                Action::Install,
                vec!["apt-get".into(), "install".into()],
            )],
        );
        let step = &table.steps(PackageManager::Apt, Action::Install).unwrap()[0];
        assert_eq!(step.argv, vec!["apt-get", "install"]);
        assert!(step.with_packages);
    }
}
