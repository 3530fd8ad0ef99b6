//! Picking the package manager for this run.

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use crate::error::DerpkgError;
use crate::ui::prelude::*;

use super::PackageManager;

/// Directories checked after `PATH`. `sudo` and some login shells strip
/// `PATH` down, so a manager can be installed but not resolvable through it.
pub const DEFAULT_FALLBACK_DIRS: &[&str] = &[
    "/usr/bin",
    "/usr/local/bin",
    "/bin",
    "/sbin",
    "/usr/sbin",
    "/usr/local/sbin",
];

/// Answers "where does this executable live on the host".
pub trait Probe {
    fn locate(&self, binary: &str) -> Option<PathBuf>;
}

/// Looks binaries up on `PATH`, then in a list of fallback directories.
#[derive(Debug, Clone)]
pub struct SystemProbe {
    fallback_dirs: Vec<PathBuf>,
}

impl SystemProbe {
    pub fn new(fallback_dirs: Vec<PathBuf>) -> Self {
        Self { fallback_dirs }
    }
}

impl Default for SystemProbe {
    fn default() -> Self {
        Self::new(DEFAULT_FALLBACK_DIRS.iter().map(PathBuf::from).collect())
    }
}

impl Probe for SystemProbe {
    fn locate(&self, binary: &str) -> Option<PathBuf> {
        if let Ok(path) = which::which(binary) {
            return Some(path);
        }
        self.fallback_dirs
            .iter()
            .map(|dir| dir.join(binary))
            .find(|candidate| is_executable(candidate))
    }
}

fn is_executable(path: &Path) -> bool {
    path.metadata()
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

/// The manager chosen for this run and the executable that backs it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub manager: PackageManager,
    pub path: PathBuf,
}

pub struct Detector<'a, P: Probe> {
    probe: &'a P,
    priority: &'a [PackageManager],
}

impl<'a, P: Probe> Detector<'a, P> {
    pub fn new(probe: &'a P, priority: &'a [PackageManager]) -> Self {
        Self { probe, priority }
    }

    pub fn locate(&self, manager: PackageManager) -> Option<Selection> {
        self.probe
            .locate(manager.binary())
            .map(|path| Selection { manager, path })
    }

    /// Every resolvable manager, in priority order.
    pub fn available(&self) -> Vec<Selection> {
        self.priority
            .iter()
            .filter_map(|manager| self.locate(*manager))
            .collect()
    }

    /// Select the manager for this run.
    ///
    /// An override must resolve; it never falls back to auto-detection.
    /// Without one, the first resolvable manager in priority order wins.
    pub fn select(&self, source: Option<&str>) -> Result<Selection, DerpkgError> {
        match source {
            Some(name) => self.select_override(name),
            None => {
                let selection = self
                    .priority
                    .iter()
                    .find_map(|manager| self.locate(*manager))
                    .ok_or(DerpkgError::NoManagerFound)?;
                emit(
                    Level::Debug,
                    "detect.selected",
                    &format!(
                        "Detected {} at {}",
                        selection.manager,
                        selection.path.display()
                    ),
                    None,
                );
                Ok(selection)
            }
        }
    }

    fn select_override(&self, name: &str) -> Result<Selection, DerpkgError> {
        let unsupported = || DerpkgError::UnsupportedManager {
            requested: name.to_string(),
            available: self.available().into_iter().map(|s| s.manager).collect(),
        };

        let manager: PackageManager = name.parse().map_err(|_| unsupported())?;
        self.locate(manager).ok_or_else(unsupported)
    }

    /// Offer each available add-on manager in place of a detected native one.
    ///
    /// `confirm(addon, native)` decides; the first accepted add-on replaces the
    /// selection. Anything else keeps the current choice.
    pub fn prefer_addon<F>(&self, selection: Selection, mut confirm: F) -> Selection
    where
        F: FnMut(PackageManager, PackageManager) -> bool,
    {
        if !selection.manager.is_native() {
            return selection;
        }

        self.available()
            .into_iter()
            .filter(|candidate| candidate.manager.is_addon())
            .find(|candidate| confirm(candidate.manager, selection.manager))
            .unwrap_or(selection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    /// Host with a fixed set of installed binaries.
    pub struct FakeProbe {
        present: HashMap<&'static str, PathBuf>,
    }

    impl FakeProbe {
        pub fn with(binaries: &[&'static str]) -> Self {
            let present = binaries
                .iter()
                .map(|b| (*b, PathBuf::from(format!("/usr/bin/{b}"))))
                .collect();
            Self { present }
        }
    }

    impl Probe for FakeProbe {
        fn locate(&self, binary: &str) -> Option<PathBuf> {
            self.present.get(binary).cloned()
        }
    }

    fn detect(binaries: &[&'static str], source: Option<&str>) -> Result<Selection, DerpkgError> {
        let probe = FakeProbe::with(binaries);
        Detector::new(&probe, &PackageManager::DEFAULT_PRIORITY).select(source)
    }

    #[test]
    fn test_no_manager_found() {
        let err = detect(&[], None).unwrap_err();
        assert!(matches!(err, DerpkgError::NoManagerFound));
    }

    #[test]
    fn test_only_apt() {
        let selection = detect(&["apt"], None).unwrap();
        assert_eq!(selection.manager, PackageManager::Apt);
        assert_eq!(selection.path, PathBuf::from("/usr/bin/apt"));
    }

    #[test]
    fn test_pacman_wins_over_yay() {
        let selection = detect(&["yay", "pacman"], None).unwrap();
        assert_eq!(selection.manager, PackageManager::Pacman);
    }

    #[test]
    fn test_addon_used_when_nothing_native() {
        let selection = detect(&["flatpak", "yay"], None).unwrap();
        assert_eq!(selection.manager, PackageManager::Yay);
    }

    #[test]
    fn test_override_selects_named_manager() {
        let selection = detect(&["pacman", "flatpak"], Some("Flatpak")).unwrap();
        assert_eq!(selection.manager, PackageManager::Flatpak);
    }

    #[test]
    fn test_unresolvable_override_does_not_fall_back() {
        let err = detect(&["apt", "flatpak"], Some("zypper")).unwrap_err();
        match err {
            DerpkgError::UnsupportedManager {
                requested,
                available,
            } => {
                assert_eq!(requested, "zypper");
                assert_eq!(available, vec![PackageManager::Apt, PackageManager::Flatpak]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_unknown_override_name() {
        let err = detect(&["apt"], Some("dnf")).unwrap_err();
        assert!(matches!(err, DerpkgError::UnsupportedManager { .. }));
    }

    #[test]
    fn test_custom_priority() {
        let probe = FakeProbe::with(&["pacman", "flatpak"]);
        let priority = [PackageManager::Flatpak, PackageManager::Pacman];
        let selection = Detector::new(&probe, &priority).select(None).unwrap();
        assert_eq!(selection.manager, PackageManager::Flatpak);
    }

    #[test]
    fn test_priority_excludes_unlisted() {
        let probe = FakeProbe::with(&["zypper"]);
        let priority = [PackageManager::Pacman, PackageManager::Apt];
        let err = Detector::new(&probe, &priority).select(None).unwrap_err();
        assert!(matches!(err, DerpkgError::NoManagerFound));
    }

    #[test]
    fn test_prefer_addon_accepted() {
        let probe = FakeProbe::with(&["pacman", "yay", "flatpak"]);
        let detector = Detector::new(&probe, &PackageManager::DEFAULT_PRIORITY);
        let native = detector.select(None).unwrap();

        let mut asked = Vec::new();
        let chosen = detector.prefer_addon(native, |addon, _| {
            asked.push(addon);
            addon == PackageManager::Flatpak
        });

        assert_eq!(chosen.manager, PackageManager::Flatpak);
        assert_eq!(asked, vec![PackageManager::Yay, PackageManager::Flatpak]);
    }

    #[test]
    fn test_prefer_addon_declined() {
        let probe = FakeProbe::with(&["apt", "flatpak"]);
        let detector = Detector::new(&probe, &PackageManager::DEFAULT_PRIORITY);
        let native = detector.select(None).unwrap();
        let chosen = detector.prefer_addon(native.clone(), |_, _| false);
        assert_eq!(chosen, native);
    }

    #[test]
    fn test_prefer_addon_skips_when_addon_selected() {
        let probe = FakeProbe::with(&["flatpak"]);
        let detector = Detector::new(&probe, &PackageManager::DEFAULT_PRIORITY);
        let selection = detector.select(None).unwrap();
        let chosen = detector.prefer_addon(selection, |_, _| panic!("should not ask"));
        assert_eq!(chosen.manager, PackageManager::Flatpak);
    }

    #[test]
    fn test_system_probe_fallback_dir() {
        let dir = tempfile::tempdir().unwrap();
        let bin = dir.path().join("derpkg-fake-manager");
        std::fs::write(&bin, "#!/bin/sh\n").unwrap();
        std::fs::set_permissions(&bin, std::fs::Permissions::from_mode(0o755)).unwrap();

        let probe = SystemProbe::new(vec![dir.path().to_path_buf()]);
        assert_eq!(probe.locate("derpkg-fake-manager"), Some(bin.clone()));

        std::fs::set_permissions(&bin, std::fs::Permissions::from_mode(0o644)).unwrap();
        assert_eq!(probe.locate("derpkg-fake-manager"), None);
    }
}
