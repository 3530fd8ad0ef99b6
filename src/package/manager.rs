//! Package manager identities and their fixed traits.

use std::str::FromStr;

use serde::Serialize;

/// The package managers derpkg knows how to drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageManager {
    /// Pacman - Arch Linux family
    Pacman,
    /// APT - Debian/Ubuntu family
    Apt,
    /// Zypper - openSUSE
    Zypper,
    /// Flatpak - sandboxed apps from Flathub
    Flatpak,
    /// Yay - AUR helper on Arch
    Yay,
}

/// Where a manager expects its "don't ask me" flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmFlag {
    /// Appended after the subcommand template, before package names.
    Append(&'static str),
    /// Global option that must precede the subcommand.
    Global(&'static str),
}

impl PackageManager {
    pub const ALL: [PackageManager; 5] = [
        PackageManager::Pacman,
        PackageManager::Apt,
        PackageManager::Zypper,
        PackageManager::Flatpak,
        PackageManager::Yay,
    ];

    /// Detection order used when the config doesn't set one.
    ///
    /// Native managers come first; add-ons only win on hosts without one.
    pub const DEFAULT_PRIORITY: [PackageManager; 5] = [
        PackageManager::Pacman,
        PackageManager::Apt,
        PackageManager::Zypper,
        PackageManager::Yay,
        PackageManager::Flatpak,
    ];

    /// Executable name looked up on the host.
    pub fn binary(&self) -> &'static str {
        match self {
            Self::Pacman => "pacman",
            Self::Apt => "apt",
            Self::Zypper => "zypper",
            Self::Flatpak => "flatpak",
            Self::Yay => "yay",
        }
    }

    /// Returns true for the distribution's own package manager.
    pub fn is_native(&self) -> bool {
        matches!(self, Self::Pacman | Self::Apt | Self::Zypper)
    }

    /// Returns true for managers layered on top of a native one.
    pub fn is_addon(&self) -> bool {
        !self.is_native()
    }

    /// Native managers write to system locations and run through sudo.
    /// Flatpak installs per user and yay escalates on its own.
    pub fn needs_privileges(&self) -> bool {
        self.is_native()
    }

    pub fn confirm_flag(&self) -> ConfirmFlag {
        match self {
            Self::Pacman | Self::Yay => ConfirmFlag::Append("--noconfirm"),
            Self::Apt | Self::Flatpak => ConfirmFlag::Append("-y"),
            Self::Zypper => ConfirmFlag::Global("--non-interactive"),
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Pacman => "Pacman",
            Self::Apt => "APT",
            Self::Zypper => "Zypper",
            Self::Flatpak => "Flatpak",
            Self::Yay => "Yay",
        }
    }

    pub fn kind(&self) -> &'static str {
        if self.is_native() { "native" } else { "add-on" }
    }
}

impl std::fmt::Display for PackageManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownManager(pub String);

impl std::fmt::Display for UnknownManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown package manager '{}'", self.0)
    }
}

impl std::error::Error for UnknownManager {}

impl FromStr for PackageManager {
    type Err = UnknownManager;

    /// Names are matched case-insensitively, so `Flatpak` and `APT` work.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|m| m.binary().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UnknownManager(s.to_string()))
    }
}
