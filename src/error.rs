use std::io;

use thiserror::Error;

use crate::package::{Action, PackageManager};

pub const EXIT_FAILURE: i32 = 1;
pub const EXIT_USAGE: i32 = 2;
pub const EXIT_NO_MANAGER: i32 = 3;
pub const EXIT_UNSUPPORTED_MANAGER: i32 = 4;
pub const EXIT_UNSUPPORTED_ACTION: i32 = 5;
pub const EXIT_INTERRUPTED: i32 = 130;

/// Failures raised by the wrapper itself.
///
/// A native package manager exiting non-zero is not one of these: its code is
/// handed back to the caller untouched.
#[derive(Debug, Error)]
pub enum DerpkgError {
    #[error("No supported package manager found on this system")]
    NoManagerFound,

    #[error("Package manager '{requested}' not found or not available{}", list_available(.available))]
    UnsupportedManager {
        requested: String,
        available: Vec<PackageManager>,
    },

    #[error("{manager} does not support '{action}'")]
    UnsupportedAction {
        manager: PackageManager,
        action: Action,
        /// Actions the manager's effective table does map.
        supported: Vec<Action>,
    },

    #[error("No packages specified for {0}")]
    MissingPackages(Action),

    #[error("Invalid package name: {0:?}")]
    InvalidPackage(String),

    #[error("Failed to run {program}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
}

impl DerpkgError {
    pub fn exit_code(&self) -> i32 {
        match self {
            DerpkgError::NoManagerFound => EXIT_NO_MANAGER,
            DerpkgError::UnsupportedManager { .. } => EXIT_UNSUPPORTED_MANAGER,
            DerpkgError::UnsupportedAction { .. } => EXIT_UNSUPPORTED_ACTION,
            DerpkgError::MissingPackages(_) | DerpkgError::InvalidPackage(_) => EXIT_USAGE,
            DerpkgError::Spawn { .. } => EXIT_FAILURE,
        }
    }

    /// Extra guidance printed below the error message.
    pub fn hint(&self) -> Option<String> {
        match self {
            DerpkgError::NoManagerFound => Some(format!(
                "Install one of: {}",
                PackageManager::ALL
                    .iter()
                    .map(|m| m.binary())
                    .collect::<Vec<_>>()
                    .join(", ")
            )),
            DerpkgError::UnsupportedAction {
                manager, supported, ..
            } => {
                if supported.is_empty() {
                    return None;
                }
                let names: Vec<&str> = supported.iter().map(|a| a.as_str()).collect();
                Some(format!("{} supports: {}", manager, names.join(", ")))
            }
            _ => None,
        }
    }
}

fn list_available(available: &[PackageManager]) -> String {
    if available.is_empty() {
        return String::new();
    }
    let names: Vec<&str> = available.iter().map(|m| m.binary()).collect();
    format!(" (available: {})", names.join(", "))
}
