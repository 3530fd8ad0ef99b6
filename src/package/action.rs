use serde::Serialize;

/// Distro-agnostic verbs the wrapper exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Install,
    Remove,
    Update,
    Search,
    /// Drop runtimes nothing depends on anymore
    Cleanup,
}

impl Action {
    pub const ALL: [Action; 5] = [
        Action::Install,
        Action::Remove,
        Action::Update,
        Action::Search,
        Action::Cleanup,
    ];

    /// Whether package names are appended to the native command.
    pub fn takes_packages(&self) -> bool {
        matches!(self, Action::Install | Action::Remove | Action::Search)
    }

    /// Search is read-only; everything else may prompt for confirmation.
    pub fn mutates(&self) -> bool {
        !matches!(self, Action::Search)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Install => "install",
            Action::Remove => "remove",
            Action::Update => "update",
            Action::Search => "search",
            Action::Cleanup => "cleanup",
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_takes_packages() {
        assert!(Action::Install.takes_packages());
        assert!(Action::Remove.takes_packages());
        assert!(Action::Search.takes_packages());
        assert!(!Action::Update.takes_packages());
        assert!(!Action::Cleanup.takes_packages());
    }

    #[test]
    fn test_search_is_read_only() {
        assert!(!Action::Search.mutates());
        assert!(Action::Update.mutates());
    }
}
