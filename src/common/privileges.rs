use sudo::RunningAs;

/// Whether derpkg itself already runs with root privileges, in which case
/// prefixing native commands with `sudo` is pointless.
pub fn is_root() -> bool {
    matches!(sudo::check(), RunningAs::Root | RunningAs::Suid)
}
