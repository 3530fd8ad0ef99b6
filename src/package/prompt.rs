use dialoguer::Confirm;

use super::PackageManager;

/// Ask whether `addon` should be used instead of `native`. Defaults to no;
/// a cancelled or failed prompt also counts as no.
pub fn confirm_addon(addon: PackageManager, native: PackageManager) -> bool {
    Confirm::new()
        .with_prompt(format!("Use {addon} instead of {native}?"))
        .default(false)
        .interact()
        .unwrap_or(false)
}
