use comfy_table::{Cell, Color, ContentArrangement, Table, presets::UTF8_FULL};
use serde::Serialize;

use crate::package::{Detector, PackageManager, Probe};
use crate::ui::prelude::*;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ManagerStatus {
    pub manager: PackageManager,
    pub kind: &'static str,
    pub path: Option<String>,
}

impl ManagerStatus {
    pub fn is_available(&self) -> bool {
        self.path.is_some()
    }
}

/// Every supported manager, native ones first, with where it resolved.
pub fn collect<P: Probe>(detector: &Detector<'_, P>) -> Vec<ManagerStatus> {
    let mut managers = PackageManager::ALL.to_vec();
    managers.sort_by_key(|m| m.is_addon());
    managers
        .into_iter()
        .map(|manager| ManagerStatus {
            manager,
            kind: manager.kind(),
            path: detector
                .locate(manager)
                .map(|s| s.path.to_string_lossy().into_owned()),
        })
        .collect()
}

fn build_table(statuses: &[ManagerStatus]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Manager", "Kind", "Status", "Path"]);

    for status in statuses {
        let state = if status.is_available() {
            Cell::new("available").fg(Color::Green)
        } else {
            Cell::new("not detected").fg(Color::Yellow)
        };
        table.add_row(vec![
            Cell::new(status.manager.display_name()),
            Cell::new(status.kind),
            state,
            Cell::new(status.path.as_deref().unwrap_or("-")),
        ]);
    }
    table
}

pub fn print_managers<P: Probe>(detector: &Detector<'_, P>) {
    let statuses = collect(detector);

    match get_output_format() {
        OutputFormat::Json => emit(
            Level::Info,
            "list.managers",
            "Package managers",
            serde_json::to_value(&statuses).ok(),
        ),
        OutputFormat::Text => {
            header("Available Package Managers");
            println!("{}", build_table(&statuses));
        }
    }

    if !statuses.iter().any(ManagerStatus::is_available) {
        emit(
            Level::Warn,
            "list.none",
            "No package managers detected on this system",
            None,
        );
    }
}
