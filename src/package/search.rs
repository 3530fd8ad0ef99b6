//! Parsing native search output into a common shape for `search --pretty`.

use comfy_table::{Cell, Color, ContentArrangement, Table, presets::UTF8_FULL};
use serde::Serialize;

use crate::ui::prelude::*;

use super::PackageManager;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchHit {
    pub name: String,
    pub version: String,
    pub repository: String,
    pub installed: bool,
}

/// Parse the stdout of `manager`'s search command.
///
/// `installed` lists application IDs known to be installed; only flatpak
/// needs it since its search output doesn't say.
pub fn parse(manager: PackageManager, output: &str, installed: &[String]) -> Vec<SearchHit> {
    match manager {
        PackageManager::Pacman | PackageManager::Yay => parse_pacman(output),
        PackageManager::Apt => parse_apt(output),
        PackageManager::Zypper => parse_zypper(output),
        PackageManager::Flatpak => parse_flatpak(output, installed),
    }
}

/// `repo/name version ... [installed]` with indented description lines.
/// yay marks installed packages with `(Installed: ...)` instead.
fn parse_pacman(output: &str) -> Vec<SearchHit> {
    output
        .lines()
        .filter(|line| !line.is_empty() && !line.starts_with(char::is_whitespace))
        .filter_map(|line| {
            let mut fields = line.split_whitespace();
            let (repository, name) = fields.next()?.split_once('/')?;
            let version = fields.next()?;
            Some(SearchHit {
                name: name.to_string(),
                version: version.to_string(),
                repository: repository.to_string(),
                installed: line.contains("[installed") || line.contains("(Installed"),
            })
        })
        .collect()
}

/// `name/suite[,now] version arch [installed,...]`, with the "Sorting..."
/// preamble and indented descriptions mixed in.
fn parse_apt(output: &str) -> Vec<SearchHit> {
    output
        .lines()
        .filter(|line| !line.is_empty() && !line.starts_with(char::is_whitespace))
        .filter_map(|line| {
            let mut fields = line.split_whitespace();
            let (name, repository) = fields.next()?.split_once('/')?;
            let version = fields.next()?;
            Some(SearchHit {
                name: name.to_string(),
                version: version.to_string(),
                repository: repository.to_string(),
                installed: line.contains("[installed"),
            })
        })
        .collect()
}

/// `S | Name | Type | Version | Arch | Repository` table rows.
fn parse_zypper(output: &str) -> Vec<SearchHit> {
    output
        .lines()
        .filter_map(|line| {
            let cols: Vec<&str> = line.split('|').map(str::trim).collect();
            if cols.len() < 6 || cols[1] == "Name" || cols[1].is_empty() {
                return None;
            }
            Some(SearchHit {
                name: cols[1].to_string(),
                version: cols[3].to_string(),
                repository: cols[5].to_string(),
                installed: cols[0].contains('i'),
            })
        })
        .collect()
}

/// Tab separated: name, description, application ID, version, branch, remote.
fn parse_flatpak(output: &str, installed: &[String]) -> Vec<SearchHit> {
    output
        .lines()
        .filter_map(|line| {
            let cols: Vec<&str> = line.split('\t').collect();
            if cols.len() < 5 {
                return None;
            }
            let app_id = cols[2].trim();
            let branch = cols[4].trim();
            let repository = match cols.get(5).map(|r| r.trim()) {
                Some(remote) if !remote.is_empty() => format!("{remote}/{branch}"),
                _ => branch.to_string(),
            };
            Some(SearchHit {
                name: cols[0].trim().to_string(),
                version: cols[3].trim().to_string(),
                repository,
                installed: installed.iter().any(|id| id == app_id),
            })
        })
        .collect()
}

pub fn build_table(hits: &[SearchHit]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Name", "Version", "Repository", "Installed"]);

    for hit in hits {
        let installed = if hit.installed {
            Cell::new("yes").fg(Color::Green)
        } else {
            Cell::new("")
        };
        table.add_row(vec![
            Cell::new(&hit.name),
            Cell::new(&hit.version).fg(Color::Green),
            Cell::new(&hit.repository).fg(Color::Yellow),
            installed,
        ]);
    }
    table
}

pub fn render(hits: &[SearchHit]) {
    match get_output_format() {
        OutputFormat::Json => emit(
            Level::Info,
            "search.results",
            &format!("{} packages found", hits.len()),
            serde_json::to_value(hits).ok(),
        ),
        OutputFormat::Text => println!("{}", build_table(hits)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pacman() {
        let output = "\
core/vim-runtime 9.1.0-1
    Vi Improved, runtime files
extra/vim 9.1.0-1 (4.2 MiB 12.0 MiB) [installed]
    Vi Improved, a highly configurable text editor
";
        let hits = parse(PackageManager::Pacman, output, &[]);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].name, "vim-runtime");
        assert_eq!(hits[0].repository, "core");
        assert!(!hits[0].installed);
        assert_eq!(hits[1].name, "vim");
        assert_eq!(hits[1].version, "9.1.0-1");
        assert!(hits[1].installed);
    }

    #[test]
    fn test_parse_yay_installed_marker() {
        let output = "aur/neofetch-git 7.1.0.r100-1 (+12 0.10) (Installed: 7.1.0.r100-1)\n    A CLI system information tool\n";
        let hits = parse(PackageManager::Yay, output, &[]);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].repository, "aur");
        assert!(hits[0].installed);
    }

    #[test]
    fn test_parse_apt() {
        let output = "\
Sorting... Done
Full Text Search... Done
curl/jammy-updates,now 7.81.0-1ubuntu1.15 amd64 [installed]
  command line tool for transferring data with URL syntax

libcurl4/jammy-updates 7.81.0-1ubuntu1.15 amd64
  easy-to-use client-side URL transfer library
";
        let hits = parse(PackageManager::Apt, output, &[]);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].name, "curl");
        assert_eq!(hits[0].repository, "jammy-updates,now");
        assert!(hits[0].installed);
        assert_eq!(hits[1].name, "libcurl4");
        assert!(!hits[1].installed);
    }

    #[test]
    fn test_parse_zypper() {
        let output = "\
Loading repository data...
Reading installed packages...

S  | Name     | Type    | Version   | Arch   | Repository
---+----------+---------+-----------+--------+-----------
i+ | vim      | package | 9.1.0-1.1 | x86_64 | Main Repository (OSS)
   | vim-data | package | 9.1.0-1.1 | noarch | Main Repository (OSS)
";
        let hits = parse(PackageManager::Zypper, output, &[]);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].name, "vim");
        assert_eq!(hits[0].version, "9.1.0-1.1");
        assert_eq!(hits[0].repository, "Main Repository (OSS)");
        assert!(hits[0].installed);
        assert!(!hits[1].installed);
    }

    #[test]
    fn test_parse_flatpak() {
        let output = "Lutris\tVideo game preservation platform\tnet.lutris.Lutris\t0.5.17\tstable\tflathub\n\
Heroic\tGame launcher\tcom.heroicgameslauncher.hgl\t2.15.2\tstable\tflathub\n";
        let installed = vec!["net.lutris.Lutris".to_string()];
        let hits = parse(PackageManager::Flatpak, output, &installed);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].name, "Lutris");
        assert_eq!(hits[0].repository, "flathub/stable");
        assert!(hits[0].installed);
        assert!(!hits[1].installed);
    }

    #[test]
    fn test_unrecognized_output_yields_nothing() {
        assert!(parse(PackageManager::Flatpak, "No matches found\n", &[]).is_empty());
        assert!(parse(PackageManager::Apt, "Sorting... Done\n", &[]).is_empty());
    }

    #[test]
    fn test_table_contains_rows() {
        let hits = vec![SearchHit {
            name: "vim".into(),
            version: "9.1".into(),
            repository: "extra".into(),
            installed: true,
        }];
        let rendered = build_table(&hits).to_string();
        assert!(rendered.contains("vim"));
        assert!(rendered.contains("extra"));
        assert!(rendered.contains("Installed"));
    }
}
