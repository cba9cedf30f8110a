//! Task discovery - pairs each inventory marker with one playbook.
//!
//! A task folder is any directory containing the inventory-marker file.
//! The playbook run against it is chosen from the folder's other YAML
//! files: numerically-named playbooks (`11242.yaml`) win over
//! descriptive ones, first in lexicographic order either way.

use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use thiserror::Error;
use walkdir::WalkDir;

/// Numeric playbook names take priority. Extension casing is loose here
/// even though candidate listing only accepts `.yml`/`.yaml`.
static NUMERIC_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\d+\.ya?ml$").unwrap());

/// Errors that abort discovery. There is no partial-success mode: a tree
/// that cannot be fully walked yields no tasks at all.
#[derive(Debug, Error)]
pub enum DiscoverError {
    #[error("failed to walk {}", .root.display())]
    Walk {
        root: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("failed to list {}", .folder.display())]
    List {
        folder: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// One discovered unit of work: an inventory file plus the single
/// playbook chosen to run against it. Immutable once discovered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    /// Directory containing both files.
    pub folder: PathBuf,
    /// Inventory marker identifying the target hosts.
    pub inventory: PathBuf,
    /// Playbook executed against that inventory.
    pub playbook: PathBuf,
}

impl Task {
    pub fn folder_name(&self) -> String {
        file_name(&self.folder)
    }

    pub fn inventory_name(&self) -> String {
        file_name(&self.inventory)
    }

    pub fn playbook_name(&self) -> String {
        file_name(&self.playbook)
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map_or_else(String::new, |name| name.to_string_lossy().into_owned())
}

/// Walk `root` and produce one task per inventory marker whose folder
/// also holds at least one playbook candidate.
///
/// Tasks come back sorted by inventory path; that ordering drives run
/// order, log naming, and the row order of the summary report.
pub fn discover_tasks(root: &Path, inventory_name: &str) -> Result<Vec<Task>, DiscoverError> {
    let mut inventories = Vec::new();
    for entry in WalkDir::new(root) {
        let entry = entry.map_err(|source| DiscoverError::Walk {
            root: root.to_path_buf(),
            source,
        })?;
        if entry.file_type().is_file() && entry.file_name() == inventory_name {
            inventories.push(entry.into_path());
        }
    }
    inventories.sort();

    let mut tasks = Vec::new();
    for inventory in inventories {
        let folder = match inventory.parent() {
            Some(dir) => dir.to_path_buf(),
            None => continue,
        };

        let candidates = playbook_candidates(&folder, inventory_name)?;
        let Some(chosen) = choose_playbook(&candidates) else {
            // Marker without a playbook is irrelevant, not an error.
            log::debug!("{}: no playbook candidates, skipping", folder.display());
            continue;
        };

        tasks.push(Task {
            playbook: folder.join(chosen),
            inventory,
            folder,
        });
    }

    log::info!("Discovered {} task(s) under {}", tasks.len(), root.display());
    Ok(tasks)
}

/// YAML files directly in `folder`, minus the inventory marker, sorted
/// by file name.
fn playbook_candidates(folder: &Path, inventory_name: &str) -> Result<Vec<String>, DiscoverError> {
    let list_err = |source| DiscoverError::List {
        folder: folder.to_path_buf(),
        source,
    };

    let mut names = Vec::new();
    for entry in fs::read_dir(folder).map_err(list_err)? {
        let entry = entry.map_err(list_err)?;
        if !entry.file_type().map_err(list_err)?.is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if name == inventory_name {
            continue;
        }
        if name.ends_with(".yml") || name.ends_with(".yaml") {
            names.push(name);
        }
    }
    names.sort();
    Ok(names)
}

/// First numerically-named candidate in sorted order, or the first
/// candidate overall. Note "first in sorted order", not numerically
/// smallest: `10.yaml` beats `2.yaml` because strings sort that way.
fn choose_playbook(candidates: &[String]) -> Option<&String> {
    candidates
        .iter()
        .find(|name| NUMERIC_NAME.is_match(name))
        .or_else(|| candidates.first())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const INVENTORY: &str = "inventory.ini";

    fn touch(dir: &Path, name: &str) {
        fs::write(dir.join(name), "").unwrap();
    }

    fn folder(root: &Path, name: &str) -> PathBuf {
        let dir = root.join(name);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn pairs_inventory_with_single_playbook() {
        let tmp = TempDir::new().unwrap();
        let web = folder(tmp.path(), "web");
        touch(&web, INVENTORY);
        touch(&web, "site.yml");

        let tasks = discover_tasks(tmp.path(), INVENTORY).unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].folder, web);
        assert_eq!(tasks[0].inventory, web.join(INVENTORY));
        assert_eq!(tasks[0].playbook, web.join("site.yml"));
    }

    #[test]
    fn skips_folder_without_playbook() {
        let tmp = TempDir::new().unwrap();
        let bare = folder(tmp.path(), "bare");
        touch(&bare, INVENTORY);
        touch(&bare, "notes.txt");

        let tasks = discover_tasks(tmp.path(), INVENTORY).unwrap();
        assert!(tasks.is_empty());
    }

    #[test]
    fn numeric_names_win_in_sorted_order_not_numeric_order() {
        let tmp = TempDir::new().unwrap();
        let db = folder(tmp.path(), "db");
        touch(&db, INVENTORY);
        touch(&db, "10.yaml");
        touch(&db, "a.yml");
        touch(&db, "2.yaml");

        // Sorted candidates are [10.yaml, 2.yaml, a.yml]; "10.yaml" is
        // the first numeric name as strings sort, so it wins over the
        // numerically smaller "2.yaml".
        let tasks = discover_tasks(tmp.path(), INVENTORY).unwrap();
        assert_eq!(tasks[0].playbook_name(), "10.yaml");
    }

    #[test]
    fn falls_back_to_first_sorted_candidate() {
        let tmp = TempDir::new().unwrap();
        let app = folder(tmp.path(), "app");
        touch(&app, INVENTORY);
        touch(&app, "teardown.yaml");
        touch(&app, "setup.yml");

        let tasks = discover_tasks(tmp.path(), INVENTORY).unwrap();
        assert_eq!(tasks[0].playbook_name(), "setup.yml");
    }

    #[test]
    fn tasks_come_back_sorted_by_inventory_path() {
        let tmp = TempDir::new().unwrap();
        for name in ["zeta", "alpha", "mid"] {
            let dir = folder(tmp.path(), name);
            touch(&dir, INVENTORY);
            touch(&dir, "1.yml");
        }

        let tasks = discover_tasks(tmp.path(), INVENTORY).unwrap();
        let names: Vec<_> = tasks.iter().map(Task::folder_name).collect();
        assert_eq!(names, ["alpha", "mid", "zeta"]);
    }

    #[test]
    fn walks_nested_folders() {
        let tmp = TempDir::new().unwrap();
        let deep = folder(tmp.path(), "region/dc1/web");
        touch(&deep, INVENTORY);
        touch(&deep, "3.yaml");

        let tasks = discover_tasks(tmp.path(), INVENTORY).unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].folder_name(), "web");
    }

    #[test]
    fn candidate_listing_ignores_non_yaml_and_marker() {
        let tmp = TempDir::new().unwrap();
        let dir = folder(tmp.path(), "mixed");
        touch(&dir, INVENTORY);
        touch(&dir, "run.sh");
        touch(&dir, "vars.yaml");

        let candidates = playbook_candidates(&dir, INVENTORY).unwrap();
        assert_eq!(candidates, ["vars.yaml"]);
    }

    #[test]
    fn numeric_name_pattern() {
        assert!(NUMERIC_NAME.is_match("11242.yaml"));
        assert!(NUMERIC_NAME.is_match("2.yml"));
        assert!(NUMERIC_NAME.is_match("7.YmL"));
        assert!(!NUMERIC_NAME.is_match("a3.yml"));
        assert!(!NUMERIC_NAME.is_match("3.yml.bak"));
        assert!(!NUMERIC_NAME.is_match("3.json"));
    }

    #[test]
    fn choose_playbook_empty_candidates() {
        assert_eq!(choose_playbook(&[]), None);
    }
}
