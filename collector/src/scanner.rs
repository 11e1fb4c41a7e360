use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};
use walkdir::WalkDir;

const CONFIG_EXTENSION: &str = ".yml";

/// List the `*.yml` files directly inside `dir`, sorted by file name.
///
/// Subdirectories are not descended into. A missing or unreadable directory
/// yields an empty list rather than an error: having no configs must never
/// break a collection.
pub fn scan_config_dir(dir: impl AsRef<Path>) -> Vec<PathBuf> {
    // Rebuilding the path from its components drops any trailing slash.
    let dir: PathBuf = dir.as_ref().components().collect();

    WalkDir::new(&dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(err) => {
                debug!(dir = ?dir, %err, "Unable to read config directory entry");
                None
            }
        })
        .filter(|entry| entry.file_type().is_file() && is_config_file(entry.file_name()))
        .map(|entry| {
            trace!(path = ?entry.path(), "Found config file");
            entry.into_path()
        })
        .collect()
}

fn is_config_file(name: &OsStr) -> bool {
    name.to_str()
        .map(|name| name.ends_with(CONFIG_EXTENSION))
        .unwrap_or(false)
}
