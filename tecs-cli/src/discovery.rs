//! Input files discovery
use std::path::{Path, PathBuf};

use itertools::Itertools;
use walkdir::WalkDir;

use tec_suite::filename::is_observation;

fn file_name(path: &Path) -> Option<&str> {
    path.file_name().and_then(|name| name.to_str())
}

/// Observation files stored in given directories (not recursive)
pub fn observation_files(dirs: &[PathBuf]) -> Vec<PathBuf> {
    dirs.iter()
        .flat_map(|dir| {
            if !dir.is_dir() {
                warn!("observation directory \"{}\" does not exist", dir.display());
            }
            WalkDir::new(dir)
                .min_depth(1)
                .max_depth(1)
                .into_iter()
                .filter_map(|entry| entry.ok())
                .filter(|entry| entry.file_type().is_file())
                .map(|entry| entry.into_path())
                .filter(|path| file_name(path).map(is_observation).unwrap_or(false))
        })
        .sorted()
        .unique()
        .collect()
}

/// Given navigation directories and all their sub directories
pub fn navigation_dirs(dirs: &[PathBuf]) -> Vec<PathBuf> {
    dirs.iter()
        .flat_map(|dir| {
            if !dir.is_dir() {
                warn!("navigation directory \"{}\" does not exist", dir.display());
            }
            WalkDir::new(dir)
                .follow_links(true)
                .into_iter()
                .filter_map(|entry| entry.ok())
                .filter(|entry| entry.file_type().is_dir())
                .map(|entry| entry.into_path())
        })
        .unique()
        .collect()
}
