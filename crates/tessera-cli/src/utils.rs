use std::path::{Path, PathBuf};

use crate::config::CONFIG_FILE;

/// Finds the nearest `tessera.toml` by searching upwards from `start_path`.
pub fn find_config_file(start_path: &Path) -> Option<PathBuf> {
    let mut current = if start_path.is_dir() {
        start_path.to_path_buf()
    } else {
        start_path
            .parent()
            .map_or_else(|| start_path.to_path_buf(), Path::to_path_buf)
    };

    loop {
        let candidate = current.join(CONFIG_FILE);
        if candidate.is_file() {
            return Some(candidate);
        }
        if !current.pop() {
            return None;
        }
    }
}
