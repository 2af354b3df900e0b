// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use std::path::{Path, PathBuf};

const DATA_DIR_ENV: &str = "DATA_DIR";

fn absolute(path: PathBuf) -> PathBuf {
    if path.is_absolute() {
        return path;
    }
    match std::env::current_dir() {
        Ok(cwd) => cwd.join(path),
        Err(_) => path,
    }
}

fn env_data_dir() -> Option<String> {
    std::env::var(DATA_DIR_ENV)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Resolve an input file path. Absolute paths are kept; relative paths land
/// under the explicit data dir, then `DATA_DIR`, then the working directory.
pub fn resolve_input_path(raw_path: &str, explicit_data_dir: Option<&str>) -> PathBuf {
    let as_path = Path::new(raw_path.trim());
    if as_path.is_absolute() {
        return as_path.to_path_buf();
    }
    let base = explicit_data_dir
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .or_else(env_data_dir);
    match base {
        Some(dir) => absolute(PathBuf::from(dir).join(as_path)),
        None => absolute(as_path.to_path_buf()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absolute_paths_are_untouched() {
        let abs = std::env::temp_dir().join("wallet.txt");
        let raw = abs.to_str().expect("utf8 path");
        assert_eq!(resolve_input_path(raw, Some("/srv/data")), abs);
    }

    #[test]
    fn explicit_data_dir_prefixes_relative_paths() {
        let resolved = resolve_input_path("proxies.txt", Some("/srv/data"));
        assert_eq!(resolved, PathBuf::from("/srv/data/proxies.txt"));
    }
}
