use std::{
    io,
    path::{Path, PathBuf},
};

use directories::ProjectDirs;

const PROJECT_ROOT: &str = env!("CARGO_MANIFEST_DIR");
pub const ASSET_DIR_ENV: &str = "TRACKER_ASSET_DIR";

/// Directory holding the SQLite database and `config.json`.
///
/// Resolution order: `TRACKER_ASSET_DIR`, then `dev_assets/` at the workspace
/// root in debug builds, then the platform data directory.
pub fn asset_dir() -> PathBuf {
    if let Ok(override_dir) = std::env::var(ASSET_DIR_ENV) {
        let override_dir = override_dir.trim();
        if !override_dir.is_empty() {
            return PathBuf::from(override_dir);
        }
    }

    if cfg!(debug_assertions) {
        return Path::new(PROJECT_ROOT).join("../../dev_assets");
    }

    match ProjectDirs::from("dev", "tracker", "task-tracker") {
        Some(dirs) => dirs.data_dir().to_path_buf(),
        None => {
            tracing::warn!("No home directory available, using ./data for assets");
            PathBuf::from("data")
        }
    }
}

/// Same as [`asset_dir`] but creates the directory when missing.
pub fn ensure_asset_dir() -> io::Result<PathBuf> {
    let path = asset_dir();
    std::fs::create_dir_all(&path)?;
    Ok(path)
}

pub fn config_path() -> PathBuf {
    asset_dir().join("config.json")
}

pub fn database_path() -> PathBuf {
    asset_dir().join("db.sqlite")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn asset_paths_follow_override() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("nested");
        // SAFETY: no other test in this crate reads the variable.
        unsafe { std::env::set_var(ASSET_DIR_ENV, &nested) };

        assert_eq!(asset_dir(), nested);
        assert_eq!(config_path(), nested.join("config.json"));
        assert_eq!(database_path(), nested.join("db.sqlite"));
        assert!(!nested.exists());
        assert_eq!(ensure_asset_dir().unwrap(), nested);
        assert!(nested.is_dir());

        unsafe { std::env::remove_var(ASSET_DIR_ENV) };
    }
}
