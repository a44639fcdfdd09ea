// src/core/paths.rs

//! Resolution of the on-disk layout for all chaintool state.

use crate::constants::{
    CMD_SUBDIR, DATA_DIR_ENV_VAR, DATA_DIR_NAME, LOCKS_SUBDIR,
    META_LOCK_FILENAME, SEQ_SUBDIR, SHORTCUTS_SUBDIR,
};

use std::fs;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PathError {
    #[error("could not determine a data directory for this platform")]
    NoDataDir,

    #[error("could not create data directory '{path}': {source}")]
    CreateFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Directory layout of one chaintool data root.
#[derive(Debug, Clone)]
pub struct Layout {
    pub cmd_dir: PathBuf,
    pub seq_dir: PathBuf,
    pub locks_dir: PathBuf,
    pub shortcuts_dir: PathBuf,
    pub meta_lock_path: PathBuf,
}

impl Layout {
    /// Lays out the subdirectories under an explicit root, creating any
    /// that are missing.
    pub fn at(root: PathBuf) -> Result<Self, PathError> {
        let layout = Self {
            cmd_dir: root.join(CMD_SUBDIR),
            seq_dir: root.join(SEQ_SUBDIR),
            locks_dir: root.join(LOCKS_SUBDIR),
            shortcuts_dir: root.join(SHORTCUTS_SUBDIR),
            meta_lock_path: root.join(META_LOCK_FILENAME),
        };
        for dir in [
            &layout.cmd_dir,
            &layout.seq_dir,
            &layout.locks_dir,
            &layout.shortcuts_dir,
        ] {
            fs::create_dir_all(dir).map_err(|source| PathError::CreateFailed {
                path: dir.clone(),
                source,
            })?;
        }
        Ok(layout)
    }

    /// Resolves the data root from the environment override, falling back
    /// to the platform's per-user data directory.
    pub fn resolve() -> Result<Self, PathError> {
        let root = match std::env::var_os(DATA_DIR_ENV_VAR) {
            Some(dir) if !dir.is_empty() => PathBuf::from(dir),
            _ => dirs::data_dir()
                .ok_or(PathError::NoDataDir)?
                .join(DATA_DIR_NAME),
        };
        Self::at(root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn at_creates_the_whole_layout() {
        let dir = TempDir::new().unwrap();
        let layout = Layout::at(dir.path().join("root")).unwrap();
        assert!(layout.cmd_dir.is_dir());
        assert!(layout.seq_dir.is_dir());
        assert!(layout.locks_dir.is_dir());
        assert!(layout.shortcuts_dir.is_dir());
        assert_eq!(
            layout.meta_lock_path,
            dir.path().join("root").join("meta.lock")
        );
    }
}
