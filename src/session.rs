// src/session.rs

//! Per-invocation context: the item store, the lock manager, and the
//! shortcut writer, bundled so operations can thread one value around
//! instead of reaching for globals. Dropping the session releases every
//! lock the process still holds.

use crate::core::locks::LockManager;
use crate::core::paths::{Layout, PathError};
use crate::core::store::ItemStore;
use crate::system::shortcuts::ShortcutWriter;

use std::path::PathBuf;

pub struct Session {
    pub store: ItemStore,
    pub locks: LockManager,
    pub shortcuts: ShortcutWriter,
}

impl Session {
    /// Builds a session over the platform data directory (or the
    /// `CHAINTOOL_DATA_DIR` override), creating the layout if needed.
    pub fn init() -> Result<Self, PathError> {
        Ok(Self::from_layout(Layout::resolve()?))
    }

    /// Builds a session rooted at an explicit directory.
    pub fn at(root: PathBuf) -> Result<Self, PathError> {
        Ok(Self::from_layout(Layout::at(root)?))
    }

    fn from_layout(layout: Layout) -> Self {
        Self {
            store: ItemStore::new(layout.cmd_dir, layout.seq_dir),
            locks: LockManager::new(layout.locks_dir, layout.meta_lock_path),
            shortcuts: ShortcutWriter::new(layout.shortcuts_dir),
        }
    }
}
