// src/core/store.rs

//! Flat-file persistence for commands and sequences.
//!
//! Each item is one JSON document in the directory for its kind, named by
//! the item itself. The store knows nothing about locking; callers hold
//! the appropriate locks before touching it.

use crate::models::{CommandDef, ItemKind, SequenceDef};

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("{kind} '{name}' does not exist.")]
    NotFound { kind: ItemKind, name: String },

    #[error("{kind} '{name}' already exists... not modified.")]
    AlreadyExists { kind: ItemKind, name: String },

    #[error("could not access item storage: {0}")]
    Io(#[from] io::Error),

    #[error("item document is malformed: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Whether a write may replace an existing document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Fail with `AlreadyExists` if the item is present. The underlying
    /// create is atomic, which the define flow's race handling relies on.
    Create,
    Overwrite,
}

#[derive(Debug)]
pub struct ItemStore {
    cmd_dir: PathBuf,
    seq_dir: PathBuf,
}

impl ItemStore {
    pub fn new(cmd_dir: PathBuf, seq_dir: PathBuf) -> Self {
        Self { cmd_dir, seq_dir }
    }

    fn dir_for(&self, kind: ItemKind) -> &Path {
        match kind {
            ItemKind::Cmd => &self.cmd_dir,
            ItemKind::Seq => &self.seq_dir,
        }
    }

    fn item_path(&self, kind: ItemKind, name: &str) -> PathBuf {
        self.dir_for(kind).join(name)
    }

    pub fn exists(&self, kind: ItemKind, name: &str) -> bool {
        self.item_path(kind, name).exists()
    }

    /// All item names of a kind, sorted.
    pub fn all_names(&self, kind: ItemKind) -> Result<Vec<String>, StoreError> {
        let mut names = Vec::new();
        for entry in fs::read_dir(self.dir_for(kind))? {
            let entry = entry?;
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        names.sort();
        Ok(names)
    }

    fn read<T: DeserializeOwned>(
        &self,
        kind: ItemKind,
        name: &str,
    ) -> Result<T, StoreError> {
        let text = fs::read_to_string(self.item_path(kind, name)).map_err(
            |err| match err.kind() {
                io::ErrorKind::NotFound => StoreError::NotFound {
                    kind,
                    name: name.to_string(),
                },
                _ => StoreError::Io(err),
            },
        )?;
        Ok(serde_json::from_str(&text)?)
    }

    fn write<T: Serialize>(
        &self,
        kind: ItemKind,
        name: &str,
        doc: &T,
        mode: WriteMode,
    ) -> Result<(), StoreError> {
        let path = self.item_path(kind, name);
        let mut file = match mode {
            WriteMode::Create => File::create_new(&path).map_err(|err| {
                match err.kind() {
                    io::ErrorKind::AlreadyExists => StoreError::AlreadyExists {
                        kind,
                        name: name.to_string(),
                    },
                    _ => StoreError::Io(err),
                }
            })?,
            WriteMode::Overwrite => File::create(&path)?,
        };
        let text = serde_json::to_string_pretty(doc)?;
        file.write_all(text.as_bytes())?;
        Ok(())
    }

    pub fn read_command(&self, name: &str) -> Result<CommandDef, StoreError> {
        self.read(ItemKind::Cmd, name)
    }

    pub fn write_command(
        &self,
        name: &str,
        def: &CommandDef,
        mode: WriteMode,
    ) -> Result<(), StoreError> {
        self.write(ItemKind::Cmd, name, def, mode)
    }

    pub fn read_sequence(&self, name: &str) -> Result<SequenceDef, StoreError> {
        self.read(ItemKind::Seq, name)
    }

    pub fn write_sequence(
        &self,
        name: &str,
        def: &SequenceDef,
        mode: WriteMode,
    ) -> Result<(), StoreError> {
        self.write(ItemKind::Seq, name, def, mode)
    }

    /// Removes an item. Absence is only an error when `missing_ok` is
    /// false.
    pub fn delete(
        &self,
        kind: ItemKind,
        name: &str,
        missing_ok: bool,
    ) -> Result<(), StoreError> {
        match fs::remove_file(self.item_path(kind, name)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                if missing_ok {
                    Ok(())
                } else {
                    Err(StoreError::NotFound {
                        kind,
                        name: name.to_string(),
                    })
                }
            }
            Err(err) => Err(StoreError::Io(err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store(dir: &TempDir) -> ItemStore {
        let cmd_dir = dir.path().join("commands");
        let seq_dir = dir.path().join("sequences");
        fs::create_dir_all(&cmd_dir).unwrap();
        fs::create_dir_all(&seq_dir).unwrap();
        ItemStore::new(cmd_dir, seq_dir)
    }

    #[test]
    fn write_read_delete_round_trip() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        let def = CommandDef {
            cmdline: "echo {x}".to_string(),
            format: "echo {x}".to_string(),
            ..Default::default()
        };
        store.write_command("greet", &def, WriteMode::Create).unwrap();
        assert!(store.exists(ItemKind::Cmd, "greet"));
        assert_eq!(store.read_command("greet").unwrap(), def);
        store.delete(ItemKind::Cmd, "greet", false).unwrap();
        assert!(!store.exists(ItemKind::Cmd, "greet"));
    }

    #[test]
    fn create_mode_refuses_existing_item() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        let def = CommandDef::default();
        store.write_command("dup", &def, WriteMode::Create).unwrap();
        let err = store
            .write_command("dup", &def, WriteMode::Create)
            .unwrap_err();
        assert!(matches!(err, StoreError::AlreadyExists { .. }));
        store
            .write_command("dup", &def, WriteMode::Overwrite)
            .unwrap();
    }

    #[test]
    fn missing_items_report_not_found() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        assert!(matches!(
            store.read_command("ghost").unwrap_err(),
            StoreError::NotFound { .. }
        ));
        assert!(matches!(
            store.delete(ItemKind::Seq, "ghost", false).unwrap_err(),
            StoreError::NotFound { .. }
        ));
        store.delete(ItemKind::Seq, "ghost", true).unwrap();
    }

    #[test]
    fn all_names_is_sorted_per_kind() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        let def = CommandDef::default();
        store.write_command("zeta", &def, WriteMode::Create).unwrap();
        store.write_command("alpha", &def, WriteMode::Create).unwrap();
        store
            .write_sequence("mid", &SequenceDef::default(), WriteMode::Create)
            .unwrap();
        assert_eq!(store.all_names(ItemKind::Cmd).unwrap(), ["alpha", "zeta"]);
        assert_eq!(store.all_names(ItemKind::Seq).unwrap(), ["mid"]);
    }
}
