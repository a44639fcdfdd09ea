// src/core/locks.rs

//! Cooperative multi-process read/write locks.
//!
//! A lock is a marker file named `{prefix}.{mode}.{pid}` in the locks
//! directory. A write request conflicts with any marker for the same
//! prefix held by another process; a read request conflicts only with
//! write markers. The check-and-create step runs under a blocking flock
//! on a single meta file, which makes acquisition atomic without any
//! daemon or shared memory.
//!
//! This scheme does not enforce deadlock guardrails, so callers follow two
//! conventions: acquire in the order seq inventory, seq item, cmd
//! inventory, cmd item; and acquire multiple item locks in sorted name
//! order (`multi_item_lock` does the sorting).
//!
//! A holder that dies without cleaning up leaves its markers behind; any
//! later acquirer that finds a conflicting marker for a dead process
//! removes it and proceeds.

use crate::constants::LOCK_RETRY_INTERVAL;
use crate::models::ItemKind;

use log::{debug, warn};
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::thread;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LockError {
    #[error("I/O error in lock directory: {0}")]
    Io(#[from] io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockMode {
    Read,
    Write,
}

impl LockMode {
    fn as_str(self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Write => "write",
        }
    }

    fn from_str(s: &str) -> Option<Self> {
        match s {
            "read" => Some(Self::Read),
            "write" => Some(Self::Write),
            _ => None,
        }
    }
}

/// Splits a marker filename into its resource prefix, mode, and holder
/// pid. Prefixes may themselves contain dots (item names often do), so the
/// filename is parsed from the right.
fn parse_marker(filename: &str) -> Option<(&str, LockMode, u32)> {
    let (rest, pid_part) = filename.rsplit_once('.')?;
    let pid = pid_part.parse::<u32>().ok()?;
    let (prefix, mode_part) = rest.rsplit_once('.')?;
    let mode = LockMode::from_str(mode_part)?;
    Some((prefix, mode, pid))
}

/// True if a process with the given pid currently exists. Permission
/// denied on the probe signal still means the process is there.
#[cfg(unix)]
fn is_pid_alive(pid: u32) -> bool {
    use nix::errno::Errno;
    use nix::sys::signal::kill;
    use nix::unistd::Pid;

    let Ok(pid) = i32::try_from(pid) else {
        return false;
    };
    match kill(Pid::from_raw(pid), None) {
        Ok(()) | Err(Errno::EPERM) => true,
        Err(_) => false,
    }
}

/// Without a cheap liveness probe, stale markers are never reclaimed here;
/// they have to be removed by hand if a holder crashes.
#[cfg(not(unix))]
fn is_pid_alive(_pid: u32) -> bool {
    true
}

#[cfg(unix)]
type MetaGuard = nix::fcntl::Flock<File>;
#[cfg(not(unix))]
type MetaGuard = File;

/// Tracks every marker this process has created and removes them all when
/// the session ends, including on error paths (the manager lives for the
/// whole CLI invocation, so dropping it is the at-exit cleanup).
#[derive(Debug)]
pub struct LockManager {
    lock_dir: PathBuf,
    meta_lock_path: PathBuf,
    pid: u32,
    held: Vec<PathBuf>,
}

impl LockManager {
    /// # Arguments
    ///
    /// * `lock_dir` - Existing directory that holds marker files.
    /// * `meta_lock_path` - File to flock around check-and-create steps.
    pub fn new(lock_dir: PathBuf, meta_lock_path: PathBuf) -> Self {
        Self {
            lock_dir,
            meta_lock_path,
            pid: std::process::id(),
            held: Vec::new(),
        }
    }

    fn inventory_prefix(kind: ItemKind) -> String {
        format!("inv.{}", kind.tag())
    }

    fn item_prefix(kind: ItemKind, name: &str) -> String {
        format!("item.{}.{}", kind.tag(), name)
    }

    fn marker_path(&self, prefix: &str, mode: LockMode) -> PathBuf {
        self.lock_dir
            .join(format!("{prefix}.{}.{}", mode.as_str(), self.pid))
    }

    /// Blocks until the guard on the meta file is held. Every marker
    /// check-and-create happens under this guard, so two processes can
    /// never both conclude that a resource is free.
    fn lock_meta(&self) -> Result<MetaGuard, LockError> {
        let file = File::options()
            .create(true)
            .write(true)
            .open(&self.meta_lock_path)?;
        #[cfg(unix)]
        {
            nix::fcntl::Flock::lock(file, nix::fcntl::FlockArg::LockExclusive)
                .map_err(|(_, errno)| {
                    LockError::Io(io::Error::from_raw_os_error(errno as i32))
                })
        }
        #[cfg(not(unix))]
        {
            Ok(file)
        }
    }

    /// Marker paths for the given resource that block a request in the
    /// given mode, excluding markers owned by this process (re-entrant
    /// acquisition is always allowed).
    fn conflicting_markers(
        &self,
        prefix: &str,
        mode: LockMode,
    ) -> Result<Vec<(PathBuf, u32)>, LockError> {
        let mut conflicts = Vec::new();
        for entry in fs::read_dir(&self.lock_dir)? {
            let entry = entry?;
            let filename = entry.file_name();
            let Some(filename) = filename.to_str() else {
                continue;
            };
            let Some((marker_prefix, marker_mode, pid)) = parse_marker(filename)
            else {
                continue;
            };
            if marker_prefix != prefix || pid == self.pid {
                continue;
            }
            if mode == LockMode::Write || marker_mode == LockMode::Write {
                conflicts.push((entry.path(), pid));
            }
        }
        Ok(conflicts)
    }

    fn acquire(&mut self, prefix: &str, mode: LockMode) -> Result<(), LockError> {
        let marker = self.marker_path(prefix, mode);
        if self.held.contains(&marker) {
            return Ok(());
        }
        let mut notified = false;
        loop {
            let must_wait = {
                let _meta = self.lock_meta()?;
                let conflicts = self.conflicting_markers(prefix, mode)?;
                if conflicts.is_empty() {
                    File::create(&marker)?;
                    self.held.push(marker);
                    debug!("acquired {} lock on {}", mode.as_str(), prefix);
                    return Ok(());
                }
                let mut any_alive = false;
                for (path, pid) in conflicts {
                    if is_pid_alive(pid) {
                        any_alive = true;
                    } else {
                        warn!(
                            "removing lock left by dead process {pid}: {}",
                            path.display()
                        );
                        remove_marker(&path);
                    }
                }
                any_alive
            };
            if must_wait {
                if !notified {
                    println!("waiting on other chaintool process...");
                    notified = true;
                }
                thread::sleep(LOCK_RETRY_INTERVAL);
            }
            // All conflict holders were dead: retry immediately.
        }
    }

    fn release(&mut self, prefix: &str, mode: LockMode) {
        let marker = self.marker_path(prefix, mode);
        remove_marker(&marker);
        self.held.retain(|held| *held != marker);
    }

    /// Guards the set of names of the given kind. Creation and deletion
    /// take this in write mode; operations that only need a stable name
    /// list take it in read mode.
    pub fn inventory_lock(
        &mut self,
        kind: ItemKind,
        mode: LockMode,
    ) -> Result<(), LockError> {
        self.acquire(&Self::inventory_prefix(kind), mode)
    }

    pub fn release_inventory_lock(&mut self, kind: ItemKind, mode: LockMode) {
        self.release(&Self::inventory_prefix(kind), mode);
    }

    /// Guards one named item. Write mode for create/modify/delete, read
    /// mode to keep the item stable while running or displaying it.
    pub fn item_lock(
        &mut self,
        kind: ItemKind,
        name: &str,
        mode: LockMode,
    ) -> Result<(), LockError> {
        self.acquire(&Self::item_prefix(kind, name), mode)
    }

    pub fn release_item_lock(&mut self, kind: ItemKind, name: &str, mode: LockMode) {
        self.release(&Self::item_prefix(kind, name), mode);
    }

    /// Locks several items, always in sorted name order so that two
    /// processes locking overlapping sets cannot deadlock each other.
    pub fn multi_item_lock(
        &mut self,
        kind: ItemKind,
        names: &[String],
        mode: LockMode,
    ) -> Result<(), LockError> {
        let mut sorted: Vec<&String> = names.iter().collect();
        sorted.sort();
        sorted.dedup();
        for name in sorted {
            self.item_lock(kind, name, mode)?;
        }
        Ok(())
    }
}

fn remove_marker(path: &Path) {
    if let Err(err) = fs::remove_file(path) {
        if err.kind() != io::ErrorKind::NotFound {
            warn!("could not remove lock marker {}: {err}", path.display());
        }
    }
}

impl Drop for LockManager {
    fn drop(&mut self) {
        for marker in &self.held {
            remove_marker(marker);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn manager(dir: &TempDir) -> LockManager {
        LockManager::new(
            dir.path().to_path_buf(),
            dir.path().join("meta.lock"),
        )
    }

    fn plant_marker(dir: &TempDir, name: &str) {
        File::create(dir.path().join(name)).unwrap();
    }

    // A pid value above i32::MAX can never belong to a live process.
    const DEAD_PID: u32 = 4_000_000_000;

    #[test]
    fn marker_names_parse_from_the_right() {
        assert_eq!(
            parse_marker("inv.cmd.read.123"),
            Some(("inv.cmd", LockMode::Read, 123))
        );
        // Item names may contain dots.
        assert_eq!(
            parse_marker("item.seq.build.v2.write.9"),
            Some(("item.seq.build.v2", LockMode::Write, 9))
        );
        assert_eq!(parse_marker("meta.lock"), None);
        assert_eq!(parse_marker("inv.cmd.nope.123"), None);
        assert_eq!(parse_marker("inv.cmd.read.notapid"), None);
    }

    #[test]
    fn acquire_creates_marker_and_drop_removes_it() {
        let dir = TempDir::new().unwrap();
        let marker = {
            let mut locks = manager(&dir);
            locks
                .item_lock(ItemKind::Cmd, "build", LockMode::Write)
                .unwrap();
            let marker = dir
                .path()
                .join(format!("item.cmd.build.write.{}", std::process::id()));
            assert!(marker.exists());
            marker
        };
        assert!(!marker.exists());
    }

    #[test]
    fn release_removes_only_the_named_marker() {
        let dir = TempDir::new().unwrap();
        let mut locks = manager(&dir);
        locks.inventory_lock(ItemKind::Cmd, LockMode::Read).unwrap();
        locks.inventory_lock(ItemKind::Seq, LockMode::Read).unwrap();
        locks.release_inventory_lock(ItemKind::Cmd, LockMode::Read);
        let pid = std::process::id();
        assert!(!dir.path().join(format!("inv.cmd.read.{pid}")).exists());
        assert!(dir.path().join(format!("inv.seq.read.{pid}")).exists());
    }

    #[test]
    fn reads_conflict_only_with_writes() {
        let dir = TempDir::new().unwrap();
        let locks = manager(&dir);
        plant_marker(&dir, &format!("inv.cmd.read.{DEAD_PID}"));
        assert!(locks
            .conflicting_markers("inv.cmd", LockMode::Read)
            .unwrap()
            .is_empty());
        assert_eq!(
            locks
                .conflicting_markers("inv.cmd", LockMode::Write)
                .unwrap()
                .len(),
            1
        );
        plant_marker(&dir, &format!("inv.cmd.write.{DEAD_PID}"));
        assert_eq!(
            locks
                .conflicting_markers("inv.cmd", LockMode::Read)
                .unwrap()
                .len(),
            1
        );
    }

    #[test]
    fn own_markers_never_conflict() {
        let dir = TempDir::new().unwrap();
        let mut locks = manager(&dir);
        locks.inventory_lock(ItemKind::Cmd, LockMode::Read).unwrap();
        assert!(locks
            .conflicting_markers("inv.cmd", LockMode::Write)
            .unwrap()
            .is_empty());
        // And re-acquisition is a no-op.
        locks.inventory_lock(ItemKind::Cmd, LockMode::Read).unwrap();
        assert_eq!(locks.held.len(), 1);
    }

    #[test]
    fn markers_for_other_resources_do_not_conflict() {
        let dir = TempDir::new().unwrap();
        let locks = manager(&dir);
        plant_marker(&dir, &format!("item.cmd.build.write.{DEAD_PID}"));
        // "build" is a prefix of "build.v2" but a different resource.
        assert!(locks
            .conflicting_markers("item.cmd.build.v2", LockMode::Write)
            .unwrap()
            .is_empty());
        assert!(locks
            .conflicting_markers("inv.cmd", LockMode::Write)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn dead_holder_markers_are_reclaimed() {
        let dir = TempDir::new().unwrap();
        let mut locks = manager(&dir);
        let stale = dir.path().join(format!("inv.cmd.write.{DEAD_PID}"));
        plant_marker(&dir, &format!("inv.cmd.write.{DEAD_PID}"));
        locks
            .inventory_lock(ItemKind::Cmd, LockMode::Write)
            .unwrap();
        assert!(!stale.exists());
        assert!(dir
            .path()
            .join(format!("inv.cmd.write.{}", std::process::id()))
            .exists());
    }

    #[test]
    fn multi_item_lock_acquires_in_sorted_order() {
        let dir = TempDir::new().unwrap();
        let mut locks = manager(&dir);
        locks
            .multi_item_lock(
                ItemKind::Cmd,
                &["zeta".to_string(), "alpha".to_string(), "zeta".to_string()],
                LockMode::Read,
            )
            .unwrap();
        let pid = std::process::id();
        assert_eq!(
            locks.held,
            vec![
                dir.path().join(format!("item.cmd.alpha.read.{pid}")),
                dir.path().join(format!("item.cmd.zeta.read.{pid}")),
            ]
        );
    }
}
