// src/system/shortcuts.rs

//! Shell alias scripts that let each stored item be run by name.
//!
//! One script per item kind is regenerated whenever the set of names of
//! that kind changes; a main script sources both and is written once so
//! users can put a single `source` line in their shell profile.

use crate::models::ItemKind;

use std::borrow::Cow;
use std::fs;
use std::io;
use std::path::PathBuf;

const MAIN_FILE: &str = "aliases";

fn quote(value: &str) -> String {
    shlex::try_quote(value)
        .map(Cow::into_owned)
        .unwrap_or_else(|_| value.to_string())
}

#[derive(Debug)]
pub struct ShortcutWriter {
    dir: PathBuf,
}

impl ShortcutWriter {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    fn kind_file(&self, kind: ItemKind) -> PathBuf {
        self.dir.join(format!("{MAIN_FILE}-{}", kind.tag()))
    }

    fn ensure_main_file(&self) -> io::Result<()> {
        let main_path = self.dir.join(MAIN_FILE);
        if main_path.exists() {
            return Ok(());
        }
        let mut script = String::new();
        for kind in [ItemKind::Cmd, ItemKind::Seq] {
            let kind_path = self.kind_file(kind);
            let quoted = quote(&kind_path.to_string_lossy());
            script.push_str(&format!("[[ -f {quoted} ]] && source {quoted}\n"));
        }
        fs::write(main_path, script)
    }

    /// Rewrites the alias script for one kind to cover exactly the given
    /// names. Each alias runs the item through this binary.
    pub fn update(&self, kind: ItemKind, names: &[String]) -> io::Result<()> {
        self.ensure_main_file()?;
        let binary = std::env::current_exe()
            .map(|path| path.to_string_lossy().into_owned())
            .unwrap_or_else(|_| "chaintool".to_string());
        let mut script = String::new();
        for name in names {
            let run_cmdline =
                format!("{} {} run {name}", quote(&binary), kind.tag());
            script.push_str(&format!(
                "alias {name}={}\n",
                quote(&run_cmdline)
            ));
        }
        fs::write(self.kind_file(kind), script)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn update_writes_one_alias_per_name() {
        let dir = TempDir::new().unwrap();
        let writer = ShortcutWriter::new(dir.path().to_path_buf());
        writer
            .update(
                ItemKind::Cmd,
                &["build".to_string(), "deploy".to_string()],
            )
            .unwrap();
        let script =
            fs::read_to_string(dir.path().join("aliases-cmd")).unwrap();
        assert_eq!(script.lines().count(), 2);
        assert!(script.contains("alias build="));
        assert!(script.contains("cmd run deploy"));
        // The main script sourcing both kind scripts appears as well.
        let main = fs::read_to_string(dir.path().join("aliases")).unwrap();
        assert!(main.contains("aliases-cmd"));
        assert!(main.contains("aliases-seq"));
    }

    #[test]
    fn update_replaces_stale_aliases() {
        let dir = TempDir::new().unwrap();
        let writer = ShortcutWriter::new(dir.path().to_path_buf());
        writer.update(ItemKind::Seq, &["old".to_string()]).unwrap();
        writer.update(ItemKind::Seq, &["new".to_string()]).unwrap();
        let script =
            fs::read_to_string(dir.path().join("aliases-seq")).unwrap();
        assert!(!script.contains("alias old="));
        assert!(script.contains("alias new="));
    }
}
