// src/models.rs

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// The two kinds of stored items. They live in disjoint namespaces, but a
/// command and a sequence must never share a name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemKind {
    Cmd,
    Seq,
}

impl ItemKind {
    /// Short tag used in lock marker filenames.
    pub fn tag(self) -> &'static str {
        match self {
            Self::Cmd => "cmd",
            Self::Seq => "seq",
        }
    }

    /// Human-readable label used in user-facing messages.
    pub fn label(self) -> &'static str {
        match self {
            Self::Cmd => "Command",
            Self::Seq => "Sequence",
        }
    }

    /// The item kind whose namespace must be checked for name collisions.
    pub fn other(self) -> Self {
        match self {
            Self::Cmd => Self::Seq,
            Self::Seq => Self::Cmd,
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A stored command: the user-authored template plus everything derived
/// from it by the placeholder engine.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandDef {
    /// The original user-entered template string.
    pub cmdline: String,
    /// The template with every token reduced to its bare placeholder key,
    /// ready for dictionary substitution at run time.
    pub format: String,
    /// Placeholder name -> default value, or None if the value is required.
    pub args: BTreeMap<String, Option<String>>,
    /// Placeholder name -> set of modifier chains (e.g. "dirname" or
    /// "basename/stem") that decorate occurrences of that placeholder.
    #[serde(default)]
    pub args_modifiers: BTreeMap<String, BTreeSet<String>>,
    /// Toggle name (with its '+' prefix) -> (untoggled, toggled) values.
    pub toggle_args: BTreeMap<String, (String, String)>,
}

/// A stored sequence: an ordered list of command names. Duplicates are
/// allowed and order is significant at run time.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct SequenceDef {
    pub commands: Vec<String>,
}

/// One exported command (only the name and the raw template travel).
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ExportedCommand {
    pub name: String,
    pub cmdline: String,
}

/// One exported sequence.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ExportedSequence {
    pub name: String,
    pub commands: Vec<String>,
}

/// The export/import envelope. `schema_version` lets a future chaintool
/// change this format without older clients silently corrupting data.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ExportFile {
    pub schema_version: u32,
    pub commands: Vec<ExportedCommand>,
    pub sequences: Vec<ExportedSequence>,
}

/// Checks an item (command/sequence) name: non-empty, no whitespace.
pub fn is_valid_item_name(name: &str) -> bool {
    !name.is_empty() && !name.chars().any(char::is_whitespace)
}
