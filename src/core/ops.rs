// src/core/ops.rs

//! The operations behind every CLI subcommand.
//!
//! Each operation acquires the locks it needs up front, in the fixed
//! order seq inventory, seq item, cmd inventory, cmd item, then works
//! through the store. Expected user-level failures are reported in red
//! and surface as a nonzero exit status; infrastructure failures
//! propagate as errors.

use crate::constants::EXPORT_SCHEMA_VERSION;
use crate::core::locks::LockMode;
use crate::core::printer::{self, errprint, warnprint};
use crate::core::store::{ItemStore, StoreError, WriteMode};
use crate::core::template;
use crate::models::{
    CommandDef, ExportFile, ExportedCommand, ExportedSequence, ItemKind,
    SequenceDef, is_valid_item_name,
};
use crate::session::Session;
use crate::system::{executor, vtools};

use anyhow::Result;
use colored::Colorize;
use log::warn;
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

/// Which operation's argument shapes a placeholder dump should emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DumpMode {
    Run,
    Vals,
}

fn name_ok(name: &str) -> bool {
    if is_valid_item_name(name) {
        return true;
    }
    errprint(&format!(
        "Invalid name '{name}': names must be nonempty and contain no \
         whitespace."
    ));
    false
}

fn other_kind_collision(store: &ItemStore, kind: ItemKind, name: &str) -> bool {
    if !store.exists(kind.other(), name) {
        return false;
    }
    errprint(&format!(
        "{} '{name}' cannot be created because a {} exists with the same \
         name.",
        kind.label(),
        kind.other().label().to_lowercase()
    ));
    true
}

/// Regenerates the alias script for one kind from the current name list.
/// Alias trouble is never worth failing the operation that triggered it.
fn refresh_shortcuts(session: &Session, kind: ItemKind) {
    let result = session
        .store
        .all_names(kind)
        .map_err(anyhow::Error::from)
        .and_then(|names| {
            session
                .shortcuts
                .update(kind, &names)
                .map_err(anyhow::Error::from)
        });
    if let Err(err) = result {
        warn!("could not refresh shortcut aliases: {err}");
    }
}

fn editline(prompt: &str, initial: &str) -> dialoguer::Result<String> {
    dialoguer::Input::new()
        .with_prompt(prompt)
        .with_initial_text(initial)
        .allow_empty(true)
        .interact_text()
}

fn item_list(store: &ItemStore, kind: ItemKind, column: bool) -> Result<i32> {
    let names = store.all_names(kind)?;
    if !names.is_empty() {
        if column {
            for name in &names {
                println!("{name}");
            }
        } else {
            println!("{}", names.join(" "));
        }
    }
    Ok(0)
}

pub fn cmd_list(session: &Session, column: bool) -> Result<i32> {
    item_list(&session.store, ItemKind::Cmd, column)
}

pub fn seq_list(session: &Session, column: bool) -> Result<i32> {
    item_list(&session.store, ItemKind::Seq, column)
}

/// Parses a commandline and stores it under the given name. `compact`
/// suppresses the leading blank line for callers that print their own
/// framing.
fn cmd_set_internal(
    store: &ItemStore,
    name: &str,
    cmdline: &str,
    overwrite: bool,
    print_after_set: bool,
    compact: bool,
) -> Result<i32> {
    if !compact {
        println!();
    }
    if !name_ok(name) {
        println!();
        return Ok(1);
    }
    if cmdline.is_empty() {
        errprint("The commandline must be nonempty.");
        println!();
        return Ok(1);
    }
    let def = match template::parse_cmdline(cmdline) {
        Ok(def) => def,
        Err(violations) => {
            errprint(&violations.to_string());
            println!();
            return Ok(1);
        }
    };
    let mode = if overwrite {
        WriteMode::Overwrite
    } else {
        WriteMode::Create
    };
    match store.write_command(name, &def, mode) {
        Ok(()) => {}
        Err(err @ StoreError::AlreadyExists { .. }) => {
            println!("{err}");
            println!();
            return Ok(0);
        }
        Err(err) => return Err(err.into()),
    }
    println!("Command '{name}' set.");
    println!();
    if print_after_set {
        return cmd_print_internal(store, name);
    }
    Ok(0)
}

pub fn cmd_set(
    session: &mut Session,
    name: &str,
    cmdline: &str,
    print_after_set: bool,
) -> Result<i32> {
    session.locks.inventory_lock(ItemKind::Seq, LockMode::Read)?;
    session.locks.inventory_lock(ItemKind::Cmd, LockMode::Write)?;
    session.locks.item_lock(ItemKind::Cmd, name, LockMode::Write)?;
    let creating = !session.store.exists(ItemKind::Cmd, name);
    if creating {
        if other_kind_collision(&session.store, ItemKind::Cmd, name) {
            println!();
            return Ok(1);
        }
    } else {
        session
            .locks
            .release_inventory_lock(ItemKind::Seq, LockMode::Read);
    }
    let status = cmd_set_internal(
        &session.store,
        name,
        cmdline,
        true,
        print_after_set,
        false,
    )?;
    if creating && status == 0 {
        refresh_shortcuts(session, ItemKind::Cmd);
    }
    Ok(status)
}

pub fn cmd_edit(
    session: &mut Session,
    name: &str,
    print_after_set: bool,
) -> Result<i32> {
    session.locks.inventory_lock(ItemKind::Seq, LockMode::Read)?;
    session.locks.inventory_lock(ItemKind::Cmd, LockMode::Write)?;
    session.locks.item_lock(ItemKind::Cmd, name, LockMode::Write)?;
    let mut creating = false;
    let old_cmdline = match session.store.read_command(name) {
        Ok(def) => def.cmdline,
        Err(StoreError::NotFound { .. }) => {
            if other_kind_collision(&session.store, ItemKind::Cmd, name) {
                println!();
                return Ok(1);
            }
            // Reserve the name with an empty placeholder so the inventory
            // locks can be dropped during the interactive edit.
            session.store.write_command(
                name,
                &CommandDef::default(),
                WriteMode::Overwrite,
            )?;
            creating = true;
            String::new()
        }
        Err(err) => return Err(err.into()),
    };
    session
        .locks
        .release_inventory_lock(ItemKind::Cmd, LockMode::Write);
    session
        .locks
        .release_inventory_lock(ItemKind::Seq, LockMode::Read);
    let store = &session.store;
    // Until the edit lands, any exit must take the placeholder with it.
    let placeholder = scopeguard::guard(creating, |created| {
        if created {
            if let Err(err) = store.delete(ItemKind::Cmd, name, true) {
                warn!("could not remove placeholder command: {err}");
            }
        }
    });
    println!();
    let new_cmdline = editline("commandline", &old_cmdline)?;
    let status = cmd_set_internal(
        store,
        name,
        &new_cmdline,
        true,
        print_after_set,
        false,
    )?;
    if status == 0 {
        if scopeguard::ScopeGuard::into_inner(placeholder) {
            refresh_shortcuts(session, ItemKind::Cmd);
        }
    }
    Ok(status)
}

fn cmd_print_internal(store: &ItemStore, name: &str) -> Result<i32> {
    match store.read_command(name) {
        Ok(def) => {
            printer::print_one(&def);
            Ok(0)
        }
        Err(err @ StoreError::NotFound { .. }) => {
            errprint(&err.to_string());
            println!();
            Ok(1)
        }
        Err(err) => Err(err.into()),
    }
}

pub fn cmd_print(
    session: &mut Session,
    name: &str,
    dump: Option<DumpMode>,
) -> Result<i32> {
    // The dump feeds shell completion, which cannot afford to block on
    // locks; a stale answer is acceptable there.
    if let Some(mode) = dump {
        let names = [name.to_string()];
        return Ok(printer::dump_placeholders(
            &session.store,
            &names,
            mode == DumpMode::Run,
        )?);
    }
    session.locks.item_lock(ItemKind::Cmd, name, LockMode::Read)?;
    println!();
    cmd_print_internal(&session.store, name)
}

pub fn cmd_del(session: &mut Session, names: &[String], force: bool) -> Result<i32> {
    session.locks.inventory_lock(ItemKind::Seq, LockMode::Read)?;
    let sequences = if force {
        Vec::new()
    } else {
        let seq_names = session.store.all_names(ItemKind::Seq)?;
        session
            .locks
            .multi_item_lock(ItemKind::Seq, &seq_names, LockMode::Read)?;
        let mut sequences = Vec::new();
        for seq_name in seq_names {
            match session.store.read_sequence(&seq_name) {
                Ok(def) => sequences.push((seq_name, def)),
                Err(StoreError::NotFound { .. }) => {}
                Err(err) => return Err(err.into()),
            }
        }
        sequences
    };
    session.locks.inventory_lock(ItemKind::Cmd, LockMode::Write)?;
    session
        .locks
        .multi_item_lock(ItemKind::Cmd, names, LockMode::Write)?;
    println!();
    // Nothing is deleted if any target is still referenced.
    let mut referenced = false;
    for name in names {
        let users: Vec<&str> = sequences
            .iter()
            .filter(|(_, def)| def.commands.contains(name))
            .map(|(seq_name, _)| seq_name.as_str())
            .collect();
        if !users.is_empty() {
            errprint(&format!(
                "Command '{name}' is used by sequences: {}.",
                users.join(", ")
            ));
            referenced = true;
        }
    }
    if referenced {
        errprint("Nothing deleted; use --force to delete in-use commands.");
        println!();
        return Ok(1);
    }
    let mut status = 0;
    let mut any_deleted = false;
    for name in names {
        match session.store.delete(ItemKind::Cmd, name, false) {
            Ok(()) => {
                println!("Command '{name}' deleted.");
                any_deleted = true;
            }
            Err(err @ StoreError::NotFound { .. }) => {
                errprint(&err.to_string());
                status = 1;
            }
            Err(err) => return Err(err.into()),
        }
    }
    println!();
    if any_deleted {
        refresh_shortcuts(session, ItemKind::Cmd);
    }
    Ok(status)
}

/// Resolves and executes one command. `run_args` is the live argument
/// list, which `chaintool-env` may extend for later commands in a
/// sequence; `unused_args` shrinks as commands consume arguments.
fn cmd_run_internal(
    store: &ItemStore,
    name: &str,
    run_args: &mut Vec<String>,
    unused_args: &mut Vec<String>,
) -> Result<i32> {
    println!();
    let def = match store.read_command(name) {
        Ok(def) => def,
        Err(err @ StoreError::NotFound { .. }) => {
            errprint(&err.to_string());
            println!();
            return Ok(1);
        }
        Err(err) => return Err(err.into()),
    };
    let args_snapshot = run_args.clone();
    let values =
        match template::resolve_for_run(&def, &args_snapshot, unused_args) {
            Ok(values) => values,
            Err(err) => {
                errprint(&err.to_string());
                println!();
                return Ok(1);
            }
        };
    let cmdline = match template::render(&def.format, &values) {
        Ok(cmdline) => cmdline,
        Err(err) => {
            errprint(&err.to_string());
            println!();
            return Ok(1);
        }
    };
    println!("{}", cmdline.cyan());
    println!();
    let status = match vtools::dispatch(&cmdline, run_args) {
        Some(status) => status,
        None => executor::run_in_shell(&cmdline)?,
    };
    println!();
    Ok(status)
}

pub fn cmd_run(session: &mut Session, name: &str, args: &[String]) -> Result<i32> {
    session.locks.item_lock(ItemKind::Cmd, name, LockMode::Read)?;
    let mut run_args = args.to_vec();
    let mut unused_args = args.to_vec();
    let status =
        cmd_run_internal(&session.store, name, &mut run_args, &mut unused_args)?;
    if !unused_args.is_empty() {
        warnprint(&format!(
            "the following args don't apply to this commandline: {}",
            unused_args.join(" ")
        ));
        println!();
    }
    Ok(status)
}

/// Applies value updates to one stored command and rewrites it.
fn cmd_vals_internal(
    store: &ItemStore,
    name: &str,
    args: &[String],
    unused_args: &mut Vec<String>,
    print_after_set: bool,
    compact: bool,
) -> Result<i32> {
    if !compact {
        println!();
    }
    let mut def = match store.read_command(name) {
        Ok(def) => def,
        Err(err @ StoreError::NotFound { .. }) => {
            errprint(&err.to_string());
            println!();
            return Ok(1);
        }
        Err(err) => return Err(err.into()),
    };
    if let Err(err) = template::apply_vals_args(&mut def, args, unused_args) {
        errprint(&err.to_string());
        println!();
        return Ok(1);
    }
    store.write_command(name, &def, WriteMode::Overwrite)?;
    println!("Command '{name}' updated.");
    println!();
    if print_after_set {
        return cmd_print_internal(store, name);
    }
    Ok(0)
}

pub fn cmd_vals(
    session: &mut Session,
    name: &str,
    args: &[String],
    print_after_set: bool,
) -> Result<i32> {
    session.locks.item_lock(ItemKind::Cmd, name, LockMode::Write)?;
    let mut unused_args = args.to_vec();
    let status = cmd_vals_internal(
        &session.store,
        name,
        args,
        &mut unused_args,
        print_after_set,
        false,
    )?;
    if status == 0 && !unused_args.is_empty() {
        warnprint(&format!(
            "the following args don't apply to this commandline: {}",
            unused_args.join(" ")
        ));
        println!();
    }
    Ok(status)
}

/// Stores a sequence. Member commands must exist unless `force` is set;
/// print shows missing ones in red.
fn seq_set_internal(
    store: &ItemStore,
    name: &str,
    commands: &[String],
    overwrite: bool,
    force: bool,
    print_after_set: bool,
    compact: bool,
) -> Result<i32> {
    if !compact {
        println!();
    }
    if !name_ok(name) {
        println!();
        return Ok(1);
    }
    if commands.is_empty() {
        errprint("A sequence must contain at least one command name.");
        println!();
        return Ok(1);
    }
    for cmd_name in commands {
        if !name_ok(cmd_name) {
            println!();
            return Ok(1);
        }
        if !force && !store.exists(ItemKind::Cmd, cmd_name) {
            errprint(&format!(
                "Command '{cmd_name}' does not exist; use --force to include \
                 it anyway."
            ));
            println!();
            return Ok(1);
        }
    }
    let def = SequenceDef {
        commands: commands.to_vec(),
    };
    let mode = if overwrite {
        WriteMode::Overwrite
    } else {
        WriteMode::Create
    };
    match store.write_sequence(name, &def, mode) {
        Ok(()) => {}
        Err(err @ StoreError::AlreadyExists { .. }) => {
            println!("{err}");
            println!();
            return Ok(0);
        }
        Err(err) => return Err(err.into()),
    }
    println!("Sequence '{name}' set.");
    println!();
    if print_after_set {
        return Ok(printer::print_multi(store, commands, true)?);
    }
    Ok(0)
}

pub fn seq_set(
    session: &mut Session,
    name: &str,
    commands: &[String],
    force: bool,
    print_after_set: bool,
) -> Result<i32> {
    session.locks.inventory_lock(ItemKind::Seq, LockMode::Write)?;
    session.locks.item_lock(ItemKind::Seq, name, LockMode::Write)?;
    session.locks.inventory_lock(ItemKind::Cmd, LockMode::Read)?;
    let creating = !session.store.exists(ItemKind::Seq, name);
    if creating {
        if other_kind_collision(&session.store, ItemKind::Seq, name) {
            println!();
            return Ok(1);
        }
    } else {
        session
            .locks
            .release_inventory_lock(ItemKind::Cmd, LockMode::Read);
    }
    let status = seq_set_internal(
        &session.store,
        name,
        commands,
        true,
        force,
        print_after_set,
        false,
    )?;
    if creating && status == 0 {
        refresh_shortcuts(session, ItemKind::Seq);
    }
    Ok(status)
}

pub fn seq_edit(
    session: &mut Session,
    name: &str,
    force: bool,
    print_after_set: bool,
) -> Result<i32> {
    session.locks.inventory_lock(ItemKind::Seq, LockMode::Write)?;
    session.locks.item_lock(ItemKind::Seq, name, LockMode::Write)?;
    session.locks.inventory_lock(ItemKind::Cmd, LockMode::Read)?;
    let mut creating = false;
    let old_commands = match session.store.read_sequence(name) {
        Ok(def) => def.commands.join(" "),
        Err(StoreError::NotFound { .. }) => {
            if other_kind_collision(&session.store, ItemKind::Seq, name) {
                println!();
                return Ok(1);
            }
            session.store.write_sequence(
                name,
                &SequenceDef::default(),
                WriteMode::Overwrite,
            )?;
            creating = true;
            String::new()
        }
        Err(err) => return Err(err.into()),
    };
    session
        .locks
        .release_inventory_lock(ItemKind::Cmd, LockMode::Read);
    session
        .locks
        .release_inventory_lock(ItemKind::Seq, LockMode::Write);
    let store = &session.store;
    let placeholder = scopeguard::guard(creating, |created| {
        if created {
            if let Err(err) = store.delete(ItemKind::Seq, name, true) {
                warn!("could not remove placeholder sequence: {err}");
            }
        }
    });
    println!();
    let new_commands = editline("commands", &old_commands)?;
    let commands: Vec<String> = new_commands
        .split_whitespace()
        .map(str::to_string)
        .collect();
    let status = seq_set_internal(
        store,
        name,
        &commands,
        true,
        force,
        print_after_set,
        false,
    )?;
    if status == 0 {
        if scopeguard::ScopeGuard::into_inner(placeholder) {
            refresh_shortcuts(session, ItemKind::Seq);
        }
    }
    Ok(status)
}

pub fn seq_print(
    session: &mut Session,
    name: &str,
    dump: Option<DumpMode>,
) -> Result<i32> {
    if let Some(mode) = dump {
        // Lock-free and quiet, for shell completion.
        let Ok(def) = session.store.read_sequence(name) else {
            return Ok(1);
        };
        return Ok(printer::dump_placeholders(
            &session.store,
            &def.commands,
            mode == DumpMode::Run,
        )?);
    }
    session.locks.item_lock(ItemKind::Seq, name, LockMode::Read)?;
    let def = match session.store.read_sequence(name) {
        Ok(def) => def,
        Err(err @ StoreError::NotFound { .. }) => {
            println!();
            errprint(&err.to_string());
            println!();
            return Ok(1);
        }
        Err(err) => return Err(err.into()),
    };
    session.locks.inventory_lock(ItemKind::Cmd, LockMode::Read)?;
    session
        .locks
        .multi_item_lock(ItemKind::Cmd, &def.commands, LockMode::Read)?;
    session
        .locks
        .release_inventory_lock(ItemKind::Cmd, LockMode::Read);
    println!();
    Ok(printer::print_multi(&session.store, &def.commands, true)?)
}

pub fn seq_del(session: &mut Session, names: &[String]) -> Result<i32> {
    session.locks.inventory_lock(ItemKind::Seq, LockMode::Write)?;
    session
        .locks
        .multi_item_lock(ItemKind::Seq, names, LockMode::Write)?;
    println!();
    let mut status = 0;
    let mut any_deleted = false;
    for name in names {
        match session.store.delete(ItemKind::Seq, name, false) {
            Ok(()) => {
                println!("Sequence '{name}' deleted.");
                any_deleted = true;
            }
            Err(err @ StoreError::NotFound { .. }) => {
                errprint(&err.to_string());
                status = 1;
            }
            Err(err) => return Err(err.into()),
        }
    }
    println!();
    if any_deleted {
        refresh_shortcuts(session, ItemKind::Seq);
    }
    Ok(status)
}

pub fn seq_run(
    session: &mut Session,
    name: &str,
    args: &[String],
    ignore_errors: bool,
    skip: &[String],
) -> Result<i32> {
    session.locks.item_lock(ItemKind::Seq, name, LockMode::Read)?;
    let def = match session.store.read_sequence(name) {
        Ok(def) => def,
        Err(err @ StoreError::NotFound { .. }) => {
            println!();
            errprint(&err.to_string());
            println!();
            return Ok(1);
        }
        Err(err) => return Err(err.into()),
    };
    session.locks.inventory_lock(ItemKind::Cmd, LockMode::Read)?;
    session
        .locks
        .multi_item_lock(ItemKind::Cmd, &def.commands, LockMode::Read)?;
    session
        .locks
        .release_inventory_lock(ItemKind::Cmd, LockMode::Read);
    println!();
    let mut run_args = args.to_vec();
    let mut unused_args = args.to_vec();
    for cmd_name in &def.commands {
        if skip.contains(cmd_name) {
            println!(
                "{}",
                format!("* SKIPPING command '{cmd_name}'").magenta()
            );
            println!();
            continue;
        }
        println!("{}", format!("* running command '{cmd_name}':").magenta());
        let status = cmd_run_internal(
            &session.store,
            cmd_name,
            &mut run_args,
            &mut unused_args,
        )?;
        if status != 0 && !ignore_errors {
            return Ok(status);
        }
    }
    if !unused_args.is_empty() {
        warnprint(&format!(
            "the following args don't apply to any commandline in this \
             sequence: {}",
            unused_args.join(" ")
        ));
        println!();
    }
    Ok(0)
}

pub fn seq_vals(
    session: &mut Session,
    name: &str,
    args: &[String],
    print_after_set: bool,
) -> Result<i32> {
    session.locks.item_lock(ItemKind::Seq, name, LockMode::Read)?;
    println!();
    let def = match session.store.read_sequence(name) {
        Ok(def) => def,
        Err(err @ StoreError::NotFound { .. }) => {
            errprint(&err.to_string());
            println!();
            return Ok(1);
        }
        Err(err) => return Err(err.into()),
    };
    session.locks.inventory_lock(ItemKind::Cmd, LockMode::Read)?;
    session
        .locks
        .multi_item_lock(ItemKind::Cmd, &def.commands, LockMode::Write)?;
    session
        .locks
        .release_inventory_lock(ItemKind::Cmd, LockMode::Read);
    let mut unused_args = args.to_vec();
    let mut seen: BTreeSet<&String> = BTreeSet::new();
    let mut failed = false;
    for cmd_name in &def.commands {
        if !seen.insert(cmd_name) {
            continue;
        }
        println!("{}", format!("* updating command '{cmd_name}':").magenta());
        let status = cmd_vals_internal(
            &session.store,
            cmd_name,
            args,
            &mut unused_args,
            false,
            true,
        )?;
        if status != 0 {
            failed = true;
        }
    }
    if !unused_args.is_empty() {
        warnprint(&format!(
            "the following args don't apply to any commandline in this \
             sequence: {}",
            unused_args.join(" ")
        ));
        println!();
    }
    if failed {
        return Ok(1);
    }
    if print_after_set {
        return Ok(printer::print_multi(&session.store, &def.commands, true)?);
    }
    Ok(0)
}

/// Prints every stored command together, placeholders grouped across the
/// whole inventory.
pub fn print_all(session: &mut Session, dump: Option<DumpMode>) -> Result<i32> {
    if let Some(mode) = dump {
        let names = session.store.all_names(ItemKind::Cmd)?;
        return Ok(printer::dump_placeholders(
            &session.store,
            &names,
            mode == DumpMode::Run,
        )?);
    }
    session.locks.inventory_lock(ItemKind::Cmd, LockMode::Read)?;
    let names = session.store.all_names(ItemKind::Cmd)?;
    session
        .locks
        .multi_item_lock(ItemKind::Cmd, &names, LockMode::Read)?;
    println!();
    Ok(printer::print_multi(&session.store, &names, false)?)
}

/// Applies value updates across every stored command.
pub fn vals_all(session: &mut Session, args: &[String]) -> Result<i32> {
    session.locks.inventory_lock(ItemKind::Cmd, LockMode::Read)?;
    let names = session.store.all_names(ItemKind::Cmd)?;
    session
        .locks
        .multi_item_lock(ItemKind::Cmd, &names, LockMode::Write)?;
    println!();
    let mut unused_args = args.to_vec();
    let mut failed = false;
    for name in &names {
        println!("{}", format!("* updating command '{name}':").magenta());
        let status = cmd_vals_internal(
            &session.store,
            name,
            args,
            &mut unused_args,
            false,
            true,
        )?;
        if status != 0 {
            failed = true;
        }
    }
    if !unused_args.is_empty() {
        warnprint(&format!(
            "the following args don't apply to any commandline: {}",
            unused_args.join(" ")
        ));
        println!();
    }
    Ok(i32::from(failed))
}

/// Writes every stored item to a portable JSON file. Only names and raw
/// commandlines travel; derived state is rebuilt on import.
pub fn export(session: &mut Session, file: &Path) -> Result<i32> {
    session.locks.inventory_lock(ItemKind::Seq, LockMode::Read)?;
    let seq_names = session.store.all_names(ItemKind::Seq)?;
    session
        .locks
        .multi_item_lock(ItemKind::Seq, &seq_names, LockMode::Read)?;
    session.locks.inventory_lock(ItemKind::Cmd, LockMode::Read)?;
    let cmd_names = session.store.all_names(ItemKind::Cmd)?;
    session
        .locks
        .multi_item_lock(ItemKind::Cmd, &cmd_names, LockMode::Read)?;
    println!();
    let mut envelope = ExportFile {
        schema_version: EXPORT_SCHEMA_VERSION,
        commands: Vec::new(),
        sequences: Vec::new(),
    };
    for name in &cmd_names {
        let def = session.store.read_command(name)?;
        envelope.commands.push(ExportedCommand {
            name: name.clone(),
            cmdline: def.cmdline,
        });
        println!("Command '{name}' exported.");
    }
    for name in &seq_names {
        let def = session.store.read_sequence(name)?;
        envelope.sequences.push(ExportedSequence {
            name: name.clone(),
            commands: def.commands,
        });
        println!("Sequence '{name}' exported.");
    }
    let text = serde_json::to_string_pretty(&envelope)?;
    fs::write(file, text + "\n")?;
    println!();
    Ok(0)
}

/// Reads an export file back in, re-parsing each commandline so derived
/// state matches this version. Existing items are kept unless `overwrite`
/// is set.
pub fn import(session: &mut Session, file: &Path, overwrite: bool) -> Result<i32> {
    let text = fs::read_to_string(file)?;
    let envelope: ExportFile = serde_json::from_str(&text)?;
    println!();
    if envelope.schema_version > EXPORT_SCHEMA_VERSION {
        errprint(&format!(
            "This file was exported with schema version {} but this \
             chaintool only understands version {EXPORT_SCHEMA_VERSION}; \
             upgrade chaintool before importing it.",
            envelope.schema_version
        ));
        println!();
        return Ok(1);
    }
    session.locks.inventory_lock(ItemKind::Seq, LockMode::Write)?;
    session.locks.inventory_lock(ItemKind::Cmd, LockMode::Write)?;
    for item in &envelope.commands {
        if other_kind_collision(&session.store, ItemKind::Cmd, &item.name) {
            println!();
            continue;
        }
        if overwrite {
            session
                .locks
                .item_lock(ItemKind::Cmd, &item.name, LockMode::Write)?;
        }
        cmd_set_internal(
            &session.store,
            &item.name,
            &item.cmdline,
            overwrite,
            false,
            true,
        )?;
    }
    for item in &envelope.sequences {
        if other_kind_collision(&session.store, ItemKind::Seq, &item.name) {
            println!();
            continue;
        }
        if overwrite {
            session
                .locks
                .item_lock(ItemKind::Seq, &item.name, LockMode::Write)?;
        }
        // Members were just imported (or deliberately skipped), so the
        // existence check would only get in the way here.
        seq_set_internal(
            &session.store,
            &item.name,
            &item.commands,
            overwrite,
            true,
            false,
            true,
        )?;
    }
    refresh_shortcuts(session, ItemKind::Cmd);
    refresh_shortcuts(session, ItemKind::Seq);
    Ok(0)
}
