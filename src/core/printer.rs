// src/core/printer.rs

//! User-facing display of commands and their placeholders.

use crate::core::store::{ItemStore, StoreError};
use crate::models::CommandDef;
use crate::system::vtools;

use colored::Colorize;
use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet};

/// Error text goes to stderr in red, like all failure reporting here.
pub fn errprint(msg: &str) {
    eprintln!("{}", msg.red());
}

pub fn warnprint(msg: &str) {
    println!("{} {msg}", "Warning:".yellow());
}

fn quote(value: &str) -> String {
    shlex::try_quote(value)
        .map(Cow::into_owned)
        .unwrap_or_else(|_| value.to_string())
}

/// Displays one command: its template followed by its placeholders grouped
/// into required, optional, and toggle sections.
pub fn print_one(def: &CommandDef) {
    let mut required: Vec<&String> = Vec::new();
    let mut optional: Vec<&String> = Vec::new();
    for (name, value) in &def.args {
        if value.is_none() {
            required.push(name);
        } else {
            optional.push(name);
        }
    }
    println!("{}", "* commandline format:".magenta());
    println!("{}", def.cmdline);
    if !required.is_empty() {
        println!();
        println!("{}", "* required values:".magenta());
        for name in required {
            println!("{name}");
        }
    }
    if !optional.is_empty() {
        println!();
        println!("{}", "* optional values with default:".magenta());
        for name in optional {
            let value = def.args[name].as_deref().unwrap_or_default();
            println!("{name} = {}", quote(value));
        }
    }
    if !def.toggle_args.is_empty() {
        println!();
        println!("{}", "* toggles with untoggled:toggled values:".magenta());
        for (name, (untoggled, toggled)) in &def.toggle_args {
            println!("{name} = {}:{}", quote(untoggled), quote(toggled));
        }
    }
    println!();
}

/// Displays a group of commands together, with their placeholders grouped
/// by which subset of the commands uses them.
///
/// With `apply_env` set (sequence display), values that an earlier
/// `chaintool-env` member would provide are shown, highlighted, in place
/// of the stored defaults of later members.
pub fn print_multi(
    store: &ItemStore,
    commands: &[String],
    apply_env: bool,
) -> Result<i32, StoreError> {
    let mut defs_by_name: BTreeMap<String, CommandDef> = BTreeMap::new();
    let mut loaded_order: Vec<String> = Vec::new();
    let mut required: BTreeSet<String> = BTreeSet::new();
    let mut optional: BTreeSet<String> = BTreeSet::new();
    let mut toggles: BTreeSet<String> = BTreeSet::new();
    let mut commands_by_placeholder: BTreeMap<String, Vec<String>> =
        BTreeMap::new();
    let mut display = String::new();
    let mut env_values: BTreeMap<String, String> = BTreeMap::new();

    for name in commands {
        let mut def = match store.read_command(name) {
            Ok(def) => def,
            Err(StoreError::NotFound { .. }) => {
                display.push(' ');
                display.push_str(&name.red().to_string());
                continue;
            }
            Err(err) => return Err(err),
        };
        display.push(' ');
        display.push_str(name);
        if apply_env {
            for (key, value) in &mut def.args {
                if let Some(env_value) = env_values.get(key) {
                    *value = Some(env_value.green().to_string());
                }
            }
        }
        for (key, value) in &def.args {
            let users = commands_by_placeholder.entry(key.clone()).or_default();
            if !users.contains(name) {
                users.push(name.clone());
            }
            if value.is_none() {
                required.insert(key.clone());
                optional.remove(key);
            } else if !required.contains(key) {
                optional.insert(key.clone());
            }
        }
        for key in def.toggle_args.keys() {
            let users = commands_by_placeholder.entry(key.clone()).or_default();
            if !users.contains(name) {
                users.push(name.clone());
            }
            toggles.insert(key.clone());
        }
        if apply_env {
            vtools::env_updates(&def.cmdline, &mut env_values);
        }
        loaded_order.push(name.clone());
        defs_by_name.insert(name.clone(), def);
    }

    println!("{}", "** commands:".magenta());
    println!("{display}");
    println!();
    println!("{}", "** commandline formats:".magenta());
    for name in &loaded_order {
        println!("{}", format!("* {name}").cyan());
        println!("{}", defs_by_name[name].cmdline);
    }
    if !required.is_empty() {
        println!();
        println!("{}", "** required values:".magenta());
        print_command_groups(
            &required,
            commands,
            &commands_by_placeholder,
            &defs_by_name,
        );
    }
    if !optional.is_empty() {
        println!();
        println!("{}", "** optional values with default:".magenta());
        print_command_groups(
            &optional,
            commands,
            &commands_by_placeholder,
            &defs_by_name,
        );
    }
    if !toggles.is_empty() {
        println!();
        println!(
            "{}",
            "** toggles with untoggled:toggled values:".magenta()
        );
        print_command_groups(
            &toggles,
            commands,
            &commands_by_placeholder,
            &defs_by_name,
        );
    }
    println!();
    Ok(0)
}

/// Prints placeholders grouped by the exact set of commands using them.
/// Bigger groups come first; ties go to the group whose first command
/// appears earliest in the display order.
fn print_command_groups(
    argset: &BTreeSet<String>,
    commands: &[String],
    commands_by_placeholder: &BTreeMap<String, Vec<String>>,
    defs_by_name: &BTreeMap<String, CommandDef>,
) {
    let mut grouped: Vec<(Vec<String>, Vec<String>)> = Vec::new();
    for arg in argset {
        let group = &commands_by_placeholder[arg];
        if let Some(entry) = grouped.iter_mut().find(|(g, _)| g == group) {
            entry.1.push(arg.clone());
        } else {
            grouped.push((group.clone(), vec![arg.clone()]));
        }
    }
    let num_commands = commands.len();
    grouped.sort_by_key(|(group, _)| {
        let first_index = commands
            .iter()
            .position(|c| c == &group[0])
            .unwrap_or(num_commands);
        std::cmp::Reverse(
            num_commands * group.len() + num_commands - first_index,
        )
    });
    for (group, mut args) in grouped {
        println!("{}", format!("* {}", group.join(", ")).cyan());
        args.sort();
        for arg in &args {
            println!("{}", describe_arg(arg, &group, defs_by_name));
        }
    }
}

/// One display line for a placeholder across its command group: the common
/// value when every command agrees, each per-command value when they
/// differ, or just the bare name when it is required somewhere.
fn describe_arg(
    arg: &str,
    group: &[String],
    defs_by_name: &BTreeMap<String, CommandDef>,
) -> String {
    let first_def = &defs_by_name[&group[0]];
    if let Some((first_untoggled, first_toggled)) = first_def.toggle_args.get(arg)
    {
        let mut pieces = vec![format!(
            "{}:{} ({})",
            quote(first_untoggled),
            quote(first_toggled),
            group[0]
        )];
        let mut common = true;
        for cmd in &group[1..] {
            let (untoggled, toggled) = &defs_by_name[cmd].toggle_args[arg];
            if (untoggled, toggled) != (first_untoggled, first_toggled) {
                common = false;
            }
            pieces.push(format!(
                "{}:{} ({cmd})",
                quote(untoggled),
                quote(toggled)
            ));
        }
        return if common {
            format!("{arg} = {}:{}", quote(first_untoggled), quote(first_toggled))
        } else {
            format!("{arg} = {}", pieces.join(", "))
        };
    }
    let Some(first_value) = first_def.args[arg].clone() else {
        return format!("{arg} = ");
    };
    let mut pieces = vec![format!("{} ({})", quote(&first_value), group[0])];
    let mut common = true;
    for cmd in &group[1..] {
        match &defs_by_name[cmd].args[arg] {
            // Required somewhere in the group: no value to show.
            None => return arg.to_string(),
            Some(value) => {
                if *value != first_value {
                    common = false;
                }
                pieces.push(format!("{} ({cmd})", quote(value)));
            }
        }
    }
    if common {
        format!("{arg} = {}", quote(&first_value))
    } else {
        format!("{arg} = {}", pieces.join(", "))
    }
}

/// Machine-readable placeholder listing used by shell completion: one
/// argument suggestion per line, in the shape the given operation accepts.
pub fn dump_placeholders(
    store: &ItemStore,
    commands: &[String],
    is_run: bool,
) -> Result<i32, StoreError> {
    let mut consistent_values: BTreeMap<String, String> = BTreeMap::new();
    let mut other_placeholders: BTreeSet<String> = BTreeSet::new();
    let mut consistent_toggles: BTreeMap<String, (String, String)> =
        BTreeMap::new();
    let mut other_toggles: BTreeSet<String> = BTreeSet::new();
    for name in commands {
        let def = match store.read_command(name) {
            Ok(def) => def,
            Err(StoreError::NotFound { .. }) => continue,
            Err(err) => return Err(err),
        };
        for (key, value) in &def.args {
            match value {
                None => {
                    other_placeholders.insert(key.clone());
                }
                Some(value) => {
                    if other_placeholders.contains(key) {
                        continue;
                    }
                    match consistent_values.get(key) {
                        Some(seen) if seen != value => {
                            consistent_values.remove(key);
                            other_placeholders.insert(key.clone());
                        }
                        Some(_) => {}
                        None => {
                            consistent_values
                                .insert(key.clone(), value.clone());
                        }
                    }
                }
            }
        }
        for (key, value) in &def.toggle_args {
            if other_toggles.contains(key) {
                continue;
            }
            match consistent_toggles.get(key) {
                Some(seen) if seen != value => {
                    consistent_toggles.remove(key);
                    other_toggles.insert(key.clone());
                }
                Some(_) => {}
                None => {
                    consistent_toggles.insert(key.clone(), value.clone());
                }
            }
        }
    }
    for (key, value) in &consistent_values {
        println!("{key}={value}");
    }
    for key in &other_placeholders {
        println!("{key}");
    }
    for (key, (untoggled, toggled)) in &consistent_toggles {
        if is_run {
            println!("{key}");
        } else {
            println!("{key}={untoggled}:{toggled}");
        }
    }
    for key in &other_toggles {
        if is_run {
            println!("{key}");
        } else {
            println!("{key}=");
        }
    }
    Ok(0)
}
