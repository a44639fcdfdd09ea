// src/system/vtools.rs

//! Virtual tools: commandlines whose first word names a tool that runs
//! inside this process instead of going to the shell. They provide
//! platform-independent file copy/delete and a way for one sequence
//! member to feed placeholder values to the members after it.

use crate::core::printer::errprint;

use lazy_static::lazy_static;
use regex::Regex;
use std::collections::BTreeMap;
use std::fs;
use std::io;

lazy_static! {
    /// `name=value` with a legal placeholder name.
    static ref ENV_OP_RE: Regex =
        Regex::new(r"^([a-zA-Z][a-zA-Z0-9_]*)=(.*)$").unwrap();
}

/// Runs the virtual tool named by the commandline's first word, if any.
///
/// Returns `None` when the commandline is not a virtual tool invocation
/// and should go to the shell instead. `run_args` is the live run argument
/// list for the current run; `chaintool-env` appends to it so that later
/// commands in a sequence see the new values.
pub fn dispatch(cmdline: &str, run_args: &mut Vec<String>) -> Option<i32> {
    let tokens = shlex::split(cmdline)?;
    let (tool, tool_args) = tokens.split_first()?;
    match tool.as_str() {
        "chaintool-copy" => Some(copytool(tool_args)),
        "chaintool-del" => Some(deltool(tool_args)),
        "chaintool-env" => Some(envtool(tool_args, run_args)),
        _ => None,
    }
}

fn copytool(args: &[String]) -> i32 {
    if args.len() != 2 {
        errprint("chaintool-copy takes two arguments: sourcepath and destpath");
        return 1;
    }
    match fs::copy(&args[0], &args[1]) {
        Ok(_) => {
            println!("copied \"{}\" to \"{}\"", args[0], args[1]);
            0
        }
        Err(err) => {
            println!("{err}");
            1
        }
    }
}

fn deltool(args: &[String]) -> i32 {
    if args.len() != 1 {
        errprint("chaintool-del takes one argument: filepath");
        return 1;
    }
    match fs::remove_file(&args[0]) {
        // A file that is already gone counts as deleted.
        Ok(()) => {
            println!("deleted \"{}\"", args[0]);
            0
        }
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            println!("deleted \"{}\"", args[0]);
            0
        }
        Err(err) => {
            println!("{err}");
            1
        }
    }
}

fn env_op_parse(env_op: &str) -> Option<(String, String)> {
    let caps = ENV_OP_RE.captures(env_op).or_else(|| {
        errprint("Bad chaintool-env argument format.");
        None
    })?;
    Some((
        caps.get(1).unwrap().as_str().to_string(),
        caps.get(2).unwrap().as_str().to_string(),
    ))
}

/// Appends one `name=value` run argument per env op, unless a value for
/// that name is already present among the run arguments. Later commands in
/// the sequence pick the new values up as ordinary overrides.
fn envtool(env_args: &[String], run_args: &mut Vec<String>) -> i32 {
    let mut ops = Vec::with_capacity(env_args.len());
    for arg in env_args {
        match env_op_parse(arg) {
            Some(op) => ops.push(op),
            None => return 1,
        }
    }
    for (dst_name, src_value) in ops {
        let already_set = run_args.iter().any(|arg| {
            !arg.starts_with('+')
                && arg.split('=').next() == Some(dst_name.as_str())
        });
        if already_set {
            println!("{dst_name} already has value; not modifying");
            continue;
        }
        let new_arg = format!("{dst_name}={src_value}");
        println!("{new_arg}");
        run_args.push(new_arg);
    }
    0
}

/// Records the placeholder values a commandline would feed to later
/// sequence members, for display purposes. Only `chaintool-env`
/// commandlines contribute anything.
pub fn env_updates(cmdline: &str, env_values: &mut BTreeMap<String, String>) {
    let Some(tokens) = shlex::split(cmdline) else {
        return;
    };
    let Some((tool, env_args)) = tokens.split_first() else {
        return;
    };
    if tool != "chaintool-env" {
        return;
    }
    let mut parsed = Vec::with_capacity(env_args.len());
    for arg in env_args {
        match env_op_parse(arg) {
            Some(op) => parsed.push(op),
            None => return,
        }
    }
    for (name, value) in parsed {
        env_values.insert(name, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn strings(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn non_vtool_commandlines_are_ignored() {
        let mut run_args = Vec::new();
        assert_eq!(dispatch("echo hello", &mut run_args), None);
        assert_eq!(dispatch("chaintool-unknown x", &mut run_args), None);
    }

    #[test]
    fn copytool_copies_and_checks_arity() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("a.txt");
        let dst = dir.path().join("b.txt");
        fs::write(&src, "payload").unwrap();
        let cmdline = format!(
            "chaintool-copy {} {}",
            src.to_str().unwrap(),
            dst.to_str().unwrap()
        );
        let mut run_args = Vec::new();
        assert_eq!(dispatch(&cmdline, &mut run_args), Some(0));
        assert_eq!(fs::read_to_string(&dst).unwrap(), "payload");
        assert_eq!(dispatch("chaintool-copy onlyone", &mut run_args), Some(1));
    }

    #[test]
    fn deltool_tolerates_missing_files() {
        let dir = TempDir::new().unwrap();
        let victim = dir.path().join("victim.txt");
        fs::write(&victim, "x").unwrap();
        let cmdline = format!("chaintool-del {}", victim.to_str().unwrap());
        let mut run_args = Vec::new();
        assert_eq!(dispatch(&cmdline, &mut run_args), Some(0));
        assert!(!victim.exists());
        // Deleting an already-absent file is a success.
        assert_eq!(dispatch(&cmdline, &mut run_args), Some(0));
    }

    #[test]
    fn envtool_appends_only_unset_values() {
        let mut run_args = strings(&["out=given", "+verbose"]);
        let status = dispatch(
            "chaintool-env out=computed level=3",
            &mut run_args,
        );
        assert_eq!(status, Some(0));
        // "out" already had a value; "level" was added.
        assert_eq!(run_args, strings(&["out=given", "+verbose", "level=3"]));
    }

    #[test]
    fn envtool_rejects_bad_op_format() {
        let mut run_args = Vec::new();
        assert_eq!(dispatch("chaintool-env novalue", &mut run_args), Some(1));
        assert!(run_args.is_empty());
    }

    #[test]
    fn env_updates_collects_values_in_order() {
        let mut env_values = BTreeMap::new();
        env_updates("chaintool-env a=1 b=2", &mut env_values);
        env_updates("chaintool-env a=3", &mut env_values);
        env_updates("echo not-an-env-tool", &mut env_values);
        assert_eq!(env_values.get("a"), Some(&"3".to_string()));
        assert_eq!(env_values.get("b"), Some(&"2".to_string()));
    }
}
