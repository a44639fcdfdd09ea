// src/core/template.rs

//! The placeholder engine.
//!
//! A commandline template contains tokens wrapped in single braces. A token
//! is one of:
//!
//! - `{name}` a required value
//! - `{name=default}` an optional value with a default
//! - `{+name=untoggled:toggled}` a two-state toggle
//! - `{modifier/.../name}` or `{modifier/.../name=default}` a reference to
//!   `name` decorated with path modifiers, resolved at run time
//!
//! Literal braces are written doubled (`{{` and `}}`). Parsing produces a
//! `format` string in which each token is reduced to its bare key, so that
//! runtime substitution is a plain key-to-value dictionary application.

use crate::models::CommandDef;

use lazy_static::lazy_static;
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::Path;
use thiserror::Error;

lazy_static! {
    /// `name=value`, where the name is anything not starting with '+' and
    /// containing no '='. The value may be empty.
    static ref PLACEHOLDER_DEFAULT_RE: Regex =
        Regex::new(r"^([^+][^=]*)=(.*)$").unwrap();
    /// `+name=untoggled:toggled`. The untoggled value may not contain ':'.
    static ref PLACEHOLDER_TOGGLE_RE: Regex =
        Regex::new(r"^(\+[^=]+)=([^:]*):(.*)$").unwrap();
    /// Legal placeholder names: a letter, then letters/digits/underscores.
    static ref ALPHANUM_RE: Regex =
        Regex::new(r"^[a-zA-Z][a-zA-Z0-9_]*$").unwrap();
}

/// Modifier names that may prefix a placeholder reference.
pub const KNOWN_MODIFIERS: &[&str] = &["dirname", "basename", "stem"];

/// Errors raised while applying user-supplied placeholder arguments or
/// substituting values into a format string.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    #[error(
        "Can't specify values for 'toggle' style placeholders such as \
         '{0}' in this operation."
    )]
    ToggleValueNotAllowed(String),

    #[error("Placeholder '{0}' specified in args without a value.")]
    ValueRequired(String),

    #[error(
        "'Toggle' style placeholders such as '{0}' require accompanying \
         untoggled/toggled values in this operation."
    )]
    ToggleValuesRequired(String),

    #[error(
        "Modifier-decorated placeholders such as '{0}' cannot be set \
         directly; give a value for the base placeholder instead."
    )]
    ModifierNotSettable(String),

    #[error(
        "Not all placeholders in the commandline have been given a value.\n\
         Placeholders that still need a value: {}", .0.join(" ")
    )]
    Unresolved(Vec<String>),

    #[error("no value available for placeholder '{0}'")]
    UnknownKey(String),
}

/// Everything wrong with a commandline template, accumulated across the
/// whole scan so the user sees all problems at once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Violations {
    pub bad_names: BTreeSet<String>,
    pub bad_modifiers: BTreeSet<String>,
    pub multi_value_names: BTreeSet<String>,
    pub multi_togglevalue_names: BTreeSet<String>,
    pub toggles_without_values: BTreeSet<String>,
    pub toggle_dup_names: BTreeSet<String>,
}

impl Violations {
    pub fn is_empty(&self) -> bool {
        self.bad_names.is_empty()
            && self.bad_modifiers.is_empty()
            && self.multi_value_names.is_empty()
            && self.multi_togglevalue_names.is_empty()
            && self.toggles_without_values.is_empty()
            && self.toggle_dup_names.is_empty()
    }
}

fn join(names: &BTreeSet<String>) -> String {
    names.iter().cloned().collect::<Vec<_>>().join(" ")
}

impl fmt::Display for Violations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut sections: Vec<String> = Vec::new();
        if !self.bad_names.is_empty() {
            sections.push(format!(
                "Bad placeholder format: {}\n\
                 Placeholder names must begin with a letter and be composed \
                 only of letters, numbers, and underscores.\n\
                 (Note that this error can also be triggered by syntax \
                 mistakes when trying to specify placeholder default values \
                 or toggle values. Also, if you need a literal brace \
                 character to appear in the commandline, use a double \
                 brace.)",
                join(&self.bad_names)
            ));
        }
        if !self.bad_modifiers.is_empty() {
            sections.push(format!(
                "Unknown placeholder modifiers: {}\n\
                 Available modifiers: {}",
                join(&self.bad_modifiers),
                KNOWN_MODIFIERS.join(" ")
            ));
        }
        if !self.multi_value_names.is_empty() {
            sections.push(format!(
                "Placeholders occurring multiple times but with different \
                 defaults: {}",
                join(&self.multi_value_names)
            ));
        }
        if !self.multi_togglevalue_names.is_empty() {
            sections.push(format!(
                "'Toggle' placeholders occurring multiple times but with \
                 different values: {}",
                join(&self.multi_togglevalue_names)
            ));
        }
        if !self.toggles_without_values.is_empty() {
            sections.push(format!(
                "'Toggle' placeholders specified without values: {}",
                join(&self.toggles_without_values)
            ));
        }
        if !self.toggle_dup_names.is_empty() {
            sections.push(format!(
                "Same placeholder name(s) used for both regular and \
                 'toggle' placeholders: {}",
                join(&self.toggle_dup_names)
            ));
        }
        f.write_str(&sections.join("\n"))
    }
}

/// Doubles every brace so the value can be embedded in a template.
pub fn explode_literal_braces(value: &str) -> String {
    value.replace('{', "{{").replace('}', "}}")
}

/// Undoes `explode_literal_braces`.
pub fn collapse_literal_braces(value: &str) -> String {
    value.replace("{{", "{").replace("}}", "}")
}

/// Character-level scan of a commandline template.
///
/// Outside a token, characters pass through. A lone `{` followed by a
/// non-brace character opens a token; a lone `}` closes it, at which point
/// `handle_token` maps the token body to replacement text. Doubled braces
/// never open or close tokens.
///
/// When `keep_token_braces` is true the surrounding braces are kept around
/// the replacement (template-to-template rewrites); when false they are
/// dropped and doubled braces outside tokens collapse to single literals
/// (final rendering for execution).
fn scan_cmdline<F>(cmdline: &str, keep_token_braces: bool, mut handle_token: F) -> String
where
    F: FnMut(&str) -> String,
{
    let mut token = String::new();
    let mut out = String::new();
    let mut prev_undoubled_brace: Option<char> = None;
    for ch in cmdline.chars() {
        let is_brace = ch == '{' || ch == '}';
        if token.is_empty() {
            if prev_undoubled_brace == Some('{') && !is_brace {
                // The '{' that opened this token was already emitted.
                if !keep_token_braces {
                    out.pop();
                }
                token.push(ch);
            } else if !keep_token_braces && is_brace && prev_undoubled_brace == Some(ch) {
                // Second half of a doubled brace: already emitted once.
            } else {
                out.push(ch);
            }
        } else if ch == '}' && prev_undoubled_brace != Some('}') {
            out.push_str(&handle_token(&token));
            if keep_token_braces {
                out.push(ch);
            }
            token.clear();
        } else {
            token.push(ch);
        }
        if Some(ch) == prev_undoubled_brace {
            prev_undoubled_brace = None;
        } else if is_brace {
            prev_undoubled_brace = Some(ch);
        }
    }
    out
}

/// Splits a non-toggle token key into its modifier chain and base name.
/// `"dirname/src"` gives `(Some("dirname"), "src")`; `"src"` gives
/// `(None, "src")`.
fn split_modifiers(key: &str) -> (Option<&str>, &str) {
    match key.rsplit_once('/') {
        Some((chain, base)) => (Some(chain), base),
        None => (None, key),
    }
}

/// Parses a commandline template into a full command definition.
///
/// Scans the whole template even after the first problem so that every
/// violation is reported in one shot. No violations means the returned
/// definition is internally consistent and safe to store.
pub fn parse_cmdline(cmdline: &str) -> Result<CommandDef, Violations> {
    let mut args: BTreeMap<String, Option<String>> = BTreeMap::new();
    let mut args_modifiers: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    let mut toggle_args: BTreeMap<String, (String, String)> = BTreeMap::new();
    let mut violations = Violations::default();

    let format = scan_cmdline(cmdline, true, |token| {
        if let Some(caps) = PLACEHOLDER_TOGGLE_RE.captures(token) {
            let key = caps.get(1).unwrap().as_str().to_string();
            let value = (
                collapse_literal_braces(caps.get(2).unwrap().as_str()),
                collapse_literal_braces(caps.get(3).unwrap().as_str()),
            );
            if !ALPHANUM_RE.is_match(&key[1..]) {
                violations.bad_names.insert(key.clone());
            }
            if args.contains_key(&key[1..]) {
                violations.toggle_dup_names.insert(key[1..].to_string());
            }
            if let Some(prior) = toggle_args.get(&key) {
                if *prior != value {
                    violations.multi_togglevalue_names.insert(key.clone());
                }
            }
            toggle_args.insert(key.clone(), value);
            return key;
        }
        let (key, value) = match PLACEHOLDER_DEFAULT_RE.captures(token) {
            Some(caps) => (
                caps.get(1).unwrap().as_str().to_string(),
                Some(collapse_literal_braces(caps.get(2).unwrap().as_str())),
            ),
            None => {
                if let Some(name) = token.strip_prefix('+') {
                    // A toggle reference with no value pair.
                    if !ALPHANUM_RE.is_match(name) {
                        violations.bad_names.insert(token.to_string());
                    }
                    violations.toggles_without_values.insert(token.to_string());
                    return token.to_string();
                }
                (token.to_string(), None)
            }
        };
        let (chain, base) = split_modifiers(&key);
        if let Some(chain) = chain {
            if chain.is_empty()
                || !chain.split('/').all(|m| KNOWN_MODIFIERS.contains(&m))
            {
                violations.bad_modifiers.insert(key.clone());
            }
        }
        if !ALPHANUM_RE.is_match(base) {
            violations.bad_names.insert(key.clone());
        }
        if toggle_args.contains_key(&format!("+{base}")) {
            violations.toggle_dup_names.insert(base.to_string());
        }
        if let Some(prior) = args.get(base) {
            if *prior != value {
                violations.multi_value_names.insert(base.to_string());
            }
        }
        args.insert(base.to_string(), value);
        if let Some(chain) = chain {
            args_modifiers
                .entry(base.to_string())
                .or_default()
                .insert(chain.to_string());
        }
        key
    });

    if !violations.is_empty() {
        return Err(violations);
    }
    Ok(CommandDef {
        cmdline: cmdline.to_string(),
        format,
        args,
        args_modifiers,
        toggle_args,
    })
}

fn apply_modifier(modifier: &str, value: &str) -> String {
    let path = Path::new(value);
    let part = match modifier {
        "dirname" => path.parent().map(|p| p.to_string_lossy().into_owned()),
        "basename" => path.file_name().map(|p| p.to_string_lossy().into_owned()),
        "stem" => path.file_stem().map(|p| p.to_string_lossy().into_owned()),
        _ => None,
    };
    part.unwrap_or_default()
}

/// Applies a modifier chain innermost-first: `"dirname/basename"` applied
/// to `v` computes `dirname(basename(v))`.
fn apply_modifier_chain(chain: &str, value: &str) -> String {
    let mut value = value.to_string();
    for modifier in chain.split('/').rev() {
        value = apply_modifier(modifier, &value);
    }
    value
}

/// Resolves every placeholder to a concrete value for execution.
///
/// Run-time arguments may set plain values (`name=value`) or activate
/// toggles (`+name`); anything else is an error. Arguments consumed here
/// are removed from `unused_args`, which a sequence run threads through all
/// of its member commands to warn about leftovers afterward.
///
/// On success the returned map holds a value for every format key,
/// including one derived entry per modifier chain.
pub fn resolve_for_run(
    def: &CommandDef,
    all_args: &[String],
    unused_args: &mut Vec<String>,
) -> Result<BTreeMap<String, String>, TemplateError> {
    let mut values = def.args.clone();
    let mut activated: BTreeSet<String> = BTreeSet::new();
    for arg in all_args {
        if let Some(caps) = PLACEHOLDER_DEFAULT_RE.captures(arg) {
            let key = caps.get(1).unwrap().as_str();
            if key.contains('/') {
                return Err(TemplateError::ModifierNotSettable(key.to_string()));
            }
            if values.contains_key(key) {
                values.insert(
                    key.to_string(),
                    Some(caps.get(2).unwrap().as_str().to_string()),
                );
                unused_args.retain(|a| a != arg);
            }
        } else if arg.starts_with('+') {
            if PLACEHOLDER_TOGGLE_RE.is_match(arg) {
                let key = arg.split('=').next().unwrap_or(arg);
                return Err(TemplateError::ToggleValueNotAllowed(key.to_string()));
            }
            if let Some((_, toggled)) = def.toggle_args.get(arg) {
                values.insert(arg.clone(), Some(toggled.clone()));
                activated.insert(arg.clone());
                unused_args.retain(|a| a != arg);
            }
        } else {
            return Err(TemplateError::ValueRequired(arg.clone()));
        }
    }
    for (toggle, (untoggled, _)) in &def.toggle_args {
        if !activated.contains(toggle) {
            values.insert(toggle.clone(), Some(untoggled.clone()));
        }
    }
    let unspecified: Vec<String> = values
        .iter()
        .filter(|(_, v)| v.is_none())
        .map(|(k, _)| k.clone())
        .collect();
    if !unspecified.is_empty() {
        return Err(TemplateError::Unresolved(unspecified));
    }
    let mut resolved: BTreeMap<String, String> = values
        .into_iter()
        .map(|(k, v)| (k, v.unwrap_or_default()))
        .collect();
    for (base, chains) in &def.args_modifiers {
        let base_value = resolved
            .get(base)
            .cloned()
            .ok_or_else(|| TemplateError::UnknownKey(base.clone()))?;
        for chain in chains {
            resolved.insert(
                format!("{chain}/{base}"),
                apply_modifier_chain(chain, &base_value),
            );
        }
    }
    Ok(resolved)
}

/// Applies "vals" arguments to a stored definition, updating defaults and
/// toggle value pairs in place and regenerating the template text.
///
/// Here `name=value` sets a new default, a bare `name` clears the default
/// back to required, and `+name=untoggled:toggled` replaces a toggle's
/// value pair. A bare `+name` or a modifier-decorated argument is an error;
/// the restrictions are the mirror image of the run path.
pub fn apply_vals_args(
    def: &mut CommandDef,
    all_args: &[String],
    unused_args: &mut Vec<String>,
) -> Result<(), TemplateError> {
    for arg in all_args {
        if let Some(caps) = PLACEHOLDER_DEFAULT_RE.captures(arg) {
            let key = caps.get(1).unwrap().as_str();
            if key.contains('/') {
                return Err(TemplateError::ModifierNotSettable(key.to_string()));
            }
            if def.args.contains_key(key) {
                def.args.insert(
                    key.to_string(),
                    Some(caps.get(2).unwrap().as_str().to_string()),
                );
                unused_args.retain(|a| a != arg);
            }
        } else if let Some(caps) = PLACEHOLDER_TOGGLE_RE.captures(arg) {
            let key = caps.get(1).unwrap().as_str();
            if def.toggle_args.contains_key(key) {
                def.toggle_args.insert(
                    key.to_string(),
                    (
                        caps.get(2).unwrap().as_str().to_string(),
                        caps.get(3).unwrap().as_str().to_string(),
                    ),
                );
                unused_args.retain(|a| a != arg);
            }
        } else if arg.starts_with('+') {
            return Err(TemplateError::ToggleValuesRequired(arg.clone()));
        } else if arg.contains('/') {
            return Err(TemplateError::ModifierNotSettable(arg.clone()));
        } else if def.args.contains_key(arg) {
            def.args.insert(arg.clone(), None);
            unused_args.retain(|a| a != arg);
        }
    }
    regenerate_cmdline(def);
    Ok(())
}

/// Rewrites the stored template token-by-token from the current
/// args/toggle maps, so the on-disk text always reflects current defaults.
fn regenerate_cmdline(def: &mut CommandDef) {
    let args = def.args.clone();
    let toggle_args = def.toggle_args.clone();
    def.cmdline = scan_cmdline(&def.cmdline, true, |token| {
        if let Some(caps) = PLACEHOLDER_TOGGLE_RE.captures(token) {
            let key = caps.get(1).unwrap().as_str();
            let Some((untoggled, toggled)) = toggle_args.get(key) else {
                return token.to_string();
            };
            return format!(
                "{key}={}:{}",
                explode_literal_braces(untoggled),
                explode_literal_braces(toggled)
            );
        }
        let key = match PLACEHOLDER_DEFAULT_RE.captures(token) {
            Some(caps) => caps.get(1).unwrap().as_str().to_string(),
            None => token.to_string(),
        };
        let (_, base) = split_modifiers(&key);
        match args.get(base) {
            Some(Some(value)) => format!("{key}={}", explode_literal_braces(value)),
            Some(None) => key,
            None => token.to_string(),
        }
    });
}

/// Substitutes resolved values into a format string, collapsing doubled
/// braces to literals. Every token key must be present in `values`.
pub fn render(
    format: &str,
    values: &BTreeMap<String, String>,
) -> Result<String, TemplateError> {
    let mut missing: Option<String> = None;
    let rendered = scan_cmdline(format, false, |token| match values.get(token) {
        Some(value) => value.clone(),
        None => {
            missing.get_or_insert_with(|| token.to_string());
            String::new()
        }
    });
    match missing {
        Some(key) => Err(TemplateError::UnknownKey(key)),
        None => Ok(rendered),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn parse_classifies_tokens() {
        let def =
            parse_cmdline("gcc {+dbg=:-g} {src} -o {out=a.out}").unwrap();
        assert_eq!(def.format, "gcc {+dbg} {src} -o {out}");
        assert_eq!(def.args["src"], None);
        assert_eq!(def.args["out"], Some("a.out".to_string()));
        assert_eq!(
            def.toggle_args["+dbg"],
            ("".to_string(), "-g".to_string())
        );
        assert!(def.args_modifiers.is_empty());
    }

    #[test]
    fn parse_handles_doubled_braces() {
        let def = parse_cmdline("awk '{{print $1}}' {file}").unwrap();
        assert_eq!(def.format, "awk '{{print $1}}' {file}");
        assert_eq!(def.args.len(), 1);

        // Doubled open braces inside a default are stored collapsed. A
        // close brace always ends the token, so it cannot appear inside.
        let def = parse_cmdline("echo {x={{lit}").unwrap();
        assert_eq!(def.args["x"], Some("{lit".to_string()));
    }

    #[test]
    fn parse_records_modifier_chains() {
        let def = parse_cmdline("cp {src} {dirname/src}/backup/{stem/src}.bak")
            .unwrap();
        assert_eq!(
            def.format,
            "cp {src} {dirname/src}/backup/{stem/src}.bak"
        );
        let chains = &def.args_modifiers["src"];
        assert!(chains.contains("dirname"));
        assert!(chains.contains("stem"));
        assert_eq!(def.args.len(), 1);
    }

    #[test]
    fn parse_rejects_bad_names() {
        let violations = parse_cmdline("echo {9lives} {ok}").unwrap_err();
        assert!(violations.bad_names.contains("9lives"));
        assert!(violations.bad_modifiers.is_empty());
    }

    #[test]
    fn parse_rejects_unknown_modifiers() {
        let violations = parse_cmdline("echo {uppercase/x}").unwrap_err();
        assert!(violations.bad_modifiers.contains("uppercase/x"));
    }

    #[test]
    fn parse_rejects_conflicting_defaults() {
        let violations = parse_cmdline("echo {x=1} {x=2}").unwrap_err();
        assert!(violations.multi_value_names.contains("x"));
        // Required in one spot, defaulted in another is also a conflict.
        let violations = parse_cmdline("echo {x} {x=2}").unwrap_err();
        assert!(violations.multi_value_names.contains("x"));
        // Agreeing occurrences are fine.
        assert!(parse_cmdline("echo {x=1} {x=1}").is_ok());
    }

    #[test]
    fn parse_rejects_toggle_problems() {
        let violations = parse_cmdline("echo {+v=a:b} {+v=a:c}").unwrap_err();
        assert!(violations.multi_togglevalue_names.contains("+v"));

        let violations = parse_cmdline("echo {+v}").unwrap_err();
        assert!(violations.toggles_without_values.contains("+v"));

        let violations = parse_cmdline("echo {+v=a:b} {v}").unwrap_err();
        assert!(violations.toggle_dup_names.contains("v"));
        let violations = parse_cmdline("echo {v} {+v=a:b}").unwrap_err();
        assert!(violations.toggle_dup_names.contains("v"));
    }

    #[test]
    fn parse_reports_all_violations_at_once() {
        let violations =
            parse_cmdline("echo {9lives} {x=1} {x=2} {+t}").unwrap_err();
        assert!(violations.bad_names.contains("9lives"));
        assert!(violations.multi_value_names.contains("x"));
        assert!(violations.toggles_without_values.contains("+t"));
    }

    #[test]
    fn run_resolution_applies_overrides_and_toggles() {
        let def = parse_cmdline("gcc {+dbg=:-g} {src} -o {out=a.out}").unwrap();
        let mut unused = strings(&["src=main.c", "+dbg", "stray=1"]);
        let values =
            resolve_for_run(&def, &unused.clone(), &mut unused).unwrap();
        assert_eq!(values["src"], "main.c");
        assert_eq!(values["out"], "a.out");
        assert_eq!(values["+dbg"], "-g");
        assert_eq!(unused, strings(&["stray=1"]));

        let rendered = render(&def.format, &values).unwrap();
        assert_eq!(rendered, "gcc -g main.c -o a.out");
    }

    #[test]
    fn run_resolution_defaults_unactivated_toggles() {
        let def = parse_cmdline("make {+quiet=:-s} {target=all}").unwrap();
        let mut unused = Vec::new();
        let values = resolve_for_run(&def, &[], &mut unused).unwrap();
        assert_eq!(values["+quiet"], "");
        assert_eq!(render(&def.format, &values).unwrap(), "make  all");
    }

    #[test]
    fn run_resolution_reports_missing_values() {
        let def = parse_cmdline("cp {src} {dst}").unwrap();
        let mut unused = strings(&["src=a"]);
        let err =
            resolve_for_run(&def, &unused.clone(), &mut unused).unwrap_err();
        assert_eq!(err, TemplateError::Unresolved(vec!["dst".to_string()]));
    }

    #[test]
    fn run_resolution_rejects_forbidden_arg_shapes() {
        let def = parse_cmdline("echo {+v=a:b} {x}").unwrap();
        let mut unused = Vec::new();
        assert_eq!(
            resolve_for_run(&def, &strings(&["+v=c:d"]), &mut unused),
            Err(TemplateError::ToggleValueNotAllowed("+v".to_string()))
        );
        assert_eq!(
            resolve_for_run(&def, &strings(&["x"]), &mut unused),
            Err(TemplateError::ValueRequired("x".to_string()))
        );
        assert_eq!(
            resolve_for_run(&def, &strings(&["dirname/x=v"]), &mut unused),
            Err(TemplateError::ModifierNotSettable("dirname/x".to_string()))
        );
    }

    #[test]
    fn run_resolution_computes_modifier_chains() {
        let def =
            parse_cmdline("ls {dirname/f} {basename/f} {stem/f} {f}").unwrap();
        let mut unused = Vec::new();
        let values = resolve_for_run(
            &def,
            &strings(&["f=src/lib/util.tar.gz"]),
            &mut unused,
        )
        .unwrap();
        assert_eq!(values["dirname/f"], "src/lib");
        assert_eq!(values["basename/f"], "util.tar.gz");
        assert_eq!(values["stem/f"], "util.tar");
        assert_eq!(
            render(&def.format, &values).unwrap(),
            "ls src/lib util.tar.gz util.tar src/lib/util.tar.gz"
        );
    }

    #[test]
    fn modifier_chains_apply_innermost_first() {
        assert_eq!(apply_modifier_chain("dirname", "a/b/c.txt"), "a/b");
        assert_eq!(
            apply_modifier_chain("stem/basename", "a/b/c.tar.gz"),
            "c.tar"
        );
        assert_eq!(apply_modifier_chain("basename/dirname", "a/b/c.txt"), "b");
    }

    #[test]
    fn vals_updates_defaults_and_regenerates_template() {
        let mut def =
            parse_cmdline("gcc {+dbg=:-g} {src=main.c} -o {out}").unwrap();
        let mut unused = Vec::new();
        apply_vals_args(
            &mut def,
            &strings(&["src", "out=prog", "+dbg=:-g3"]),
            &mut unused,
        )
        .unwrap();
        assert_eq!(def.args["src"], None);
        assert_eq!(def.args["out"], Some("prog".to_string()));
        assert_eq!(def.toggle_args["+dbg"], ("".to_string(), "-g3".to_string()));
        assert_eq!(def.cmdline, "gcc {+dbg=:-g3} {src} -o {out=prog}");
    }

    #[test]
    fn vals_with_no_args_leaves_definition_unchanged() {
        let mut def =
            parse_cmdline("gcc {+dbg=:-g} {src} -o {out=a.out}").unwrap();
        let before = def.clone();
        let mut unused = Vec::new();
        apply_vals_args(&mut def, &[], &mut unused).unwrap();
        assert_eq!(def, before);
        assert!(unused.is_empty());
    }

    #[test]
    fn vals_rejects_forbidden_arg_shapes() {
        let mut def = parse_cmdline("echo {+v=a:b} {x}").unwrap();
        let mut unused = Vec::new();
        assert_eq!(
            apply_vals_args(&mut def, &strings(&["+v"]), &mut unused),
            Err(TemplateError::ToggleValuesRequired("+v".to_string()))
        );
        assert_eq!(
            apply_vals_args(&mut def, &strings(&["dirname/x=v"]), &mut unused),
            Err(TemplateError::ModifierNotSettable("dirname/x".to_string()))
        );
    }

    #[test]
    fn vals_regeneration_re_escapes_braces_in_values() {
        let mut def = parse_cmdline("echo {x=plain}").unwrap();
        let mut unused = Vec::new();
        apply_vals_args(&mut def, &strings(&["x={a"]), &mut unused).unwrap();
        assert_eq!(def.cmdline, "echo {x={{a}");
        // And the updated template parses back to the same definition.
        let reparsed = parse_cmdline(&def.cmdline).unwrap();
        assert_eq!(reparsed.args["x"], Some("{a".to_string()));
    }

    #[test]
    fn vals_regeneration_preserves_modifier_decorations() {
        let mut def = parse_cmdline("cp {f} {dirname/f}/bak").unwrap();
        let mut unused = Vec::new();
        apply_vals_args(&mut def, &strings(&["f=x/y.txt"]), &mut unused)
            .unwrap();
        assert_eq!(def.cmdline, "cp {f=x/y.txt} {dirname/f=x/y.txt}/bak");
    }

    #[test]
    fn render_collapses_doubled_braces() {
        let mut values = BTreeMap::new();
        values.insert("file".to_string(), "log".to_string());
        let rendered =
            render("awk '{{print $1}}' {file}", &values).unwrap();
        assert_eq!(rendered, "awk '{print $1}' log");
    }

    #[test]
    fn render_fails_on_unknown_key() {
        let values = BTreeMap::new();
        assert_eq!(
            render("echo {x}", &values),
            Err(TemplateError::UnknownKey("x".to_string()))
        );
    }
}
