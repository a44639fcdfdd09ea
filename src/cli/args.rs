// src/cli/args.rs

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// chaintool: organize and run collections of parameterized commandlines.
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Work with saved commands.
    #[command(subcommand)]
    Cmd(CmdCommand),

    /// Work with saved sequences of commands.
    #[command(subcommand)]
    Seq(SeqCommand),

    /// Display all saved commands together.
    Print(PrintAllArgs),

    /// Update placeholder values across all saved commands.
    Vals(ValsAllArgs),

    /// Write all commands and sequences to a portable file.
    Export(ExportArgs),

    /// Read commands and sequences back in from an exported file.
    Import(ImportArgs),
}

#[derive(Subcommand, Debug)]
pub enum CmdCommand {
    /// List the names of all saved commands.
    List(ListArgs),

    /// Create or replace a command from a commandline template.
    Set(CmdSetArgs),

    /// Edit a command's template interactively, creating it if needed.
    Edit(CmdEditArgs),

    /// Display a command and its placeholders.
    Print(CmdPrintArgs),

    /// Delete commands.
    Del(CmdDelArgs),

    /// Run a command, optionally supplying placeholder values.
    Run(CmdRunArgs),

    /// Change the stored placeholder values of a command.
    Vals(CmdValsArgs),
}

#[derive(Subcommand, Debug)]
pub enum SeqCommand {
    /// List the names of all saved sequences.
    List(ListArgs),

    /// Create or replace a sequence from a list of command names.
    Set(SeqSetArgs),

    /// Edit a sequence's command list interactively, creating it if needed.
    Edit(SeqEditArgs),

    /// Display a sequence's commands and their placeholders.
    Print(SeqPrintArgs),

    /// Delete sequences.
    Del(SeqDelArgs),

    /// Run every command in a sequence, in order.
    Run(SeqRunArgs),

    /// Change stored placeholder values across a sequence's commands.
    Vals(SeqValsArgs),
}

/// Argument shapes emitted by the hidden placeholder dump, for shell
/// completion scripts.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DumpChoice {
    Run,
    Vals,
}

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Print one name per line instead of one space-separated row.
    #[arg(short, long)]
    pub column: bool,
}

#[derive(Args, Debug)]
pub struct CmdSetArgs {
    /// Don't display the command after storing it.
    #[arg(short, long)]
    pub quiet: bool,

    /// Name to store the command under.
    pub cmdname: String,

    /// Commandline template; quote it so the shell passes it whole.
    pub cmdline: String,
}

#[derive(Args, Debug)]
pub struct CmdEditArgs {
    /// Don't display the command after storing it.
    #[arg(short, long)]
    pub quiet: bool,

    /// Name of the command to edit or create.
    pub cmdname: String,
}

#[derive(Args, Debug)]
pub struct CmdPrintArgs {
    /// Name of the command to display.
    pub cmdname: String,

    #[arg(long, value_enum, hide = true)]
    pub dump_placeholders: Option<DumpChoice>,
}

#[derive(Args, Debug)]
pub struct CmdDelArgs {
    /// Delete even if a sequence still uses the command.
    #[arg(short, long)]
    pub force: bool,

    /// Names of the commands to delete.
    #[arg(required = true)]
    pub cmdnames: Vec<String>,
}

#[derive(Args, Debug)]
pub struct CmdRunArgs {
    /// Name of the command to run.
    pub cmdname: String,

    /// Placeholder arguments: name=value, or +name to turn a toggle on.
    pub args: Vec<String>,
}

#[derive(Args, Debug)]
pub struct CmdValsArgs {
    /// Don't display the command after updating it.
    #[arg(short, long)]
    pub quiet: bool,

    /// Name of the command to update.
    pub cmdname: String,

    /// Value updates: name=value sets a default, a bare name makes the
    /// value required again, +name=untoggled:toggled replaces toggle
    /// values.
    #[arg(required = true)]
    pub args: Vec<String>,
}

#[derive(Args, Debug)]
pub struct SeqSetArgs {
    /// Don't display the sequence after storing it.
    #[arg(short, long)]
    pub quiet: bool,

    /// Accept command names that don't exist yet.
    #[arg(short, long)]
    pub force: bool,

    /// Name to store the sequence under.
    pub seqname: String,

    /// Names of the commands to run, in order.
    #[arg(required = true)]
    pub cmdnames: Vec<String>,
}

#[derive(Args, Debug)]
pub struct SeqEditArgs {
    /// Don't display the sequence after storing it.
    #[arg(short, long)]
    pub quiet: bool,

    /// Accept command names that don't exist yet.
    #[arg(short, long)]
    pub force: bool,

    /// Name of the sequence to edit or create.
    pub seqname: String,
}

#[derive(Args, Debug)]
pub struct SeqPrintArgs {
    /// Name of the sequence to display.
    pub seqname: String,

    #[arg(long, value_enum, hide = true)]
    pub dump_placeholders: Option<DumpChoice>,
}

#[derive(Args, Debug)]
pub struct SeqDelArgs {
    /// Names of the sequences to delete.
    #[arg(required = true)]
    pub seqnames: Vec<String>,
}

#[derive(Args, Debug)]
pub struct SeqRunArgs {
    /// Keep running later commands after one fails.
    #[arg(short, long)]
    pub ignore_errors: bool,

    /// Name of a command to skip; may be given more than once.
    #[arg(short, long)]
    pub skip: Vec<String>,

    /// Name of the sequence to run.
    pub seqname: String,

    /// Placeholder arguments, applied to every command in the sequence.
    pub args: Vec<String>,
}

#[derive(Args, Debug)]
pub struct SeqValsArgs {
    /// Don't display the sequence after updating it.
    #[arg(short, long)]
    pub quiet: bool,

    /// Name of the sequence whose commands to update.
    pub seqname: String,

    /// Value updates, applied to every command in the sequence.
    #[arg(required = true)]
    pub args: Vec<String>,
}

#[derive(Args, Debug)]
pub struct PrintAllArgs {
    #[arg(long, value_enum, hide = true)]
    pub dump_placeholders: Option<DumpChoice>,
}

#[derive(Args, Debug)]
pub struct ValsAllArgs {
    /// Value updates, applied to every saved command.
    #[arg(required = true)]
    pub args: Vec<String>,
}

#[derive(Args, Debug)]
pub struct ExportArgs {
    /// File to write.
    pub file: PathBuf,
}

#[derive(Args, Debug)]
pub struct ImportArgs {
    /// Replace items that already exist instead of keeping them.
    #[arg(short, long)]
    pub overwrite: bool,

    /// File to read, as written by export.
    pub file: PathBuf,
}
