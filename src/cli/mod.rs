// src/cli/mod.rs

//! Argument definitions and the bridge from parsed arguments to
//! operations.

pub mod args;

use crate::core::ops::{self, DumpMode};
use crate::session::Session;

use anyhow::Result;
use args::{Cli, CmdCommand, Command, DumpChoice, SeqCommand};

fn dump_mode(choice: Option<DumpChoice>) -> Option<DumpMode> {
    choice.map(|choice| match choice {
        DumpChoice::Run => DumpMode::Run,
        DumpChoice::Vals => DumpMode::Vals,
    })
}

/// Runs the operation the parsed commandline asks for and returns its
/// exit status.
pub fn dispatch(cli: Cli, session: &mut Session) -> Result<i32> {
    match cli.command {
        Command::Cmd(command) => match command {
            CmdCommand::List(args) => ops::cmd_list(session, args.column),
            CmdCommand::Set(args) => ops::cmd_set(
                session,
                &args.cmdname,
                &args.cmdline,
                !args.quiet,
            ),
            CmdCommand::Edit(args) => {
                ops::cmd_edit(session, &args.cmdname, !args.quiet)
            }
            CmdCommand::Print(args) => ops::cmd_print(
                session,
                &args.cmdname,
                dump_mode(args.dump_placeholders),
            ),
            CmdCommand::Del(args) => {
                ops::cmd_del(session, &args.cmdnames, args.force)
            }
            CmdCommand::Run(args) => {
                ops::cmd_run(session, &args.cmdname, &args.args)
            }
            CmdCommand::Vals(args) => ops::cmd_vals(
                session,
                &args.cmdname,
                &args.args,
                !args.quiet,
            ),
        },
        Command::Seq(command) => match command {
            SeqCommand::List(args) => ops::seq_list(session, args.column),
            SeqCommand::Set(args) => ops::seq_set(
                session,
                &args.seqname,
                &args.cmdnames,
                args.force,
                !args.quiet,
            ),
            SeqCommand::Edit(args) => ops::seq_edit(
                session,
                &args.seqname,
                args.force,
                !args.quiet,
            ),
            SeqCommand::Print(args) => ops::seq_print(
                session,
                &args.seqname,
                dump_mode(args.dump_placeholders),
            ),
            SeqCommand::Del(args) => ops::seq_del(session, &args.seqnames),
            SeqCommand::Run(args) => ops::seq_run(
                session,
                &args.seqname,
                &args.args,
                args.ignore_errors,
                &args.skip,
            ),
            SeqCommand::Vals(args) => ops::seq_vals(
                session,
                &args.seqname,
                &args.args,
                !args.quiet,
            ),
        },
        Command::Print(args) => {
            ops::print_all(session, dump_mode(args.dump_placeholders))
        }
        Command::Vals(args) => ops::vals_all(session, &args.args),
        Command::Export(args) => ops::export(session, &args.file),
        Command::Import(args) => {
            ops::import(session, &args.file, args.overwrite)
        }
    }
}
