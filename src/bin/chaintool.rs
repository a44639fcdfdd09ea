// src/bin/chaintool.rs

use chaintool::cli::{self, args::Cli};
use chaintool::session::Session;

use clap::Parser;
use colored::Colorize;

fn main() {
    env_logger::init();
    let cli = Cli::parse();
    let status = match run(cli) {
        Ok(status) => status,
        Err(err) => {
            eprintln!("{}", format!("{err:#}").red());
            1
        }
    };
    std::process::exit(status);
}

fn run(cli: Cli) -> anyhow::Result<i32> {
    // The session (and the locks it holds) is dropped before the exit
    // above, so every marker this process created is cleaned up.
    let mut session = Session::init()?;
    cli::dispatch(cli, &mut session)
}
