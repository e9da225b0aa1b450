//! tj - schema migrations and data sync for the trade journal

use clap::Parser;
use std::process;

mod cli;
mod commands;
mod context;

use cli::{Cli, Commands};
use commands::common::ExitCode;
use commands::{export, import, init, migrate, rollback, status};

fn main() -> process::ExitCode {
    let cli = Cli::parse();

    let result = match &cli.command {
        Commands::Init => init::execute(&cli.global),
        Commands::Migrate(args) => migrate::execute(args, &cli.global),
        Commands::Rollback(args) => rollback::execute(args, &cli.global),
        Commands::Status(args) => status::execute(args, &cli.global),
        Commands::Export(args) => export::execute(args, &cli.global),
        Commands::Import(args) => import::execute(args, &cli.global),
    };

    match result {
        Ok(()) => process::ExitCode::SUCCESS,
        Err(err) => match err.downcast_ref::<ExitCode>() {
            Some(code) => process::ExitCode::from(u8::try_from(code.0).unwrap_or(1)),
            None => {
                eprintln!("Error: {err:#}");
                process::ExitCode::FAILURE
            }
        },
    }
}
