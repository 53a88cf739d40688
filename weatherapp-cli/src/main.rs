//! Binary crate for the `weatherapp` command-line tool.
//!
//! This crate focuses on:
//! - Parsing CLI arguments
//! - Interactive configuration and search
//! - Rendering the controller's result state

use std::process::ExitCode;

use clap::Parser;

mod cli;
mod logging;
mod render;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cmd = cli::Cli::parse();
    logging::init(cmd.verbose);
    cmd.run().await
}
