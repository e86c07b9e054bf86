//! Binary crate for the `mm-weather` slash command server.
//!
//! This crate focuses on:
//! - Parsing CLI arguments
//! - Logging setup
//! - Starting the listener and mapping startup failures to exit codes

use std::process::ExitCode;

mod cli;
mod logging;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cmd = cli::Cli::parse_args();
    logging::init(cmd.debug);
    cmd.run().await
}
