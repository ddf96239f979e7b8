//! CLI that sends one length-prefixed command over TCP and prints the reply.

#![allow(
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::missing_docs_in_private_items
)]

mod args;

use std::io::{self, Write};
use std::process::ExitCode;

use anyhow::{Context, Result};
use tcmd::{Command, Connector};
use tracing_subscriber::EnvFilter;

use args::{Invocation, Parsed};

fn main() -> ExitCode {
    init_tracing();

    let invocation = match args::parse(std::env::args_os()) {
        Ok(Parsed::Run(invocation)) => invocation,
        Ok(Parsed::Help) => {
            print!("{}", args::usage());
            return ExitCode::SUCCESS;
        }
        Ok(Parsed::Version(version)) => {
            print!("{version}");
            return ExitCode::SUCCESS;
        }
        Err(e) => {
            eprintln!("{e}");
            eprint!("{}", args::usage());
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = run(invocation) {
        eprintln!("tcmd: {e:#}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

/// Diagnostics go to stderr; stdout carries only the reply.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

/// Resolve, connect, send, receive once, print.
fn run(invocation: Invocation) -> Result<()> {
    let endpoint = tcmd::resolve(&invocation.address, invocation.port)?;
    let command = Command::new(invocation.command)?;

    let connector = invocation
        .timeout
        .map_or_else(Connector::new, |t| Connector::new().timeout(t));
    let reply = tcmd::exchange(&connector, &endpoint, &command)?;

    let mut out = io::stdout().lock();
    out.write_all(reply.as_bytes())
        .and_then(|()| out.flush())
        .context("writing reply to stdout")?;
    Ok(())
}
