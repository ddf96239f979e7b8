//! Command-line parsing and validation.

use std::ffi::OsString;
use std::time::Duration;

use clap::error::{ContextKind, ErrorKind};
use clap::{CommandFactory, Parser};

/// Usage line shown in help and after every usage error.
const USAGE: &str = "tcmd [-h] [-t <SECONDS>] <ip address> <port> <command>";

/// Raw command line as clap sees it.
#[derive(Parser, Debug)]
#[command(
    name = "tcmd",
    version,
    about = "Send one length-prefixed command over TCP and print the reply",
    override_usage = USAGE,
    disable_help_flag = true
)]
struct Cli {
    /// Display this help message.
    #[arg(short = 'h', long = "help")]
    help: bool,

    /// Give up on connect, send or receive after this many seconds.
    #[arg(
        short = 't',
        long = "timeout",
        value_name = "SECONDS",
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    timeout: Option<u64>,

    /// <ip address> <port> <command>
    #[arg(value_name = "ARGS", num_args = 0..)]
    positional: Vec<OsString>,
}

/// A usage problem; always reported together with the usage text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub(crate) enum UsageError {
    #[error("Unknown option '{0}'.")]
    UnknownOption(String),

    #[error("Too few arguments.")]
    TooFew,

    #[error("Too many arguments.")]
    TooMany,

    #[error("Invalid characters in input.")]
    InvalidPort,

    #[error("in_port_t value out of range.")]
    PortOutOfRange,

    /// Any other rejection clap reports, e.g. a malformed `--timeout`.
    #[error("{0}")]
    Other(String),
}

/// A validated request to run one exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Invocation {
    /// Address text, resolved later.
    pub address: String,
    pub port: u16,
    /// Command bytes exactly as given on the command line.
    pub command: Vec<u8>,
    pub timeout: Option<Duration>,
}

/// Outcome of a successful parse.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Parsed {
    Help,
    Version(String),
    Run(Invocation),
}

/// Parses `args` (including the program name).
pub(crate) fn parse<I, T>(args: I) -> Result<Parsed, UsageError>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(e) if e.kind() == ErrorKind::DisplayVersion => {
            return Ok(Parsed::Version(e.to_string()));
        }
        Err(e) => return Err(from_clap(&e)),
    };
    if cli.help {
        return Ok(Parsed::Help);
    }

    let mut positional = cli.positional.into_iter();
    let (Some(address), Some(port), Some(command)) =
        (positional.next(), positional.next(), positional.next())
    else {
        return Err(UsageError::TooFew);
    };
    if positional.next().is_some() {
        return Err(UsageError::TooMany);
    }

    let port = port.to_str().ok_or(UsageError::InvalidPort)?;
    Ok(Parsed::Run(Invocation {
        address: address.to_string_lossy().into_owned(),
        port: parse_port(port)?,
        command: command.into_encoded_bytes(),
        timeout: cli.timeout.map(Duration::from_secs),
    }))
}

/// Parses a base-10 port number in `0..=65535`.
pub(crate) fn parse_port(text: &str) -> Result<u16, UsageError> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return Err(UsageError::InvalidPort);
    }
    // All digits: the only possible failure is overflow.
    text.parse().map_err(|_| UsageError::PortOutOfRange)
}

/// Rendered help, including the usage line.
pub(crate) fn usage() -> String {
    Cli::command().render_help().to_string()
}

fn from_clap(e: &clap::Error) -> UsageError {
    if e.kind() == ErrorKind::UnknownArgument {
        if let Some(arg) = e.get(ContextKind::InvalidArg) {
            return UsageError::UnknownOption(arg.to_string());
        }
    }
    let rendered = e.to_string();
    let first = rendered.lines().next().unwrap_or_default();
    UsageError::Other(first.trim_start_matches("error: ").to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(args: &[&str]) -> Result<Invocation, UsageError> {
        match parse(std::iter::once("tcmd").chain(args.iter().copied()))? {
            Parsed::Run(inv) => Ok(inv),
            other => panic!("expected an invocation, got {other:?}"),
        }
    }

    #[test]
    fn three_positionals() {
        let inv = run(&["127.0.0.1", "9000", "PING"]).unwrap();
        assert_eq!(inv.address, "127.0.0.1");
        assert_eq!(inv.port, 9000);
        assert_eq!(inv.command, b"PING");
        assert_eq!(inv.timeout, None);
    }

    #[test]
    fn empty_command_is_allowed() {
        assert!(run(&["::1", "1", ""]).unwrap().command.is_empty());
    }

    #[test]
    fn argument_count() {
        assert_eq!(run(&[]), Err(UsageError::TooFew));
        assert_eq!(run(&["127.0.0.1", "9000"]), Err(UsageError::TooFew));
        assert_eq!(
            run(&["127.0.0.1", "9000", "PING", "extra"]),
            Err(UsageError::TooMany)
        );
    }

    #[test]
    fn help_wins_over_positionals() {
        assert_eq!(parse(["tcmd", "-h"]), Ok(Parsed::Help));
        assert_eq!(parse(["tcmd", "-h", "a", "b", "c", "d"]), Ok(Parsed::Help));
    }

    #[test]
    fn version_flag() {
        assert!(matches!(parse(["tcmd", "-V"]), Ok(Parsed::Version(_))));
    }

    #[test]
    fn unknown_option_names_the_flag() {
        let err = run(&["-x", "127.0.0.1", "9000", "PING"]).unwrap_err();
        assert_eq!(err, UsageError::UnknownOption("-x".into()));
        assert_eq!(err.to_string(), "Unknown option '-x'.");
    }

    #[test]
    fn timeout_option() {
        let inv = run(&["-t", "5", "127.0.0.1", "9000", "PING"]).unwrap();
        assert_eq!(inv.timeout, Some(Duration::from_secs(5)));
        assert!(matches!(
            run(&["-t", "0", "127.0.0.1", "9000", "PING"]),
            Err(UsageError::Other(_))
        ));
    }

    #[test]
    fn port_range() {
        for p in ["0", "1", "80", "9000", "65535", "00080"] {
            assert!(parse_port(p).is_ok(), "{p}");
        }
        assert_eq!(parse_port("65535"), Ok(65535));
        assert_eq!(parse_port("65536"), Err(UsageError::PortOutOfRange));
        assert_eq!(parse_port("70000"), Err(UsageError::PortOutOfRange));
        assert_eq!(
            parse_port("99999999999999999999999"),
            Err(UsageError::PortOutOfRange)
        );
    }

    #[test]
    fn port_syntax() {
        for p in ["", "80a", "-1", "+80", " 80", "0x50", "8.0"] {
            assert_eq!(parse_port(p), Err(UsageError::InvalidPort), "{p:?}");
        }
    }

    #[test]
    fn out_of_range_port_message() {
        let err = run(&["127.0.0.1", "70000", "PING"]).unwrap_err();
        assert_eq!(err.to_string(), "in_port_t value out of range.");
    }

    #[test]
    fn usage_mentions_all_positionals() {
        let text = usage();
        assert!(text.contains("<ip address> <port> <command>"), "{text}");
    }
}
