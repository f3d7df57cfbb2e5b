//! Command-line parsing
//!
//! The command is a free positional word rather than a clap subcommand so
//! that unknown commands and argument counts are reported with our own
//! messages and exit code.

use clap::{CommandFactory, Parser};
use hooktun_client::{TunnelProtocol, DEFAULT_CONFIG_PATH};
use std::ffi::OsString;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

/// Public hostname requested by quick start
pub const DEFAULT_HOST: &str = "hookurl.arumiot.com";

/// Local port exposed by quick start
pub const DEFAULT_PORT: u16 = 8000;

const COMMANDS_HELP: &str = "\
Commands:
  tunnel id                        Show client identifier
  tunnel list                      List tunnel names from config file
  tunnel start <tunnel> [...]      Start tunnels by name from config file
  tunnel start-all                 Start all tunnels defined in config file
  tunnel qstart                    Start a single tunnel from flags

Examples:
  tunnel start www ssh
  tunnel --config config.yml --log-level 2 start ssh
  tunnel start-all
  tunnel qstart --host demo.arumiot.com -p 3000";

/// Tunnel client - Expose local services through a relay
#[derive(Parser, Debug)]
#[command(name = "tunnel")]
#[command(about = "Expose local services through a tunnel relay", long_about = None)]
#[command(after_help = COMMANDS_HELP)]
pub struct Cli {
    /// Command to run (id, list, start, start-all, qstart)
    pub command: Option<String>,

    /// Tunnel names for `start`
    pub args: Vec<String>,

    /// Path to the tunnel manifest
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// Public hostname for quick start
    #[arg(long, default_value = DEFAULT_HOST)]
    pub host: String,

    /// Local port for quick start
    #[arg(short = 'p', default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Protocol for quick start (http, tcp)
    #[arg(long, default_value = "http", value_parser = parse_quick_start_protocol)]
    pub protocol: TunnelProtocol,

    /// Log verbosity: 0 error, 1 info, 2 debug, 3 trace
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u8).range(0..=3))]
    pub log_level: u8,

    /// Print version and exit
    #[arg(long)]
    pub version: bool,
}

fn parse_quick_start_protocol(s: &str) -> Result<TunnelProtocol, String> {
    match s.to_lowercase().as_str() {
        "http" => Ok(TunnelProtocol::Http),
        "tcp" => Ok(TunnelProtocol::Tcp),
        other => Err(format!("invalid protocol '{}', expected http or tcp", other)),
    }
}

/// Command selected by the first positional argument
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Id,
    List,
    Start,
    StartAll,
    QuickStart,
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::Id => "id",
            Command::List => "list",
            Command::Start => "start",
            Command::StartAll => "start-all",
            Command::QuickStart => "qstart",
        }
    }

    /// Whether the command reads the manifest file
    pub fn uses_config_file(&self) -> bool {
        !matches!(self, Command::QuickStart)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Command {
    type Err = UsageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "id" => Ok(Command::Id),
            "list" => Ok(Command::List),
            "start" => Ok(Command::Start),
            "start-all" => Ok(Command::StartAll),
            "qstart" => Ok(Command::QuickStart),
            other => Err(UsageError::UnknownCommand(other.to_string())),
        }
    }
}

/// Invalid command line
#[derive(Debug, Error)]
pub enum UsageError {
    #[error(transparent)]
    Flags(#[from] clap::Error),

    #[error("unknown command {0:?}")]
    UnknownCommand(String),

    #[error("{0} takes no arguments")]
    UnexpectedArguments(Command),

    #[error("you must specify at least one tunnel to start")]
    NoTunnelNames,
}

/// Parsed command line
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    /// `None` only when `--version` was given without a valid command
    pub command: Option<Command>,
    pub args: Vec<String>,
    pub host: String,
    pub port: u16,
    pub protocol: TunnelProtocol,
    pub config_path: PathBuf,
    pub log_level: u8,
    pub show_version: bool,
}

/// Result of parsing a command line
#[derive(Debug, Clone, PartialEq)]
pub enum ParseOutcome {
    Ready(Invocation),
    /// No command word; print usage
    MissingCommand,
}

impl Invocation {
    /// Parse a full argument vector, program name first
    pub fn parse_from<I, T>(args: I) -> Result<ParseOutcome, UsageError>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let cli = Cli::try_parse_from(args)?;
        Self::from_cli(cli)
    }

    pub fn from_cli(cli: Cli) -> Result<ParseOutcome, UsageError> {
        let command = match (&cli.command, cli.version) {
            // --version wins over anything wrong with the command
            (Some(word), true) => word.parse().ok(),
            (None, true) => None,
            (None, false) => return Ok(ParseOutcome::MissingCommand),
            (Some(word), false) => {
                let command: Command = word.parse()?;
                match command {
                    Command::Start if cli.args.is_empty() => {
                        return Err(UsageError::NoTunnelNames)
                    }
                    Command::Start => {}
                    _ if !cli.args.is_empty() => {
                        return Err(UsageError::UnexpectedArguments(command))
                    }
                    _ => {}
                }
                Some(command)
            }
        };

        Ok(ParseOutcome::Ready(Invocation {
            command,
            args: cli.args,
            host: cli.host,
            port: cli.port,
            protocol: cli.protocol,
            config_path: cli.config,
            log_level: cli.log_level,
            show_version: cli.version,
        }))
    }

    /// Tracing filter directive for `--log-level`
    pub fn log_filter(&self) -> &'static str {
        match self.log_level {
            0 => "error",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}

/// Full help text
pub fn usage() -> String {
    Cli::command().render_help().to_string()
}
