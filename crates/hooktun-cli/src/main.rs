//! Tunnel client - expose local services through a relay

use anyhow::{Context, Result};
use std::process;
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use hooktun_cli::{
    builtin_credentials, resolve, usage, BootstrapError, Invocation, Outcome, ParseOutcome,
    UsageError, LONG_VERSION, VERSION,
};
use hooktun_connection::{RelayConnector, TunnelRuntime};

/// Exit code for command line misuse
const USAGE_EXIT_CODE: i32 = 2;

#[tokio::main]
async fn main() -> Result<()> {
    let invocation = match Invocation::parse_from(std::env::args_os()) {
        Ok(ParseOutcome::Ready(invocation)) => invocation,
        Ok(ParseOutcome::MissingCommand) => {
            eprint!("{}", usage());
            process::exit(USAGE_EXIT_CODE);
        }
        // clap prints its own message, help and version output included
        Err(UsageError::Flags(e)) => e.exit(),
        Err(e) => {
            eprintln!("{}", e);
            eprintln!("Run 'tunnel --help' for usage.");
            process::exit(USAGE_EXIT_CODE);
        }
    };

    init_logging(invocation.log_filter())?;
    debug!("tunnel {}", LONG_VERSION);

    let credentials = builtin_credentials();
    let outcome = match resolve(&invocation, &credentials) {
        Ok(outcome) => outcome,
        Err(e) => fail(e),
    };

    match outcome {
        Outcome::Version => println!("{}", VERSION),
        Outcome::Id(id) => println!("{}", id),
        Outcome::List(names) => {
            for name in names {
                println!("{}", name);
            }
        }
        Outcome::Launch(artifacts) => {
            if let Err(e) = RelayConnector::new().start(*artifacts).await {
                fail(BootstrapError::from(e));
            }
        }
    }

    Ok(())
}

fn fail(err: BootstrapError) -> ! {
    eprintln!("{}", err);
    process::exit(err.exit_code());
}

fn init_logging(log_level: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(log_level))
        .context("Failed to initialize logging filter")?;

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    Ok(())
}
