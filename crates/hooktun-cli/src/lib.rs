//! Tunnel CLI library
//!
//! Argument parsing and the bootstrap pipeline behind the `tunnel` binary.

pub mod bootstrap;
pub mod command;

pub use bootstrap::{builtin_credentials, resolve, BootstrapError, Outcome};
pub use command::{usage, Command, Invocation, ParseOutcome, UsageError};

/// Version printed by `--version`
pub const VERSION: &str = env!("GIT_TAG");

/// Long version with build metadata
pub const LONG_VERSION: &str = concat!(
    env!("GIT_TAG"),
    "\nCommit: ",
    env!("GIT_HASH"),
    "\nBuilt: ",
    env!("BUILD_TIME")
);
