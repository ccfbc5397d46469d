//! Referee for Hostage Chess.
//!
//! Hosts many games in an in-memory [`SessionManager`], loads a TOML
//! [`RefereeConfig`] and exposes the engine through a small command line.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod cli;
pub mod commands;
pub mod config;
pub mod session;

pub use cli::{Cli, Command};
pub use commands::{CommandError, PlayOutput, run};
pub use config::{ConfigError, RefereeConfig};
pub use session::{SessionError, SessionId, SessionManager, Snapshot};
