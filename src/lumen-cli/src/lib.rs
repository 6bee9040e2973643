//! LumenFlow CLI library module.
//!
//! A host application for `lumen-live-update`: it picks a delivery channel
//! and a capability probe from the command line and drives the live update
//! control surface from stdin, a timer, or JSON method calls.
//!
//! # Module Organization
//!
//! - `cli/` - CLI argument parsing and command dispatch
//! - `host` - Config, channel and capability wiring
//! - `terminal` - Status-line delivery channel for stderr
//! - Command modules - Individual CLI commands (`*_cmd.rs`)

pub mod cli;
pub mod host;
pub mod terminal;

pub mod rpc_cmd;
pub mod simulate_cmd;
pub mod stream_cmd;

pub use host::Host;
pub use terminal::TerminalChannel;
