//! Tooling & Integration Layer
//!
//! Operator CLI over the library: inspect and apply action markup, list a
//! project tree, and drive one conversation turn end to end.

pub mod cli;

pub use cli::{Cli, CliContext, Commands};
