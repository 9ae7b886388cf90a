//! CLI command implementations.
//!
//! Each command implements the [`Command`] trait, which provides a uniform
//! interface for executing commands and reporting results.
//!
//! # Architecture
//!
//! Commands are dispatched via [`CommandDispatcher`], which routes CLI
//! subcommands to their implementations. Commands that need the project's
//! requirements or hardware profile load them through [`ProjectContext`].

pub mod check;
pub mod completions;
pub mod config;
pub mod dispatcher;
pub mod dockerfile;
pub mod image;
pub mod project;
pub mod requirements;

pub use dispatcher::{Command, CommandDispatcher, CommandResult};
pub use project::ProjectContext;
