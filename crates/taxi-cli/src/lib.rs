//! # taxi-cli
//!
//! Management commands for the taxi fleet.
//!
//! Each command implements [`ManagementCommand`] and is registered in a
//! [`CommandRegistry`], which builds the `clap` interface and dispatches to
//! the chosen command. Commands that create or change records go through the
//! same forms a web front end would use, so every validation rule applies.
//!
//! ```rust
//! use taxi_cli::command::CommandRegistry;
//! use taxi_cli::commands::register_builtin_commands;
//!
//! let mut registry = CommandRegistry::new();
//! register_builtin_commands(&mut registry);
//!
//! let names = registry.list_commands();
//! assert!(names.contains(&"createdriver"));
//! assert!(names.contains(&"updatelicense"));
//! ```

// - result_large_err: TaxiError is the crate-wide error type
// - unused_async: command handlers keep one async signature
#![allow(clippy::result_large_err)]
#![allow(clippy::unused_async)]

pub mod command;
pub mod commands;

pub use command::{CommandRegistry, ManagementCommand};
