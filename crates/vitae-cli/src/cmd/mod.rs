//! Subcommand implementations

pub mod fetch;
