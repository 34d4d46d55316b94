//! parley messenger node library.
//!
//! This library provides the components for running a parley node: argument
//! parsing, configuration, the interactive shell and the inbox printer. It
//! is used by the `parley-node` binary and can also be used for testing.

pub mod cli;
pub mod config;
pub mod inbox;
pub mod node;
pub mod shell;
pub mod shutdown;
