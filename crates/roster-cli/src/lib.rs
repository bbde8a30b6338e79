//! Library side of the `roster` command: argument types, command runners and
//! logging setup.

pub mod cli;
pub mod commands;
pub mod import;
pub mod logging;
pub mod types;
