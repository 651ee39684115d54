//! CLI command implementations.

pub mod command;
pub mod common;
pub mod status;
pub mod update;
