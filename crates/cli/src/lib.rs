//! nodeinit CLI
//!
//! Command-line interface for registering organizations, assigning nodes,
//! and exercising the bootstrap protocol.

pub mod client;
pub mod commands;
pub mod output;
