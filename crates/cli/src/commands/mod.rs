//! CLI Commands

pub mod bootstrap;
pub mod node;
pub mod org;
