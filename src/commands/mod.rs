//! CLI subcommands

pub mod import;
pub mod init;
pub mod list;
pub mod render;
