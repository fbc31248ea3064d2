//! CLI command implementations

pub mod common;

pub mod bank;
pub mod campaign;
pub mod completions;
pub mod config;
pub mod init;
pub mod language;
pub mod status;
pub mod translation;
pub mod withdrawal;
