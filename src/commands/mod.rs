//! CLI command implementations

pub mod check;
pub mod clean;
pub mod fmt;
pub mod init;
pub mod list;
pub mod new;
pub mod render;
pub mod show;
