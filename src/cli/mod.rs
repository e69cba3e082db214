//! Command-line interface module.

mod args;
pub mod common;
pub mod content;
pub mod drafts;
pub mod init;
pub mod shutdown;
pub mod watch;

pub use args::{Cli, Commands, Target};
