//! CLI commands

mod completions;
mod init;
mod team;

pub use completions::CompletionsCommand;
pub use init::InitCommand;
pub use team::TeamCommand;
