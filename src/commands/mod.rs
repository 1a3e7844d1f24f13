//! CLI subcommand implementations

mod init;
mod start;

pub use init::init_config;
pub use start::start_daemon;
