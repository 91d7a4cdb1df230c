pub mod cli;
pub mod config;

pub use cli::{Cli, InputKind};
pub use config::{load_config, Mp2grgConfig, Settings};
