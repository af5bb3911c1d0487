//! Test-plan files: loading, parsing and validation into a [`RunSetup`].
mod apply;
mod loader;
mod parse;
pub mod types;


pub use apply::resolve_config;
pub use loader::{DEFAULT_CONFIG_FILES, has_default_config, load_config, load_config_file};
pub use parse::{parse_duration_value, parse_whole_seconds};
pub use types::{ConfigFile, RunSetup};
