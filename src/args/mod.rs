//! Command-line arguments and the quick single-endpoint run they describe.
mod cli;
mod parsers;
mod quick;


pub use cli::CliArgs;
pub use parsers::parse_header;
pub use quick::{apply_overrides, quick_setup};
