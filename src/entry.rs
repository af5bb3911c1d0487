use std::ffi::OsString;

use clap::{CommandFactory, Parser};

use crate::app::run_local;
use crate::args::{CliArgs, apply_overrides, quick_setup};
use crate::config::{RunSetup, has_default_config, load_config, resolve_config};
use crate::error::{AppError, AppResult, ConfigError};
use crate::system::logger::init_logging;

/// Binary entry point: parse arguments, then drive one run on a fresh
/// multi-threaded runtime.
///
/// # Errors
///
/// Returns an error when arguments or the plan file are invalid, or when
/// the run itself cannot complete.
pub fn run() -> AppResult<()> {
    let raw_args: Vec<OsString> = std::env::args_os().collect();
    if should_show_help(&raw_args) {
        CliArgs::command().print_help()?;
        println!();
        return Ok(());
    }
    let args = CliArgs::parse_from(raw_args);

    init_logging(args.verbose, args.no_color);
    let setup = build_setup(&args)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(run_local(setup))?;
    Ok(())
}

fn build_setup(args: &CliArgs) -> AppResult<RunSetup> {
    if args.url.is_some() {
        return quick_setup(args);
    }
    let config = load_config(args.config.as_deref())?
        .ok_or_else(|| AppError::config(ConfigError::NothingToRun))?;
    let mut setup = resolve_config(&config)?;
    apply_overrides(args, &mut setup);
    Ok(setup)
}

fn should_show_help(raw_args: &[OsString]) -> bool {
    let treat_as_empty =
        matches!(raw_args, [] | [_]) || matches!(raw_args, [_, second] if second == "--");
    if !treat_as_empty {
        return false;
    }

    !has_default_config()
}
