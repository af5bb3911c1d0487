use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::pipeline::HttpMethod;

use super::parsers::{parse_duration_arg, parse_header, parse_positive_usize, parse_seconds_arg};

#[derive(Debug, Parser, Clone)]
#[clap(
    version,
    about = "Load-test HTTP APIs with fixed, ramp-up, spike and stairs concurrency profiles."
)]
pub struct CliArgs {
    /// Test plan file (.toml or .json); defaults to ./volley.toml or ./volley.json
    #[arg(long, short = 'c', conflicts_with = "url")]
    pub config: Option<PathBuf>,

    /// Quick run: target URL for a single-endpoint fixed profile
    #[arg(long, short = 'u')]
    pub url: Option<String>,

    /// HTTP method for the quick run
    #[arg(long, short = 'X', value_enum, ignore_case = true, default_value_t = HttpMethod::Get)]
    pub method: HttpMethod,

    /// Request header ('Key: Value'); repeatable
    #[arg(long = "header", short = 'H', value_parser = parse_header)]
    pub headers: Vec<(String, String)>,

    /// Request body for the quick run
    #[arg(long, short = 'd')]
    pub data: Option<String>,

    /// Concurrent workers for the quick run
    #[arg(long, default_value_t = 1, value_parser = parse_positive_usize)]
    pub threads: usize,

    /// Quick-run duration in whole seconds (supports s/m/h)
    #[arg(long, short = 't', value_parser = parse_seconds_arg)]
    pub duration: Option<u64>,

    /// Passes per worker for the quick run
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub loops: Option<u64>,

    /// Fail iterations whose status differs from this code
    #[arg(long = "expected-status")]
    pub expected_status: Option<u16>,

    /// Per-request timeout (supports ms/s/m/h)
    #[arg(long, value_parser = parse_duration_arg)]
    pub timeout: Option<Duration>,

    /// Keep only failed iterations in the result tree
    #[arg(long)]
    pub efficient: bool,

    /// Accept invalid TLS certificates
    #[arg(long)]
    pub insecure: bool,

    /// Write the report, trend and failures as JSON to this path
    #[arg(long = "export-json")]
    pub export_json: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, short = 'v')]
    pub verbose: bool,

    /// Disable colored log output
    #[arg(long = "no-color")]
    pub no_color: bool,
}
