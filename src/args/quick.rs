use url::Url;

use super::cli::CliArgs;
use crate::config::RunSetup;
use crate::engine::RunOptions;
use crate::error::{AppError, AppResult, ConfigError, HttpError};
use crate::http::ClientSettings;
use crate::pipeline::{Assertion, Comparator, PlanStep, RequestTemplate, TestPlan};
use crate::profile::LoadProfile;

/// Quick runs without `--duration` or `--loops` last this long.
const DEFAULT_QUICK_DURATION_SECS: u64 = 10;

/// Build a single-endpoint fixed run from `--url` and friends.
///
/// # Errors
///
/// Returns an error when no URL was given, when it does not parse, or when
/// the profile values are invalid.
pub fn quick_setup(args: &CliArgs) -> AppResult<RunSetup> {
    let url = args
        .url
        .as_ref()
        .ok_or_else(|| AppError::config(ConfigError::NothingToRun))?;
    let parsed = Url::parse(url).map_err(|source| {
        AppError::http(HttpError::InvalidUrl {
            url: url.clone(),
            source,
        })
    })?;

    let duration_secs = match (args.duration, args.loops) {
        (None, None) => Some(DEFAULT_QUICK_DURATION_SECS),
        (duration, _) => duration,
    };
    let profile = LoadProfile::fixed(args.threads, args.loops, duration_secs)?;

    let mut step = PlanStep::new(
        endpoint_name(&parsed),
        RequestTemplate {
            method: args.method,
            url: Some(url.clone()),
            path: None,
            headers: args.headers.clone(),
            body: args.data.clone(),
        },
    );
    if let Some(code) = args.expected_status {
        step = step.with_assertion(Assertion::status(Comparator::Equal, u64::from(code))?);
    }

    let mut setup = RunSetup {
        profile,
        plan: TestPlan::single(step),
        options: RunOptions::default(),
        client: ClientSettings::default(),
        efficient: false,
        export_json: None,
    };
    apply_overrides(args, &mut setup);
    Ok(setup)
}

/// Flags that apply on top of a plan file as well as a quick run.
pub fn apply_overrides(args: &CliArgs, setup: &mut RunSetup) {
    if let Some(timeout) = args.timeout {
        setup.options.request_timeout = timeout;
    }
    if args.efficient {
        setup.efficient = true;
    }
    if args.insecure {
        setup.client.insecure = true;
    }
    if let Some(path) = args.export_json.as_ref() {
        setup.export_json = Some(path.clone());
    }
}

fn endpoint_name(url: &Url) -> String {
    match url.host_str() {
        Some(host) => format!("{}{}", host, url.path()),
        None => url.to_string(),
    }
}
