use std::path::PathBuf;
use std::time::Duration;

use crate::args::parse_header;
use crate::engine::RunOptions;
use crate::error::{ConfigError, ValidationError};
use crate::http::ClientSettings;
use crate::pipeline::{Assertion, PlanStep, RequestTemplate, TestPlan};
use crate::profile::LoadProfile;

use super::parse::{parse_duration_value, parse_whole_seconds};
use super::types::{AssertionConfig, ConfigFile, DurationValue, ProfileConfig, RunConfig, RunSetup, StepConfig};

/// Validate a loaded file into something the engine can run.
///
/// # Errors
///
/// Returns an error naming the offending section or step when any value is
/// missing or invalid.
pub fn resolve_config(config: &ConfigFile) -> Result<RunSetup, ConfigError> {
    let profile = config
        .profile
        .as_ref()
        .ok_or(ConfigError::MissingProfile)
        .and_then(resolve_profile)?;
    if config.steps.is_empty() {
        return Err(ConfigError::NoSteps);
    }

    let run = &config.run;
    let mut steps = Vec::with_capacity(config.steps.len());
    for (position, step) in config.steps.iter().enumerate() {
        steps.push(resolve_step(position.saturating_add(1), step, run)?);
    }
    let plan = TestPlan {
        base_url: run.base_url.clone(),
        vars: run.vars.clone(),
        steps,
    };

    Ok(RunSetup {
        profile,
        plan,
        options: resolve_options(run)?,
        client: resolve_client(run)?,
        efficient: run.efficient.unwrap_or(false),
        export_json: run.export_json.as_ref().map(PathBuf::from),
    })
}

fn resolve_profile(profile: &ProfileConfig) -> Result<LoadProfile, ConfigError> {
    let built = match profile {
        ProfileConfig::Fixed {
            threads,
            loops,
            duration,
        } => {
            let duration_secs = duration
                .as_ref()
                .map(|value| whole_seconds("profile.duration", value))
                .transpose()?;
            LoadProfile::fixed(*threads, *loops, duration_secs)
        }
        ProfileConfig::RampUp {
            start,
            end,
            ramp,
            duration,
        } => LoadProfile::ramp_up(
            *start,
            *end,
            whole_seconds("profile.ramp", ramp)?,
            whole_seconds("profile.duration", duration)?,
        ),
        ProfileConfig::Spike {
            min,
            max,
            ramp_up,
            hold,
            ramp_down,
            duration,
        } => LoadProfile::spike(
            *min,
            *max,
            (*ramp_up, *hold, *ramp_down),
            whole_seconds("profile.duration", duration)?,
        ),
        ProfileConfig::Stairs {
            start,
            end,
            step,
            hold,
            duration,
        } => LoadProfile::stairs(
            *start,
            *end,
            *step,
            whole_seconds("profile.hold", hold)?,
            whole_seconds("profile.duration", duration)?,
        ),
    };
    built.map_err(|source| ConfigError::InvalidProfile { source })
}

fn resolve_step(index: usize, step: &StepConfig, run: &RunConfig) -> Result<PlanStep, ConfigError> {
    match (step.url.as_ref(), step.path.as_ref()) {
        (Some(_), Some(_)) => return Err(ConfigError::StepUrlAndPath { index }),
        (None, None) => return Err(ConfigError::StepMissingUrlOrPath { index }),
        (None, Some(_)) if run.base_url.is_none() => {
            return Err(ConfigError::StepMissingUrlOrPath { index });
        }
        _ => {}
    }

    let mut headers = Vec::with_capacity(step.headers.len());
    for header in &step.headers {
        headers.push(
            parse_header(header).map_err(|source| ConfigError::InvalidHeader { index, source })?,
        );
    }

    let mut assertions = Vec::with_capacity(step.assertions.len());
    for (position, assertion) in step.assertions.iter().enumerate() {
        let resolved = resolve_assertion(assertion).map_err(|source| ConfigError::InvalidAssertion {
            index,
            assertion: position.saturating_add(1),
            source,
        })?;
        assertions.push(resolved);
    }

    let name = step
        .name
        .clone()
        .or_else(|| step.path.clone())
        .or_else(|| step.url.clone())
        .unwrap_or_else(|| format!("step {}", index));

    Ok(PlanStep {
        name,
        request: RequestTemplate {
            method: step.method.unwrap_or_default(),
            url: step.url.clone(),
            path: step.path.clone(),
            headers,
            body: step.body.clone(),
        },
        pre_hook: step.pre_hook.clone(),
        post_hook: step.post_hook.clone(),
        assertions,
    })
}

fn resolve_assertion(assertion: &AssertionConfig) -> Result<Assertion, ValidationError> {
    match assertion {
        AssertionConfig::Status { op, code } => Assertion::status(op.parse()?, *code),
        AssertionConfig::BodyContains { value } => Ok(Assertion::body_contains(value.clone())),
        AssertionConfig::JsonPath { path, equals } => {
            if path.trim().is_empty() {
                return Err(ValidationError::AssertionFieldMissing {
                    kind: "json_path",
                    field: "path",
                });
            }
            Ok(Assertion::json_path(path.clone(), equals.clone()))
        }
        AssertionConfig::Pause { duration } => Ok(Assertion::pause(duration_of(duration)?)),
    }
}

fn resolve_options(run: &RunConfig) -> Result<RunOptions, ConfigError> {
    let defaults = RunOptions::default();
    Ok(RunOptions {
        request_timeout: optional_duration("run.request_timeout", run.request_timeout.as_ref())?
            .unwrap_or(defaults.request_timeout),
        drain_grace: optional_duration("run.drain_grace", run.drain_grace.as_ref())?
            .unwrap_or(defaults.drain_grace),
        report_interval: optional_duration("run.report_interval", run.report_interval.as_ref())?,
    })
}

fn resolve_client(run: &RunConfig) -> Result<ClientSettings, ConfigError> {
    let defaults = ClientSettings::default();
    Ok(ClientSettings {
        connect_timeout: optional_duration("run.connect_timeout", run.connect_timeout.as_ref())?
            .unwrap_or(defaults.connect_timeout),
        insecure: run.insecure.unwrap_or(defaults.insecure),
        ..defaults
    })
}

fn optional_duration(
    field: &'static str,
    value: Option<&DurationValue>,
) -> Result<Option<Duration>, ConfigError> {
    value
        .map(|value| duration_of(value).map_err(|source| ConfigError::InvalidDuration { field, source }))
        .transpose()
}

fn duration_of(value: &DurationValue) -> Result<Duration, ValidationError> {
    match value {
        DurationValue::Seconds(0) => Err(ValidationError::DurationZero),
        DurationValue::Seconds(secs) => Ok(Duration::from_secs(*secs)),
        DurationValue::Text(text) => parse_duration_value(text),
    }
}

fn whole_seconds(field: &'static str, value: &DurationValue) -> Result<u64, ConfigError> {
    let secs = match value {
        DurationValue::Seconds(secs) if *secs >= 1 => Ok(*secs),
        DurationValue::Seconds(_) => Err(ValidationError::ValueTooSmall { min: 1 }),
        DurationValue::Text(text) => parse_whole_seconds(text),
    };
    secs.map_err(|source| ConfigError::FieldMustBePositive { field, source })
}
