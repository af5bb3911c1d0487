use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Deserialize;

use crate::engine::RunOptions;
use crate::http::ClientSettings;
use crate::pipeline::{HttpMethod, TestPlan};
use crate::profile::LoadProfile;

/// A test-plan file as written on disk.
#[derive(Debug, Default, Deserialize)]
pub struct ConfigFile {
    pub profile: Option<ProfileConfig>,
    #[serde(default)]
    pub run: RunConfig,
    #[serde(default)]
    pub steps: Vec<StepConfig>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ProfileConfig {
    Fixed {
        threads: usize,
        loops: Option<u64>,
        duration: Option<DurationValue>,
    },
    RampUp {
        start: usize,
        end: usize,
        ramp: DurationValue,
        duration: DurationValue,
    },
    Spike {
        #[serde(default)]
        min: usize,
        max: usize,
        ramp_up: u64,
        hold: u64,
        ramp_down: u64,
        duration: DurationValue,
    },
    Stairs {
        #[serde(default)]
        start: usize,
        end: usize,
        step: usize,
        hold: DurationValue,
        duration: DurationValue,
    },
}

#[derive(Debug, Default, Deserialize)]
pub struct RunConfig {
    pub base_url: Option<String>,
    pub request_timeout: Option<DurationValue>,
    pub connect_timeout: Option<DurationValue>,
    pub drain_grace: Option<DurationValue>,
    pub report_interval: Option<DurationValue>,
    pub efficient: Option<bool>,
    pub insecure: Option<bool>,
    pub export_json: Option<String>,
    #[serde(default)]
    pub vars: BTreeMap<String, String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct StepConfig {
    pub name: Option<String>,
    pub method: Option<HttpMethod>,
    pub url: Option<String>,
    pub path: Option<String>,
    #[serde(default)]
    pub headers: Vec<String>,
    pub body: Option<String>,
    pub pre_hook: Option<String>,
    pub post_hook: Option<String>,
    #[serde(default)]
    pub assertions: Vec<AssertionConfig>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AssertionConfig {
    Status {
        #[serde(default = "default_comparator")]
        op: String,
        code: u64,
    },
    BodyContains {
        value: String,
    },
    JsonPath {
        path: String,
        equals: String,
    },
    Pause {
        duration: DurationValue,
    },
}

fn default_comparator() -> String {
    "=".to_owned()
}

/// `30` (seconds) or `"250ms"`-style text.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum DurationValue {
    Seconds(u64),
    Text(String),
}

/// Everything needed to launch one run, however it was described.
#[derive(Debug, Clone)]
pub struct RunSetup {
    pub profile: LoadProfile,
    pub plan: TestPlan,
    pub options: RunOptions,
    pub client: ClientSettings,
    pub efficient: bool,
    pub export_json: Option<PathBuf>,
}
