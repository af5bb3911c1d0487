use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use super::collaborators::PathExtractor;
use super::template::render_template;
use super::types::{AssertionOutcome, Response};
use crate::error::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparator {
    Equal,
    Greater,
    Less,
}

impl Comparator {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Comparator::Equal => "=",
            Comparator::Greater => ">",
            Comparator::Less => "<",
        }
    }

    #[must_use]
    pub fn holds(self, actual: u16, expected: u16) -> bool {
        match self {
            Comparator::Equal => actual == expected,
            Comparator::Greater => actual > expected,
            Comparator::Less => actual < expected,
        }
    }
}

impl FromStr for Comparator {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "=" | "==" | "eq" => Ok(Comparator::Equal),
            ">" | "gt" => Ok(Comparator::Greater),
            "<" | "lt" => Ok(Comparator::Less),
            other => Err(ValidationError::InvalidComparator {
                value: other.to_owned(),
            }),
        }
    }
}

impl fmt::Display for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A check (or pacing pause) evaluated against a response, in declaration
/// order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Assertion {
    Status {
        comparator: Comparator,
        expected: u16,
    },
    BodyContains {
        fragment: String,
    },
    JsonPath {
        path: String,
        expected: String,
    },
    /// Blocks the worker; produces no outcome.
    Pause {
        duration: Duration,
    },
}

impl Assertion {
    /// Validates the status code range.
    ///
    /// # Errors
    ///
    /// Returns an error when `expected` is not a valid HTTP status code.
    pub fn status(comparator: Comparator, expected: u64) -> Result<Self, ValidationError> {
        let code = u16::try_from(expected)
            .ok()
            .filter(|code| (100..=999).contains(code))
            .ok_or(ValidationError::InvalidStatusCode { value: expected })?;
        Ok(Assertion::Status {
            comparator,
            expected: code,
        })
    }

    #[must_use]
    pub fn body_contains(fragment: impl Into<String>) -> Self {
        Assertion::BodyContains {
            fragment: fragment.into(),
        }
    }

    #[must_use]
    pub fn json_path(path: impl Into<String>, expected: impl Into<String>) -> Self {
        Assertion::JsonPath {
            path: path.into(),
            expected: expected.into(),
        }
    }

    #[must_use]
    pub const fn pause(duration: Duration) -> Self {
        Assertion::Pause { duration }
    }

    #[must_use]
    pub fn name(&self) -> String {
        match self {
            Assertion::Status {
                comparator,
                expected,
            } => format!("status {} {}", comparator, expected),
            Assertion::BodyContains { fragment } => format!("body contains '{}'", fragment),
            Assertion::JsonPath { path, expected } => format!("{} == '{}'", path, expected),
            Assertion::Pause { duration } => format!("pause {}ms", duration.as_millis()),
        }
    }

    /// Evaluate a check. Pauses are handled by the pipeline and yield `None`.
    pub(crate) fn evaluate(
        &self,
        response: &Response,
        extractor: &dyn PathExtractor,
        vars: &BTreeMap<String, String>,
    ) -> Option<AssertionOutcome> {
        let name = self.name();
        let outcome = match self {
            Assertion::Status {
                comparator,
                expected,
            } => {
                if comparator.holds(response.status, *expected) {
                    AssertionOutcome::pass(name)
                } else {
                    AssertionOutcome::fail(
                        name,
                        format!(
                            "expected status {} {}, got {}",
                            comparator, expected, response.status
                        ),
                    )
                }
            }
            Assertion::BodyContains { fragment } => {
                let fragment = render_template(fragment, vars);
                if response.body.contains(&fragment) {
                    AssertionOutcome::pass(name)
                } else {
                    AssertionOutcome::fail(
                        name,
                        format!("response body does not contain '{}'", fragment),
                    )
                }
            }
            Assertion::JsonPath { path, expected } => {
                let expected = render_template(expected, vars);
                match extractor.extract(&response.body, path) {
                    Some(actual) if actual == expected => AssertionOutcome::pass(name),
                    Some(actual) => AssertionOutcome::fail(
                        name,
                        format!("{}: expected '{}', got '{}'", path, expected, actual),
                    ),
                    None => AssertionOutcome::fail(
                        name,
                        format!("{}: no value in response body", path),
                    ),
                }
            }
            Assertion::Pause { .. } => return None,
        };
        Some(outcome)
    }
}
