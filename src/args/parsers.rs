use std::time::Duration;

use crate::config::{parse_duration_value, parse_whole_seconds};
use crate::error::ValidationError;

/// Split `Key: Value`; both sides are trimmed.
///
/// # Errors
///
/// Returns an error when the value has no colon or an empty key.
pub fn parse_header(s: &str) -> Result<(String, String), ValidationError> {
    match s.split_once(':') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_owned(), value.trim().to_owned()))
        }
        _ => Err(ValidationError::InvalidHeaderFormat {
            value: s.to_owned(),
        }),
    }
}

pub(super) fn parse_positive_usize(s: &str) -> Result<usize, ValidationError> {
    let value: usize = s
        .trim()
        .parse()
        .map_err(|source| ValidationError::InvalidNumber { source })?;
    if value == 0 {
        return Err(ValidationError::ValueTooSmall { min: 1 });
    }
    Ok(value)
}

pub(super) fn parse_duration_arg(s: &str) -> Result<Duration, ValidationError> {
    parse_duration_value(s)
}

pub(super) fn parse_seconds_arg(s: &str) -> Result<u64, ValidationError> {
    parse_whole_seconds(s)
}
