use std::time::Duration;

use crate::error::ValidationError;

/// Parse `250ms`, `10s`, `5m`, `1h` or a bare number of seconds.
///
/// # Errors
///
/// Returns an error when the value is empty, malformed, zero or overflows.
pub fn parse_duration_value(value: &str) -> Result<Duration, ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ValidationError::DurationEmpty);
    }

    let digits_len = value.chars().take_while(char::is_ascii_digit).count();
    if digits_len == 0 {
        return Err(ValidationError::InvalidDurationFormat {
            value: value.to_owned(),
        });
    }
    let (num_part, unit_part) = value.split_at(digits_len);
    let number: u64 = num_part
        .parse()
        .map_err(|source| ValidationError::InvalidDurationNumber {
            value: value.to_owned(),
            source,
        })?;

    let unit = if unit_part.is_empty() { "s" } else { unit_part.trim() };
    let duration = match unit {
        "ms" => Duration::from_millis(number),
        "s" => Duration::from_secs(number),
        "m" => Duration::from_secs(
            number
                .checked_mul(60)
                .ok_or(ValidationError::DurationOverflow)?,
        ),
        "h" => Duration::from_secs(
            number
                .checked_mul(3_600)
                .ok_or(ValidationError::DurationOverflow)?,
        ),
        other => {
            return Err(ValidationError::InvalidDurationUnit {
                unit: other.to_owned(),
            });
        }
    };

    if duration.is_zero() {
        return Err(ValidationError::DurationZero);
    }
    Ok(duration)
}

/// Like [`parse_duration_value`], but the result must be whole seconds of
/// at least one.
///
/// # Errors
///
/// Returns an error when the value does not parse or is below one second.
pub fn parse_whole_seconds(value: &str) -> Result<u64, ValidationError> {
    let secs = parse_duration_value(value)?.as_secs();
    if secs == 0 {
        return Err(ValidationError::ValueTooSmall { min: 1 });
    }
    Ok(secs)
}
