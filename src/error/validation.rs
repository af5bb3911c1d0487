use thiserror::Error;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Invalid header format: '{value}'. Expected 'Key: Value'")]
    InvalidHeaderFormat { value: String },
    #[error("Duration must not be empty.")]
    DurationEmpty,
    #[error("Invalid duration '{value}'.")]
    InvalidDurationFormat { value: String },
    #[error("Invalid duration '{value}': {source}")]
    InvalidDurationNumber {
        value: String,
        #[source]
        source: std::num::ParseIntError,
    },
    #[error("Duration overflow.")]
    DurationOverflow,
    #[error("Invalid duration unit '{unit}'.")]
    InvalidDurationUnit { unit: String },
    #[error("Duration must be > 0.")]
    DurationZero,
    #[error("Value must be >= {min}.")]
    ValueTooSmall { min: u64 },
    #[error("Invalid number: {source}")]
    InvalidNumber {
        #[source]
        source: std::num::ParseIntError,
    },
    #[error("Profile '{field}' must be >= 1 thread.")]
    ThreadsTooSmall { field: &'static str },
    #[error("Profile '{field}' must be >= 1 loop.")]
    LoopsTooSmall { field: &'static str },
    #[error("Profile '{field}' must be >= 1 second.")]
    SecondsTooSmall { field: &'static str },
    #[error("Spike phase weights must not all be zero.")]
    SpikeWeightsZero,
    #[error("Spike max ({max}) must be >= min ({min}).")]
    SpikeMaxBelowMin { min: usize, max: usize },
    #[error("Fixed profile needs a duration, a loop count, or both.")]
    FixedUnbounded,
    #[error("Invalid comparator '{value}'. Use '=', '>' or '<'.")]
    InvalidComparator { value: String },
    #[error("Invalid status code {value}.")]
    InvalidStatusCode { value: u64 },
    #[error("Assertion '{kind}' is missing '{field}'.")]
    AssertionFieldMissing {
        kind: &'static str,
        field: &'static str,
    },
}
