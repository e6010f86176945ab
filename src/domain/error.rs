use thiserror::Error;

/// Errors raised while turning upstream configuration into typed values.
///
/// Physical plausibility (negative capacity, negative power) is the job of
/// settings validation; this type covers what the core itself cannot
/// compute around.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("Invalid time of day '{0}' (expected HH:MM)")]
    InvalidTimeOfDay(String),
    #[error("Spot pricing selected but no spot price feed is available")]
    MissingSpotFeed,
    #[error("Invalid settings: {0}")]
    Validation(#[from] validator::ValidationErrors),
}

/// Errors raised when assembling an [`EnergySeries`](super::EnergySeries).
#[derive(Debug, Error, PartialEq)]
pub enum SeriesError {
    #[error("Point {index} is earlier than its predecessor")]
    OutOfOrder { index: usize },
    #[error("Point {index} belongs to sensor {found}, expected {expected}")]
    ForeignSensor {
        index: usize,
        expected: i64,
        found: i64,
    },
}
