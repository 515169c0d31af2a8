//! Validated allocation settings.

use thiserror::Error;

use crate::fill_day::FillDayConfig;
use crate::precision::Precision;
use crate::report::IgnorePattern;

/// Configuration errors, surfaced before any computation starts.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    /// Precision was zero, negative, or out of range.
    #[error("precision must be a positive number of minutes, got {value}")]
    InvalidPrecision { value: i64 },

    /// The ignore pattern is not a valid regular expression.
    #[error("invalid ignore pattern `{pattern}`: {source}")]
    InvalidIgnorePattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// A fill-day setting was not a positive, finite number of minutes.
    #[error("fill-day {field} must be a positive number of minutes, got {value}")]
    InvalidFillDay { field: &'static str, value: f64 },

    /// The requested year/month does not exist.
    #[error("invalid month {year}-{month:02}")]
    InvalidMonth { year: i32, month: u32 },
}

/// Settings for one report run. Immutable once built.
#[derive(Debug, Clone)]
pub struct AllocationConfig {
    precision: Precision,
    spread_unallocated: bool,
    ignore_pattern: IgnorePattern,
    fill_day: Option<FillDayConfig>,
}

impl AllocationConfig {
    /// Validates the raw settings.
    pub fn new(
        precision_minutes: i64,
        spread_unallocated: bool,
        ignore_pattern: &str,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            precision: Precision::new(precision_minutes)?,
            spread_unallocated,
            ignore_pattern: IgnorePattern::new(ignore_pattern)?,
            fill_day: None,
        })
    }

    /// Enables fill-day mode, which replaces precision rounding.
    pub fn with_fill_day(mut self, fill_day: FillDayConfig) -> Result<Self, ConfigError> {
        fill_day.validate()?;
        self.fill_day = Some(fill_day);
        Ok(self)
    }

    pub const fn precision(&self) -> Precision {
        self.precision
    }

    pub const fn spread_unallocated(&self) -> bool {
        self.spread_unallocated
    }

    pub const fn ignore_pattern(&self) -> &IgnorePattern {
        &self.ignore_pattern
    }

    pub const fn fill_day(&self) -> Option<&FillDayConfig> {
        self.fill_day.as_ref()
    }
}
