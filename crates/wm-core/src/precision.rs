//! Billing precision.

use std::num::NonZeroU32;

use serde::Serialize;

use crate::config::ConfigError;

const MINUTES_PER_HOUR: f64 = 60.0;
const HOUR: NonZeroU32 = NonZeroU32::new(60).unwrap();

/// Rounding increment, in minutes, applied before converting to hours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Precision(NonZeroU32);

impl Precision {
    /// Validates a configured precision.
    pub fn new(minutes: i64) -> Result<Self, ConfigError> {
        u32::try_from(minutes)
            .ok()
            .and_then(NonZeroU32::new)
            .map(Self)
            .ok_or(ConfigError::InvalidPrecision { value: minutes })
    }

    pub const fn minutes(self) -> u32 {
        self.0.get()
    }

    /// Rounds minutes up to the next multiple of the precision.
    pub fn round_up(self, minutes: f64) -> f64 {
        let step = f64::from(self.minutes());
        (minutes / step).ceil() * step
    }

    /// Rounds minutes up to the precision and converts them to hours.
    pub fn to_hours(self, minutes: f64) -> f64 {
        self.round_up(minutes) / MINUTES_PER_HOUR
    }
}

impl Default for Precision {
    fn default() -> Self {
        Self(HOUR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_whole_hours() {
        assert_eq!(Precision::default().minutes(), 60);
    }

    #[test]
    fn rejects_non_positive_precision() {
        assert_eq!(
            Precision::new(0),
            Err(ConfigError::InvalidPrecision { value: 0 })
        );
        assert_eq!(
            Precision::new(-15),
            Err(ConfigError::InvalidPrecision { value: -15 })
        );
    }

    #[test]
    fn rounds_up_to_whole_hours() {
        let p = Precision::new(60).unwrap();
        assert!((p.to_hours(1.0) - 1.0).abs() < f64::EPSILON);
        assert!((p.to_hours(60.0) - 1.0).abs() < f64::EPSILON);
        assert!((p.to_hours(61.0) - 2.0).abs() < f64::EPSILON);
        assert!(p.to_hours(0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn rounds_up_to_quarter_hours() {
        let p = Precision::new(15).unwrap();
        assert!((p.to_hours(20.0) - 0.5).abs() < f64::EPSILON);
        assert!((p.to_hours(45.0) - 0.75).abs() < f64::EPSILON);
        assert!((p.to_hours(46.0) - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn rounding_is_monotonic() {
        for step in [1, 5, 15, 30, 60] {
            let p = Precision::new(step).unwrap();
            let mut previous = 0.0;
            for tenth in 0..2000 {
                let hours = p.to_hours(f64::from(tenth) / 10.0);
                assert!(hours >= previous, "precision {step} decreased at {tenth}");
                previous = hours;
            }
        }
    }

    #[test]
    fn rounding_is_stable_when_reapplied() {
        for step in [1, 15, 30, 60] {
            let p = Precision::new(step).unwrap();
            for minutes in [0.0, 1.0, 14.5, 59.9, 60.0, 61.0, 479.2] {
                let once = p.round_up(minutes);
                assert!((p.round_up(once) - once).abs() < 1e-9);
                assert!((p.to_hours(once) - p.to_hours(minutes)).abs() < 1e-9);
            }
        }
    }
}
