//! Fill-day normalization.
//!
//! Rescales one day's branch minutes so they add up to a fixed target
//! (8 hours by default) instead of reporting raw rounded time.
//!
//! # Algorithm Summary
//!
//! 1. Branches under the minimum (1 hour) are raised to exactly the minimum.
//! 2. The rest of the target is split over the remaining branches in
//!    proportion to their original minutes.
//! 3. Every branch except the largest is rounded to the nearest increment
//!    (half an hour). The largest absorbs the residual so the day hits the
//!    target exactly. If its own rounded value is within half an increment of
//!    the residual it is snapped too, and the small leftover moves to the
//!    next-largest branch.
//!
//! The leftover in step 3 is always smaller than one increment, so pushing it
//! further down the list can never produce another clean value. It stops at
//! the next-largest branch.

use serde::Serialize;

use crate::config::ConfigError;
use crate::types::{BranchRecord, DayBucket};

/// Leftover below this many minutes is treated as zero.
const SNAP_EPSILON: f64 = 0.001;

/// Fill-day parameters, in minutes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FillDayConfig {
    /// Total every filled day sums to.
    pub target_minutes: f64,

    /// Floor applied to small branches before proportional scaling.
    pub minimum_minutes: f64,

    /// Rounding increment for all but the largest branch.
    pub increment_minutes: f64,
}

impl Default for FillDayConfig {
    fn default() -> Self {
        Self {
            target_minutes: 480.0,
            minimum_minutes: 60.0,
            increment_minutes: 30.0,
        }
    }
}

impl FillDayConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("target", self.target_minutes),
            ("minimum", self.minimum_minutes),
            ("increment", self.increment_minutes),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::InvalidFillDay { field, value });
            }
        }
        Ok(())
    }

    fn round(&self, minutes: f64) -> f64 {
        (minutes / self.increment_minutes).round() * self.increment_minutes
    }
}

/// Rescales a day so its branches sum to `config.target_minutes`.
///
/// An empty day is returned unchanged.
#[allow(clippy::cast_precision_loss)]
pub fn fill_day(day: DayBucket, config: &FillDayConfig) -> DayBucket {
    if day.is_empty() {
        return day;
    }

    let minimum = config.minimum_minutes;
    let small_count = day.branches.iter().filter(|b| b.minutes < minimum).count();
    let large_total: f64 = day
        .branches
        .iter()
        .filter(|b| b.minutes >= minimum)
        .map(|b| b.minutes)
        .sum();
    let budget = (minimum.mul_add(-(small_count as f64), config.target_minutes)).max(0.0);

    let distributed: Vec<f64> = day
        .branches
        .iter()
        .map(|b| {
            if b.minutes < minimum {
                minimum
            } else if large_total > 0.0 {
                b.minutes / large_total * budget
            } else {
                b.minutes
            }
        })
        .collect();

    let filled = round_with_residual(&distributed, config)
        .unwrap_or_else(|| scale_onto_target(&distributed, config.target_minutes));

    tracing::debug!(date = %day.date, branches = filled.len(), "filled day");

    let branches = day
        .branches
        .into_iter()
        .zip(filled)
        .map(|(b, minutes)| BranchRecord { minutes, ..b })
        .collect();
    DayBucket::new(day.date, branches)
}

/// Rounds every value but the largest, which absorbs the residual.
///
/// Returns `None` when the rounded values leave the largest branch less than
/// the minimum, which includes overshooting the target outright.
fn round_with_residual(distributed: &[f64], config: &FillDayConfig) -> Option<Vec<f64>> {
    let largest = index_of_largest(distributed, None)?;

    let mut filled: Vec<f64> = distributed
        .iter()
        .enumerate()
        .map(|(i, &m)| if i == largest { m } else { config.round(m) })
        .collect();
    let rounded_total: f64 = filled
        .iter()
        .enumerate()
        .filter(|&(i, _)| i != largest)
        .map(|(_, m)| m)
        .sum();

    let residual = config.target_minutes - rounded_total;
    if residual < config.minimum_minutes.min(distributed[largest]) {
        return None;
    }
    filled[largest] = residual;

    let snapped = config.round(residual);
    if (snapped - residual).abs() > config.increment_minutes / 2.0 {
        return Some(filled);
    }

    let leftover = residual - snapped;
    if leftover.abs() <= SNAP_EPSILON {
        filled[largest] = snapped;
    } else if let Some(next) = index_of_largest(&filled, Some(largest))
        .filter(|&next| filled[next] > 0.0 && filled[next] + leftover >= 0.0)
    {
        filled[largest] = snapped;
        filled[next] += leftover;
    }

    Some(filled)
}

/// Proportional fallback used when rounding would squeeze the largest branch
/// below the minimum.
#[allow(clippy::cast_precision_loss)]
fn scale_onto_target(distributed: &[f64], target: f64) -> Vec<f64> {
    let total: f64 = distributed.iter().sum();
    if total > 0.0 {
        distributed.iter().map(|m| m / total * target).collect()
    } else {
        let share = target / distributed.len() as f64;
        vec![share; distributed.len()]
    }
}

/// First index holding the maximum value, optionally skipping one index.
fn index_of_largest(values: &[f64], skip: Option<usize>) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, &value) in values.iter().enumerate() {
        if Some(i) == skip {
            continue;
        }
        if best.is_none_or(|(_, best_value)| value > best_value) {
            best = Some((i, value));
        }
    }
    best.map(|(i, _)| i)
}
