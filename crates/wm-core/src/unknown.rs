//! Unknown-time allocation.
//!
//! The tracker reports time it cannot attribute as a separate branch. This
//! stage removes that record from the day and, when spreading is enabled,
//! adds an equal whole-minute share of it to every other branch.

use serde::Serialize;

use crate::types::{BranchRecord, DayBucket};

/// What happened to a day's unknown time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum UnknownOutcome {
    /// The day had no unknown time.
    None,
    /// Unknown time was split evenly over the other branches.
    Spread {
        branches: usize,
        share_minutes: f64,
    },
    /// Spreading is disabled, the time is only reported separately.
    Unallocated,
    /// Spreading was requested but the day had no other branch to receive it.
    Stranded,
}

/// Result of removing a day's unknown time.
#[derive(Debug, Clone, PartialEq)]
pub struct UnknownAllocation {
    /// The day without its unallocated record.
    pub day: DayBucket,

    /// Raw unknown minutes, before any spreading.
    pub unknown_minutes: f64,

    pub outcome: UnknownOutcome,
}

/// Removes the unallocated record from a day and optionally spreads it.
///
/// Each remaining branch receives `ceil(unknown / other_branches)` minutes.
/// A day holding nothing but unknown time is never divided; its outcome is
/// [`UnknownOutcome::Stranded`] and the minutes stay in `unknown_minutes`.
#[allow(clippy::cast_precision_loss)]
pub fn allocate_unknown(day: DayBucket, spread: bool) -> UnknownAllocation {
    let DayBucket { date, branches } = day;
    let (unknown, known): (Vec<BranchRecord>, Vec<BranchRecord>) =
        branches.into_iter().partition(|b| b.unallocated);
    let unknown_minutes: f64 = unknown.iter().map(|b| b.minutes).sum();

    let (branches, outcome) = if unknown.is_empty() {
        (known, UnknownOutcome::None)
    } else if !spread {
        (known, UnknownOutcome::Unallocated)
    } else if known.is_empty() {
        tracing::warn!(
            %date,
            unknown_minutes,
            "no branches to spread unknown time over, leaving it unallocated"
        );
        (known, UnknownOutcome::Stranded)
    } else {
        let count = known.len();
        let share_minutes = (unknown_minutes / count as f64).ceil();
        tracing::debug!(%date, share_minutes, branches = count, "spread unknown time");
        let spread = known
            .into_iter()
            .map(|b| BranchRecord {
                minutes: b.minutes + share_minutes,
                ..b
            })
            .collect();
        (
            spread,
            UnknownOutcome::Spread {
                branches: count,
                share_minutes,
            },
        )
    };

    UnknownAllocation {
        day: DayBucket::new(date, branches),
        unknown_minutes,
        outcome,
    }
}
