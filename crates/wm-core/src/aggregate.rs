//! Branch aggregation.
//!
//! Folds the raw result sets of one day into a [`DayBucket`] with one record
//! per distinct branch name, converting seconds to minutes.

use std::collections::HashMap;

use chrono::NaiveDate;
use thiserror::Error;

use crate::types::{BranchRecord, DayBucket, ResultSet, UNKNOWN_BRANCH};

/// Aggregation errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AggregateError {
    /// None of the day's result sets contained a branch.
    #[error("no branches recorded on {date}")]
    EmptyDay { date: NaiveDate },
}

/// Merges every branch entry of a day into per-branch minute totals.
///
/// Names are compared by exact, case-sensitive equality. Branches with zero
/// seconds are kept. The tracker's `unknown` branch becomes the day's
/// unallocated record.
pub fn aggregate_day(
    date: NaiveDate,
    result_sets: &[ResultSet],
) -> Result<DayBucket, AggregateError> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut branches: Vec<BranchRecord> = Vec::new();

    for raw in result_sets.iter().flat_map(|set| &set.branches) {
        let minutes = raw.total_seconds.max(0.0) / 60.0;
        if let Some(&i) = index.get(raw.name.as_str()) {
            branches[i].minutes += minutes;
            continue;
        }

        index.insert(raw.name.as_str(), branches.len());
        if raw.name == UNKNOWN_BRANCH {
            branches.push(BranchRecord::unallocated(minutes));
        } else {
            branches.push(BranchRecord::new(raw.name.clone(), minutes));
        }
    }

    if branches.is_empty() {
        return Err(AggregateError::EmptyDay { date });
    }

    tracing::debug!(%date, branches = branches.len(), "aggregated day");
    Ok(DayBucket::new(date, branches))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RawBranch;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 4).unwrap()
    }

    fn minutes(day: &DayBucket, name: &str) -> f64 {
        day.get(name).map(|b| b.minutes).expect("branch should exist")
    }

    #[test]
    fn sums_same_branch_across_result_sets() {
        let sets = vec![
            ResultSet::new(vec![RawBranch::new("PROJ-1", 600.0)]),
            ResultSet::new(vec![
                RawBranch::new("PROJ-1", 1200.0),
                RawBranch::new("PROJ-2", 60.0),
            ]),
        ];

        let day = aggregate_day(date(), &sets).unwrap();

        assert_eq!(day.branches.len(), 2);
        assert!((minutes(&day, "PROJ-1") - 30.0).abs() < 1e-9);
        assert!((minutes(&day, "PROJ-2") - 1.0).abs() < 1e-9);
    }

    #[test]
    fn keeps_first_seen_order() {
        let sets = vec![ResultSet::new(vec![
            RawBranch::new("b", 60.0),
            RawBranch::new("a", 60.0),
            RawBranch::new("b", 60.0),
        ])];

        let day = aggregate_day(date(), &sets).unwrap();
        let names: Vec<_> = day.branches.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, vec!["b", "a"]);
    }

    #[test]
    fn names_are_case_sensitive() {
        let sets = vec![ResultSet::new(vec![
            RawBranch::new("ABC-1", 60.0),
            RawBranch::new("abc-1", 120.0),
        ])];

        let day = aggregate_day(date(), &sets).unwrap();
        assert_eq!(day.branches.len(), 2);
    }

    #[test]
    fn zero_second_branch_is_kept() {
        let sets = vec![ResultSet::new(vec![
            RawBranch::new("idle", 0.0),
            RawBranch::new("PROJ-1", 60.0),
        ])];

        let day = aggregate_day(date(), &sets).unwrap();
        assert_eq!(minutes(&day, "idle"), 0.0);
    }

    #[test]
    fn unknown_branch_is_tagged_unallocated() {
        let sets = vec![ResultSet::new(vec![
            RawBranch::new("unknown", 1800.0),
            RawBranch::new("PROJ-1", 60.0),
        ])];

        let day = aggregate_day(date(), &sets).unwrap();
        let unknown = &day.branches[0];
        assert!(unknown.unallocated);
        assert!((unknown.minutes - 30.0).abs() < 1e-9);
        assert!(!day.branches[1].unallocated);
    }

    #[test]
    fn total_is_independent_of_input_order() {
        let forward = vec![
            ResultSet::new(vec![RawBranch::new("A", 90.0), RawBranch::new("B", 30.0)]),
            ResultSet::new(vec![RawBranch::new("A", 150.0)]),
        ];
        let backward = vec![
            ResultSet::new(vec![RawBranch::new("A", 150.0)]),
            ResultSet::new(vec![RawBranch::new("B", 30.0), RawBranch::new("A", 90.0)]),
        ];

        let a = aggregate_day(date(), &forward).unwrap();
        let b = aggregate_day(date(), &backward).unwrap();
        assert!((minutes(&a, "A") - minutes(&b, "A")).abs() < 1e-9);
        assert!((a.total_minutes() - b.total_minutes()).abs() < 1e-9);
    }

    #[test]
    fn empty_day_is_an_error() {
        let sets = vec![ResultSet::default(), ResultSet::default()];
        assert_eq!(
            aggregate_day(date(), &sets),
            Err(AggregateError::EmptyDay { date: date() })
        );
        assert_eq!(
            aggregate_day(date(), &[]),
            Err(AggregateError::EmptyDay { date: date() })
        );
    }
}
