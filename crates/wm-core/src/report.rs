//! Month report aggregation.
//!
//! Runs every day of a month through the allocation pipeline and sums the
//! resulting hours into development and maintenance totals.

use chrono::NaiveDate;
use regex::Regex;
use serde::Serialize;
use thiserror::Error;

use crate::aggregate::{AggregateError, aggregate_day};
use crate::config::{AllocationConfig, ConfigError};
use crate::fill_day::fill_day;
use crate::types::{DayBucket, ResultSet};
use crate::unknown::{UnknownAllocation, UnknownOutcome, allocate_unknown};

const MINUTES_PER_HOUR: f64 = 60.0;

/// Report errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReportError {
    /// No day in the requested range had any tracked branch.
    #[error("no tracked time found")]
    NoData,
}

/// Whether a branch counts as declarable work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Development,
    Maintenance,
}

/// Decides the category of a branch by name.
pub trait Classifier {
    fn classify(&self, branch: &str) -> Category;
}

impl<F> Classifier for F
where
    F: Fn(&str) -> Category,
{
    fn classify(&self, branch: &str) -> Category {
        self(branch)
    }
}

/// Branches matching the pattern are maintenance, everything else is development.
#[derive(Debug, Clone)]
pub struct IgnorePattern(Regex);

impl IgnorePattern {
    pub fn new(pattern: &str) -> Result<Self, ConfigError> {
        Regex::new(pattern)
            .map(Self)
            .map_err(|source| ConfigError::InvalidIgnorePattern {
                pattern: pattern.to_string(),
                source,
            })
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Classifier for IgnorePattern {
    fn classify(&self, branch: &str) -> Category {
        if self.0.is_match(branch) {
            Category::Maintenance
        } else {
            Category::Development
        }
    }
}

/// Final hours for one branch on one day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BranchHours {
    pub name: String,
    pub hours: f64,
    pub category: Category,
}

/// One day of the report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayReport {
    pub date: NaiveDate,
    pub branches: Vec<BranchHours>,
    pub unknown: UnknownOutcome,

    /// Unknown time rounded to the billing precision, for display.
    pub unknown_hours: f64,
}

impl DayReport {
    /// A day with nothing tracked.
    pub const fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            branches: Vec::new(),
            unknown: UnknownOutcome::None,
            unknown_hours: 0.0,
        }
    }

    /// True when the day had no branches and no unknown time.
    pub fn is_empty(&self) -> bool {
        self.branches.is_empty() && matches!(self.unknown, UnknownOutcome::None)
    }

    pub fn total_hours(&self) -> f64 {
        self.branches.iter().map(|b| b.hours).sum()
    }
}

/// Finalized month totals. Days are in calendar order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthReport {
    pub days: Vec<DayReport>,
    pub total_hours: f64,
    pub development_hours: f64,
    pub maintenance_hours: f64,
    pub unknown_hours: f64,
    pub spread_unallocated: bool,
    pub fill_day: bool,
}

impl MonthReport {
    /// Length of the longest branch name in the report.
    pub fn longest_branch_name(&self) -> usize {
        self.days
            .iter()
            .flat_map(|d| &d.branches)
            .map(|b| b.name.chars().count())
            .max()
            .unwrap_or(0)
    }
}

/// Runs one aggregated day through unknown allocation and rounding.
///
/// Fill-day mode replaces precision rounding: filled minutes are converted
/// straight to hours.
pub fn build_day_report(
    day: DayBucket,
    config: &AllocationConfig,
    classifier: &impl Classifier,
) -> DayReport {
    let precision = config.precision();
    let UnknownAllocation {
        day,
        unknown_minutes,
        outcome,
    } = allocate_unknown(day, config.spread_unallocated());

    let unknown_hours = match outcome {
        UnknownOutcome::None => 0.0,
        _ => precision.to_hours(unknown_minutes),
    };

    let date = day.date;
    let records = match config.fill_day() {
        Some(fill) => fill_day(day, fill)
            .branches
            .into_iter()
            .map(|b| (b.name, b.minutes / MINUTES_PER_HOUR))
            .collect::<Vec<_>>(),
        None => day
            .branches
            .into_iter()
            .map(|b| {
                let hours = precision.to_hours(b.minutes);
                (b.name, hours)
            })
            .collect(),
    };

    let branches = records
        .into_iter()
        .map(|(name, hours)| BranchHours {
            category: classifier.classify(&name),
            name,
            hours,
        })
        .collect();

    DayReport {
        date,
        branches,
        unknown: outcome,
        unknown_hours,
    }
}

/// Builds the month report from fetched result sets keyed by date.
///
/// Input order does not matter; days are sorted by date. Days without any
/// branch stay in the report as empty days. Fails with
/// [`ReportError::NoData`] if every day is empty.
pub fn build_month_report<I>(
    days: I,
    config: &AllocationConfig,
    classifier: &impl Classifier,
) -> Result<MonthReport, ReportError>
where
    I: IntoIterator<Item = (NaiveDate, Vec<ResultSet>)>,
{
    let mut days: Vec<_> = days.into_iter().collect();
    days.sort_by_key(|(date, _)| *date);

    let mut any_data = false;
    let reports: Vec<DayReport> = days
        .into_iter()
        .map(|(date, sets)| match aggregate_day(date, &sets) {
            Ok(bucket) => {
                any_data = true;
                build_day_report(bucket, config, classifier)
            }
            Err(AggregateError::EmptyDay { date }) => {
                tracing::debug!(%date, "no branches, skipping day");
                DayReport::empty(date)
            }
        })
        .collect();

    if !any_data {
        return Err(ReportError::NoData);
    }

    let all_branches = || reports.iter().flat_map(|d| &d.branches);
    let total_hours: f64 = all_branches().map(|b| b.hours).sum();
    let development_hours: f64 = all_branches()
        .filter(|b| b.category == Category::Development)
        .map(|b| b.hours)
        .sum();
    let unknown_hours: f64 = reports.iter().map(|d| d.unknown_hours).sum();

    tracing::debug!(
        total_hours,
        development_hours,
        unknown_hours,
        "built month report"
    );

    Ok(MonthReport {
        total_hours,
        development_hours,
        maintenance_hours: total_hours - development_hours,
        unknown_hours,
        spread_unallocated: config.spread_unallocated(),
        fill_day: config.fill_day().is_some(),
        days: reports,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fill_day::FillDayConfig;
    use crate::types::RawBranch;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, day).unwrap()
    }

    /// Result set from `(name, minutes)` pairs.
    fn sets(branches: &[(&str, f64)]) -> Vec<ResultSet> {
        vec![ResultSet::new(
            branches
                .iter()
                .map(|&(name, minutes)| RawBranch::new(name, minutes * 60.0))
                .collect(),
        )]
    }

    fn config(spread: bool) -> AllocationConfig {
        AllocationConfig::new(60, spread, "^(main|develop)$").unwrap()
    }

    fn hours(day: &DayReport, name: &str) -> f64 {
        day.branches
            .iter()
            .find(|b| b.name == name)
            .map(|b| b.hours)
            .expect("branch should exist")
    }

    #[test]
    fn spread_unknown_then_round_to_hours() {
        let report = build_month_report(
            [(date(3), sets(&[("A", 30.0), ("B", 90.0), ("unknown", 60.0)]))],
            &config(true),
            config(true).ignore_pattern(),
        )
        .unwrap();

        let day = &report.days[0];
        assert!((hours(day, "A") - 1.0).abs() < 1e-9);
        assert!((hours(day, "B") - 2.0).abs() < 1e-9);
        assert!(day.branches.iter().all(|b| b.name != "unknown"));
        assert!((report.total_hours - 3.0).abs() < 1e-9);
        assert!((report.unknown_hours - 1.0).abs() < 1e-9);
    }

    #[test]
    fn stranded_unknown_is_flagged_not_dropped() {
        let report = build_month_report(
            [(date(3), sets(&[("unknown", 45.0)]))],
            &config(true),
            config(true).ignore_pattern(),
        )
        .unwrap();

        let day = &report.days[0];
        assert_eq!(day.unknown, UnknownOutcome::Stranded);
        assert!(day.branches.is_empty());
        assert!(!day.is_empty());
        assert!((report.unknown_hours - 1.0).abs() < 1e-9);
        assert!(report.total_hours.abs() < 1e-9);
    }

    #[test]
    fn unknown_hours_reported_without_spreading() {
        let report = build_month_report(
            [
                (date(3), sets(&[("A", 30.0), ("unknown", 20.0)])),
                (date(4), sets(&[("A", 30.0), ("unknown", 70.0)])),
            ],
            &config(false),
            config(false).ignore_pattern(),
        )
        .unwrap();

        assert!((report.unknown_hours - 3.0).abs() < 1e-9);
        assert!((report.total_hours - 2.0).abs() < 1e-9);
        assert_eq!(report.days[0].unknown, UnknownOutcome::Unallocated);
    }

    #[test]
    fn partitions_development_and_maintenance() {
        let report = build_month_report(
            [
                (date(3), sets(&[("PROJ-1", 50.0), ("main", 10.0)])),
                (date(4), sets(&[("develop", 61.0), ("PROJ-2", 120.0)])),
            ],
            &config(true),
            config(true).ignore_pattern(),
        )
        .unwrap();

        assert!((report.total_hours - 6.0).abs() < 1e-9);
        assert!((report.development_hours - 3.0).abs() < 1e-9);
        assert!((report.maintenance_hours - 3.0).abs() < 1e-9);
        assert!(
            (report.development_hours + report.maintenance_hours - report.total_hours).abs()
                < 1e-9
        );
        assert_eq!(report.days[0].branches[1].category, Category::Maintenance);
    }

    #[test]
    fn accepts_custom_classifier() {
        let everything_is_maintenance = |_: &str| Category::Maintenance;
        let report = build_month_report(
            [(date(3), sets(&[("PROJ-1", 50.0)]))],
            &config(true),
            &everything_is_maintenance,
        )
        .unwrap();

        assert!(report.development_hours.abs() < 1e-9);
        assert!((report.maintenance_hours - 1.0).abs() < 1e-9);
    }

    #[test]
    fn days_are_sorted_and_empty_days_kept() {
        let report = build_month_report(
            [
                (date(5), sets(&[("A", 10.0)])),
                (date(3), Vec::new()),
                (date(4), sets(&[("B", 10.0)])),
            ],
            &config(true),
            config(true).ignore_pattern(),
        )
        .unwrap();

        let dates: Vec<_> = report.days.iter().map(|d| d.date).collect();
        assert_eq!(dates, vec![date(3), date(4), date(5)]);
        assert!(report.days[0].is_empty());
    }

    #[test]
    fn all_empty_month_is_no_data() {
        let result = build_month_report(
            [(date(3), Vec::new()), (date(4), vec![ResultSet::default()])],
            &config(true),
            config(true).ignore_pattern(),
        );
        assert_eq!(result, Err(ReportError::NoData));
    }

    #[test]
    fn fill_day_skips_precision_rounding() {
        let config = config(true).with_fill_day(FillDayConfig::default()).unwrap();
        let report = build_month_report(
            [(date(3), sets(&[("X", 20.0), ("Y", 200.0), ("Z", 260.0)]))],
            &config,
            config.ignore_pattern(),
        )
        .unwrap();

        let day = &report.days[0];
        assert!((hours(day, "X") - 1.0).abs() < 1e-9);
        assert!((hours(day, "Y") - 3.0).abs() < 1e-9);
        assert!((hours(day, "Z") - 4.0).abs() < 1e-9);
        assert!((day.total_hours() - 8.0).abs() < 1e-9);
        assert!(report.fill_day);
    }

    #[test]
    fn fill_day_applies_after_spreading() {
        let config = config(true).with_fill_day(FillDayConfig::default()).unwrap();
        let report = build_month_report(
            [(date(3), sets(&[("A", 100.0), ("B", 100.0), ("unknown", 60.0)]))],
            &config,
            config.ignore_pattern(),
        )
        .unwrap();

        let day = &report.days[0];
        assert!((day.total_hours() - 8.0).abs() < 1e-6);
        assert!((hours(day, "A") - 4.0).abs() < 1e-9);
        assert!((report.unknown_hours - 1.0).abs() < 1e-9);
    }

    #[test]
    fn fill_day_never_zeroes_a_tracked_branch() {
        let config = config(true).with_fill_day(FillDayConfig::default()).unwrap();
        let names = ["A", "B", "C", "D", "E", "F", "G", "H", "I"];
        let records: Vec<(&str, f64)> = names.iter().map(|&n| (n, 1.0)).collect();

        let report =
            build_month_report([(date(3), sets(&records))], &config, config.ignore_pattern())
                .unwrap();

        let day = &report.days[0];
        assert_eq!(day.branches.len(), names.len());
        assert!(day.branches.iter().all(|b| b.hours > 0.0));
        assert!((day.total_hours() - 8.0).abs() < 1e-6);
    }

    #[test]
    fn ignore_pattern_classifies_by_match() {
        let pattern = IgnorePattern::new("^release/").unwrap();
        assert_eq!(pattern.classify("release/1.2"), Category::Maintenance);
        assert_eq!(pattern.classify("feature/release/x"), Category::Development);
        assert_eq!(pattern.as_str(), "^release/");
    }

    #[test]
    fn month_report_serializes_to_json() {
        let report = build_month_report(
            [(date(3), sets(&[("PROJ-1", 30.0), ("unknown", 15.0)]))],
            &config(true),
            config(true).ignore_pattern(),
        )
        .unwrap();

        insta::assert_snapshot!(serde_json::to_string_pretty(&report).unwrap(), @r#"
        {
          "days": [
            {
              "date": "2025-03-03",
              "branches": [
                {
                  "name": "PROJ-1",
                  "hours": 1.0,
                  "category": "development"
                }
              ],
              "unknown": {
                "kind": "spread",
                "branches": 1,
                "share_minutes": 15.0
              },
              "unknown_hours": 1.0
            }
          ],
          "total_hours": 1.0,
          "development_hours": 1.0,
          "maintenance_hours": 0.0,
          "unknown_hours": 1.0,
          "spread_unallocated": true,
          "fill_day": false
        }
        "#);
    }
}
