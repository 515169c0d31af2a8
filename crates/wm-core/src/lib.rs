//! Core hour-allocation logic for monthly time reports.
//!
//! This crate turns raw per-day branch totals from an activity tracker into
//! billable hours:
//! - Aggregation: folding summary result sets into per-day branch minutes
//! - Unknown time: spreading the tracker's unattributed time over known branches
//! - Fill-day: rescaling a day onto a fixed target with half-hour rounding
//! - Precision: rounding minutes up to a billing increment
//! - Reporting: month totals split into development and maintenance hours

mod aggregate;
pub mod calendar;
mod config;
mod fill_day;
mod precision;
mod report;
pub mod types;
mod unknown;

pub use aggregate::{AggregateError, aggregate_day};
pub use config::{AllocationConfig, ConfigError};
pub use fill_day::{FillDayConfig, fill_day};
pub use precision::Precision;
pub use report::{
    BranchHours, Category, Classifier, DayReport, IgnorePattern, MonthReport, ReportError,
    build_day_report, build_month_report,
};
pub use types::{BranchRecord, DayBucket, RawBranch, ResultSet, UNKNOWN_BRANCH};
pub use unknown::{UnknownAllocation, UnknownOutcome, allocate_unknown};
