//! Calendar helpers.

use chrono::{Datelike, NaiveDate};

use crate::config::ConfigError;

/// Every date of the given month, in order.
pub fn month_days(year: i32, month: u32) -> Result<Vec<NaiveDate>, ConfigError> {
    let first =
        NaiveDate::from_ymd_opt(year, month, 1).ok_or(ConfigError::InvalidMonth { year, month })?;
    Ok(first
        .iter_days()
        .take_while(|d| d.month() == month)
        .collect())
}
