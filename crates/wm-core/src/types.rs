//! Branch and day types shared by every pipeline stage.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Branch name the tracker reports for time it could not attribute.
pub const UNKNOWN_BRANCH: &str = "unknown";

/// A branch entry as returned by the summaries API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawBranch {
    pub name: String,
    #[serde(default)]
    pub total_seconds: f64,
}

impl RawBranch {
    pub fn new(name: impl Into<String>, total_seconds: f64) -> Self {
        Self {
            name: name.into(),
            total_seconds,
        }
    }
}

/// One summary result set. The API may return several for a single day.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultSet {
    #[serde(default)]
    pub branches: Vec<RawBranch>,
}

impl ResultSet {
    pub const fn new(branches: Vec<RawBranch>) -> Self {
        Self { branches }
    }
}

/// Tracked minutes for one branch on one day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BranchRecord {
    pub name: String,

    /// Minutes tracked, never negative.
    pub minutes: f64,

    /// True for time the tracker could not attribute to any branch.
    pub unallocated: bool,
}

impl BranchRecord {
    /// Creates a record for a named branch.
    pub fn new(name: impl Into<String>, minutes: f64) -> Self {
        Self {
            name: name.into(),
            minutes,
            unallocated: false,
        }
    }

    /// Creates the record holding a day's unattributed time.
    pub fn unallocated(minutes: f64) -> Self {
        Self {
            name: UNKNOWN_BRANCH.to_string(),
            minutes,
            unallocated: true,
        }
    }
}

/// Branch records for one calendar day, in first-seen order.
#[derive(Debug, Clone, PartialEq)]
pub struct DayBucket {
    pub date: NaiveDate,
    pub branches: Vec<BranchRecord>,
}

impl DayBucket {
    pub const fn new(date: NaiveDate, branches: Vec<BranchRecord>) -> Self {
        Self { date, branches }
    }

    pub fn is_empty(&self) -> bool {
        self.branches.is_empty()
    }

    /// Sum of all branch minutes, unallocated time included.
    pub fn total_minutes(&self) -> f64 {
        self.branches.iter().map(|b| b.minutes).sum()
    }

    /// Looks up a named (allocated) branch.
    pub fn get(&self, name: &str) -> Option<&BranchRecord> {
        self.branches
            .iter()
            .find(|b| !b.unallocated && b.name == name)
    }
}
