//! Spreadsheet export.
//!
//! Lays the month out the way the timesheet is filed: one row per branch in
//! first-seen order, one column per calendar day, and a totals row. The
//! workbook keeps its totals as formulas so edited cells stay summed. Visual
//! styling is left to whatever opens the file.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use regex::Regex;
use rust_xlsxwriter::{Url, Workbook};
use serde::Serialize;
use wm_core::{Category, MonthReport};

use crate::config::Autolink;

/// Header cells before the first day column.
const HEADERS: [&str; 4] = ["Branch", "Month Total", "Development", "Maintenance"];

/// Marker in the development/maintenance columns, summed by `SUMIF`.
const MARK: &str = "x";

/// Excel rejects these in worksheet names.
const INVALID_SHEET_CHARS: [char; 7] = ['[', ']', ':', '*', '?', '/', '\\'];
const MAX_SHEET_NAME: usize = 31;

/// A month of hours in spreadsheet layout.
#[derive(Debug, Serialize)]
pub struct Sheet {
    pub title: String,
    pub days: Vec<NaiveDate>,
    pub rows: Vec<SheetRow>,
    pub totals: SheetTotals,
}

#[derive(Debug, Serialize)]
pub struct SheetRow {
    pub branch: String,
    pub link: Option<String>,
    pub category: Category,
    pub total_hours: f64,

    /// Hours per day column; `None` where the branch was not tracked.
    pub hours: Vec<Option<f64>>,
}

#[derive(Debug, Serialize)]
pub struct SheetTotals {
    pub total_hours: f64,
    pub development_hours: f64,
    pub maintenance_hours: f64,
    pub per_day: Vec<f64>,
}

/// Turns branch names into issue tracker links.
#[derive(Debug)]
pub struct Autolinker {
    issue: Regex,
    url: String,
    project: String,
}

impl Autolinker {
    /// Builds a linker from configuration; `None` when autolinking is off.
    pub fn from_config(config: &Autolink, project: &str) -> Result<Option<Self>> {
        if !config.enabled {
            return Ok(None);
        }
        let issue = Regex::new(&config.issue_regex)
            .with_context(|| format!("invalid autolink issue_regex `{}`", config.issue_regex))?;
        Ok(Some(Self {
            issue,
            url: config.url.clone(),
            project: project.to_string(),
        }))
    }

    /// Link for a branch whose name contains an issue reference.
    pub fn link(&self, branch: &str) -> Option<String> {
        let issue = self.issue.find(branch)?;
        Some(
            self.url
                .replace("{{project}}", &self.project)
                .replace("{{issue}}", issue.as_str()),
        )
    }
}

/// Builds the spreadsheet layout of a report.
pub fn build_sheet(report: &MonthReport, title: String, linker: Option<&Autolinker>) -> Sheet {
    let days: Vec<NaiveDate> = report.days.iter().map(|d| d.date).collect();
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut rows: Vec<SheetRow> = Vec::new();

    for (column, day) in report.days.iter().enumerate() {
        for branch in &day.branches {
            let row = *index.entry(branch.name.as_str()).or_insert_with(|| {
                rows.push(SheetRow {
                    branch: branch.name.clone(),
                    link: linker.and_then(|l| l.link(&branch.name)),
                    category: branch.category,
                    total_hours: 0.0,
                    hours: vec![None; days.len()],
                });
                rows.len() - 1
            });
            let cell = rows[row].hours[column].get_or_insert(0.0);
            *cell += branch.hours;
            rows[row].total_hours += branch.hours;
        }
    }

    let per_day: Vec<f64> = (0..days.len())
        .map(|column| rows.iter().filter_map(|r| r.hours[column]).sum::<f64>())
        .collect();
    let total_hours: f64 = rows.iter().map(|r| r.total_hours).sum();
    let development_hours: f64 = rows
        .iter()
        .filter(|r| r.category == Category::Development)
        .map(|r| r.total_hours)
        .sum();

    Sheet {
        title,
        days,
        rows,
        totals: SheetTotals {
            total_hours,
            development_hours,
            maintenance_hours: total_hours - development_hours,
            per_day,
        },
    }
}

/// Default export location: `~/<YYYY>-<MM>-<user>.<extension>`.
pub fn default_export_path(year: i32, month: u32, user: &str, extension: &str) -> Result<PathBuf> {
    let home = dirs::home_dir().context("could not determine home directory")?;
    Ok(home.join(format!("{year}-{month:02}-{user}.{extension}")))
}

/// Writes the sheet as pretty JSON.
pub fn write_json(sheet: &Sheet, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(sheet).context("failed to encode sheet")?;
    fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

/// Writes the sheet as an Excel workbook.
///
/// Row totals are `SUM` formulas over the day columns; the totals row sums
/// each column and splits development from maintenance with `SUMIF` on the
/// marker columns.
pub fn write_xlsx(sheet: &Sheet, path: &Path) -> Result<()> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(worksheet_name(&sheet.title))?;

    let first_day = u16::try_from(HEADERS.len())?;
    let day_count = u16::try_from(sheet.days.len()).context("too many day columns")?;
    let last_day = column_name(first_day + day_count.saturating_sub(1));
    let last_row = u32::try_from(sheet.rows.len() + 1).context("too many branch rows")?;

    worksheet.set_column_width(0, 60.0)?;
    for (col, header) in (0u16..).zip(HEADERS) {
        worksheet.write_string(0, col, header)?;
    }
    for (offset, day) in (0u16..).zip(&sheet.days) {
        worksheet.write_string(0, first_day + offset, day.format("%b %d").to_string())?;
    }

    for (row, entry) in (1u32..).zip(&sheet.rows) {
        match &entry.link {
            Some(link) => worksheet.write_url(row, 0, Url::new(link).set_text(&entry.branch))?,
            None => worksheet.write_string(row, 0, &entry.branch)?,
        };
        let excel_row = row + 1;
        worksheet.write_formula(
            row,
            1,
            format!("=SUM({}{excel_row}:{last_day}{excel_row})", column_name(first_day)).as_str(),
        )?;
        let mark_col = match entry.category {
            Category::Development => 2,
            Category::Maintenance => 3,
        };
        worksheet.write_string(row, mark_col, MARK)?;
        for (offset, hours) in (0u16..).zip(&entry.hours) {
            if let Some(hours) = hours {
                worksheet.write_number(row, first_day + offset, *hours)?;
            }
        }
    }

    let totals = last_row;
    worksheet.write_string(totals, 0, "Total:")?;
    worksheet.write_formula(totals, 1, format!("=SUM(B2:B{last_row})").as_str())?;
    for (col, letter) in [(2, "C"), (3, "D")] {
        worksheet.write_formula(
            totals,
            col,
            format!("=SUMIF({letter}2:{letter}{last_row},\"{MARK}\",B2:B{last_row})").as_str(),
        )?;
    }
    for offset in 0..day_count {
        let letter = column_name(first_day + offset);
        worksheet.write_formula(
            totals,
            first_day + offset,
            format!("=SUM({letter}2:{letter}{last_row})").as_str(),
        )?;
    }

    workbook
        .save(path)
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

/// Spreadsheet column letters for a zero-based index: 0 is `A`, 26 is `AA`.
fn column_name(index: u16) -> String {
    let mut remaining = u32::from(index) + 1;
    let mut name = Vec::new();
    while remaining > 0 {
        let digit = (remaining - 1) % 26;
        #[expect(clippy::cast_possible_truncation, reason = "digit is below 26")]
        let letter = b'A' + digit as u8;
        name.push(letter);
        remaining = (remaining - 1) / 26;
    }
    name.iter().rev().map(|&b| char::from(b)).collect()
}

/// A worksheet name Excel accepts for the given title.
fn worksheet_name(title: &str) -> String {
    let name: String = title
        .chars()
        .filter(|c| !INVALID_SHEET_CHARS.contains(c))
        .take(MAX_SHEET_NAME)
        .collect();
    let name = name.trim().to_string();
    if name.is_empty() { "Hours".to_string() } else { name }
}
