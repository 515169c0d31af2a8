//! Report command for monthly hour reports.
//!
//! This module implements `wakamonth report`: it fetches one month of branch
//! summaries, runs them through the allocation pipeline and prints a console
//! tree or JSON, optionally exporting a spreadsheet.

use std::io::Write;

use anyhow::{Context, Result, bail};
use chrono::{Datelike, Local};
use clap::{Args, ValueEnum};
use wm_api::Client;
use wm_core::{MonthReport, ReportError, UnknownOutcome, build_month_report, calendar};

use crate::config::Config;
use crate::sheet::{self, Autolinker};
use crate::tree::Node;

/// Labels are padded to at least this many columns.
const MIN_LABEL_WIDTH: usize = 42;

/// Used in messages and titles when no project filter is given.
const ALL_PROJECTS: &str = "all";

#[derive(Debug, Clone, Args)]
pub struct ReportArgs {
    /// Month to report, 1-12. Defaults to the current month.
    #[arg(short, long, value_parser = clap::value_parser!(u32).range(1..=12))]
    pub month: Option<u32>,

    /// Year to report. Defaults to the current year.
    #[arg(short, long)]
    pub year: Option<i32>,

    /// User id or username; `current` is the owner of the API key.
    #[arg(short, long, default_value = "current")]
    pub user: String,

    /// Only count time tracked on this project.
    #[arg(short, long)]
    pub project: Option<String>,

    /// Fill every tracked day to the configured target length.
    #[arg(short, long)]
    pub fill_day: bool,

    /// Also export the month as a spreadsheet to the home directory.
    #[arg(short, long, value_enum)]
    pub export: Option<ExportFormat>,

    /// Output as JSON instead of a tree.
    #[arg(long)]
    pub json: bool,
}

/// Export file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    /// Excel workbook with formulas.
    Xlsx,
    /// The same layout as JSON.
    Json,
}

impl ExportFormat {
    const fn extension(self) -> &'static str {
        match self {
            Self::Xlsx => "xlsx",
            Self::Json => "json",
        }
    }
}

/// Runs the report command.
///
/// Configuration is validated before any network access, so a bad pattern or
/// precision fails fast.
pub fn run<W: Write>(writer: &mut W, args: &ReportArgs, config: &Config) -> Result<()> {
    let today = Local::now().date_naive();
    let year = args.year.unwrap_or_else(|| today.year());
    let month = args.month.unwrap_or_else(|| today.month());
    let project = args.project.as_deref().unwrap_or(ALL_PROJECTS);

    let allocation = config
        .allocation(args.fill_day)
        .context("invalid configuration")?;
    let days = calendar::month_days(year, month)?;
    let linker = if args.export.is_some() {
        Autolinker::from_config(&config.autolink, project)?
    } else {
        None
    };

    let Some(api_key) = config.api_key.as_deref() else {
        bail!(
            "missing API key: set api_key in ~/.wakatime.cfg, the config file or WAKAMONTH_API_KEY"
        );
    };
    let client = Client::new(config.api_url.as_str(), api_key, config.backend)?;

    let runtime = tokio::runtime::Runtime::new().context("failed to initialize tokio runtime")?;
    let (user, summaries) = runtime
        .block_on(async {
            let user = client.resolve_user(&args.user).await?;
            let summaries =
                wm_api::fetch_month(&client, &user.id, args.project.as_deref(), &days).await?;
            Ok::<_, wm_api::ApiError>((user, summaries))
        })
        .context("failed to fetch summaries")?;
    tracing::debug!(user = user.name(), days = summaries.len(), "fetched month");

    let report = match build_month_report(summaries, &allocation, allocation.ignore_pattern()) {
        Ok(report) => report,
        Err(ReportError::NoData) => {
            writeln!(
                writer,
                "No results found for {project}/{}-{year}/{month:02}",
                user.id
            )?;
            return Ok(());
        }
    };

    if args.json {
        writeln!(writer, "{}", format_report_json(&report)?)?;
    } else {
        write!(writer, "{}", format_report(&report))?;
    }

    if let Some(format) = args.export {
        let title = format!("Hours {project}: {year}-{month:02}");
        let sheet = sheet::build_sheet(&report, title, linker.as_ref());
        let path = sheet::default_export_path(year, month, user.name(), format.extension())?;
        match format {
            ExportFormat::Xlsx => sheet::write_xlsx(&sheet, &path)?,
            ExportFormat::Json => sheet::write_json(&sheet, &path)?,
        }
        writeln!(writer, "export: {}", path.display())?;
    }

    Ok(())
}

/// Formats hours with at most two decimals and no trailing zeros.
pub fn format_hours(hours: f64) -> String {
    let rounded = (hours * 100.0).round() / 100.0;
    if rounded.abs() < f64::EPSILON {
        return "0".to_string();
    }
    let text = format!("{rounded:.2}");
    text.trim_end_matches('0').trim_end_matches('.').to_string()
}

/// Renders the report as a console tree.
pub fn format_report(report: &MonthReport) -> String {
    let width = report.longest_branch_name().max(MIN_LABEL_WIDTH);
    let line = |label: &str, hours: f64| {
        Node::new(format!("{label:<width$} {:>5}h", format_hours(hours)))
    };

    let mut daily = Node::new("daily");
    for day in report.days.iter().filter(|d| !d.is_empty()) {
        let mut node = Node::new(day.date.format("%Y-%m-%d").to_string());
        match &day.unknown {
            UnknownOutcome::Spread { branches, .. } => {
                #[expect(
                    clippy::cast_precision_loss,
                    reason = "branch counts per day are tiny"
                )]
                let share = day.unknown_hours / *branches as f64;
                node.push(line(&format!("allocated unknown / branch ({branches})"), share));
            }
            UnknownOutcome::Stranded => {
                node.push(line("unallocated unknown (no branches)", day.unknown_hours));
            }
            UnknownOutcome::Unallocated if day.branches.is_empty() => {
                node.push(line("unallocated unknown", day.unknown_hours));
            }
            UnknownOutcome::None | UnknownOutcome::Unallocated => {}
        }
        for branch in &day.branches {
            node.push(line(&branch.name, branch.hours));
        }
        daily.push(node);
    }

    let unknown_label = if report.spread_unallocated {
        "unknown (allocated)"
    } else {
        "unknown (unallocated)"
    };
    let mut overview = Node::new("overview");
    overview.push(line("total", report.total_hours));
    overview.push(line("development", report.development_hours));
    overview.push(line("maintenance", report.maintenance_hours));
    overview.push(line(unknown_label, report.unknown_hours));

    let mut root = Node::new("wakamonth");
    root.push(daily);
    root.push(overview);
    root.to_string()
}

/// Renders the report as pretty JSON.
pub fn format_report_json(report: &MonthReport) -> Result<String> {
    serde_json::to_string_pretty(report).context("failed to encode report")
}
