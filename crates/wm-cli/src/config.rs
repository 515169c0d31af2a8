//! Configuration loading and management.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};
use wm_api::Backend;
use wm_core::{AllocationConfig, ConfigError, FillDayConfig};

/// Branches treated as maintenance unless configured otherwise.
const DEFAULT_IGNORE_PATTERN: &str = "^(main|master|develop|staging)$";

/// Application configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    /// Base API URL, e.g. `https://api.wakatime.com/api`.
    pub api_url: String,

    /// API key. Read from `~/.wakatime.cfg` when not configured here.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    pub backend: Backend,

    /// Billing precision in minutes.
    pub precision: i64,

    /// Spread unknown time evenly over each day's branches.
    pub spread_unallocated: bool,

    /// Branches matching this pattern count as maintenance.
    pub ignore_pattern: String,

    /// Day length used by `--fill-day`.
    pub fill_day_target_minutes: f64,

    #[serde(default)]
    pub autolink: Autolink,
}

/// Links branch names to an issue tracker in the spreadsheet export.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Autolink {
    pub enabled: bool,

    /// Pattern extracting the issue number from a branch name.
    #[serde(default)]
    pub issue_regex: String,

    /// Link template with `{{project}}` and `{{issue}}` placeholders.
    #[serde(default)]
    pub url: String,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("api_url", &self.api_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("backend", &self.backend)
            .field("precision", &self.precision)
            .field("spread_unallocated", &self.spread_unallocated)
            .field("ignore_pattern", &self.ignore_pattern)
            .field("fill_day_target_minutes", &self.fill_day_target_minutes)
            .field("autolink", &self.autolink)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: "https://api.wakatime.com/api".to_string(),
            api_key: None,
            backend: Backend::Wakatime,
            precision: 60,
            spread_unallocated: true,
            ignore_pattern: DEFAULT_IGNORE_PATTERN.to_string(),
            fill_day_target_minutes: FillDayConfig::default().target_minutes,
            autolink: Autolink::default(),
        }
    }
}

impl Config {
    /// Loads configuration, optionally from a specific file.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Credentials shared with the WakaTime plugins
        if let Some(home) = dirs::home_dir() {
            let settings = read_wakatime_settings(&home.join(".wakatime.cfg"));
            figment = figment.merge(Serialized::defaults(settings));
        }

        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // Load from environment variables (WAKAMONTH_*)
        figment = figment.merge(Env::prefixed("WAKAMONTH_").split("__"));

        figment.extract()
    }

    /// Validates the allocation settings for one run.
    pub fn allocation(&self, fill_day: bool) -> Result<AllocationConfig, ConfigError> {
        let config =
            AllocationConfig::new(self.precision, self.spread_unallocated, &self.ignore_pattern)?;
        if !fill_day {
            return Ok(config);
        }
        config.with_fill_day(FillDayConfig {
            target_minutes: self.fill_day_target_minutes,
            ..FillDayConfig::default()
        })
    }
}

/// The `[settings]` values of `~/.wakatime.cfg` this tool reuses.
#[derive(Debug, Default, PartialEq, Eq, Serialize)]
struct WakatimeSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    api_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    api_key: Option<String>,
}

fn read_wakatime_settings(path: &Path) -> WakatimeSettings {
    match fs::read_to_string(path) {
        Ok(contents) => parse_wakatime_settings(&contents),
        Err(err) => {
            tracing::debug!(path = %path.display(), %err, "no wakatime config");
            WakatimeSettings::default()
        }
    }
}

/// Reads `api_url` and `api_key` from the `[settings]` section of an INI file.
fn parse_wakatime_settings(contents: &str) -> WakatimeSettings {
    let mut settings = WakatimeSettings::default();
    let mut in_settings = false;

    for line in contents.lines().map(str::trim) {
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }
        if let Some(section) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
            in_settings = section.trim() == "settings";
            continue;
        }
        if !in_settings {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let value = value.trim();
        if value.is_empty() {
            continue;
        }
        match key.trim() {
            "api_url" => settings.api_url = Some(value.to_string()),
            "api_key" => settings.api_key = Some(value.to_string()),
            _ => {}
        }
    }

    settings
}

/// Returns the platform-specific config directory for wakamonth.
///
/// On Linux: `~/.config/wakamonth`
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("wakamonth"))
}
