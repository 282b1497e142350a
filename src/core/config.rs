//! Configuration module for `EnrollPlan`
//!
//! File-backed TOML settings with embedded defaults, plus the validated,
//! typed planner settings the core consumes.

use crate::core::calendar::holidays::HolidayRule;
use crate::core::errors::{PlanError, Result};
use crate::core::models::Level;
use chrono::Weekday;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Default configuration loaded based on build profile.
#[cfg(not(debug_assertions))]
const CONFIG_DEFAULTS: &str = include_str!("../assets/DefaultConfigRelease.toml");

#[cfg(debug_assertions)]
const CONFIG_DEFAULTS: &str = include_str!("../assets/DefaultConfigDebug.toml");

#[cfg(not(debug_assertions))]
const CONFIG_FILE_NAME: &str = "config.toml";

#[cfg(debug_assertions)]
const CONFIG_FILE_NAME: &str = "dconfig.toml";

/// Logging configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug)
    #[serde(default)]
    pub level: String,
    /// Log file path
    #[serde(default)]
    pub file: String,
    /// Enable verbose output
    #[serde(default)]
    pub verbose: bool,
}

/// Tuition and fee configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostsConfig {
    /// Cost per credit hour, undergraduate level
    pub per_credit_undergrad: f64,
    /// Cost per credit hour, graduate level
    pub per_credit_grad: f64,
    /// Flat fee added to every course
    pub per_course_fee: f64,
    /// Flat fee added to every session
    pub per_session_fee: f64,
    /// Whole-percentage discount applied to graduate courses (e.g. 20 for 20%)
    pub alumni_discount_percent: f64,
}

impl Default for CostsConfig {
    fn default() -> Self {
        Self {
            per_credit_undergrad: 514.0,
            per_credit_grad: 776.0,
            per_course_fee: 100.0,
            per_session_fee: 40.0,
            alumni_discount_percent: 20.0,
        }
    }
}

/// Session calendar configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionsConfig {
    /// Months (1-12) in which a new session may start; recur annually
    pub months: Vec<u32>,
    /// Session length in weeks
    pub weeks: u32,
    /// Weekday sessions start on (e.g. "sun", "mon")
    pub start_weekday: String,
    /// Named holidays to avoid when rounding start dates
    pub holidays: Vec<String>,
}

impl Default for SessionsConfig {
    fn default() -> Self {
        Self {
            months: vec![1, 3, 5, 7, 9, 11],
            weeks: 8,
            start_weekday: "sun".to_string(),
            holidays: HolidayRule::known_names()
                .iter()
                .map(ToString::to_string)
                .collect(),
        }
    }
}

/// Priority adjustment weights
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriorityConfig {
    /// Amount subtracted from capstone courses (pushes them later)
    pub capstone_penalty: i32,
    /// Amount added to in-person courses (pulls them earlier)
    pub in_person_bonus: i32,
}

impl Default for PriorityConfig {
    fn default() -> Self {
        Self {
            capstone_penalty: 10,
            in_person_bonus: 10,
        }
    }
}

/// Allocation-engine retry budgets
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulingConfig {
    /// Maximum target-adjustment retries per level before giving up
    pub max_attempts: u32,
    /// Maximum round-robin rounds when spreading leftover intent courses
    pub intent_spread_rounds: u32,
}

impl Default for SchedulingConfig {
    fn default() -> Self {
        Self {
            max_attempts: 25,
            intent_spread_rounds: 100,
        }
    }
}

/// Paths configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Directory for schedule report output files
    #[serde(default)]
    pub reports_dir: String,
}

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Tuition/fee settings
    #[serde(default)]
    pub costs: CostsConfig,
    /// Session calendar settings
    #[serde(default)]
    pub sessions: SessionsConfig,
    /// Priority weights
    #[serde(default)]
    pub priority: PriorityConfig,
    /// Retry budgets
    #[serde(default)]
    pub scheduling: SchedulingConfig,
    /// Path settings
    #[serde(default)]
    pub paths: PathsConfig,
}

/// Optional CLI overrides for configuration values
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    /// Override logging level
    pub level: Option<String>,
    /// Override log file path
    pub file: Option<String>,
    /// Override verbose flag
    pub verbose: Option<bool>,
    /// Override reports output directory
    pub reports_dir: Option<String>,
}

impl Config {
    /// Get the `EnrollPlan` configuration directory path
    ///
    /// Returns:
    /// - Linux: `~/.config/enrollplan`
    /// - macOS: `~/Library/Application Support/enrollplan`
    /// - Windows: `%APPDATA%\enrollplan`
    #[must_use]
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("enrollplan")
    }

    /// Path of the active config file for this build profile.
    #[must_use]
    pub fn config_file() -> PathBuf {
        Self::config_dir().join(CONFIG_FILE_NAME)
    }

    /// Build a config from the embedded defaults.
    ///
    /// # Panics
    /// Panics if the embedded defaults asset is malformed (a build defect,
    /// caught by `test_embedded_defaults_parse`).
    #[must_use]
    pub fn from_defaults() -> Self {
        toml::from_str(CONFIG_DEFAULTS).expect("embedded default config must parse")
    }

    /// Parse a config from a TOML string.
    ///
    /// # Errors
    /// Returns [`PlanError::DataIntegrity`] on malformed TOML.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        toml::from_str(toml_str)
            .map_err(|e| PlanError::DataIntegrity(format!("invalid config: {e}")))
    }

    /// Load the config from the platform config directory, falling back to
    /// embedded defaults when the file is missing or unreadable.
    #[must_use]
    pub fn load() -> Self {
        let path = Self::config_file();
        fs::read_to_string(&path)
            .ok()
            .and_then(|content| Self::from_toml(&content).ok())
            .unwrap_or_else(Self::from_defaults)
    }

    /// Persist the config to the platform config directory.
    ///
    /// # Errors
    /// Returns [`PlanError::DataIntegrity`] if the file cannot be written.
    pub fn save(&self) -> Result<()> {
        let dir = Self::config_dir();
        fs::create_dir_all(&dir)
            .map_err(|e| PlanError::DataIntegrity(format!("cannot create config dir: {e}")))?;
        let content = toml::to_string_pretty(self)
            .map_err(|e| PlanError::DataIntegrity(format!("cannot serialize config: {e}")))?;
        fs::write(Self::config_file(), content)
            .map_err(|e| PlanError::DataIntegrity(format!("cannot write config: {e}")))
    }

    /// Apply CLI-provided overrides onto the loaded configuration.
    ///
    /// Only non-`None` values replace config values; the persistent file is
    /// not modified.
    pub fn apply_overrides(&mut self, overrides: &ConfigOverrides) {
        if let Some(level) = &overrides.level {
            self.logging.level.clone_from(level);
        }
        if let Some(file) = &overrides.file {
            self.logging.file.clone_from(file);
        }
        if let Some(verbose) = overrides.verbose {
            self.logging.verbose = verbose;
        }
        if let Some(reports_dir) = &overrides.reports_dir {
            self.paths.reports_dir.clone_from(reports_dir);
        }
    }
}

/// Round a currency amount to cents.
#[must_use]
pub fn round_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

/// Validated tuition rates consumed by [`crate::core::models::Course`].
#[derive(Debug, Clone, PartialEq)]
pub struct CostRates {
    /// Cost per credit hour, undergraduate.
    pub per_credit_undergrad: f64,
    /// Cost per credit hour, graduate.
    pub per_credit_grad: f64,
    /// Flat fee per course.
    pub per_course_fee: f64,
    /// Flat fee per session.
    pub per_session_fee: f64,
    /// Graduate-only discount, whole percent.
    pub alumni_discount_percent: f64,
}

impl CostRates {
    /// Compute the fixed cost of a course at `level` with `credit_hours`.
    #[must_use]
    pub fn course_cost(&self, level: Level, credit_hours: u32) -> f64 {
        let (rate, multiplier) = match level {
            Level::Undergraduate => (self.per_credit_undergrad, 1.0),
            Level::Graduate => (
                self.per_credit_grad,
                (100.0 - self.alumni_discount_percent) / 100.0,
            ),
        };
        let gross = f64::from(credit_hours) * rate + self.per_course_fee;
        round_cents(gross * multiplier)
    }
}

/// Validated priority weights.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriorityWeights {
    /// Subtracted from capstone courses.
    pub capstone_penalty: i32,
    /// Added to in-person courses.
    pub in_person_bonus: i32,
}

/// Validated session-calendar settings.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSettings {
    /// Sorted, deduplicated anchor months (1-12).
    pub months: Vec<u32>,
    /// Session length in weeks.
    pub weeks: u32,
    /// Weekday sessions start on.
    pub start_weekday: Weekday,
    /// Holiday rules to avoid when rounding start dates.
    pub holidays: Vec<HolidayRule>,
}

impl SessionSettings {
    /// Session length in days.
    #[must_use]
    pub const fn duration_days(&self) -> i64 {
        self.weeks as i64 * 7
    }
}

/// Fully validated settings consumed by the planning core.
#[derive(Debug, Clone)]
pub struct PlannerSettings {
    /// Tuition rates.
    pub costs: CostRates,
    /// Priority weights.
    pub weights: PriorityWeights,
    /// Calendar settings.
    pub sessions: SessionSettings,
    /// Retry budgets.
    pub max_attempts: u32,
    /// Intent-spread round budget.
    pub intent_spread_rounds: u32,
}

impl PlannerSettings {
    /// Validate a file [`Config`] into typed planner settings.
    ///
    /// # Errors
    /// Returns [`PlanError::DataIntegrity`] for out-of-range months, an
    /// unknown weekday, an unknown holiday name, or a zero session length.
    pub fn from_config(config: &Config) -> Result<Self> {
        let mut months = config.sessions.months.clone();
        months.sort_unstable();
        months.dedup();
        if months.is_empty() {
            return Err(PlanError::DataIntegrity(
                "no session months configured".to_string(),
            ));
        }
        if months.iter().any(|&m| !(1..=12).contains(&m)) {
            return Err(PlanError::DataIntegrity(format!(
                "session months out of range 1-12: {months:?}"
            )));
        }
        if config.sessions.weeks == 0 {
            return Err(PlanError::DataIntegrity(
                "session length must be at least one week".to_string(),
            ));
        }

        let start_weekday = parse_weekday(&config.sessions.start_weekday)?;

        let holidays = config
            .sessions
            .holidays
            .iter()
            .map(|name| {
                HolidayRule::from_name(name).ok_or_else(|| {
                    PlanError::DataIntegrity(format!("unknown holiday name: '{name}'"))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        if config.scheduling.max_attempts == 0 {
            return Err(PlanError::DataIntegrity(
                "scheduling.max_attempts must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            costs: CostRates {
                per_credit_undergrad: config.costs.per_credit_undergrad,
                per_credit_grad: config.costs.per_credit_grad,
                per_course_fee: config.costs.per_course_fee,
                per_session_fee: config.costs.per_session_fee,
                alumni_discount_percent: config.costs.alumni_discount_percent,
            },
            weights: PriorityWeights {
                capstone_penalty: config.priority.capstone_penalty,
                in_person_bonus: config.priority.in_person_bonus,
            },
            sessions: SessionSettings {
                months,
                weeks: config.sessions.weeks,
                start_weekday,
                holidays,
            },
            max_attempts: config.scheduling.max_attempts,
            intent_spread_rounds: config.scheduling.intent_spread_rounds,
        })
    }
}

fn parse_weekday(value: &str) -> Result<Weekday> {
    match value.to_ascii_lowercase().as_str() {
        "mon" | "monday" => Ok(Weekday::Mon),
        "tue" | "tuesday" => Ok(Weekday::Tue),
        "wed" | "wednesday" => Ok(Weekday::Wed),
        "thu" | "thursday" => Ok(Weekday::Thu),
        "fri" | "friday" => Ok(Weekday::Fri),
        "sat" | "saturday" => Ok(Weekday::Sat),
        "sun" | "sunday" => Ok(Weekday::Sun),
        other => Err(PlanError::DataIntegrity(format!(
            "unknown start weekday: '{other}'"
        ))),
    }
}
