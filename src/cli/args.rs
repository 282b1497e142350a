//! CLI argument definitions for `EnrollPlan`

use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use enroll_plan::config::ConfigOverrides;
use enroll_plan::logger::Level;

/// CLI log level argument
///
/// Represents log levels that can be passed via CLI arguments. Converts to
/// lowercase strings for config storage and to `logger::Level` for runtime use.
#[derive(Copy, Clone, Debug, ValueEnum, PartialEq, Eq)]
pub enum LogLevelArg {
    /// Error-level logging
    Error,
    /// Warning-level logging
    Warn,
    /// Info-level logging
    Info,
    /// Debug-level logging
    Debug,
}

impl From<LogLevelArg> for Level {
    fn from(arg: LogLevelArg) -> Self {
        match arg {
            LogLevelArg::Error => Self::Error,
            LogLevelArg::Warn => Self::Warn,
            LogLevelArg::Info => Self::Info,
            LogLevelArg::Debug => Self::Debug,
        }
    }
}

/// Report output format argument
#[derive(Copy, Clone, Debug, ValueEnum, PartialEq, Eq)]
pub enum ReportFormatArg {
    /// Markdown table
    Markdown,
    /// Comma-separated values
    Csv,
}

#[derive(Debug, Subcommand)]
pub enum ConfigSubcommand {
    /// Display configuration values.
    ///
    /// If a KEY is provided, displays only that configuration value.
    /// If no KEY is provided, displays all configuration values.
    Get {
        /// Optional configuration key to display (e.g., `logging.level`)
        #[arg(value_name = "KEY")]
        key: Option<String>,
    },
    /// Set a configuration value.
    Set {
        /// Configuration key to set
        #[arg(value_name = "KEY")]
        key: String,
        /// Value to set
        #[arg(value_name = "VALUE")]
        value: String,
    },
    /// Reset configuration to defaults.
    Reset,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage configuration.
    Config {
        /// Configuration action
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },
    /// Plan enrollment sessions from a course catalog CSV.
    Plan {
        /// Course catalog CSV file
        #[arg(value_name = "COURSES_CSV")]
        input: PathBuf,

        /// Target start date of the first session (YYYY-MM-DD); its month
        /// must be a configured session month
        #[arg(long, value_name = "DATE")]
        first_session: NaiveDate,

        /// Date the plan is computed as of (defaults to today)
        #[arg(long, value_name = "DATE")]
        as_of: Option<NaiveDate>,

        /// Grant dollars available per session
        #[arg(long, default_value_t = 0.0)]
        grants: f64,

        /// Yearly benefit allotment; enables benefit tracking
        #[arg(long, value_name = "DOLLARS")]
        benefit_yearly: Option<f64>,

        /// Benefit-year anniversary as MM-DD
        #[arg(long, value_name = "MM-DD", default_value = "08-01")]
        benefit_start: String,

        /// Remaining benefit months
        #[arg(long, default_value_t = 0)]
        benefit_months: u32,

        /// Remaining benefit days (added to months)
        #[arg(long, default_value_t = 0)]
        benefit_days: u32,

        /// In-person course ids
        #[arg(long, value_delimiter = ',', value_name = "IDS")]
        in_person: Vec<String>,

        /// Minimum in-person courses per qualifying session
        #[arg(long, value_name = "N")]
        min_in_person: Option<usize>,

        /// Last date in-person offerings exist
        #[arg(long, value_name = "DATE")]
        in_person_end: Option<NaiveDate>,

        /// Maximum learner-paid cost per session
        #[arg(long, value_name = "DOLLARS")]
        max_session_cost: Option<f64>,

        /// Minimum classes per session
        #[arg(long, default_value_t = 2)]
        min_classes: usize,

        /// Maximum classes per session
        #[arg(long, default_value_t = 4)]
        max_classes: usize,

        /// Allow scheduling beyond available benefits
        #[arg(long)]
        exceed_benefits: bool,

        /// Spread courses across exactly this many sessions
        #[arg(long, value_name = "N")]
        spread_between: Option<usize>,

        /// Output file (prints to stdout when omitted)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Report format
        #[arg(long, value_enum, default_value = "markdown")]
        format: ReportFormatArg,
    },
}

/// Top-level CLI arguments
#[derive(Debug, Parser)]
#[command(
    name = "enrollplan",
    about = "Plan course enrollment sessions under prerequisite, capacity, and benefit constraints",
    version
)]
pub struct Cli {
    /// Log level override
    #[arg(long, global = true, value_enum)]
    pub log_level: Option<LogLevelArg>,

    /// Enable debug logging
    #[arg(long = "debug", global = true)]
    pub debug_flag: bool,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Write logs to a file
    #[arg(long, global = true, value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Convert CLI flags into configuration overrides
    #[must_use]
    pub fn to_config_overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            level: self.log_level.map(|l| {
                match l {
                    LogLevelArg::Error => "error",
                    LogLevelArg::Warn => "warn",
                    LogLevelArg::Info => "info",
                    LogLevelArg::Debug => "debug",
                }
                .to_string()
            }),
            file: self
                .log_file
                .as_ref()
                .map(|p| p.to_string_lossy().into_owned()),
            verbose: self.verbose.then_some(true),
            reports_dir: None,
        }
    }
}
