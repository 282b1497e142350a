//! Command-line interface entry point for `EnrollPlan`

mod args;
mod commands;

use args::{Cli, Command};
use clap::Parser;
use enroll_plan::config::Config;
use enroll_plan::info;
use enroll_plan::logger::{enable_debug, enable_verbose, init_file_logging, set_level, Level};

fn main() {
    let args = Cli::parse();

    // Load configuration once at startup and apply CLI overrides to it
    let mut config = Config::load();
    config.apply_overrides(&args.to_config_overrides());

    // Effective runtime log level: CLI flag overrides config; fallback warn
    let effective_level = args
        .log_level
        .map(std::convert::Into::into)
        .or_else(|| parse_level(&config.logging.level))
        .unwrap_or(Level::Warn);

    let mut level = effective_level;
    if args.debug_flag || level == Level::Debug {
        level = Level::Debug;
        enable_debug();
    }

    // Verbose: enable if CLI flag OR config has verbose=true
    let verbose = args.verbose || config.logging.verbose;
    if verbose {
        enable_verbose();
    }
    set_level(level);

    // Initialize file logging: CLI flag wins, otherwise use config logging.file
    let config_log_path: Option<std::path::PathBuf> = if config.logging.file.is_empty() {
        None
    } else {
        Some(std::path::PathBuf::from(&config.logging.file))
    };

    if let Some(log_path) = args.log_file.as_ref().or(config_log_path.as_ref()) {
        let display_path = log_path.to_string_lossy();
        if init_file_logging(log_path) {
            if verbose {
                eprintln!("✓ File logging initialized at: {display_path}");
            } else {
                info!("File logging initialized at: {display_path}");
            }
        } else {
            eprintln!("✗ Failed to initialize file logging at: {display_path}");
        }
    }

    match args.command {
        Command::Config { subcommand } => {
            commands::config::run(subcommand, &mut config);
        }
        Command::Plan {
            input,
            first_session,
            as_of,
            grants,
            benefit_yearly,
            benefit_start,
            benefit_months,
            benefit_days,
            in_person,
            min_in_person,
            in_person_end,
            max_session_cost,
            min_classes,
            max_classes,
            exceed_benefits,
            spread_between,
            output,
            format,
        } => {
            let plan_args = commands::plan::PlanArgs {
                input,
                first_session,
                as_of,
                grants,
                benefit_yearly,
                benefit_start,
                benefit_months,
                benefit_days,
                in_person,
                min_in_person,
                in_person_end,
                max_session_cost,
                min_classes,
                max_classes,
                exceed_benefits,
                spread_between,
                output,
                format,
            };
            commands::plan::run(&plan_args, &config);
        }
    }
}

fn parse_level(val: &str) -> Option<Level> {
    match val.to_ascii_lowercase().as_str() {
        "error" => Some(Level::Error),
        "warn" => Some(Level::Warn),
        "info" => Some(Level::Info),
        "debug" => Some(Level::Debug),
        _ => None,
    }
}
