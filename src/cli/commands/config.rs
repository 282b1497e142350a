//! Config command handler

use crate::args::ConfigSubcommand;
use enroll_plan::config::Config;

/// Run the config subcommand against the loaded configuration.
pub fn run(subcommand: ConfigSubcommand, config: &mut Config) {
    match subcommand {
        ConfigSubcommand::Get { key } => match key {
            Some(key) => match get_value(config, &key) {
                Some(value) => println!("{key} = {value}"),
                None => eprintln!("✗ Unknown configuration key: {key}"),
            },
            None => print_all(config),
        },
        ConfigSubcommand::Set { key, value } => {
            if set_value(config, &key, &value) {
                match config.save() {
                    Ok(()) => println!("✓ {key} = {value}"),
                    Err(e) => eprintln!("✗ Failed to save configuration: {e}"),
                }
            } else {
                eprintln!("✗ Unknown or read-only configuration key: {key}");
            }
        }
        ConfigSubcommand::Reset => {
            *config = Config::from_defaults();
            match config.save() {
                Ok(()) => println!("✓ Configuration reset to defaults"),
                Err(e) => eprintln!("✗ Failed to save configuration: {e}"),
            }
        }
    }
}

fn print_all(config: &Config) {
    println!("logging.level = {}", config.logging.level);
    println!("logging.file = {}", config.logging.file);
    println!("logging.verbose = {}", config.logging.verbose);
    println!("paths.reports_dir = {}", config.paths.reports_dir);
    println!("sessions.weeks = {}", config.sessions.weeks);
    println!("sessions.start_weekday = {}", config.sessions.start_weekday);
    println!("scheduling.max_attempts = {}", config.scheduling.max_attempts);
}

fn get_value(config: &Config, key: &str) -> Option<String> {
    match key {
        "logging.level" => Some(config.logging.level.clone()),
        "logging.file" => Some(config.logging.file.clone()),
        "logging.verbose" => Some(config.logging.verbose.to_string()),
        "paths.reports_dir" => Some(config.paths.reports_dir.clone()),
        "sessions.weeks" => Some(config.sessions.weeks.to_string()),
        "sessions.start_weekday" => Some(config.sessions.start_weekday.clone()),
        "scheduling.max_attempts" => Some(config.scheduling.max_attempts.to_string()),
        _ => None,
    }
}

fn set_value(config: &mut Config, key: &str, value: &str) -> bool {
    match key {
        "logging.level" => {
            config.logging.level = value.to_string();
            true
        }
        "logging.file" => {
            config.logging.file = value.to_string();
            true
        }
        "logging.verbose" => value.parse().map(|v| config.logging.verbose = v).is_ok(),
        "paths.reports_dir" => {
            config.paths.reports_dir = value.to_string();
            true
        }
        "sessions.weeks" => value.parse().map(|v| config.sessions.weeks = v).is_ok(),
        "sessions.start_weekday" => {
            config.sessions.start_weekday = value.to_string();
            true
        }
        "scheduling.max_attempts" => value
            .parse()
            .map(|v| config.scheduling.max_attempts = v)
            .is_ok(),
        _ => false,
    }
}
