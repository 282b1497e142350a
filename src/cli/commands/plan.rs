//! Plan command handler

use crate::args::ReportFormatArg;
use chrono::NaiveDate;
use enroll_plan::config::{Config, PlannerSettings};
use enroll_plan::errors::{PlanError, Result};
use enroll_plan::intake::parse_courses_csv;
use enroll_plan::ledger::BenefitLedger;
use enroll_plan::models::{Restraints, User};
use enroll_plan::report::{CsvReporter, MarkdownReporter, ReportGenerator, ScheduleReport};
use enroll_plan::scheduler::Scheduler;
use enroll_plan::{error, info};
use std::path::{Path, PathBuf};

/// Everything the plan command needs beyond the shared config.
#[allow(clippy::module_name_repetitions)]
pub struct PlanArgs {
    /// Course catalog CSV path.
    pub input: PathBuf,
    /// Target first-session date.
    pub first_session: NaiveDate,
    /// Planning as-of date.
    pub as_of: Option<NaiveDate>,
    /// Grant dollars per session.
    pub grants: f64,
    /// Yearly benefit allotment, when benefits are tracked.
    pub benefit_yearly: Option<f64>,
    /// Benefit anniversary as MM-DD.
    pub benefit_start: String,
    /// Remaining benefit months.
    pub benefit_months: u32,
    /// Remaining benefit days.
    pub benefit_days: u32,
    /// In-person course ids.
    pub in_person: Vec<String>,
    /// Minimum in-person courses per qualifying session.
    pub min_in_person: Option<usize>,
    /// In-person cutoff date.
    pub in_person_end: Option<NaiveDate>,
    /// Per-session learner cost ceiling.
    pub max_session_cost: Option<f64>,
    /// Minimum classes per session.
    pub min_classes: usize,
    /// Maximum classes per session.
    pub max_classes: usize,
    /// Allow exceeding benefits.
    pub exceed_benefits: bool,
    /// Fixed session count to spread across.
    pub spread_between: Option<usize>,
    /// Output path; stdout when absent.
    pub output: Option<PathBuf>,
    /// Report format.
    pub format: ReportFormatArg,
}

/// Run the plan command end to end.
pub fn run(args: &PlanArgs, config: &Config) {
    if let Err(e) = execute(args, config) {
        error!("Planning failed for {}: {e}", args.input.display());
        eprintln!("✗ {e}");
        std::process::exit(1);
    }
}

fn execute(args: &PlanArgs, config: &Config) -> Result<()> {
    let settings = PlannerSettings::from_config(config)?;
    let courses = parse_courses_csv(&args.input, &settings.costs)?;
    info!("Loaded {} courses from {}", courses.len(), args.input.display());

    let as_of = args
        .as_of
        .unwrap_or_else(|| chrono::Local::now().date_naive());

    let ledger = match args.benefit_yearly {
        Some(yearly) => Some(BenefitLedger::new(
            yearly,
            parse_month_day(&args.benefit_start)?,
            (args.benefit_months, args.benefit_days),
            as_of,
        )?),
        None => None,
    };

    let restraints = Restraints {
        in_person_courses: args.in_person.clone(),
        min_in_person: args.min_in_person,
        max_in_person: None,
        in_person_end_date: args.in_person_end,
        max_session_cost: args.max_session_cost,
        min_classes: args.min_classes,
        max_classes: args.max_classes,
        exceed_benefits: args.exceed_benefits,
        spread_between: args.spread_between,
    };

    let learner_id = args
        .input
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("learner")
        .to_string();

    let mut user = User::new(
        learner_id,
        args.first_session,
        as_of,
        courses,
        args.grants,
        ledger,
    );

    Scheduler::new(&settings, &restraints).run(&mut user)?;

    if let Some(ledger) = &user.ledger {
        enroll_plan::verbose!(
            "Benefits remaining: {} days, {:.2} in the active benefit year",
            ledger.remaining_days(),
            ledger.year_remaining(ledger.as_of()).unwrap_or(0.0)
        );
    }

    let report = ScheduleReport::from_user(&user);
    let rendered = match args.format {
        ReportFormatArg::Markdown => MarkdownReporter::new().render(&report)?,
        ReportFormatArg::Csv => CsvReporter::new().render(&report)?,
    };

    match &args.output {
        Some(path) => {
            write_report(path, &rendered)?;
            println!("✓ Schedule written to: {}", path.display());
        }
        None => print!("{rendered}"),
    }

    Ok(())
}

fn write_report(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| {
                PlanError::DataIntegrity(format!(
                    "cannot create output directory {}: {e}",
                    parent.display()
                ))
            })?;
        }
    }
    std::fs::write(path, content).map_err(|e| {
        PlanError::DataIntegrity(format!("cannot write {}: {e}", path.display()))
    })
}

fn parse_month_day(value: &str) -> Result<(u32, u32)> {
    let invalid =
        || PlanError::DataIntegrity(format!("benefit start must be MM-DD, got '{value}'"));

    let (month, day) = value.split_once('-').ok_or_else(invalid)?;
    let month: u32 = month.parse().map_err(|_| invalid())?;
    let day: u32 = day.parse().map_err(|_| invalid())?;
    if !(1..=12).contains(&month) || !(1..=31).contains(&day) {
        return Err(invalid());
    }
    Ok((month, day))
}
