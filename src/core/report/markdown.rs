//! Markdown report generator

use crate::core::report::{ReportGenerator, ScheduleReport};
use crate::core::errors::{PlanError, Result};
use std::fmt::Write;
use std::fs;
use std::path::Path;

/// Embedded Markdown report template
const MARKDOWN_TEMPLATE: &str = include_str!("templates/schedule.md");

/// Markdown report generator
pub struct MarkdownReporter;

impl MarkdownReporter {
    /// Create a new Markdown reporter
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Render the report using template substitution
    fn render_template(report: &ScheduleReport) -> String {
        let mut output = MARKDOWN_TEMPLATE.to_string();

        output = output.replace("{{learner_id}}", &report.learner_id);
        output = output.replace("{{schedule_table}}", &Self::generate_schedule_table(report));
        output = output.replace("{{total_ch}}", &report.total_credit_hours().to_string());
        output = output.replace("{{total_cost}}", &format!("{:.2}", report.total_cost()));
        output = output.replace(
            "{{total_user_cost}}",
            &format!("{:.2}", report.total_learner_cost()),
        );

        output
    }

    /// Generate the per-session schedule table
    fn generate_schedule_table(report: &ScheduleReport) -> String {
        let mut table = String::new();

        table.push_str(
            "| Session | Start Date | Courses | Intent Courses | Total CH | Total Cost | User Cost |\n",
        );
        table.push_str("|---|---|---|---|---|---|---|\n");

        for row in &report.rows {
            let _ = writeln!(
                table,
                "| {} | {} | {} | {} | {} | {:.2} | {:.2} |",
                row.number,
                row.start_date,
                row.courses.join(", "),
                row.intent.join(", "),
                row.credit_hours,
                row.gross_cost,
                row.learner_cost
            );
        }

        table
    }
}

impl Default for MarkdownReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportGenerator for MarkdownReporter {
    fn generate(&self, report: &ScheduleReport, output_path: &Path) -> Result<()> {
        let content = self.render(report)?;
        fs::write(output_path, content).map_err(|e| {
            PlanError::DataIntegrity(format!(
                "cannot write report {}: {e}",
                output_path.display()
            ))
        })
    }

    fn render(&self, report: &ScheduleReport) -> Result<String> {
        Ok(Self::render_template(report))
    }
}
