//! CSV report generator

use crate::core::errors::{PlanError, Result};
use crate::core::report::{ReportGenerator, ScheduleReport};
use std::fmt::Write;
use std::fs;
use std::path::Path;

/// CSV report generator. Course lists within a cell are joined with `;`.
pub struct CsvReporter;

impl CsvReporter {
    /// Create a new CSV reporter
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Default for CsvReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportGenerator for CsvReporter {
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
        let mut output = String::new();
        output.push_str("Session,Start Date,Courses,Intent Courses,Total CH,Total Cost,User Cost\n");

        for row in &report.rows {
            let _ = writeln!(
                output,
                "{},{},{},{},{},{:.2},{:.2}",
                row.number,
                row.start_date,
                row.courses.join(";"),
                row.intent.join(";"),
                row.credit_hours,
                row.gross_cost,
                row.learner_cost
            );
        }

        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::report::tests::sample_user;

    #[test]
    fn test_csv_render() {
        let report = ScheduleReport::from_user(&sample_user());
        let rendered = CsvReporter::new().render(&report).unwrap();

        let mut lines = rendered.lines();
        assert_eq!(
            lines.next().unwrap(),
            "Session,Start Date,Courses,Intent Courses,Total CH,Total Cost,User Cost"
        );
        assert_eq!(
            lines.next().unwrap(),
            "1,2025-09-07,ENG101;HIS101,SOC101,6,3240.00,2240.00"
        );
    }
}
