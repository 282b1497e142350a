//! Course-record intake
//!
//! Parses the course catalog CSV into validated [`Course`] records: header
//! names are matched case-insensitively, prerequisite expressions like
//! `A|B|[C|D]` become AND terms and OR groups, and enumerated fields are
//! checked against their domains. The planning core never sees a malformed
//! record.

use crate::core::config::CostRates;
use crate::core::errors::{PlanError, Result};
use crate::core::models::{Course, Level, Requirement, Status};
use std::fs;
use std::path::Path;

/// Parse a course catalog CSV into an ordered course list.
///
/// Expected columns (case-insensitive): `Course ID`, `Credit Hours`,
/// `Status`, `Level`, `PreReqs`, `Capstone`, `Session`, `Transfer Intent`,
/// `Challenge Intent`. Missing optional columns default to empty/false.
///
/// # Errors
/// Returns [`PlanError::DataIntegrity`] when the file cannot be read, the
/// header is missing, or any row fails validation.
pub fn parse_courses_csv<P: AsRef<Path>>(path: P, rates: &CostRates) -> Result<Vec<Course>> {
    let content = fs::read_to_string(&path).map_err(|e| {
        PlanError::DataIntegrity(format!(
            "cannot read course file {}: {e}",
            path.as_ref().display()
        ))
    })?;
    parse_courses_str(&content, rates)
}

/// Parse course records from CSV text. See [`parse_courses_csv`].
///
/// # Errors
/// Returns [`PlanError::DataIntegrity`] on a missing header or invalid row.
pub fn parse_courses_str(content: &str, rates: &CostRates) -> Result<Vec<Course>> {
    let mut lines = content.lines().filter(|l| !l.trim().is_empty());

    let header_line = lines
        .next()
        .ok_or_else(|| PlanError::DataIntegrity("course file is empty".to_string()))?;
    let headers = parse_csv_line(header_line);

    let mut courses = Vec::new();
    for (row, line) in lines.enumerate() {
        let course = parse_course_line(line, &headers, rates)
            .map_err(|e| PlanError::DataIntegrity(format!("row {}: {e}", row + 2)))?;
        courses.push(course);
    }

    // Duplicate ids would corrupt the prerequisite graph
    for (i, course) in courses.iter().enumerate() {
        if courses[..i].iter().any(|c| c.id == course.id) {
            return Err(PlanError::DataIntegrity(format!(
                "duplicate course id '{}'",
                course.id
            )));
        }
    }

    Ok(courses)
}

/// Convert a prereq expression like `A|B|[C|D]` into requirement terms.
/// Bracketed groups become OR terms; everything else is an AND term.
#[must_use]
pub fn parse_prereq_expr(expr: &str) -> Vec<Requirement> {
    let trimmed = expr.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("none") {
        return Vec::new();
    }

    let mut terms = Vec::new();
    let mut rest = trimmed;

    while !rest.is_empty() {
        if let Some(stripped) = rest.strip_prefix('[') {
            let Some(close) = stripped.find(']') else {
                // Unbalanced bracket: treat the remainder as one OR group
                terms.push(or_group(stripped));
                break;
            };
            terms.push(or_group(&stripped[..close]));
            rest = stripped[close + 1..].trim_start_matches('|');
        } else {
            let (token, tail) = rest.split_once('|').unwrap_or((rest, ""));
            let token = token.trim();
            if !token.is_empty() {
                terms.push(Requirement::Course(token.to_string()));
            }
            rest = tail;
        }
    }

    terms
}

fn or_group(inner: &str) -> Requirement {
    Requirement::AnyOf(
        inner
            .split('|')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(ToString::to_string)
            .collect(),
    )
}

fn parse_course_line(line: &str, headers: &[String], rates: &CostRates) -> Result<Course> {
    let id = get_field(line, "Course ID", headers)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| PlanError::DataIntegrity("missing course id".to_string()))?;

    let credit_hours = get_field(line, "Credit Hours", headers)
        .unwrap_or("")
        .trim()
        .parse::<u32>()
        .map_err(|_| PlanError::DataIntegrity(format!("'{id}': invalid credit hours")))?;

    let status = parse_status(get_field(line, "Status", headers).unwrap_or(""))?;
    let level = parse_level(get_field(line, "Level", headers).unwrap_or(""))?;
    let prereqs = parse_prereq_expr(get_field(line, "PreReqs", headers).unwrap_or(""));
    let capstone = parse_flag(get_field(line, "Capstone", headers).unwrap_or(""));
    let transfer_intent = parse_flag(get_field(line, "Transfer Intent", headers).unwrap_or(""));
    let challenge_intent = parse_flag(get_field(line, "Challenge Intent", headers).unwrap_or(""));

    let session = match get_field(line, "Session", headers).map(str::trim) {
        None | Some("") => None,
        Some(raw) => Some(raw.parse::<u32>().map_err(|_| {
            PlanError::DataIntegrity(format!("'{id}': invalid session number '{raw}'"))
        })?),
    };

    if session.is_some_and(|n| n == 0) {
        return Err(PlanError::DataIntegrity(format!(
            "'{id}': session numbers start at 1"
        )));
    }
    if status == Status::InProgress && session.is_none() {
        return Err(PlanError::DataIntegrity(format!(
            "'{id}': in-progress courses must carry a session number"
        )));
    }

    Course::new(
        id.to_string(),
        credit_hours,
        status,
        level,
        prereqs,
        capstone,
        session,
        transfer_intent,
        challenge_intent,
        rates,
    )
}

fn parse_status(value: &str) -> Result<Status> {
    match value.trim().to_ascii_lowercase().as_str() {
        "" | "none" => Ok(Status::None),
        "inprocess" | "in_progress" | "in progress" | "inprogress" => Ok(Status::InProgress),
        "complete" | "completed" => Ok(Status::Completed),
        other => Err(PlanError::DataIntegrity(format!(
            "unknown status: '{other}'"
        ))),
    }
}

fn parse_level(value: &str) -> Result<Level> {
    match value.trim().to_ascii_lowercase().as_str() {
        "undergrad" | "undergraduate" => Ok(Level::Undergraduate),
        "grad" | "graduate" => Ok(Level::Graduate),
        other => Err(PlanError::DataIntegrity(format!("unknown level: '{other}'"))),
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "true" | "yes" | "y" | "1" | "x"
    )
}

/// Parse a CSV line into fields
fn parse_csv_line(line: &str) -> Vec<String> {
    line.split(',')
        .map(str::trim)
        .map(std::string::ToString::to_string)
        .collect()
}

/// Get a field value from a CSV line by header name
fn get_field<'a>(line: &'a str, header_name: &str, headers: &[String]) -> Option<&'a str> {
    let fields: Vec<&str> = line.split(',').map(str::trim).collect();

    headers
        .iter()
        .position(|h| h.eq_ignore_ascii_case(header_name))
        .and_then(|idx| fields.get(idx))
        .copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rates() -> CostRates {
        CostRates {
            per_credit_undergrad: 514.0,
            per_credit_grad: 776.0,
            per_course_fee: 100.0,
            per_session_fee: 40.0,
            alumni_discount_percent: 20.0,
        }
    }

    const HEADER: &str =
        "Course ID,Credit Hours,Status,Level,PreReqs,Capstone,Session,Transfer Intent,Challenge Intent";

    #[test]
    fn test_parse_prereq_expr() {
        assert!(parse_prereq_expr("").is_empty());
        assert!(parse_prereq_expr("none").is_empty());

        let terms = parse_prereq_expr("A|B|[C|D]|E");
        assert_eq!(
            terms,
            vec![
                Requirement::Course("A".to_string()),
                Requirement::Course("B".to_string()),
                Requirement::AnyOf(vec!["C".to_string(), "D".to_string()]),
                Requirement::Course("E".to_string()),
            ]
        );
    }

    #[test]
    fn test_parse_prereq_expr_group_only() {
        let terms = parse_prereq_expr("[MATH101|MATH105]");
        assert_eq!(
            terms,
            vec![Requirement::AnyOf(vec![
                "MATH101".to_string(),
                "MATH105".to_string()
            ])]
        );
    }

    #[test]
    fn test_parse_basic_rows() {
        let content = format!(
            "{HEADER}\n\
             ENG101,3,none,undergrad,,false,,false,false\n\
             CS201,4,none,undergrad,ENG101,false,,false,false\n\
             CS499,3,none,undergrad,[CS201|ENG101],true,,false,false"
        );

        let courses = parse_courses_str(&content, &rates()).unwrap();
        assert_eq!(courses.len(), 3);
        assert_eq!(courses[0].id, "ENG101");
        assert!(courses[0].prereqs.is_empty());
        assert_eq!(
            courses[1].prereqs,
            vec![Requirement::Course("ENG101".to_string())]
        );
        assert!(courses[2].capstone);
    }

    #[test]
    fn test_parse_status_and_session() {
        let content = format!(
            "{HEADER}\n\
             HIS101,3,completed,undergrad,,false,2,false,false\n\
             SOC101,3,inprocess,undergrad,,false,3,false,false"
        );

        let courses = parse_courses_str(&content, &rates()).unwrap();
        assert_eq!(courses[0].status, Status::Completed);
        assert_eq!(courses[0].session, Some(2));
        assert_eq!(courses[1].status, Status::InProgress);
    }

    #[test]
    fn test_parse_intent_flags() {
        let content = format!(
            "{HEADER}\n\
             SOPH1,3,none,undergrad,,false,,true,false\n\
             CHAL1,3,none,grad,,false,,false,yes"
        );

        let courses = parse_courses_str(&content, &rates()).unwrap();
        assert!(courses[0].transfer_intent);
        assert!(courses[1].challenge_intent);
        assert_eq!(courses[1].level, Level::Graduate);
    }

    #[test]
    fn test_invalid_rows_rejected() {
        for bad in [
            format!("{HEADER}\nX1,three,none,undergrad,,false,,false,false"),
            format!("{HEADER}\nX1,3,enrolled,undergrad,,false,,false,false"),
            format!("{HEADER}\nX1,3,none,doctoral,,false,,false,false"),
            format!("{HEADER}\nX1,3,none,undergrad,,false,0,false,false"),
            format!("{HEADER}\nX1,3,inprocess,undergrad,,false,,false,false"),
            format!("{HEADER}\n,3,none,undergrad,,false,,false,false"),
        ] {
            assert!(
                matches!(
                    parse_courses_str(&bad, &rates()),
                    Err(PlanError::DataIntegrity(_))
                ),
                "accepted invalid input: {bad}"
            );
        }
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let content = format!(
            "{HEADER}\n\
             ENG101,3,none,undergrad,,false,,false,false\n\
             ENG101,3,none,undergrad,,false,,false,false"
        );
        assert!(parse_courses_str(&content, &rates()).is_err());
    }

    #[test]
    fn test_header_case_insensitive() {
        let content = "course id,credit hours,status,level,prereqs,capstone,session,transfer intent,challenge intent\n\
                       ENG101,3,none,undergrad,,false,,false,false";
        let courses = parse_courses_str(content, &rates()).unwrap();
        assert_eq!(courses[0].id, "ENG101");
    }
}
