//! Prerequisite graph and priority ranker
//!
//! Assigns each course a priority equal to the longest dependency chain
//! beneath it: a course nothing depends on sits at depth 0, and a course
//! required (directly or through an OR group) by a depth-`d` course sits at
//! depth `d + 1` or deeper. Traversal is an explicit-stack DFS with
//! three-color marking so cycle detection is a plain return value and stack
//! depth stays bounded.

use crate::core::config::PriorityWeights;
use crate::core::errors::{PlanError, Result};
use crate::core::models::Course;
use std::collections::HashMap;

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    InProgress,
    Done,
}

enum Frame {
    Visit(usize),
    Finish(usize),
}

/// Rank the given courses in place, then sort them by priority descending.
///
/// Ties keep insertion order (stable sort), so among equally-depended-upon
/// courses the catalog order wins. After depth assignment the configured
/// capstone penalty is subtracted and the in-person bonus added.
///
/// Unknown prerequisite ids (not in `courses`) are skipped; they model
/// cross-catalog or already-verified prerequisites, not an error.
///
/// # Errors
/// Returns [`PlanError::CyclicDependency`] naming the offending course when
/// the prerequisite graph has a cycle, regardless of traversal start order.
pub fn rank_courses(
    courses: &mut [Course],
    weights: &PriorityWeights,
    in_person: &[String],
) -> Result<()> {
    for course in courses.iter_mut() {
        course.priority = 0;
    }

    let depths = dependency_depths(courses)?;

    for (i, course) in courses.iter_mut().enumerate() {
        course.priority = depths[i];
        if course.capstone {
            course.priority -= weights.capstone_penalty;
        }
        if in_person.iter().any(|id| id == &course.id) {
            course.priority += weights.in_person_bonus;
        }
    }

    courses.sort_by(|a, b| b.priority.cmp(&a.priority));
    Ok(())
}

/// Compute the dependency depth of every course.
///
/// # Errors
/// Returns [`PlanError::CyclicDependency`] on a cyclic graph.
fn dependency_depths(courses: &[Course]) -> Result<Vec<i32>> {
    let index_of: HashMap<&str, usize> = courses
        .iter()
        .enumerate()
        .map(|(i, c)| (c.id.as_str(), i))
        .collect();

    // Edge prereq -> dependent, restricted to known courses
    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); courses.len()];
    for (i, course) in courses.iter().enumerate() {
        for term in &course.prereqs {
            for prereq_id in term.course_ids() {
                if let Some(&p) = index_of.get(prereq_id) {
                    if !dependents[p].contains(&i) {
                        dependents[p].push(i);
                    }
                }
            }
        }
    }

    let mut marks = vec![Mark::Unvisited; courses.len()];
    let mut depths = vec![0i32; courses.len()];
    let mut stack: Vec<Frame> = Vec::new();

    for start in 0..courses.len() {
        if marks[start] != Mark::Unvisited {
            continue;
        }
        stack.push(Frame::Visit(start));

        while let Some(frame) = stack.pop() {
            match frame {
                Frame::Visit(node) => {
                    if marks[node] != Mark::Unvisited {
                        continue;
                    }
                    marks[node] = Mark::InProgress;
                    stack.push(Frame::Finish(node));

                    for &dep in &dependents[node] {
                        match marks[dep] {
                            Mark::InProgress => {
                                return Err(PlanError::CyclicDependency {
                                    course: courses[dep].id.clone(),
                                });
                            }
                            Mark::Unvisited => stack.push(Frame::Visit(dep)),
                            Mark::Done => {}
                        }
                    }
                }
                Frame::Finish(node) => {
                    marks[node] = Mark::Done;
                    depths[node] = dependents[node]
                        .iter()
                        .map(|&dep| depths[dep] + 1)
                        .max()
                        .unwrap_or(0);
                }
            }
        }
    }

    Ok(depths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::CostRates;
    use crate::core::models::{Level, Requirement, Status};

    fn rates() -> CostRates {
        CostRates {
            per_credit_undergrad: 500.0,
            per_credit_grad: 700.0,
            per_course_fee: 100.0,
            per_session_fee: 40.0,
            alumni_discount_percent: 20.0,
        }
    }

    fn weights() -> PriorityWeights {
        PriorityWeights {
            capstone_penalty: 10,
            in_person_bonus: 10,
        }
    }

    fn course(id: &str, prereqs: Vec<Requirement>) -> Course {
        Course::new(
            id.to_string(),
            3,
            Status::None,
            Level::Undergraduate,
            prereqs,
            false,
            None,
            false,
            false,
            &rates(),
        )
        .unwrap()
    }

    fn req(id: &str) -> Requirement {
        Requirement::Course(id.to_string())
    }

    fn priority_of(courses: &[Course], id: &str) -> i32 {
        courses.iter().find(|c| c.id == id).unwrap().priority
    }

    #[test]
    fn test_chain_depths() {
        // C requires B requires A: A depth 2, B depth 1, C depth 0
        let mut courses = vec![
            course("A", vec![]),
            course("B", vec![req("A")]),
            course("C", vec![req("B")]),
        ];

        rank_courses(&mut courses, &weights(), &[]).unwrap();

        assert_eq!(priority_of(&courses, "A"), 2);
        assert_eq!(priority_of(&courses, "B"), 1);
        assert_eq!(priority_of(&courses, "C"), 0);
        assert_eq!(courses[0].id, "A");
    }

    #[test]
    fn test_prereq_never_below_dependent() {
        let mut courses = vec![
            course("A", vec![]),
            course("B", vec![req("A")]),
            course("C", vec![req("A"), req("B")]),
            course("D", vec![Requirement::AnyOf(vec![
                "B".to_string(),
                "C".to_string(),
            ])]),
        ];

        rank_courses(&mut courses, &weights(), &[]).unwrap();

        for c in &courses {
            for term in &c.prereqs {
                for pre in term.course_ids() {
                    assert!(
                        priority_of(&courses, pre) >= c.priority,
                        "{pre} ranked below its dependent {}",
                        c.id
                    );
                }
            }
        }
    }

    #[test]
    fn test_or_group_counts_as_dependency() {
        let mut courses = vec![
            course("ALT1", vec![]),
            course("ALT2", vec![]),
            course("TOP", vec![Requirement::AnyOf(vec![
                "ALT1".to_string(),
                "ALT2".to_string(),
            ])]),
        ];

        rank_courses(&mut courses, &weights(), &[]).unwrap();
        assert_eq!(priority_of(&courses, "ALT1"), 1);
        assert_eq!(priority_of(&courses, "ALT2"), 1);
    }

    #[test]
    fn test_cycle_detected_either_order() {
        let make = |first_is_a: bool| {
            let a = course("A", vec![req("B")]);
            let b = course("B", vec![req("A")]);
            if first_is_a { vec![a, b] } else { vec![b, a] }
        };

        for order in [true, false] {
            let mut courses = make(order);
            let result = rank_courses(&mut courses, &weights(), &[]);
            assert!(
                matches!(result, Err(PlanError::CyclicDependency { .. })),
                "cycle not detected with order {order}"
            );
        }
    }

    #[test]
    fn test_self_cycle_detected() {
        let mut courses = vec![course("A", vec![req("A")])];
        assert!(matches!(
            rank_courses(&mut courses, &weights(), &[]),
            Err(PlanError::CyclicDependency { course }) if course == "A"
        ));
    }

    #[test]
    fn test_unknown_prereq_skipped() {
        let mut courses = vec![course("A", vec![req("XFER999")])];
        rank_courses(&mut courses, &weights(), &[]).unwrap();
        assert_eq!(priority_of(&courses, "A"), 0);
    }

    #[test]
    fn test_capstone_and_in_person_adjustments() {
        let mut cap = course("CAP", vec![]);
        cap.capstone = true;
        let mut courses = vec![cap, course("BIO", vec![])];

        rank_courses(&mut courses, &weights(), &["BIO".to_string()]).unwrap();

        assert_eq!(priority_of(&courses, "CAP"), -10);
        assert_eq!(priority_of(&courses, "BIO"), 10);
        assert_eq!(courses[0].id, "BIO");
    }

    #[test]
    fn test_stable_tie_order() {
        let mut courses = vec![course("X", vec![]), course("Y", vec![]), course("Z", vec![])];
        rank_courses(&mut courses, &weights(), &[]).unwrap();
        let ids: Vec<&str> = courses.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, ["X", "Y", "Z"]);
    }
}
