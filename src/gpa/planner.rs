use serde::{Deserialize, Serialize};

use super::engine::{compute_gpa, CourseEntry, GradePointMap, PreviousRecord};
use crate::policy::{NumericRange, PolicyFlags};

/// A named term in a multi-semester plan.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct PlannedSemester {
    pub name: String,
    #[serde(default)]
    pub courses: Vec<CourseEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SemesterOutcome {
    pub name: String,
    pub gpa: Option<f64>,
    pub earned_credits: f64,
    pub attempted_credits: f64,
    pub quality_points: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanSummary {
    pub semesters: Vec<SemesterOutcome>,
    /// Over every semester that produced a GPA
    pub cgpa: Option<f64>,
    pub attempted_credits: f64,
    pub earned_credits: f64,
}

/// Compute each semester on its own, then roll them into one CGPA.
///
/// Semesters are aggregated by quality points over GPA-denominator credits,
/// so the overall figure matches computing all courses in one go. This is not
/// the same as weighting each semester GPA by its earned credits: the two
/// differ whenever a semester has failed courses.
pub fn plan_semesters(
    semesters: &[PlannedSemester],
    grade_points: &GradePointMap,
    numeric_ranges: Option<&[NumericRange]>,
    flags: Option<&PolicyFlags>,
) -> PlanSummary {
    let no_previous = PreviousRecord::default();

    let outcomes: Vec<SemesterOutcome> = semesters
        .iter()
        .map(|semester| {
            let result = compute_gpa(
                &semester.courses,
                grade_points,
                false,
                &no_previous,
                numeric_ranges,
                flags,
            );
            SemesterOutcome {
                name: semester.name.clone(),
                gpa: result.current_gpa,
                earned_credits: result.current_credits,
                attempted_credits: result.attempted_credits,
                quality_points: result.quality_points,
            }
        })
        .collect();

    let (quality, attempted) = outcomes
        .iter()
        .filter(|s| s.gpa.is_some())
        .fold((0.0, 0.0), |(q, c), s| (q + s.quality_points, c + s.attempted_credits));
    let earned_credits = outcomes.iter().map(|s| s.earned_credits).sum();

    PlanSummary {
        cgpa: (attempted > 0.0).then(|| quality / attempted),
        attempted_credits: attempted,
        earned_credits,
        semesters: outcomes,
    }
}
