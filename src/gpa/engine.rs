use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use tracing::trace;

use super::interpretation::Interpretation;
use super::numeric::NumericInput;
use crate::policy::{GradePoint, NumericRange, PolicyFlags};

/// Grade label used as the earned-credit threshold when a policy names none.
pub const DEFAULT_EARNED_GRADE_MIN: &str = "D";

/// One row of a course sheet. Any field may be missing or half-typed.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct CourseEntry {
    #[serde(default)]
    pub credits: NumericInput,

    #[serde(default, deserialize_with = "blank_if_null")]
    pub grade: String,

    /// Numeric mark; overrides `grade` when the institution has numeric ranges
    #[serde(default, skip_serializing_if = "NumericInput::is_absent")]
    pub score: NumericInput,
}

/// A `grade:` left empty in YAML reads as null; treat it as a blank grade.
fn blank_if_null<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

impl CourseEntry {
    pub fn new(credits: impl Into<NumericInput>, grade: &str) -> Self {
        Self {
            credits: credits.into(),
            grade: grade.to_string(),
            score: NumericInput::Absent,
        }
    }

    pub fn with_score(mut self, score: impl Into<NumericInput>) -> Self {
        self.score = score.into();
        self
    }
}

/// Earlier aggregated record folded into the cumulative figure.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct PreviousRecord {
    #[serde(default)]
    pub cgpa: NumericInput,
    #[serde(default)]
    pub credits: NumericInput,
}

impl PreviousRecord {
    pub fn new(cgpa: impl Into<NumericInput>, credits: impl Into<NumericInput>) -> Self {
        Self {
            cgpa: cgpa.into(),
            credits: credits.into(),
        }
    }

    /// `(cgpa, credits)` when both are usable and credits are positive.
    fn usable(&self) -> Option<(f64, f64)> {
        let cgpa = self.cgpa.value()?;
        let credits = self.credits.value().filter(|c| *c > 0.0)?;
        Some((cgpa, credits))
    }
}

/// Grade label to grade point lookup built from a grading scale.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GradePointMap(HashMap<String, f64>);

impl GradePointMap {
    /// Later duplicates replace earlier ones; registry validation rejects
    /// duplicate labels before a scale gets here.
    pub fn from_scale(scale: &[GradePoint]) -> Self {
        scale.iter().map(|g| (g.grade.clone(), g.point)).collect()
    }

    pub fn get(&self, grade: &str) -> Option<f64> {
        self.0.get(grade).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Highest point on the scale, or 4.0 for an empty scale.
    pub fn max_point(&self) -> f64 {
        self.0.values().copied().reduce(f64::max).unwrap_or(4.0)
    }
}

impl<S: Into<String>> FromIterator<(S, f64)> for GradePointMap {
    fn from_iter<I: IntoIterator<Item = (S, f64)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(g, p)| (g.into(), p)).collect())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComputeResult {
    /// Term GPA, `None` when no course reached the denominator
    pub current_gpa: Option<f64>,
    /// Term plus previous record, `None` when the combined denominator is zero
    pub cumulative_gpa: Option<f64>,
    /// Earned credits of this term (grade at or above the earned minimum)
    pub current_credits: f64,
    /// Denominator of `cumulative_gpa`
    pub total_credits: f64,
    pub interpretation: Interpretation,
    /// Σ credits × point over this term's resolved courses
    pub quality_points: f64,
    /// Denominator of `current_gpa`
    pub attempted_credits: f64,
}

/// Compute term GPA and cumulative CGPA.
///
/// Never fails: unusable credits, unknown grades and an incomplete previous
/// record simply contribute nothing, and empty denominators yield `None`.
pub fn compute_gpa(
    courses: &[CourseEntry],
    grade_points: &GradePointMap,
    include_previous: bool,
    previous: &PreviousRecord,
    numeric_ranges: Option<&[NumericRange]>,
    flags: Option<&PolicyFlags>,
) -> ComputeResult {
    let exclude_fail = flags.is_some_and(|f| f.exclude_fail_from_denominator);
    let earned_min_point = earned_min_point(grade_points, flags);

    let mut quality_points = 0.0;
    let mut credit_sum = 0.0;
    let mut earned_credits = 0.0;

    for (index, course) in courses.iter().enumerate() {
        let Some(credits) = course.credits.value().filter(|c| *c > 0.0) else {
            trace!(index, "skipping course without positive credits");
            continue;
        };

        let grade = effective_grade(course, numeric_ranges);
        let Some(point) = grade_points.get(grade.trim()) else {
            trace!(index, grade, "skipping course with unknown grade");
            continue;
        };

        quality_points += credits * point;

        if !(exclude_fail && point == 0.0) {
            credit_sum += credits;
        }

        if point >= earned_min_point {
            earned_credits += credits;
        }
    }

    let current_gpa = (credit_sum > 0.0).then(|| quality_points / credit_sum);

    let (previous_quality, previous_credits) = match previous.usable() {
        Some((cgpa, credits)) if include_previous => (cgpa * credits, credits),
        _ => (0.0, 0.0),
    };

    let total_credits = credit_sum + previous_credits;
    let cumulative_gpa =
        (total_credits > 0.0).then(|| (previous_quality + quality_points) / total_credits);

    ComputeResult {
        current_gpa,
        cumulative_gpa,
        current_credits: earned_credits,
        total_credits,
        interpretation: Interpretation::from_value(cumulative_gpa.or(current_gpa)),
        quality_points,
        attempted_credits: credit_sum,
    }
}

/// Point value a grade must reach for its credits to count as earned.
///
/// Falls back to "D", and to 0.0 when that label is not on the scale, which
/// means every resolved grade (fails included) counts as earned.
pub fn earned_min_point(grade_points: &GradePointMap, flags: Option<&PolicyFlags>) -> f64 {
    let label = flags
        .and_then(|f| f.earned_grade_min.as_deref())
        .unwrap_or(DEFAULT_EARNED_GRADE_MIN);
    grade_points.get(label).unwrap_or(0.0)
}

/// Grade label used for lookup: the first range containing a usable score,
/// else the literal grade.
fn effective_grade<'a>(course: &'a CourseEntry, numeric_ranges: Option<&'a [NumericRange]>) -> &'a str {
    let matched = numeric_ranges.zip(course.score.value()).and_then(|(ranges, score)| {
        ranges.iter().find(|r| r.contains(score))
    });

    match matched {
        Some(range) => range.grade.as_str(),
        None => course.grade.as_str(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn map(entries: &[(&str, f64)]) -> GradePointMap {
        entries.iter().map(|(g, p)| (*g, *p)).collect()
    }

    fn standard_map() -> GradePointMap {
        map(&[("A+", 4.0), ("A", 3.75), ("B", 3.0), ("C", 2.25), ("D", 2.0), ("F", 0.0)])
    }

    fn no_previous() -> PreviousRecord {
        PreviousRecord::default()
    }

    fn range(grade: &str, min: f64, max: f64) -> NumericRange {
        NumericRange { grade: grade.to_string(), min, max }
    }

    fn flags(exclude_fail: bool, earned_min: Option<&str>) -> PolicyFlags {
        PolicyFlags {
            exclude_fail_from_denominator: exclude_fail,
            earned_grade_min: earned_min.map(str::to_string),
            ..PolicyFlags::default()
        }
    }

    #[test]
    fn test_single_course() {
        let courses = vec![CourseEntry::new(3.0, "A")];
        let result = compute_gpa(&courses, &map(&[("A", 3.75)]), false, &no_previous(), None, None);
        assert_eq!(result.current_gpa, Some(3.75));
        assert_eq!(result.cumulative_gpa, Some(3.75));
        assert_eq!(result.current_credits, 3.0);
        assert_eq!(result.total_credits, 3.0);
        assert_eq!(result.interpretation, Interpretation::Outstanding);
    }

    #[test]
    fn test_excluded_fail_leaves_no_denominator() {
        let courses = vec![CourseEntry::new(3.0, "F")];
        let result = compute_gpa(
            &courses,
            &map(&[("F", 0.0)]),
            false,
            &no_previous(),
            None,
            Some(&flags(true, None)),
        );
        assert_eq!(result.current_gpa, None);
        assert_eq!(result.cumulative_gpa, None);
        assert_eq!(result.quality_points, 0.0);
        assert_eq!(result.interpretation, Interpretation::NoData);
    }

    #[test]
    fn test_blank_credits_are_skipped() {
        let courses = vec![CourseEntry::new("3", "B"), CourseEntry::new("", "A")];
        let result = compute_gpa(&courses, &standard_map(), false, &no_previous(), None, None);
        assert_eq!(result.current_gpa, Some(3.0));
        assert_eq!(result.cumulative_gpa, Some(3.0));
        assert_eq!(result.current_credits, 3.0);
        assert_eq!(result.total_credits, 3.0);
    }

    #[test]
    fn test_weighted_average() {
        let courses = vec![CourseEntry::new(3.0, "A+"), CourseEntry::new(1.0, "F")];
        let result = compute_gpa(&courses, &standard_map(), false, &no_previous(), None, None);
        assert_eq!(result.current_gpa, Some(3.0)); // (12 + 0) / 4
        assert_eq!(result.attempted_credits, 4.0);
    }

    #[test]
    fn test_zero_negative_and_garbage_credits_are_skipped() {
        let courses = vec![
            CourseEntry::new(0.0, "A"),
            CourseEntry::new(-3.0, "A"),
            CourseEntry::new("abc", "A"),
            CourseEntry::new(NumericInput::Absent, "A"),
            CourseEntry::new(f64::NAN, "A"),
        ];
        let result = compute_gpa(&courses, &standard_map(), false, &no_previous(), None, None);
        assert_eq!(result.current_gpa, None);
        assert_eq!(result.current_credits, 0.0);
        assert_eq!(result.total_credits, 0.0);
    }

    #[test]
    fn test_unknown_and_blank_grades_are_skipped() {
        let courses = vec![
            CourseEntry::new(3.0, "Z"),
            CourseEntry::new(3.0, ""),
            CourseEntry::new(3.0, "a"), // lookup is case-sensitive
            CourseEntry::new(2.0, "B"),
        ];
        let result = compute_gpa(&courses, &standard_map(), false, &no_previous(), None, None);
        assert_eq!(result.current_gpa, Some(3.0));
        assert_eq!(result.attempted_credits, 2.0);
    }

    #[test]
    fn test_grade_is_trimmed_before_lookup() {
        let courses = vec![CourseEntry::new(3.0, "  B ")];
        let result = compute_gpa(&courses, &standard_map(), false, &no_previous(), None, None);
        assert_eq!(result.current_gpa, Some(3.0));
    }

    #[test]
    fn test_exclude_fail_changes_denominator_only() {
        let courses = vec![CourseEntry::new(2.0, "F"), CourseEntry::new(3.0, "A")];
        let grades = standard_map();
        let kept = compute_gpa(&courses, &grades, false, &no_previous(), None, Some(&flags(false, None)));
        let dropped = compute_gpa(&courses, &grades, false, &no_previous(), None, Some(&flags(true, None)));

        assert_eq!(kept.quality_points, dropped.quality_points);
        assert_eq!(kept.attempted_credits - dropped.attempted_credits, 2.0);
        assert_eq!(kept.current_gpa, Some(11.25 / 5.0));
        assert_eq!(dropped.current_gpa, Some(3.75));
    }

    #[test]
    fn test_score_overrides_literal_grade() {
        let ranges = vec![range("A+", 80.0, 100.0), range("F", 0.0, 79.999)];
        let courses = vec![CourseEntry::new(3.0, "F").with_score(85.0)];
        let result = compute_gpa(&courses, &standard_map(), false, &no_previous(), Some(&ranges), None);
        assert_eq!(result.current_gpa, Some(4.0));
    }

    #[test]
    fn test_textual_score_is_coerced() {
        let ranges = vec![range("A+", 80.0, 100.0)];
        let courses = vec![CourseEntry::new("3", "").with_score(" 92 ")];
        let result = compute_gpa(&courses, &standard_map(), false, &no_previous(), Some(&ranges), None);
        assert_eq!(result.current_gpa, Some(4.0));
    }

    #[test]
    fn test_unmatched_score_falls_back_to_grade() {
        let ranges = vec![range("A+", 80.0, 100.0)];
        let courses = vec![CourseEntry::new(3.0, "B").with_score(50.0)];
        let result = compute_gpa(&courses, &standard_map(), false, &no_previous(), Some(&ranges), None);
        assert_eq!(result.current_gpa, Some(3.0));
    }

    #[test]
    fn test_blank_score_does_not_match_zero_band() {
        let ranges = vec![range("F", 0.0, 39.999)];
        let courses = vec![CourseEntry::new(3.0, "B").with_score("")];
        let result = compute_gpa(&courses, &standard_map(), false, &no_previous(), Some(&ranges), None);
        assert_eq!(result.current_gpa, Some(3.0));
    }

    #[test]
    fn test_score_ignored_without_ranges() {
        let courses = vec![CourseEntry::new(3.0, "B").with_score(95.0)];
        let result = compute_gpa(&courses, &standard_map(), false, &no_previous(), None, None);
        assert_eq!(result.current_gpa, Some(3.0));
    }

    #[test]
    fn test_first_overlapping_range_wins() {
        let ranges = vec![range("A+", 90.0, 100.0), range("A", 90.0, 100.0)];
        let courses = vec![CourseEntry::new(3.0, "").with_score(95.0)];
        let result = compute_gpa(&courses, &standard_map(), false, &no_previous(), Some(&ranges), None);
        assert_eq!(result.current_gpa, Some(4.0));
    }

    #[test]
    fn test_previous_record_aggregation() {
        let grades = map(&[("X", 3.0)]);
        let courses = vec![CourseEntry::new(4.0, "X")];
        let previous = PreviousRecord::new(3.0, 30.0);
        let result = compute_gpa(&courses, &grades, true, &previous, None, None);
        assert_eq!(result.quality_points, 12.0);
        assert_eq!(result.current_gpa, Some(3.0));
        assert_eq!(result.cumulative_gpa, Some((3.0 * 30.0 + 12.0) / (30.0 + 4.0)));
        assert_eq!(result.total_credits, 34.0);
        assert_eq!(result.current_credits, 4.0);
    }

    #[test]
    fn test_previous_record_from_text() {
        let previous = PreviousRecord::new(" 3.5", "20 ");
        let result = compute_gpa(&[], &standard_map(), true, &previous, None, None);
        assert_eq!(result.current_gpa, None);
        assert_eq!(result.cumulative_gpa, Some(3.5));
        assert_eq!(result.total_credits, 20.0);
        assert_eq!(result.interpretation, Interpretation::Strong);
    }

    #[test]
    fn test_previous_record_ignored_when_not_included() {
        let courses = vec![CourseEntry::new(3.0, "B")];
        let previous = PreviousRecord::new(4.0, 30.0);
        let result = compute_gpa(&courses, &standard_map(), false, &previous, None, None);
        assert_eq!(result.cumulative_gpa, Some(3.0));
        assert_eq!(result.total_credits, 3.0);
    }

    #[test]
    fn test_incomplete_previous_record_ignored() {
        let courses = vec![CourseEntry::new(3.0, "B")];
        for previous in [
            PreviousRecord::new(3.0, 0.0),
            PreviousRecord::new(3.0, -10.0),
            PreviousRecord::new("", 30.0),
            PreviousRecord::new(3.0, "thirty"),
            PreviousRecord::default(),
        ] {
            let result = compute_gpa(&courses, &standard_map(), true, &previous, None, None);
            assert_eq!(result.cumulative_gpa, Some(3.0));
            assert_eq!(result.total_credits, 3.0);
        }
    }

    #[test]
    fn test_default_earned_minimum_is_d() {
        let grades = map(&[("A", 4.0), ("D", 1.0), ("D-", 0.7), ("F", 0.0)]);
        let courses = vec![
            CourseEntry::new(3.0, "A"),
            CourseEntry::new(2.0, "D-"),
            CourseEntry::new(1.0, "F"),
        ];
        let result = compute_gpa(&courses, &grades, false, &no_previous(), None, None);
        assert_eq!(result.current_credits, 3.0);
        assert_eq!(result.attempted_credits, 6.0);
    }

    #[test]
    fn test_without_d_every_resolved_grade_is_earned() {
        let grades = map(&[("A", 4.0), ("F", 0.0)]);
        let courses = vec![CourseEntry::new(3.0, "A"), CourseEntry::new(2.0, "F")];
        let result = compute_gpa(&courses, &grades, false, &no_previous(), None, None);
        assert_eq!(result.current_credits, 5.0);
    }

    #[test]
    fn test_configured_earned_minimum() {
        let grades = map(&[("A", 4.0), ("C", 2.0), ("C-", 1.7), ("D", 1.0)]);
        let courses = vec![
            CourseEntry::new(3.0, "A"),
            CourseEntry::new(3.0, "C-"),
            CourseEntry::new(3.0, "D"),
        ];
        let result = compute_gpa(
            &courses,
            &grades,
            false,
            &no_previous(),
            None,
            Some(&flags(false, Some("C-"))),
        );
        assert_eq!(result.current_credits, 6.0);
    }

    #[test]
    fn test_excluded_fail_still_not_earned_with_minimum() {
        let courses = vec![CourseEntry::new(3.0, "A"), CourseEntry::new(3.0, "F")];
        let result = compute_gpa(
            &courses,
            &standard_map(),
            false,
            &no_previous(),
            None,
            Some(&flags(true, Some("D"))),
        );
        assert_eq!(result.current_credits, 3.0);
        assert_eq!(result.attempted_credits, 3.0);
        assert_eq!(result.total_credits, 3.0);
    }

    #[test]
    fn test_grade_point_map_from_scale() {
        let scale = vec![
            GradePoint { grade: "A".into(), point: 4.0, description: None },
            GradePoint { grade: "B".into(), point: 3.0, description: None },
        ];
        let grades = GradePointMap::from_scale(&scale);
        assert_eq!(grades.len(), 2);
        assert_eq!(grades.get("B"), Some(3.0));
        assert_eq!(grades.max_point(), 4.0);
        assert_eq!(GradePointMap::default().max_point(), 4.0);
    }

    #[test]
    fn test_course_entry_from_yaml() {
        let yaml = r#"
- { credits: 3, grade: "A" }
- { credits: "1.5", score: 87 }
- { grade: "B" }
"#;
        let courses: Vec<CourseEntry> = serde_saphyr::from_str(yaml).unwrap();
        assert_eq!(courses[0].credits.value(), Some(3.0));
        assert_eq!(courses[1].score.value(), Some(87.0));
        assert_eq!(courses[1].grade, "");
        assert!(courses[2].credits.is_absent());
    }

    #[test]
    fn test_null_grade_reads_as_blank() {
        let yaml = "- { credits: 3, grade: }\n- { credits: 3, grade: \"A\" }\n- { credits: 3, grade: ~ }";
        let courses: Vec<CourseEntry> = serde_saphyr::from_str(yaml).unwrap();
        assert_eq!(courses[0].grade, "");
        assert_eq!(courses[2].grade, "");

        let result = compute_gpa(&courses, &standard_map(), false, &no_previous(), None, None);
        assert_eq!(result.current_gpa, Some(3.75));
        assert_eq!(result.total_credits, 3.0);
    }

    fn arb_input() -> impl Strategy<Value = NumericInput> {
        prop_oneof![
            (-5.0f64..10.0).prop_map(NumericInput::Number),
            "[ 0-9.a-z]{0,5}".prop_map(NumericInput::Text),
            Just(NumericInput::Absent),
        ]
    }

    fn arb_course() -> impl Strategy<Value = CourseEntry> {
        (
            arb_input(),
            prop::sample::select(vec!["A+", "A", "B", "C", "D", "F", "", "Q"]),
            arb_input(),
        )
            .prop_map(|(credits, grade, score)| CourseEntry {
                credits,
                grade: grade.to_string(),
                score,
            })
    }

    proptest! {
        #[test]
        fn prop_compute_is_deterministic(
            courses in prop::collection::vec(arb_course(), 0..8),
            include in any::<bool>(),
            cgpa in arb_input(),
            credits in arb_input(),
            exclude in any::<bool>(),
        ) {
            let grades = standard_map();
            let ranges = vec![range("A+", 80.0, 100.0), range("F", 0.0, 39.999)];
            let previous = PreviousRecord { cgpa, credits };
            let policy = flags(exclude, None);
            let first = compute_gpa(&courses, &grades, include, &previous, Some(&ranges), Some(&policy));
            let second = compute_gpa(&courses, &grades, include, &previous, Some(&ranges), Some(&policy));
            prop_assert_eq!(first.current_gpa.map(f64::to_bits), second.current_gpa.map(f64::to_bits));
            prop_assert_eq!(first.cumulative_gpa.map(f64::to_bits), second.cumulative_gpa.map(f64::to_bits));
            prop_assert_eq!(first, second);
        }

        #[test]
        fn prop_unusable_courses_yield_no_gpa(
            credits in prop::collection::vec(
                prop_oneof![
                    (-5.0f64..=0.0).prop_map(NumericInput::Number),
                    Just(NumericInput::from("")),
                    Just(NumericInput::Absent),
                ],
                0..6,
            ),
        ) {
            let courses: Vec<CourseEntry> = credits
                .into_iter()
                .map(|c| CourseEntry { credits: c, grade: "A".into(), score: NumericInput::Absent })
                .chain(std::iter::once(CourseEntry::new(3.0, "unknown")))
                .collect();
            let result = compute_gpa(&courses, &standard_map(), false, &PreviousRecord::default(), None, None);
            prop_assert_eq!(result.current_gpa, None);
            prop_assert_eq!(result.current_credits, 0.0);
        }

        #[test]
        fn prop_single_course_gpa_is_its_point(
            credits in 0.5f64..10.0,
            grade in prop::sample::select(vec!["A+", "A", "B", "C", "D"]),
        ) {
            let grades = standard_map();
            let courses = vec![CourseEntry::new(credits, grade)];
            let result = compute_gpa(&courses, &grades, false, &PreviousRecord::default(), None, None);
            let gpa = result.current_gpa.unwrap();
            let point = grades.get(grade).unwrap();
            prop_assert!((gpa - point).abs() < 1e-12);
        }
    }
}
