use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One row of a grading scale.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct GradePoint {
    /// Letter grade label, e.g. "A+" (case-sensitive, unique within a scale)
    pub grade: String,

    /// Grade point awarded per credit hour
    pub point: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Inclusive numeric score band that maps to a letter grade.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct NumericRange {
    pub grade: String,
    pub min: f64,
    pub max: f64,
}

impl NumericRange {
    pub fn contains(&self, score: f64) -> bool {
        self.min <= score && score <= self.max
    }

    pub fn overlaps(&self, other: &NumericRange) -> bool {
        self.min <= other.max && other.min <= self.max
    }
}

/// Per-institution calculation rules.
///
/// Only `exclude_fail_from_denominator` and `earned_grade_min` change the GPA
/// arithmetic. The thresholds are advisory, and the retake fields are kept as
/// inert configuration since the engine has no notion of a course across terms.
///
/// Example YAML:
/// ```yaml
/// rules:
///   exclude_fail_from_denominator: true
///   earned_grade_min: "D"
///   degree_requirement_cgpa: 2.0
///   probation_cgpa: 2.0
/// ```
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct PolicyFlags {
    /// Drop 0-point courses from the GPA denominator (default: false)
    #[serde(default)]
    pub exclude_fail_from_denominator: bool,

    /// Minimum grade whose credits count as earned (default: "D" when the
    /// scale has one, otherwise no minimum)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub earned_grade_min: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub degree_requirement_cgpa: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub probation_cgpa: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub probation_consecutive_semesters_allowed: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_semester_withdraw_threshold: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub continuation_requirement_semester: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub continuation_requirement_cgpa: Option<f64>,

    /// Grades that count as attempted credit. "*" stands for any starred
    /// administrative grade. Not enforced by the engine.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attempt_grades: Option<Vec<String>>,

    /// Retakes replace earlier attempts. Not enforced by the engine.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_attempt_wins: Option<bool>,
}

/// A period during which an institution used a different scale.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct EraMapping {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effective_from: Option<NaiveDate>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effective_to: Option<NaiveDate>,

    /// Replaces the institution's scale while this era applies
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grading_scale: Option<Vec<GradePoint>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub numeric_ranges: Option<Vec<NumericRange>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl EraMapping {
    /// Inclusive on both ends; an open end is unbounded.
    pub fn covers(&self, date: NaiveDate) -> bool {
        self.effective_from.is_none_or(|from| from <= date)
            && self.effective_to.is_none_or(|to| date <= to)
    }
}

/// A single institution's grading policy.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct InstitutionRecord {
    pub id: String,
    pub name: String,
    pub short_name: String,
    pub grading_scale: Vec<GradePoint>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub numeric_ranges: Option<Vec<NumericRange>>,

    /// Free-form notes on how the institution calculates GPA
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calculation_guide: Option<String>,

    #[serde(default)]
    pub rules: PolicyFlags,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub eras: Vec<EraMapping>,
}

impl InstitutionRecord {
    pub fn era(&self, name: &str) -> Option<&EraMapping> {
        self.eras.iter().find(|era| era.name == name)
    }

    /// First era whose effective window contains `date`.
    pub fn era_on(&self, date: NaiveDate) -> Option<&EraMapping> {
        self.eras.iter().find(|era| era.covers(date))
    }

    /// First numeric band for `grade`, used for grade/percentage tables.
    pub fn score_band(&self, grade: &str) -> Option<&NumericRange> {
        self.numeric_ranges
            .as_deref()
            .and_then(|ranges| ranges.iter().find(|r| r.grade == grade))
    }

    pub fn max_point(&self) -> Option<f64> {
        self.grading_scale.iter().map(|g| g.point).reduce(f64::max)
    }
}
