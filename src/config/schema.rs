use serde::{Deserialize, Serialize};

use crate::gpa::{CourseEntry, NumericInput, PlannedSemester, PreviousRecord};

/// Input sheet for `compute` and `plan`.
///
/// Example YAML:
/// ```yaml
/// institution: uiu
/// include_previous: true
/// previous_cgpa: "3.2"
/// previous_credits: 45
/// courses:
///   - { credits: 3, grade: "A" }
///   - { credits: "1.5", score: 87 }
/// ```
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct CourseSheet {
    pub institution: String,

    /// Era name, for institutions that changed scales
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub era: Option<String>,

    #[serde(default)]
    pub include_previous: bool,

    #[serde(default)]
    pub previous_cgpa: NumericInput,

    #[serde(default)]
    pub previous_credits: NumericInput,

    #[serde(default)]
    pub courses: Vec<CourseEntry>,

    /// Only read by `plan`
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub semesters: Vec<PlannedSemester>,
}

impl CourseSheet {
    pub fn previous(&self) -> PreviousRecord {
        PreviousRecord::new(self.previous_cgpa.clone(), self.previous_credits.clone())
    }
}
