use serde::{Serialize, Serializer};
use std::fmt;

use crate::policy::PolicyFlags;

/// Qualitative reading of a (cumulative) GPA.
///
/// | Value       | Interpretation |
/// |-------------|----------------|
/// | none        | NoData         |
/// | >= 3.75     | Outstanding    |
/// | >= 3.3      | Strong         |
/// | >= 2.5      | Satisfactory   |
/// | < 2.5       | AtRisk         |
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interpretation {
    NoData,
    Outstanding,
    Strong,
    Satisfactory,
    AtRisk,
}

impl Interpretation {
    pub fn from_value(value: Option<f64>) -> Self {
        match value {
            None => Interpretation::NoData,
            Some(v) if v >= 3.75 => Interpretation::Outstanding,
            Some(v) if v >= 3.3 => Interpretation::Strong,
            Some(v) if v >= 2.5 => Interpretation::Satisfactory,
            Some(_) => Interpretation::AtRisk,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Interpretation::NoData => "Add your courses to see a detailed interpretation.",
            Interpretation::Outstanding => {
                "Outstanding academic standing. Keep up the excellent work!"
            }
            Interpretation::Strong => "Strong performance with room for targeted improvements.",
            Interpretation::Satisfactory => {
                "Satisfactory progress. Consider meeting an advisor to plan the next steps."
            }
            Interpretation::AtRisk => "At-risk standing. Consult your academic advisor for support.",
        }
    }
}

impl fmt::Display for Interpretation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

impl Serialize for Interpretation {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.message())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StandingKind {
    Graduation,
    Probation,
}

impl StandingKind {
    pub fn label(&self) -> &'static str {
        match self {
            StandingKind::Graduation => "On track to graduate",
            StandingKind::Probation => "Above probation threshold",
        }
    }
}

/// One advisory check against a policy threshold.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StandingCheck {
    pub kind: StandingKind,
    pub threshold: f64,
    /// `None` when there is no CGPA to compare yet
    pub met: Option<bool>,
}

impl StandingCheck {
    pub fn detail(&self) -> String {
        match self.kind {
            StandingKind::Graduation => format!("Minimum CGPA required: {:.2}", self.threshold),
            StandingKind::Probation => format!("Probation threshold: {:.2}", self.threshold),
        }
    }
}

/// Advisory checks built from a policy's informational thresholds.
pub struct PolicyStanding;

impl PolicyStanding {
    pub fn evaluate(flags: &PolicyFlags, cgpa: Option<f64>) -> Vec<StandingCheck> {
        [
            (StandingKind::Graduation, flags.degree_requirement_cgpa),
            (StandingKind::Probation, flags.probation_cgpa),
        ]
        .into_iter()
        .filter_map(|(kind, threshold)| {
            threshold.map(|threshold| StandingCheck {
                kind,
                threshold,
                met: cgpa.map(|c| c >= threshold),
            })
        })
        .collect()
    }
}
