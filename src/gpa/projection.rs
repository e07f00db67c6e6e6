use serde::Serialize;

use super::numeric::NumericInput;

/// CGPA after a planned term at an expected GPA.
///
/// Needs a current CGPA, non-negative base credits, positive planned credits
/// and a non-negative expected GPA; anything else yields `None`.
pub fn projected_cgpa(
    base_cgpa: Option<f64>,
    base_credits: f64,
    planned_credits: &NumericInput,
    next_gpa: &NumericInput,
) -> Option<f64> {
    let base_cgpa = base_cgpa?;
    let planned = planned_credits.value().filter(|p| *p > 0.0)?;
    let next = next_gpa.value().filter(|g| *g >= 0.0)?;
    let base_credits = Some(base_credits).filter(|c| *c >= 0.0)?;

    let total = base_credits + planned;
    Some((base_cgpa * base_credits + next * planned) / total)
}

/// GPA needed over the planned credits to land exactly on `target_cgpa`.
pub fn required_next_gpa(
    base_cgpa: Option<f64>,
    base_credits: f64,
    planned_credits: &NumericInput,
    target_cgpa: &NumericInput,
) -> Option<f64> {
    let base_cgpa = base_cgpa?;
    let planned = planned_credits.value().filter(|p| *p > 0.0)?;
    let target = target_cgpa.value().filter(|t| *t > 0.0)?;
    let base_credits = Some(base_credits).filter(|c| *c >= 0.0)?;

    let needed = (target * (base_credits + planned) - base_cgpa * base_credits) / planned;
    Some(needed).filter(|n| n.is_finite())
}

/// Whether a required term GPA is reachable on a scale topping out at `max_point`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Achievability {
    Achievable,
    ExceedsScale { max_point: f64 },
    NotMeaningful,
}

impl Achievability {
    pub fn assess(required: f64, max_point: f64) -> Self {
        if required > max_point {
            Achievability::ExceedsScale { max_point }
        } else if required >= 0.0 {
            Achievability::Achievable
        } else {
            Achievability::NotMeaningful
        }
    }

    pub fn note(&self) -> String {
        match self {
            Achievability::Achievable => "Achievable within grading scale.".to_string(),
            Achievability::ExceedsScale { max_point } => {
                format!("Not achievable: requires GPA > {:.2} next term.", max_point)
            }
            Achievability::NotMeaningful => "Not meaningful given inputs.".to_string(),
        }
    }
}
