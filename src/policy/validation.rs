use std::collections::HashSet;

use super::schema::{GradePoint, InstitutionRecord, NumericRange};

/// Validate every institution in a catalog.
/// Returns all validation errors at once (not just the first).
pub fn validate_catalog(institutions: &[InstitutionRecord]) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();
    let mut seen_ids = HashSet::new();

    for (i, record) in institutions.iter().enumerate() {
        if record.id.trim().is_empty() {
            errors.push(format!("institutions[{}].id: must not be empty", i));
        } else if !seen_ids.insert(record.id.as_str()) {
            errors.push(format!("institutions[{}].id: duplicate id '{}'", i, record.id));
        }

        if let Err(mut institution_errors) = validate_institution(record) {
            errors.append(&mut institution_errors);
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validate a single institution's scale, ranges, rules and eras.
pub fn validate_institution(record: &InstitutionRecord) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();
    let id = record.id.as_str();

    check_scale(&format!("{}.grading_scale", id), &record.grading_scale, &mut errors);

    if let Some(ref ranges) = record.numeric_ranges {
        check_ranges(
            &format!("{}.numeric_ranges", id),
            ranges,
            &record.grading_scale,
            &mut errors,
        );
    }

    if let Some(ref min_grade) = record.rules.earned_grade_min {
        if !has_grade(&record.grading_scale, min_grade) {
            errors.push(format!(
                "{}.rules.earned_grade_min: '{}' is not in grading_scale",
                id, min_grade
            ));
        }
    }

    if let Some(ref attempt_grades) = record.rules.attempt_grades {
        for (i, grade) in attempt_grades.iter().enumerate() {
            if grade != "*" && !has_grade(&record.grading_scale, grade) {
                errors.push(format!(
                    "{}.rules.attempt_grades[{}]: '{}' is not in grading_scale",
                    id, i, grade
                ));
            }
        }
    }

    for (field, value) in [
        ("degree_requirement_cgpa", record.rules.degree_requirement_cgpa),
        ("probation_cgpa", record.rules.probation_cgpa),
        ("first_semester_withdraw_threshold", record.rules.first_semester_withdraw_threshold),
        ("continuation_requirement_cgpa", record.rules.continuation_requirement_cgpa),
    ] {
        if let Some(v) = value {
            if !v.is_finite() || v < 0.0 {
                errors.push(format!("{}.rules.{}: must be non-negative", id, field));
            }
        }
    }

    let mut era_names = HashSet::new();
    for (i, era) in record.eras.iter().enumerate() {
        let prefix = format!("{}.eras[{}]", id, i);

        if !era_names.insert(era.name.as_str()) {
            errors.push(format!("{}.name: duplicate era '{}'", prefix, era.name));
        }

        if let (Some(from), Some(to)) = (era.effective_from, era.effective_to) {
            if from > to {
                errors.push(format!(
                    "{}: effective_from {} is after effective_to {}",
                    prefix, from, to
                ));
            }
        }

        if let Some(ref scale) = era.grading_scale {
            check_scale(&format!("{}.grading_scale", prefix), scale, &mut errors);
        }

        let scale = era.grading_scale.as_deref().unwrap_or(&record.grading_scale);

        if let Some(ref ranges) = era.numeric_ranges {
            check_ranges(&format!("{}.numeric_ranges", prefix), ranges, scale, &mut errors);
        } else if let (Some(_), Some(base_ranges)) = (&era.grading_scale, &record.numeric_ranges) {
            // Base ranges are inherited by an era that only replaces the scale
            for (j, range) in base_ranges.iter().enumerate() {
                if !has_grade(scale, &range.grade) {
                    errors.push(format!(
                        "{}.grading_scale: inherited numeric_ranges[{}] grade '{}' is missing",
                        prefix, j, range.grade
                    ));
                }
            }
        }

        if let Some(ref min_grade) = record.rules.earned_grade_min {
            if era.grading_scale.is_some() && !has_grade(scale, min_grade) {
                errors.push(format!(
                    "{}.grading_scale: earned_grade_min '{}' is missing",
                    prefix, min_grade
                ));
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Pairs of range indexes whose bands overlap. Overlap is legal (the first
/// match wins) but usually a data-entry slip.
pub fn overlapping_ranges(ranges: &[NumericRange]) -> Vec<(usize, usize)> {
    let mut pairs = Vec::new();
    for (i, a) in ranges.iter().enumerate() {
        for (j, b) in ranges.iter().enumerate().skip(i + 1) {
            if a.overlaps(b) {
                pairs.push((i, j));
            }
        }
    }
    pairs
}

fn has_grade(scale: &[GradePoint], grade: &str) -> bool {
    scale.iter().any(|g| g.grade == grade)
}

fn check_scale(prefix: &str, scale: &[GradePoint], errors: &mut Vec<String>) {
    if scale.is_empty() {
        errors.push(format!("{}: must contain at least one grade", prefix));
    }

    let mut seen = HashSet::new();
    for (i, entry) in scale.iter().enumerate() {
        if entry.grade.trim().is_empty() {
            errors.push(format!("{}[{}].grade: must not be empty", prefix, i));
        } else if !seen.insert(entry.grade.as_str()) {
            errors.push(format!(
                "{}[{}].grade: duplicate grade '{}'",
                prefix, i, entry.grade
            ));
        }

        if !entry.point.is_finite() || entry.point < 0.0 {
            errors.push(format!("{}[{}].point: must be non-negative", prefix, i));
        }
    }
}

fn check_ranges(
    prefix: &str,
    ranges: &[NumericRange],
    scale: &[GradePoint],
    errors: &mut Vec<String>,
) {
    for (i, range) in ranges.iter().enumerate() {
        if !has_grade(scale, &range.grade) {
            errors.push(format!(
                "{}[{}].grade: '{}' is not in grading_scale",
                prefix, i, range.grade
            ));
        }
        if range.min.is_nan() || range.max.is_nan() || range.min > range.max {
            errors.push(format!(
                "{}[{}]: min {} is greater than max {}",
                prefix, i, range.min, range.max
            ));
        }
    }
}
