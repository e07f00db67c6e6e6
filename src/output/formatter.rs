use owo_colors::OwoColorize;
use std::io::IsTerminal;

use crate::gpa::{Achievability, ComputeResult, Interpretation, PlanSummary, StandingCheck};
use crate::policy::{InstitutionRecord, PolicyFlags, ResolvedPolicy};

/// Placeholder for a value that cannot be computed yet
pub const NO_VALUE: &str = "--";

/// Check if stdout is a TTY (for auto-detecting color support)
pub fn should_use_colors() -> bool {
    std::io::stdout().is_terminal()
}

/// Format a GPA-like value with two decimals, or "--" when absent
pub fn format_gpa(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.2}", v),
        None => NO_VALUE.to_string(),
    }
}

/// Format a credit total; whole numbers drop the decimals ("30", "1.50")
pub fn format_credits(credits: f64) -> String {
    if credits.fract() == 0.0 {
        format!("{:.0}", credits)
    } else {
        format!("{:.2}", credits)
    }
}

/// One institution per line: "{id}  {short_name}  {name}"
pub fn format_institution_list(institutions: &[InstitutionRecord], use_colors: bool) -> String {
    if institutions.is_empty() {
        return "No institutions in catalog.".to_string();
    }

    let id_width = institutions.iter().map(|r| r.id.len()).max().unwrap_or(0);
    let short_width = institutions.iter().map(|r| r.short_name.len()).max().unwrap_or(0);

    institutions
        .iter()
        .map(|record| {
            let id = format!("{:<width$}", record.id, width = id_width);
            let short = format!("{:<width$}", record.short_name, width = short_width);
            if use_colors {
                format!("{}  {}  {}", id.bold(), short.cyan(), record.name)
            } else {
                format!("{}  {}  {}", id, short, record.name)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Grading scale table with grade, point, percentage band and description
pub fn format_grading_scale(policy: &ResolvedPolicy, use_colors: bool) -> String {
    let institution = policy.institution;
    let title = match policy.era {
        Some(era) => format!("{} ({}), era: {}", institution.name, institution.short_name, era),
        None => format!("{} ({})", institution.name, institution.short_name),
    };

    let mut lines = Vec::with_capacity(policy.grading_scale.len() + 2);
    lines.push(if use_colors { title.bold().to_string() } else { title });

    let header = format!("{:<6} {:>6}  {:<16} {}", "Grade", "Point", "Percentage", "Description");
    lines.push(if use_colors { header.dimmed().to_string() } else { header });

    for row in policy.grading_scale {
        let band = policy
            .score_band(&row.grade)
            .map(|r| format!("{}-{}", r.min, r.max))
            .unwrap_or_else(|| NO_VALUE.to_string());
        let line = format!(
            "{:<6} {:>6.2}  {:<16} {}",
            row.grade,
            row.point,
            band,
            row.description.as_deref().unwrap_or("")
        );
        lines.push(line.trim_end().to_string());
    }

    lines.join("\n")
}

/// Policy rules as "key: value" lines; empty when the policy sets nothing
pub fn format_policy_flags(flags: &PolicyFlags) -> String {
    let mut lines = Vec::new();

    if flags.exclude_fail_from_denominator {
        lines.push("Failed courses excluded from GPA denominator".to_string());
    }
    if let Some(grade) = &flags.earned_grade_min {
        lines.push(format!("Minimum grade for earned credit: {}", grade));
    }
    if let Some(v) = flags.degree_requirement_cgpa {
        lines.push(format!("Degree requirement CGPA: {:.2}", v));
    }
    if let Some(v) = flags.probation_cgpa {
        lines.push(format!("Probation CGPA: {:.2}", v));
    }
    if let Some(n) = flags.probation_consecutive_semesters_allowed {
        lines.push(format!("Consecutive probation semesters allowed: {}", n));
    }
    if let Some(v) = flags.first_semester_withdraw_threshold {
        lines.push(format!("First semester withdraw threshold: {:.2}", v));
    }
    if let (Some(semester), Some(cgpa)) = (
        flags.continuation_requirement_semester,
        flags.continuation_requirement_cgpa,
    ) {
        lines.push(format!("Continuation: CGPA {:.2} by semester {}", cgpa, semester));
    }
    if let Some(grades) = &flags.attempt_grades {
        lines.push(format!("Attempted-credit grades: {}", grades.join(", ")));
    }
    if flags.last_attempt_wins == Some(true) {
        lines.push("Retakes: last attempt counts".to_string());
    }

    lines.join("\n")
}

fn paint_interpretation(interpretation: Interpretation, use_colors: bool) -> String {
    let message = interpretation.message();
    if !use_colors {
        return message.to_string();
    }
    match interpretation {
        Interpretation::NoData => message.dimmed().to_string(),
        Interpretation::Outstanding => message.green().to_string(),
        Interpretation::Strong => message.cyan().to_string(),
        Interpretation::Satisfactory => message.yellow().to_string(),
        Interpretation::AtRisk => message.red().to_string(),
    }
}

/// Summary block for a single compute run
pub fn format_compute_result(result: &ComputeResult, use_colors: bool) -> String {
    let gpa = format_gpa(result.current_gpa);
    let cgpa = format_gpa(result.cumulative_gpa);
    let (gpa, cgpa) = if use_colors {
        (gpa.bold().to_string(), cgpa.bold().to_string())
    } else {
        (gpa, cgpa)
    };

    format!(
        "GPA: {}\nCGPA: {}\nEarned credits: {}\nTotal credits: {}\n{}",
        gpa,
        cgpa,
        format_credits(result.current_credits),
        format_credits(result.total_credits),
        paint_interpretation(result.interpretation, use_colors)
    )
}

/// One line per advisory threshold, e.g. "[yes] On track to graduate (Minimum CGPA required: 2.00)"
pub fn format_standing(checks: &[StandingCheck], use_colors: bool) -> String {
    checks
        .iter()
        .map(|check| {
            let mark = match check.met {
                Some(true) => "yes",
                Some(false) => "no",
                None => NO_VALUE,
            };
            let mark = format!("[{}]", mark);
            let mark = match (use_colors, check.met) {
                (true, Some(true)) => mark.green().to_string(),
                (true, Some(false)) => mark.red().to_string(),
                (true, None) => mark.dimmed().to_string(),
                (false, _) => mark,
            };
            format!("{} {} ({})", mark, check.kind.label(), check.detail())
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Required next-term GPA plus whether the scale allows it
pub fn format_target(required: Option<f64>, achievability: Option<Achievability>, use_colors: bool) -> String {
    let line = format!("Required GPA next term: {}", format_gpa(required));
    match achievability {
        None => line,
        Some(a) => {
            let note = a.note();
            let note = match (use_colors, a) {
                (false, _) => note,
                (true, Achievability::Achievable) => note.green().to_string(),
                (true, _) => note.red().to_string(),
            };
            format!("{}\n{}", line, note)
        }
    }
}

/// Per-semester lines followed by the overall CGPA
pub fn format_plan(summary: &PlanSummary, use_colors: bool) -> String {
    if summary.semesters.is_empty() {
        return "No semesters in plan.".to_string();
    }

    let name_width = summary.semesters.iter().map(|s| s.name.chars().count()).max().unwrap_or(0);

    let mut lines: Vec<String> = summary
        .semesters
        .iter()
        .map(|s| {
            format!(
                "{:<width$}  GPA {:>5}  earned {}",
                s.name,
                format_gpa(s.gpa),
                format_credits(s.earned_credits),
                width = name_width
            )
        })
        .collect();

    let overall = format!(
        "Overall CGPA: {} ({} credits earned)",
        format_gpa(summary.cgpa),
        format_credits(summary.earned_credits)
    );
    lines.push(if use_colors { overall.bold().to_string() } else { overall });

    lines.join("\n")
}
