use anyhow::Result;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use serde_json::json;
use std::path::PathBuf;
use tracing::debug;

use gpa_calc::config::{load_course_sheet, load_registry};
use gpa_calc::gpa::{
    compute_gpa, plan_semesters, projected_cgpa, required_next_gpa, Achievability, Interpretation,
    NumericInput, PolicyStanding,
};
use gpa_calc::output;
use gpa_calc::policy::{Registry, RegistryError};

const EXIT_SUCCESS: i32 = 0;
const EXIT_CONFIG: i32 = 4;
const EXIT_NOT_FOUND: i32 = 5;

#[derive(Subcommand, Debug)]
enum Commands {
    /// List institutions in the catalog
    List,
    /// Show an institution's grading scale and rules
    Show {
        /// Institution id (see `list`)
        id: String,
        /// Use the scale of a named era
        #[arg(long)]
        era: Option<String>,
        /// Use the era in effect on a date (YYYY-MM-DD)
        #[arg(long, conflicts_with = "era")]
        on: Option<NaiveDate>,
    },
    /// Compute GPA and CGPA from a course sheet
    Compute {
        /// YAML course sheet
        sheet: PathBuf,
    },
    /// Project CGPA after a planned term
    Project {
        #[arg(long)]
        institution: String,
        #[arg(long)]
        era: Option<String>,
        /// Current CGPA
        #[arg(long)]
        cgpa: f64,
        /// Credits behind the current CGPA
        #[arg(long)]
        credits: f64,
        /// Credits planned for next term
        #[arg(long)]
        planned: String,
        /// Expected GPA next term
        #[arg(long)]
        next_gpa: String,
    },
    /// GPA needed next term to reach a target CGPA
    Target {
        #[arg(long)]
        institution: String,
        #[arg(long)]
        era: Option<String>,
        /// Current CGPA
        #[arg(long)]
        cgpa: f64,
        /// Credits behind the current CGPA
        #[arg(long)]
        credits: f64,
        /// Credits planned for next term
        #[arg(long)]
        planned: String,
        /// Target CGPA
        #[arg(long)]
        target: String,
    },
    /// Per-semester GPAs and overall CGPA for a multi-semester sheet
    Plan {
        /// YAML course sheet with a `semesters` list
        sheet: PathBuf,
    },
    /// Validate the loaded catalog and report every problem
    Validate,
}

#[derive(Parser, Debug)]
#[command(name = "gpa-calc")]
#[command(about = "GPA/CGPA calculator with per-institution grading policies", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Print machine-readable JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    /// Path to an institution catalog (defaults to ~/.config/gpa-calc/institutions.yaml, then the built-in catalog)
    #[arg(short, long, global = true)]
    registry: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = gpa_calc::telemetry::init(cli.verbose) {
        eprintln!("Warning: {}", e);
    }

    let registry = match load_registry(cli.registry.clone()) {
        Ok(registry) => registry,
        Err(e) => {
            match e.downcast_ref::<RegistryError>() {
                Some(RegistryError::Invalid(errors)) => {
                    eprintln!("Catalog errors:");
                    for error in errors {
                        eprintln!("  - {}", error);
                    }
                }
                _ => eprintln!("Config error: {:#}", e),
            }
            std::process::exit(EXIT_CONFIG);
        }
    };

    let use_colors = !cli.json && output::should_use_colors();

    if let Err(e) = run(cli.command, &registry, cli.json, use_colors) {
        eprintln!("Error: {:#}", e);
        let code = match e.downcast_ref::<RegistryError>() {
            Some(RegistryError::NotFound { .. } | RegistryError::UnknownEra { .. }) => {
                EXIT_NOT_FOUND
            }
            _ => EXIT_CONFIG,
        };
        std::process::exit(code);
    }

    std::process::exit(EXIT_SUCCESS);
}

fn run(command: Commands, registry: &Registry, json: bool, use_colors: bool) -> Result<()> {
    match command {
        Commands::List => {
            let institutions = registry.list_institutions();
            if json {
                let rows: Vec<_> = institutions
                    .iter()
                    .map(|r| json!({ "id": r.id, "short_name": r.short_name, "name": r.name }))
                    .collect();
                println!("{}", serde_json::to_string_pretty(&rows)?);
            } else {
                println!("{}", output::format_institution_list(institutions, use_colors));
            }
        }
        Commands::Show { id, era, on } => {
            let era = match on {
                Some(date) => {
                    let found = registry.get_institution(&id)?.era_on(date);
                    debug!(%date, era = ?found.map(|e| &e.name), "era lookup by date");
                    found.map(|e| e.name.clone())
                }
                None => era,
            };
            let policy = registry.resolve_policy(&id, era.as_deref())?;

            if json {
                let value = json!({
                    "institution": policy.institution,
                    "era": policy.era,
                    "grading_scale": policy.grading_scale,
                    "numeric_ranges": policy.numeric_ranges,
                });
                println!("{}", serde_json::to_string_pretty(&value)?);
                return Ok(());
            }

            println!("{}", output::format_grading_scale(&policy, use_colors));
            let flags = output::format_policy_flags(policy.flags);
            if !flags.is_empty() {
                println!("\n{}", flags);
            }
            if !policy.institution.eras.is_empty() {
                println!("\nEras:");
                for era in &policy.institution.eras {
                    let from = era.effective_from.map(|d| d.to_string());
                    let to = era.effective_to.map(|d| d.to_string());
                    println!(
                        "  {} ({} to {})",
                        era.name,
                        from.as_deref().unwrap_or("..."),
                        to.as_deref().unwrap_or("...")
                    );
                }
            }
            if let Some(guide) = &policy.institution.calculation_guide {
                println!("\n{}", guide.trim_end());
            }
        }
        Commands::Compute { sheet } => {
            let sheet = load_course_sheet(&sheet)?;
            let policy = registry.resolve_policy(&sheet.institution, sheet.era.as_deref())?;

            let result = compute_gpa(
                &sheet.courses,
                &policy.grade_points,
                sheet.include_previous,
                &sheet.previous(),
                policy.numeric_ranges,
                Some(policy.flags),
            );
            let standing = PolicyStanding::evaluate(policy.flags, result.cumulative_gpa);

            if json {
                let value = json!({ "result": result, "standing": standing });
                println!("{}", serde_json::to_string_pretty(&value)?);
            } else {
                println!("{}", output::format_compute_result(&result, use_colors));
                if !standing.is_empty() {
                    println!("{}", output::format_standing(&standing, use_colors));
                }
            }
        }
        Commands::Project { institution, era, cgpa, credits, planned, next_gpa } => {
            let policy = registry.resolve_policy(&institution, era.as_deref())?;
            let projected = projected_cgpa(
                Some(cgpa),
                credits,
                &NumericInput::from(planned),
                &NumericInput::from(next_gpa),
            );
            let standing = PolicyStanding::evaluate(policy.flags, projected);

            if json {
                let value = json!({
                    "projected_cgpa": projected,
                    "interpretation": Interpretation::from_value(projected),
                    "standing": standing,
                });
                println!("{}", serde_json::to_string_pretty(&value)?);
            } else {
                println!("Projected CGPA: {}", output::format_gpa(projected));
                if projected.is_some() {
                    println!("{}", Interpretation::from_value(projected));
                }
                if !standing.is_empty() {
                    println!("{}", output::format_standing(&standing, use_colors));
                }
            }
        }
        Commands::Target { institution, era, cgpa, credits, planned, target } => {
            let policy = registry.resolve_policy(&institution, era.as_deref())?;
            let required = required_next_gpa(
                Some(cgpa),
                credits,
                &NumericInput::from(planned),
                &NumericInput::from(target),
            );
            let achievability = required.map(|r| Achievability::assess(r, policy.max_point()));

            if json {
                let value = json!({
                    "required_gpa": required,
                    "max_point": policy.max_point(),
                    "achievability": achievability,
                });
                println!("{}", serde_json::to_string_pretty(&value)?);
            } else {
                println!("{}", output::format_target(required, achievability, use_colors));
            }
        }
        Commands::Plan { sheet } => {
            let sheet = load_course_sheet(&sheet)?;
            let policy = registry.resolve_policy(&sheet.institution, sheet.era.as_deref())?;
            let summary = plan_semesters(
                &sheet.semesters,
                &policy.grade_points,
                policy.numeric_ranges,
                Some(policy.flags),
            );

            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                println!("{}", output::format_plan(&summary, use_colors));
            }
        }
        Commands::Validate => {
            // Loading already validated; reaching here means the catalog is clean.
            let count = registry.list_institutions().len();
            if json {
                println!("{}", json!({ "valid": true, "institutions": count }));
            } else {
                println!("Catalog OK: {} institutions", count);
            }
        }
    }

    Ok(())
}
