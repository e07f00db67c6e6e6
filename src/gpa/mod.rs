pub mod engine;
pub mod interpretation;
pub mod numeric;
pub mod planner;
pub mod projection;

pub use engine::{compute_gpa, ComputeResult, CourseEntry, GradePointMap, PreviousRecord};
pub use interpretation::{Interpretation, PolicyStanding, StandingCheck, StandingKind};
pub use numeric::NumericInput;
pub use planner::{plan_semesters, PlanSummary, PlannedSemester, SemesterOutcome};
pub use projection::{projected_cgpa, required_next_gpa, Achievability};
