pub mod formatter;

pub use formatter::{
    format_compute_result, format_credits, format_gpa, format_grading_scale,
    format_institution_list, format_plan, format_policy_flags, format_standing, format_target,
    should_use_colors, NO_VALUE,
};
