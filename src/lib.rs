pub mod config;
pub mod gpa;
pub mod output;
pub mod policy;
pub mod telemetry;
