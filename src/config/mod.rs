mod schema;

pub use schema::CourseSheet;

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::policy::Registry;

/// Get the config directory path (~/.config/gpa-calc/)
pub fn get_config_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".config").join("gpa-calc"))
}

/// Get the user catalog path (~/.config/gpa-calc/institutions.yaml)
pub fn get_registry_path() -> Option<PathBuf> {
    get_config_dir().map(|dir| dir.join("institutions.yaml"))
}

/// Load the institution registry.
///
/// Sources, first match wins:
/// 1. `path`, when given (must exist)
/// 2. ~/.config/gpa-calc/institutions.yaml, if present
/// 3. The catalog compiled into the binary
///
/// # Errors
///
/// Returns an error if the chosen file cannot be read or parsed, or if the
/// catalog fails validation.
pub fn load_registry(path: Option<PathBuf>) -> Result<Registry> {
    let path = match path {
        Some(path) => {
            if !path.exists() {
                anyhow::bail!("Registry file not found at {}", path.display());
            }
            Some(path)
        }
        None => get_registry_path().filter(|p| p.exists()),
    };

    match path {
        Some(path) => {
            debug!(path = %path.display(), "loading grading policy catalog");
            Registry::from_path(&path)
                .with_context(|| format!("Failed to load registry from {}", path.display()))
        }
        None => Registry::embedded().context("Built-in grading policy catalog is invalid"),
    }
}

/// Load a course sheet from a YAML file
pub fn load_course_sheet(path: &Path) -> Result<CourseSheet> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read course sheet at {}", path.display()))?;

    let sheet: CourseSheet = serde_saphyr::from_str(&content)
        .with_context(|| format!("Failed to parse course sheet: invalid YAML in {}", path.display()))?;

    Ok(sheet)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn temp_file(name: &str, content: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("gpa-calc-{}-{}", std::process::id(), name));
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_registry_path_is_under_config_dir() {
        if let (Some(dir), Some(path)) = (get_config_dir(), get_registry_path()) {
            assert!(dir.ends_with(".config/gpa-calc"));
            assert_eq!(path, dir.join("institutions.yaml"));
        }
    }

    #[test]
    fn test_missing_explicit_registry_is_an_error() {
        let err = load_registry(Some(PathBuf::from("/nonexistent/institutions.yaml"))).unwrap_err();
        assert!(err.to_string().contains("Registry file not found"));
    }

    #[test]
    fn test_explicit_registry() {
        let path = temp_file(
            "registry.yaml",
            "institutions:\n  - id: tiny\n    name: Tiny\n    short_name: T\n    grading_scale:\n      - { grade: \"A\", point: 4.0 }\n",
        );
        let registry = load_registry(Some(path.clone())).unwrap();
        assert_eq!(registry.list_institutions().len(), 1);
        fs::remove_file(path).unwrap();
    }

    #[test]
    fn test_load_course_sheet() {
        let path = temp_file(
            "sheet.yaml",
            "institution: aiub\ncourses:\n  - { credits: 3, grade: \"A\" }\n",
        );
        let sheet = load_course_sheet(&path).unwrap();
        assert_eq!(sheet.institution, "aiub");
        assert_eq!(sheet.courses.len(), 1);
        fs::remove_file(path).unwrap();
    }

    #[test]
    fn test_bad_course_sheet_names_the_file() {
        let path = temp_file("bad-sheet.yaml", "institution: [");
        let err = load_course_sheet(&path).unwrap_err();
        assert!(err.to_string().contains("invalid YAML"));
        fs::remove_file(path).unwrap();
    }
}
