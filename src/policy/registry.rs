use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

use super::schema::{GradePoint, InstitutionRecord, NumericRange, PolicyFlags};
use super::validation::{overlapping_ranges, validate_catalog};
use crate::gpa::GradePointMap;

const EMBEDDED_CATALOG: &str = include_str!("catalog.yaml");

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("unknown institution '{id}'")]
    NotFound { id: String },

    #[error("institution '{institution}' has no era named '{era}'")]
    UnknownEra { institution: String, era: String },

    #[error("invalid grading policy catalog:\n  - {}", .0.join("\n  - "))]
    Invalid(Vec<String>),

    #[error("failed to parse catalog {source_name}: {message}")]
    Parse { source_name: String, message: String },

    #[error("failed to read catalog at {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct CatalogFile {
    institutions: Vec<InstitutionRecord>,
}

/// Everything the engine needs for one institution (and optionally one era).
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedPolicy<'a> {
    pub institution: &'a InstitutionRecord,
    pub era: Option<&'a str>,
    /// Scale rows in catalog order
    pub grading_scale: &'a [GradePoint],
    pub grade_points: GradePointMap,
    pub numeric_ranges: Option<&'a [NumericRange]>,
    pub flags: &'a PolicyFlags,
}

impl<'a> ResolvedPolicy<'a> {
    pub fn max_point(&self) -> f64 {
        self.grade_points.max_point()
    }

    /// First numeric band for `grade` under the resolved ranges.
    pub fn score_band(&self, grade: &str) -> Option<&'a NumericRange> {
        self.numeric_ranges
            .and_then(|ranges| ranges.iter().find(|r| r.grade == grade))
    }
}

/// Read-only catalog of institution grading policies.
///
/// Built once from YAML and validated up front; a catalog that breaks an
/// invariant never becomes a `Registry`.
#[derive(Debug, Clone)]
pub struct Registry {
    institutions: Vec<InstitutionRecord>,
}

impl Registry {
    /// Validate and wrap an in-memory catalog.
    pub fn new(institutions: Vec<InstitutionRecord>) -> Result<Self, RegistryError> {
        validate_catalog(&institutions).map_err(RegistryError::Invalid)?;

        for record in &institutions {
            warn_overlaps(&record.id, record.numeric_ranges.as_deref());
            for era in &record.eras {
                warn_overlaps(&format!("{} ({})", record.id, era.name), era.numeric_ranges.as_deref());
            }
        }

        debug!(count = institutions.len(), "loaded grading policy catalog");
        Ok(Self { institutions })
    }

    /// The catalog compiled into the binary.
    pub fn embedded() -> Result<Self, RegistryError> {
        Self::from_yaml_str(EMBEDDED_CATALOG, "embedded catalog")
    }

    pub fn from_yaml_str(yaml: &str, source_name: &str) -> Result<Self, RegistryError> {
        let catalog: CatalogFile =
            serde_saphyr::from_str(yaml).map_err(|e| RegistryError::Parse {
                source_name: source_name.to_string(),
                message: e.to_string(),
            })?;
        Self::new(catalog.institutions)
    }

    pub fn from_path(path: &Path) -> Result<Self, RegistryError> {
        let content = fs::read_to_string(path).map_err(|source| RegistryError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&content, &path.display().to_string())
    }

    /// All institutions in catalog order.
    pub fn list_institutions(&self) -> &[InstitutionRecord] {
        &self.institutions
    }

    pub fn get_institution(&self, id: &str) -> Result<&InstitutionRecord, RegistryError> {
        self.institutions
            .iter()
            .find(|record| record.id == id)
            .ok_or_else(|| RegistryError::NotFound { id: id.to_string() })
    }

    /// Resolve the grade map, ranges and flags for an institution.
    ///
    /// With an era, its scale and ranges replace the institution's own where
    /// the era defines them.
    pub fn resolve_policy(
        &self,
        id: &str,
        era: Option<&str>,
    ) -> Result<ResolvedPolicy<'_>, RegistryError> {
        let institution = self.get_institution(id)?;

        let era = match era {
            Some(name) => Some(institution.era(name).ok_or_else(|| RegistryError::UnknownEra {
                institution: id.to_string(),
                era: name.to_string(),
            })?),
            None => None,
        };

        let scale = era
            .and_then(|e| e.grading_scale.as_deref())
            .unwrap_or(&institution.grading_scale);
        let numeric_ranges = era
            .and_then(|e| e.numeric_ranges.as_deref())
            .or(institution.numeric_ranges.as_deref());

        Ok(ResolvedPolicy {
            institution,
            era: era.map(|e| e.name.as_str()),
            grading_scale: scale,
            grade_points: GradePointMap::from_scale(scale),
            numeric_ranges,
            flags: &institution.rules,
        })
    }
}

fn warn_overlaps(label: &str, ranges: Option<&[NumericRange]>) {
    let Some(ranges) = ranges else {
        return;
    };
    for (a, b) in overlapping_ranges(ranges) {
        warn!(
            institution = label,
            first = %ranges[a].grade,
            second = %ranges[b].grade,
            "numeric ranges overlap; the first listed range wins"
        );
    }
}
