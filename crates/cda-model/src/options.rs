//! Configuration options for document import.

use serde::{Deserialize, Serialize};

use crate::document::CodedValue;
use crate::enums::SeverityLevel;

pub const SETTING_SEVERITY_MILD: &str = "severity.mild";
pub const SETTING_SEVERITY_MODERATE: &str = "severity.moderate";
pub const SETTING_SEVERITY_SEVERE: &str = "severity.severe";

/// Concepts that allergy severities map onto.
///
/// These are site configuration, not document content: a document says `H`,
/// the site decides which concept in its dictionary means "severe".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeverityConcepts {
    pub mild: Option<CodedValue>,
    pub moderate: Option<CodedValue>,
    pub severe: Option<CodedValue>,
    /// Used when an allergy carries no single qualifying severity.
    pub unknown: Option<CodedValue>,
}

impl SeverityConcepts {
    /// The configured concept for `level` together with its setting name.
    pub fn concept_for(&self, level: SeverityLevel) -> (&'static str, Option<&CodedValue>) {
        match level {
            SeverityLevel::Mild => (SETTING_SEVERITY_MILD, self.mild.as_ref()),
            SeverityLevel::Moderate => (SETTING_SEVERITY_MODERATE, self.moderate.as_ref()),
            SeverityLevel::Severe => (SETTING_SEVERITY_SEVERE, self.severe.as_ref()),
        }
    }
}

/// Options controlling import behavior. Queried, never mutated, by the importer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportOptions {
    /// Run template validation before any domain mutation.
    pub validation_enabled: bool,

    /// Let an act whose accession number is already on file update that
    /// record in place instead of failing as a duplicate.
    pub update_existing: bool,

    pub severity: SeverityConcepts,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            validation_enabled: true,
            update_existing: false,
            severity: SeverityConcepts::default(),
        }
    }
}

impl ImportOptions {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_update_existing(mut self, enable: bool) -> Self {
        self.update_existing = enable;
        self
    }

    #[must_use]
    pub fn with_validation(mut self, enable: bool) -> Self {
        self.validation_enabled = enable;
        self
    }

    #[must_use]
    pub fn with_severity_concepts(mut self, severity: SeverityConcepts) -> Self {
        self.severity = severity;
        self
    }
}
