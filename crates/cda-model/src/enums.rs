//! Type-safe enumerations for CDA vocabulary and clinical record state.
//!
//! These enums give compile-time safety to HL7 codes that arrive as strings
//! in documents (`statusCode`, `nullFlavor`, relationship type codes) and to
//! the enumerated fields of allergy and condition records.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::ModelError;

/// Act status (`statusCode`), HL7 ActStatus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActStatus {
    New,
    Active,
    Suspended,
    Aborted,
    Completed,
    Nullified,
}

impl ActStatus {
    pub fn as_code(&self) -> &'static str {
        match self {
            ActStatus::New => "new",
            ActStatus::Active => "active",
            ActStatus::Suspended => "suspended",
            ActStatus::Aborted => "aborted",
            ActStatus::Completed => "completed",
            ActStatus::Nullified => "nullified",
        }
    }

    /// Completed or aborted: the act has ended and must carry a high bound.
    pub fn implies_completion(&self) -> bool {
        matches!(self, ActStatus::Completed | ActStatus::Aborted)
    }

    /// Active or suspended: the act is ongoing and must not carry a high bound.
    pub fn implies_ongoing(&self) -> bool {
        matches!(self, ActStatus::Active | ActStatus::Suspended)
    }

    /// Aborted or suspended concerns void the record they reconcile into.
    pub fn voids_record(&self) -> bool {
        matches!(self, ActStatus::Aborted | ActStatus::Suspended)
    }
}

impl fmt::Display for ActStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_code())
    }
}

impl FromStr for ActStatus {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "new" => Ok(ActStatus::New),
            "active" => Ok(ActStatus::Active),
            "suspended" => Ok(ActStatus::Suspended),
            "aborted" => Ok(ActStatus::Aborted),
            "completed" => Ok(ActStatus::Completed),
            "nullified" => Ok(ActStatus::Nullified),
            _ => Err(ModelError::UnknownCode {
                kind: "status",
                value: s.to_string(),
            }),
        }
    }
}

/// HL7 NullFlavor: why an element is intentionally absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NullFlavor {
    #[serde(rename = "NI")]
    NoInformation,
    #[serde(rename = "NA")]
    NotApplicable,
    #[serde(rename = "UNK")]
    Unknown,
    #[serde(rename = "ASKU")]
    AskedUnknown,
    #[serde(rename = "NAV")]
    TemporarilyUnavailable,
    #[serde(rename = "NASK")]
    NotAsked,
    #[serde(rename = "MSK")]
    Masked,
    #[serde(rename = "OTH")]
    Other,
    #[serde(rename = "PINF")]
    PositiveInfinity,
    #[serde(rename = "NINF")]
    NegativeInfinity,
}

impl NullFlavor {
    pub fn as_code(&self) -> &'static str {
        match self {
            NullFlavor::NoInformation => "NI",
            NullFlavor::NotApplicable => "NA",
            NullFlavor::Unknown => "UNK",
            NullFlavor::AskedUnknown => "ASKU",
            NullFlavor::TemporarilyUnavailable => "NAV",
            NullFlavor::NotAsked => "NASK",
            NullFlavor::Masked => "MSK",
            NullFlavor::Other => "OTH",
            NullFlavor::PositiveInfinity => "PINF",
            NullFlavor::NegativeInfinity => "NINF",
        }
    }
}

impl fmt::Display for NullFlavor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_code())
    }
}

/// Type of an external reference (`reference/@typeCode`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReferenceType {
    #[serde(rename = "RPLC")]
    Replaces,
    #[serde(rename = "APND")]
    Appends,
    #[serde(rename = "SUBJ")]
    Subject,
    #[serde(rename = "REFR")]
    Refers,
    #[serde(rename = "XCRPT")]
    Excerpts,
    #[serde(rename = "ELNK")]
    Elaborates,
    #[serde(rename = "SPRT")]
    Supports,
}

/// Type of an entry relationship (`entryRelationship/@typeCode`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RelationshipType {
    #[serde(rename = "COMP")]
    Component,
    #[serde(rename = "RSON")]
    Reason,
    #[serde(rename = "SPRT")]
    Supports,
    #[serde(rename = "CAUS")]
    Cause,
    #[serde(rename = "GEVL")]
    Evaluates,
    #[serde(rename = "MFST")]
    Manifestation,
    #[serde(rename = "REFR")]
    Refers,
    #[serde(rename = "SAS")]
    StartsAfterStart,
    #[serde(rename = "SUBJ")]
    Subject,
    #[serde(rename = "XCRPT")]
    Excerpt,
}

/// Category of an allergy or intolerance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AllergyCategory {
    Food,
    Drug,
    Environment,
    Other,
}

impl AllergyCategory {
    /// Derives the category from an allergy and intolerance observation code
    /// (HL7 ObservationIntoleranceType).
    ///
    /// Unrecognised codes, including the generic `ALG`/`OINT`, map to `Other`.
    pub fn from_observation_code(code: &str) -> Self {
        match code.trim().to_ascii_uppercase().as_str() {
            "FALG" | "FINT" | "FNAINT" => AllergyCategory::Food,
            "DALG" | "DINT" | "DNAINT" => AllergyCategory::Drug,
            "EALG" | "EINT" | "ENAINT" => AllergyCategory::Environment,
            _ => AllergyCategory::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AllergyCategory::Food => "Food",
            AllergyCategory::Drug => "Drug",
            AllergyCategory::Environment => "Environment",
            AllergyCategory::Other => "Other",
        }
    }
}

impl fmt::Display for AllergyCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Severity level coded on a severity observation (`L`, `M`, `H`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SeverityLevel {
    Mild,
    Moderate,
    Severe,
}

impl SeverityLevel {
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_ascii_uppercase().as_str() {
            "L" => Some(SeverityLevel::Mild),
            "M" => Some(SeverityLevel::Moderate),
            "H" => Some(SeverityLevel::Severe),
            _ => None,
        }
    }

    pub fn as_code(&self) -> &'static str {
        match self {
            SeverityLevel::Mild => "L",
            SeverityLevel::Moderate => "M",
            SeverityLevel::Severe => "H",
        }
    }
}

/// Clinical status of a condition record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionStatus {
    #[default]
    Active,
    Inactive,
    HistoryOf,
}

impl ConditionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConditionStatus::Active => "Active",
            ConditionStatus::Inactive => "Inactive",
            ConditionStatus::HistoryOf => "History of",
        }
    }
}

impl fmt::Display for ConditionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
