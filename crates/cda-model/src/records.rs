//! Clinical domain records produced by an import.
//!
//! Allergies and conditions are longitudinal list items: they outlive the
//! document that created them and are reconciled against every later import.
//! Generic observations are the per-document facts those items are derived
//! from; they back the temporal bounds of the list items for audit.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::document::Author;
use crate::enums::{AllergyCategory, ConditionStatus};
use crate::ids::{InstanceIdentifier, ObservationId, PatientId, RecordKey, TemplateId};
use crate::timestamp::{DatePrecision, Timestamp};

/// A concept resolved through the vocabulary service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConceptRef {
    pub id: u64,
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_system: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

impl fmt::Display for ConceptRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.display_name {
            Some(name) => write!(f, "{name} ({})", self.code),
            None => f.write_str(&self.code),
        }
    }
}

/// Creation, change and void stamps.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditInfo {
    pub creator: Option<Author>,
    pub date_created: Option<DateTime<Utc>>,
    pub changed_by: Option<Author>,
    pub date_changed: Option<DateTime<Utc>>,
    pub voided: bool,
    pub void_reason: Option<String>,
    pub date_voided: Option<DateTime<Utc>>,
}

impl AuditInfo {
    pub fn void(&mut self, reason: impl Into<String>, at: DateTime<Utc>) {
        self.voided = true;
        self.void_reason = Some(reason.into());
        self.date_voided = Some(at);
    }
}

/// Start/end of a list item and the observations that established them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemporalBounds {
    pub start: Option<Timestamp>,
    pub end: Option<Timestamp>,
    pub start_obs: Option<ObservationId>,
    pub stop_obs: Option<ObservationId>,
}

/// Fields every list item shares.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordHeader {
    pub key: Option<RecordKey>,
    pub patient: Option<PatientId>,
    /// Accession numbers of every act reconciled into this record.
    pub external_ids: Vec<InstanceIdentifier>,
    pub audit: AuditInfo,
    pub bounds: TemporalBounds,
}

impl RecordHeader {
    pub fn has_external_id(&self, id: &InstanceIdentifier) -> bool {
        self.external_ids.contains(id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllergyReaction {
    pub reaction: ConceptRef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Allergy {
    pub header: RecordHeader,
    pub allergen: Option<ConceptRef>,
    pub category: Option<AllergyCategory>,
    pub severity: Option<ConceptRef>,
    pub reactions: Vec<AllergyReaction>,
}

impl Allergy {
    pub fn start_date(&self) -> Option<Timestamp> {
        self.header.bounds.start
    }

    pub fn end_date(&self) -> Option<Timestamp> {
        self.header.bounds.end
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Condition {
    pub header: RecordHeader,
    pub concept: Option<ConceptRef>,
    pub status: ConditionStatus,
}

impl Condition {
    pub fn onset_date(&self) -> Option<Timestamp> {
        self.header.bounds.start
    }

    pub fn end_date(&self) -> Option<Timestamp> {
        self.header.bounds.end
    }
}

/// An observation persisted for the encounter being imported, with the
/// temporal facts derived from its node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtendedObservation {
    pub id: Option<ObservationId>,
    pub patient: Option<PatientId>,
    pub template_ids: Vec<TemplateId>,
    pub accession_number: Option<String>,
    pub concept: Option<ConceptRef>,
    pub value_coded: Option<ConceptRef>,
    pub value_text: Option<String>,
    pub value_numeric: Option<f64>,
    pub start: Option<Timestamp>,
    pub end: Option<Timestamp>,
    /// `None` when the node gave no usable time at all.
    pub date_precision: Option<DatePrecision>,
    pub previous_version: Option<ObservationId>,
    /// Observations persisted from this observation's own relationships.
    pub members: Vec<ObservationId>,
    pub audit: AuditInfo,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    Allergy,
    Condition,
    Observation,
}

impl RecordKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::Allergy => "Allergy",
            RecordKind::Condition => "Condition",
            RecordKind::Observation => "Observation",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum DomainRecord {
    Allergy(Allergy),
    Condition(Condition),
    Observation(ExtendedObservation),
}

impl DomainRecord {
    pub fn kind(&self) -> RecordKind {
        match self {
            DomainRecord::Allergy(_) => RecordKind::Allergy,
            DomainRecord::Condition(_) => RecordKind::Condition,
            DomainRecord::Observation(_) => RecordKind::Observation,
        }
    }

    /// List-item header; observations have none.
    pub fn header(&self) -> Option<&RecordHeader> {
        match self {
            DomainRecord::Allergy(allergy) => Some(&allergy.header),
            DomainRecord::Condition(condition) => Some(&condition.header),
            DomainRecord::Observation(_) => None,
        }
    }

    pub fn audit(&self) -> &AuditInfo {
        match self {
            DomainRecord::Allergy(allergy) => &allergy.header.audit,
            DomainRecord::Condition(condition) => &condition.header.audit,
            DomainRecord::Observation(obs) => &obs.audit,
        }
    }

    pub fn patient(&self) -> Option<&PatientId> {
        match self {
            DomainRecord::Allergy(allergy) => allergy.header.patient.as_ref(),
            DomainRecord::Condition(condition) => condition.header.patient.as_ref(),
            DomainRecord::Observation(obs) => obs.patient.as_ref(),
        }
    }

    pub fn is_voided(&self) -> bool {
        self.audit().voided
    }

    pub fn as_allergy(&self) -> Option<&Allergy> {
        match self {
            DomainRecord::Allergy(allergy) => Some(allergy),
            _ => None,
        }
    }

    pub fn as_condition(&self) -> Option<&Condition> {
        match self {
            DomainRecord::Condition(condition) => Some(condition),
            _ => None,
        }
    }

    pub fn as_observation(&self) -> Option<&ExtendedObservation> {
        match self {
            DomainRecord::Observation(obs) => Some(obs),
            _ => None,
        }
    }
}
