//! Shared fixtures for the import integration tests.
#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};

use cda_core::{
    EncounterContext, ImportError, ImportReport, MemoryRecordStore, MemoryVocabulary,
    default_registry, import_document,
};
use cda_model::templates::{
    CCD_ALERT_OBSERVATION, CCD_PROBLEM_ACT, CCD_PROBLEM_OBSERVATION, CCD_REACTION_OBSERVATION,
    CCD_SEVERITY_OBSERVATION, CODE_SYSTEM_ACT_CODE, CODE_SYSTEM_OBSERVATION_VALUE,
    ENT_ALLERGIES_AND_INTOLERANCES_CONCERN, ENT_ALLERGY_AND_INTOLERANCE_OBSERVATION,
    ENT_CONCERN_ENTRY, ENT_MANIFESTATION_RELATION, ENT_PROBLEM_CONCERN, ENT_PROBLEM_OBSERVATION,
    ENT_SEVERITY_OBSERVATION,
};
use cda_model::{
    ActStatus, Allergy, Author, ClinicalStatement, CodedValue, Condition, DocumentNode,
    EntryRelationship, ImportOptions, InstanceIdentifier, NullFlavor, ObservationValue, PatientId,
    ReferenceType, RelationshipType, SeverityConcepts, Timestamp,
};

pub const SNOMED: &str = "2.16.840.1.113883.6.96";
pub const RXNORM: &str = "2.16.840.1.113883.6.88";
pub const DOCUMENT_ROOT: &str = "2.16.840.1.113883.19.5";

pub const SEVERE_CONCEPT: &str = "24484000";
pub const UNKNOWN_SEVERITY_CONCEPT: &str = "261665006";

pub fn ts(value: &str) -> Timestamp {
    value.parse().expect("valid timestamp")
}

pub fn act_id(extension: &str) -> InstanceIdentifier {
    InstanceIdentifier::new(DOCUMENT_ROOT)
        .expect("valid root")
        .with_extension(extension)
}

pub fn patient() -> PatientId {
    PatientId::new("patient-42").expect("valid patient id")
}

pub fn encounter_date() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 15, 9, 30, 0)
        .single()
        .expect("valid date")
}

pub fn severity_concepts() -> SeverityConcepts {
    SeverityConcepts {
        mild: Some(CodedValue::new("255604002", SNOMED).with_display_name("Mild")),
        moderate: Some(CodedValue::new("6736007", SNOMED).with_display_name("Moderate")),
        severe: Some(CodedValue::new(SEVERE_CONCEPT, SNOMED).with_display_name("Severe")),
        unknown: None,
    }
}

/// Store, vocabulary and configuration for one patient.
pub struct Fixture {
    pub store: MemoryRecordStore,
    pub vocabulary: MemoryVocabulary,
    pub options: ImportOptions,
    pub encounter: EncounterContext,
}

impl Fixture {
    pub fn new() -> Self {
        Self {
            store: MemoryRecordStore::new(),
            vocabulary: MemoryVocabulary::new(),
            options: ImportOptions::new().with_severity_concepts(severity_concepts()),
            encounter: EncounterContext::new(patient(), encounter_date())
                .with_author(Author::named("Dr. Import")),
        }
    }

    pub fn with_options(mut self, options: ImportOptions) -> Self {
        self.options = options;
        self
    }

    pub fn import(&mut self, node: &DocumentNode) -> Result<ImportReport, ImportError> {
        let registry = default_registry().expect("default registry builds");
        import_document(
            node,
            registry,
            &self.options,
            &self.encounter,
            &mut self.store,
            &mut self.vocabulary,
        )
    }

    pub fn allergies(&self) -> Vec<&Allergy> {
        self.store.allergies(&self.encounter.patient).collect()
    }

    pub fn conditions(&self) -> Vec<&Condition> {
        self.store.conditions(&self.encounter.patient).collect()
    }

    pub fn only_allergy(&self) -> &Allergy {
        let allergies = self.allergies();
        assert_eq!(allergies.len(), 1, "expected exactly one allergy");
        allergies[0]
    }
}

fn subject(node: DocumentNode) -> EntryRelationship {
    EntryRelationship::new(RelationshipType::Subject, node)
}

pub fn severity_observation(code: &str) -> DocumentNode {
    DocumentNode::Observation(
        ClinicalStatement::new()
            .with_template(ENT_SEVERITY_OBSERVATION)
            .with_template(CCD_SEVERITY_OBSERVATION)
            .with_code(CodedValue::new("SEV", CODE_SYSTEM_ACT_CODE))
            .with_status(ActStatus::Completed)
            .with_value(ObservationValue::Coded(CodedValue::new(
                code,
                CODE_SYSTEM_OBSERVATION_VALUE,
            ))),
    )
}

pub fn manifestation(code: &str, note: &str) -> EntryRelationship {
    let mut observation = ClinicalStatement::new()
        .with_template(ENT_MANIFESTATION_RELATION)
        .with_template(CCD_REACTION_OBSERVATION)
        .with_code(CodedValue::new("ASSERTION", CODE_SYSTEM_ACT_CODE))
        .with_value(ObservationValue::Coded(CodedValue::new(code, SNOMED)));
    observation.text = Some(note.to_string());
    EntryRelationship::new(
        RelationshipType::Manifestation,
        DocumentNode::Observation(observation),
    )
}

/// Allergy and intolerance entry coded `DALG` with a Penicillin participant.
pub fn allergy_observation(low: Option<Timestamp>, high: Option<Timestamp>) -> ClinicalStatement {
    ClinicalStatement::new()
        .with_template(ENT_PROBLEM_OBSERVATION)
        .with_template(ENT_ALLERGY_AND_INTOLERANCE_OBSERVATION)
        .with_template(CCD_ALERT_OBSERVATION)
        .with_code(CodedValue::new("DALG", CODE_SYSTEM_ACT_CODE))
        .with_status(ActStatus::Completed)
        .with_effective_time(low, high)
        .with_participant(CodedValue::new("7980", RXNORM).with_display_name("Penicillin"))
}

pub fn allergy_concern(
    id: Option<InstanceIdentifier>,
    status: ActStatus,
    low: Option<Timestamp>,
    high: Option<Timestamp>,
    observation: ClinicalStatement,
) -> ClinicalStatement {
    let mut concern = ClinicalStatement::new()
        .with_template(ENT_CONCERN_ENTRY)
        .with_template(ENT_ALLERGIES_AND_INTOLERANCES_CONCERN)
        .with_template(CCD_PROBLEM_ACT)
        .with_code(CodedValue::null(NullFlavor::NotApplicable))
        .with_status(status)
        .with_effective_time(low, high)
        .with_relationship(subject(DocumentNode::Observation(observation)));
    concern.id = id;
    concern
}

/// Scenario-A shaped allergy concern: Penicillin, drug allergy, severity `H`.
pub fn penicillin_allergy(
    extension: &str,
    status: ActStatus,
    low: Option<Timestamp>,
    high: Option<Timestamp>,
) -> DocumentNode {
    let observation = allergy_observation(low, high)
        .with_relationship(subject(severity_observation("H")));
    DocumentNode::Act(allergy_concern(
        Some(act_id(extension)),
        status,
        low,
        high,
        observation,
    ))
}

pub fn replacing(node: DocumentNode, replaced: &str) -> DocumentNode {
    match node {
        DocumentNode::Act(statement) => {
            DocumentNode::Act(statement.with_reference(ReferenceType::Replaces, act_id(replaced)))
        }
        other => other,
    }
}

pub fn problem_observation(code: &str, low: Option<Timestamp>, high: Option<Timestamp>) -> ClinicalStatement {
    ClinicalStatement::new()
        .with_template(ENT_PROBLEM_OBSERVATION)
        .with_template(CCD_PROBLEM_OBSERVATION)
        .with_code(CodedValue::new("64572001", SNOMED).with_display_name("Condition"))
        .with_status(ActStatus::Completed)
        .with_effective_time(low, high)
        .with_value(ObservationValue::Coded(
            CodedValue::new(code, SNOMED).with_display_name("Hypertension"),
        ))
}

pub fn condition_concern(
    extension: &str,
    status: ActStatus,
    low: Option<Timestamp>,
    high: Option<Timestamp>,
) -> ClinicalStatement {
    let mut concern = ClinicalStatement::new()
        .with_template(ENT_CONCERN_ENTRY)
        .with_template(ENT_PROBLEM_CONCERN)
        .with_template(CCD_PROBLEM_ACT)
        .with_code(CodedValue::null(NullFlavor::NotApplicable))
        .with_status(status)
        .with_effective_time(low, high)
        .with_relationship(subject(DocumentNode::Observation(problem_observation(
            "38341003", low, high,
        ))));
    concern.id = Some(act_id(extension));
    concern
}
