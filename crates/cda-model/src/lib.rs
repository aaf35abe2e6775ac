pub mod conformance;
pub mod document;
pub mod enums;
pub mod error;
pub mod ids;
pub mod options;
pub mod records;
pub mod templates;
pub mod timestamp;

pub use conformance::{IssueSeverity, ValidationIssue, ValidationIssueCollection};
pub use document::{
    Author, ClinicalStatement, CodedValue, DocumentNode, EffectiveTime, EntryRelationship,
    NodeKind, ObservationValue, Participant, Reference, Section,
};
pub use enums::{
    ActStatus, AllergyCategory, ConditionStatus, NullFlavor, ReferenceType, RelationshipType,
    SeverityLevel,
};
pub use error::{ModelError, Result};
pub use ids::{InstanceIdentifier, ObservationId, PatientId, RecordKey, TemplateId};
pub use options::{ImportOptions, SeverityConcepts};
pub use records::{
    Allergy, AllergyReaction, AuditInfo, ConceptRef, Condition, DomainRecord, ExtendedObservation,
    RecordHeader, RecordKind, TemporalBounds,
};
pub use timestamp::{DatePrecision, Timestamp};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issue_collection_counts() {
        let mut issues = ValidationIssueCollection::new();
        issues.error("Act must carry an effective time");
        issues.warn("Act's effectiveTime element must be populated with a Low value");
        issues.info("checked");
        assert_eq!(issues.error_count(), 1);
        assert_eq!(issues.warning_count(), 1);
        assert_eq!(issues.len(), 3);
        assert!(issues.has_errors());
    }

    #[test]
    fn warnings_alone_do_not_block() {
        let mut issues = ValidationIssueCollection::new();
        issues.warn("low bound missing");
        assert!(!issues.has_errors());
    }

    #[test]
    fn options_default_to_validating_without_update() {
        let options: ImportOptions = serde_json::from_str("{}").expect("deserialize options");
        assert!(options.validation_enabled);
        assert!(!options.update_existing);
        assert!(options.severity.severe.is_none());
    }

    #[test]
    fn domain_record_serializes_with_kind_tag() {
        let record = DomainRecord::Condition(Condition {
            status: ConditionStatus::HistoryOf,
            ..Condition::default()
        });
        let json = serde_json::to_string(&record).expect("serialize record");
        assert!(json.contains("\"kind\":\"condition\""));
        let round: DomainRecord = serde_json::from_str(&json).expect("deserialize record");
        assert_eq!(round.kind(), RecordKind::Condition);
    }
}
