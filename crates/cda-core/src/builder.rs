//! Domain field population from coded values in the node tree.

use tracing::{debug, warn};

use cda_model::templates::{ENT_MANIFESTATION_RELATION, ENT_SEVERITY_OBSERVATION};
use cda_model::{
    ActStatus, AllergyCategory, AllergyReaction, ClinicalStatement, CodedValue, ConceptRef,
    ConditionStatus, DocumentNode, EffectiveTime, EntryRelationship, ExtendedObservation,
    ObservationValue, RelationshipType, SeverityLevel,
};

use crate::context::ImportSession;
use crate::error::ImportError;
use crate::reconcile::author_for;

fn concept(
    session: &mut ImportSession<'_>,
    value: &CodedValue,
) -> Result<ConceptRef, ImportError> {
    Ok(session.vocabulary().resolve_or_create_concept(value)?)
}

/// The persisted form of an observation node, minus nested members.
pub fn build_observation(
    statement: &ClinicalStatement,
    session: &mut ImportSession<'_>,
) -> Result<ExtendedObservation, ImportError> {
    let encounter = session.encounter();
    let mut observation = ExtendedObservation {
        patient: Some(encounter.patient.clone()),
        template_ids: statement.template_ids.clone(),
        accession_number: statement.id.as_ref().map(ToString::to_string),
        ..ExtendedObservation::default()
    };

    if let Some(code) = statement.code.as_ref().filter(|code| !code.is_null()) {
        observation.concept = Some(concept(session, code)?);
    }
    match &statement.value {
        Some(ObservationValue::Coded(value)) if !value.is_null() => {
            observation.value_coded = Some(concept(session, value)?);
        }
        Some(ObservationValue::Text { text }) => observation.value_text = Some(text.clone()),
        Some(ObservationValue::Quantity { value, .. }) => observation.value_numeric = Some(*value),
        _ => {}
    }

    let time = statement.effective_time.as_ref().filter(|time| !time.is_null());
    observation.start = time.and_then(EffectiveTime::low);
    observation.end = time.and_then(EffectiveTime::high);
    observation.date_precision = observation
        .start
        .or(observation.end)
        .map(|timestamp| timestamp.precision());

    observation.audit.creator = Some(author_for(statement, encounter)?);
    observation.audit.date_created = Some(encounter.date_created);
    Ok(observation)
}

pub fn allergy_category(observation: &ClinicalStatement) -> Option<AllergyCategory> {
    observation
        .code
        .as_ref()
        .and_then(CodedValue::code)
        .map(AllergyCategory::from_observation_code)
}

/// The allergen: a single coded participant, else the observation value.
pub fn allergen(
    observation: &ClinicalStatement,
    extended: &ExtendedObservation,
    session: &mut ImportSession<'_>,
) -> Result<ConceptRef, ImportError> {
    let participants: Vec<&CodedValue> = observation
        .participants
        .iter()
        .filter_map(|participant| participant.playing_entity_code.as_ref())
        .filter(|code| !code.is_null())
        .collect();
    if let [only] = participants.as_slice() {
        return concept(session, only);
    }
    extended
        .value_coded
        .clone()
        .ok_or(ImportError::AllergenNotCoded)
}

#[derive(Debug, Clone, PartialEq)]
pub enum SeverityOutcome {
    /// A single severity observation mapped to its configured concept.
    Mapped(ConceptRef),
    /// No usable severity; carries the configured "unknown" concept, if any.
    Unknown(Option<ConceptRef>),
}

/// Severity from the single severity observation nested in `observation`.
///
/// # Errors
///
/// [`ImportError::ConfigurationRequired`] when the observation says `L`, `M`
/// or `H` and no concept is configured for that level.
pub fn severity(
    observation: &ClinicalStatement,
    session: &mut ImportSession<'_>,
) -> Result<SeverityOutcome, ImportError> {
    let severities: Vec<&DocumentNode> = observation
        .relationships_declaring(ENT_SEVERITY_OBSERVATION)
        .filter_map(EntryRelationship::live_statement)
        .collect();
    let level = match severities.as_slice() {
        [only] => only
            .as_statement()
            .and_then(ClinicalStatement::value_coded)
            .and_then(CodedValue::code)
            .and_then(SeverityLevel::from_code),
        _ => None,
    };

    let configured = &session.options().severity;
    match level {
        Some(level) => {
            let (setting, value) = configured.concept_for(level);
            let value = value.ok_or(ImportError::ConfigurationRequired { setting })?;
            Ok(SeverityOutcome::Mapped(concept(session, value)?))
        }
        None => {
            if severities.len() > 1 {
                debug!(count = severities.len(), "several severity observations, none used");
            }
            let unknown = match &configured.unknown {
                Some(value) => Some(concept(session, value)?),
                None => None,
            };
            Ok(SeverityOutcome::Unknown(unknown))
        }
    }
}

fn is_manifestation(relationship: &EntryRelationship) -> bool {
    relationship.type_code == Some(RelationshipType::Manifestation)
        || relationship
            .template_ids
            .iter()
            .any(|id| id.is_root(ENT_MANIFESTATION_RELATION))
        || relationship
            .statement()
            .is_some_and(|node| node.declares(ENT_MANIFESTATION_RELATION))
}

/// Reaction from the single manifestation relationship, noted with the
/// manifestation's narrative text.
///
/// # Errors
///
/// [`ImportError::MultipleManifestations`] when more than one is present.
pub fn reaction(
    observation: &ClinicalStatement,
    session: &mut ImportSession<'_>,
) -> Result<Option<AllergyReaction>, ImportError> {
    let manifestations: Vec<&DocumentNode> = observation
        .entry_relationships
        .iter()
        .filter(|relationship| is_manifestation(relationship))
        .filter_map(EntryRelationship::live_statement)
        .collect();
    match manifestations.as_slice() {
        [] => Ok(None),
        [only] => match only.as_statement().and_then(|manifestation| {
            manifestation
                .value_coded()
                .map(|value| (value, manifestation.text.clone()))
        }) {
            Some((value, note)) => Ok(Some(AllergyReaction {
                reaction: concept(session, value)?,
                note,
            })),
            None => {
                warn!("manifestation carries no coded value, reaction left unset");
                Ok(None)
            }
        },
        several => Err(ImportError::MultipleManifestations {
            count: several.len(),
        }),
    }
}

/// Negation wins over status; `None` leaves the record's status alone.
pub fn condition_status(
    concern: &ClinicalStatement,
    observation: &ClinicalStatement,
) -> Option<ConditionStatus> {
    if concern.negation_ind || observation.negation_ind {
        Some(ConditionStatus::Inactive)
    } else if concern.status_code == Some(ActStatus::Completed) {
        Some(ConditionStatus::HistoryOf)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cda_model::templates::CODE_SYSTEM_ACT_CODE;

    #[test]
    fn category_from_observation_code() {
        let observation =
            ClinicalStatement::new().with_code(CodedValue::new("DALG", CODE_SYSTEM_ACT_CODE));
        assert_eq!(allergy_category(&observation), Some(AllergyCategory::Drug));
        assert_eq!(allergy_category(&ClinicalStatement::new()), None);
    }

    #[test]
    fn negation_beats_completed_status() {
        let concern = ClinicalStatement::new()
            .with_status(ActStatus::Completed)
            .with_negation(true);
        assert_eq!(
            condition_status(&concern, &ClinicalStatement::new()),
            Some(ConditionStatus::Inactive)
        );
        let concern = ClinicalStatement::new().with_status(ActStatus::Completed);
        assert_eq!(
            condition_status(&concern, &ClinicalStatement::new()),
            Some(ConditionStatus::HistoryOf)
        );
        let concern = ClinicalStatement::new().with_status(ActStatus::Active);
        assert_eq!(condition_status(&concern, &ClinicalStatement::new()), None);
    }

    #[test]
    fn manifestation_detected_by_type_or_template() {
        let by_type = EntryRelationship::new(
            RelationshipType::Manifestation,
            DocumentNode::Observation(ClinicalStatement::new()),
        );
        let by_template = EntryRelationship::new(
            RelationshipType::Subject,
            DocumentNode::Observation(
                ClinicalStatement::new().with_template(ENT_MANIFESTATION_RELATION),
            ),
        );
        let other = EntryRelationship::new(
            RelationshipType::Subject,
            DocumentNode::Observation(ClinicalStatement::new()),
        );
        assert!(is_manifestation(&by_type));
        assert!(is_manifestation(&by_template));
        assert!(!is_manifestation(&other));
    }
}
