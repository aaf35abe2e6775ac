//! Replacement, voiding, bound widening and failure propagation.

mod common;

use cda_core::{ImportError, MAX_DEPTH};
use cda_model::templates::ENT_SEVERITY_OBSERVATION;
use cda_model::{
    ActStatus, ClinicalStatement, CodedValue, DatePrecision, DocumentNode, EntryRelationship,
    ImportOptions, RelationshipType, SeverityConcepts,
};

use common::{
    Fixture, SNOMED, UNKNOWN_SEVERITY_CONCEPT, act_id, allergy_concern, allergy_observation,
    encounter_date, manifestation, penicillin_allergy, replacing, severity_concepts,
    severity_observation, ts,
};

fn concern_with(observation: ClinicalStatement) -> DocumentNode {
    DocumentNode::Act(allergy_concern(
        Some(act_id("allergy-1")),
        ActStatus::Active,
        Some(ts("20200101")),
        None,
        observation,
    ))
}

#[test]
fn replacement_widens_onset_and_versions_bounding_observation() {
    let mut fixture = Fixture::new();
    fixture
        .import(&penicillin_allergy(
            "allergy-1",
            ActStatus::Active,
            Some(ts("20200101")),
            None,
        ))
        .expect("first import");
    let original_start_obs = fixture.only_allergy().header.bounds.start_obs.expect("start obs");

    let replacement = replacing(
        penicillin_allergy("allergy-2", ActStatus::Active, Some(ts("20190601")), None),
        "allergy-1",
    );
    fixture.import(&replacement).expect("replacement import");

    let allergy = fixture.only_allergy();
    assert_eq!(allergy.start_date(), Some(ts("20190601")));
    assert_eq!(
        allergy.header.external_ids,
        vec![act_id("allergy-1"), act_id("allergy-2")]
    );

    let new_start_obs = allergy.header.bounds.start_obs.expect("start obs");
    assert_ne!(new_start_obs, original_start_obs);

    let superseded = fixture.store.observation(original_start_obs).expect("old obs");
    assert!(superseded.audit.voided);
    assert_eq!(superseded.audit.void_reason.as_deref(), Some("Replaced"));
    let successor = fixture.store.observation(new_start_obs).expect("new obs");
    assert_eq!(successor.previous_version, Some(original_start_obs));
}

fn live_allergies_carrying(fixture: &Fixture, id: &str) -> usize {
    fixture
        .allergies()
        .iter()
        .filter(|allergy| !allergy.header.audit.voided && allergy.header.has_external_id(&act_id(id)))
        .count()
}

#[test]
fn replacing_act_whose_id_is_on_file_is_a_duplicate() {
    let mut fixture = Fixture::new();
    let first = penicillin_allergy("allergy-1", ActStatus::Active, Some(ts("20200101")), None);
    fixture.import(&first).expect("first import");
    fixture
        .import(&penicillin_allergy(
            "allergy-9",
            ActStatus::Active,
            Some(ts("20210101")),
            None,
        ))
        .expect("second import");
    let before = fixture.store.clone();

    let err = fixture.import(&replacing(first, "allergy-9")).unwrap_err();
    assert!(
        matches!(&err, ImportError::Duplicate { id } if *id == act_id("allergy-1")),
        "{err:?}"
    );
    assert_eq!(fixture.store, before);
    assert_eq!(live_allergies_carrying(&fixture, "allergy-1"), 1);
}

#[test]
fn replacing_act_whose_id_is_on_file_updates_that_record() {
    let mut fixture = Fixture::new().with_options(
        ImportOptions::new()
            .with_update_existing(true)
            .with_severity_concepts(severity_concepts()),
    );
    let first = penicillin_allergy("allergy-1", ActStatus::Active, Some(ts("20200101")), None);
    fixture.import(&first).expect("first import");
    fixture
        .import(&penicillin_allergy(
            "allergy-9",
            ActStatus::Active,
            Some(ts("20210101")),
            None,
        ))
        .expect("second import");

    fixture
        .import(&replacing(first, "allergy-9"))
        .expect("update in place");
    assert_eq!(fixture.allergies().len(), 2);
    assert_eq!(live_allergies_carrying(&fixture, "allergy-1"), 1);
    let replaced = fixture
        .allergies()
        .into_iter()
        .find(|allergy| allergy.header.has_external_id(&act_id("allergy-9")))
        .expect("replaced allergy");
    assert_eq!(replaced.header.external_ids, vec![act_id("allergy-9")]);
}

#[test]
fn reimporting_a_replacing_act_is_a_duplicate() {
    let mut fixture = Fixture::new();
    fixture
        .import(&penicillin_allergy(
            "allergy-1",
            ActStatus::Active,
            Some(ts("20200101")),
            None,
        ))
        .expect("first import");
    let replacement = replacing(
        penicillin_allergy("allergy-2", ActStatus::Active, Some(ts("20190601")), None),
        "allergy-1",
    );
    fixture.import(&replacement).expect("replacement import");

    let err = fixture.import(&replacement).unwrap_err();
    assert!(
        matches!(&err, ImportError::Duplicate { id } if *id == act_id("allergy-2")),
        "{err:?}"
    );
    assert_eq!(live_allergies_carrying(&fixture, "allergy-2"), 1);
}

#[test]
fn later_onset_never_narrows_bounds() {
    let mut fixture = Fixture::new().with_options(
        ImportOptions::new()
            .with_update_existing(true)
            .with_severity_concepts(severity_concepts()),
    );
    fixture
        .import(&penicillin_allergy(
            "allergy-1",
            ActStatus::Active,
            Some(ts("20200101")),
            None,
        ))
        .expect("first import");
    let start_obs = fixture.only_allergy().header.bounds.start_obs;

    fixture
        .import(&penicillin_allergy(
            "allergy-1",
            ActStatus::Active,
            Some(ts("20200601")),
            None,
        ))
        .expect("second import");
    let allergy = fixture.only_allergy();
    assert_eq!(allergy.start_date(), Some(ts("20200101")));
    assert_eq!(allergy.header.bounds.start_obs, start_obs);
}

#[test]
fn unknown_replacement_target_creates_new_record() {
    let mut fixture = Fixture::new();
    let node = replacing(
        penicillin_allergy("allergy-2", ActStatus::Active, Some(ts("20200101")), None),
        "never-imported",
    );
    fixture.import(&node).expect("import succeeds");
    assert_eq!(fixture.only_allergy().header.external_ids, vec![act_id("allergy-2")]);
}

#[test]
fn aborted_concern_voids_record_after_merge() {
    let mut fixture = Fixture::new();
    let node = penicillin_allergy(
        "allergy-1",
        ActStatus::Aborted,
        Some(ts("20200101")),
        Some(ts("20200201")),
    );
    fixture.import(&node).expect("import succeeds");

    let allergy = fixture.only_allergy();
    let audit = &allergy.header.audit;
    assert!(audit.voided);
    assert_eq!(audit.void_reason.as_deref(), Some("aborted"));
    assert_eq!(audit.date_voided, Some(encounter_date()));
    assert_eq!(allergy.end_date(), Some(ts("20200201")));
}

#[test]
fn suspended_concern_voids_record() {
    let mut fixture = Fixture::new();
    let node = penicillin_allergy("allergy-1", ActStatus::Suspended, Some(ts("20200101")), None);
    fixture.import(&node).expect("import succeeds");
    let audit = &fixture.only_allergy().header.audit;
    assert!(audit.voided);
    assert_eq!(audit.void_reason.as_deref(), Some("suspended"));
}

#[test]
fn voided_record_does_not_block_reimport() {
    let mut fixture = Fixture::new();
    fixture
        .import(&penicillin_allergy(
            "allergy-1",
            ActStatus::Suspended,
            Some(ts("20200101")),
            None,
        ))
        .expect("first import");
    fixture
        .import(&penicillin_allergy(
            "allergy-1",
            ActStatus::Active,
            Some(ts("20200101")),
            None,
        ))
        .expect("second import");
    let allergies = fixture.allergies();
    assert_eq!(allergies.len(), 2);
    assert_eq!(allergies.iter().filter(|a| !a.header.audit.voided).count(), 1);
}

#[test]
fn entirely_unknown_bounds_still_get_start_observation() {
    let mut fixture = Fixture::new();
    let node = DocumentNode::Act(allergy_concern(
        Some(act_id("allergy-1")),
        ActStatus::Active,
        None,
        None,
        allergy_observation(None, None),
    ));
    fixture.import(&node).expect("import succeeds");

    let allergy = fixture.only_allergy();
    assert_eq!(allergy.start_date(), None);
    let start_obs = allergy.header.bounds.start_obs.expect("start obs assigned");
    let observation = fixture.store.observation(start_obs).expect("observation");
    assert_eq!(observation.date_precision, None);
}

#[test]
fn silent_act_falls_back_to_observation_times() {
    let mut fixture = Fixture::new();
    let node = DocumentNode::Act(allergy_concern(
        Some(act_id("allergy-1")),
        ActStatus::Active,
        None,
        None,
        allergy_observation(Some(ts("201805")), None),
    ));
    fixture.import(&node).expect("import succeeds");

    let allergy = fixture.only_allergy();
    assert_eq!(allergy.start_date(), Some(ts("201805")));
    let start_obs = allergy.header.bounds.start_obs.expect("start obs");
    let observation = fixture.store.observation(start_obs).expect("observation");
    assert_eq!(observation.date_precision, Some(DatePrecision::Month));
}

#[test]
fn missing_effective_time_on_open_act_is_an_error() {
    let mut fixture = Fixture::new().with_options(
        ImportOptions::new()
            .with_validation(false)
            .with_severity_concepts(severity_concepts()),
    );
    let mut concern = allergy_concern(
        Some(act_id("allergy-1")),
        ActStatus::Active,
        None,
        None,
        allergy_observation(Some(ts("20200101")), None),
    );
    concern.effective_time = None;

    let err = fixture.import(&DocumentNode::Act(concern.clone())).expect_err("fails");
    assert!(matches!(err, ImportError::MissingEffectiveTime));
    assert!(fixture.allergies().is_empty());

    concern.status_code = Some(ActStatus::Completed);
    fixture
        .import(&DocumentNode::Act(concern))
        .expect("completed act falls back to the observation");
    assert_eq!(fixture.only_allergy().start_date(), Some(ts("20200101")));
}

#[test]
fn validation_error_prevents_any_mutation() {
    let mut fixture = Fixture::new();
    let mut concern = allergy_concern(
        Some(act_id("allergy-1")),
        ActStatus::Active,
        Some(ts("20200101")),
        None,
        allergy_observation(Some(ts("20200101")), None),
    );
    concern.code = Some(CodedValue::new("ALG", SNOMED));

    let err = fixture.import(&DocumentNode::Act(concern)).expect_err("fails");
    assert!(err.validation_issues().is_some_and(|issues| issues.has_errors()));
    assert!(fixture.store.records().is_empty());
    assert!(fixture.store.observations().is_empty());
    assert!(fixture.vocabulary.is_empty());
}

#[test]
fn zero_one_or_many_manifestations() {
    let mut fixture = Fixture::new();
    fixture
        .import(&concern_with(allergy_observation(Some(ts("20200101")), None)))
        .expect("no manifestation");
    assert!(fixture.only_allergy().reactions.is_empty());

    let mut fixture = Fixture::new();
    fixture
        .import(&concern_with(
            allergy_observation(Some(ts("20200101")), None)
                .with_relationship(manifestation("247472004", "hives on both arms")),
        ))
        .expect("one manifestation");
    let reactions = &fixture.only_allergy().reactions;
    assert_eq!(reactions.len(), 1);
    assert_eq!(reactions[0].reaction.code, "247472004");
    assert_eq!(reactions[0].note.as_deref(), Some("hives on both arms"));

    let mut fixture = Fixture::new();
    let err = fixture
        .import(&concern_with(
            allergy_observation(Some(ts("20200101")), None)
                .with_relationship(manifestation("247472004", "hives"))
                .with_relationship(manifestation("271807003", "rash")),
        ))
        .expect_err("two manifestations");
    assert!(matches!(err, ImportError::MultipleManifestations { count: 2 }));
    assert!(fixture.allergies().is_empty());
}

#[test]
fn unmapped_severity_is_a_configuration_error() {
    let mut fixture = Fixture::new().with_options(ImportOptions::new());
    let err = fixture
        .import(&penicillin_allergy(
            "allergy-1",
            ActStatus::Active,
            Some(ts("20200101")),
            None,
        ))
        .expect_err("fails");
    assert!(err.is_configuration_error());
    assert!(matches!(
        err,
        ImportError::ConfigurationRequired {
            setting: "severity.severe"
        }
    ));
}

#[test]
fn several_severities_fall_back_to_unknown_concept() {
    let severity = SeverityConcepts {
        unknown: Some(CodedValue::new(UNKNOWN_SEVERITY_CONCEPT, SNOMED)),
        ..severity_concepts()
    };
    let mut fixture =
        Fixture::new().with_options(ImportOptions::new().with_severity_concepts(severity));
    let observation = allergy_observation(Some(ts("20200101")), None)
        .with_relationship(EntryRelationship::new(
            RelationshipType::Subject,
            severity_observation("H"),
        ))
        .with_relationship(EntryRelationship::new(
            RelationshipType::Subject,
            severity_observation("L"),
        ));

    let report = fixture.import(&concern_with(observation)).expect("import succeeds");
    assert!(
        report
            .issues
            .iter()
            .any(|reported| reported.issue.message.contains("at most 1"))
    );
    let severity = fixture.only_allergy().severity.as_ref().expect("severity");
    assert_eq!(severity.code, UNKNOWN_SEVERITY_CONCEPT);
}

#[test]
fn absent_severity_without_fallback_stays_unset() {
    let mut fixture = Fixture::new();
    fixture
        .import(&concern_with(allergy_observation(Some(ts("20200101")), None)))
        .expect("import succeeds");
    assert!(fixture.only_allergy().severity.is_none());
}

#[test]
fn uncoded_allergen_is_rejected() {
    let mut fixture = Fixture::new();
    let mut observation = allergy_observation(Some(ts("20200101")), None);
    observation.participants.clear();
    let err = fixture.import(&concern_with(observation)).expect_err("fails");
    assert!(matches!(err, ImportError::AllergenNotCoded));
    assert!(fixture.store.observations().is_empty());
}

#[test]
fn two_primary_observations_are_rejected() {
    let mut fixture = Fixture::new();
    let concern = allergy_concern(
        Some(act_id("allergy-1")),
        ActStatus::Active,
        Some(ts("20200101")),
        None,
        allergy_observation(Some(ts("20200101")), None),
    )
    .with_relationship(EntryRelationship::new(
        RelationshipType::Subject,
        DocumentNode::Observation(allergy_observation(Some(ts("20200101")), None)),
    ));
    let err = fixture.import(&DocumentNode::Act(concern)).expect_err("fails");
    assert!(matches!(
        err,
        ImportError::MultiplePrimaryObservations { count: 2, .. }
    ));
}

#[test]
fn missing_author_is_reported() {
    let mut fixture = Fixture::new();
    fixture.encounter.authors.clear();
    let err = fixture
        .import(&penicillin_allergy(
            "allergy-1",
            ActStatus::Active,
            Some(ts("20200101")),
            None,
        ))
        .expect_err("fails");
    assert!(matches!(err, ImportError::MissingAuthor));
}

#[test]
fn pathological_nesting_is_refused() {
    let mut node = DocumentNode::Act(ClinicalStatement::new().with_template("9.9.9"));
    for _ in 0..MAX_DEPTH + 5 {
        node = DocumentNode::Act(
            ClinicalStatement::new()
                .with_template("9.9.9")
                .with_relationship(EntryRelationship::new(RelationshipType::Component, node)),
        );
    }
    let mut fixture = Fixture::new();
    let err = fixture.import(&node).expect_err("fails");
    assert!(matches!(err, ImportError::DepthExceeded { limit } if limit == MAX_DEPTH));
}

#[test]
fn severity_observation_alone_imports_as_observation() {
    let mut fixture = Fixture::new();
    let report = fixture
        .import(&severity_observation("M"))
        .expect("import succeeds");
    assert!(report.records.is_empty());
    assert_eq!(report.observations_saved, 1);
    let observation = &fixture.store.observations()[0];
    assert!(
        observation
            .template_ids
            .iter()
            .any(|id| id.is_root(ENT_SEVERITY_OBSERVATION))
    );
    assert_eq!(
        observation.value_coded.as_ref().map(|v| v.code.as_str()),
        Some("M")
    );
}
