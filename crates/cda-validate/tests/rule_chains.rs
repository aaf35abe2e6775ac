//! Rule chains as template processors compose them.

use cda_model::templates::{ENT_ALLERGY_AND_INTOLERANCE_OBSERVATION, ENT_SEVERITY_OBSERVATION};
use cda_model::{
    ActStatus, ClinicalStatement, CodedValue, DocumentNode, EntryRelationship, NullFlavor,
    ObservationValue, RelationshipType, Section, Timestamp,
};
use cda_validate::{Validator, checks, render_issues};

fn ts(value: &str) -> Option<Timestamp> {
    Some(value.parse().expect("valid timestamp"))
}

fn concern_chain(node: &DocumentNode) -> String {
    let issues = Validator::new(node)
        .check(checks::statement::clinical_statement)
        .check(checks::concern::concern_entry)
        .check(checks::relationship::expects(
            ENT_ALLERGY_AND_INTOLERANCE_OBSERVATION,
            "Allergy and Intolerance Entry",
        ))
        .finish();
    render_issues(&issues)
}

#[test]
fn completed_concern_without_high_stops_chain() {
    let node = DocumentNode::Act(
        ClinicalStatement::new()
            .with_code(CodedValue::null(NullFlavor::NotApplicable))
            .with_status(ActStatus::Completed),
    );
    insta::assert_snapshot!(concern_chain(&node), @"error: Act must carry an effective time");

    let node = DocumentNode::Act(
        ClinicalStatement::new()
            .with_status(ActStatus::Completed)
            .with_effective_time(None, None),
    );
    insta::assert_snapshot!(concern_chain(&node), @r"
    warning: Act's effectiveTime element must be populated with a Low value
    error: Act's effectiveTime element must be populated with a High value when status code implies the act is completed (completed, aborted)
    ");
}

#[test]
fn concern_without_primary_observation_warns() {
    let node = DocumentNode::Act(
        ClinicalStatement::new()
            .with_status(ActStatus::Active)
            .with_effective_time(ts("20200101"), None),
    );
    insta::assert_snapshot!(
        concern_chain(&node),
        @"warning: Expected an entry relationship containing Allergy and Intolerance Entry (1.3.6.1.4.1.19376.1.5.3.1.4.6)"
    );
}

#[test]
fn concern_with_primary_observation_is_clean() {
    let observation =
        ClinicalStatement::new().with_template(ENT_ALLERGY_AND_INTOLERANCE_OBSERVATION);
    let node = DocumentNode::Act(
        ClinicalStatement::new()
            .with_status(ActStatus::Active)
            .with_effective_time(ts("20200101"), None)
            .with_relationship(EntryRelationship::new(
                RelationshipType::Subject,
                DocumentNode::Observation(observation),
            )),
    );
    assert_eq!(concern_chain(&node), "");
}

#[test]
fn section_rules_reject_statements() {
    let node = DocumentNode::Act(ClinicalStatement::new());
    let issues = Validator::new(&node)
        .check(checks::section::is_section)
        .check(checks::section::loinc_code("48765-2", "Allergies"))
        .finish();
    insta::assert_snapshot!(render_issues(&issues), @"error: Expected a section, found act");

    let node = DocumentNode::Section(Section::default());
    let issues = Validator::new(&node)
        .check(checks::section::is_section)
        .check(checks::section::loinc_code("48765-2", "Allergies"))
        .finish();
    insta::assert_snapshot!(render_issues(&issues), @"warning: Allergies section should carry code 48765-2");
}

#[test]
fn severity_chain_on_observation() {
    let node = DocumentNode::Observation(
        ClinicalStatement::new()
            .with_template(ENT_SEVERITY_OBSERVATION)
            .with_value(ObservationValue::Coded(CodedValue::new("Q", "2.16.840.1.113883.5.1063"))),
    );
    let issues = Validator::new(&node)
        .check(checks::statement::clinical_statement)
        .check(checks::observation::coded_value)
        .check(checks::observation::severity_value)
        .finish();
    insta::assert_snapshot!(
        render_issues(&issues),
        @r#"warning: Severity value "Q" is not one of L, M, H and will be ignored"#
    );
}

fn base_concern_rules(node: &DocumentNode) -> cda_model::ValidationIssueCollection {
    Validator::new(node)
        .check(checks::statement::clinical_statement)
        .check(checks::statement::declares_template)
        .check(checks::concern::concern_entry)
        .finish()
}

#[test]
fn extended_chain_stops_on_inherited_error() {
    let node = DocumentNode::Act(
        ClinicalStatement::new()
            .with_status(ActStatus::Active)
            .with_effective_time(ts("20200101"), None),
    );
    let issues = Validator::new(&node)
        .extend(base_concern_rules(&node))
        .check(checks::statement::carries_identifier)
        .finish();
    insta::assert_snapshot!(render_issues(&issues), @"error: act does not declare any templateId");
}

#[test]
fn extended_chain_keeps_inherited_warnings() {
    let node = DocumentNode::Act(
        ClinicalStatement::new()
            .with_template("1.3.6.1.4.1.19376.1.5.3.1.4.5.1")
            .with_status(ActStatus::Active)
            .with_effective_time(None, None),
    );
    let issues = Validator::new(&node)
        .extend(base_concern_rules(&node))
        .check(checks::statement::carries_identifier)
        .finish();
    insta::assert_snapshot!(render_issues(&issues), @r"
    warning: Act's effectiveTime element must be populated with a Low value
    warning: act carries no id; re-imports cannot be detected
    ");
}
