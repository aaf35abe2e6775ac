//! Observation value rules.

use cda_model::{DocumentNode, ObservationValue, SeverityLevel, ValidationIssueCollection};

pub fn coded_value(node: &DocumentNode, issues: &mut ValidationIssueCollection) {
    let Some(observation) = node.as_statement() else {
        return;
    };
    match &observation.value {
        None => issues.warn("Observation carries no value"),
        Some(ObservationValue::Coded(value)) if value.is_null() => {
            issues.warn("Observation value is null-flavored");
        }
        Some(ObservationValue::Coded(_)) => {}
        Some(_) => issues.warn("Observation value should be of type CD"),
    }
}

/// Severity observations carry `L`, `M` or `H` from ObservationValue.
pub fn severity_value(node: &DocumentNode, issues: &mut ValidationIssueCollection) {
    let Some(observation) = node.as_statement() else {
        return;
    };
    let code = observation.value_coded().and_then(|value| value.code());
    match code {
        Some(code) if SeverityLevel::from_code(code).is_some() => {}
        Some(code) => issues.warn(format!(
            "Severity value {code:?} is not one of L, M, H and will be ignored"
        )),
        None => issues.warn("Severity observation must carry a coded value"),
    }
}

/// The observation code must be present and not null-flavored.
pub fn coded_code(node: &DocumentNode, issues: &mut ValidationIssueCollection) {
    let Some(observation) = node.as_statement() else {
        return;
    };
    if observation.code.as_ref().is_none_or(|code| code.is_null()) {
        issues.error("Observation must carry a code");
    }
}
