//! Coded section rules.

use cda_model::templates::CODE_SYSTEM_LOINC;
use cda_model::{DocumentNode, ValidationIssueCollection};

/// The node must be a section.
pub fn is_section(node: &DocumentNode, issues: &mut ValidationIssueCollection) {
    if node.as_section().is_none() {
        issues.error(format!("Expected a section, found {}", node.kind()));
    }
}

/// The section code must be the LOINC `code`. Absent codes only warn.
pub fn loinc_code(
    code: &'static str,
    name: &'static str,
) -> impl Fn(&DocumentNode, &mut ValidationIssueCollection) {
    move |node, issues| {
        let Some(section) = node.as_section() else {
            return;
        };
        let Some(actual) = section.code.as_ref().filter(|value| !value.is_null()) else {
            issues.warn(format!("{name} section should carry code {code}"));
            return;
        };
        let system_matches = actual
            .code_system
            .as_deref()
            .is_none_or(|system| system == CODE_SYSTEM_LOINC);
        if actual.code() != Some(code) || !system_matches {
            issues.error(format!(
                "{name} section code {actual} does not match expected {code}@{CODE_SYSTEM_LOINC}"
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cda_model::{CodedValue, Section};

    fn check(section: Section) -> ValidationIssueCollection {
        let mut issues = ValidationIssueCollection::new();
        loinc_code("10164-2", "History of Present Illness")(
            &DocumentNode::Section(section),
            &mut issues,
        );
        issues
    }

    #[test]
    fn matching_code_passes() {
        let issues = check(Section::default().with_code(CodedValue::new("10164-2", CODE_SYSTEM_LOINC)));
        assert!(issues.is_empty());
    }

    #[test]
    fn missing_code_warns() {
        let issues = check(Section::default());
        assert_eq!(issues.warning_count(), 1);
        assert!(!issues.has_errors());
    }

    #[test]
    fn wrong_code_fails() {
        let issues = check(Section::default().with_code(CodedValue::new("48765-2", CODE_SYSTEM_LOINC)));
        assert!(issues.has_errors());
    }
}
