//! Base rules shared by every act and observation template.

use cda_model::{DocumentNode, ValidationIssueCollection};

/// The node must be an act or observation.
pub fn clinical_statement(node: &DocumentNode, issues: &mut ValidationIssueCollection) {
    if node.as_statement().is_none() {
        issues.error(format!(
            "Expected an act or observation, found {}",
            node.kind()
        ));
    }
}

/// The node must declare at least one template identifier.
pub fn declares_template(node: &DocumentNode, issues: &mut ValidationIssueCollection) {
    if node.template_ids().is_empty() {
        issues.error(format!("{} does not declare any templateId", node.kind()));
    }
}

/// An identifier is needed for duplicate detection; without one every
/// re-import creates a new record.
pub fn carries_identifier(node: &DocumentNode, issues: &mut ValidationIssueCollection) {
    if node.as_statement().is_some_and(|statement| statement.id.is_none()) {
        issues.warn(format!(
            "{} carries no id; re-imports cannot be detected",
            node.kind()
        ));
    }
}
