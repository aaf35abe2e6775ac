//! Expected entry relationships.

use cda_model::{DocumentNode, ValidationIssueCollection};

/// Warn when a statement has no live relationship declaring `template`.
pub fn expects(
    template: &'static str,
    name: &'static str,
) -> impl Fn(&DocumentNode, &mut ValidationIssueCollection) {
    move |node, issues| {
        let Some(statement) = node.as_statement() else {
            return;
        };
        let found = statement
            .relationships_declaring(template)
            .any(|relationship| relationship.live_statement().is_some());
        if !found {
            issues.warn(format!(
                "Expected an entry relationship containing {name} ({template})"
            ));
        }
    }
}

/// Warn when more than `max` live relationships declare `template`.
pub fn at_most(
    template: &'static str,
    name: &'static str,
    max: usize,
) -> impl Fn(&DocumentNode, &mut ValidationIssueCollection) {
    move |node, issues| {
        let Some(statement) = node.as_statement() else {
            return;
        };
        let count = statement.relationships_declaring(template).count();
        if count > max {
            issues.warn(format!(
                "Found {count} entry relationships containing {name}; at most {max} will be used"
            ));
        }
    }
}
