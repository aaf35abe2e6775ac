use cda_model::{DocumentNode, ValidationIssueCollection};
use tracing::debug;

/// A validation rule: inspects a node and appends issues.
pub trait Rule {
    fn apply(&self, node: &DocumentNode, issues: &mut ValidationIssueCollection);
}

impl<F> Rule for F
where
    F: Fn(&DocumentNode, &mut ValidationIssueCollection),
{
    fn apply(&self, node: &DocumentNode, issues: &mut ValidationIssueCollection) {
        self(node, issues)
    }
}

/// Short-circuiting rule chain over one node.
///
/// ```
/// use cda_model::{ClinicalStatement, DocumentNode};
/// use cda_validate::{Validator, checks};
///
/// let node = DocumentNode::Act(ClinicalStatement::new());
/// let issues = Validator::new(&node)
///     .check(checks::statement::clinical_statement)
///     .check(checks::concern::concern_entry)
///     .finish();
/// assert!(issues.has_errors());
/// ```
pub struct Validator<'a> {
    node: &'a DocumentNode,
    issues: ValidationIssueCollection,
}

impl<'a> Validator<'a> {
    pub fn new(node: &'a DocumentNode) -> Self {
        Self {
            node,
            issues: ValidationIssueCollection::new(),
        }
    }

    /// Run `rule` unless an earlier rule already reported an error.
    #[must_use]
    pub fn check(mut self, rule: impl Rule) -> Self {
        if !self.issues.has_errors() {
            rule.apply(self.node, &mut self.issues);
        }
        self
    }

    /// Merge issues produced elsewhere, e.g. by a shared processor's rule set.
    #[must_use]
    pub fn extend(mut self, issues: ValidationIssueCollection) -> Self {
        self.issues.extend(issues);
        self
    }

    pub fn finish(self) -> ValidationIssueCollection {
        debug!(
            kind = %self.node.kind(),
            errors = self.issues.error_count(),
            warnings = self.issues.warning_count(),
            "validated node"
        );
        self.issues
    }
}

/// One issue per line, `severity: message`.
pub fn render_issues(issues: &ValidationIssueCollection) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use cda_model::ClinicalStatement;

    fn always_error(_: &DocumentNode, issues: &mut ValidationIssueCollection) {
        issues.error("first");
    }

    fn always_warn(_: &DocumentNode, issues: &mut ValidationIssueCollection) {
        issues.warn("second");
    }

    #[test]
    fn later_rules_skipped_after_error() {
        let node = DocumentNode::Act(ClinicalStatement::new());
        let issues = Validator::new(&node)
            .check(always_error)
            .check(always_warn)
            .finish();
        assert_eq!(issues.len(), 1);
        assert_eq!(render_issues(&issues), "error: first");
    }

    #[test]
    fn warnings_do_not_short_circuit() {
        let node = DocumentNode::Act(ClinicalStatement::new());
        let issues = Validator::new(&node)
            .check(always_warn)
            .check(always_error)
            .finish();
        assert_eq!(render_issues(&issues), "warning: second\nerror: first");
    }
}
