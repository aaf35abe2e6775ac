use cda_model::{DocumentNode, DomainRecord, ValidationIssueCollection};
use cda_validate::{Validator, checks};

use super::dispatch_relationships;
use crate::context::ImportSession;
use crate::error::ImportError;
use crate::registry::TemplateProcessor;

/// Fallback for acts no registration claims: imports nested statements only.
pub struct ActProcessor;

impl TemplateProcessor for ActProcessor {
    fn template_name(&self) -> &'static str {
        "Act"
    }

    fn validate(&self, node: &DocumentNode) -> ValidationIssueCollection {
        Validator::new(node)
            .check(checks::statement::clinical_statement)
            .finish()
    }

    fn process(
        &self,
        node: &DocumentNode,
        session: &mut ImportSession<'_>,
    ) -> Result<Option<DomainRecord>, ImportError> {
        if let Some(act) = node.as_statement() {
            dispatch_relationships(act, session)?;
        }
        Ok(None)
    }
}
