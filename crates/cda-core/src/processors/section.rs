use cda_model::{DocumentNode, DomainRecord, ValidationIssueCollection};
use cda_validate::{Validator, checks};

use crate::context::ImportSession;
use crate::error::ImportError;
use crate::registry::TemplateProcessor;

/// Section processor: optionally checks the LOINC section code, then
/// dispatches every entry in document order.
pub struct SectionProcessor {
    name: &'static str,
    loinc_code: Option<&'static str>,
}

impl SectionProcessor {
    pub fn generic() -> Self {
        Self {
            name: "Section",
            loinc_code: None,
        }
    }

    pub fn history_of_present_illness() -> Self {
        Self {
            name: "History of Present Illness",
            loinc_code: Some("10164-2"),
        }
    }

    pub fn allergies() -> Self {
        Self {
            name: "Allergies and Other Adverse Reactions",
            loinc_code: Some("48765-2"),
        }
    }

    pub fn active_problems() -> Self {
        Self {
            name: "Active Problems",
            loinc_code: Some("11450-4"),
        }
    }

    pub fn loinc_code(&self) -> Option<&'static str> {
        self.loinc_code
    }
}

impl TemplateProcessor for SectionProcessor {
    fn template_name(&self) -> &'static str {
        self.name
    }

    fn validate(&self, node: &DocumentNode) -> ValidationIssueCollection {
        let validator = Validator::new(node).check(checks::section::is_section);
        match self.loinc_code {
            Some(code) => validator.check(checks::section::loinc_code(code, self.name)),
            None => validator,
        }
        .finish()
    }

    fn process(
        &self,
        node: &DocumentNode,
        session: &mut ImportSession<'_>,
    ) -> Result<Option<DomainRecord>, ImportError> {
        let Some(section) = node.as_section() else {
            return Ok(None);
        };
        for entry in &section.entries {
            session.dispatch(entry)?;
        }
        Ok(None)
    }
}
