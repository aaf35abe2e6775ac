use tracing::debug;

use cda_model::templates::ENT_SEVERITY_OBSERVATION;
use cda_model::{DocumentNode, DomainRecord, ValidationIssueCollection};
use cda_validate::{Validator, checks};

use super::dispatch_relationships;
use crate::builder::build_observation;
use crate::context::ImportSession;
use crate::error::ImportError;
use crate::registry::TemplateProcessor;

/// Observation templates with their own validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObservationTemplate {
    /// Fallback for observations no registration claims.
    Generic,
    Problem,
    AllergyIntolerance,
    Severity,
}

impl ObservationTemplate {
    pub fn name(&self) -> &'static str {
        match self {
            ObservationTemplate::Generic => "Observation",
            ObservationTemplate::Problem => "Problem Entry",
            ObservationTemplate::AllergyIntolerance => "Allergy and Intolerance Entry",
            ObservationTemplate::Severity => "Severity Entry",
        }
    }
}

/// Persists an observation as an [`cda_model::ExtendedObservation`] after
/// importing its nested statements as members.
pub struct ObservationProcessor {
    template: ObservationTemplate,
}

impl ObservationProcessor {
    pub fn new(template: ObservationTemplate) -> Self {
        Self { template }
    }
}

impl TemplateProcessor for ObservationProcessor {
    fn template_name(&self) -> &'static str {
        self.template.name()
    }

    fn validate(&self, node: &DocumentNode) -> ValidationIssueCollection {
        let validator = Validator::new(node).check(checks::statement::clinical_statement);
        match self.template {
            ObservationTemplate::Generic => validator,
            ObservationTemplate::Problem => validator.check(checks::observation::coded_value),
            ObservationTemplate::AllergyIntolerance => validator
                .check(checks::observation::coded_code)
                .check(checks::relationship::at_most(
                    ENT_SEVERITY_OBSERVATION,
                    "Severity Entry",
                    1,
                )),
            ObservationTemplate::Severity => validator.check(checks::observation::severity_value),
        }
        .finish()
    }

    fn process(
        &self,
        node: &DocumentNode,
        session: &mut ImportSession<'_>,
    ) -> Result<Option<DomainRecord>, ImportError> {
        let Some(statement) = node.as_statement() else {
            return Ok(None);
        };
        let mut observation = build_observation(statement, session)?;
        observation.members = dispatch_relationships(statement, session)?
            .iter()
            .filter_map(DomainRecord::as_observation)
            .filter_map(|member| member.id)
            .collect();

        let id = session.store().save_observation(observation.clone())?;
        observation.id = Some(id);
        session.observation_saved();
        debug!(%id, members = observation.members.len(), "saved observation");
        Ok(Some(DomainRecord::Observation(observation)))
    }
}
