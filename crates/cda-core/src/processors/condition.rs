use cda_model::templates::ENT_PROBLEM_OBSERVATION;
use cda_model::{ClinicalStatement, Condition};

use super::concern::{ConcernKind, PrimaryObservation};
use crate::builder;
use crate::context::ImportSession;
use crate::error::ImportError;

/// Problem Concern Entry (PCC TF-2 6.3.4.12).
pub struct ConditionConcern;

impl ConcernKind for ConditionConcern {
    type Record = Condition;

    const NAME: &'static str = "Problem Concern Entry";
    const PRIMARY_TEMPLATE: &'static str = ENT_PROBLEM_OBSERVATION;
    const PRIMARY_NAME: &'static str = "Problem Entry";

    fn populate(
        &self,
        condition: &mut Condition,
        concern: &ClinicalStatement,
        primary: &PrimaryObservation<'_>,
        _session: &mut ImportSession<'_>,
    ) -> Result<(), ImportError> {
        match &primary.extended.value_coded {
            Some(concept) => condition.concept = Some(concept.clone()),
            None if condition.concept.is_none() => return Err(ImportError::ConditionNotCoded),
            None => {}
        }
        if let Some(status) = builder::condition_status(concern, primary.statement) {
            condition.status = status;
        }
        Ok(())
    }
}
