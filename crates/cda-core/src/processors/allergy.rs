use cda_model::templates::ENT_ALLERGY_AND_INTOLERANCE_OBSERVATION;
use cda_model::{Allergy, ClinicalStatement};

use super::concern::{ConcernKind, PrimaryObservation};
use crate::builder::{self, SeverityOutcome};
use crate::context::ImportSession;
use crate::error::ImportError;

/// Allergy and Intolerance Concern (PCC TF-2 6.3.4.13).
pub struct AllergyConcern;

impl ConcernKind for AllergyConcern {
    type Record = Allergy;

    const NAME: &'static str = "Allergy and Intolerance Concern";
    const PRIMARY_TEMPLATE: &'static str = ENT_ALLERGY_AND_INTOLERANCE_OBSERVATION;
    const PRIMARY_NAME: &'static str = "Allergy and Intolerance Entry";

    fn populate(
        &self,
        allergy: &mut Allergy,
        _concern: &ClinicalStatement,
        primary: &PrimaryObservation<'_>,
        session: &mut ImportSession<'_>,
    ) -> Result<(), ImportError> {
        if let Some(category) = builder::allergy_category(primary.statement) {
            allergy.category = Some(category);
        }
        allergy.allergen = Some(builder::allergen(
            primary.statement,
            &primary.extended,
            session,
        )?);

        match builder::severity(primary.statement, session)? {
            SeverityOutcome::Mapped(severity) => allergy.severity = Some(severity),
            SeverityOutcome::Unknown(Some(unknown)) if allergy.severity.is_none() => {
                allergy.severity = Some(unknown);
            }
            SeverityOutcome::Unknown(_) => {}
        }

        if let Some(reaction) = builder::reaction(primary.statement, session)?
            && !allergy
                .reactions
                .iter()
                .any(|existing| existing.reaction == reaction.reaction)
        {
            allergy.reactions.push(reaction);
        }
        Ok(())
    }
}
