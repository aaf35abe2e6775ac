//! Built-in template processors.
//!
//! Structural processors (section, act, observation) double as the registry
//! fallbacks. Concern processors share one implementation parameterised by a
//! [`ConcernKind`].

mod act;
mod allergy;
mod concern;
mod condition;
mod observation;
mod section;

pub use act::ActProcessor;
pub use allergy::AllergyConcern;
pub use concern::{ConcernEntryProcessor, ConcernKind, ConcernProcessor, PrimaryObservation};
pub use condition::ConditionConcern;
pub use observation::{ObservationProcessor, ObservationTemplate};
pub use section::SectionProcessor;

use cda_model::{ClinicalStatement, DomainRecord};

use crate::context::ImportSession;
use crate::error::ImportError;

/// Dispatch every live nested statement, collecting what they produced.
pub(crate) fn dispatch_relationships(
    statement: &ClinicalStatement,
    session: &mut ImportSession<'_>,
) -> Result<Vec<DomainRecord>, ImportError> {
    let mut produced = Vec::new();
    for relationship in &statement.entry_relationships {
        let Some(child) = relationship.live_statement() else {
            continue;
        };
        if let Some(record) = session.dispatch(child)? {
            produced.push(record);
        }
    }
    Ok(produced)
}
