//! Concern entries: one act grouping the observations of one clinical concern.

use tracing::{info, warn};

use cda_model::{
    ClinicalStatement, DocumentNode, DomainRecord, ExtendedObservation, ValidationIssueCollection,
};
use cda_validate::{Validator, checks};

use super::dispatch_relationships;
use crate::context::ImportSession;
use crate::error::ImportError;
use crate::reconcile::{self, ConcernRecord};
use crate::registry::TemplateProcessor;

/// The primary observation of a concern: its node and what importing it
/// produced.
pub struct PrimaryObservation<'n> {
    pub statement: &'n ClinicalStatement,
    pub extended: ExtendedObservation,
}

/// What distinguishes one concern template from another.
pub trait ConcernKind: Send + Sync {
    type Record: ConcernRecord;

    const NAME: &'static str;
    /// Template of the observation this concern is about.
    const PRIMARY_TEMPLATE: &'static str;
    const PRIMARY_NAME: &'static str;

    /// Fill the type-specific fields of `record` from the primary observation.
    fn populate(
        &self,
        record: &mut Self::Record,
        concern: &ClinicalStatement,
        primary: &PrimaryObservation<'_>,
        session: &mut ImportSession<'_>,
    ) -> Result<(), ImportError>;
}

/// Concern processor: import children, reconcile, populate, persist.
pub struct ConcernProcessor<K> {
    kind: K,
}

impl<K: ConcernKind> ConcernProcessor<K> {
    pub fn new(kind: K) -> Self {
        Self { kind }
    }

    fn primary<'n>(
        &self,
        act: &'n ClinicalStatement,
        session: &mut ImportSession<'_>,
    ) -> Result<Option<PrimaryObservation<'n>>, ImportError> {
        let mut primaries = Vec::new();
        for relationship in &act.entry_relationships {
            let Some(child) = relationship.live_statement() else {
                continue;
            };
            let produced = session.dispatch(child)?;
            if !child.declares(K::PRIMARY_TEMPLATE) {
                continue;
            }
            match (child.as_statement(), produced) {
                (Some(statement), Some(DomainRecord::Observation(extended))) => {
                    primaries.push(PrimaryObservation {
                        statement,
                        extended,
                    });
                }
                _ => warn!(
                    concern = K::NAME,
                    "{} did not import as an observation",
                    K::PRIMARY_NAME
                ),
            }
        }

        if primaries.len() > 1 {
            return Err(ImportError::MultiplePrimaryObservations {
                template: K::NAME,
                expected: K::PRIMARY_NAME,
                count: primaries.len(),
            });
        }
        Ok(primaries.pop())
    }
}

impl<K: ConcernKind> TemplateProcessor for ConcernProcessor<K> {
    fn template_name(&self) -> &'static str {
        K::NAME
    }

    fn validate(&self, node: &DocumentNode) -> ValidationIssueCollection {
        Validator::new(node)
            .extend(ConcernEntryProcessor.validate(node))
            .check(checks::statement::carries_identifier)
            .check(checks::relationship::expects(
                K::PRIMARY_TEMPLATE,
                K::PRIMARY_NAME,
            ))
            .finish()
    }

    fn process(
        &self,
        node: &DocumentNode,
        session: &mut ImportSession<'_>,
    ) -> Result<Option<DomainRecord>, ImportError> {
        let Some(act) = node.as_statement() else {
            return Ok(None);
        };
        let Some(mut primary) = self.primary(act, session)? else {
            warn!(concern = K::NAME, "no {} found, nothing imported", K::PRIMARY_NAME);
            return Ok(None);
        };

        let mut record: K::Record = reconcile::resolve_target(act, session)?;
        reconcile::merge_temporal_bounds(&mut record, act, &mut primary.extended, session)?;
        self.kind.populate(&mut record, act, &primary, session)?;
        reconcile::apply_status_voiding(&mut record, act, session.encounter());

        let key = session.store().save(record.clone().into_record())?;
        record.header_mut().key = Some(key);
        let saved = record.into_record();
        info!(
            kind = %<K::Record as ConcernRecord>::KIND,
            %key,
            voided = saved.is_voided(),
            "saved concern"
        );
        session.record_saved(saved.clone());
        Ok(Some(saved))
    }
}

/// Concerns of no more specific template: validated, children imported.
///
/// Its rule set is the base every specialised concern extends.
pub struct ConcernEntryProcessor;

impl TemplateProcessor for ConcernEntryProcessor {
    fn template_name(&self) -> &'static str {
        "Concern Entry"
    }

    fn validate(&self, node: &DocumentNode) -> ValidationIssueCollection {
        Validator::new(node)
            .check(checks::statement::clinical_statement)
            .check(checks::statement::declares_template)
            .check(checks::concern::concern_entry)
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
