//! Reconciliation of incoming concern acts with the patient's record.
//!
//! An incoming act either replaces a prior item (external reference of type
//! `RPLC`), updates the item it was imported into before (same act id, only
//! when update-in-place is allowed), or creates a new item. Temporal bounds
//! only ever widen, and the observations that established a superseded bound
//! are voided and chained to their successor.

use tracing::{debug, warn};

use cda_model::{
    ActStatus, Allergy, Author, ClinicalStatement, Condition, DomainRecord, EffectiveTime,
    ExtendedObservation, InstanceIdentifier, ObservationId, PatientId, RecordHeader, RecordKind,
    ReferenceType,
};

use crate::collaborators::PatientRecordStore;
use crate::context::{EncounterContext, ImportSession};
use crate::error::{ImportError, StoreError};

pub const VOID_REASON_REPLACED: &str = "Replaced";

/// A longitudinal list item the concern processors reconcile into.
pub trait ConcernRecord: Default + Clone {
    const KIND: RecordKind;

    fn header(&self) -> &RecordHeader;

    fn header_mut(&mut self) -> &mut RecordHeader;

    fn find_existing(
        store: &dyn PatientRecordStore,
        external_id: &InstanceIdentifier,
        patient: &PatientId,
    ) -> Result<Option<Self>, StoreError>;

    fn into_record(self) -> DomainRecord;
}

impl ConcernRecord for Allergy {
    const KIND: RecordKind = RecordKind::Allergy;

    fn header(&self) -> &RecordHeader {
        &self.header
    }

    fn header_mut(&mut self) -> &mut RecordHeader {
        &mut self.header
    }

    fn find_existing(
        store: &dyn PatientRecordStore,
        external_id: &InstanceIdentifier,
        patient: &PatientId,
    ) -> Result<Option<Self>, StoreError> {
        store.find_existing_allergy(external_id, patient)
    }

    fn into_record(self) -> DomainRecord {
        DomainRecord::Allergy(self)
    }
}

impl ConcernRecord for Condition {
    const KIND: RecordKind = RecordKind::Condition;

    fn header(&self) -> &RecordHeader {
        &self.header
    }

    fn header_mut(&mut self) -> &mut RecordHeader {
        &mut self.header
    }

    fn find_existing(
        store: &dyn PatientRecordStore,
        external_id: &InstanceIdentifier,
        patient: &PatientId,
    ) -> Result<Option<Self>, StoreError> {
        store.find_existing_condition(external_id, patient)
    }

    fn into_record(self) -> DomainRecord {
        DomainRecord::Condition(self)
    }
}

/// The statement's own author, else the encounter's first author.
pub fn author_for(
    statement: &ClinicalStatement,
    encounter: &EncounterContext,
) -> Result<Author, ImportError> {
    statement
        .authors
        .first()
        .or_else(|| encounter.authors.first())
        .cloned()
        .ok_or(ImportError::MissingAuthor)
}

/// Pick the record `act` mutates and stamp it.
///
/// A replaced item is the default target. The act's own id is always looked
/// up as well: a live record carrying it takes over as target when
/// update-in-place is enabled, so no two live records share an id.
///
/// # Errors
///
/// [`ImportError::Duplicate`] when the act id is already on file and
/// update-in-place is disabled, whether or not the act replaces something.
pub fn resolve_target<R: ConcernRecord>(
    act: &ClinicalStatement,
    session: &mut ImportSession<'_>,
) -> Result<R, ImportError> {
    let encounter = session.encounter();
    let patient = &encounter.patient;

    let mut target = find_replaced::<R>(act, patient, session)?;

    if let Some(id) = &act.id
        && let Some(existing) = R::find_existing(session.store(), id, patient)?
    {
        if !session.options().update_existing {
            return Err(ImportError::Duplicate { id: id.clone() });
        }
        debug!(kind = %R::KIND, key = ?existing.header().key, "updating existing item in place");
        target = Some(existing);
    }

    let author = author_for(act, encounter)?;
    let mut record = match target {
        Some(mut existing) => {
            let audit = &mut existing.header_mut().audit;
            audit.changed_by = Some(author);
            audit.date_changed = Some(encounter.date_created);
            existing
        }
        None => {
            let mut created = R::default();
            let header = created.header_mut();
            header.patient = Some(patient.clone());
            header.audit.creator = Some(author);
            header.audit.date_created = Some(encounter.date_created);
            created
        }
    };

    if let Some(id) = &act.id
        && !record.header().has_external_id(id)
    {
        record.header_mut().external_ids.push(id.clone());
    }
    Ok(record)
}

fn find_replaced<R: ConcernRecord>(
    act: &ClinicalStatement,
    patient: &PatientId,
    session: &mut ImportSession<'_>,
) -> Result<Option<R>, ImportError> {
    let replaced = act
        .references
        .iter()
        .filter(|reference| reference.type_code == ReferenceType::Replaces)
        .filter_map(|reference| reference.external_id.as_ref());
    for id in replaced {
        match R::find_existing(session.store(), id, patient)? {
            Some(found) => {
                debug!(kind = %R::KIND, replaced = %id, "act replaces existing item");
                return Ok(Some(found));
            }
            None => warn!(kind = %R::KIND, replaced = %id, "replaced item not on file"),
        }
    }
    Ok(None)
}

/// Widen the record's bounds with the act's interval, falling back to the
/// primary observation's own times where the act is silent.
///
/// # Errors
///
/// [`ImportError::MissingEffectiveTime`] when the act has no effective time
/// and is not completed.
pub fn merge_temporal_bounds<R: ConcernRecord>(
    record: &mut R,
    act: &ClinicalStatement,
    primary: &mut ExtendedObservation,
    session: &mut ImportSession<'_>,
) -> Result<(), ImportError> {
    let effective_time = act.effective_time.as_ref().filter(|time| !time.is_null());
    if effective_time.is_none() && act.status_code != Some(ActStatus::Completed) {
        return Err(ImportError::MissingEffectiveTime);
    }
    let low = effective_time.and_then(EffectiveTime::low).or(primary.start);
    let high = effective_time.and_then(EffectiveTime::high).or(primary.end);

    let bounds = &mut record.header_mut().bounds;
    let mut superseded = Vec::new();

    if let Some(low) = low
        && bounds.start.is_none_or(|start| low < start)
    {
        bounds.start = Some(low);
        superseded.extend(rebind(&mut bounds.start_obs, primary.id));
    }
    if let Some(high) = high
        && bounds.end.is_none_or(|end| high > end)
    {
        bounds.end = Some(high);
        superseded.extend(rebind(&mut bounds.stop_obs, primary.id));
    }
    if bounds.start.is_none() && bounds.start_obs.is_none() {
        bounds.start_obs = primary.id;
    }

    // An observation still bounding the other end stays live.
    superseded.retain(|id| Some(*id) != bounds.start_obs && Some(*id) != bounds.stop_obs);
    superseded.dedup();
    if superseded.is_empty() {
        return Ok(());
    }
    let now = session.encounter().date_created;
    for id in &superseded {
        session.store().void_observation(*id, VOID_REASON_REPLACED, now)?;
    }
    primary.previous_version = superseded.first().copied();
    session.store().save_observation(primary.clone())?;
    debug!(voided = superseded.len(), "bounding observations replaced");
    Ok(())
}

/// Point `slot` at `new`, returning the observation it displaced.
fn rebind(slot: &mut Option<ObservationId>, new: Option<ObservationId>) -> Option<ObservationId> {
    if new.is_none() {
        return None;
    }
    let displaced = slot.filter(|prior| Some(*prior) != new);
    *slot = new;
    displaced
}

/// Aborted and suspended concerns void their record. Runs after the bounds
/// merge so the voided record still carries the widened interval.
pub fn apply_status_voiding<R: ConcernRecord>(
    record: &mut R,
    act: &ClinicalStatement,
    encounter: &EncounterContext,
) {
    if let Some(status) = act.status_code
        && status.voids_record()
    {
        record
            .header_mut()
            .audit
            .void(status.as_code(), encounter.date_created);
    }
}
