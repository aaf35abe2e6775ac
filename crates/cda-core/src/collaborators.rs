//! Interfaces of the services the importer delegates to.
//!
//! Persistence and vocabulary are owned elsewhere; the importer only needs
//! these narrow, synchronous contracts.

use chrono::{DateTime, Utc};
use cda_model::{
    Allergy, CodedValue, ConceptRef, Condition, DomainRecord, ExtendedObservation,
    InstanceIdentifier, ObservationId, PatientId, RecordKey,
};

use crate::error::{StoreError, VocabularyError};

/// The patient's longitudinal record.
///
/// Writes between [`begin`](Self::begin) and [`commit`](Self::commit) are
/// provisional; [`rollback`](Self::rollback) discards all of them.
pub trait PatientRecordStore {
    /// The non-voided allergy of `patient` that carries `external_id`.
    fn find_existing_allergy(
        &self,
        external_id: &InstanceIdentifier,
        patient: &PatientId,
    ) -> Result<Option<Allergy>, StoreError>;

    /// The non-voided condition of `patient` that carries `external_id`.
    fn find_existing_condition(
        &self,
        external_id: &InstanceIdentifier,
        patient: &PatientId,
    ) -> Result<Option<Condition>, StoreError>;

    /// Insert a record without a key, or overwrite the slot of a keyed one.
    fn save(&mut self, record: DomainRecord) -> Result<RecordKey, StoreError>;

    /// Insert an observation without an id, or overwrite an existing one.
    fn save_observation(
        &mut self,
        observation: ExtendedObservation,
    ) -> Result<ObservationId, StoreError>;

    fn void_observation(
        &mut self,
        id: ObservationId,
        reason: &str,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    fn begin(&mut self) -> Result<(), StoreError>;

    fn commit(&mut self) -> Result<(), StoreError>;

    fn rollback(&mut self) -> Result<(), StoreError>;
}

/// Concept dictionary.
pub trait Vocabulary {
    /// Look up the concept for `value`, creating it when unknown.
    ///
    /// Idempotent for identical codes; fails only on malformed input.
    fn resolve_or_create_concept(&mut self, value: &CodedValue)
    -> Result<ConceptRef, VocabularyError>;
}
