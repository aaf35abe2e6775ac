//! In-memory collaborators.
//!
//! Used by tests and by the command-line harness, which persists them as JSON
//! between runs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use cda_model::{
    Allergy, CodedValue, ConceptRef, Condition, DomainRecord, ExtendedObservation,
    InstanceIdentifier, ObservationId, PatientId, RecordHeader, RecordKey, RecordKind,
};

use crate::collaborators::{PatientRecordStore, Vocabulary};
use crate::error::{StoreError, VocabularyError};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
struct StoreState {
    /// Arena: a record's key is its index.
    records: Vec<DomainRecord>,
    /// Arena: an observation's id is its index.
    observations: Vec<ExtendedObservation>,
}

/// Arena-backed record store with snapshot transactions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MemoryRecordStore {
    state: StoreState,
    #[serde(skip)]
    checkpoint: Option<StoreState>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, key: RecordKey) -> Option<&DomainRecord> {
        usize::try_from(key.get())
            .ok()
            .and_then(|index| self.state.records.get(index))
    }

    pub fn records(&self) -> &[DomainRecord] {
        &self.state.records
    }

    pub fn observation(&self, id: ObservationId) -> Option<&ExtendedObservation> {
        usize::try_from(id.get())
            .ok()
            .and_then(|index| self.state.observations.get(index))
    }

    pub fn observations(&self) -> &[ExtendedObservation] {
        &self.state.observations
    }

    pub fn allergies<'a>(&'a self, patient: &'a PatientId) -> impl Iterator<Item = &'a Allergy> {
        self.state
            .records
            .iter()
            .filter_map(DomainRecord::as_allergy)
            .filter(move |allergy| allergy.header.patient.as_ref() == Some(patient))
    }

    pub fn conditions<'a>(
        &'a self,
        patient: &'a PatientId,
    ) -> impl Iterator<Item = &'a Condition> {
        self.state
            .records
            .iter()
            .filter_map(DomainRecord::as_condition)
            .filter(move |condition| condition.header.patient.as_ref() == Some(patient))
    }

    pub fn in_transaction(&self) -> bool {
        self.checkpoint.is_some()
    }

    fn find_header<'a, T>(
        &'a self,
        select: impl Fn(&'a DomainRecord) -> Option<(&'a RecordHeader, &'a T)>,
        external_id: &InstanceIdentifier,
        patient: &PatientId,
    ) -> Option<&'a T> {
        self.state
            .records
            .iter()
            .filter_map(select)
            .find(|(header, _)| {
                !header.audit.voided
                    && header.patient.as_ref() == Some(patient)
                    && header.has_external_id(external_id)
            })
            .map(|(_, record)| record)
    }
}

impl PatientRecordStore for MemoryRecordStore {
    fn find_existing_allergy(
        &self,
        external_id: &InstanceIdentifier,
        patient: &PatientId,
    ) -> Result<Option<Allergy>, StoreError> {
        let found = self.find_header(
            |record| record.as_allergy().map(|allergy| (&allergy.header, allergy)),
            external_id,
            patient,
        );
        Ok(found.cloned())
    }

    fn find_existing_condition(
        &self,
        external_id: &InstanceIdentifier,
        patient: &PatientId,
    ) -> Result<Option<Condition>, StoreError> {
        let found = self.find_header(
            |record| {
                record
                    .as_condition()
                    .map(|condition| (&condition.header, condition))
            },
            external_id,
            patient,
        );
        Ok(found.cloned())
    }

    fn save(&mut self, mut record: DomainRecord) -> Result<RecordKey, StoreError> {
        let kind = record.kind();
        let header = match &mut record {
            DomainRecord::Allergy(allergy) => &mut allergy.header,
            DomainRecord::Condition(condition) => &mut condition.header,
            DomainRecord::Observation(observation) => {
                let id = self.save_observation(observation.clone())?;
                return Ok(RecordKey::new(id.get()));
            }
        };

        match header.key {
            Some(key) => {
                let slot = usize::try_from(key.get())
                    .ok()
                    .and_then(|index| self.state.records.get_mut(index))
                    .filter(|existing| existing.kind() == kind)
                    .ok_or(StoreError::RecordNotFound { kind, key })?;
                *slot = record;
                Ok(key)
            }
            None => {
                let key = RecordKey::new(self.state.records.len() as u64);
                header.key = Some(key);
                self.state.records.push(record);
                Ok(key)
            }
        }
    }

    fn save_observation(
        &mut self,
        mut observation: ExtendedObservation,
    ) -> Result<ObservationId, StoreError> {
        match observation.id {
            Some(id) => {
                let slot = usize::try_from(id.get())
                    .ok()
                    .and_then(|index| self.state.observations.get_mut(index))
                    .ok_or(StoreError::ObservationNotFound(id))?;
                *slot = observation;
                Ok(id)
            }
            None => {
                let id = ObservationId::new(self.state.observations.len() as u64);
                observation.id = Some(id);
                self.state.observations.push(observation);
                Ok(id)
            }
        }
    }

    fn void_observation(
        &mut self,
        id: ObservationId,
        reason: &str,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let observation = usize::try_from(id.get())
            .ok()
            .and_then(|index| self.state.observations.get_mut(index))
            .ok_or(StoreError::ObservationNotFound(id))?;
        if !observation.audit.voided {
            observation.audit.void(reason, at);
        }
        Ok(())
    }

    fn begin(&mut self) -> Result<(), StoreError> {
        if self.checkpoint.is_some() {
            return Err(StoreError::TransactionActive);
        }
        self.checkpoint = Some(self.state.clone());
        Ok(())
    }

    fn commit(&mut self) -> Result<(), StoreError> {
        self.checkpoint
            .take()
            .map(|_| ())
            .ok_or(StoreError::NoTransaction)
    }

    fn rollback(&mut self) -> Result<(), StoreError> {
        let checkpoint = self.checkpoint.take().ok_or(StoreError::NoTransaction)?;
        self.state = checkpoint;
        Ok(())
    }
}

/// Concept dictionary that creates a concept the first time a code is seen.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MemoryVocabulary {
    concepts: Vec<ConceptRef>,
}

impl MemoryVocabulary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn concepts(&self) -> &[ConceptRef] {
        &self.concepts
    }

    pub fn len(&self) -> usize {
        self.concepts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.concepts.is_empty()
    }
}

impl Vocabulary for MemoryVocabulary {
    fn resolve_or_create_concept(
        &mut self,
        value: &CodedValue,
    ) -> Result<ConceptRef, VocabularyError> {
        let Some(code) = value.code() else {
            return Err(VocabularyError::Malformed(value.to_string()));
        };
        let system = value.code_system.as_deref();
        if let Some(existing) = self
            .concepts
            .iter()
            .find(|concept| concept.code == code && concept.code_system.as_deref() == system)
        {
            return Ok(existing.clone());
        }
        let concept = ConceptRef {
            id: self.concepts.len() as u64 + 1,
            code: code.to_string(),
            code_system: value.code_system.clone(),
            display_name: value.display_name.clone(),
        };
        self.concepts.push(concept.clone());
        Ok(concept)
    }
}
