//! Template-driven import of CDA clinical statements into a patient record.
//!
//! A document tree is walked depth first. For every node the
//! [`TemplateRegistry`] picks a [`TemplateProcessor`] by template identifier,
//! the processor's validation runs, and only then does the processor import
//! the node, recursing through [`ImportSession::dispatch`]. Concern
//! processors reconcile their node with records already on file (see
//! [`reconcile`]) before saving.

pub mod builder;
pub mod collaborators;
pub mod context;
pub mod error;
pub mod import;
pub mod memory;
pub mod processors;
pub mod reconcile;
pub mod registry;

pub use collaborators::{PatientRecordStore, Vocabulary};
pub use context::{EncounterContext, ImportSession, MAX_DEPTH, ReportedIssue};
pub use error::{ImportError, RegistryError, StoreError, VocabularyError};
pub use import::{ImportReport, import_document};
pub use memory::{MemoryRecordStore, MemoryVocabulary};
pub use registry::{
    Registration, TemplateProcessor, TemplateRegistry, build_default_registry, default_registry,
};
