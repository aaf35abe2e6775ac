//! One document import, from files on disk to a committed snapshot.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use tracing::{info, info_span};

use cda_core::{EncounterContext, ImportReport, default_registry, import_document};
use cda_model::{Author, DocumentNode, PatientId};

use crate::config::load_options;
use crate::logging::redact_value;
use crate::state::StoreSnapshot;

/// Inputs of one `import` run.
#[derive(Debug, Clone)]
pub struct ImportRequest {
    pub document: PathBuf,
    pub patient: String,
    pub author: String,
    pub config: Option<PathBuf>,
    /// Snapshot to import into; without one the import starts empty and
    /// nothing is persisted.
    pub store: Option<PathBuf>,
    pub dry_run: bool,
    /// Encounter time; the current time when unset.
    pub encounter_date: Option<DateTime<Utc>>,
}

/// What an import produced, for the summary.
#[derive(Debug)]
pub struct ImportOutcome {
    pub report: ImportReport,
    pub patient: PatientId,
    pub snapshot: StoreSnapshot,
    /// Where the snapshot was written, unless dry-run or no store was given.
    pub persisted: Option<PathBuf>,
}

impl ImportOutcome {
    pub fn allergy_count(&self) -> usize {
        self.snapshot.store.allergies(&self.patient).count()
    }

    pub fn condition_count(&self) -> usize {
        self.snapshot.store.conditions(&self.patient).count()
    }
}

pub fn load_document(path: &Path) -> Result<DocumentNode> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("read document {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parse document {}", path.display()))
}

/// Run one import.
///
/// # Errors
///
/// Configuration, file and snapshot failures carry context; an import
/// failure is returned with its [`cda_core::ImportError`] as the root cause so
/// callers can downcast it.
pub fn run_import(request: &ImportRequest) -> Result<ImportOutcome> {
    let span = info_span!("import", document = %request.document.display());
    let _guard = span.enter();

    let options = load_options(request.config.as_deref())?;
    let document = load_document(&request.document)?;
    let patient = PatientId::new(request.patient.as_str()).context("invalid patient id")?;
    let encounter = EncounterContext::new(
        patient.clone(),
        request.encounter_date.unwrap_or_else(Utc::now),
    )
    .with_author(Author::named(request.author.as_str()));

    let mut snapshot = match &request.store {
        Some(path) => StoreSnapshot::load(path)?,
        None => StoreSnapshot::default(),
    };
    let registry = default_registry().context("build template registry")?;

    info!(
        patient = redact_value(patient.as_str()),
        dry_run = request.dry_run,
        "importing document"
    );
    let report = import_document(
        &document,
        registry,
        &options,
        &encounter,
        &mut snapshot.store,
        &mut snapshot.vocabulary,
    )?;

    let persisted = match &request.store {
        Some(path) if !request.dry_run => {
            snapshot.save(path)?;
            Some(path.clone())
        }
        _ => None,
    };
    Ok(ImportOutcome {
        report,
        patient,
        snapshot,
        persisted,
    })
}
