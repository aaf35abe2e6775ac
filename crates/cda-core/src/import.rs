//! Document-level import entry point.

use serde::Serialize;
use tracing::{error, info, info_span};

use cda_model::{DocumentNode, DomainRecord, ImportOptions, IssueSeverity};

use crate::collaborators::{PatientRecordStore, Vocabulary};
use crate::context::{EncounterContext, ImportSession, ReportedIssue};
use crate::error::ImportError;
use crate::registry::TemplateRegistry;

/// Outcome of one committed document import.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ImportReport {
    /// Concern records saved, in document order.
    pub records: Vec<DomainRecord>,
    pub observations_saved: usize,
    /// Non-blocking validation issues, tagged with their template.
    pub issues: Vec<ReportedIssue>,
}

impl ImportReport {
    pub fn warning_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|reported| reported.issue.severity == IssueSeverity::Warning)
            .count()
    }
}

/// Import `document` into the encounter's patient record.
///
/// All writes happen inside one store transaction: it commits when the whole
/// tree imported and rolls back on the first error.
///
/// # Errors
///
/// The first [`ImportError`] raised anywhere in the tree.
pub fn import_document(
    document: &DocumentNode,
    registry: &TemplateRegistry,
    options: &ImportOptions,
    encounter: &EncounterContext,
    store: &mut dyn PatientRecordStore,
    vocabulary: &mut dyn Vocabulary,
) -> Result<ImportReport, ImportError> {
    let span = info_span!("import_document", kind = %document.kind());
    let _guard = span.enter();

    store.begin()?;
    let outcome = {
        let mut session = ImportSession::new(registry, options, encounter, store, vocabulary);
        session
            .dispatch(document)
            .map(|_| session.into_report())
    };

    match outcome {
        Ok(report) => {
            store.commit()?;
            info!(
                records = report.records.len(),
                observations = report.observations_saved,
                warnings = report.warning_count(),
                "document imported"
            );
            Ok(report)
        }
        Err(err) => {
            if let Err(rollback) = store.rollback() {
                error!(error = %rollback, "rollback failed");
            }
            error!(error = %err, "document import failed, changes rolled back");
            Err(err)
        }
    }
}
