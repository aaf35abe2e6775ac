use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug_span, warn};

use cda_model::{
    Author, DocumentNode, DomainRecord, ImportOptions, IssueSeverity, PatientId, ValidationIssue,
    ValidationIssueCollection,
};

use crate::collaborators::{PatientRecordStore, Vocabulary};
use crate::error::ImportError;
use crate::registry::{TemplateProcessor, TemplateRegistry};

/// Deepest nesting [`ImportSession::dispatch`] will follow.
pub const MAX_DEPTH: usize = 64;

/// The encounter a document is imported into.
#[derive(Debug, Clone, PartialEq)]
pub struct EncounterContext {
    pub patient: PatientId,
    /// Creation time of the encounter; stamps every record created or changed.
    pub date_created: DateTime<Utc>,
    pub authors: Vec<Author>,
}

impl EncounterContext {
    pub fn new(patient: PatientId, date_created: DateTime<Utc>) -> Self {
        Self {
            patient,
            date_created,
            authors: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_author(mut self, author: Author) -> Self {
        self.authors.push(author);
        self
    }
}

/// A non-blocking validation issue and the template that raised it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportedIssue {
    pub template: &'static str,
    pub issue: ValidationIssue,
}

/// Everything one processor invocation may touch, passed explicitly.
///
/// The session is the dispatch entry point: processors hand their children
/// back to [`dispatch`](Self::dispatch) to recurse.
pub struct ImportSession<'a> {
    registry: &'a TemplateRegistry,
    options: &'a ImportOptions,
    encounter: &'a EncounterContext,
    store: &'a mut dyn PatientRecordStore,
    vocabulary: &'a mut dyn Vocabulary,
    depth: usize,
    issues: Vec<ReportedIssue>,
    records: Vec<DomainRecord>,
    observations_saved: usize,
}

impl<'a> ImportSession<'a> {
    pub fn new(
        registry: &'a TemplateRegistry,
        options: &'a ImportOptions,
        encounter: &'a EncounterContext,
        store: &'a mut dyn PatientRecordStore,
        vocabulary: &'a mut dyn Vocabulary,
    ) -> Self {
        Self {
            registry,
            options,
            encounter,
            store,
            vocabulary,
            depth: 0,
            issues: Vec::new(),
            records: Vec::new(),
            observations_saved: 0,
        }
    }

    pub fn options(&self) -> &'a ImportOptions {
        self.options
    }

    pub fn encounter(&self) -> &'a EncounterContext {
        self.encounter
    }

    pub fn store(&mut self) -> &mut dyn PatientRecordStore {
        &mut *self.store
    }

    pub fn vocabulary(&mut self) -> &mut dyn Vocabulary {
        &mut *self.vocabulary
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Resolve the processor for `node`, validate, then process.
    ///
    /// Entry relationships dispatch their statement; null-flavored ones are
    /// skipped.
    pub fn dispatch(&mut self, node: &DocumentNode) -> Result<Option<DomainRecord>, ImportError> {
        if let DocumentNode::EntryRelationship(relationship) = node {
            return match relationship.live_statement() {
                Some(statement) => self.dispatch(statement),
                None => Ok(None),
            };
        }
        if self.depth >= MAX_DEPTH {
            return Err(ImportError::DepthExceeded { limit: MAX_DEPTH });
        }

        let registry = self.registry;
        let processor = registry.resolve(node)?;
        let span = debug_span!(
            "dispatch",
            template = processor.template_name(),
            kind = %node.kind(),
            depth = self.depth
        );
        let _guard = span.enter();

        self.depth += 1;
        let result = self.run(processor, node);
        self.depth -= 1;
        result
    }

    fn run(
        &mut self,
        processor: &dyn TemplateProcessor,
        node: &DocumentNode,
    ) -> Result<Option<DomainRecord>, ImportError> {
        if self.options.validation_enabled {
            let issues = processor.validate(node);
            self.gate(processor.template_name(), issues)?;
        }
        processor.process(node, self)
    }

    /// Keep warnings, refuse errors.
    fn gate(
        &mut self,
        template: &'static str,
        issues: ValidationIssueCollection,
    ) -> Result<(), ImportError> {
        if issues.has_errors() {
            return Err(ImportError::Validation { template, issues });
        }
        for issue in issues {
            if issue.severity == IssueSeverity::Warning {
                warn!(template, "{}", issue.message);
            }
            self.issues.push(ReportedIssue { template, issue });
        }
        Ok(())
    }

    pub(crate) fn record_saved(&mut self, record: DomainRecord) {
        self.records.push(record);
    }

    pub(crate) fn observation_saved(&mut self) {
        self.observations_saved += 1;
    }

    pub fn into_report(self) -> crate::import::ImportReport {
        crate::import::ImportReport {
            records: self.records,
            observations_saved: self.observations_saved,
            issues: self.issues,
        }
    }
}
