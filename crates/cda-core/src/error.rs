use cda_model::{
    InstanceIdentifier, NodeKind, ObservationId, RecordKey, RecordKind, ValidationIssueCollection,
};
use thiserror::Error;

/// Conflicts detected while building a [`crate::TemplateRegistry`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("processor {processor} registers no template identifiers")]
    EmptyTemplateSet { processor: &'static str },

    #[error(
        "processors {existing} and {incoming} both claim {kind} template {template} at precedence {precedence}"
    )]
    Overlap {
        kind: NodeKind,
        template: &'static str,
        existing: &'static str,
        incoming: &'static str,
        precedence: u8,
    },
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("no {kind} record with key {key}")]
    RecordNotFound { kind: RecordKind, key: RecordKey },

    #[error("no observation with id {0}")]
    ObservationNotFound(ObservationId),

    #[error("a transaction is already open")]
    TransactionActive,

    #[error("no transaction is open")]
    NoTransaction,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VocabularyError {
    #[error("cannot resolve concept from malformed coded value {0}")]
    Malformed(String),
}

/// Failure of one import. Any variant aborts the whole document.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("{template} failed validation: {}", first_error(.issues))]
    Validation {
        template: &'static str,
        issues: ValidationIssueCollection,
    },

    #[error("{kind} declares templates of several processors: {}", .candidates.join(", "))]
    AmbiguousTemplate {
        kind: NodeKind,
        candidates: Vec<&'static str>,
    },

    #[error(
        "Duplicate list item {id}. If you intend to replace it please use the replacement mechanism for CDA"
    )]
    Duplicate { id: InstanceIdentifier },

    #[error("Missing effective time of the problem")]
    MissingEffectiveTime,

    #[error("Allergen must be of type CD")]
    AllergenNotCoded,

    #[error("Observation for this problem must be of type Coded")]
    ConditionNotCoded,

    #[error("Allergy importer only supports one manifestation relationship, found {count}")]
    MultipleManifestations { count: usize },

    #[error("{template} supports one {expected}, found {count}")]
    MultiplePrimaryObservations {
        template: &'static str,
        expected: &'static str,
        count: usize,
    },

    #[error("configuration required: global setting `{setting}` is not set")]
    ConfigurationRequired { setting: &'static str },

    #[error("no author on the statement or the encounter")]
    MissingAuthor,

    #[error("document nesting exceeds {limit} levels")]
    DepthExceeded { limit: usize },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Vocabulary(#[from] VocabularyError),
}

impl ImportError {
    /// Operator-fixable environment errors, as opposed to document content
    /// errors.
    pub fn is_configuration_error(&self) -> bool {
        matches!(self, ImportError::ConfigurationRequired { .. })
    }

    pub fn validation_issues(&self) -> Option<&ValidationIssueCollection> {
        match self {
            ImportError::Validation { issues, .. } => Some(issues),
            _ => None,
        }
    }
}

fn first_error(issues: &ValidationIssueCollection) -> String {
    let first = issues
        .iter()
        .find(|issue| issue.severity == cda_model::IssueSeverity::Error)
        .map_or("unknown error", |issue| issue.message.as_str());
    match issues.error_count() {
        0 | 1 => first.to_string(),
        n => format!("{first} (and {} more)", n - 1),
    }
}
