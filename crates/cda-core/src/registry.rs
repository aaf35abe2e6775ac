//! Template processor trait and registry.
//!
//! # Architecture
//!
//! Every template the importer understands is handled by a
//! [`TemplateProcessor`]. Processors are registered in the
//! [`TemplateRegistry`] for one node kind, under the set of template
//! identifiers they claim, together with a precedence. A node is handled by
//! the highest-precedence registration of its kind whose identifier set
//! intersects the node's declared identifiers; nodes no registration claims
//! go to a structural fallback for their kind (section, act or observation).
//!
//! Precedence is how specialised templates win over the ones they extend: an
//! allergy concern also declares the generic concern entry template, so the
//! allergy concern is registered one level higher. Two registrations of the
//! same kind and precedence may not share an identifier;
//! [`TemplateRegistry::register`] rejects that up front.
//!
//! Disjoint sets of the same kind and precedence can still meet on a node
//! that declares templates from both. Registration cannot see that, so
//! [`TemplateRegistry::resolve`] reports it as
//! [`ImportError::AmbiguousTemplate`] instead of picking one.
//!
//! # Example
//!
//! ```
//! use cda_core::default_registry;
//! use cda_model::{ClinicalStatement, DocumentNode};
//! use cda_model::templates::{ENT_ALLERGIES_AND_INTOLERANCES_CONCERN, ENT_CONCERN_ENTRY};
//!
//! let registry = default_registry().unwrap();
//! let node = DocumentNode::Act(
//!     ClinicalStatement::new()
//!         .with_template(ENT_CONCERN_ENTRY)
//!         .with_template(ENT_ALLERGIES_AND_INTOLERANCES_CONCERN),
//! );
//! let processor = registry.resolve(&node).unwrap();
//! assert_eq!(processor.template_name(), "Allergy and Intolerance Concern");
//! ```

use std::sync::OnceLock;

use tracing::debug;

use cda_model::templates::{
    CCD_ALERT_OBSERVATION, CCD_PROBLEM_ACT, CCD_PROBLEM_OBSERVATION, CCD_SEVERITY_OBSERVATION,
    ENT_ALLERGIES_AND_INTOLERANCES_CONCERN, ENT_ALLERGY_AND_INTOLERANCE_OBSERVATION,
    ENT_CONCERN_ENTRY, ENT_PROBLEM_CONCERN, ENT_PROBLEM_OBSERVATION, ENT_SEVERITY_OBSERVATION,
    SCT_ACTIVE_PROBLEMS, SCT_ALLERGIES_AND_OTHER_ADVERSE_REACTIONS,
    SCT_HISTORY_OF_PRESENT_ILLNESS,
};
use cda_model::{DocumentNode, DomainRecord, NodeKind, ValidationIssueCollection};

use crate::context::ImportSession;
use crate::error::{ImportError, RegistryError};
use crate::processors::{
    ActProcessor, AllergyConcern, ConcernEntryProcessor, ConcernProcessor, ConditionConcern,
    ObservationProcessor, ObservationTemplate, SectionProcessor,
};

/// Handler for one template (or one structural fallback).
///
/// Implementations are stateless; everything an invocation may touch comes
/// in through the [`ImportSession`].
pub trait TemplateProcessor: Send + Sync {
    /// Human-readable template name for logs and errors.
    fn template_name(&self) -> &'static str;

    /// Shape checks for `node`. Runs before [`process`](Self::process) when
    /// validation is enabled; any error prevents processing.
    fn validate(&self, node: &DocumentNode) -> ValidationIssueCollection;

    /// Import `node`, dispatching children through `session` as needed.
    ///
    /// # Errors
    ///
    /// Any error aborts the whole document import.
    fn process(
        &self,
        node: &DocumentNode,
        session: &mut ImportSession<'_>,
    ) -> Result<Option<DomainRecord>, ImportError>;
}

/// One entry of the registration table.
pub struct Registration {
    kind: NodeKind,
    templates: Vec<&'static str>,
    precedence: u8,
    processor: Box<dyn TemplateProcessor>,
}

impl Registration {
    pub fn name(&self) -> &'static str {
        self.processor.template_name()
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn templates(&self) -> &[&'static str] {
        &self.templates
    }

    pub fn precedence(&self) -> u8 {
        self.precedence
    }

    fn claims(&self, node: &DocumentNode) -> bool {
        self.kind == node.kind()
            && self.templates.iter().any(|template| node.declares(template))
    }
}

/// Registration table plus the structural fallbacks.
pub struct TemplateRegistry {
    registrations: Vec<Registration>,
    section: Box<dyn TemplateProcessor>,
    act: Box<dyn TemplateProcessor>,
    observation: Box<dyn TemplateProcessor>,
}

impl Default for TemplateRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateRegistry {
    /// An empty table with the generic section, act and observation fallbacks.
    pub fn new() -> Self {
        Self {
            registrations: Vec::new(),
            section: Box::new(SectionProcessor::generic()),
            act: Box::new(ActProcessor),
            observation: Box::new(ObservationProcessor::new(ObservationTemplate::Generic)),
        }
    }

    /// Claim `templates` on nodes of `kind` for `processor` at `precedence`.
    ///
    /// # Errors
    ///
    /// Fails when `templates` is empty or when a registration with the same
    /// kind and precedence already claims one of them.
    pub fn register(
        &mut self,
        kind: NodeKind,
        templates: &[&'static str],
        precedence: u8,
        processor: Box<dyn TemplateProcessor>,
    ) -> Result<(), RegistryError> {
        let incoming = processor.template_name();
        if templates.is_empty() {
            return Err(RegistryError::EmptyTemplateSet {
                processor: incoming,
            });
        }
        for existing in self
            .registrations
            .iter()
            .filter(|existing| existing.kind == kind && existing.precedence == precedence)
        {
            if let Some(template) = templates
                .iter()
                .copied()
                .find(|template| existing.templates.contains(template))
            {
                return Err(RegistryError::Overlap {
                    kind,
                    template,
                    existing: existing.name(),
                    incoming,
                    precedence,
                });
            }
        }
        self.registrations.push(Registration {
            kind,
            templates: templates.to_vec(),
            precedence,
            processor,
        });
        Ok(())
    }

    /// The processor that handles `node`.
    ///
    /// # Errors
    ///
    /// [`ImportError::AmbiguousTemplate`] when the node declares templates of
    /// two registrations sharing the highest matching precedence.
    pub fn resolve(&self, node: &DocumentNode) -> Result<&dyn TemplateProcessor, ImportError> {
        let mut best: Vec<&Registration> = Vec::new();
        for registration in self.registrations.iter().filter(|r| r.claims(node)) {
            match best.first().map(|current| current.precedence) {
                Some(precedence) if registration.precedence < precedence => {}
                Some(precedence) if registration.precedence == precedence => {
                    best.push(registration);
                }
                _ => best = vec![registration],
            }
        }

        match best.as_slice() {
            [] => {
                let fallback = self.fallback(node.kind());
                debug!(
                    kind = %node.kind(),
                    processor = fallback.template_name(),
                    "no registered template, using fallback"
                );
                Ok(fallback)
            }
            [only] => Ok(only.processor.as_ref()),
            several => Err(ImportError::AmbiguousTemplate {
                kind: node.kind(),
                candidates: several.iter().map(|r| r.name()).collect(),
            }),
        }
    }

    /// Structural fallback for `kind`. Entry relationships never reach a
    /// processor themselves, only their statements do.
    pub fn fallback(&self, kind: NodeKind) -> &dyn TemplateProcessor {
        match kind {
            NodeKind::Section => self.section.as_ref(),
            NodeKind::Act | NodeKind::EntryRelationship => self.act.as_ref(),
            NodeKind::Observation => self.observation.as_ref(),
        }
    }

    pub fn registrations(&self) -> impl Iterator<Item = &Registration> {
        self.registrations.iter()
    }

    /// Number of registrations, excluding fallbacks.
    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }
}

static DEFAULT_REGISTRY: OnceLock<Result<TemplateRegistry, RegistryError>> = OnceLock::new();

/// The registry with every built-in processor, built on first use.
pub fn default_registry() -> Result<&'static TemplateRegistry, RegistryError> {
    DEFAULT_REGISTRY
        .get_or_init(build_default_registry)
        .as_ref()
        .map_err(Clone::clone)
}

/// Builds the registry with every built-in processor.
pub fn build_default_registry() -> Result<TemplateRegistry, RegistryError> {
    let mut registry = TemplateRegistry::new();

    registry.register(
        NodeKind::Section,
        &[SCT_HISTORY_OF_PRESENT_ILLNESS],
        0,
        Box::new(SectionProcessor::history_of_present_illness()),
    )?;
    registry.register(
        NodeKind::Section,
        &[SCT_ALLERGIES_AND_OTHER_ADVERSE_REACTIONS],
        0,
        Box::new(SectionProcessor::allergies()),
    )?;
    registry.register(
        NodeKind::Section,
        &[SCT_ACTIVE_PROBLEMS],
        0,
        Box::new(SectionProcessor::active_problems()),
    )?;

    registry.register(
        NodeKind::Act,
        &[ENT_CONCERN_ENTRY, CCD_PROBLEM_ACT],
        0,
        Box::new(ConcernEntryProcessor),
    )?;
    registry.register(
        NodeKind::Act,
        &[ENT_ALLERGIES_AND_INTOLERANCES_CONCERN],
        1,
        Box::new(ConcernProcessor::new(AllergyConcern)),
    )?;
    registry.register(
        NodeKind::Act,
        &[ENT_PROBLEM_CONCERN],
        1,
        Box::new(ConcernProcessor::new(ConditionConcern)),
    )?;

    // Allergy entries also declare the problem entry they specialise.
    registry.register(
        NodeKind::Observation,
        &[ENT_PROBLEM_OBSERVATION, CCD_PROBLEM_OBSERVATION],
        0,
        Box::new(ObservationProcessor::new(ObservationTemplate::Problem)),
    )?;
    registry.register(
        NodeKind::Observation,
        &[ENT_ALLERGY_AND_INTOLERANCE_OBSERVATION, CCD_ALERT_OBSERVATION],
        1,
        Box::new(ObservationProcessor::new(ObservationTemplate::AllergyIntolerance)),
    )?;
    registry.register(
        NodeKind::Observation,
        &[ENT_SEVERITY_OBSERVATION, CCD_SEVERITY_OBSERVATION],
        0,
        Box::new(ObservationProcessor::new(ObservationTemplate::Severity)),
    )?;

    Ok(registry)
}
