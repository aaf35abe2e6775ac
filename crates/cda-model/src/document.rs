//! The parsed CDA node tree consumed by the importer.
//!
//! The tree is produced by an external document-model library and is read-only
//! for the duration of one import. Only the parts of the CDA R2 clinical
//! statement model that the importer inspects are represented.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::enums::{ActStatus, NullFlavor, ReferenceType, RelationshipType};
use crate::ids::{InstanceIdentifier, TemplateId};
use crate::timestamp::Timestamp;

/// A coded value (`CD`/`CE`/`CV`/`CS`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CodedValue {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_system: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub null_flavor: Option<NullFlavor>,
}

impl CodedValue {
    pub fn new(code: impl Into<String>, code_system: impl Into<String>) -> Self {
        Self {
            code: Some(code.into()),
            code_system: Some(code_system.into()),
            ..Self::default()
        }
    }

    pub fn null(flavor: NullFlavor) -> Self {
        Self {
            null_flavor: Some(flavor),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }

    /// Null when flavored or when no code is present.
    pub fn is_null(&self) -> bool {
        self.null_flavor.is_some() || self.code.as_deref().is_none_or(|c| c.trim().is_empty())
    }

    /// The code, when the value is not null.
    pub fn code(&self) -> Option<&str> {
        if self.is_null() {
            None
        } else {
            self.code.as_deref().map(str::trim)
        }
    }
}

impl fmt::Display for CodedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.null_flavor, &self.code, &self.code_system) {
            (Some(flavor), _, _) => write!(f, "nullFlavor={flavor}"),
            (None, Some(code), Some(system)) => write!(f, "{code}@{system}"),
            (None, Some(code), None) => f.write_str(code),
            (None, None, _) => f.write_str("<empty>"),
        }
    }
}

/// Effective time interval (`IVL<TS>`).
///
/// An absent bound means "unknown", never "unbounded".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectiveTime {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub low: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub high: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub null_flavor: Option<NullFlavor>,
}

impl EffectiveTime {
    pub fn new(low: Option<Timestamp>, high: Option<Timestamp>) -> Self {
        Self {
            low,
            high,
            null_flavor: None,
        }
    }

    pub fn is_null(&self) -> bool {
        self.null_flavor.is_some()
    }

    pub fn low(&self) -> Option<Timestamp> {
        if self.is_null() { None } else { self.low }
    }

    pub fn high(&self) -> Option<Timestamp> {
        if self.is_null() { None } else { self.high }
    }
}

/// Participant of an observation; for allergies this names the allergen
/// through the playing entity's code.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub playing_entity_code: Option<CodedValue>,
}

/// External reference (`reference`), e.g. the prior act a statement replaces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    pub type_code: ReferenceType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_id: Option<InstanceIdentifier>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<InstanceIdentifier>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Author {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: Some(name.into()),
        }
    }
}

impl fmt::Display for Author {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.name, &self.id) {
            (Some(name), _) => f.write_str(name),
            (None, Some(id)) => id.fmt(f),
            (None, None) => f.write_str("<anonymous>"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ObservationValue {
    Coded(CodedValue),
    Text { text: String },
    Quantity { value: f64, unit: Option<String> },
}

/// The shared shape of an `act` or `observation` clinical statement.
///
/// Observation-only parts (`value`, `participants`) stay empty on acts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClinicalStatement {
    pub template_ids: Vec<TemplateId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<InstanceIdentifier>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<CodedValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<ActStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub effective_time: Option<EffectiveTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub null_flavor: Option<NullFlavor>,
    pub negation_ind: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<ObservationValue>,
    pub participants: Vec<Participant>,
    pub entry_relationships: Vec<EntryRelationship>,
    pub references: Vec<Reference>,
    pub authors: Vec<Author>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl ClinicalStatement {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_template(mut self, root: &str) -> Self {
        self.template_ids.push(TemplateId::from_root(root));
        self
    }

    #[must_use]
    pub fn with_id(mut self, id: InstanceIdentifier) -> Self {
        self.id = Some(id);
        self
    }

    #[must_use]
    pub fn with_code(mut self, code: CodedValue) -> Self {
        self.code = Some(code);
        self
    }

    #[must_use]
    pub fn with_status(mut self, status: ActStatus) -> Self {
        self.status_code = Some(status);
        self
    }

    #[must_use]
    pub fn with_effective_time(mut self, low: Option<Timestamp>, high: Option<Timestamp>) -> Self {
        self.effective_time = Some(EffectiveTime::new(low, high));
        self
    }

    #[must_use]
    pub fn with_negation(mut self, negated: bool) -> Self {
        self.negation_ind = negated;
        self
    }

    #[must_use]
    pub fn with_value(mut self, value: ObservationValue) -> Self {
        self.value = Some(value);
        self
    }

    #[must_use]
    pub fn with_participant(mut self, playing_entity_code: CodedValue) -> Self {
        self.participants.push(Participant {
            type_code: Some("CSM".to_string()),
            playing_entity_code: Some(playing_entity_code),
        });
        self
    }

    #[must_use]
    pub fn with_relationship(mut self, relationship: EntryRelationship) -> Self {
        self.entry_relationships.push(relationship);
        self
    }

    #[must_use]
    pub fn with_reference(mut self, type_code: ReferenceType, external_id: InstanceIdentifier) -> Self {
        self.references.push(Reference {
            type_code,
            external_id: Some(external_id),
        });
        self
    }

    #[must_use]
    pub fn with_author(mut self, author: Author) -> Self {
        self.authors.push(author);
        self
    }

    pub fn declares(&self, template: &str) -> bool {
        self.template_ids.iter().any(|id| id.is_root(template))
    }

    pub fn is_null(&self) -> bool {
        self.null_flavor.is_some()
    }

    /// The coded observation value, if it is coded and not null.
    pub fn value_coded(&self) -> Option<&CodedValue> {
        match &self.value {
            Some(ObservationValue::Coded(value)) if !value.is_null() => Some(value),
            _ => None,
        }
    }

    /// Non-null relationships that carry a statement declaring `template`.
    pub fn relationships_declaring<'a>(
        &'a self,
        template: &'a str,
    ) -> impl Iterator<Item = &'a EntryRelationship> + 'a {
        self.entry_relationships.iter().filter(move |rel| {
            !rel.is_null()
                && (rel.template_ids.iter().any(|id| id.is_root(template))
                    || rel.statement().is_some_and(|node| node.declares(template)))
        })
    }
}

/// `entryRelationship`: links a statement to one nested clinical statement.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EntryRelationship {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub type_code: Option<RelationshipType>,
    pub template_ids: Vec<TemplateId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub null_flavor: Option<NullFlavor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub statement: Option<Box<DocumentNode>>,
}

impl EntryRelationship {
    pub fn new(type_code: RelationshipType, statement: DocumentNode) -> Self {
        Self {
            type_code: Some(type_code),
            template_ids: Vec::new(),
            null_flavor: None,
            statement: Some(Box::new(statement)),
        }
    }

    #[must_use]
    pub fn with_template(mut self, root: &str) -> Self {
        self.template_ids.push(TemplateId::from_root(root));
        self
    }

    pub fn is_null(&self) -> bool {
        self.null_flavor.is_some()
    }

    pub fn statement(&self) -> Option<&DocumentNode> {
        self.statement.as_deref()
    }

    /// The nested statement when neither the relationship nor the statement
    /// is null-flavored.
    pub fn live_statement(&self) -> Option<&DocumentNode> {
        if self.is_null() {
            return None;
        }
        self.statement().filter(|node| !node.is_null())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Section {
    pub template_ids: Vec<TemplateId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<InstanceIdentifier>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<CodedValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub null_flavor: Option<NullFlavor>,
    /// Entries and nested sections, in document order.
    pub entries: Vec<DocumentNode>,
}

impl Section {
    #[must_use]
    pub fn with_template(mut self, root: &str) -> Self {
        self.template_ids.push(TemplateId::from_root(root));
        self
    }

    #[must_use]
    pub fn with_code(mut self, code: CodedValue) -> Self {
        self.code = Some(code);
        self
    }

    #[must_use]
    pub fn with_entry(mut self, entry: DocumentNode) -> Self {
        self.entries.push(entry);
        self
    }
}

/// Structural kind of a node, used to pick a fallback processor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Section,
    Act,
    Observation,
    EntryRelationship,
}

impl NodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Section => "section",
            NodeKind::Act => "act",
            NodeKind::Observation => "observation",
            NodeKind::EntryRelationship => "entryRelationship",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A node of the parsed document tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DocumentNode {
    Section(Section),
    Act(ClinicalStatement),
    Observation(ClinicalStatement),
    EntryRelationship(EntryRelationship),
}

impl DocumentNode {
    pub fn kind(&self) -> NodeKind {
        match self {
            DocumentNode::Section(_) => NodeKind::Section,
            DocumentNode::Act(_) => NodeKind::Act,
            DocumentNode::Observation(_) => NodeKind::Observation,
            DocumentNode::EntryRelationship(_) => NodeKind::EntryRelationship,
        }
    }

    pub fn template_ids(&self) -> &[TemplateId] {
        match self {
            DocumentNode::Section(section) => &section.template_ids,
            DocumentNode::Act(statement) | DocumentNode::Observation(statement) => {
                &statement.template_ids
            }
            DocumentNode::EntryRelationship(relationship) => &relationship.template_ids,
        }
    }

    /// True when the node declares the root-only template `template`.
    pub fn declares(&self, template: &str) -> bool {
        self.template_ids().iter().any(|id| id.is_root(template))
    }

    pub fn null_flavor(&self) -> Option<NullFlavor> {
        match self {
            DocumentNode::Section(section) => section.null_flavor,
            DocumentNode::Act(statement) | DocumentNode::Observation(statement) => {
                statement.null_flavor
            }
            DocumentNode::EntryRelationship(relationship) => relationship.null_flavor,
        }
    }

    pub fn is_null(&self) -> bool {
        self.null_flavor().is_some()
    }

    /// The clinical statement of an act or observation node.
    pub fn as_statement(&self) -> Option<&ClinicalStatement> {
        match self {
            DocumentNode::Act(statement) | DocumentNode::Observation(statement) => Some(statement),
            _ => None,
        }
    }

    pub fn as_section(&self) -> Option<&Section> {
        match self {
            DocumentNode::Section(section) => Some(section),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::templates::{ENT_ALLERGY_AND_INTOLERANCE_OBSERVATION, ENT_SEVERITY_OBSERVATION};

    #[test]
    fn null_coded_value_has_no_code() {
        let na = CodedValue::null(NullFlavor::NotApplicable);
        assert!(na.is_null());
        assert_eq!(na.code(), None);
        assert_eq!(CodedValue::new(" H ", "x").code(), Some("H"));
    }

    #[test]
    fn live_statement_skips_null_flavors() {
        let mut nulled = ClinicalStatement::new();
        nulled.null_flavor = Some(NullFlavor::NoInformation);
        let rel = EntryRelationship::new(RelationshipType::Subject, DocumentNode::Observation(nulled));
        assert!(rel.statement().is_some());
        assert!(rel.live_statement().is_none());

        let mut flavored = EntryRelationship::new(
            RelationshipType::Subject,
            DocumentNode::Observation(ClinicalStatement::new()),
        );
        flavored.null_flavor = Some(NullFlavor::Unknown);
        assert!(flavored.live_statement().is_none());
    }

    #[test]
    fn relationships_declaring_matches_statement_templates() {
        let severity = ClinicalStatement::new().with_template(ENT_SEVERITY_OBSERVATION);
        let allergy = ClinicalStatement::new()
            .with_template(ENT_ALLERGY_AND_INTOLERANCE_OBSERVATION)
            .with_relationship(EntryRelationship::new(
                RelationshipType::Subject,
                DocumentNode::Observation(severity),
            ));
        assert_eq!(allergy.relationships_declaring(ENT_SEVERITY_OBSERVATION).count(), 1);
        assert_eq!(
            allergy
                .relationships_declaring(ENT_ALLERGY_AND_INTOLERANCE_OBSERVATION)
                .count(),
            0
        );
    }

    #[test]
    fn node_tree_deserializes_from_tagged_json() {
        let json = r#"{
            "kind": "act",
            "template_ids": [{"root": "1.3.6.1.4.1.19376.1.5.3.1.4.5.1"}],
            "status_code": "active",
            "effective_time": {"low": "20200101"}
        }"#;
        let node: DocumentNode = serde_json::from_str(json).unwrap();
        assert_eq!(node.kind(), NodeKind::Act);
        assert!(node.declares("1.3.6.1.4.1.19376.1.5.3.1.4.5.1"));
        let statement = node.as_statement().unwrap();
        assert_eq!(statement.status_code, Some(ActStatus::Active));
        assert!(statement.effective_time.as_ref().unwrap().high().is_none());
    }
}
