#![deny(unsafe_code)]

use std::fmt;
use std::str::FromStr;

use crate::ModelError;

/// HL7 instance identifier (`II`): an OID-like root plus an optional extension.
///
/// Used for accession numbers, external references and authors. Equality is
/// exact on both parts.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct InstanceIdentifier {
    root: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    extension: Option<String>,
}

impl InstanceIdentifier {
    pub fn new(root: impl Into<String>) -> Result<Self, ModelError> {
        let root = root.into();
        let trimmed = root.trim();
        if trimmed.is_empty() {
            return Err(ModelError::InvalidIdentifier(root));
        }
        Ok(Self {
            root: trimmed.to_string(),
            extension: None,
        })
    }

    #[must_use]
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        let extension = extension.into();
        let trimmed = extension.trim();
        self.extension = (!trimmed.is_empty()).then(|| trimmed.to_string());
        self
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    pub fn extension(&self) -> Option<&str> {
        self.extension.as_deref()
    }
}

/// Wire form is `root^extension`, or just `root` when there is no extension.
impl fmt::Display for InstanceIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.extension {
            Some(extension) => write!(f, "{}^{}", self.root, extension),
            None => f.write_str(&self.root),
        }
    }
}

impl FromStr for InstanceIdentifier {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('^') {
            Some((root, extension)) => Ok(Self::new(root)?.with_extension(extension)),
            None => Self::new(s),
        }
    }
}

/// A template identifier declared on a node (`templateId`).
///
/// Opaque: two template identifiers are the same template only when root and
/// extension both match.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(transparent)]
pub struct TemplateId(InstanceIdentifier);

impl TemplateId {
    pub fn new(root: impl Into<String>) -> Result<Self, ModelError> {
        InstanceIdentifier::new(root).map(Self)
    }

    /// Builds a root-only template identifier from a catalogue constant.
    pub fn from_root(root: &str) -> Self {
        Self(InstanceIdentifier {
            root: root.to_string(),
            extension: None,
        })
    }

    #[must_use]
    pub fn with_extension(self, extension: impl Into<String>) -> Self {
        Self(self.0.with_extension(extension))
    }

    pub fn root(&self) -> &str {
        self.0.root()
    }

    pub fn extension(&self) -> Option<&str> {
        self.0.extension()
    }

    /// True when this is exactly the root-only template `root`.
    pub fn is_root(&self, root: &str) -> bool {
        self.0.extension.is_none() && self.0.root == root
    }
}

impl fmt::Display for TemplateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for TemplateId {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(Self)
    }
}

#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(transparent)]
pub struct PatientId(String);

impl PatientId {
    pub fn new(value: impl Into<String>) -> Result<Self, ModelError> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(ModelError::InvalidPatientId(value));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PatientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Stable arena key of a persisted allergy or condition.
///
/// Assigned by the record store on first save; every later lookup of the same
/// record (by replacement reference or by accession number) yields the same key.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(transparent)]
pub struct RecordKey(u64);

impl RecordKey {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "record-{}", self.0)
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(transparent)]
pub struct ObservationId(u64);

impl ObservationId {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ObservationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "obs-{}", self.0)
    }
}
