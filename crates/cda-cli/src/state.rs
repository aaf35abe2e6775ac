//! JSON snapshot of the in-memory store and vocabulary between runs.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use cda_core::{MemoryRecordStore, MemoryVocabulary};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSnapshot {
    pub store: MemoryRecordStore,
    pub vocabulary: MemoryVocabulary,
}

impl StoreSnapshot {
    /// The snapshot at `path`, or an empty one if the file does not exist yet.
    pub fn load(path: &Path) -> Result<Self> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(error) if error.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "no store snapshot yet, starting empty");
                return Ok(Self::default());
            }
            Err(error) => {
                return Err(error)
                    .with_context(|| format!("read store snapshot {}", path.display()));
            }
        };
        serde_json::from_str(&text)
            .with_context(|| format!("parse store snapshot {}", path.display()))
    }

    /// Write through a sibling temporary file so a crash never leaves a
    /// truncated snapshot behind.
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("serialize store snapshot")?;
        let staging = path.with_extension("json.tmp");
        fs::write(&staging, json)
            .with_context(|| format!("write store snapshot {}", staging.display()))?;
        fs::rename(&staging, path)
            .with_context(|| format!("replace store snapshot {}", path.display()))?;
        debug!(
            path = %path.display(),
            records = self.store.records().len(),
            observations = self.store.observations().len(),
            concepts = self.vocabulary.len(),
            "saved store snapshot"
        );
        Ok(())
    }
}
