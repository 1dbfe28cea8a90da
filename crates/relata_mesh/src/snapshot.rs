//! Flat snapshot of the mesh for an external persistence layer.
//!
//! Only values are exported per edge: pattern buffers travel as counts and
//! shared history as its size, so a restore rehydrates edge state but starts
//! those logs empty.

use relata_core::{PatternCategory, StateReport};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeRecord {
    pub state: StateReport,
    #[serde(default)]
    pub patterns: BTreeMap<PatternCategory, usize>,
    #[serde(default)]
    pub history_size: usize,
}

/// `source id → target id → record`
pub type InteractionTable = BTreeMap<String, BTreeMap<String, EdgeRecord>>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeshSnapshot {
    /// Unix timestamp in milliseconds
    #[serde(default)]
    pub timestamp: i64,
    pub agents: Vec<String>,
    pub interactions: InteractionTable,
}

impl MeshSnapshot {
    pub fn edge_record_count(&self) -> usize {
        self.interactions.values().map(BTreeMap::len).sum()
    }
}
