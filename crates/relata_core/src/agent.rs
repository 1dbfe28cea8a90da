//! Agents as seen by the relational engine.
//!
//! Only `id` is used as a graph key. The other fields are payload carried for
//! the registry and for compatibility scoring.

use crate::state::RelationalState;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Agent {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Openness to change (0.0 - 1.0)
    #[serde(default = "default_plasticity")]
    pub plasticity: f64,
    /// Baseline vitality (0.0 - 1.0)
    #[serde(default = "default_energy")]
    pub energy: f64,
    #[serde(default = "default_social_style")]
    pub social_style: String,
}

fn default_plasticity() -> f64 {
    0.6
}

fn default_energy() -> f64 {
    0.7
}

fn default_social_style() -> String {
    "balanced".to_string()
}

impl Agent {
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            name: Some(id.clone()),
            id,
            plasticity: default_plasticity(),
            energy: default_energy(),
            social_style: default_social_style(),
        }
    }

    pub fn with_plasticity(mut self, plasticity: f64) -> Self {
        self.plasticity = plasticity.clamp(0.0, 1.0);
        self
    }

    pub fn with_energy(mut self, energy: f64) -> Self {
        self.energy = energy.clamp(0.0, 1.0);
        self
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }
}

/// Compatibility of two agents: plasticity similarity, blended with the
/// edge's trust and alignment when an edge is known.
pub fn compatibility(a: &Agent, b: &Agent, edge: Option<&RelationalState>) -> f64 {
    let base = 1.0 - (a.plasticity - b.plasticity).abs();
    match edge {
        Some(state) => {
            let bond = state.trust() * 0.3 + state.values().alignment * 0.2;
            base * 0.7 + bond * 0.3
        }
        None => base,
    }
}
