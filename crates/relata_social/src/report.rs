//! Read models returned by the engine: views, reports, diagnostics and the
//! full snapshot document.

use relata_core::{PatternCategory, PersonalizationContext, SharedRecord, StateReport, StyleProfile};
use relata_mesh::{AnalyticsSummary, MeshSnapshot, SocialDynamics};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Memory estimate per edge, in bytes.
const EDGE_FOOTPRINT: f64 = 1024.0;
/// Memory estimate per conversation entry, in bytes.
const TURN_FOOTPRINT: f64 = 512.0;

/// One edge as seen from the outside.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InteractionView {
    #[serde(flatten)]
    pub context: PersonalizationContext,
    pub state: StateReport,
    pub patterns: BTreeMap<PatternCategory, usize>,
    pub style: StyleProfile,
    /// Last entries of the edge's shared history.
    pub history: Vec<SharedRecord>,
}

/// Outgoing edge summary for one agent.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentInteractionView {
    pub target: String,
    #[serde(flatten)]
    pub context: PersonalizationContext,
    pub state: StateReport,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationMetrics {
    pub total_turns: usize,
    pub recent_turns: usize,
    /// Share of recent turns with at least one personalized response.
    pub personalization_rate: f64,
    pub average_engagement: f64,
    /// Turns per second over the last ten turns.
    pub turn_frequency: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DynamicsReport {
    #[serde(flatten)]
    pub dynamics: SocialDynamics,
    pub analytics: AnalyticsSummary,
    pub network_health: f64,
    pub active_relationships: usize,
    pub conversation_metrics: ConversationMetrics,
}

/// Exported engine state. Restore reads only the mesh part.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    #[serde(flatten)]
    pub mesh: MeshSnapshot,
    pub social_dynamics: DynamicsReport,
    pub conversation_stats: ConversationMetrics,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityEntry {
    pub speaker: String,
    pub timestamp: i64,
    pub had_personalization: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostics {
    pub agent_count: usize,
    pub interaction_count: usize,
    pub history_size: usize,
    /// Rough footprint in MB.
    pub memory_usage: f64,
    pub recent_activity: Vec<ActivityEntry>,
    pub health: f64,
}

pub fn network_health(dynamics: &SocialDynamics) -> f64 {
    dynamics.network_cohesion * 0.4
        + (1.0 - dynamics.conflict_level) * 0.4
        + dynamics.social_energy.max(0.0) * 0.2
}

/// Turns per second across `timestamps` (ms, oldest first).
pub fn turn_frequency(timestamps: &[i64]) -> f64 {
    let (Some(first), Some(last)) = (timestamps.first(), timestamps.last()) else {
        return 0.0;
    };
    let span_ms = last - first;
    if timestamps.len() < 2 || span_ms <= 0 {
        return 0.0;
    }
    timestamps.len() as f64 / (span_ms as f64 / 1000.0)
}

pub fn memory_estimate_mb(edges: usize, turns: usize) -> f64 {
    (edges as f64 * EDGE_FOOTPRINT + turns as f64 * TURN_FOOTPRINT) / 1024.0 / 1024.0
}

pub fn system_health(memory_mb: f64, network_health: f64, recent_activity: usize) -> f64 {
    let mut health: f64 = 1.0;
    if memory_mb > 10.0 {
        health -= 0.2;
    }
    if network_health < 0.5 {
        health -= 0.3;
    }
    if recent_activity == 0 {
        health -= 0.2;
    }
    health.max(0.0)
}
