//! Relational Mesh: the complete directed graph of interactions.
//!
//! For N agents exactly N×(N−1) edges exist at all times, one per ordered
//! pair, never a self edge. Agent ids map to dense slots so edge lookups key
//! on `(AgentSlot, AgentSlot)` without allocating.

use crate::snapshot::{EdgeRecord, MeshSnapshot};
use rand::rngs::StdRng;
use rand::SeedableRng;
use relata_core::patterns::{PatternCategory, DEFAULT_PATTERN_WINDOW_MS};
use relata_core::{
    EngineConfig, Interaction, KeywordSignals, RelataError, RelationalState, Result,
    SignalExtractor, StateDelta, StateReport, StateValues, TurnEvent,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, VecDeque};

/// Dense per-mesh index of an agent. Never reused within one mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AgentSlot(u32);

type EdgeKey = (AgentSlot, AgentSlot);

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TrustDistribution {
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    pub variance: f64,
}

/// Network-wide aggregates, recomputed after every turn.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SocialDynamics {
    /// Mean trust over all edges
    pub network_cohesion: f64,
    pub trust_distribution: TrustDistribution,
    /// Mean energy over all edges
    pub social_energy: f64,
    /// Σ conflict frequency / Σ (alignment frequency + 1), per edge
    pub conflict_level: f64,
}

pub struct RelationalMesh {
    slots: HashMap<String, AgentSlot>,
    /// Agents in insertion order.
    agents: Vec<(AgentSlot, String)>,
    next_slot: u32,
    edges: BTreeMap<EdgeKey, Interaction>,
    history: VecDeque<TurnEvent>,
    history_limit: usize,
    edge_history_limit: usize,
    extractor: Box<dyn SignalExtractor>,
    rng: StdRng,
}

impl std::fmt::Debug for RelationalMesh {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelationalMesh")
            .field("agents", &self.agents.len())
            .field("edges", &self.edges.len())
            .field("history", &self.history.len())
            .finish()
    }
}

impl RelationalMesh {
    /// Empty mesh drawing initial edge states from `rng`.
    pub fn new(rng: StdRng) -> Self {
        let defaults = EngineConfig::default();
        Self {
            slots: HashMap::new(),
            agents: Vec::new(),
            next_slot: 0,
            edges: BTreeMap::new(),
            history: VecDeque::new(),
            history_limit: defaults.max_history_size,
            edge_history_limit: defaults.edge_history_limit,
            extractor: Box::new(KeywordSignals),
            rng,
        }
    }

    /// Mesh sized and seeded from engine config.
    pub fn from_config(config: &EngineConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let mut mesh = Self::new(rng);
        mesh.history_limit = config.max_history_size.max(1);
        mesh.edge_history_limit = config.edge_history_limit.max(1);
        mesh
    }

    /// Replace the heuristic rule set used to read turns.
    pub fn with_extractor(mut self, extractor: Box<dyn SignalExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    /// Build the complete directed edge set over `ids`.
    ///
    /// Fails with `Conflict` on a duplicate id; nothing is inserted then.
    pub fn initialize<I, S>(&mut self, ids: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let ids: Vec<String> = ids.into_iter().map(Into::into).collect();
        for (i, id) in ids.iter().enumerate() {
            if self.slots.contains_key(id) || ids[..i].contains(id) {
                return Err(RelataError::Conflict(id.clone()));
            }
        }
        for id in ids {
            self.insert_agent(id);
        }
        tracing::debug!(
            "Mesh initialized: {} agents, {} edges",
            self.agents.len(),
            self.edges.len()
        );
        Ok(())
    }

    fn insert_agent(&mut self, id: String) -> usize {
        let slot = AgentSlot(self.next_slot);
        self.next_slot += 1;

        let mut created = 0;
        for (other, other_id) in &self.agents {
            let out = Interaction::new(id.clone(), other_id.clone(), RelationalState::random(&mut self.rng))
                .with_history_limit(self.edge_history_limit);
            let back = Interaction::new(other_id.clone(), id.clone(), RelationalState::random(&mut self.rng))
                .with_history_limit(self.edge_history_limit);
            self.edges.insert((slot, *other), out);
            self.edges.insert((*other, slot), back);
            created += 2;
        }
        self.slots.insert(id.clone(), slot);
        self.agents.push((slot, id));
        created
    }

    fn slot(&self, id: &str) -> Result<AgentSlot> {
        self.slots
            .get(id)
            .copied()
            .ok_or_else(|| RelataError::unknown_agent(id))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.slots.contains_key(id)
    }

    pub fn agent_count(&self) -> usize {
        self.agents.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Agent ids in insertion order.
    pub fn agent_ids(&self) -> impl Iterator<Item = &str> + '_ {
        self.agents.iter().map(|(_, id)| id.as_str())
    }

    pub fn interactions(&self) -> impl Iterator<Item = &Interaction> + '_ {
        self.edges.values()
    }

    pub fn history(&self) -> &VecDeque<TurnEvent> {
        &self.history
    }

    /// Add an agent, wiring it to every existing agent in both directions.
    /// Returns the number of edges created (2 × previous agent count).
    pub fn add_agent(&mut self, id: impl Into<String>) -> Result<usize> {
        let id = id.into();
        if self.slots.contains_key(&id) {
            return Err(RelataError::Conflict(id));
        }
        let created = self.insert_agent(id.clone());
        tracing::info!("Agent {} joined the mesh ({} new edges)", id, created);
        Ok(created)
    }

    /// Remove an agent and every edge incident to it. Returns the number removed.
    pub fn remove_agent(&mut self, id: &str) -> Result<usize> {
        let slot = self.slot(id)?;
        let before = self.edges.len();
        self.edges.retain(|(from, to), _| *from != slot && *to != slot);
        self.slots.remove(id);
        self.agents.retain(|(s, _)| *s != slot);
        let removed = before - self.edges.len();
        tracing::info!("Agent {} left the mesh ({} edges removed)", id, removed);
        Ok(removed)
    }

    pub fn interaction(&self, source: &str, target: &str) -> Result<&Interaction> {
        let key = (self.slot(source)?, self.slot(target)?);
        self.edges
            .get(&key)
            .ok_or_else(|| RelataError::unknown_pair(source, target))
    }

    pub fn interaction_mut(&mut self, source: &str, target: &str) -> Result<&mut Interaction> {
        let key = (self.slot(source)?, self.slot(target)?);
        self.edges
            .get_mut(&key)
            .ok_or_else(|| RelataError::unknown_pair(source, target))
    }

    /// Every edge with `id` as its source, in target insertion order.
    pub fn agent_interactions(&self, id: &str) -> Result<Vec<&Interaction>> {
        let slot = self.slot(id)?;
        Ok(self
            .edges
            .range((slot, AgentSlot(0))..=(slot, AgentSlot(u32::MAX)))
            .map(|(_, edge)| edge)
            .collect())
    }

    /// Apply a damped delta to one edge directly, outside of any turn.
    pub fn update_interaction_state(
        &mut self,
        source: &str,
        target: &str,
        delta: &StateDelta,
    ) -> Result<StateReport> {
        Ok(self.interaction_mut(source, target)?.state_mut().update(delta))
    }

    /// Propagate one turn to every edge touching the speaker.
    ///
    /// For each listener L: `speaker → L` records the speaker impact and
    /// `L → speaker` records how L perceived the turn. All ids are checked
    /// before any edge is touched.
    pub fn update_from_interaction(&mut self, event: &TurnEvent) -> Result<SocialDynamics> {
        let speaker = self.slot(&event.speaker)?;
        let mut listeners = Vec::with_capacity(event.listeners.len());
        for id in &event.listeners {
            let slot = self.slot(id)?;
            if slot == speaker {
                tracing::debug!("Skipping self-listener {}", id);
                continue;
            }
            listeners.push(slot);
        }

        let signals = self.extractor.extract(event);
        for listener in &listeners {
            if let Some(edge) = self.edges.get_mut(&(speaker, *listener)) {
                edge.update_from_speaker(event, &signals);
            }
            if let Some(edge) = self.edges.get_mut(&(*listener, speaker)) {
                edge.update_from_listener(event, &signals);
            }
        }

        if self.history.len() >= self.history_limit {
            self.history.pop_front();
        }
        self.history.push_back(event.clone());

        let dynamics = self.social_dynamics();
        tracing::debug!(
            "Turn by {} reached {} listeners: cohesion={:.3}, conflict={:.3}",
            event.speaker,
            listeners.len(),
            dynamics.network_cohesion,
            dynamics.conflict_level
        );
        Ok(dynamics)
    }

    pub fn social_dynamics(&self) -> SocialDynamics {
        self.social_dynamics_at(chrono::Utc::now().timestamp_millis())
    }

    /// Aggregates with pattern frequencies measured against `now_ms`.
    pub fn social_dynamics_at(&self, now_ms: i64) -> SocialDynamics {
        if self.edges.is_empty() {
            return SocialDynamics::default();
        }
        let n = self.edges.len() as f64;

        let trusts: Vec<f64> = self.edges.values().map(|e| e.state().trust()).collect();
        let mean = trusts.iter().sum::<f64>() / n;
        let variance = trusts.iter().map(|t| (t - mean).powi(2)).sum::<f64>() / n;
        let min = trusts.iter().copied().fold(f64::INFINITY, f64::min);
        let max = trusts.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        let social_energy = self.edges.values().map(|e| e.state().energy()).sum::<f64>() / n;

        let mut conflicts = 0usize;
        let mut smoothed = 0usize;
        for edge in self.edges.values() {
            let patterns = edge.patterns();
            conflicts +=
                patterns.pattern_frequency_at(PatternCategory::Conflict, DEFAULT_PATTERN_WINDOW_MS, now_ms);
            smoothed += patterns.pattern_frequency_at(
                PatternCategory::Alignment,
                DEFAULT_PATTERN_WINDOW_MS,
                now_ms,
            ) + 1;
        }

        SocialDynamics {
            network_cohesion: mean,
            trust_distribution: TrustDistribution {
                mean,
                min,
                max,
                variance,
            },
            social_energy,
            conflict_level: conflicts as f64 / smoothed as f64,
        }
    }

    /// Per-edge records for a snapshot.
    pub fn export(&self) -> MeshSnapshot {
        let mut interactions = BTreeMap::new();
        for (_, id) in &self.agents {
            let mut targets = BTreeMap::new();
            if let Ok(edges) = self.agent_interactions(id) {
                for edge in edges {
                    targets.insert(
                        edge.target().to_string(),
                        EdgeRecord {
                            state: edge.state().report(),
                            patterns: edge.patterns().counts(),
                            history_size: edge.shared_history().len(),
                        },
                    );
                }
            }
            interactions.insert(id.clone(), targets);
        }
        MeshSnapshot {
            timestamp: chrono::Utc::now().timestamp_millis(),
            agents: self.agent_ids().map(str::to_string).collect(),
            interactions,
        }
    }

    /// Rebuild the complete graph over the snapshot's agents and restore
    /// per-edge values. Edges without a record get a fresh random state.
    ///
    /// The replacement graph is built aside and swapped in, so a failure
    /// leaves the current mesh untouched.
    pub fn import(&mut self, snapshot: &MeshSnapshot) -> Result<()> {
        let mut rebuilt = RelationalMesh {
            slots: HashMap::new(),
            agents: Vec::new(),
            next_slot: 0,
            edges: BTreeMap::new(),
            history: VecDeque::new(),
            history_limit: self.history_limit,
            edge_history_limit: self.edge_history_limit,
            extractor: Box::new(KeywordSignals),
            rng: StdRng::from_rng(&mut self.rng)
                .map_err(|e| RelataError::InvalidFormat(format!("rng: {}", e)))?,
        };
        rebuilt
            .initialize(snapshot.agents.iter().cloned())
            .map_err(|e| RelataError::InvalidFormat(e.to_string()))?;

        let mut restored = 0usize;
        for (source, targets) in &snapshot.interactions {
            for (target, record) in targets {
                match rebuilt.interaction_mut(source, target) {
                    Ok(edge) => {
                        edge.state_mut().restore(record.state.values);
                        restored += 1;
                    }
                    Err(_) => {
                        tracing::warn!("Snapshot edge {} -> {} has no counterpart, skipped", source, target);
                    }
                }
            }
        }

        std::mem::swap(&mut self.slots, &mut rebuilt.slots);
        std::mem::swap(&mut self.agents, &mut rebuilt.agents);
        std::mem::swap(&mut self.edges, &mut rebuilt.edges);
        self.next_slot = rebuilt.next_slot;
        self.history.clear();

        tracing::info!(
            "Mesh restored: {} agents, {} edges, {} edge states from snapshot",
            self.agents.len(),
            self.edges.len(),
            restored
        );
        Ok(())
    }

    /// Overwrite one edge's values (no damping, no history).
    pub fn restore_edge(&mut self, source: &str, target: &str, values: StateValues) -> Result<()> {
        self.interaction_mut(source, target)?.state_mut().restore(values);
        Ok(())
    }
}
