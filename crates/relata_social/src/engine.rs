//! Social Engine: the facade callers drive turn by turn.
//!
//! Owns the agent registry, the mesh, the conversation log and analytics.
//! `process_turn` takes `&mut self`, so turns against one engine are always
//! sequential. Share an engine across tasks through [`SharedEngine`].

use crate::generator::{ContentGenerator, GeneratedContent};
use crate::personalize::{personalize, ListenerContext, PersonalizedResponse};
use crate::report::{
    memory_estimate_mb, network_health, system_health, turn_frequency, ActivityEntry,
    AgentInteractionView, ConversationMetrics, Diagnostics, DynamicsReport, InteractionView,
    Snapshot,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use relata_core::{compatibility, Agent, EngineConfig, RelataError, Result, StateDelta, StateReport};
use relata_mesh::{
    speaking_recommendations, MeshSnapshot, RelationalMesh, SocialAnalytics, SocialDynamics,
    SpeakingRecommendation,
};
use serde::Serialize;
use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Shared-history entries included in an [`InteractionView`].
const VIEW_HISTORY_DEPTH: usize = 10;
/// Conversation entries shown as recent activity in diagnostics.
const ACTIVITY_DEPTH: usize = 5;
/// Conversation entries used for turn frequency.
const FREQUENCY_WINDOW: usize = 10;

/// One mutex serializing every call into a shared engine.
pub type SharedEngine = Arc<Mutex<SocialEngine>>;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationEntry {
    /// Unix timestamp in milliseconds
    pub timestamp: i64,
    pub speaker_id: String,
    pub input: String,
    pub context: serde_json::Value,
    pub personalized_count: usize,
}

/// Everything one processed turn produced.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnOutcome {
    pub base_response: GeneratedContent,
    pub personalized_responses: Vec<PersonalizedResponse>,
    pub social_dynamics: SocialDynamics,
    /// Listener contexts as they stood before the turn.
    pub interaction_states: Vec<ListenerContext>,
}

/// Node and link lists for graph visualisation.
#[derive(Debug, Clone, Serialize)]
pub struct NetworkData {
    pub nodes: Vec<NetworkNode>,
    pub links: Vec<NetworkLink>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NetworkNode {
    pub id: String,
    pub group: u32,
    /// Outgoing edge count
    pub size: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct NetworkLink {
    pub source: String,
    pub target: String,
    pub trust: f64,
    pub comfort: f64,
}

pub struct SocialEngine {
    agents: Vec<Agent>,
    config: EngineConfig,
    mesh: RelationalMesh,
    generator: Box<dyn ContentGenerator>,
    history: VecDeque<ConversationEntry>,
    analytics: SocialAnalytics,
    rng: StdRng,
}

impl std::fmt::Debug for SocialEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SocialEngine")
            .field("agents", &self.agents.len())
            .field("mesh", &self.mesh)
            .field("history", &self.history.len())
            .finish()
    }
}

impl SocialEngine {
    /// Build the engine over `agents`; fails with `Conflict` on a duplicate id.
    pub fn new(
        agents: Vec<Agent>,
        config: &EngineConfig,
        generator: Box<dyn ContentGenerator>,
    ) -> Result<Self> {
        let mut mesh = RelationalMesh::from_config(config);
        mesh.initialize(agents.iter().map(|a| a.id.clone()))?;
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(1)),
            None => StdRng::from_entropy(),
        };
        tracing::info!(
            "Social engine ready: {} agents, {} interactions",
            agents.len(),
            mesh.edge_count()
        );
        Ok(Self {
            agents,
            config: config.clone(),
            mesh,
            generator,
            history: VecDeque::new(),
            analytics: SocialAnalytics::new(),
            rng,
        })
    }

    pub fn into_shared(self) -> SharedEngine {
        Arc::new(Mutex::new(self))
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn agent(&self, id: &str) -> Result<&Agent> {
        self.agents
            .iter()
            .find(|a| a.id == id)
            .ok_or_else(|| RelataError::unknown_agent(id))
    }

    pub fn mesh(&self) -> &RelationalMesh {
        &self.mesh
    }

    pub fn history(&self) -> &VecDeque<ConversationEntry> {
        &self.history
    }

    pub fn analytics(&self) -> &SocialAnalytics {
        &self.analytics
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Run one turn: generate, personalize per listener, update the mesh.
    ///
    /// The generator is awaited before any mesh state is read, so a failed
    /// generation leaves the engine untouched.
    pub async fn process_turn(
        &mut self,
        speaker_id: &str,
        input: &str,
        context: serde_json::Value,
    ) -> Result<TurnOutcome> {
        let speaker = self.agent(speaker_id)?;
        let audience = self.mesh.agent_count().saturating_sub(1);
        let base = self
            .generator
            .generate(speaker, input, audience, &context)
            .await
            .map_err(RelataError::Generation)?;

        let listeners: Vec<ListenerContext> = self
            .mesh
            .agent_interactions(speaker_id)?
            .into_iter()
            .map(|edge| ListenerContext {
                target: edge.target().to_string(),
                context: edge.personalization_context(),
                should_engage: edge.should_engage(),
            })
            .collect();

        let personalized: Vec<PersonalizedResponse> = listeners
            .iter()
            .filter(|l| l.should_engage)
            .map(|l| personalize(&base, l, &mut self.rng))
            .collect();

        let event = base.to_event(speaker_id, listeners.iter().map(|l| l.target.clone()).collect());
        let dynamics = self.mesh.update_from_interaction(&event)?;

        if self.history.len() >= self.config.max_history_size.max(1) {
            self.history.pop_front();
        }
        self.history.push_back(ConversationEntry {
            timestamp: chrono::Utc::now().timestamp_millis(),
            speaker_id: speaker_id.to_string(),
            input: input.to_string(),
            context,
            personalized_count: personalized.len(),
        });
        let willingness: Vec<f64> = personalized.iter().map(|p| p.engagement_willingness).collect();
        let engagement = self.analytics.record_turn(&willingness, dynamics);

        tracing::debug!(
            "Turn {} by {}: {}/{} personalized, engagement={:.3}",
            self.analytics.turn_count(),
            speaker_id,
            personalized.len(),
            listeners.len(),
            engagement
        );

        Ok(TurnOutcome {
            base_response: base,
            personalized_responses: personalized,
            social_dynamics: dynamics,
            interaction_states: listeners,
        })
    }

    pub fn interaction_view(&self, source: &str, target: &str) -> Result<InteractionView> {
        let edge = self.mesh.interaction(source, target)?;
        let skip = edge.shared_history().len().saturating_sub(VIEW_HISTORY_DEPTH);
        Ok(InteractionView {
            context: edge.personalization_context(),
            state: edge.state().report(),
            patterns: edge.patterns().counts(),
            style: *edge.patterns().style(),
            history: edge.shared_history().iter().skip(skip).cloned().collect(),
        })
    }

    pub fn agent_interaction_views(&self, id: &str) -> Result<Vec<AgentInteractionView>> {
        Ok(self
            .mesh
            .agent_interactions(id)?
            .into_iter()
            .map(|edge| AgentInteractionView {
                target: edge.target().to_string(),
                context: edge.personalization_context(),
                state: edge.state().report(),
            })
            .collect())
    }

    pub fn social_dynamics_report(&self) -> DynamicsReport {
        let dynamics = self.mesh.social_dynamics();
        let threshold = self.config.active_willingness_threshold;
        DynamicsReport {
            network_health: network_health(&dynamics),
            dynamics,
            analytics: self.analytics.summary(),
            active_relationships: self
                .mesh
                .interactions()
                .filter(|e| e.state().engagement_willingness() > threshold)
                .count(),
            conversation_metrics: self.conversation_metrics(),
        }
    }

    pub fn conversation_metrics(&self) -> ConversationMetrics {
        let recent = self.tail(self.config.recent_window);
        let personalized = recent.iter().filter(|e| e.personalized_count > 0).count();
        let timestamps: Vec<i64> = self.tail(FREQUENCY_WINDOW).iter().map(|e| e.timestamp).collect();
        ConversationMetrics {
            total_turns: self.history.len(),
            recent_turns: recent.len(),
            personalization_rate: if recent.is_empty() {
                0.0
            } else {
                personalized as f64 / recent.len() as f64
            },
            average_engagement: self.analytics.average_engagement(),
            turn_frequency: turn_frequency(&timestamps),
        }
    }

    fn tail(&self, n: usize) -> Vec<&ConversationEntry> {
        let skip = self.history.len().saturating_sub(n);
        self.history.iter().skip(skip).collect()
    }

    /// Direct damped update of one edge, outside any turn.
    pub fn update_interaction_state(
        &mut self,
        source: &str,
        target: &str,
        delta: &StateDelta,
    ) -> Result<StateReport> {
        self.mesh.update_interaction_state(source, target, delta)
    }

    /// Register `agent` and wire it into the mesh. Each `initial` delta is
    /// applied to the new agent's edge toward the named agent; names not in
    /// the registry are skipped.
    pub fn add_agent(
        &mut self,
        agent: Agent,
        initial: &BTreeMap<String, StateDelta>,
    ) -> Result<Vec<AgentInteractionView>> {
        if self.agents.iter().any(|a| a.id == agent.id) {
            return Err(RelataError::Conflict(agent.id));
        }
        self.mesh.add_agent(agent.id.clone())?;
        let id = agent.id.clone();
        self.agents.push(agent);

        for (other, delta) in initial {
            if other == &id || !self.mesh.contains(other) {
                tracing::warn!("Initial state for {} -> {} skipped: unknown agent", id, other);
                continue;
            }
            self.mesh.update_interaction_state(&id, other, delta)?;
        }
        self.agent_interaction_views(&id)
    }

    /// Unregister an agent, drop its edges and its turns from the log.
    pub fn remove_agent(&mut self, id: &str) -> Result<()> {
        self.agent(id)?;
        self.mesh.remove_agent(id)?;
        self.agents.retain(|a| a.id != id);
        self.history.retain(|e| e.speaker_id != id);
        Ok(())
    }

    pub fn speaking_recommendations(&self) -> Vec<SpeakingRecommendation> {
        let speakers: Vec<&str> = self.history.iter().map(|e| e.speaker_id.as_str()).collect();
        speaking_recommendations(&self.mesh, &speakers)
    }

    /// Compatibility of two registered agents, using the `a → b` edge.
    pub fn compatibility(&self, a: &str, b: &str) -> Result<f64> {
        let (agent_a, agent_b) = (self.agent(a)?, self.agent(b)?);
        let edge = self.mesh.interaction(a, b).ok().map(|e| e.state());
        Ok(compatibility(agent_a, agent_b, edge))
    }

    pub fn network_data(&self) -> NetworkData {
        let mut nodes = Vec::new();
        let mut links = Vec::new();
        for id in self.mesh.agent_ids() {
            let edges = self.mesh.agent_interactions(id).unwrap_or_default();
            nodes.push(NetworkNode {
                id: id.to_string(),
                group: 1,
                size: edges.len(),
            });
            links.extend(edges.into_iter().map(|e| NetworkLink {
                source: id.to_string(),
                target: e.target().to_string(),
                trust: e.state().trust(),
                comfort: e.state().comfort(),
            }));
        }
        NetworkData { nodes, links }
    }

    pub fn export_state(&self) -> Snapshot {
        Snapshot {
            mesh: self.mesh.export(),
            social_dynamics: self.social_dynamics_report(),
            conversation_stats: self.conversation_metrics(),
        }
    }

    pub fn export_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.export_state())?)
    }

    /// Rebuild the mesh from a snapshot. Conversation log and analytics
    /// restart empty; agents new to the registry get default attributes.
    pub fn import_state(&mut self, snapshot: &MeshSnapshot) -> Result<DynamicsReport> {
        self.mesh.import(snapshot)?;

        let mut previous = std::mem::take(&mut self.agents);
        self.agents = snapshot
            .agents
            .iter()
            .map(|id| match previous.iter().position(|a| &a.id == id) {
                Some(i) => previous.swap_remove(i),
                None => Agent::new(id.clone()),
            })
            .collect();
        self.history.clear();
        self.analytics = SocialAnalytics::new();

        tracing::info!(
            "Imported snapshot: {} agents, {} edge records",
            snapshot.agents.len(),
            snapshot.edge_record_count()
        );
        Ok(self.social_dynamics_report())
    }

    /// Parse and import a snapshot document. `agents` and `interactions`
    /// are required; every other top-level key is ignored.
    pub fn import_json(&mut self, json: &str) -> Result<DynamicsReport> {
        let value: serde_json::Value =
            serde_json::from_str(json).map_err(|e| RelataError::InvalidFormat(e.to_string()))?;
        for key in ["agents", "interactions"] {
            if value.get(key).map_or(true, serde_json::Value::is_null) {
                return Err(RelataError::InvalidFormat(format!("missing `{}`", key)));
            }
        }
        let snapshot: MeshSnapshot =
            serde_json::from_value(value).map_err(|e| RelataError::InvalidFormat(e.to_string()))?;
        self.import_state(&snapshot)
    }

    pub fn diagnostics(&self) -> Diagnostics {
        let memory_usage = memory_estimate_mb(self.mesh.edge_count(), self.history.len());
        let recent_activity: Vec<ActivityEntry> = self
            .tail(ACTIVITY_DEPTH)
            .into_iter()
            .map(|e| ActivityEntry {
                speaker: e.speaker_id.clone(),
                timestamp: e.timestamp,
                had_personalization: e.personalized_count > 0,
            })
            .collect();
        let health = system_health(
            memory_usage,
            network_health(&self.mesh.social_dynamics()),
            recent_activity.len(),
        );
        Diagnostics {
            agent_count: self.agents.len(),
            interaction_count: self.mesh.edge_count(),
            history_size: self.history.len(),
            memory_usage,
            recent_activity,
            health,
        }
    }
}
