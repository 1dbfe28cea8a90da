//! Interaction: one directed edge of the mesh.
//!
//! The same turn touches an edge from two sides. The speaker's outgoing edge
//! records the *speaker impact*; the listener's outgoing edge back to the
//! speaker records the *listener perception*. The two rule sets are
//! deliberately asymmetric.

use crate::event::TurnEvent;
use crate::patterns::{PatternTracker, StyleDimension};
use crate::signals::TurnSignals;
use crate::state::{Dimension, RelationalState, StateDelta, StateReport, Stance};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Default cap on an edge's shared history.
pub const DEFAULT_EDGE_HISTORY_LIMIT: usize = 1000;

/// Shared-history entries exposed to personalization.
const SHARED_MEMORY_DEPTH: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExchangeKind {
    SpeakerAction,
    ListenerExperience,
}

/// One entry of an edge's shared history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SharedRecord {
    pub kind: ExchangeKind,
    pub event: TurnEvent,
    pub delta: StateDelta,
    /// Unix timestamp in milliseconds
    pub timestamp: i64,
}

/// Read-only bundle handed to the content-personalization layer.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonalizationContext {
    pub stance: Stance,
    pub trust_level: f64,
    pub comfort_level: f64,
    pub shared_memories: Vec<SharedRecord>,
    pub interaction_style: StyleDimension,
    pub engagement_willingness: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Interaction {
    source: String,
    target: String,
    state: RelationalState,
    patterns: PatternTracker,
    shared_history: VecDeque<SharedRecord>,
    history_limit: usize,
    /// Unix timestamp (ms) of the last turn applied to this edge
    last_updated: i64,
}

impl Interaction {
    pub fn new(source: impl Into<String>, target: impl Into<String>, state: RelationalState) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            state,
            patterns: PatternTracker::new(),
            shared_history: VecDeque::new(),
            history_limit: DEFAULT_EDGE_HISTORY_LIMIT,
            last_updated: chrono::Utc::now().timestamp_millis(),
        }
    }

    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit.max(1);
        self
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn state(&self) -> &RelationalState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut RelationalState {
        &mut self.state
    }

    pub fn patterns(&self) -> &PatternTracker {
        &self.patterns
    }

    pub fn shared_history(&self) -> &VecDeque<SharedRecord> {
        &self.shared_history
    }

    pub fn last_updated(&self) -> i64 {
        self.last_updated
    }

    /// Apply the speaker-impact rules to this (speaker → listener) edge.
    pub fn update_from_speaker(&mut self, event: &TurnEvent, signals: &TurnSignals) -> StateReport {
        let impact = speaker_impact(signals);
        let report = self.state.update(&impact);
        self.patterns.record_speaker_action(event, signals);
        self.remember(ExchangeKind::SpeakerAction, event, impact);
        report
    }

    /// Apply the listener-perception rules to this (listener → speaker) edge.
    pub fn update_from_listener(&mut self, event: &TurnEvent, signals: &TurnSignals) -> StateReport {
        let perception = listener_perception(signals);
        let report = self.state.update(&perception);
        self.patterns.record_listener_experience(event, signals);
        self.remember(ExchangeKind::ListenerExperience, event, perception);
        report
    }

    fn remember(&mut self, kind: ExchangeKind, event: &TurnEvent, delta: StateDelta) {
        let now = chrono::Utc::now().timestamp_millis();
        if self.shared_history.len() >= self.history_limit {
            self.shared_history.pop_front();
        }
        self.shared_history.push_back(SharedRecord {
            kind,
            event: event.clone(),
            delta,
            timestamp: now,
        });
        self.last_updated = now;
    }

    /// Pure threshold comparison: willingness must strictly exceed cost.
    pub fn should_engage(&self) -> bool {
        self.state.engagement_willingness() > self.state.interaction_energy_cost()
    }

    pub fn personalization_context(&self) -> PersonalizationContext {
        let skip = self.shared_history.len().saturating_sub(SHARED_MEMORY_DEPTH);
        PersonalizationContext {
            stance: self.state.stance(),
            trust_level: self.state.trust(),
            comfort_level: self.state.comfort(),
            shared_memories: self.shared_history.iter().skip(skip).cloned().collect(),
            interaction_style: self.patterns.dominant_style(),
            engagement_willingness: self.state.engagement_willingness(),
        }
    }
}

/// Speaker impact. Rules run in order; a later rule overwrites an earlier one
/// on the same dimension.
pub fn speaker_impact(signals: &TurnSignals) -> StateDelta {
    let mut impact = StateDelta::default();
    if signals.stance_adoption {
        impact.set(Dimension::Trust, 0.1);
    }
    if signals.vulnerability_displayed {
        impact.set(Dimension::Trust, 0.15);
        impact.set(Dimension::Comfort, 0.1);
    }
    if signals.intensity().is_some_and(|i| i > 0.7) {
        impact.set(Dimension::Energy, 0.05);
    }
    if signals.alignment_language {
        impact.set(Dimension::Alignment, 0.1);
    }
    impact.set(Dimension::Familiarity, 0.02);
    impact
}

/// Listener perception, same last-rule-wins ordering.
pub fn listener_perception(signals: &TurnSignals) -> StateDelta {
    let mut perception = StateDelta::default();
    if signals.stance_adoption {
        perception.set(Dimension::Trust, 0.08);
    }
    if signals.contradiction {
        perception.set(Dimension::Trust, -0.2);
        perception.set(Dimension::Alignment, -0.15);
    }
    if signals.synchrony().is_some_and(|s| s > 0.6) {
        perception.set(Dimension::Comfort, 0.1);
        perception.set(Dimension::Resonance, 0.08);
    }
    perception
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{MemeticInfluence, Movement};
    use crate::patterns::PatternCategory;
    use crate::signals::{KeywordSignals, SignalExtractor};
    use crate::state::StateValues;

    fn edge() -> Interaction {
        Interaction::new("A", "B", RelationalState::new(StateValues::default()))
    }

    fn signals(event: &TurnEvent) -> TurnSignals {
        KeywordSignals.extract(event)
    }

    #[test]
    fn test_vulnerability_overrides_stance_adoption_trust() {
        let event = TurnEvent::new("A", vec!["B".into()], "I feel lost")
            .with_influence(MemeticInfluence::stance_adoption());
        let impact = speaker_impact(&signals(&event));
        assert_eq!(impact.trust, Some(0.15));
        assert_eq!(impact.comfort, Some(0.1));
        assert_eq!(impact.familiarity, Some(0.02));
        assert_eq!(impact.energy, None);
    }

    #[test]
    fn test_intensity_and_alignment() {
        let event = TurnEvent::new("A", vec![], "I agree").with_movement(Movement {
            intensity: Some(0.75),
            ..Movement::default()
        });
        let impact = speaker_impact(&signals(&event));
        assert_eq!(impact.energy, Some(0.05));
        assert_eq!(impact.alignment, Some(0.1));
        assert_eq!(impact.trust, None);
    }

    #[test]
    fn test_neutral_turn_only_builds_familiarity() {
        let impact = speaker_impact(&signals(&TurnEvent::new("A", vec![], "Hello there")));
        assert_eq!(impact, StateDelta::default().with(Dimension::Familiarity, 0.02));
    }

    #[test]
    fn test_contradiction_overrides_stance_adoption() {
        let event = TurnEvent::new("A", vec![], "I disagree")
            .with_influence(MemeticInfluence::stance_adoption());
        let perception = listener_perception(&signals(&event));
        assert_eq!(perception.trust, Some(-0.2));
        assert_eq!(perception.alignment, Some(-0.15));
    }

    #[test]
    fn test_synchrony_builds_comfort_and_resonance() {
        let event = TurnEvent::new("A", vec![], "Hello").with_movement(Movement {
            synchrony: Some(0.61),
            ..Movement::default()
        });
        let perception = listener_perception(&signals(&event));
        assert_eq!(perception.comfort, Some(0.1));
        assert_eq!(perception.resonance, Some(0.08));
        assert_eq!(perception.familiarity, None);
    }

    #[test]
    fn test_speaker_update_records_everything() {
        let mut e = edge();
        let event = TurnEvent::new("A", vec!["B".into()], "I feel uncertain about this");
        let s = signals(&event);
        e.update_from_speaker(&event, &s);

        assert!((e.state().trust() - (0.5 + 0.15 * 0.3)).abs() < 1e-9);
        assert!((e.state().comfort() - (0.5 + 0.1 * 0.3)).abs() < 1e-9);
        assert_eq!(e.shared_history().len(), 1);
        assert_eq!(e.shared_history()[0].kind, ExchangeKind::SpeakerAction);
        assert_eq!(e.patterns().entries(PatternCategory::Vulnerability).len(), 1);
    }

    #[test]
    fn test_listener_update_with_no_signals_changes_nothing() {
        let mut e = edge();
        let before = *e.state().values();
        let event = TurnEvent::new("A", vec!["B".into()], "I feel uncertain about this");
        e.update_from_listener(&event, &signals(&event));
        assert_eq!(*e.state().values(), before);
        assert_eq!(e.shared_history()[0].kind, ExchangeKind::ListenerExperience);
        assert!(e.shared_history()[0].delta.is_empty());
    }

    #[test]
    fn test_shared_history_is_bounded() {
        let mut e = edge().with_history_limit(3);
        let event = TurnEvent::new("A", vec![], "hi");
        let s = signals(&event);
        for _ in 0..5 {
            e.update_from_speaker(&event, &s);
        }
        assert_eq!(e.shared_history().len(), 3);
    }

    #[test]
    fn test_should_engage_threshold() {
        let warm = Interaction::new(
            "A",
            "B",
            RelationalState::new(StateValues {
                trust: 0.9,
                comfort: 0.9,
                alignment: 0.9,
                familiarity: 0.9,
                energy: 0.9,
                ..StateValues::default()
            }),
        );
        assert!(warm.should_engage());

        let cold = Interaction::new(
            "A",
            "B",
            RelationalState::new(StateValues {
                trust: 0.1,
                comfort: 0.1,
                alignment: 0.1,
                familiarity: 0.1,
                energy: -0.5,
                ..StateValues::default()
            }),
        );
        assert!(!cold.should_engage());
    }

    #[test]
    fn test_personalization_context_keeps_last_three() {
        let mut e = edge();
        for i in 0..5 {
            let event = TurnEvent::new("A", vec![], format!("turn {}", i));
            let s = signals(&event);
            e.update_from_speaker(&event, &s);
        }
        let ctx = e.personalization_context();
        assert_eq!(ctx.shared_memories.len(), 3);
        assert_eq!(ctx.shared_memories[0].event.text, "turn 2");
        assert_eq!(ctx.stance, e.state().stance());
        assert_eq!(ctx.trust_level, e.state().trust());
    }
}
