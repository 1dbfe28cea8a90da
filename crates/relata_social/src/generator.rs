//! Content generation boundary.
//!
//! The engine never produces text itself. A [`ContentGenerator`] turns the
//! speaker's input into the base response every listener receives before
//! personalization.

use async_trait::async_trait;
use relata_core::{Agent, MemeticInfluence, Movement, TurnEvent};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Base response for one turn.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedContent {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub movement: Option<Movement>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memetic_influence: Option<MemeticInfluence>,
    /// Generator-specific payload, carried through untouched.
    #[serde(default)]
    pub extra: serde_json::Value,
}

impl GeneratedContent {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    /// The event submitted to the mesh for this content.
    pub fn to_event(&self, speaker: &str, listeners: Vec<String>) -> TurnEvent {
        TurnEvent {
            speaker: speaker.to_string(),
            listeners,
            text: self.text.clone(),
            movement: self.movement,
            memetic_influence: self.memetic_influence.clone(),
        }
    }
}

#[async_trait]
pub trait ContentGenerator: Send + Sync {
    async fn generate(
        &self,
        speaker: &Agent,
        input: &str,
        audience_size: usize,
        context: &serde_json::Value,
    ) -> anyhow::Result<GeneratedContent>;
}

/// Deterministic generator cycling through a fixed phrase list.
///
/// With no phrases it echoes the input.
#[derive(Debug, Default)]
pub struct ScriptedGenerator {
    phrases: Vec<String>,
    movement: Option<Movement>,
    influence: Option<MemeticInfluence>,
    cursor: AtomicUsize,
}

impl ScriptedGenerator {
    pub fn new<I, S>(phrases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            phrases: phrases.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn echo() -> Self {
        Self::default()
    }

    pub fn with_movement(mut self, movement: Movement) -> Self {
        self.movement = Some(movement);
        self
    }

    pub fn with_influence(mut self, influence: MemeticInfluence) -> Self {
        self.influence = Some(influence);
        self
    }

    pub fn calls(&self) -> usize {
        self.cursor.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ContentGenerator for ScriptedGenerator {
    async fn generate(
        &self,
        speaker: &Agent,
        input: &str,
        _audience_size: usize,
        _context: &serde_json::Value,
    ) -> anyhow::Result<GeneratedContent> {
        let n = self.cursor.fetch_add(1, Ordering::SeqCst);
        let text = if self.phrases.is_empty() {
            input.to_string()
        } else {
            self.phrases[n % self.phrases.len()].clone()
        };
        Ok(GeneratedContent {
            text,
            movement: self.movement,
            memetic_influence: self.influence.clone(),
            extra: serde_json::json!({ "speaker": speaker.display_name(), "line": n }),
        })
    }
}
