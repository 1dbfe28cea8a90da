//! Turn events as submitted to the mesh.
//!
//! The content-generation collaborator produces the text, movement and
//! memetic-influence fields; everything else it returns stays outside the
//! core.

use serde::{Deserialize, Serialize};

/// Influence tag value that marks one agent adopting another's stance.
pub const STANCE_ADOPTION: &str = "stance_adoption";

/// Expressive movement signals accompanying an utterance. All optional.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Movement {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intensity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub synchrony: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fluidity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub complexity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amplitude: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemeticInfluence {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

impl MemeticInfluence {
    pub fn stance_adoption() -> Self {
        Self {
            kind: Some(STANCE_ADOPTION.to_string()),
        }
    }

    pub fn is_stance_adoption(&self) -> bool {
        self.kind.as_deref() == Some(STANCE_ADOPTION)
    }
}

/// One spoken turn: who spoke, who heard it, and what was expressed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnEvent {
    pub speaker: String,
    pub listeners: Vec<String>,
    #[serde(default)]
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub movement: Option<Movement>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memetic_influence: Option<MemeticInfluence>,
}

impl TurnEvent {
    pub fn new(speaker: impl Into<String>, listeners: Vec<String>, text: impl Into<String>) -> Self {
        Self {
            speaker: speaker.into(),
            listeners,
            text: text.into(),
            movement: None,
            memetic_influence: None,
        }
    }

    pub fn with_movement(mut self, movement: Movement) -> Self {
        self.movement = Some(movement);
        self
    }

    pub fn with_influence(mut self, influence: MemeticInfluence) -> Self {
        self.memetic_influence = Some(influence);
        self
    }

    pub fn is_stance_adoption(&self) -> bool {
        self.memetic_influence
            .as_ref()
            .is_some_and(MemeticInfluence::is_stance_adoption)
    }
}
