//! Signal extraction: turn content → named signals.
//!
//! The state-update rules in [`crate::interaction`] and the pattern classifier
//! in [`crate::patterns`] only ever see [`TurnSignals`]. The heuristics that
//! produce them live behind [`SignalExtractor`] so a mesh can swap the rule
//! set without touching the update math.
//!
//! [`KeywordSignals`] is the literal substring/regex rule set. It does no
//! language understanding: "but" matches inside "button".

use crate::event::{Movement, TurnEvent};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

static RE_NEGATION_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(no|not|never)\b").unwrap());
static RE_NEGATION_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)no\b|not\b").unwrap());
static RE_EMOTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(feel|love|hate|wonder|hope|fear)\b").unwrap());

const VULNERABILITY_DISPLAY: &[&str] = &["I feel", "uncertain", "not sure"];

const ALIGNMENT_PHRASES: &[&str] = &[
    "agree",
    "balanced approach",
    "makes sense",
    "understand your concerns",
    "appreciate you acknowledging",
];

const RESISTANCE_PHRASES: &[&str] = &["preventing progress", "ignoring", "inconclusive"];

/// Everything the update rules need to know about one turn.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TurnSignals {
    /// Memetic influence tag is stance adoption.
    pub stance_adoption: bool,
    /// Speaker openly showed uncertainty or feeling.
    pub vulnerability_displayed: bool,
    /// Text uses agreeing language.
    pub alignment_language: bool,
    /// Text pushes back on something.
    pub contradiction: bool,
    /// Classifier verdict for the vulnerability pattern buffer.
    pub vulnerability_pattern: bool,
    /// Classifier verdict for the conflict pattern buffer.
    pub conflict_pattern: bool,
    /// Text contains an emotion word.
    pub emotional_language: bool,
    /// Space-separated word count; zero when the text is empty.
    pub word_count: usize,
    /// Movement readings, when movement was present at all.
    pub movement: Option<Movement>,
}

impl TurnSignals {
    pub fn intensity(&self) -> Option<f64> {
        self.movement.and_then(|m| m.intensity)
    }

    pub fn synchrony(&self) -> Option<f64> {
        self.movement.and_then(|m| m.synchrony)
    }

    pub fn fluidity(&self) -> Option<f64> {
        self.movement.and_then(|m| m.fluidity)
    }

    pub fn complexity(&self) -> Option<f64> {
        self.movement.and_then(|m| m.complexity)
    }

    pub fn has_text(&self) -> bool {
        self.word_count > 0
    }
}

/// Capability interface: text + movement + influence → named signals.
pub trait SignalExtractor: Send + Sync {
    fn extract(&self, event: &TurnEvent) -> TurnSignals;
}

/// Keyword and regex heuristics.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordSignals;

impl KeywordSignals {
    pub fn vulnerability_displayed(text: &str) -> bool {
        VULNERABILITY_DISPLAY.iter().any(|w| text.contains(w))
    }

    pub fn alignment_language(text: &str) -> bool {
        let lower = text.to_lowercase();
        ALIGNMENT_PHRASES.iter().any(|p| lower.contains(p))
    }

    pub fn contradiction(text: &str) -> bool {
        let lower = text.to_lowercase();
        let disagrees = lower.contains("disagree");
        let resists = RESISTANCE_PHRASES.iter().any(|p| lower.contains(p));
        let negations = RE_NEGATION_WORD.find_iter(text).count() > 1;
        let hedges = text.contains("but") || text.contains("however");
        disagrees || resists || negations || hedges
    }

    /// At least two of four vulnerability indicators.
    pub fn vulnerability_pattern(text: &str, movement: Option<&Movement>, stance_adoption: bool) -> bool {
        let indicators = [
            text.contains("I feel") || text.contains("I struggle"),
            text.contains("uncertain") || text.contains("not sure"),
            movement.and_then(|m| m.fluidity).is_some_and(|f| f > 0.8),
            stance_adoption,
        ];
        indicators.iter().filter(|hit| **hit).count() >= 2
    }

    /// At least two of three conflict indicators.
    pub fn conflict_pattern(text: &str) -> bool {
        let indicators = [
            text.contains("but") || text.contains("however"),
            text.contains("disagree") || text.contains("different"),
            RE_NEGATION_SUFFIX.find_iter(text).count() > 1,
        ];
        indicators.iter().filter(|hit| **hit).count() >= 2
    }

    pub fn emotional_language(text: &str) -> bool {
        RE_EMOTION.is_match(text)
    }

    pub fn word_count(text: &str) -> usize {
        if text.is_empty() {
            0
        } else {
            text.split(' ').count()
        }
    }
}

impl SignalExtractor for KeywordSignals {
    fn extract(&self, event: &TurnEvent) -> TurnSignals {
        let text = event.text.as_str();
        let stance_adoption = event.is_stance_adoption();
        TurnSignals {
            stance_adoption,
            vulnerability_displayed: Self::vulnerability_displayed(text),
            alignment_language: Self::alignment_language(text),
            contradiction: Self::contradiction(text),
            vulnerability_pattern: Self::vulnerability_pattern(
                text,
                event.movement.as_ref(),
                stance_adoption,
            ),
            conflict_pattern: Self::conflict_pattern(text),
            emotional_language: Self::emotional_language(text),
            word_count: Self::word_count(text),
            movement: event.movement,
        }
    }
}
