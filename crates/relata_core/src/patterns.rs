//! Pattern/Style Tracker: per-edge classified event logs and a slowly
//! adapting style profile.

use crate::event::TurnEvent;
use crate::signals::TurnSignals;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};

/// Maximum entries per pattern category.
pub const PATTERN_BUFFER_LIMIT: usize = 50;

/// Default window for [`PatternTracker::pattern_frequency`] (5 minutes).
pub const DEFAULT_PATTERN_WINDOW_MS: i64 = 300_000;

/// Exponential smoothing weight for style updates.
const STYLE_SMOOTHING: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatternCategory {
    Vulnerability,
    Conflict,
    Alignment,
    Creativity,
    Repetition,
    Escalation,
    Resolution,
}

impl PatternCategory {
    pub const ALL: [PatternCategory; 7] = [
        PatternCategory::Vulnerability,
        PatternCategory::Conflict,
        PatternCategory::Alignment,
        PatternCategory::Creativity,
        PatternCategory::Repetition,
        PatternCategory::Escalation,
        PatternCategory::Resolution,
    ];

    fn index(self) -> usize {
        self as usize
    }
}

/// Which side of the edge the event was recorded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Speaker,
    Listener,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatternEntry {
    pub event: TurnEvent,
    pub role: Role,
    /// Unix timestamp in milliseconds
    pub timestamp: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StyleDimension {
    Directness,
    Emotionality,
    Formality,
    Creativity,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StyleProfile {
    pub directness: f64,
    pub emotionality: f64,
    pub formality: f64,
    pub creativity: f64,
}

impl Default for StyleProfile {
    fn default() -> Self {
        Self {
            directness: 0.5,
            emotionality: 0.5,
            formality: 0.5,
            creativity: 0.5,
        }
    }
}

impl StyleProfile {
    /// Dimension with the highest value; the first one wins ties.
    pub fn dominant(&self) -> StyleDimension {
        let ranked = [
            (StyleDimension::Directness, self.directness),
            (StyleDimension::Emotionality, self.emotionality),
            (StyleDimension::Formality, self.formality),
            (StyleDimension::Creativity, self.creativity),
        ];
        let mut best = ranked[0];
        for candidate in &ranked[1..] {
            if candidate.1 > best.1 {
                best = *candidate;
            }
        }
        best.0
    }
}

fn moving_average(current: f64, target: f64) -> f64 {
    current * (1.0 - STYLE_SMOOTHING) + target * STYLE_SMOOTHING
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PatternTracker {
    buffers: [VecDeque<PatternEntry>; 7],
    style: StyleProfile,
}

impl PatternTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn style(&self) -> &StyleProfile {
        &self.style
    }

    pub fn entries(&self, category: PatternCategory) -> &VecDeque<PatternEntry> {
        &self.buffers[category.index()]
    }

    /// Classify a speaker action and adapt the style profile.
    pub fn record_speaker_action(&mut self, event: &TurnEvent, signals: &TurnSignals) {
        self.classify(event, signals, Role::Speaker);
        self.update_style(signals);
    }

    pub fn record_listener_experience(&mut self, event: &TurnEvent, signals: &TurnSignals) {
        self.classify(event, signals, Role::Listener);
    }

    fn classify(&mut self, event: &TurnEvent, signals: &TurnSignals, role: Role) {
        let now = chrono::Utc::now().timestamp_millis();
        let detected = [
            (PatternCategory::Vulnerability, signals.vulnerability_pattern),
            (PatternCategory::Conflict, signals.conflict_pattern),
        ];
        for (category, hit) in detected {
            if hit {
                self.push(category, event.clone(), role, now);
            }
        }
    }

    /// Append to a category buffer, dropping the oldest entry past the cap.
    pub fn push(&mut self, category: PatternCategory, event: TurnEvent, role: Role, timestamp: i64) {
        let buffer = &mut self.buffers[category.index()];
        if buffer.len() >= PATTERN_BUFFER_LIMIT {
            buffer.pop_front();
        }
        buffer.push_back(PatternEntry {
            event,
            role,
            timestamp,
        });
    }

    fn update_style(&mut self, signals: &TurnSignals) {
        if signals.has_text() {
            let directness = if signals.word_count < 10 { 0.8 } else { 0.3 };
            self.style.directness = moving_average(self.style.directness, directness);
            let emotionality = if signals.emotional_language { 0.7 } else { 0.3 };
            self.style.emotionality = moving_average(self.style.emotionality, emotionality);
        }
        if let Some(movement) = signals.movement {
            match movement.complexity {
                Some(c) if !c.is_finite() => {
                    tracing::warn!("ignoring non-finite movement complexity: {}", c);
                }
                complexity => {
                    let target = complexity.unwrap_or(0.5).clamp(0.0, 1.0);
                    self.style.creativity = moving_average(self.style.creativity, target);
                }
            }
        }
    }

    pub fn dominant_style(&self) -> StyleDimension {
        self.style.dominant()
    }

    pub fn pattern_frequency(&self, category: PatternCategory, window_ms: i64) -> usize {
        self.pattern_frequency_at(category, window_ms, chrono::Utc::now().timestamp_millis())
    }

    /// Entries of `category` recorded strictly less than `window_ms` before `now_ms`.
    pub fn pattern_frequency_at(&self, category: PatternCategory, window_ms: i64, now_ms: i64) -> usize {
        self.entries(category)
            .iter()
            .filter(|e| now_ms - e.timestamp < window_ms)
            .count()
    }

    /// Buffer size per category, as exported in snapshots.
    pub fn counts(&self) -> BTreeMap<PatternCategory, usize> {
        PatternCategory::ALL
            .iter()
            .map(|&c| (c, self.entries(c).len()))
            .collect()
    }
}
