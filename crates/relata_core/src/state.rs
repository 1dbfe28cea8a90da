//! Relational State: the seven-dimensional state of one directed edge.
//!
//! Every change goes through [`RelationalState::update`], which damps the
//! requested delta by a fixed inertia and clamps the result into the
//! dimension's range:
//!
//! - `trust, comfort, alignment, familiarity, resonance, stability` ∈ [0, 1]
//! - `energy` ∈ [-1, 1]
//!
//! Stance, engagement willingness, energy cost and trend are all derived
//! on read; nothing derived is stored.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Fraction of a requested delta that is *resisted* on each update.
pub const INERTIA: f64 = 0.7;

/// Number of pre-update snapshots retained for trend detection.
pub const STATE_HISTORY_LIMIT: usize = 100;

/// Minimum change on one dimension to count as a rise or fall.
const TREND_EPSILON: f64 = 0.05;

/// Default look-back for [`RelationalState::trend`].
pub const DEFAULT_TREND_DEPTH: usize = 10;

/// Guard against NaN and Infinity reaching the state.
#[inline]
fn sanitize_f64(v: f64, fallback: f64) -> f64 {
    if v.is_finite() {
        v
    } else {
        tracing::warn!("non-finite relational value, keeping {}", fallback);
        fallback
    }
}

// =============================================================================
// Dimensions and deltas
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Trust,
    Comfort,
    Alignment,
    Familiarity,
    Energy,
    Resonance,
    Stability,
}

impl Dimension {
    pub const ALL: [Dimension; 7] = [
        Dimension::Trust,
        Dimension::Comfort,
        Dimension::Alignment,
        Dimension::Familiarity,
        Dimension::Energy,
        Dimension::Resonance,
        Dimension::Stability,
    ];

    /// Dimensions compared by trend detection (stability is excluded).
    pub const TRENDED: [Dimension; 6] = [
        Dimension::Trust,
        Dimension::Comfort,
        Dimension::Alignment,
        Dimension::Familiarity,
        Dimension::Energy,
        Dimension::Resonance,
    ];

    /// Closed clamp range for this dimension.
    pub fn range(self) -> (f64, f64) {
        match self {
            Dimension::Energy => (-1.0, 1.0),
            Dimension::Trust
            | Dimension::Comfort
            | Dimension::Alignment
            | Dimension::Familiarity
            | Dimension::Resonance
            | Dimension::Stability => (0.0, 1.0),
        }
    }

    pub fn clamp(self, value: f64) -> f64 {
        let (min, max) = self.range();
        value.clamp(min, max)
    }

    pub fn name(self) -> &'static str {
        match self {
            Dimension::Trust => "trust",
            Dimension::Comfort => "comfort",
            Dimension::Alignment => "alignment",
            Dimension::Familiarity => "familiarity",
            Dimension::Energy => "energy",
            Dimension::Resonance => "resonance",
            Dimension::Stability => "stability",
        }
    }
}

/// Requested change to a relational state, one optional field per dimension.
///
/// A `None` field leaves the dimension untouched. Setting a field twice keeps
/// the last value, which is how the interaction rules express "later rule
/// wins".
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StateDelta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trust: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comfort: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alignment: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub familiarity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub energy: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resonance: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stability: Option<f64>,
}

impl StateDelta {
    pub fn get(&self, dim: Dimension) -> Option<f64> {
        match dim {
            Dimension::Trust => self.trust,
            Dimension::Comfort => self.comfort,
            Dimension::Alignment => self.alignment,
            Dimension::Familiarity => self.familiarity,
            Dimension::Energy => self.energy,
            Dimension::Resonance => self.resonance,
            Dimension::Stability => self.stability,
        }
    }

    pub fn set(&mut self, dim: Dimension, value: f64) {
        let slot = match dim {
            Dimension::Trust => &mut self.trust,
            Dimension::Comfort => &mut self.comfort,
            Dimension::Alignment => &mut self.alignment,
            Dimension::Familiarity => &mut self.familiarity,
            Dimension::Energy => &mut self.energy,
            Dimension::Resonance => &mut self.resonance,
            Dimension::Stability => &mut self.stability,
        };
        *slot = Some(value);
    }

    /// Builder form of [`StateDelta::set`].
    pub fn with(mut self, dim: Dimension, value: f64) -> Self {
        self.set(dim, value);
        self
    }

    /// Present `(dimension, delta)` pairs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (Dimension, f64)> + '_ {
        Dimension::ALL
            .iter()
            .filter_map(move |&dim| self.get(dim).map(|v| (dim, v)))
    }

    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }
}

// =============================================================================
// Values, weights, derived labels
// =============================================================================

/// Raw values of the seven dimensions. Missing fields parse as the defaults.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StateValues {
    pub trust: f64,
    pub comfort: f64,
    pub alignment: f64,
    pub familiarity: f64,
    pub energy: f64,
    pub resonance: f64,
    pub stability: f64,
}

impl Default for StateValues {
    fn default() -> Self {
        Self {
            trust: 0.5,
            comfort: 0.5,
            alignment: 0.5,
            familiarity: 0.5,
            energy: 0.0,
            resonance: 0.5,
            stability: 0.5,
        }
    }
}

impl StateValues {
    /// Every dimension drawn uniformly from `[0, 1)`.
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self {
            trust: rng.gen(),
            comfort: rng.gen(),
            alignment: rng.gen(),
            familiarity: rng.gen(),
            energy: rng.gen(),
            resonance: rng.gen(),
            stability: rng.gen(),
        }
    }

    pub fn get(&self, dim: Dimension) -> f64 {
        match dim {
            Dimension::Trust => self.trust,
            Dimension::Comfort => self.comfort,
            Dimension::Alignment => self.alignment,
            Dimension::Familiarity => self.familiarity,
            Dimension::Energy => self.energy,
            Dimension::Resonance => self.resonance,
            Dimension::Stability => self.stability,
        }
    }

    fn slot(&mut self, dim: Dimension) -> &mut f64 {
        match dim {
            Dimension::Trust => &mut self.trust,
            Dimension::Comfort => &mut self.comfort,
            Dimension::Alignment => &mut self.alignment,
            Dimension::Familiarity => &mut self.familiarity,
            Dimension::Energy => &mut self.energy,
            Dimension::Resonance => &mut self.resonance,
            Dimension::Stability => &mut self.stability,
        }
    }

    /// Sanitize and clamp every dimension into its range.
    pub fn normalized(mut self) -> Self {
        for dim in Dimension::ALL {
            let slot = self.slot(dim);
            *slot = dim.clamp(sanitize_f64(*slot, 0.0));
        }
        self
    }
}

/// Weights of the engagement-willingness score. Fixed; never learned.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EngagementWeights {
    pub trust: f64,
    pub comfort: f64,
    pub energy: f64,
    pub alignment: f64,
    pub familiarity: f64,
}

impl Default for EngagementWeights {
    fn default() -> Self {
        Self {
            trust: 0.30,
            comfort: 0.25,
            energy: 0.20,
            alignment: 0.15,
            familiarity: 0.10,
        }
    }
}

/// Qualitative label derived from trust and comfort together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stance {
    Defensive,
    Cautious,
    Collaborative,
    Intimate,
}

impl Stance {
    pub fn as_str(self) -> &'static str {
        match self {
            Stance::Defensive => "defensive",
            Stance::Cautious => "cautious",
            Stance::Collaborative => "collaborative",
            Stance::Intimate => "intimate",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Improving,
    Stable,
    Deteriorating,
}

/// One pre-update entry in the state history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Unix timestamp in milliseconds
    pub timestamp: i64,
    pub state: StateValues,
    pub delta: StateDelta,
}

/// Values plus every derived reading, as exported in snapshots.
///
/// Parsing reads only the values; the readings are recomputed from them, so
/// a record carrying just the seven dimensions is accepted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "StateValues")]
pub struct StateReport {
    #[serde(flatten)]
    pub values: StateValues,
    pub stance: Stance,
    pub willingness: f64,
    pub energy_cost: f64,
    pub trend: Trend,
}

impl From<StateValues> for StateReport {
    fn from(values: StateValues) -> Self {
        RelationalState::new(values).report()
    }
}

// =============================================================================
// RelationalState
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelationalState {
    values: StateValues,
    weights: EngagementWeights,
    history: VecDeque<HistoryEntry>,
    /// Unix timestamp (ms) of the last update
    last_update: i64,
}

impl Default for RelationalState {
    fn default() -> Self {
        Self::new(StateValues::default())
    }
}

impl RelationalState {
    pub fn new(values: StateValues) -> Self {
        Self {
            values: values.normalized(),
            weights: EngagementWeights::default(),
            history: VecDeque::with_capacity(STATE_HISTORY_LIMIT),
            last_update: chrono::Utc::now().timestamp_millis(),
        }
    }

    /// Fresh state with every dimension drawn from the given random source.
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::new(StateValues::random(rng))
    }

    pub fn values(&self) -> &StateValues {
        &self.values
    }

    pub fn get(&self, dim: Dimension) -> f64 {
        self.values.get(dim)
    }

    pub fn trust(&self) -> f64 {
        self.values.trust
    }

    pub fn comfort(&self) -> f64 {
        self.values.comfort
    }

    pub fn energy(&self) -> f64 {
        self.values.energy
    }

    pub fn weights(&self) -> &EngagementWeights {
        &self.weights
    }

    pub fn history(&self) -> &VecDeque<HistoryEntry> {
        &self.history
    }

    pub fn last_update(&self) -> i64 {
        self.last_update
    }

    /// Apply an inertia-damped delta.
    ///
    /// Records the pre-update values in history, then for each dimension named
    /// in `delta` sets `value = clamp(value + delta * (1 - INERTIA))`.
    pub fn update(&mut self, delta: &StateDelta) -> StateReport {
        let now = chrono::Utc::now().timestamp_millis();
        if self.history.len() >= STATE_HISTORY_LIMIT {
            self.history.pop_front();
        }
        self.history.push_back(HistoryEntry {
            timestamp: now,
            state: self.values,
            delta: *delta,
        });

        for (dim, requested) in delta.iter() {
            if !requested.is_finite() {
                tracing::warn!("ignoring non-finite {} delta: {}", dim.name(), requested);
                continue;
            }
            let slot = self.values.slot(dim);
            *slot = dim.clamp(*slot + requested * (1.0 - INERTIA));
        }

        self.last_update = now;
        self.report()
    }

    /// Overwrite values directly (snapshot restore). History is left alone.
    pub fn restore(&mut self, values: StateValues) {
        self.values = values.normalized();
        self.last_update = chrono::Utc::now().timestamp_millis();
    }

    /// Lowest threshold first: a low value on either axis forces the lower stance.
    pub fn stance(&self) -> Stance {
        let StateValues { trust, comfort, .. } = self.values;
        if trust < 0.3 || comfort < 0.3 {
            Stance::Defensive
        } else if trust < 0.6 || comfort < 0.6 {
            Stance::Cautious
        } else if trust < 0.8 || comfort < 0.8 {
            Stance::Collaborative
        } else {
            Stance::Intimate
        }
    }

    /// Weighted readiness to interact along this edge. Negative energy counts as zero.
    pub fn engagement_willingness(&self) -> f64 {
        let v = &self.values;
        let w = &self.weights;
        v.trust * w.trust
            + v.comfort * w.comfort
            + v.energy.max(0.0) * w.energy
            + v.alignment * w.alignment
            + v.familiarity * w.familiarity
    }

    pub fn interaction_energy_cost(&self) -> f64 {
        let v = &self.values;
        let energy_penalty = if v.energy < 0.0 { v.energy.abs() * 0.3 } else { 0.0 };
        0.3 + (1.0 - v.trust) * 0.4 + (1.0 - v.comfort) * 0.3 + energy_penalty
    }

    /// Trend against the oldest of the last `depth` history entries.
    ///
    /// `depth == 0` compares against the oldest entry still retained.
    pub fn trend(&self, depth: usize) -> Trend {
        if self.history.is_empty() {
            return Trend::Stable;
        }
        let start = if depth == 0 {
            0
        } else {
            self.history.len().saturating_sub(depth)
        };
        let previous = &self.history[start].state;

        let mut improvements = 0usize;
        let mut declines = 0usize;
        for dim in Dimension::TRENDED {
            let now = self.values.get(dim);
            let before = previous.get(dim);
            if now > before + TREND_EPSILON {
                improvements += 1;
            } else if now < before - TREND_EPSILON {
                declines += 1;
            }
        }

        if improvements > declines * 2 {
            Trend::Improving
        } else if declines > improvements * 2 {
            Trend::Deteriorating
        } else {
            Trend::Stable
        }
    }

    pub fn report(&self) -> StateReport {
        StateReport {
            values: self.values,
            stance: self.stance(),
            willingness: self.engagement_willingness(),
            energy_cost: self.interaction_energy_cost(),
            trend: self.trend(DEFAULT_TREND_DEPTH),
        }
    }
}
