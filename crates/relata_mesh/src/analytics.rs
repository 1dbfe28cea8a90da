//! Social Analytics: rolling turn-level engagement statistics.

use crate::mesh::SocialDynamics;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

const WINDOW_LIMIT: usize = 100;
const RECENT_TURNS: usize = 20;
const TREND_SPAN: usize = 10;
const TREND_THRESHOLD: f64 = 0.1;
/// Engagement assumed for a turn with no personalized responses.
const NEUTRAL_ENGAGEMENT: f64 = 0.5;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnSample {
    /// Unix timestamp in milliseconds
    pub timestamp: i64,
    pub engagement: f64,
    pub personalization_count: usize,
    pub dynamics: SocialDynamics,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngagementTrend {
    Improving,
    Stable,
    Declining,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsSummary {
    pub average_engagement: f64,
    pub recent_engagement: f64,
    pub personalization_rate: f64,
    pub turn_count: usize,
    pub trend: EngagementTrend,
}

#[derive(Debug, Clone, Default)]
pub struct SocialAnalytics {
    window: VecDeque<TurnSample>,
    total_engagement: f64,
    total_personalization: usize,
    turn_count: usize,
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, n) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    (n > 0).then(|| sum / n as f64)
}

impl SocialAnalytics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one turn given the willingness of each personalized response.
    pub fn record_turn(&mut self, willingness: &[f64], dynamics: SocialDynamics) -> f64 {
        let engagement = mean(willingness.iter().copied()).unwrap_or(NEUTRAL_ENGAGEMENT);
        self.record_sample(TurnSample {
            timestamp: chrono::Utc::now().timestamp_millis(),
            engagement,
            personalization_count: willingness.len(),
            dynamics,
        });
        engagement
    }

    pub fn record_sample(&mut self, sample: TurnSample) {
        self.total_engagement += sample.engagement;
        self.total_personalization += sample.personalization_count;
        self.turn_count += 1;
        if self.window.len() >= WINDOW_LIMIT {
            self.window.pop_front();
        }
        self.window.push_back(sample);
    }

    pub fn window(&self) -> &VecDeque<TurnSample> {
        &self.window
    }

    pub fn turn_count(&self) -> usize {
        self.turn_count
    }

    pub fn average_engagement(&self) -> f64 {
        if self.turn_count == 0 {
            0.0
        } else {
            self.total_engagement / self.turn_count as f64
        }
    }

    /// Personalized responses per turn, lifetime.
    pub fn personalization_rate(&self) -> f64 {
        if self.turn_count == 0 {
            0.0
        } else {
            self.total_personalization as f64 / self.turn_count as f64
        }
    }

    fn tail(&self, skip_from_end: usize, take: usize) -> impl Iterator<Item = f64> + '_ {
        let end = self.window.len().saturating_sub(skip_from_end);
        let start = end.saturating_sub(take);
        self.window.range(start..end).map(|s| s.engagement)
    }

    /// Last 10 samples against the (up to) 10 before them.
    pub fn trend(&self) -> EngagementTrend {
        if self.window.len() < TREND_SPAN {
            return EngagementTrend::Stable;
        }
        let (Some(recent), Some(older)) = (
            mean(self.tail(0, TREND_SPAN)),
            mean(self.tail(TREND_SPAN, TREND_SPAN)),
        ) else {
            return EngagementTrend::Stable;
        };
        if recent > older + TREND_THRESHOLD {
            EngagementTrend::Improving
        } else if recent < older - TREND_THRESHOLD {
            EngagementTrend::Declining
        } else {
            EngagementTrend::Stable
        }
    }

    pub fn summary(&self) -> AnalyticsSummary {
        AnalyticsSummary {
            average_engagement: self.average_engagement(),
            recent_engagement: mean(self.tail(0, RECENT_TURNS)).unwrap_or(0.0),
            personalization_rate: self.personalization_rate(),
            turn_count: self.turn_count,
            trend: self.trend(),
        }
    }
}
