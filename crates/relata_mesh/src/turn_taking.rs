//! Turn-taking: who should speak next.

use crate::mesh::RelationalMesh;
use serde::{Deserialize, Serialize};

/// How many recorded speakers the balance term looks back over.
pub const BALANCE_WINDOW: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeakingRecommendation {
    pub agent_id: String,
    pub score: f64,
    pub engagement_score: f64,
    pub social_need: f64,
    pub conversation_balance: f64,
    pub recommended: bool,
}

fn mean_willingness(mesh: &RelationalMesh, id: &str) -> Option<f64> {
    let edges = mesh.agent_interactions(id).ok()?;
    if edges.is_empty() {
        return None;
    }
    let total: f64 = edges.iter().map(|e| e.state().engagement_willingness()).sum();
    Some(total / edges.len() as f64)
}

/// Mean outgoing willingness; an agent with no edges scores 1.
pub fn engagement_score(mesh: &RelationalMesh, id: &str) -> f64 {
    mean_willingness(mesh, id).unwrap_or(1.0)
}

pub fn social_need(mesh: &RelationalMesh, id: &str) -> f64 {
    mean_willingness(mesh, id).map_or(1.0, |w| 1.0 - w)
}

/// `recent` is the tail of speaker ids already cut to the balance window.
pub fn conversation_balance<S: AsRef<str>>(id: &str, recent: &[S]) -> f64 {
    if recent.is_empty() {
        return 1.0;
    }
    let own = recent.iter().filter(|s| s.as_ref() == id).count();
    1.0 - own as f64 / recent.len() as f64
}

/// Score every agent in the mesh, best first. Ties keep insertion order.
///
/// `recent_speakers` is the full speaker log, oldest first; only the last
/// [`BALANCE_WINDOW`] entries are consulted.
pub fn speaking_recommendations<S: AsRef<str>>(
    mesh: &RelationalMesh,
    recent_speakers: &[S],
) -> Vec<SpeakingRecommendation> {
    let tail = &recent_speakers[recent_speakers.len().saturating_sub(BALANCE_WINDOW)..];

    let mut recommendations: Vec<SpeakingRecommendation> = mesh
        .agent_ids()
        .map(|id| {
            let engagement = engagement_score(mesh, id);
            let need = social_need(mesh, id);
            let balance = conversation_balance(id, tail);
            SpeakingRecommendation {
                agent_id: id.to_string(),
                score: engagement * 0.4 + need * 0.4 + balance * 0.2,
                engagement_score: engagement,
                social_need: need,
                conversation_balance: balance,
                // Rarely true: need is 1 − engagement, so both hold only when
                // engagement > 0.6 and engagement < 0.5 at once.
                recommended: engagement > 0.6 && need > 0.5,
            }
        })
        .collect();

    recommendations.sort_by(|a, b| b.score.total_cmp(&a.score));
    tracing::debug!(
        "Speaking recommendations: {}",
        recommendations
            .iter()
            .map(|r| format!("{}={:.3}", r.agent_id, r.score))
            .collect::<Vec<_>>()
            .join(", ")
    );
    recommendations
}
