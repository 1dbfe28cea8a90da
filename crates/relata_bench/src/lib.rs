//! relata_bench: trajectory simulation tests for relational dynamics.
//!
//! Validates emergent behavior over long simulated conversations:
//! - Warm conversations pull the network together
//! - Sustained contradiction erodes the listener's trust in the speaker
//! - Range invariants survive a thousand random turns
//! - Seeded runs replay exactly

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use relata_core::{MemeticInfluence, Result, TurnEvent};
use relata_mesh::RelationalMesh;

/// Lines used when a trajectory picks turns at random.
pub const MIXED_LINES: &[&str] = &[
    "I feel uncertain about this",
    "That makes sense, I agree",
    "I disagree, but not never",
    "We keep ignoring the data",
    "However, the results are inconclusive",
    "I love where this is going",
    "Let us try a balanced approach",
    "",
];

/// Mesh over `ids` seeded with `seed`.
pub fn seeded_mesh(ids: &[&str], seed: u64) -> Result<RelationalMesh> {
    let mut mesh = RelationalMesh::new(StdRng::seed_from_u64(seed));
    mesh.initialize(ids.iter().copied())?;
    Ok(mesh)
}

fn everyone_but(mesh: &RelationalMesh, speaker: &str) -> Vec<String> {
    mesh.agent_ids()
        .filter(|id| *id != speaker)
        .map(str::to_string)
        .collect()
}

/// Run `turns` turns where `script(i)` names the speaker and builds the
/// event text. Every other agent listens.
pub fn simulate<F>(mesh: &mut RelationalMesh, turns: usize, mut script: F) -> Result<()>
where
    F: FnMut(usize) -> (String, String, Option<MemeticInfluence>),
{
    for i in 0..turns {
        let (speaker, text, influence) = script(i);
        let listeners = everyone_but(mesh, &speaker);
        let mut event = TurnEvent::new(speaker, listeners, text);
        if let Some(influence) = influence {
            event = event.with_influence(influence);
        }
        mesh.update_from_interaction(&event)?;
    }
    Ok(())
}

/// Random speakers and lines drawn from `rng`.
pub fn simulate_random(mesh: &mut RelationalMesh, turns: usize, rng: &mut StdRng) -> Result<()> {
    let ids: Vec<String> = mesh.agent_ids().map(str::to_string).collect();
    simulate(mesh, turns, |_| {
        let speaker = ids.choose(&mut *rng).cloned().unwrap_or_default();
        let text = MIXED_LINES.choose(&mut *rng).copied().unwrap_or_default();
        (speaker, text.to_string(), None)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use relata_core::{Dimension, Stance, StateValues, Trend};

    const TRIO: &[&str] = &["Alpha", "Beta", "Gamma"];

    type Line = (String, String, Option<MemeticInfluence>);

    fn round_robin(
        ids: &'static [&'static str],
        text: &'static str,
        adopt: bool,
    ) -> impl FnMut(usize) -> Line {
        move |i| {
            let influence = adopt.then(MemeticInfluence::stance_adoption);
            (ids[i % ids.len()].to_string(), text.to_string(), influence)
        }
    }

    fn set_all(mesh: &mut RelationalMesh, values: StateValues) {
        let pairs: Vec<(String, String)> = mesh
            .interactions()
            .map(|e| (e.source().to_string(), e.target().to_string()))
            .collect();
        for (s, t) in pairs {
            mesh.restore_edge(&s, &t, values).unwrap();
        }
    }

    /// Warm, stance-adopting turns raise trust on both sides of every edge.
    #[test]
    fn test_warm_conversation_raises_cohesion() {
        let mut mesh = seeded_mesh(TRIO, 1).unwrap();
        set_all(&mut mesh, StateValues { trust: 0.3, comfort: 0.4, ..StateValues::default() });
        let before = mesh.social_dynamics().network_cohesion;

        simulate(&mut mesh, 30, round_robin(TRIO, "I feel we are close, I agree", true)).unwrap();

        let after = mesh.social_dynamics();
        assert!(
            after.network_cohesion > before + 0.3,
            "Cohesion should climb: {} -> {}",
            before,
            after.network_cohesion
        );
        assert!(
            after.conflict_level < 1e-9,
            "No conflict expected, got {}",
            after.conflict_level
        );
    }

    /// Repeated contradiction from one speaker drives listeners defensive.
    #[test]
    fn test_contradiction_erodes_reverse_trust() {
        let mut mesh = seeded_mesh(TRIO, 2).unwrap();
        set_all(&mut mesh, StateValues { trust: 0.8, comfort: 0.8, ..StateValues::default() });

        simulate(&mut mesh, 20, round_robin(&["Alpha"], "I disagree, but go ahead", false)).unwrap();

        for listener in ["Beta", "Gamma"] {
            let edge = mesh.interaction(listener, "Alpha").unwrap();
            assert!(
                edge.state().trust() < 0.05,
                "{} -> Alpha trust should collapse, got {}",
                listener,
                edge.state().trust()
            );
            assert_eq!(edge.state().stance(), Stance::Defensive);
            assert!(!edge.should_engage());
        }
        // Edges between the two listeners never saw a turn.
        let untouched = mesh.interaction("Beta", "Gamma").unwrap();
        assert_eq!(untouched.state().trust(), 0.8);
        assert!(untouched.shared_history().is_empty());
    }

    /// 1000 random turns keep every dimension of every edge in range.
    #[test]
    fn test_thousand_random_turns_stay_in_range() {
        let ids = ["A", "B", "C", "D", "E"];
        let mut mesh = seeded_mesh(&ids, 3).unwrap();
        let mut rng = StdRng::seed_from_u64(30);
        simulate_random(&mut mesh, 1000, &mut rng).unwrap();

        for edge in mesh.interactions() {
            for dim in Dimension::ALL {
                let (min, max) = dim.range();
                let v = edge.state().get(dim);
                assert!(v >= min && v <= max, "{} out of range: {}", dim.name(), v);
            }
            assert!(edge.state().history().len() <= 100);
            for category in relata_core::PatternCategory::ALL {
                assert!(edge.patterns().entries(category).len() <= 50);
            }
        }
        assert_eq!(mesh.history().len(), 1000);
    }

    /// Same seeds, same conversation, same mesh.
    #[test]
    fn test_seeded_runs_are_reproducible() {
        let run = || {
            let mut mesh = seeded_mesh(TRIO, 4).unwrap();
            let mut rng = StdRng::seed_from_u64(40);
            simulate_random(&mut mesh, 200, &mut rng).unwrap();
            mesh.interactions()
                .map(|e| *e.state().values())
                .collect::<Vec<_>>()
        };
        assert_eq!(run(), run());
    }

    /// Steady vulnerable disclosure reads as an improving trend.
    #[test]
    fn test_disclosure_trend_is_improving() {
        let mut mesh = seeded_mesh(&["Founder", "Newcomer"], 5).unwrap();
        let low = StateValues {
            trust: 0.2,
            comfort: 0.2,
            familiarity: 0.2,
            ..StateValues::default()
        };
        set_all(&mut mesh, low);

        let script = round_robin(&["Founder"], "I feel unsure, I struggle with it", false);
        simulate(&mut mesh, 10, script).unwrap();

        let edge = mesh.interaction("Founder", "Newcomer").unwrap();
        assert_eq!(edge.state().trend(10), Trend::Improving);
        assert!(edge.state().trust() > 0.6);
    }
}
