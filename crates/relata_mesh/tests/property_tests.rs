//! Property-based tests for relata_mesh.
//!
//! Completeness: N agents always carry exactly N×(N−1) edges, whatever mix of
//! joins and departures produced them.

use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use relata_core::TurnEvent;
use relata_mesh::{speaking_recommendations, RelationalMesh};

#[derive(Debug, Clone)]
enum Op {
    Add(u8),
    Remove(u8),
    Turn(u8, &'static str),
}

fn arb_op() -> impl Strategy<Value = Op> {
    let texts = prop::sample::select(vec![
        "I feel uncertain about this",
        "I disagree, but fine",
        "That makes sense",
        "no, not now, never",
        "",
    ]);
    prop_oneof![
        (0u8..8).prop_map(Op::Add),
        (0u8..8).prop_map(Op::Remove),
        ((0u8..8), texts).prop_map(|(s, t)| Op::Turn(s, t)),
    ]
}

fn name(i: u8) -> String {
    format!("agent-{}", i)
}

fn assert_complete(mesh: &RelationalMesh) -> Result<(), TestCaseError> {
    let n = mesh.agent_count();
    prop_assert_eq!(mesh.edge_count(), n * n.saturating_sub(1));
    for id in mesh.agent_ids() {
        prop_assert_eq!(mesh.agent_interactions(id).unwrap().len(), n - 1);
        prop_assert!(mesh.interaction(id, id).is_err());
    }
    Ok(())
}

proptest! {
    /// **Core invariant**: the graph stays complete across joins, departures
    /// and turns, and rejected operations change nothing.
    #[test]
    fn graph_stays_complete(
        seed in any::<u64>(),
        initial in 0u8..5,
        ops in proptest::collection::vec(arb_op(), 0..40),
    ) {
        let mut mesh = RelationalMesh::new(StdRng::seed_from_u64(seed));
        mesh.initialize((0..initial).map(name)).unwrap();
        assert_complete(&mesh)?;

        for op in ops {
            match op {
                Op::Add(i) => {
                    let existed = mesh.contains(&name(i));
                    let before = mesh.agent_count();
                    let result = mesh.add_agent(name(i));
                    prop_assert_eq!(result.is_err(), existed);
                    if let Ok(created) = result {
                        prop_assert_eq!(created, 2 * before);
                    }
                }
                Op::Remove(i) => {
                    let existed = mesh.contains(&name(i));
                    let before = mesh.agent_count();
                    let result = mesh.remove_agent(&name(i));
                    prop_assert_eq!(result.is_ok(), existed);
                    if let Ok(removed) = result {
                        prop_assert_eq!(removed, 2 * (before - 1));
                    }
                }
                Op::Turn(s, text) => {
                    let listeners: Vec<String> = mesh.agent_ids().map(str::to_string).collect();
                    let event = TurnEvent::new(name(s), listeners, text);
                    let result = mesh.update_from_interaction(&event);
                    prop_assert_eq!(result.is_ok(), mesh.contains(&name(s)));
                }
            }
            assert_complete(&mesh)?;
        }
    }

    /// Aggregates stay inside the ranges of the values they summarize.
    #[test]
    fn dynamics_in_range(
        seed in any::<u64>(),
        n in 2u8..6,
        speakers in proptest::collection::vec(0u8..6, 0..30),
    ) {
        let mut mesh = RelationalMesh::new(StdRng::seed_from_u64(seed));
        mesh.initialize((0..n).map(name)).unwrap();
        let ids: Vec<String> = mesh.agent_ids().map(str::to_string).collect();
        for s in speakers {
            let speaker = name(s % n);
            let event = TurnEvent::new(speaker, ids.clone(), "I feel we disagree, but I agree");
            let d = mesh.update_from_interaction(&event).unwrap();
            prop_assert!((0.0..=1.0).contains(&d.network_cohesion));
            prop_assert!(d.trust_distribution.min <= d.trust_distribution.mean + 1e-12);
            prop_assert!(d.trust_distribution.mean <= d.trust_distribution.max + 1e-12);
            prop_assert!(d.trust_distribution.variance >= 0.0);
            prop_assert!((-1.0..=1.0).contains(&d.social_energy));
            prop_assert!(d.conflict_level >= 0.0);
        }
    }

    /// Recommendations cover every agent once and come out best first.
    #[test]
    fn recommendations_sorted(seed in any::<u64>(), n in 1u8..7) {
        let mut mesh = RelationalMesh::new(StdRng::seed_from_u64(seed));
        mesh.initialize((0..n).map(name)).unwrap();
        let recs = speaking_recommendations::<&str>(&mesh, &[]);
        prop_assert_eq!(recs.len(), n as usize);
        for pair in recs.windows(2) {
            prop_assert!(pair[0].score >= pair[1].score);
        }
        for r in &recs {
            prop_assert!((0.0..=1.0 + 1e-12).contains(&r.score));
        }
    }
}
