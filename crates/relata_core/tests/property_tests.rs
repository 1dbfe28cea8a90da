//! Property-based tests for relata_core.
//!
//! Range invariants must hold for every reachable state, whatever sequence of
//! deltas or turns produced it.

use proptest::prelude::*;
use relata_core::{
    Dimension, Interaction, KeywordSignals, MemeticInfluence, Movement, RelationalState,
    SignalExtractor, StateDelta, StateValues, Stance, TurnEvent,
};

// ============================================================================
// Strategies
// ============================================================================

fn arb_values() -> impl Strategy<Value = StateValues> {
    (
        0.0f64..=1.0,
        0.0f64..=1.0,
        0.0f64..=1.0,
        0.0f64..=1.0,
        -1.0f64..=1.0,
        0.0f64..=1.0,
        0.0f64..=1.0,
    )
        .prop_map(
            |(trust, comfort, alignment, familiarity, energy, resonance, stability)| StateValues {
                trust,
                comfort,
                alignment,
                familiarity,
                energy,
                resonance,
                stability,
            },
        )
}

fn arb_delta() -> impl Strategy<Value = StateDelta> {
    proptest::collection::vec((0usize..7, -5.0f64..5.0), 0..7).prop_map(|pairs| {
        pairs
            .into_iter()
            .fold(StateDelta::default(), |d, (i, v)| d.with(Dimension::ALL[i], v))
    })
}

fn arb_event() -> impl Strategy<Value = TurnEvent> {
    let phrases = prop::sample::select(vec![
        "I feel uncertain about this",
        "I disagree, but not never",
        "That makes sense, I agree",
        "We keep ignoring the data",
        "Hello there",
        "",
    ]);
    (
        phrases,
        proptest::option::of((0.0f64..=1.0, 0.0f64..=1.0, 0.0f64..=1.0, 0.0f64..=1.0)),
        any::<bool>(),
    )
        .prop_map(|(text, movement, adopt)| {
            let mut event = TurnEvent::new("A", vec!["B".into()], text);
            if let Some((intensity, synchrony, fluidity, complexity)) = movement {
                event = event.with_movement(Movement {
                    intensity: Some(intensity),
                    synchrony: Some(synchrony),
                    fluidity: Some(fluidity),
                    complexity: Some(complexity),
                    amplitude: None,
                });
            }
            if adopt {
                event = event.with_influence(MemeticInfluence::stance_adoption());
            }
            event
        })
}

fn assert_in_range(v: &StateValues) -> Result<(), TestCaseError> {
    for dim in Dimension::ALL {
        let (min, max) = dim.range();
        let x = v.get(dim);
        prop_assert!(x.is_finite(), "{} not finite", dim.name());
        prop_assert!(x >= min && x <= max, "{} out of range: {}", dim.name(), x);
    }
    Ok(())
}

// ============================================================================
// Relational state
// ============================================================================

proptest! {
    /// **Core invariant**: no sequence of deltas moves any dimension out of range.
    #[test]
    fn updates_never_leave_range(
        values in arb_values(),
        deltas in proptest::collection::vec(arb_delta(), 0..60),
    ) {
        let mut state = RelationalState::new(values);
        for delta in &deltas {
            let report = state.update(delta);
            assert_in_range(&report.values)?;
        }
        assert_in_range(state.values())?;
    }

    /// A full positive trust delta moves trust by exactly 30%, capped at 1.
    #[test]
    fn single_trust_update_is_thirty_percent(values in arb_values()) {
        let mut state = RelationalState::new(values);
        let t = state.trust();
        state.update(&StateDelta::default().with(Dimension::Trust, 1.0));
        prop_assert!((state.trust() - (t + 0.3).min(1.0)).abs() < 1e-12);
    }

    /// Low trust or low comfort always forces the defensive stance.
    #[test]
    fn low_axis_forces_defensive(values in arb_values(), low in 0.0f64..0.3) {
        let state = RelationalState::new(StateValues { comfort: low, ..values });
        prop_assert_eq!(state.stance(), Stance::Defensive);
        let state = RelationalState::new(StateValues { trust: low, ..values });
        prop_assert_eq!(state.stance(), Stance::Defensive);
    }

    /// Willingness is a convex combination bounded by the weight sum.
    #[test]
    fn willingness_bounded(values in arb_values()) {
        let w = RelationalState::new(values).engagement_willingness();
        prop_assert!((0.0..=1.0 + 1e-12).contains(&w), "willingness {}", w);
    }

    /// Energy cost never drops below its base.
    #[test]
    fn energy_cost_at_least_base(values in arb_values()) {
        let cost = RelationalState::new(values).interaction_energy_cost();
        prop_assert!(cost >= 0.3 - 1e-12 && cost <= 1.3 + 1e-12, "cost {}", cost);
    }
}

// ============================================================================
// Interaction edges
// ============================================================================

proptest! {
    /// Any turn sequence on both sides of an edge keeps the state valid.
    #[test]
    fn turns_keep_edge_state_valid(
        values in arb_values(),
        events in proptest::collection::vec(arb_event(), 0..40),
    ) {
        let mut forward = Interaction::new("A", "B", RelationalState::new(values));
        let mut reverse = Interaction::new("B", "A", RelationalState::new(values));
        for event in &events {
            let signals = KeywordSignals.extract(event);
            forward.update_from_speaker(event, &signals);
            reverse.update_from_listener(event, &signals);
        }
        assert_in_range(forward.state().values())?;
        assert_in_range(reverse.state().values())?;

        let style = forward.patterns().style();
        for v in [style.directness, style.emotionality, style.formality, style.creativity] {
            prop_assert!((0.0..=1.0).contains(&v), "style out of range: {}", v);
        }
        prop_assert_eq!(forward.shared_history().len(), events.len());
    }
}
