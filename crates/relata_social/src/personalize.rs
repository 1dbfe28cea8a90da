//! Per-listener personalization of a base response.
//!
//! Text and movement are adapted from the listener-facing edge's stance,
//! trust and comfort as they stood before the turn was applied.

use crate::generator::GeneratedContent;
use rand::Rng;
use regex::Regex;
use relata_core::{Movement, PersonalizationContext, Stance, StyleDimension};
use serde::Serialize;
use std::sync::LazyLock;

static RE_I: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\bI\b").unwrap());
static RE_MY: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\bmy\b").unwrap());
static RE_ME: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\bme\b").unwrap());

const GUARDED_SWAPS: &[(&str, &str)] = &[
    ("I feel", "I am considering"),
    ("I believe", "It seems"),
    ("definitely", "possibly"),
];

/// Edge context for one listener, captured before the turn is applied.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListenerContext {
    pub target: String,
    pub context: PersonalizationContext,
    pub should_engage: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonalizedMovement {
    #[serde(flatten)]
    pub movement: Movement,
    pub interaction_stance: Stance,
    pub trust_level: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonalizedResponse {
    pub target: String,
    pub text: String,
    pub movement: PersonalizedMovement,
    pub disclosure_level: f64,
    pub strategic_intent: StyleDimension,
    pub engagement_willingness: f64,
}

pub fn make_guarded(text: &str) -> String {
    GUARDED_SWAPS
        .iter()
        .fold(text.to_string(), |acc, (from, to)| acc.replace(from, to))
}

pub fn make_collaborative(text: &str) -> String {
    let text = RE_I.replace_all(text, "We");
    let text = RE_MY.replace_all(&text, "our");
    RE_ME.replace_all(&text, "us").into_owned()
}

pub fn make_personal<R: Rng + ?Sized>(text: &str, target: &str, rng: &mut R) -> String {
    let suffix = match rng.gen_range(0..4) {
        0 => format!("- what are your thoughts, {}?", target),
        1 => format!(", {}.", target),
        2 => format!("... your perspective, {}?", target),
        _ => format!(", as we discussed, {}.", target),
    };
    format!("{} {}", text, suffix)
}

pub fn adapt_text<R: Rng + ?Sized>(text: &str, listener: &ListenerContext, rng: &mut R) -> String {
    let ctx = &listener.context;
    match ctx.stance {
        Stance::Defensive if ctx.trust_level < 0.3 => make_guarded(text),
        Stance::Intimate if ctx.trust_level > 0.8 => make_personal(text, &listener.target, rng),
        Stance::Collaborative if ctx.comfort_level > 0.6 => make_collaborative(text),
        _ => text.to_string(),
    }
}

pub fn adapt_movement(movement: Option<Movement>, ctx: &PersonalizationContext) -> PersonalizedMovement {
    let mut adapted = movement.unwrap_or_default();
    match ctx.stance {
        Stance::Defensive => {
            adapted.amplitude = adapted.amplitude.map(|a| a * 0.7);
            adapted.fluidity = adapted.fluidity.map(|f| f * 0.8);
        }
        Stance::Intimate => {
            adapted.amplitude = adapted.amplitude.map(|a| a * 1.1);
            adapted.synchrony = Some(ctx.trust_level);
        }
        Stance::Cautious | Stance::Collaborative => {}
    }
    PersonalizedMovement {
        movement: adapted,
        interaction_stance: ctx.stance,
        trust_level: ctx.trust_level,
    }
}

pub fn personalize<R: Rng + ?Sized>(
    base: &GeneratedContent,
    listener: &ListenerContext,
    rng: &mut R,
) -> PersonalizedResponse {
    PersonalizedResponse {
        target: listener.target.clone(),
        text: adapt_text(&base.text, listener, rng),
        movement: adapt_movement(base.movement, &listener.context),
        disclosure_level: listener.context.trust_level,
        strategic_intent: listener.context.interaction_style,
        engagement_willingness: listener.context.engagement_willingness,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn listener(stance: Stance, trust: f64, comfort: f64) -> ListenerContext {
        ListenerContext {
            target: "Beta".into(),
            context: PersonalizationContext {
                stance,
                trust_level: trust,
                comfort_level: comfort,
                shared_memories: Vec::new(),
                interaction_style: StyleDimension::Directness,
                engagement_willingness: 0.6,
            },
            should_engage: true,
        }
    }

    #[test]
    fn test_guarded_rewrites() {
        assert_eq!(
            make_guarded("I feel this is definitely right and I believe it"),
            "I am considering this is possibly right and It seems it"
        );
    }

    #[test]
    fn test_collaborative_rewrites_whole_words_only() {
        assert_eq!(make_collaborative("I think my idea helps me"), "We think our idea helps us");
        // Letters inside words are left alone.
        assert_eq!(make_collaborative("Imagine my memes"), "Imagine our memes");
    }

    #[test]
    fn test_personal_suffix_names_target() {
        let mut rng = StdRng::seed_from_u64(1);
        let out = make_personal("Good point", "Beta", &mut rng);
        assert!(out.starts_with("Good point "));
        assert!(out.contains("Beta"));
    }

    #[test]
    fn test_text_adaptation_by_stance() {
        let mut rng = StdRng::seed_from_u64(2);
        let text = "I feel my view matters";
        assert_eq!(
            adapt_text(text, &listener(Stance::Defensive, 0.2, 0.5), &mut rng),
            "I am considering my view matters"
        );
        assert_eq!(
            adapt_text(text, &listener(Stance::Collaborative, 0.7, 0.7), &mut rng),
            "We feel our view matters"
        );
        // Defensive because of comfort, trust not low enough to guard.
        assert_eq!(adapt_text(text, &listener(Stance::Defensive, 0.5, 0.2), &mut rng), text);
        assert_eq!(adapt_text(text, &listener(Stance::Cautious, 0.5, 0.5), &mut rng), text);
        assert!(adapt_text(text, &listener(Stance::Intimate, 0.9, 0.9), &mut rng).contains("Beta"));
    }

    #[test]
    fn test_movement_adaptation() {
        let base = Some(Movement {
            amplitude: Some(1.0),
            fluidity: Some(0.5),
            synchrony: Some(0.1),
            ..Movement::default()
        });
        let defensive = adapt_movement(base, &listener(Stance::Defensive, 0.2, 0.2).context);
        assert!((defensive.movement.amplitude.unwrap() - 0.7).abs() < 1e-12);
        assert!((defensive.movement.fluidity.unwrap() - 0.4).abs() < 1e-12);
        assert_eq!(defensive.interaction_stance, Stance::Defensive);

        let intimate = adapt_movement(base, &listener(Stance::Intimate, 0.9, 0.9).context);
        assert!((intimate.movement.amplitude.unwrap() - 1.1).abs() < 1e-12);
        assert_eq!(intimate.movement.synchrony, Some(0.9));
        assert_eq!(intimate.trust_level, 0.9);

        let json = serde_json::to_value(&intimate).unwrap();
        assert_eq!(json["interactionStance"], "intimate");
        assert_eq!(json["synchrony"], 0.9);
    }

    #[test]
    fn test_personalize_fills_response() {
        let mut rng = StdRng::seed_from_u64(3);
        let base = GeneratedContent::text("Hello");
        let r = personalize(&base, &listener(Stance::Cautious, 0.45, 0.5), &mut rng);
        assert_eq!(r.target, "Beta");
        assert_eq!(r.text, "Hello");
        assert_eq!(r.disclosure_level, 0.45);
        assert_eq!(r.engagement_willingness, 0.6);
        assert_eq!(r.strategic_intent, StyleDimension::Directness);
    }
}
