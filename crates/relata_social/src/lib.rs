//! # Relata Social
//!
//! The caller-facing layer over the relational mesh. A turn flows through
//! [`SocialEngine::process_turn`]: the external [`ContentGenerator`] writes the
//! base response, each willing listener gets a personalized variant, and the
//! mesh absorbs the turn.

pub mod engine;
pub mod generator;
pub mod personalize;
pub mod report;

pub use engine::{
    ConversationEntry, NetworkData, NetworkLink, NetworkNode, SharedEngine, SocialEngine,
    TurnOutcome,
};
pub use generator::{ContentGenerator, GeneratedContent, ScriptedGenerator};
pub use personalize::{ListenerContext, PersonalizedMovement, PersonalizedResponse};
pub use report::{
    ActivityEntry, AgentInteractionView, ConversationMetrics, Diagnostics, DynamicsReport,
    InteractionView, Snapshot,
};
