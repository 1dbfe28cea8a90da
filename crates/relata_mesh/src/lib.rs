//! # Relata Mesh
//!
//! Network-level view over `relata_core` edges: the complete directed graph,
//! rolling engagement analytics, next-speaker scoring and the flat snapshot
//! shape used for export and restore.

pub mod analytics;
pub mod mesh;
pub mod snapshot;
pub mod turn_taking;

pub use analytics::{AnalyticsSummary, EngagementTrend, SocialAnalytics, TurnSample};
pub use mesh::{AgentSlot, RelationalMesh, SocialDynamics, TrustDistribution};
pub use snapshot::{EdgeRecord, InteractionTable, MeshSnapshot};
pub use turn_taking::{speaking_recommendations, SpeakingRecommendation, BALANCE_WINDOW};
