//! # Relata Core
//!
//! The per-edge half of the relational engine:
//!
//! - [`state`]: the seven-dimensional relational state and its damped update rule
//! - [`signals`]: turn content → named signals, behind a swappable extractor
//! - [`patterns`]: classified event buffers and the style profile
//! - [`interaction`]: one directed edge binding the three together
//!
//! The mesh, analytics and turn-taking live in `relata_mesh`.

pub mod agent;
pub mod config;
pub mod error;
pub mod event;
pub mod interaction;
pub mod patterns;
pub mod signals;
pub mod state;

pub use agent::{compatibility, Agent};
pub use config::{EngineConfig, RelataConfig, SimulationConfig};
pub use error::{RelataError, Result};
pub use event::{MemeticInfluence, Movement, TurnEvent, STANCE_ADOPTION};
pub use interaction::{ExchangeKind, Interaction, PersonalizationContext, SharedRecord};
pub use patterns::{PatternCategory, PatternTracker, Role, StyleDimension, StyleProfile};
pub use signals::{KeywordSignals, SignalExtractor, TurnSignals};
pub use state::{
    Dimension, EngagementWeights, RelationalState, StateDelta, StateReport, StateValues, Stance,
    Trend,
};
