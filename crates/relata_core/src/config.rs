use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::interaction::DEFAULT_EDGE_HISTORY_LIMIT;

// ============================================================================
// Top-level config
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RelataConfig {
    pub engine: EngineConfig,
    pub simulation: SimulationConfig,
}

impl RelataConfig {
    /// Load config from a TOML file, falling back to defaults for missing fields.
    /// After loading, env var overrides are applied.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;
        let mut config: RelataConfig =
            toml::from_str(&content).with_context(|| "Failed to parse TOML config")?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Try to load from path; if the file is missing or invalid, return defaults with env overrides.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        match Self::load(path) {
            Ok(cfg) => cfg,
            Err(e) => {
                tracing::info!("Config file not found or invalid ({:#}), using defaults", e);
                let mut cfg = Self::default();
                cfg.apply_env_overrides();
                cfg
            }
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("RELATA_SEED") {
            if let Ok(n) = v.parse() {
                self.engine.seed = Some(n);
            }
        }
        if let Ok(v) = std::env::var("RELATA_MAX_HISTORY") {
            if let Ok(n) = v.parse() {
                self.engine.max_history_size = n;
            }
        }
        if let Ok(v) = std::env::var("RELATA_EDGE_HISTORY") {
            if let Ok(n) = v.parse() {
                self.engine.edge_history_limit = n;
            }
        }
    }
}

// ============================================================================
// Sub-configs
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Cap on conversation history and mesh event history.
    pub max_history_size: usize,
    /// Cap on each edge's shared history.
    pub edge_history_limit: usize,
    /// Seed for initial edge states and personalization choices.
    /// `None` draws from OS entropy.
    pub seed: Option<u64>,
    /// Turns considered by conversation metrics.
    pub recent_window: usize,
    /// Willingness above which an edge counts as an active relationship.
    pub active_willingness_threshold: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_history_size: 1000,
            edge_history_limit: DEFAULT_EDGE_HISTORY_LIMIT,
            seed: None,
            recent_window: 20,
            active_willingness_threshold: 0.3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub turns: usize,
    pub agents: Vec<String>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            turns: 24,
            agents: vec!["Alpha".to_string(), "Beta".to_string(), "Gamma".to_string()],
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let cfg = RelataConfig::default();
        assert_eq!(cfg.engine.max_history_size, 1000);
        assert_eq!(cfg.engine.recent_window, 20);
        assert!(cfg.engine.seed.is_none());
        assert_eq!(cfg.simulation.turns, 24);
        assert_eq!(cfg.simulation.agents.len(), 3);
    }

    #[test]
    fn test_parse_minimal_toml() {
        let toml_str = r#"
[engine]
seed = 42
"#;
        let cfg: RelataConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(cfg.engine.seed, Some(42));
        // Defaults for unspecified fields
        assert_eq!(cfg.engine.max_history_size, 1000);
        assert_eq!(cfg.simulation.turns, 24);
    }

    #[test]
    fn test_parse_full_toml() {
        let toml_str = r#"
[engine]
max_history_size = 200
edge_history_limit = 50
seed = 7
recent_window = 10
active_willingness_threshold = 0.4

[simulation]
turns = 12
agents = ["Founder", "Newcomer"]
"#;
        let cfg: RelataConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(cfg.engine.max_history_size, 200);
        assert_eq!(cfg.engine.edge_history_limit, 50);
        assert_eq!(cfg.engine.recent_window, 10);
        assert_eq!(cfg.engine.active_willingness_threshold, 0.4);
        assert_eq!(cfg.simulation.agents, vec!["Founder", "Newcomer"]);
    }

    #[test]
    fn test_env_overrides_and_defaults() {
        std::env::set_var("RELATA_SEED", "99");
        std::env::set_var("RELATA_MAX_HISTORY", "not a number");

        let mut cfg = RelataConfig::default();
        cfg.apply_env_overrides();
        assert_eq!(cfg.engine.seed, Some(99));
        assert_eq!(cfg.engine.max_history_size, 1000);

        std::env::remove_var("RELATA_SEED");
        std::env::remove_var("RELATA_MAX_HISTORY");

        let cfg = RelataConfig::load_or_default("/nonexistent/relata.toml");
        assert!(cfg.engine.seed.is_none());
    }
}
