use serde::{Deserialize, Serialize};

/// How long transposition cache entries live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheScope {
    /// Kept across decisions until the engine is reset.
    Game,
    /// Cleared at the start of every decision.
    Move,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    // Search Parameters
    pub shallow_depth: u32, // while fewer than half of our pieces are placed
    pub deep_depth: u32,
    pub use_cache: bool,
    pub cache_scope: CacheScope,

    // Evaluation Parameters
    pub line_weight: i32,
    pub threat_weight: i32,

    pub seed: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            shallow_depth: 3,
            deep_depth: 4,
            use_cache: true,
            cache_scope: CacheScope::Game,

            line_weight: 10,
            threat_weight: 50,

            seed: None,
        }
    }
}

impl EngineConfig {
    /// Uses `depth` for every stage of the game.
    #[must_use]
    pub fn with_fixed_depth(mut self, depth: u32) -> Self {
        self.shallow_depth = depth;
        self.deep_depth = depth;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let config: EngineConfig = serde_json::from_str(r#"{ "deep_depth": 2, "cache_scope": "move" }"#).unwrap();
        assert_eq!(config.shallow_depth, 3);
        assert_eq!(config.deep_depth, 2);
        assert_eq!(config.cache_scope, CacheScope::Move);
        assert_eq!(config.threat_weight, 50);
        assert!(config.use_cache);
    }
}
