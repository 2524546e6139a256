//! Engine configuration that downstream crates can serialize/deserialize.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Sort buffers above this many records spill to sorted on-disk runs.
    /// `None` keeps every sort fully in memory.
    pub sort_spill_threshold: Option<usize>,

    /// Directory for sort spill segments.
    pub spill_dir: String,

    /// When set, an absent sort/reduce/join key field is a `MissingKey`
    /// error instead of reading as null.
    pub strict_missing_keys: bool,

    /// When set, null join keys match each other (strict equality) instead
    /// of the default SQL behavior where null matches nothing.
    pub match_null_join_keys: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sort_spill_threshold: None,
            spill_dir: "/tmp/rowgraph-spill".to_string(),
            strict_missing_keys: false,
            match_null_join_keys: false,
        }
    }
}

impl EngineConfig {
    /// Create a config from environment variables, falling back to defaults.
    ///
    /// Environment variables:
    /// - `ROWGRAPH_SORT_SPILL_THRESHOLD`: records per in-memory sort run
    /// - `ROWGRAPH_SPILL_DIR`: spill segment directory
    /// - `ROWGRAPH_STRICT_MISSING_KEYS`: `1`/`true` to enable strict keys
    /// - `ROWGRAPH_MATCH_NULL_JOIN_KEYS`: `1`/`true` to let null keys match
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(s) = std::env::var("ROWGRAPH_SORT_SPILL_THRESHOLD") {
            if let Ok(v) = s.parse::<usize>() {
                cfg.sort_spill_threshold = Some(v);
            }
        }

        if let Ok(s) = std::env::var("ROWGRAPH_SPILL_DIR") {
            cfg.spill_dir = s;
        }

        if let Ok(s) = std::env::var("ROWGRAPH_STRICT_MISSING_KEYS") {
            cfg.strict_missing_keys = parse_flag(&s);
        }

        if let Ok(s) = std::env::var("ROWGRAPH_MATCH_NULL_JOIN_KEYS") {
            cfg.match_null_join_keys = parse_flag(&s);
        }

        cfg
    }
}

fn parse_flag(s: &str) -> bool {
    matches!(s.trim(), "1" | "true" | "TRUE" | "yes")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_keep_sorts_in_memory() {
        let cfg = EngineConfig::default();
        assert!(cfg.sort_spill_threshold.is_none());
        assert!(!cfg.strict_missing_keys);
        assert!(!cfg.match_null_join_keys);
    }

    #[test]
    fn flag_parsing() {
        assert!(parse_flag("1"));
        assert!(parse_flag("true"));
        assert!(!parse_flag("0"));
        assert!(!parse_flag("off"));
    }
}
