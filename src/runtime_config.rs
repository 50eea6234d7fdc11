//! # Runtime Configuration Module
//!
//! Environment-driven knobs for navigator behavior.
//!
//! ## Environment Variables
//!
//! ### `HYPERNAV_TIE_BREAK`
//!
//! How match candidates with equal scores are ordered:
//! - `discovery` (default): the order the tree walk found them (literal
//!   children before variable children at each level)
//! - `lexical`: ascending full path
//!
//! Every tied candidate is retained either way; only their order changes.
//!
//! ### `HYPERNAV_SLOW_MATCH_MICROS`
//!
//! Matching slower than this logs a warning. Default: `1000`.
//!
//! ### `HYPERNAV_STRICT_RELATIONS`
//!
//! When `true` (default) a link template whose relation cannot be resolved
//! fails the API load. When `false` the edge is dropped with a warning.
//!
//! ## Usage
//!
//! ```rust
//! use hypernav::runtime_config::RuntimeConfig;
//!
//! let config = RuntimeConfig::from_env();
//! println!("Slow match threshold: {:?}", config.slow_match);
//! ```

use std::env;
use std::time::Duration;

/// Ordering applied to equal-score match candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TieBreak {
    #[default]
    Discovery,
    Lexical,
}

impl TieBreak {
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "lexical" | "path" => TieBreak::Lexical,
            _ => TieBreak::Discovery,
        }
    }
}

/// Runtime configuration loaded from environment variables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuntimeConfig {
    pub tie_break: TieBreak,
    pub slow_match: Duration,
    pub strict_relations: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            tie_break: TieBreak::Discovery,
            slow_match: Duration::from_micros(1000),
            strict_relations: true,
        }
    }
}

impl RuntimeConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        RuntimeConfig {
            tie_break: env::var("HYPERNAV_TIE_BREAK")
                .map(|v| TieBreak::parse(&v))
                .unwrap_or(defaults.tie_break),
            slow_match: env::var("HYPERNAV_SLOW_MATCH_MICROS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_micros)
                .unwrap_or(defaults.slow_match),
            strict_relations: env::var("HYPERNAV_STRICT_RELATIONS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.strict_relations),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tie_break_parse() {
        assert_eq!(TieBreak::parse("lexical"), TieBreak::Lexical);
        assert_eq!(TieBreak::parse("PATH"), TieBreak::Lexical);
        assert_eq!(TieBreak::parse("discovery"), TieBreak::Discovery);
        assert_eq!(TieBreak::parse("anything"), TieBreak::Discovery);
    }

    #[test]
    fn test_defaults() {
        let config = RuntimeConfig::default();
        assert!(config.strict_relations);
        assert_eq!(config.slow_match, Duration::from_millis(1));
        assert_eq!(config.tie_break, TieBreak::Discovery);
    }
}
