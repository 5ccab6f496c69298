//! Parser configuration

use crate::error::Level;
#[cfg(feature = "serialize")]
use serde::{Deserialize, Serialize};

/// Configuration for [`Parser`](crate::glr::Parser)
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serialize", serde(default))]
pub struct ParserConfig {
    /// Try to repair syntax errors instead of failing on the first one
    pub error_recovery: bool,
    /// Longest candidate continuation considered by the repair search
    pub repair_string_length: usize,
    /// Repairs allowed per parse before giving up
    pub max_repairs: usize,
    /// Candidates explored per repair search
    pub max_repair_candidates: usize,
    /// Use deterministic shift-reduce steps whenever a single state is active
    pub fast_path: bool,
    /// Derivations evaluated for an ambiguous parse; further ones are
    /// only counted
    pub max_derivations: usize,
    /// Most verbose diagnostic level that is emitted
    pub log_level: Level,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            error_recovery: true,
            repair_string_length: 4,
            max_repairs: 100,
            max_repair_candidates: 100_000,
            fast_path: true,
            max_derivations: 64,
            log_level: Level::Warning,
        }
    }
}

impl ParserConfig {
    /// Create a configuration with default settings
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable error repair
    #[must_use]
    pub const fn with_error_recovery(mut self, enabled: bool) -> Self {
        self.error_recovery = enabled;
        self
    }

    /// Set the longest repair candidate
    #[must_use]
    pub const fn with_repair_string_length(mut self, length: usize) -> Self {
        self.repair_string_length = length;
        self
    }

    /// Set the number of repairs allowed per parse
    #[must_use]
    pub const fn with_max_repairs(mut self, limit: usize) -> Self {
        self.max_repairs = limit;
        self
    }

    /// Set the candidate budget of one repair search
    #[must_use]
    pub const fn with_max_repair_candidates(mut self, limit: usize) -> Self {
        self.max_repair_candidates = limit;
        self
    }

    /// Enable or disable the deterministic fast path
    #[must_use]
    pub const fn with_fast_path(mut self, enabled: bool) -> Self {
        self.fast_path = enabled;
        self
    }

    /// Set how many derivations of an ambiguous parse are evaluated
    #[must_use]
    pub const fn with_max_derivations(mut self, limit: usize) -> Self {
        self.max_derivations = limit;
        self
    }

    /// Set the most verbose emitted diagnostic level
    #[must_use]
    pub const fn with_log_level(mut self, level: Level) -> Self {
        self.log_level = level;
        self
    }

    /// Number of real terminals buffered when a repair search starts
    #[must_use]
    pub const fn error_lookahead(&self) -> usize {
        2 * self.repair_string_length
    }

    /// True if messages at `level` should be built and emitted
    #[must_use]
    pub fn enabled(&self, level: Level) -> bool {
        level <= self.log_level
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ParserConfig::default();
        assert!(config.error_recovery);
        assert_eq!(config.repair_string_length, 4);
        assert_eq!(config.error_lookahead(), 8);
        assert!(config.fast_path);
        assert_eq!(config.max_derivations, 64);
        assert!(config.enabled(Level::Error));
        assert!(config.enabled(Level::Warning));
        assert!(!config.enabled(Level::Debug));
    }

    #[test]
    fn test_builder() {
        let config = ParserConfig::new()
            .with_error_recovery(false)
            .with_repair_string_length(2)
            .with_fast_path(false)
            .with_max_derivations(2)
            .with_log_level(Level::Trace);
        assert!(!config.error_recovery);
        assert_eq!(config.error_lookahead(), 4);
        assert!(!config.fast_path);
        assert_eq!(config.max_derivations, 2);
        assert!(config.enabled(Level::Trace));
    }
}
