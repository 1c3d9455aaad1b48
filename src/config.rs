//! Analyzer configuration: the card allow-list, cost bounds, void caps and output names.
//!
//! Every value defaults to the classic analyzer constants, so `AnalyzerConfig::default()` is
//! the configuration used when no TOML file is supplied.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// Cards recognised by the default allow-list.
pub const DEFAULT_VALID_CARDS: &[&str] = &[
    "Strike",
    "Genetic Algorithm",
    "Crush",
    "Biased Cognition",
    "All For One",
];

/// Largest number of histogram buckets a configuration may request.
pub const MAX_BUCKETS: usize = 16;

/// Bound on the magnitude of `min_cost` and `max_cost`.
pub const COST_LIMIT: i64 = 1000;

/// Largest deck ID length that still fits into a `u64` range.
pub const MAX_DECK_ID_LENGTH: usize = 18;

/// Errors produced while loading or validating a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Settings shared by every stage of the analysis pipeline.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalyzerConfig {
    /// Card names accepted by the deck reader.
    pub valid_cards: Vec<String>,
    /// Lowest accepted energy cost (inclusive).
    pub min_cost: i64,
    /// Highest accepted energy cost (inclusive).
    pub max_cost: i64,
    /// A deck with more accepted cards than this produces a void report.
    pub max_cards: usize,
    /// A deck with more rejected lines than this produces a void report.
    pub max_invalid_cards: usize,
    /// File name prefix of the generated PDF.
    pub report_prefix: String,
    /// File name of the histogram PNG.
    pub histogram_file: String,
    /// Number of digits in a generated deck ID.
    pub deck_id_length: usize,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            valid_cards: DEFAULT_VALID_CARDS.iter().map(|s| s.to_string()).collect(),
            min_cost: 0,
            max_cost: 6,
            max_cards: 1000,
            max_invalid_cards: 10,
            report_prefix: "SpireDeck".to_owned(),
            histogram_file: "energy_histogram.png".to_owned(),
            deck_id_length: 9,
        }
    }
}

impl AnalyzerConfig {
    /// Loads and validates a configuration from a TOML file.
    ///
    /// Keys missing from the file keep their default values.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Checks the cross-field constraints that serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.valid_cards.iter().all(|name| name.trim().is_empty()) {
            return Err(ConfigError::Invalid(
                "valid_cards must contain at least one card name".to_owned(),
            ));
        }
        if let Some(name) = self.valid_cards.iter().find(|name| name.contains(':')) {
            return Err(ConfigError::Invalid(format!(
                "card name '{}' must not contain ':'",
                name
            )));
        }
        if !(-COST_LIMIT..=COST_LIMIT).contains(&self.min_cost)
            || !(-COST_LIMIT..=COST_LIMIT).contains(&self.max_cost)
        {
            return Err(ConfigError::Invalid(format!(
                "min_cost and max_cost must lie within -{limit}..={limit}",
                limit = COST_LIMIT
            )));
        }
        if self.min_cost > self.max_cost {
            return Err(ConfigError::Invalid(format!(
                "min_cost ({}) must not exceed max_cost ({})",
                self.min_cost, self.max_cost
            )));
        }
        if self.bucket_count() > MAX_BUCKETS {
            return Err(ConfigError::Invalid(format!(
                "cost range {}..={} spans more than {} histogram buckets",
                self.min_cost, self.max_cost, MAX_BUCKETS
            )));
        }
        if self.deck_id_length == 0 || self.deck_id_length > MAX_DECK_ID_LENGTH {
            return Err(ConfigError::Invalid(format!(
                "deck_id_length must be between 1 and {}",
                MAX_DECK_ID_LENGTH
            )));
        }
        if self.report_prefix.trim().is_empty() || self.histogram_file.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "report_prefix and histogram_file must not be empty".to_owned(),
            ));
        }
        Ok(())
    }

    /// Returns whether `name` is on the allow-list.
    pub fn is_valid_card(&self, name: &str) -> bool {
        self.valid_cards.iter().any(|card| card == name)
    }

    /// Returns whether `cost` lies within the accepted range.
    pub fn cost_in_range(&self, cost: i64) -> bool {
        (self.min_cost..=self.max_cost).contains(&cost)
    }

    /// Number of histogram buckets, one per cost in the accepted range.
    pub fn bucket_count(&self) -> usize {
        // Saturates for absurd ranges so validation can reject them.
        usize::try_from(self.max_cost.saturating_sub(self.min_cost))
            .map(|span| span.saturating_add(1))
            .unwrap_or(usize::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_classic_constants() {
        let config = AnalyzerConfig::default();
        assert_eq!(config.valid_cards.len(), 5);
        assert!(config.is_valid_card("All For One"));
        assert!(!config.is_valid_card("strike"));
        assert_eq!(config.bucket_count(), 7);
        assert_eq!(config.max_cards, 1000);
        assert_eq!(config.max_invalid_cards, 10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config: AnalyzerConfig =
            toml::from_str("max_cards = 5\nvalid_cards = [\"Bash\"]").expect("parse config");
        assert_eq!(config.max_cards, 5);
        assert_eq!(config.valid_cards, vec!["Bash".to_string()]);
        assert_eq!(config.max_cost, 6);
        assert_eq!(config.report_prefix, "SpireDeck");
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let result: Result<AnalyzerConfig, _> = toml::from_str("max_card = 5");
        assert!(result.is_err());
    }

    #[test]
    fn validate_rejects_inverted_range() {
        let config = AnalyzerConfig {
            min_cost: 4,
            max_cost: 2,
            ..AnalyzerConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn validate_rejects_wide_range_and_empty_allow_list() {
        let wide = AnalyzerConfig {
            min_cost: i64::MIN,
            max_cost: i64::MAX,
            ..AnalyzerConfig::default()
        };
        assert!(wide.validate().is_err());

        let empty = AnalyzerConfig {
            valid_cards: vec!["  ".to_owned()],
            ..AnalyzerConfig::default()
        };
        assert!(empty.validate().is_err());
    }

    #[test]
    fn validate_rejects_costs_near_integer_limits() {
        let high = AnalyzerConfig {
            min_cost: i64::MAX - 6,
            max_cost: i64::MAX,
            ..AnalyzerConfig::default()
        };
        assert!(matches!(high.validate(), Err(ConfigError::Invalid(_))));

        let low = AnalyzerConfig {
            min_cost: -COST_LIMIT - 1,
            max_cost: -COST_LIMIT + 5,
            ..AnalyzerConfig::default()
        };
        assert!(low.validate().is_err());

        let edge = AnalyzerConfig {
            min_cost: COST_LIMIT - 6,
            max_cost: COST_LIMIT,
            ..AnalyzerConfig::default()
        };
        assert!(edge.validate().is_ok());
    }

    #[test]
    fn load_reports_missing_file() {
        let err = AnalyzerConfig::load("/__spire_deck_missing__/config.toml")
            .expect_err("missing file should fail");
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
