//! Deck listing reader.
//!
//! A listing holds one `<card name>:<energy cost>` entry per line. Lines that do not follow
//! that shape, name a card outside the allow-list, or carry a cost outside the configured range
//! are kept verbatim in the invalid list instead of aborting the read.

use std::fmt;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

use log::debug;
use thiserror::Error;

use crate::config::AnalyzerConfig;

/// Failure to read a deck listing at all.
#[derive(Debug, Error)]
pub enum DeckError {
    #[error("failed to open deck file {path}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to read line {line} of deck file {path}")]
    Read {
        path: PathBuf,
        line: usize,
        #[source]
        source: io::Error,
    },
}

/// Why a single line was rejected.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RejectReason {
    /// The line has no `:` separator.
    MissingSeparator,
    /// The line has more than one `:` separator.
    ExtraSeparator,
    /// The card name is blank.
    EmptyName,
    /// The card name is not on the allow-list.
    UnknownCard(String),
    /// The cost is not an integer.
    InvalidCost(String),
    /// The cost is an integer outside the accepted range.
    CostOutOfRange(i64),
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingSeparator => write!(f, "missing ':' separator"),
            Self::ExtraSeparator => write!(f, "more than one ':' separator"),
            Self::EmptyName => write!(f, "card name is empty"),
            Self::UnknownCard(name) => write!(f, "unknown card '{}'", name),
            Self::InvalidCost(raw) => write!(f, "cost '{}' is not an integer", raw),
            Self::CostOutOfRange(cost) => write!(f, "cost {} is out of range", cost),
        }
    }
}

/// A card accepted by the reader.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CardEntry {
    pub name: String,
    pub cost: i64,
}

/// A line rejected by the reader, kept exactly as it appeared in the listing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InvalidEntry {
    /// One-based line number in the listing.
    pub line_number: usize,
    pub raw: String,
    pub reason: RejectReason,
}

/// Outcome of reading a whole listing.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DeckReading {
    cards: Vec<CardEntry>,
    invalid: Vec<InvalidEntry>,
}

impl DeckReading {
    /// Accepted cards in listing order.
    pub fn cards(&self) -> &[CardEntry] {
        &self.cards
    }

    /// Rejected lines in listing order.
    pub fn invalid(&self) -> &[InvalidEntry] {
        &self.invalid
    }

    /// Energy costs of the accepted cards in listing order.
    pub fn energy_costs(&self) -> Vec<i64> {
        self.cards.iter().map(|card| card.cost).collect()
    }

    /// Raw text of the rejected lines in listing order.
    pub fn invalid_lines(&self) -> Vec<String> {
        self.invalid.iter().map(|entry| entry.raw.clone()).collect()
    }

    fn push_line(&mut self, line_number: usize, raw: &str, config: &AnalyzerConfig) {
        match parse_entry(raw, config) {
            Ok(card) => self.cards.push(card),
            Err(reason) => {
                debug!("rejected line {} ({}): {:?}", line_number, reason, raw);
                self.invalid.push(InvalidEntry {
                    line_number,
                    raw: raw.to_owned(),
                    reason,
                });
            }
        }
    }
}

/// Validates a single `<name>:<cost>` line against the configuration.
pub fn parse_entry(line: &str, config: &AnalyzerConfig) -> Result<CardEntry, RejectReason> {
    let mut parts = line.split(':');
    let name = parts.next().unwrap_or_default().trim();
    let cost_raw = parts.next().ok_or(RejectReason::MissingSeparator)?.trim();
    if parts.next().is_some() {
        return Err(RejectReason::ExtraSeparator);
    }

    let cost: i64 = cost_raw
        .parse()
        .map_err(|_| RejectReason::InvalidCost(cost_raw.to_owned()))?;
    if !config.cost_in_range(cost) {
        return Err(RejectReason::CostOutOfRange(cost));
    }
    if name.is_empty() {
        return Err(RejectReason::EmptyName);
    }
    if !config.is_valid_card(name) {
        return Err(RejectReason::UnknownCard(name.to_owned()));
    }

    Ok(CardEntry {
        name: name.to_owned(),
        cost,
    })
}

/// Reads every line of `reader`, splitting them into accepted cards and rejected lines.
pub fn read_entries<R: BufRead>(
    reader: R,
    config: &AnalyzerConfig,
) -> Result<DeckReading, (usize, io::Error)> {
    let mut reading = DeckReading::default();
    for (idx, line) in reader.lines().enumerate() {
        let line = line.map_err(|err| (idx + 1, err))?;
        reading.push_line(idx + 1, &line, config);
    }
    Ok(reading)
}

/// Parses an in-memory listing.
pub fn parse_deck(text: &str, config: &AnalyzerConfig) -> DeckReading {
    let mut reading = DeckReading::default();
    for (idx, line) in text.lines().enumerate() {
        reading.push_line(idx + 1, line, config);
    }
    reading
}

/// Opens and reads the listing at `path`.
pub fn read_deck(path: impl AsRef<Path>, config: &AnalyzerConfig) -> Result<DeckReading, DeckError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| DeckError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let reading =
        read_entries(BufReader::new(file), config).map_err(|(line, source)| DeckError::Read {
            path: path.to_path_buf(),
            line,
            source,
        })?;
    debug!(
        "read {} accepted and {} rejected entries from {}",
        reading.cards.len(),
        reading.invalid.len(),
        path.display()
    );
    Ok(reading)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> AnalyzerConfig {
        AnalyzerConfig::default()
    }

    #[test]
    fn accepts_allow_listed_cards_with_costs_in_range() {
        for name in crate::config::DEFAULT_VALID_CARDS {
            for cost in 0..=6 {
                let line = format!("{}:{}", name, cost);
                let entry = parse_entry(&line, &config()).expect("line should be valid");
                assert_eq!(entry.cost, cost);
                assert_eq!(entry.name, *name);
            }
        }
    }

    #[test]
    fn trims_whitespace_around_fields() {
        let entry = parse_entry("  Biased Cognition :  2 ", &config()).expect("valid line");
        assert_eq!(entry.name, "Biased Cognition");
        assert_eq!(entry.cost, 2);
    }

    #[test]
    fn rejects_malformed_lines_with_reason() {
        let cases = [
            ("Strike 1", RejectReason::MissingSeparator),
            ("", RejectReason::MissingSeparator),
            ("Strike:1:2", RejectReason::ExtraSeparator),
            (":3", RejectReason::EmptyName),
            ("Foo:2", RejectReason::UnknownCard("Foo".to_owned())),
            ("Strike:one", RejectReason::InvalidCost("one".to_owned())),
            ("Strike:", RejectReason::InvalidCost(String::new())),
            ("Strike:9", RejectReason::CostOutOfRange(9)),
            ("Crush:-1", RejectReason::CostOutOfRange(-1)),
        ];
        for (line, expected) in cases {
            assert_eq!(parse_entry(line, &config()), Err(expected), "line {:?}", line);
        }
    }

    #[test]
    fn explicit_plus_sign_is_accepted() {
        assert_eq!(parse_entry("Crush:+3", &config()).map(|e| e.cost), Ok(3));
    }

    #[test]
    fn card_names_are_case_sensitive() {
        assert!(matches!(
            parse_entry("strike:1", &config()),
            Err(RejectReason::UnknownCard(_))
        ));
    }

    #[test]
    fn parse_deck_splits_accepted_and_rejected() {
        let reading = parse_deck("Strike:1\nCrush:3\nFoo:2\nStrike:9\n", &config());
        assert_eq!(reading.energy_costs(), vec![1, 3]);
        assert_eq!(reading.invalid_lines(), vec!["Foo:2", "Strike:9"]);
        assert_eq!(reading.invalid()[0].line_number, 3);
        assert_eq!(reading.invalid()[1].line_number, 4);
    }

    #[test]
    fn invalid_lines_are_kept_verbatim() {
        let reading = parse_deck("  Foo : 2  ", &config());
        assert_eq!(reading.invalid_lines(), vec!["  Foo : 2  "]);
    }

    #[test]
    fn custom_allow_list_and_range_apply() {
        let config = AnalyzerConfig {
            valid_cards: vec!["Bash".to_owned()],
            min_cost: 1,
            max_cost: 2,
            ..AnalyzerConfig::default()
        };
        let reading = parse_deck("Bash:2\nBash:0\nStrike:1", &config);
        assert_eq!(reading.energy_costs(), vec![2]);
        assert_eq!(reading.invalid().len(), 2);
    }

    #[test]
    fn read_deck_reports_missing_file() {
        let err = read_deck("/__spire_deck_missing__/deck.txt", &config())
            .expect_err("missing file should fail");
        assert!(matches!(err, DeckError::Open { .. }));
    }
}
