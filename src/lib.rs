//! Energy cost analysis for Slay the Spire deck listings.
//!
//! A listing is read and validated ([`deck`]), summarised ([`stats`]), drawn as a histogram
//! ([`chart`]) and written out as a PDF report ([`report`]). [`pipeline::run`] ties the steps
//! together.

pub mod builder;
pub mod chart;
pub mod config;
pub mod deck;
pub mod deck_id;
pub mod elements;
pub mod fonts;
pub mod model;
pub mod pipeline;
pub mod report;
pub mod richtext;
pub mod stats;

pub use config::AnalyzerConfig;
pub use deck::{parse_deck, read_deck, DeckReading};
pub use deck_id::{DeckId, DeckIdSource, RandomDeckId, SequentialDeckId};
pub use pipeline::{run, RunOptions, RunOutcome};
pub use stats::{total_energy_cost, DeckSummary, EnergyHistogram};
