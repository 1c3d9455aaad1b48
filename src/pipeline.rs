//! The end-to-end run: read the deck, aggregate, render the histogram and write the report.
//!
//! Non-fatal failures (histogram or report) are carried in the returned [`RunOutcome`] so the
//! caller decides how to present them; only an unreadable deck stops the run with an error.

use std::path::{Path, PathBuf};

use log::{info, warn};

use crate::chart::{render_histogram, save_png, ChartError, ChartOptions};
use crate::config::{AnalyzerConfig, ConfigError};
use crate::deck::{read_deck, DeckError, DeckReading};
use crate::deck_id::{DeckId, DeckIdSource};
use crate::report::{ReportError, ReportRequest};
use crate::stats::DeckSummary;

/// Errors that stop a run before any artifact is produced.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Deck(#[from] DeckError),
}

/// Where a run reads its input and writes its artifacts.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub deck_path: PathBuf,
    pub output_dir: PathBuf,
    pub fonts_dir: Option<PathBuf>,
    pub chart: ChartOptions,
}

impl RunOptions {
    /// Reads `deck_path` and writes into the working directory.
    pub fn new(deck_path: impl Into<PathBuf>) -> Self {
        Self {
            deck_path: deck_path.into(),
            output_dir: PathBuf::from("."),
            fonts_dir: None,
            chart: ChartOptions::default(),
        }
    }

    pub fn with_output_dir(mut self, output_dir: impl Into<PathBuf>) -> Self {
        self.output_dir = output_dir.into();
        self
    }

    pub fn with_fonts_dir(mut self, fonts_dir: Option<PathBuf>) -> Self {
        self.fonts_dir = fonts_dir;
        self
    }
}

/// Result of the histogram step.
#[derive(Debug)]
pub enum HistogramStatus {
    /// Rendered and written to the given path.
    Written(PathBuf),
    /// Not attempted because the report is void.
    Skipped,
    Failed(ChartError),
}

impl HistogramStatus {
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Written(path) => Some(path),
            _ => None,
        }
    }
}

/// Everything a completed run produced.
#[derive(Debug)]
pub struct CompletedRun {
    pub deck_id: DeckId,
    pub summary: DeckSummary,
    pub invalid_entries: Vec<String>,
    pub is_void: bool,
    pub histogram: HistogramStatus,
    pub report: Result<PathBuf, ReportError>,
}

/// How a run ended.
#[derive(Debug)]
pub enum RunOutcome {
    /// The deck had no accepted entries; nothing was written.
    NoValidData { invalid_entries: Vec<String> },
    Completed(CompletedRun),
}

/// Whether a deck exceeds either volume cap.
pub fn is_void(reading: &DeckReading, config: &AnalyzerConfig) -> bool {
    reading.cards().len() > config.max_cards || reading.invalid().len() > config.max_invalid_cards
}

/// Runs the full analysis for one deck listing.
pub fn run(
    options: &RunOptions,
    config: &AnalyzerConfig,
    ids: &mut dyn DeckIdSource,
) -> Result<RunOutcome, RunError> {
    config.validate()?;
    let deck_id = ids.next_id(config.deck_id_length);

    let reading = read_deck(&options.deck_path, config)?;
    let invalid_entries = reading.invalid_lines();
    info!(
        "deck {}: {} accepted, {} rejected entries",
        deck_id,
        reading.cards().len(),
        invalid_entries.len()
    );

    if reading.cards().is_empty() {
        return Ok(RunOutcome::NoValidData { invalid_entries });
    }

    let costs = reading.energy_costs();
    let summary = DeckSummary::from_costs(&costs, config);
    let is_void = is_void(&reading, config);

    let histogram = if is_void {
        info!("deck {} exceeds volume caps; skipping histogram", deck_id);
        HistogramStatus::Skipped
    } else {
        let path = options.output_dir.join(&config.histogram_file);
        match render_histogram(&summary.histogram, &options.chart)
            .and_then(|image| save_png(&image, &path))
        {
            Ok(()) => {
                info!("wrote histogram {}", path.display());
                HistogramStatus::Written(path)
            }
            Err(err) => {
                warn!("histogram rendering failed: {}", err);
                HistogramStatus::Failed(err)
            }
        }
    };

    let request = ReportRequest {
        prefix: &config.report_prefix,
        deck_id: &deck_id,
        total_cost: summary.total_cost,
        average_cost: summary.average_cost(),
        invalid_entries: &invalid_entries,
        is_void,
        histogram: histogram.path(),
    };
    let report = request.write_to(&options.output_dir, options.fonts_dir.as_deref());

    Ok(RunOutcome::Completed(CompletedRun {
        deck_id,
        summary,
        invalid_entries,
        is_void,
        histogram,
        report,
    }))
}
