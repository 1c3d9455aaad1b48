//! The deck energy report: layout, file naming and writing.

use std::error::Error as StdError;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use genpdf::elements::Paragraph;
use genpdf::Alignment;
use log::{info, warn};

use crate::builder::{PdfBuildError, PdfBuilder};
use crate::deck_id::DeckId;
use crate::model::{Block, HorizontalAlignment, ImageBlock, RichParagraph};
use crate::richtext::Span;

pub const REPORT_TITLE: &str = "Slay the Spire Deck Energy Cost Report";
pub const INVALID_HEADING: &str = "Invalid Cards:";
pub const HISTOGRAM_PLACEHOLDER: &str = "Histogram not available for this report.";
pub const VOID_SUFFIX: &str = "(VOID)";

const TITLE_FONT_SIZE: u8 = 16;
const BODY_FONT_SIZE: u8 = 12;
const HISTOGRAM_WIDTH_MM: f64 = 160.0;
const FOOTER_HEIGHT_MM: f64 = 8.0;

/// Errors raised while producing a report file.
#[derive(Debug)]
pub enum ReportError {
    /// The document could not be built.
    Build(PdfBuildError),
    /// The finished document could not be written.
    Write { path: PathBuf, source: io::Error },
}

impl fmt::Display for ReportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Build(_) => write!(f, "Failed to build the report document"),
            Self::Write { path, .. } => write!(f, "Failed to write report {}", path.display()),
        }
    }
}

impl StdError for ReportError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Self::Build(err) => Some(err),
            Self::Write { source, .. } => Some(source),
        }
    }
}

impl From<PdfBuildError> for ReportError {
    fn from(err: PdfBuildError) -> Self {
        Self::Build(err)
    }
}

/// Everything a report shows.
#[derive(Debug, Clone)]
pub struct ReportRequest<'a> {
    pub prefix: &'a str,
    pub deck_id: &'a DeckId,
    pub total_cost: i64,
    /// Mean energy cost of the accepted cards.
    pub average_cost: Option<f64>,
    pub invalid_entries: &'a [String],
    pub is_void: bool,
    /// Histogram rendered during this run, if any.
    pub histogram: Option<&'a Path>,
}

impl ReportRequest<'_> {
    /// File name of the report: `"<prefix> <deck id>.pdf"`, with `(VOID)` before the extension
    /// for void reports.
    pub fn file_name(&self) -> String {
        report_file_name(self.prefix, self.deck_id, self.is_void)
    }

    /// Content blocks in reading order.
    pub fn blocks(&self) -> Vec<Block> {
        let mut blocks = vec![
            Block::paragraph(vec![Span::new(REPORT_TITLE).bold().sized(TITLE_FONT_SIZE)]),
            Block::paragraph(vec![
                Span::new(format!("Deck ID: {}", self.deck_id)).sized(BODY_FONT_SIZE)
            ]),
            Block::paragraph(vec![Span::new(format!(
                "Total Energy Cost: {} energy",
                self.total_cost
            ))
            .sized(BODY_FONT_SIZE)]),
        ];
        if let Some(average) = self.average_cost.filter(|_| !self.is_void) {
            blocks.push(Block::paragraph(vec![Span::new(format!(
                "Average Energy Cost: {:.2} energy",
                average
            ))
            .sized(BODY_FONT_SIZE)]));
        }
        blocks.push(Block::Spacer(1.0));

        match self.histogram {
            Some(path) => blocks.push(Block::Image(
                ImageBlock::new(path)
                    .with_alignment(HorizontalAlignment::Center)
                    .with_width_mm(Some(HISTOGRAM_WIDTH_MM)),
            )),
            None => blocks.push(Block::Paragraph(
                RichParagraph::new(vec![Span::new(HISTOGRAM_PLACEHOLDER)
                    .italic()
                    .sized(BODY_FONT_SIZE)])
                .with_alignment(HorizontalAlignment::Center),
            )),
        }

        if !self.is_void && !self.invalid_entries.is_empty() {
            blocks.push(Block::Spacer(1.0));
            blocks.push(Block::paragraph(vec![Span::new(INVALID_HEADING)
                .bold()
                .sized(BODY_FONT_SIZE)]));
            blocks.extend(
                self.invalid_entries
                    .iter()
                    .map(|entry| Block::paragraph(vec![Span::new(entry.clone()).sized(BODY_FONT_SIZE)])),
            );
        }

        blocks
    }

    fn builder(&self, fonts_dir: Option<&Path>) -> PdfBuilder {
        PdfBuilder::new()
            .with_title(format!("{} {}", REPORT_TITLE, self.deck_id))
            .with_fonts_dir(fonts_dir)
            .with_font_size(BODY_FONT_SIZE)
            .with_footer(FOOTER_HEIGHT_MM, |page| {
                let mut footer = Paragraph::new(format!("Page {}", page));
                footer.set_alignment(Alignment::Right);
                footer
            })
            .add_blocks(self.blocks())
    }

    /// Renders the report to PDF bytes.
    ///
    /// A histogram that cannot be loaded is replaced by the placeholder line.
    pub fn render(&self, fonts_dir: Option<&Path>) -> Result<Vec<u8>, ReportError> {
        match self.builder(fonts_dir).render() {
            Ok(pdf) => Ok(pdf.bytes),
            Err(PdfBuildError::Image(err)) if self.histogram.is_some() => {
                warn!("histogram could not be embedded ({}); using placeholder", err);
                let degraded = ReportRequest {
                    histogram: None,
                    ..self.clone()
                };
                Ok(degraded.builder(fonts_dir).render()?.bytes)
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Renders the report and writes it into `output_dir`, returning the written path.
    pub fn write_to(
        &self,
        output_dir: &Path,
        fonts_dir: Option<&Path>,
    ) -> Result<PathBuf, ReportError> {
        let bytes = self.render(fonts_dir)?;
        let path = output_dir.join(self.file_name());
        fs::write(&path, &bytes).map_err(|source| ReportError::Write {
            path: path.clone(),
            source,
        })?;
        info!("wrote report {} ({} bytes)", path.display(), bytes.len());
        Ok(path)
    }
}

/// Builds the report file name for a deck.
pub fn report_file_name(prefix: &str, deck_id: &DeckId, is_void: bool) -> String {
    format!(
        "{} {}{}.pdf",
        prefix,
        deck_id,
        if is_void { VOID_SUFFIX } else { "" }
    )
}
