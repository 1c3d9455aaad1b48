//! Renderer-independent description of a report's content.
//!
//! Reports are first assembled as a list of [`Block`] values and only turned into `genpdf`
//! elements by [`crate::builder::PdfBuilder`]. Keeping the layout as plain data lets the report
//! structure be inspected without loading fonts.

use std::path::{Path, PathBuf};

use crate::richtext::{plain_text, Span};

/// Horizontal placement of a block on the page.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum HorizontalAlignment {
    #[default]
    Left,
    Center,
    Right,
}

impl From<HorizontalAlignment> for genpdf::Alignment {
    fn from(value: HorizontalAlignment) -> Self {
        match value {
            HorizontalAlignment::Left => genpdf::Alignment::Left,
            HorizontalAlignment::Center => genpdf::Alignment::Center,
            HorizontalAlignment::Right => genpdf::Alignment::Right,
        }
    }
}

/// Paragraph made of styled spans.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RichParagraph {
    spans: Vec<Span>,
    alignment: HorizontalAlignment,
}

impl RichParagraph {
    pub fn new(spans: impl Into<Vec<Span>>) -> Self {
        Self {
            spans: spans.into(),
            ..Self::default()
        }
    }

    pub fn spans(&self) -> &[Span] {
        &self.spans
    }

    pub fn alignment(&self) -> HorizontalAlignment {
        self.alignment
    }

    pub fn with_alignment(mut self, alignment: HorizontalAlignment) -> Self {
        self.alignment = alignment;
        self
    }

    /// Text of the paragraph without styling.
    pub fn text(&self) -> String {
        plain_text(&self.spans)
    }
}

/// Image file placed in the document, optionally scaled to a width.
#[derive(Clone, Debug, PartialEq)]
pub struct ImageBlock {
    path: PathBuf,
    alignment: HorizontalAlignment,
    width_mm: Option<f64>,
}

impl ImageBlock {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            alignment: HorizontalAlignment::Left,
            width_mm: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn alignment(&self) -> HorizontalAlignment {
        self.alignment
    }

    /// Requested rendered width in millimetres.
    pub fn width_mm(&self) -> Option<f64> {
        self.width_mm
    }

    pub fn with_alignment(mut self, alignment: HorizontalAlignment) -> Self {
        self.alignment = alignment;
        self
    }

    pub fn with_width_mm(mut self, width_mm: impl Into<Option<f64>>) -> Self {
        self.width_mm = width_mm.into();
        self
    }
}

/// A unit of report content, rendered top to bottom.
#[derive(Clone, Debug, PartialEq)]
pub enum Block {
    Paragraph(RichParagraph),
    Image(ImageBlock),
    /// Vertical gap measured in text lines.
    Spacer(f64),
}

impl Block {
    /// Convenience helper for building a paragraph block.
    pub fn paragraph(spans: impl Into<Vec<Span>>) -> Self {
        Self::Paragraph(RichParagraph::new(spans))
    }

    /// Text of a paragraph block, `None` for other blocks.
    pub fn text(&self) -> Option<String> {
        match self {
            Self::Paragraph(paragraph) => Some(paragraph.text()),
            _ => None,
        }
    }
}
