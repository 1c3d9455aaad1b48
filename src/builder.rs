//! Turns a list of [`Block`]s into PDF bytes with `genpdf`.

use std::error::Error as StdError;
use std::fmt;
use std::path::{Path, PathBuf};

use genpdf::elements::{Break, Paragraph};
use genpdf::error::{Error, ErrorKind};
use genpdf::style;
use genpdf::{Element, Margins, Mm, PageDecorator, PaperSize, Position, Size};
use log::debug;

use crate::elements::{mm_from_f64, ScaledImage};
use crate::fonts;
use crate::model::{Block, ImageBlock, RichParagraph};

const DEFAULT_MARGIN_MM: f64 = 20.0;
const DEFAULT_FONT_SIZE: u8 = 12;

/// Errors that can occur while rendering a document.
#[derive(Debug)]
pub enum PdfBuildError {
    /// No usable font family could be loaded.
    FontLoad(Error),
    /// An image block could not be decoded or embedded.
    Image(Error),
    /// `genpdf` failed while laying out or writing the document.
    Render(Error),
}

impl fmt::Display for PdfBuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FontLoad(_) => write!(f, "Failed to load fonts for the PDF document"),
            Self::Image(_) => write!(f, "Failed to embed image in the PDF document"),
            Self::Render(_) => write!(f, "Failed to render the PDF document"),
        }
    }
}

impl StdError for PdfBuildError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Self::FontLoad(err) | Self::Image(err) | Self::Render(err) => Some(err),
        }
    }
}

/// The rendered document.
#[derive(Debug, Clone)]
pub struct RenderedPdf {
    pub bytes: Vec<u8>,
}

type FooterFactory = dyn Fn(usize) -> Box<dyn Element>;

/// Footer drawn at the bottom of every page.
pub struct FooterSpec {
    height: Mm,
    factory: Box<FooterFactory>,
}

impl FooterSpec {
    pub fn new<F, E>(height: impl Into<Mm>, factory: F) -> Self
    where
        F: Fn(usize) -> E + 'static,
        E: Element + 'static,
    {
        Self {
            height: height.into(),
            factory: Box::new(move |page| Box::new(factory(page)) as Box<dyn Element>),
        }
    }
}

/// Builder for single-flow PDF documents.
pub struct PdfBuilder {
    title: Option<String>,
    fonts_dir: Option<PathBuf>,
    paper_size: Size,
    margins: Margins,
    font_size: u8,
    footer: Option<FooterSpec>,
    blocks: Vec<Block>,
}

impl Default for PdfBuilder {
    fn default() -> Self {
        Self {
            title: None,
            fonts_dir: None,
            paper_size: PaperSize::A4.into(),
            margins: Margins::trbl(
                mm_from_f64(DEFAULT_MARGIN_MM),
                mm_from_f64(DEFAULT_MARGIN_MM),
                mm_from_f64(DEFAULT_MARGIN_MM),
                mm_from_f64(DEFAULT_MARGIN_MM),
            ),
            font_size: DEFAULT_FONT_SIZE,
            footer: None,
            blocks: Vec::new(),
        }
    }
}

impl PdfBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the document title stored in the PDF metadata.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Searches `dir` for fonts before the default locations.
    pub fn with_fonts_dir(mut self, dir: Option<&Path>) -> Self {
        self.fonts_dir = dir.map(Path::to_path_buf);
        self
    }

    /// Default font size in points for text without an explicit size.
    pub fn with_font_size(mut self, font_size: u8) -> Self {
        self.font_size = font_size;
        self
    }

    /// Configures a footer with a fixed height that is rendered on every page.
    pub fn with_footer<F, E>(mut self, height: impl Into<Mm>, footer: F) -> Self
    where
        F: Fn(usize) -> E + 'static,
        E: Element + 'static,
    {
        self.footer = Some(FooterSpec::new(height, footer));
        self
    }

    pub fn add_blocks<I>(mut self, blocks: I) -> Self
    where
        I: IntoIterator<Item = Block>,
    {
        self.blocks.extend(blocks);
        self
    }

    /// Lays out every block and returns the encoded PDF.
    pub fn render(self) -> Result<RenderedPdf, PdfBuildError> {
        let family =
            fonts::load_font_family(self.fonts_dir.as_deref()).map_err(PdfBuildError::FontLoad)?;
        let mut document = genpdf::Document::new(family);
        if let Some(title) = &self.title {
            document.set_title(title.clone());
        }
        document.set_paper_size(self.paper_size);
        document.set_font_size(self.font_size);
        document.set_page_decorator(ConfiguredPageDecorator::new(self.margins, self.footer));

        for block in &self.blocks {
            match block {
                Block::Paragraph(paragraph) => document.push(paragraph_element(paragraph)),
                Block::Image(image) => {
                    document.push(image_element(image).map_err(PdfBuildError::Image)?)
                }
                Block::Spacer(lines) => document.push(Break::new(*lines)),
            }
        }

        let mut bytes = Vec::new();
        document
            .render(&mut bytes)
            .map_err(PdfBuildError::Render)?;
        debug!("rendered PDF document ({} bytes)", bytes.len());
        Ok(RenderedPdf { bytes })
    }
}

fn paragraph_element(paragraph: &RichParagraph) -> Paragraph {
    let mut element = Paragraph::default();
    for span in paragraph.spans() {
        element.push(span.to_styled_string());
    }
    element.set_alignment(paragraph.alignment().into());
    element
}

fn image_element(block: &ImageBlock) -> Result<ScaledImage, Error> {
    let mut element = ScaledImage::from_path(block.path())?;
    if let Some(width) = block.width_mm() {
        element = element.with_width(mm_from_f64(width));
    }
    Ok(element.with_alignment(block.alignment().into()))
}

struct ConfiguredPageDecorator {
    page: usize,
    margins: Margins,
    footer: Option<FooterSpec>,
}

impl ConfiguredPageDecorator {
    fn new(margins: Margins, footer: Option<FooterSpec>) -> Self {
        Self {
            page: 0,
            margins,
            footer,
        }
    }
}

impl PageDecorator for ConfiguredPageDecorator {
    fn decorate_page<'a>(
        &mut self,
        context: &genpdf::Context,
        mut area: genpdf::render::Area<'a>,
        style: style::Style,
    ) -> Result<genpdf::render::Area<'a>, Error> {
        self.page += 1;
        area.add_margins(self.margins);

        if let Some(footer) = &self.footer {
            let available = area.size().height;
            if footer.height > available {
                return Err(Error::new(
                    "Footer height exceeds available space",
                    ErrorKind::InvalidData,
                ));
            }

            let mut footer_area = area.clone();
            footer_area.add_offset(Position::new(0, available - footer.height));
            let mut element = (footer.factory)(self.page);
            let result = element.render(context, footer_area, style)?;
            if result.has_more {
                return Err(Error::new(
                    "Footer element does not fit into the reserved space",
                    ErrorKind::PageSizeExceeded,
                ));
            }

            area.set_height(available - footer.height);
        }

        Ok(area)
    }
}
