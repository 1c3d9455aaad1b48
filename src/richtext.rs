//! Styled text fragments.
//!
//! A [`Span`] carries the handful of inline attributes the report uses (bold, italic, font size)
//! and converts into a [`genpdf`] [`StyledString`] when the document is rendered.

use genpdf::style::{Style, StyledString};

/// A slice of text together with inline style attributes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Span {
    text: String,
    bold: bool,
    italic: bool,
    font_size: Option<u8>,
}

impl Span {
    /// Creates a new span with the provided text and no styles applied.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_bold(&self) -> bool {
        self.bold
    }

    /// Marks the span as bold.
    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    /// Marks the span as italic.
    pub fn italic(mut self) -> Self {
        self.italic = true;
        self
    }

    /// Sets the font size in points.
    pub fn sized(mut self, font_size: u8) -> Self {
        self.font_size = Some(font_size);
        self
    }

    fn to_style(&self) -> Style {
        let mut style = Style::new();
        if self.bold {
            style.set_bold();
        }
        if self.italic {
            style.set_italic();
        }
        if let Some(size) = self.font_size {
            style.set_font_size(size);
        }
        style
    }

    /// Converts the span to a [`StyledString`].
    pub fn to_styled_string(&self) -> StyledString {
        StyledString::new(self.text.clone(), self.to_style())
    }
}

/// Concatenates the text of `spans`, ignoring styles.
pub fn plain_text<'a, I>(spans: I) -> String
where
    I: IntoIterator<Item = &'a Span>,
{
    spans.into_iter().map(Span::text).collect()
}
