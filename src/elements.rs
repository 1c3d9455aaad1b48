//! `genpdf` elements that the upstream crate does not ship: a width-constrained image.

use std::path::Path;

use image::GenericImageView;

use genpdf::elements::Image;
use genpdf::error::{Context as _, Error};
use genpdf::style::Style;
use genpdf::{render, Alignment, Element, Mm, RenderResult, Scale, Size};

/// Resolution `genpdf` assumes when placing images.
const DEFAULT_IMAGE_DPI: f64 = 300.0;
const MM_PER_INCH: f64 = 25.4;

pub(crate) fn mm_from_f64(value: f64) -> Mm {
    Mm::from(printpdf::Mm(value))
}

pub(crate) fn mm_to_f64(value: Mm) -> f64 {
    let mm: printpdf::Mm = value.into();
    mm.0
}

/// Natural printed size of `image` at `dpi`.
pub fn estimated_image_size(image: &image::DynamicImage, dpi: f64) -> Size {
    let (px_width, px_height) = image.dimensions();
    let width_mm = MM_PER_INCH * (px_width as f64) / dpi;
    let height_mm = MM_PER_INCH * (px_height as f64) / dpi;
    Size::new(mm_from_f64(width_mm), mm_from_f64(height_mm))
}

/// Opens and decodes the image at `path`.
pub fn decode_image_from_path(path: impl AsRef<Path>) -> Result<image::DynamicImage, Error> {
    let path = path.as_ref();
    let reader = image::io::Reader::open(path)
        .with_context(|| format!("Failed to open image file {}", path.display()))?;
    reader
        .with_guessed_format()
        .context("Unable to determine image format")?
        .decode()
        .with_context(|| format!("Failed to decode image file {}", path.display()))
}

/// An image scaled to a requested width; the aspect ratio is kept.
pub struct ScaledImage {
    image: Image,
    alignment: Alignment,
    natural_size: Size,
    requested_width: Option<Mm>,
}

impl ScaledImage {
    /// Wraps a decoded image. Images with an alpha channel are flattened to RGB first since
    /// `genpdf` cannot embed them.
    pub fn from_dynamic_image(image: image::DynamicImage) -> Result<Self, Error> {
        let image = if image.color().has_alpha() {
            image::DynamicImage::ImageRgb8(image.to_rgb8())
        } else {
            image
        };
        let natural_size = estimated_image_size(&image, DEFAULT_IMAGE_DPI);
        let image = Image::from_dynamic_image(image)?;
        Ok(Self {
            image,
            alignment: Alignment::Left,
            natural_size,
            requested_width: None,
        })
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, Error> {
        Self::from_dynamic_image(decode_image_from_path(path)?)
    }

    pub fn with_alignment(mut self, alignment: Alignment) -> Self {
        self.alignment = alignment;
        self
    }

    /// Constrains the rendered width of the image while preserving the aspect ratio.
    pub fn with_width(mut self, width: impl Into<Option<Mm>>) -> Self {
        self.requested_width = width.into();
        self
    }

    /// Scale factor applied to the natural size when rendering.
    pub fn scale_factor(&self) -> f64 {
        match self.requested_width {
            Some(width) => {
                let natural = mm_to_f64(self.natural_size.width);
                if natural > f64::EPSILON {
                    mm_to_f64(width) / natural
                } else {
                    1.0
                }
            }
            None => 1.0,
        }
    }

    fn apply_layout(&mut self) {
        self.image.set_alignment(self.alignment);
        let scale = self.scale_factor();
        self.image.set_scale(Scale::new(scale, scale));
    }
}

impl Element for ScaledImage {
    fn render(
        &mut self,
        context: &genpdf::Context,
        area: render::Area<'_>,
        style: Style,
    ) -> Result<RenderResult, Error> {
        self.apply_layout();
        self.image.render(context, area, style)
    }
}
