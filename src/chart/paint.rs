use std::io::Cursor;
use std::path::Path;

use image::{DynamicImage, ImageFormat, ImageOutputFormat, Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut, draw_line_segment_mut};
use imageproc::rect::Rect;
use thiserror::Error;

use super::glyphs::{draw_text, draw_text_vertical, text_height, text_width};
use crate::stats::EnergyHistogram;

pub const DEFAULT_CHART_WIDTH: u32 = 640;
pub const DEFAULT_CHART_HEIGHT: u32 = 480;

const MARGIN_LEFT: u32 = 90;
const MARGIN_RIGHT: u32 = 24;
const MARGIN_TOP: u32 = 56;
const MARGIN_BOTTOM: u32 = 64;
const BAR_FILL_RATIO: f32 = 0.6;
const MAX_TICKS: usize = 10;
const LABEL_SCALE: u32 = 2;

/// Errors raised while encoding or writing a chart.
#[derive(Debug, Error)]
pub enum ChartError {
    #[error("chart size {width}x{height} is too small to draw")]
    TooSmall { width: u32, height: u32 },
    #[error("failed to encode chart as PNG")]
    Encode(#[source] image::ImageError),
    #[error("failed to write chart to {path}")]
    Write {
        path: String,
        #[source]
        source: image::ImageError,
    },
}

/// Text and size of a bar chart.
#[derive(Debug, Clone)]
pub struct ChartOptions {
    pub width: u32,
    pub height: u32,
    pub title: String,
    pub x_label: String,
    pub y_label: String,
}

impl Default for ChartOptions {
    fn default() -> Self {
        Self {
            width: DEFAULT_CHART_WIDTH,
            height: DEFAULT_CHART_HEIGHT,
            title: "Energy Cost Distribution".to_owned(),
            x_label: "Energy Cost".to_owned(),
            y_label: "Number of Cards".to_owned(),
        }
    }
}

struct Palette {
    background: Rgb<u8>,
    plot: Rgb<u8>,
    grid: Rgb<u8>,
    axis: Rgb<u8>,
    bar: Rgb<u8>,
    bar_edge: Rgb<u8>,
    text: Rgb<u8>,
}

const PALETTE: Palette = Palette {
    background: Rgb([0xff, 0xff, 0xff]),
    plot: Rgb([0xf4, 0xf4, 0xf4]),
    grid: Rgb([0xd0, 0xd0, 0xd0]),
    axis: Rgb([0x40, 0x40, 0x40]),
    bar: Rgb([0xd9, 0x4f, 0x4f]),
    bar_edge: Rgb([0x8c, 0x2a, 0x2a]),
    text: Rgb([0x20, 0x20, 0x20]),
};

/// Pixel bounds of the plotting area.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlotArea {
    pub left: u32,
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
}

impl PlotArea {
    fn for_size(width: u32, height: u32) -> Option<Self> {
        let right = width.checked_sub(MARGIN_RIGHT)?;
        let bottom = height.checked_sub(MARGIN_BOTTOM)?;
        if right <= MARGIN_LEFT + 1 || bottom <= MARGIN_TOP + 1 {
            return None;
        }
        Some(Self {
            left: MARGIN_LEFT,
            top: MARGIN_TOP,
            right,
            bottom,
        })
    }

    fn width(&self) -> u32 {
        self.right - self.left
    }

    fn height(&self) -> u32 {
        self.bottom - self.top
    }
}

/// Plot area used by [`render_histogram`] for a chart of the given size.
pub fn plot_area(options: &ChartOptions) -> Option<PlotArea> {
    PlotArea::for_size(options.width, options.height)
}

/// Chooses a tick step from 1, 2, 5, 10, 20, 50, ... so that at most [`MAX_TICKS`] ticks cover
/// `max_count`.
pub fn tick_step(max_count: usize) -> usize {
    let mut magnitude = 1usize;
    loop {
        for factor in [1, 2, 5] {
            let step = factor * magnitude;
            if ticks_needed(max_count, step) <= MAX_TICKS {
                return step;
            }
        }
        magnitude = magnitude.saturating_mul(10);
    }
}

fn ticks_needed(max_count: usize, step: usize) -> usize {
    max_count / step + usize::from(max_count % step != 0)
}

/// Draws a vertical bar chart with one bar per histogram bucket.
pub fn render_histogram(
    histogram: &EnergyHistogram,
    options: &ChartOptions,
) -> Result<RgbImage, ChartError> {
    let area = plot_area(options).ok_or(ChartError::TooSmall {
        width: options.width,
        height: options.height,
    })?;
    let mut image = RgbImage::from_pixel(options.width, options.height, PALETTE.background);

    draw_filled_rect_mut(
        &mut image,
        Rect::at(area.left as i32, area.top as i32).of_size(area.width(), area.height()),
        PALETTE.plot,
    );

    let step = tick_step(histogram.max_count());
    let ticks = ticks_needed(histogram.max_count(), step).max(1);
    let y_max = (ticks * step) as f32;
    let px_per_card = area.height() as f32 / y_max;

    for tick in 0..=ticks {
        let value = tick * step;
        let y = area.bottom as f32 - value as f32 * px_per_card;
        draw_line_segment_mut(
            &mut image,
            (area.left as f32, y),
            (area.right as f32, y),
            PALETTE.grid,
        );
        let label = value.to_string();
        let label_x = area.left as i32 - 8 - text_width(&label, LABEL_SCALE) as i32;
        let label_y = y.round() as i32 - (text_height(LABEL_SCALE) / 2) as i32;
        draw_text(&mut image, label_x, label_y, &label, PALETTE.text, LABEL_SCALE);
    }

    let buckets: Vec<(i64, usize)> = histogram.buckets().collect();
    let slot_width = area.width() as f32 / buckets.len().max(1) as f32;
    let bar_width = ((slot_width * BAR_FILL_RATIO).round() as u32).max(1);

    for (idx, (cost, count)) in buckets.iter().enumerate() {
        let center_x = area.left as f32 + slot_width * (idx as f32 + 0.5);
        let bar_left = (center_x - bar_width as f32 / 2.0).round() as i32;
        let bar_height = (*count as f32 * px_per_card).round() as u32;

        if bar_height > 0 {
            let bar_top = area.bottom as i32 - bar_height as i32;
            let bar = Rect::at(bar_left, bar_top).of_size(bar_width, bar_height);
            draw_filled_rect_mut(&mut image, bar, PALETTE.bar);
            draw_hollow_rect_mut(&mut image, bar, PALETTE.bar_edge);
        }
        if *count > 0 {
            let label = count.to_string();
            let label_x = center_x.round() as i32 - (text_width(&label, LABEL_SCALE) / 2) as i32;
            let label_y =
                area.bottom as i32 - bar_height as i32 - text_height(LABEL_SCALE) as i32 - 4;
            draw_text(&mut image, label_x, label_y, &label, PALETTE.text, LABEL_SCALE);
        }

        let tick_label = cost.to_string();
        let tick_x = center_x.round() as i32 - (text_width(&tick_label, LABEL_SCALE) / 2) as i32;
        draw_text(
            &mut image,
            tick_x,
            area.bottom as i32 + 8,
            &tick_label,
            PALETTE.text,
            LABEL_SCALE,
        );
    }

    draw_line_segment_mut(
        &mut image,
        (area.left as f32, area.top as f32),
        (area.left as f32, area.bottom as f32),
        PALETTE.axis,
    );
    draw_line_segment_mut(
        &mut image,
        (area.left as f32, area.bottom as f32),
        (area.right as f32, area.bottom as f32),
        PALETTE.axis,
    );

    let title_scale = LABEL_SCALE + 1;
    let title_x = (options.width as i32 - text_width(&options.title, title_scale) as i32) / 2;
    draw_text(
        &mut image,
        title_x.max(0),
        (MARGIN_TOP as i32 - text_height(title_scale) as i32) / 2,
        &options.title,
        PALETTE.text,
        title_scale,
    );

    let x_label_x = area.left as i32
        + (area.width() as i32 - text_width(&options.x_label, LABEL_SCALE) as i32) / 2;
    draw_text(
        &mut image,
        x_label_x,
        options.height as i32 - text_height(LABEL_SCALE) as i32 - 12,
        &options.x_label,
        PALETTE.text,
        LABEL_SCALE,
    );

    let y_label_y = area.bottom as i32
        - (area.height() as i32 - text_width(&options.y_label, LABEL_SCALE) as i32) / 2;
    draw_text_vertical(
        &mut image,
        12,
        y_label_y,
        &options.y_label,
        PALETTE.text,
        LABEL_SCALE,
    );

    Ok(image)
}

/// Encodes a chart as PNG bytes.
pub fn encode_png(image: &RgbImage) -> Result<Vec<u8>, ChartError> {
    let mut bytes = Vec::new();
    DynamicImage::ImageRgb8(image.clone())
        .write_to(&mut Cursor::new(&mut bytes), ImageOutputFormat::Png)
        .map_err(ChartError::Encode)?;
    Ok(bytes)
}

/// Writes a chart to `path` as PNG, whatever the file extension.
pub fn save_png(image: &RgbImage, path: &Path) -> Result<(), ChartError> {
    image
        .save_with_format(path, ImageFormat::Png)
        .map_err(|source| ChartError::Write {
            path: path.display().to_string(),
            source,
        })
}
