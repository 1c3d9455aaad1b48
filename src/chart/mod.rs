//! Bar-chart rendering for the energy cost histogram.

mod glyphs;
mod paint;

pub use paint::{
    encode_png, render_histogram, save_png, ChartError, ChartOptions, DEFAULT_CHART_HEIGHT,
    DEFAULT_CHART_WIDTH,
};
