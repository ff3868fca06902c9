//! Comparison plots of corrected voltammograms.
//!
//! Each folder gets one figure per category with every file of that
//! category drawn as a labeled line. The figure is written as a PNG and
//! as an SVG next to the per-file outputs.

use std::ops::Range;
use std::path::{Path, PathBuf};

use plotters::coord::Shift;
use plotters::prelude::*;
use plotters_bitmap::BitMapBackend;
use thiserror::Error;

use crate::config::PlotConfig;
use crate::core::{Category, CorrectedSeries};

/// Errors that can occur during visualization.
#[derive(Error, Debug)]
pub enum VisualizationError {
    #[error("Plotting error: {0}")]
    PlottingError(String),

    #[error("No series to plot")]
    EmptyFigure,
}

/// Result type for visualization operations.
pub type Result<T> = std::result::Result<T, VisualizationError>;

/// X axis label.
pub const X_LABEL: &str = "E vs RHE (V)";

/// Y axis label.
pub const Y_LABEL: &str = "Current Density";

/// Width of the legend column right of the chart, in pixels.
const LEGEND_WIDTH: u32 = 260;

/// Vertical distance between legend entries, in pixels.
const LEGEND_ROW_HEIGHT: i32 = 22;

/// Color palette for the lines of one figure.
const SERIES_COLORS: &[(u8, u8, u8)] = &[
    (31, 119, 180),  // Blue
    (255, 127, 14),  // Orange
    (44, 160, 44),   // Green
    (214, 39, 40),   // Red
    (148, 103, 189), // Purple
    (140, 86, 75),   // Brown
    (227, 119, 194), // Pink
    (127, 127, 127), // Gray
    (188, 189, 34),  // Olive
    (23, 190, 207),  // Cyan
];

fn plotting_error<E: std::fmt::Display>(e: E) -> VisualizationError {
    VisualizationError::PlottingError(e.to_string())
}

/// One line of a comparison figure.
#[derive(Debug, Clone)]
pub struct LabeledSeries {
    pub label: String,
    pub series: CorrectedSeries,
}

/// Lines collected for one folder and category before rendering.
#[derive(Debug, Clone)]
pub struct CategoryFigure {
    pub folder_name: String,
    pub category: Category,
    pub lines: Vec<LabeledSeries>,
}

impl CategoryFigure {
    pub fn new(folder_name: impl Into<String>, category: Category) -> Self {
        Self {
            folder_name: folder_name.into(),
            category,
            lines: Vec::new(),
        }
    }

    pub fn add_line(&mut self, label: impl Into<String>, series: CorrectedSeries) {
        self.lines.push(LabeledSeries {
            label: label.into(),
            series,
        });
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn title(&self) -> String {
        format!("Plot for {}, {}", self.folder_name, self.category.label())
    }
}

/// Paths of the raster and vector images for a category in `folder`.
pub fn plot_paths(folder: &Path, category: Category) -> (PathBuf, PathBuf) {
    let stem = category.plot_stem();
    (
        folder.join(format!("{}.png", stem)),
        folder.join(format!("{}.svg", stem)),
    )
}

/// Color of the `index`-th line.
pub fn series_color(index: usize) -> RGBColor {
    let (r, g, b) = SERIES_COLORS[index % SERIES_COLORS.len()];
    RGBColor(r, g, b)
}

/// Render a figure into `folder` as PNG and SVG.
///
/// # Returns
///
/// The paths of the written images.
pub fn save_category_figure(
    folder: &Path,
    figure: &CategoryFigure,
    config: &PlotConfig,
) -> Result<Vec<PathBuf>> {
    if figure.is_empty() {
        return Err(VisualizationError::EmptyFigure);
    }

    let (png_path, svg_path) = plot_paths(folder, figure.category);
    let size = (config.width, config.height);

    {
        let root = BitMapBackend::new(&png_path, size).into_drawing_area();
        draw_figure(&root, figure)?;
    }
    {
        let root = SVGBackend::new(&svg_path, size).into_drawing_area();
        draw_figure(&root, figure)?;
    }

    Ok(vec![png_path, svg_path])
}

fn draw_figure<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    figure: &CategoryFigure,
) -> Result<()> {
    let (x_min, x_max, y_min, y_max) = compute_bounds(&figure.lines);

    root.fill(&WHITE).map_err(plotting_error)?;

    let (width, _) = root.dim_in_pixel();
    let legend_width = LEGEND_WIDTH.min(width / 3);
    let (plot_area, legend_area) = root.split_horizontally((width - legend_width) as i32);

    let mut chart = ChartBuilder::on(&plot_area)
        .caption(figure.title(), ("sans-serif", 32))
        .margin(20)
        .x_label_area_size(60)
        .y_label_area_size(90)
        .build_cartesian_2d(padded_range(x_min, x_max), padded_range(y_min, y_max))
        .map_err(plotting_error)?;

    chart
        .configure_mesh()
        .x_desc(X_LABEL)
        .y_desc(Y_LABEL)
        .label_style(("sans-serif", 18))
        .draw()
        .map_err(plotting_error)?;

    for (idx, line) in figure.lines.iter().enumerate() {
        let points = line
            .series
            .points()
            .filter(|(x, y)| x.is_finite() && y.is_finite());

        chart
            .draw_series(LineSeries::new(points, series_color(idx).stroke_width(2)))
            .map_err(plotting_error)?;
    }

    draw_legend(&legend_area, figure)?;

    root.present().map_err(plotting_error)?;

    Ok(())
}

/// Draw the line labels top-down in the area right of the chart.
fn draw_legend<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    figure: &CategoryFigure,
) -> Result<()> {
    // Align the first entry with the top of the plotting area
    let top = 80;

    for (idx, line) in figure.lines.iter().enumerate() {
        let y = top + idx as i32 * LEGEND_ROW_HEIGHT;
        let color = series_color(idx);

        area.draw(&PathElement::new(vec![(10, y), (34, y)], color.stroke_width(2)))
            .map_err(plotting_error)?;
        area.draw(&Text::new(
            line.label.clone(),
            (42, y - 8),
            ("sans-serif", 14).into_font(),
        ))
        .map_err(plotting_error)?;
    }

    Ok(())
}

/// Axis range with 5% padding on both sides.
///
/// Falls back to the unpadded range when padding would leave the finite
/// `f64` domain.
fn padded_range(min: f64, max: f64) -> Range<f64> {
    let padding = (max - min) * 0.05;
    let (lo, hi) = (min - padding, max + padding);
    if lo.is_finite() && hi.is_finite() {
        lo..hi
    } else {
        min..max
    }
}

/// Compute the bounds (min/max) over the finite points of all lines.
fn compute_bounds(lines: &[LabeledSeries]) -> (f64, f64, f64, f64) {
    let mut x_min = f64::MAX;
    let mut x_max = f64::MIN;
    let mut y_min = f64::MAX;
    let mut y_max = f64::MIN;

    for (x, y) in lines.iter().flat_map(|l| l.series.points()) {
        if !x.is_finite() || !y.is_finite() {
            continue;
        }
        if x < x_min { x_min = x; }
        if x > x_max { x_max = x; }
        if y < y_min { y_min = y; }
        if y > y_max { y_max = y; }
    }

    if x_min > x_max {
        x_min = 0.0;
        x_max = 0.0;
    }
    if y_min > y_max {
        y_min = 0.0;
        y_max = 0.0;
    }

    if (x_max - x_min).abs() < f64::EPSILON {
        x_min -= 1.0;
        x_max += 1.0;
    }
    if (y_max - y_min).abs() < f64::EPSILON {
        y_min -= 1.0;
        y_max += 1.0;
    }

    (x_min, x_max, y_min, y_max)
}
