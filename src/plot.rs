//! Heatmap rendering
//!
//! The grid is drawn one solid rectangle per cell (nearest neighbor, no
//! smoothing) with row 0 at the top. A color legend sits to the right.
//! The figure is rasterized in memory, optionally cropped to its content
//! and written as a PNG that records the requested resolution.

use crate::colormap::{ColorScale, Normalizer};
use crate::error::*;
use crate::grid::TemperatureGrid;
use image::RgbImage;
use log::{debug, info, warn};
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use std::path::{Path, PathBuf};

const FONT: &str = "sans-serif";
const LEGEND_STEPS: usize = 256;
const MAX_SIDE_PX: u32 = 20_000;
const BACKGROUND: [u8; 3] = [255, 255, 255];

#[derive(Debug, Clone, PartialEq)]
pub struct RenderOptions {
    /// Dots per inch, fixes both pixel size and the PNG metadata.
    pub dpi: u32,
    /// Figure size in inches (width, height).
    pub figure_inches: (f64, f64),
    /// Crop background-only margins.
    pub tight: bool,
    /// Padding kept around the content when cropping.
    pub pad_inches: f64,
    pub color_scale: ColorScale,
}

impl Default for RenderOptions {
    fn default() -> Self {
        RenderOptions {
            dpi: 300,
            figure_inches: (8.0, 6.0),
            tight: true,
            pad_inches: 0.1,
            color_scale: ColorScale::Hot,
        }
    }
}

impl RenderOptions {
    pub fn validate(&self) -> Result<()> {
        let (w, h) = self.figure_inches;
        if self.dpi == 0 || !(w > 0.0 && h > 0.0) {
            return Err(Error::InvalidConfig(
                "dpi and figure size must be positive".to_string(),
            ));
        }
        let (wp, hp) = self.pixel_size();
        if wp > MAX_SIDE_PX || hp > MAX_SIDE_PX {
            return Err(Error::InvalidConfig(format!(
                "figure of {wp} x {hp} pixels exceeds {MAX_SIDE_PX} per side"
            )));
        }
        if !(self.pad_inches >= 0.0) {
            return Err(Error::InvalidConfig(
                "padding must not be negative".to_string(),
            ));
        }
        Ok(())
    }

    /// Figure size in pixels before cropping.
    pub fn pixel_size(&self) -> (u32, u32) {
        let dpi = self.dpi as f64;
        (
            (self.figure_inches.0 * dpi).round() as u32,
            (self.figure_inches.1 * dpi).round() as u32,
        )
    }

    /// Convert a typographic point size to pixels.
    fn points(&self, pt: f64) -> u32 {
        ((pt * self.dpi as f64 / 72.0).round() as u32).max(1)
    }
}

/// A heatmap written to disk.
#[derive(Debug, Clone, PartialEq)]
pub struct PlotArtifact {
    pub path: PathBuf,
    pub dpi: u32,
    pub width_px: u32,
    pub height_px: u32,
    pub tight: bool,
}

fn render_err<E: std::fmt::Display>(e: E) -> Error {
    Error::RenderFailed(e.to_string())
}

/// Legend range, widened when the grid is constant.
fn legend_range(min: f64, max: f64) -> (f64, f64) {
    if max - min > f64::EPSILON * min.abs().max(1.0) {
        (min, max)
    } else {
        (min - 0.5, max + 0.5)
    }
}

fn tick_decimals(span: f64) -> usize {
    if span >= 10.0 {
        0
    } else if span >= 1.0 {
        1
    } else {
        3
    }
}

/// Cell index at tick value `v` when it falls on a cell center.
fn cell_index(v: f64, cells: usize) -> Option<usize> {
    let r = v.round();
    if (v - r).abs() > 1e-6 || r < 0.0 || r >= cells as f64 {
        return None;
    }
    Some(r as usize)
}

fn column_label(x: f64, cols: usize) -> String {
    cell_index(x, cols).map_or_else(String::new, |c| c.to_string())
}

/// Rows are drawn top down, so the y axis counts from the top.
fn row_label(y: f64, rows: usize) -> String {
    cell_index(y, rows).map_or_else(String::new, |i| (rows - 1 - i).to_string())
}

/// One pixel outline along the inside of `area`.
fn draw_frame<DB: DrawingBackend>(
    area: &DrawingArea<DB, plotters::coord::Shift>,
) -> Result<()>
where
    DB::ErrorType: 'static,
{
    let (w, h) = area.dim_in_pixel();
    let corner = (w as i32 - 1, h as i32 - 1);
    area.draw(&Rectangle::new([(0, 0), corner], BLACK.stroke_width(1)))
        .map_err(render_err)
}

/// Pixel geometry of the figure.
struct Layout {
    title_h: u32,
    title_px: u32,
    label_px: u32,
    margin: u32,
    x_area: u32,
    y_area: u32,
    plot_w: u32,
    plot_h: u32,
    legend_w: u32,
}

impl Layout {
    /// Fit the heatmap into the figure keeping square cells.
    fn new(rows: usize, cols: usize, options: &RenderOptions) -> Self {
        let (width, height) = options.pixel_size();
        let title_px = options.points(12.0);
        let label_px = options.points(10.0);
        let margin = options.points(6.0);
        let title_h = title_px * 2;
        let x_area = label_px * 3;
        let y_area = label_px * 4;
        let legend_w = margin * 2 + options.points(14.0) + label_px * 5;

        let avail_w = width
            .saturating_sub(legend_w + y_area + 2 * margin)
            .max(1);
        let avail_h = height
            .saturating_sub(title_h + x_area + 2 * margin)
            .max(1);
        let scale = (avail_w as f64 / cols as f64).min(avail_h as f64 / rows as f64);
        let inner_w = ((cols as f64 * scale).round() as u32).max(1);
        let inner_h = ((rows as f64 * scale).round() as u32).max(1);

        Layout {
            title_h,
            title_px,
            label_px,
            margin,
            x_area,
            y_area,
            plot_w: inner_w + y_area + 2 * margin,
            plot_h: inner_h + x_area + 2 * margin,
            legend_w,
        }
    }
}

fn draw_figure<DB: DrawingBackend>(
    root: &DrawingArea<DB, plotters::coord::Shift>,
    grid: &TemperatureGrid,
    title: &str,
    options: &RenderOptions,
) -> Result<()>
where
    DB::ErrorType: 'static,
{
    let (min, max) = grid
        .range()
        .ok_or_else(|| Error::RenderFailed("grid has no finite values".to_string()))?;
    let norm = Normalizer::new(min, max);
    let scale = options.color_scale;
    let (rows, cols) = grid.shape();
    let layout = Layout::new(grid.rows(), grid.cols(), options);

    root.fill(&WHITE).map_err(render_err)?;

    let title_area = root
        .clone()
        .shrink((0, 0), (layout.plot_w as i32, layout.title_h as i32));
    let plot_area = root.clone().shrink(
        (0, layout.title_h as i32),
        (layout.plot_w as i32, layout.plot_h as i32),
    );
    let legend_area = root.clone().shrink(
        (layout.plot_w as i32, layout.title_h as i32),
        (layout.legend_w as i32, layout.plot_h as i32),
    );

    // Heatmap
    let mut chart = ChartBuilder::on(&plot_area)
        .margin(layout.margin)
        .x_label_area_size(layout.x_area)
        .y_label_area_size(layout.y_area)
        .build_cartesian_2d(-0.5..cols as f64 - 0.5, -0.5..rows as f64 - 0.5)
        .map_err(render_err)?;

    // Cell (r, c) is centered on (c, rows - 1 - r).
    chart
        .draw_series((0..rows).flat_map(|r| {
            (0..cols).map(move |c| {
                let [red, green, blue] = norm.color(scale, grid.get(r, c));
                let x = c as f64;
                let y = (rows - 1 - r) as f64;
                Rectangle::new(
                    [(x - 0.5, y - 0.5), (x + 0.5, y + 0.5)],
                    RGBColor(red, green, blue).filled(),
                )
            })
        }))
        .map_err(render_err)?;
    draw_frame(&chart.plotting_area().strip_coord_spec())?;

    let x_label = |x: &f64| column_label(*x, cols);
    let y_label = |y: &f64| row_label(*y, rows);
    let labels = chart
        .configure_mesh()
        .disable_mesh()
        .x_labels(cols.min(10))
        .y_labels(rows.min(10))
        .x_desc("Grid Column")
        .y_desc("Grid Row")
        .x_label_formatter(&x_label)
        .y_label_formatter(&y_label)
        .label_style((FONT, layout.label_px as f64))
        .axis_desc_style((FONT, layout.label_px as f64))
        .draw();
    if let Err(e) = labels {
        warn!("Axis labels skipped: {}", e);
    }

    // Legend
    let (lo, hi) = legend_range(min, max);
    let decimals = tick_decimals(hi - lo);
    let mut legend = ChartBuilder::on(&legend_area)
        .margin(layout.margin)
        .margin_bottom(layout.margin + layout.x_area)
        .right_y_label_area_size(layout.label_px * 5)
        .build_cartesian_2d(0.0..1.0, lo..hi)
        .map_err(render_err)?;

    let step = (hi - lo) / LEGEND_STEPS as f64;
    legend
        .draw_series((0..LEGEND_STEPS).map(|i| {
            let v0 = lo + step * i as f64;
            let v1 = v0 + step;
            let [red, green, blue] = norm.color(scale, 0.5 * (v0 + v1));
            Rectangle::new([(0.0, v0), (1.0, v1)], RGBColor(red, green, blue).filled())
        }))
        .map_err(render_err)?;
    draw_frame(&legend.plotting_area().strip_coord_spec())?;

    let value_label = |v: &f64| format!("{v:.decimals$}");
    let legend_labels = legend
        .configure_mesh()
        .disable_mesh()
        .disable_x_axis()
        .y_desc("Temperature")
        .y_label_formatter(&value_label)
        .label_style((FONT, layout.label_px as f64))
        .axis_desc_style((FONT, layout.label_px as f64))
        .draw();
    if let Err(e) = legend_labels {
        warn!("Legend labels skipped: {}", e);
    }

    let title_style: TextStyle = (FONT, layout.title_px as f64).into();
    let title_style = title_style.pos(Pos::new(HPos::Center, VPos::Center));
    let title_x = (layout.margin + layout.y_area) as i32
        + (layout.plot_w - layout.y_area - 2 * layout.margin) as i32 / 2;
    if let Err(e) = title_area.draw_text(
        title,
        &title_style,
        (title_x, layout.title_h as i32 / 2),
    ) {
        warn!("Title skipped: {}", e);
    }

    Ok(())
}

/// Bounding box of non-background pixels, grown by `pad` and clamped to
/// the image. `None` when the image is blank.
pub fn content_bounds(img: &RgbImage, pad: u32) -> Option<(u32, u32, u32, u32)> {
    let mut min_x = u32::MAX;
    let mut min_y = u32::MAX;
    let mut max_x = 0;
    let mut max_y = 0;
    for (x, y, p) in img.enumerate_pixels() {
        if p.0 != BACKGROUND {
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);
        }
    }
    if min_x > max_x {
        return None;
    }
    let x0 = min_x.saturating_sub(pad);
    let y0 = min_y.saturating_sub(pad);
    let x1 = (max_x + pad).min(img.width() - 1);
    let y1 = (max_y + pad).min(img.height() - 1);
    Some((x0, y0, x1 - x0 + 1, y1 - y0 + 1))
}

fn crop_tight(img: RgbImage, pad: u32) -> RgbImage {
    match content_bounds(&img, pad) {
        Some((x, y, w, h)) => image::imageops::crop_imm(&img, x, y, w, h).to_image(),
        None => img,
    }
}

fn write_png(img: &RgbImage, path: &Path, dpi: u32) -> Result<()> {
    let file = std::fs::File::create(path)
        .map_err(|e| Error::RenderFailed(format!("creating {path:?}: {e}")))?;
    let mut encoder =
        png::Encoder::new(std::io::BufWriter::new(file), img.width(), img.height());
    encoder.set_color(png::ColorType::Rgb);
    encoder.set_depth(png::BitDepth::Eight);
    let per_meter = (dpi as f64 / 0.0254).round() as u32;
    encoder.set_pixel_dims(Some(png::PixelDimensions {
        xppu: per_meter,
        yppu: per_meter,
        unit: png::Unit::Meter,
    }));
    let mut writer = encoder.write_header().map_err(render_err)?;
    writer.write_image_data(img.as_raw()).map_err(render_err)?;
    writer.finish().map_err(render_err)
}

/// Render `grid` as a heatmap titled `title` and write it to `output_path`.
pub fn render<P: AsRef<Path>>(
    grid: &TemperatureGrid,
    title: &str,
    output_path: &P,
    options: &RenderOptions,
) -> Result<PlotArtifact> {
    profiling::scope!("plot::render");
    let path = output_path.as_ref();
    if grid.is_empty() {
        return Err(Error::RenderFailed("grid is empty".to_string()));
    }
    options.validate()?;

    let (width, height) = options.pixel_size();
    debug!(
        "Rendering {} x {} grid on {} x {} px",
        grid.rows(),
        grid.cols(),
        width,
        height
    );
    let mut buffer = vec![0u8; width as usize * height as usize * 3];
    {
        let root = BitMapBackend::with_buffer(&mut buffer, (width, height))
            .into_drawing_area();
        draw_figure(&root, grid, title, options)?;
        root.present().map_err(render_err)?;
    }
    let mut img = RgbImage::from_raw(width, height, buffer).ok_or_else(|| {
        Error::RenderFailed("pixel buffer does not match figure size".to_string())
    })?;
    if options.tight {
        let pad = (options.pad_inches * options.dpi as f64).round() as u32;
        img = crop_tight(img, pad);
    }

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| {
                Error::RenderFailed(format!("creating {parent:?}: {e}"))
            })?;
        }
    }
    write_png(&img, path, options.dpi)?;
    info!("Plot saved: {:?} ({} x {} px)", path, img.width(), img.height());

    Ok(PlotArtifact {
        path: path.to_path_buf(),
        dpi: options.dpi,
        width_px: img.width(),
        height_px: img.height(),
        tight: options.tight,
    })
}
