//! Raster figure rendering.
//!
//! A [`Figure`] is the description a script builds up (series, titles,
//! canvas size); nothing is drawn until the capture pass rasterizes it to a
//! PNG and embeds it as a data URI.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use image::{Rgba, RgbaImage};

use crate::error::Result;

const MARGIN_LEFT: u32 = 48;
const MARGIN_RIGHT: u32 = 16;
const MARGIN_TOP: u32 = 16;
const MARGIN_BOTTOM: u32 = 32;

const BACKGROUND: Rgba<u8> = Rgba([255, 255, 255, 255]);
const FRAME: Rgba<u8> = Rgba([96, 96, 96, 255]);
const GRID: Rgba<u8> = Rgba([224, 224, 224, 255]);

/// Series color cycle.
const PALETTE: [Rgba<u8>; 6] = [
    Rgba([31, 119, 180, 255]),
    Rgba([255, 127, 14, 255]),
    Rgba([44, 160, 44, 255]),
    Rgba([214, 39, 40, 255]),
    Rgba([148, 103, 189, 255]),
    Rgba([127, 127, 127, 255]),
];

/// How a data series is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeriesKind {
    Line,
    Scatter,
    Bar,
}

/// One plotted series.
#[derive(Debug, Clone)]
pub struct PlotSeries {
    pub kind: SeriesKind,
    pub label: String,
    pub xs: Vec<f64>,
    pub ys: Vec<f64>,
}

/// A latent raster figure built by session code.
#[derive(Debug, Clone)]
pub struct Figure {
    pub series: Vec<PlotSeries>,
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub width: u32,
    pub height: u32,
}

impl Default for Figure {
    fn default() -> Self {
        Self {
            series: Vec::new(),
            title: String::new(),
            x_label: String::new(),
            y_label: String::new(),
            width: 640,
            height: 480,
        }
    }
}

impl Figure {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when nothing has been plotted yet.
    pub fn is_empty(&self) -> bool {
        self.series.iter().all(|s| s.ys.is_empty())
    }

    /// Rasterize to PNG bytes.
    pub fn render_png(&self) -> Result<Vec<u8>> {
        let mut img = RgbaImage::from_pixel(self.width, self.height, BACKGROUND);

        let plot_left = MARGIN_LEFT;
        let plot_right = self.width.saturating_sub(MARGIN_RIGHT);
        let plot_top = MARGIN_TOP;
        let plot_bottom = self.height.saturating_sub(MARGIN_BOTTOM);

        let (x_min, x_max) = padded_bounds(self.series.iter().flat_map(|s| s.xs.iter().copied()));
        let (y_min, y_max) = padded_bounds(self.series.iter().flat_map(|s| s.ys.iter().copied()));

        let to_px = |x: f64, y: f64| -> (i64, i64) {
            let fx = (x - x_min) / (x_max - x_min);
            let fy = (y - y_min) / (y_max - y_min);
            let px = plot_left as f64 + fx * (plot_right - plot_left) as f64;
            let py = plot_bottom as f64 - fy * (plot_bottom - plot_top) as f64;
            (px.round() as i64, py.round() as i64)
        };

        // Grid lines, then the frame on top of them.
        for tick in 1u32..5 {
            let gx = plot_left + (plot_right - plot_left) * tick / 5;
            let gy = plot_top + (plot_bottom - plot_top) * tick / 5;
            draw_line(&mut img, gx as i64, plot_top as i64, gx as i64, plot_bottom as i64, GRID);
            draw_line(&mut img, plot_left as i64, gy as i64, plot_right as i64, gy as i64, GRID);
        }
        draw_rect_outline(&mut img, plot_left, plot_top, plot_right, plot_bottom, FRAME);

        for (index, series) in self.series.iter().enumerate() {
            let color = PALETTE[index % PALETTE.len()];
            match series.kind {
                SeriesKind::Line => {
                    let points = series.xs.len().min(series.ys.len());
                    for i in 1..points {
                        let (x0, y0) = to_px(series.xs[i - 1], series.ys[i - 1]);
                        let (x1, y1) = to_px(series.xs[i], series.ys[i]);
                        draw_line(&mut img, x0, y0, x1, y1, color);
                    }
                }
                SeriesKind::Scatter => {
                    for (&x, &y) in series.xs.iter().zip(&series.ys) {
                        let (px, py) = to_px(x, y);
                        draw_disc(&mut img, px, py, 3, color);
                    }
                }
                SeriesKind::Bar => {
                    let n = series.ys.len().max(1) as f64;
                    let slot = (plot_right - plot_left) as f64 / n;
                    let bar_w = (slot * 0.6).max(1.0) as i64;
                    let (_, base_y) = to_px(x_min, y_min.max(0.0).min(y_max));
                    for (i, &y) in series.ys.iter().enumerate() {
                        let cx = plot_left as f64 + slot * (i as f64 + 0.5);
                        let (_, top_y) = to_px(x_min, y);
                        fill_rect(
                            &mut img,
                            cx as i64 - bar_w / 2,
                            top_y.min(base_y),
                            cx as i64 + bar_w / 2,
                            top_y.max(base_y),
                            color,
                        );
                    }
                }
            }
        }

        let mut png = Vec::new();
        use image::ImageEncoder;
        image::codecs::png::PngEncoder::new(&mut png).write_image(
            img.as_raw(),
            self.width,
            self.height,
            image::ExtendedColorType::Rgba8,
        )?;
        Ok(png)
    }

    /// Rasterize and wrap into embeddable `<img>` markup.
    pub fn to_markup(&self) -> Result<String> {
        let png = self.render_png()?;
        Ok(format!(
            "<img src=\"data:image/png;base64,{}\">",
            STANDARD.encode(&png)
        ))
    }
}

/// Data bounds with 5% padding; degenerate ranges widen to ±1.
fn padded_bounds(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for v in values.filter(|v| v.is_finite()) {
        min = min.min(v);
        max = max.max(v);
    }
    if !min.is_finite() || !max.is_finite() {
        return (0.0, 1.0);
    }
    if (max - min).abs() < f64::EPSILON {
        return (min - 1.0, max + 1.0);
    }
    let pad = (max - min) * 0.05;
    (min - pad, max + pad)
}

fn put_pixel_checked(img: &mut RgbaImage, x: i64, y: i64, color: Rgba<u8>) {
    if x >= 0 && y >= 0 && (x as u32) < img.width() && (y as u32) < img.height() {
        img.put_pixel(x as u32, y as u32, color);
    }
}

fn draw_line(img: &mut RgbaImage, x0: i64, y0: i64, x1: i64, y1: i64, color: Rgba<u8>) {
    let dx = x1 - x0;
    let dy = y1 - y0;
    let steps = dx.abs().max(dy.abs()).max(1);
    for step in 0..=steps {
        let x = x0 + dx * step / steps;
        let y = y0 + dy * step / steps;
        put_pixel_checked(img, x, y, color);
    }
}

fn draw_disc(img: &mut RgbaImage, cx: i64, cy: i64, radius: i64, color: Rgba<u8>) {
    for y in -radius..=radius {
        for x in -radius..=radius {
            if x * x + y * y <= radius * radius {
                put_pixel_checked(img, cx + x, cy + y, color);
            }
        }
    }
}

fn fill_rect(img: &mut RgbaImage, x0: i64, y0: i64, x1: i64, y1: i64, color: Rgba<u8>) {
    for y in y0..=y1 {
        for x in x0..=x1 {
            put_pixel_checked(img, x, y, color);
        }
    }
}

fn draw_rect_outline(img: &mut RgbaImage, x0: u32, y0: u32, x1: u32, y1: u32, color: Rgba<u8>) {
    draw_line(img, x0 as i64, y0 as i64, x1 as i64, y0 as i64, color);
    draw_line(img, x0 as i64, y1 as i64, x1 as i64, y1 as i64, color);
    draw_line(img, x0 as i64, y0 as i64, x0 as i64, y1 as i64, color);
    draw_line(img, x1 as i64, y0 as i64, x1 as i64, y1 as i64, color);
}
