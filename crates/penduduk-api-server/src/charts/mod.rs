//! Dashboard chart images, rasterised straight into PNG files.
//!
//! Each chart carries a title, axis captions and per-entry labels drawn
//! with the bitmap glyphs in [`font`]. Pie slices are listed in a legend
//! with their share of the total.

pub mod font;

use image::{ImageFormat, Rgb, RgbImage};
use std::f32::consts::PI;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

use font::{draw_text, fit, text_width, ADVANCE, GLYPH_H};

const WIDTH: u32 = 640;
const HEIGHT: u32 = 400;
const LEFT: u32 = 48;
const RIGHT: u32 = 20;
const TOP: u32 = 44;
const BOTTOM: u32 = 44;
const TITLE_SCALE: u32 = 2;
const LEGEND_ROW: u32 = 16;

const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);
const AXIS: Rgb<u8> = Rgb([60, 60, 60]);
const INK: Rgb<u8> = Rgb([20, 20, 20]);
const PALETTE: [Rgb<u8>; 8] = [
    Rgb([31, 119, 180]),
    Rgb([255, 127, 14]),
    Rgb([44, 160, 44]),
    Rgb([214, 39, 40]),
    Rgb([148, 103, 189]),
    Rgb([140, 86, 75]),
    Rgb([227, 119, 194]),
    Rgb([127, 127, 127]),
];

pub const POPULATION_CHART: &str = "chart_penduduk_dusun.png";
pub const RELIGION_CHART: &str = "chart_agama.png";
pub const EDUCATION_CHART: &str = "chart_pendidikan.png";
pub const GROWTH_CHART: &str = "chart_pertumbuhan.png";

/// Every file name the dashboard may produce.
pub const CHART_NAMES: [&str; 4] = [POPULATION_CHART, RELIGION_CHART, EDUCATION_CHART, GROWTH_CHART];

#[derive(Debug, Error)]
pub enum ChartError {
    #[error("image: {0}")]
    Image(#[from] image::ImageError),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

/// A labelled value.
pub type Series = [(String, i64)];

/// Text printed around the plot. Pies only use the title.
#[derive(Debug, Clone, Copy, Default)]
pub struct Captions<'a> {
    pub title: &'a str,
    pub x_axis: &'a str,
    pub y_axis: &'a str,
}

/// Delete every `chart_*` file in `dir`. Individual failures are logged.
pub fn clear_previous(dir: &Path) -> Result<usize, ChartError> {
    let mut removed = 0;
    if !dir.exists() {
        return Ok(0);
    }
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name();
        if name.to_string_lossy().starts_with("chart_") {
            match std::fs::remove_file(entry.path()) {
                Ok(()) => removed += 1,
                Err(e) => warn!("Cannot remove {}: {}", entry.path().display(), e),
            }
        }
    }
    debug!("Removed {} stale chart files", removed);
    Ok(removed)
}

/// `"LABEL 42%"`, the share rounded to a whole percent.
pub fn legend_entry(label: &str, value: i64, total: i64) -> String {
    let pct = if total > 0 {
        (value.max(0) * 100 + total / 2) / total
    } else {
        0
    };
    format!("{} {}%", label, pct)
}

fn canvas(captions: &Captions<'_>) -> RgbImage {
    let mut img = RgbImage::from_pixel(WIDTH, HEIGHT, BACKGROUND);
    let title = fit(captions.title, WIDTH - 8, TITLE_SCALE);
    let x = WIDTH.saturating_sub(text_width(&title, TITLE_SCALE)) / 2;
    draw_text(&mut img, x, 6, &title, TITLE_SCALE, INK);
    img
}

fn fill_rect(img: &mut RgbImage, x0: u32, y0: u32, x1: u32, y1: u32, color: Rgb<u8>) {
    for x in x0.min(WIDTH)..x1.min(WIDTH) {
        for y in y0.min(HEIGHT)..y1.min(HEIGHT) {
            img.put_pixel(x, y, color);
        }
    }
}

fn draw_centered(img: &mut RgbImage, center_x: u32, y: u32, text: &str) {
    let x = center_x.saturating_sub(text_width(text, 1) / 2);
    draw_text(img, x, y, text, 1, INK);
}

/// Axes with the y range at the left end and the captions beside each axis.
fn draw_axes(img: &mut RgbImage, captions: &Captions<'_>, max: i64) {
    let base = HEIGHT - BOTTOM;
    fill_rect(img, LEFT, TOP, LEFT + 2, base, AXIS);
    fill_rect(img, LEFT, base, WIDTH - RIGHT, base + 2, AXIS);

    draw_text(img, 4, TOP - 14, &fit(captions.y_axis, WIDTH / 2, 1), 1, INK);
    let x_axis = fit(captions.x_axis, WIDTH - 8, 1);
    draw_centered(img, (LEFT + WIDTH - RIGHT) / 2, HEIGHT - 12, &x_axis);

    for (value, y) in [(max, TOP), (0, base - GLYPH_H)] {
        let text = value.to_string();
        let x = (LEFT - 4).saturating_sub(text_width(&text, 1));
        draw_text(img, x, y, &text, 1, INK);
    }
}

/// Bresenham line, `thickness` pixels wide.
fn draw_line(img: &mut RgbImage, from: (i32, i32), to: (i32, i32), color: Rgb<u8>, thickness: i32) {
    let (mut x0, mut y0) = from;
    let (x1, y1) = to;
    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;
    loop {
        for ox in 0..thickness {
            for oy in 0..thickness {
                let (px, py) = (x0 + ox, y0 + oy);
                if px >= 0 && py >= 0 && (px as u32) < WIDTH && (py as u32) < HEIGHT {
                    img.put_pixel(px as u32, py as u32, color);
                }
            }
        }
        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}

fn save(img: &RgbImage, dir: &Path, name: &str) -> Result<PathBuf, ChartError> {
    let path = dir.join(name);
    img.save_with_format(&path, ImageFormat::Png)?;
    Ok(path)
}

/// Vertical bars, one per entry, all in `color_index` of the palette.
/// Values sit above the bars and labels below, each only when it fits
/// the bar's slot.
pub fn bar_chart(
    dir: &Path,
    name: &str,
    captions: &Captions<'_>,
    series: &Series,
    color_index: usize,
) -> Result<PathBuf, ChartError> {
    let max = series.iter().map(|(_, v)| *v).max().unwrap_or(0).max(0);
    let mut img = canvas(captions);
    draw_axes(&mut img, captions, max);

    if max > 0 {
        let plot_w = WIDTH - LEFT - RIGHT - 2;
        let plot_h = HEIGHT - TOP - BOTTOM - 12;
        let slot = plot_w / series.len() as u32;
        let bar_w = (slot * 2 / 3).max(1);
        let color = PALETTE[color_index % PALETTE.len()];
        let base = HEIGHT - BOTTOM;
        for (i, (label, value)) in series.iter().enumerate() {
            let h = ((*value).max(0) as f32 / max as f32 * plot_h as f32) as u32;
            let left = LEFT + 2 + i as u32 * slot;
            let x0 = left + slot.saturating_sub(bar_w) / 2;
            fill_rect(&mut img, x0, base - h, x0 + bar_w, base, color);

            let center = left + slot / 2;
            let room = slot.saturating_sub(2);
            let amount = value.to_string();
            if text_width(&amount, 1) <= room {
                draw_centered(&mut img, center, base - h - GLYPH_H - 3, &amount);
            }
            let caption = fit(label, room, 1);
            if !caption.is_empty() {
                draw_centered(&mut img, center, base + 6, &caption);
            }
        }
    }
    save(&img, dir, name)
}

/// Pie with one palette colour per slice, clockwise from 12 o'clock, and
/// a legend listing each slice's percentage.
pub fn pie_chart(dir: &Path, name: &str, captions: &Captions<'_>, series: &Series) -> Result<PathBuf, ChartError> {
    let mut img = canvas(captions);
    let total: i64 = series.iter().map(|(_, v)| (*v).max(0)).sum();
    if total > 0 {
        let mut bounds = Vec::with_capacity(series.len());
        let mut acc = 0.0f32;
        for (_, value) in series {
            acc += (*value).max(0) as f32 / total as f32;
            bounds.push(acc);
        }

        let radius = (HEIGHT - TOP - 16) / 2;
        let (cx, cy) = (20 + radius, TOP + 4 + radius);
        let r = radius as f32;
        for y in cy - radius..=cy + radius {
            for x in cx - radius..=cx + radius {
                let dx = x as f32 - cx as f32;
                let dy = y as f32 - cy as f32;
                if dx * dx + dy * dy > r * r {
                    continue;
                }
                // 0 at the top, growing clockwise
                let angle = dx.atan2(-dy);
                let fraction = if angle < 0.0 { angle + 2.0 * PI } else { angle } / (2.0 * PI);
                let slice = bounds
                    .iter()
                    .position(|b| fraction <= *b)
                    .unwrap_or(series.len() - 1);
                img.put_pixel(x, y, PALETTE[slice % PALETTE.len()]);
            }
        }

        let legend_x = cx + radius + 40;
        let text_x = legend_x + 16;
        let room = WIDTH - text_x - 4;
        let rows = ((HEIGHT - TOP - 10) / LEGEND_ROW) as usize;
        for (i, (label, value)) in series.iter().enumerate() {
            let y = TOP + 10 + i as u32 * LEGEND_ROW;
            if i + 1 == rows && series.len() > rows {
                draw_text(&mut img, text_x, y, &format!("+{} LAINNYA", series.len() - i), 1, INK);
                break;
            }
            fill_rect(&mut img, legend_x, y, legend_x + 10, y + 10, PALETTE[i % PALETTE.len()]);
            let suffix = legend_entry("", *value, total);
            let head = fit(label, room.saturating_sub(text_width(&suffix, 1)), 1);
            draw_text(&mut img, text_x, y + 1, &format!("{}{}", head, suffix), 1, INK);
        }
    }
    save(&img, dir, name)
}

/// Polyline through the values with square markers. Point labels are
/// thinned out so neighbours do not overlap.
pub fn line_chart(
    dir: &Path,
    name: &str,
    captions: &Captions<'_>,
    series: &Series,
) -> Result<PathBuf, ChartError> {
    let max = series.iter().map(|(_, v)| *v).max().unwrap_or(0).max(0);
    let mut img = canvas(captions);
    draw_axes(&mut img, captions, max);

    if max > 0 {
        let plot_w = (WIDTH - LEFT - RIGHT - 12) as f32;
        let plot_h = (HEIGHT - TOP - BOTTOM - 12) as f32;
        let step = if series.len() > 1 {
            plot_w / (series.len() - 1) as f32
        } else {
            0.0
        };
        let points: Vec<(i32, i32)> = series
            .iter()
            .enumerate()
            .map(|(i, (_, v))| {
                let x = LEFT as f32 + 6.0 + i as f32 * step;
                let y = (HEIGHT - BOTTOM) as f32 - (*v).max(0) as f32 / max as f32 * plot_h;
                (x.min((WIDTH - 4) as f32) as i32, y as i32)
            })
            .collect();
        let color = PALETTE[0];
        for pair in points.windows(2) {
            draw_line(&mut img, pair[0], pair[1], color, 2);
        }

        let widest = series
            .iter()
            .map(|(l, _)| text_width(l, 1))
            .max()
            .unwrap_or(0)
            + ADVANCE;
        let every = if step > 0.0 {
            ((widest as f32 / step).ceil() as usize).max(1)
        } else {
            1
        };
        for (i, ((label, value), (x, y))) in series.iter().zip(&points).enumerate() {
            let (px, py) = ((*x - 3).max(0) as u32, (*y - 3).max(0) as u32);
            fill_rect(&mut img, px, py, px + 7, py + 7, PALETTE[3]);
            if i % every == 0 {
                let center = *x as u32;
                draw_centered(&mut img, center, HEIGHT - BOTTOM + 6, label);
                draw_centered(&mut img, center, py.saturating_sub(GLYPH_H + 3), &value.to_string());
            }
        }
    }
    save(&img, dir, name)
}
