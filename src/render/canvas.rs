//! Map canvas: frame layout, raster layers, overlays and decorations
//!
//! The plot frame keeps the Mercator aspect ratio of the data box and sits
//! between a title band, graticule label margins and a colorbar on the right.

use super::colormap::{ColorScale, LevelScale};
use super::mercator::Mercator;
use super::text::{Anchor, TextRenderer};
use crate::errors::{Result, Ww3VisError};
use crate::interpolate::RegularGrid;
use crate::stations::Station;
use image::{Rgba, RgbaImage};
use imageproc::drawing::{
    draw_filled_circle_mut, draw_hollow_circle_mut, draw_hollow_rect_mut, draw_line_segment_mut,
    Blend,
};
use imageproc::rect::Rect;
use ndarray::Array2;
use rayon::prelude::*;
use std::path::Path;
use tracing::{debug, warn};

pub const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
pub const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);
const GRID_LINE: Rgba<u8> = Rgba([60, 60, 60, 255]);

const MARGIN_TOP: u32 = 56;
const MARGIN_BOTTOM: u32 = 46;
const MARGIN_LEFT: u32 = 78;
const MARGIN_RIGHT: u32 = 118;
const COLORBAR_GAP: u32 = 18;
const COLORBAR_WIDTH: u32 = 22;
const TITLE_SIZE: f32 = 20.0;
const LABEL_SIZE: f32 = 14.0;
/// Graticules denser than this are skipped as unreadable
const MAX_GRID_LINES: usize = 400;

/// Pixel rectangle of the map frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Frame {
    pub fn contains(&self, px: f64, py: f64) -> bool {
        px >= self.x as f64
            && py >= self.y as f64
            && px <= (self.x + self.width) as f64
            && py <= (self.y + self.height) as f64
    }
}

/// Anything that maps values onto colors along a colorbar
pub trait ColorKey {
    fn value_range(&self) -> (f64, f64);
    fn key_color(&self, value: f64) -> Option<Rgba<u8>>;
}

impl ColorKey for ColorScale {
    fn value_range(&self) -> (f64, f64) {
        (self.vmin, self.vmax)
    }

    fn key_color(&self, value: f64) -> Option<Rgba<u8>> {
        self.color(value)
    }
}

impl ColorKey for LevelScale {
    fn value_range(&self) -> (f64, f64) {
        self.range().unwrap_or((0.0, 1.0))
    }

    fn key_color(&self, value: f64) -> Option<Rgba<u8>> {
        self.color(value)
    }
}

/// Arrow overlay appearance
#[derive(Debug, Clone, Copy)]
pub struct QuiverStyle {
    /// Color including alpha; drawn with blending
    pub color: Rgba<u8>,
    /// Arrow length as a fraction of the spacing between drawn arrows
    pub length_fraction: f64,
    /// Head length as a fraction of the arrow length
    pub head_fraction: f64,
}

impl Default for QuiverStyle {
    fn default() -> Self {
        Self {
            color: Rgba([0, 0, 0, 179]),
            length_fraction: 0.8,
            head_fraction: 0.3,
        }
    }
}

/// Where graticule lines are counted from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GraticuleAnchor {
    /// Whole multiples of the step
    #[default]
    Multiples,
    /// The south-west corner of the map box
    BoxCorner,
}

/// `origin + k·step` for every integer `k` that lands inside `[lo, hi]`
pub fn graticule_lines(lo: f64, hi: f64, step: f64, origin: f64) -> Vec<f64> {
    if !(step > 0.0) || !lo.is_finite() || !hi.is_finite() || !origin.is_finite() {
        return Vec::new();
    }
    let first = ((lo - origin) / step - 1e-9).ceil() as i64;
    let last = ((hi - origin) / step + 1e-9).floor() as i64;
    if last < first {
        return Vec::new();
    }
    if (last - first) as usize > MAX_GRID_LINES {
        warn!(step, "Skipping graticule: too many lines for step");
        return Vec::new();
    }
    (first..=last).map(|k| origin + k as f64 * step).collect()
}

/// "Nice" tick values (1, 2, 5 × 10^k spacing) covering `[lo, hi]`
pub fn nice_ticks(lo: f64, hi: f64, target: usize) -> Vec<f64> {
    if !(hi > lo) || target == 0 {
        return vec![lo];
    }
    let raw = (hi - lo) / target as f64;
    let magnitude = 10f64.powf(raw.log10().floor());
    let step = [1.0, 2.0, 5.0, 10.0]
        .iter()
        .map(|m| m * magnitude)
        .find(|&s| s >= raw)
        .unwrap_or(10.0 * magnitude);

    let first = (lo / step).ceil() as i64;
    let last = (hi / step).floor() as i64;
    (first..=last).map(|k| k as f64 * step).collect()
}

/// Decimal places needed to print multiples of `step`
pub fn decimals_for(step: f64) -> usize {
    let mut decimals = 0;
    let mut scaled = step.abs();
    while decimals < 6 && (scaled - scaled.round()).abs() > 1e-9 {
        scaled *= 10.0;
        decimals += 1;
    }
    decimals
}

/// `75.5°W`-style label
pub fn format_degrees(value: f64, decimals: usize, positive: char, negative: char) -> String {
    let magnitude = format!("{:.*}", decimals, value.abs());
    // Rounds to zero: no hemisphere letter
    if magnitude.chars().all(|c| c == '0' || c == '.') {
        return format!("{magnitude}°");
    }
    let hemisphere = if value > 0.0 { positive } else { negative };
    format!("{magnitude}°{hemisphere}")
}

/// An image with a projected map frame
pub struct MapCanvas {
    image: RgbaImage,
    frame: Frame,
    projection: Mercator,
    text: TextRenderer,
}

impl MapCanvas {
    /// Lay out a `width` × `height` image for the box `(lon_min, lon_max, lat_min, lat_max)`
    pub fn new(width: u32, height: u32, bounds: (f64, f64, f64, f64)) -> Result<Self> {
        let avail_w = width.saturating_sub(MARGIN_LEFT + MARGIN_RIGHT);
        let avail_h = height.saturating_sub(MARGIN_TOP + MARGIN_BOTTOM);
        if avail_w < 16 || avail_h < 16 {
            return Err(Ww3VisError::Generic(format!(
                "image size {width}x{height} leaves no room for the map"
            )));
        }

        let (lon_min, lon_max, lat_min, lat_max) = bounds;
        let projection = Mercator::new(lon_min, lon_max, lat_min, lat_max);
        let aspect = projection.aspect();

        let (fw, fh) = if (avail_h as f64) / (avail_w as f64) > aspect {
            (avail_w, ((avail_w as f64) * aspect).round().max(1.0) as u32)
        } else {
            (((avail_h as f64) / aspect).round().max(1.0) as u32, avail_h)
        };
        let frame = Frame {
            x: MARGIN_LEFT + (avail_w - fw) / 2,
            y: MARGIN_TOP + (avail_h - fh) / 2,
            width: fw,
            height: fh,
        };

        Ok(Self {
            image: RgbaImage::from_pixel(width, height, WHITE),
            frame,
            projection,
            text: TextRenderer::new()?,
        })
    }

    pub fn frame(&self) -> Frame {
        self.frame
    }

    pub fn projection(&self) -> Mercator {
        self.projection
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn into_image(self) -> RgbaImage {
        self.image
    }

    /// Pixel position (fractional) of a geographic point
    pub fn to_pixel(&self, lon: f64, lat: f64) -> (f64, f64) {
        let (u, v) = self.projection.to_unit(lon, lat);
        (
            self.frame.x as f64 + u * self.frame.width as f64,
            self.frame.y as f64 + (1.0 - v) * self.frame.height as f64,
        )
    }

    /// Geographic position of the center of pixel `(px, py)`
    pub fn from_pixel(&self, px: u32, py: u32) -> (f64, f64) {
        pixel_to_lonlat(&self.frame, &self.projection, px, py)
    }

    /// One target node per frame pixel, rows ascending in latitude
    /// (row `j` is image row `frame.y + frame.height - 1 - j`)
    pub fn pixel_grid(&self) -> RegularGrid {
        let f = self.frame;
        let lons = (0..f.width)
            .map(|i| self.from_pixel(f.x + i, f.y).0)
            .collect();
        let lats = (0..f.height)
            .map(|j| self.from_pixel(f.x, f.y + f.height - 1 - j).1)
            .collect();
        RegularGrid { lons, lats }
    }

    /// Color every frame pixel from its geographic position; None leaves it untouched
    fn fill_frame<F>(&mut self, color_at: F)
    where
        F: Fn(u32, u32, f64, f64) -> Option<Rgba<u8>> + Sync,
    {
        let frame = self.frame;
        let projection = self.projection;
        let stride = self.image.width() as usize * 4;
        let buffer: &mut [u8] = &mut self.image;

        buffer
            .par_chunks_mut(stride)
            .enumerate()
            .skip(frame.y as usize)
            .take(frame.height as usize)
            .for_each(|(py, row)| {
                let py = py as u32;
                for px in frame.x..frame.x + frame.width {
                    let (lon, lat) = pixel_to_lonlat(&frame, &projection, px, py);
                    if let Some(color) = color_at(px, py, lon, lat) {
                        let offset = px as usize * 4;
                        row[offset..offset + 4].copy_from_slice(&color.0);
                    }
                }
            });
    }

    /// Flat-shaded cells: cell `(j, i)` spans `lons[i]..lons[i+1]`, `lats[j]..lats[j+1]`
    /// and takes the color of `values[(j, i)]`. NaN cells stay background.
    pub fn fill_pcolormesh(
        &mut self,
        grid: &RegularGrid,
        values: &Array2<f64>,
        scale: &ColorScale,
    ) -> Result<()> {
        if values.dim() != (grid.ny(), grid.nx()) {
            return Err(Ww3VisError::shape_mismatch(
                "pcolormesh values",
                format!("{:?}", (grid.ny(), grid.nx())),
                format!("{:?}", values.dim()),
            ));
        }
        if grid.nx() < 2 || grid.ny() < 2 {
            return Ok(());
        }

        let cell = |axis: &[f64], v: f64| -> Option<usize> {
            if v < axis[0] || v > axis[axis.len() - 1] {
                return None;
            }
            let k = axis.partition_point(|&a| a <= v);
            Some(k.saturating_sub(1).min(axis.len() - 2))
        };

        self.fill_frame(|_, _, lon, lat| {
            let i = cell(&grid.lons, lon)?;
            let j = cell(&grid.lats, lat)?;
            scale.color(values[(j, i)])
        });
        Ok(())
    }

    /// Filled contour bands from values sampled on [`Self::pixel_grid`].
    /// Values outside the level range are left unfilled.
    pub fn fill_levels(&mut self, values: &Array2<f64>, levels: &LevelScale) -> Result<()> {
        let f = self.frame;
        if values.dim() != (f.height as usize, f.width as usize) {
            return Err(Ww3VisError::shape_mismatch(
                "contour raster",
                format!("{:?}", (f.height, f.width)),
                format!("{:?}", values.dim()),
            ));
        }
        self.fill_frame(|px, py, _, _| {
            let i = (px - f.x) as usize;
            let j = (f.y + f.height - 1 - py) as usize;
            levels.color(values[(j, i)])
        });
        Ok(())
    }

    /// Arrows for unit vectors `(u, v)` at every `row_step`-th / `col_step`-th grid node,
    /// pivoting about their middle. NaN vectors are skipped.
    pub fn draw_quiver(
        &mut self,
        grid: &RegularGrid,
        u: &Array2<f64>,
        v: &Array2<f64>,
        row_step: usize,
        col_step: usize,
        style: &QuiverStyle,
    ) -> Result<()> {
        let expected = (grid.ny(), grid.nx());
        if u.dim() != expected || v.dim() != expected {
            return Err(Ww3VisError::shape_mismatch(
                "quiver components",
                format!("{expected:?}"),
                format!("{:?} / {:?}", u.dim(), v.dim()),
            ));
        }
        if grid.nx() == 0 || grid.ny() == 0 {
            return Ok(());
        }
        let (row_step, col_step) = (row_step.max(1), col_step.max(1));

        // Arrow length from the pixel spacing between drawn arrows
        let (x0, y0) = self.to_pixel(grid.lons[0], grid.lats[0]);
        let (x1, _) = self.to_pixel(grid.lons[col_step.min(grid.nx() - 1)], grid.lats[0]);
        let (_, y1) = self.to_pixel(grid.lons[0], grid.lats[row_step.min(grid.ny() - 1)]);
        let spacing = match ((x1 - x0).abs(), (y1 - y0).abs()) {
            (dx, dy) if dx > 0.0 && dy > 0.0 => dx.min(dy),
            (dx, dy) => dx.max(dy).max(10.0),
        };
        let length = (style.length_fraction * spacing).max(4.0);
        let head = style.head_fraction * length;
        let head_angle = 25f64.to_radians();

        let mut canvas = Blend(std::mem::take(&mut self.image));
        let mut drawn = 0usize;
        for j in (0..grid.ny()).step_by(row_step) {
            for i in (0..grid.nx()).step_by(col_step) {
                let (du, dv) = (u[(j, i)], v[(j, i)]);
                if !du.is_finite() || !dv.is_finite() {
                    continue;
                }
                let (cx, cy) = self.to_pixel(grid.lons[i], grid.lats[j]);
                if !self.frame.contains(cx, cy) {
                    continue;
                }
                // Image y grows downwards
                let angle = (-dv).atan2(du);
                let (hx, hy) = (0.5 * length * angle.cos(), 0.5 * length * angle.sin());
                let tail = ((cx - hx) as f32, (cy - hy) as f32);
                let tip = ((cx + hx) as f32, (cy + hy) as f32);
                draw_line_segment_mut(&mut canvas, tail, tip, style.color);
                for side in [-1.0, 1.0] {
                    let a = angle + std::f64::consts::PI + side * head_angle;
                    let barb = (
                        tip.0 + (head * a.cos()) as f32,
                        tip.1 + (head * a.sin()) as f32,
                    );
                    draw_line_segment_mut(&mut canvas, tip, barb, style.color);
                }
                drawn += 1;
            }
        }
        self.image = canvas.0;
        debug!(arrows = drawn, "Drew quiver overlay");
        Ok(())
    }

    /// White dots with a black edge at each station inside the frame
    pub fn draw_markers(&mut self, stations: &[Station], diameter: u32) {
        let radius = (diameter / 2).max(1) as i32;
        for station in stations {
            let (px, py) = self.to_pixel(station.lon, station.lat);
            if !self.frame.contains(px, py) {
                continue;
            }
            let center = (px.round() as i32, py.round() as i32);
            draw_filled_circle_mut(&mut self.image, center, radius, WHITE);
            draw_hollow_circle_mut(&mut self.image, center, radius, BLACK);
        }
    }

    /// Dashed meridians and parallels every step from the anchor, labelled outside the frame
    pub fn draw_graticule(
        &mut self,
        meridian_step: f64,
        parallel_step: f64,
        anchor: GraticuleAnchor,
    ) {
        let p = self.projection;
        let f = self.frame;
        let (lon_origin, lat_origin) = match anchor {
            GraticuleAnchor::Multiples => (0.0, 0.0),
            GraticuleAnchor::BoxCorner => (p.lon_min, p.lat_min),
        };
        let meridians = graticule_lines(p.lon_min, p.lon_max, meridian_step, lon_origin);
        let parallels = graticule_lines(p.lat_min, p.lat_max, parallel_step, lat_origin);

        let meridian_decimals = decimals_for(meridian_step);
        for lon in meridians {
            let (x, _) = self.to_pixel(lon, p.lat_min);
            let x = (x.round() as u32).clamp(f.x, f.x + f.width - 1);
            for y in f.y..f.y + f.height {
                if (y - f.y) % 6 < 3 {
                    self.image.put_pixel(x, y, GRID_LINE);
                }
            }
            let label = format_degrees(lon, meridian_decimals, 'E', 'W');
            self.text.draw(
                &mut self.image,
                &label,
                x as i32,
                (f.y + f.height + 16) as i32,
                LABEL_SIZE,
                BLACK,
                Anchor::Center,
            );
        }

        let parallel_decimals = decimals_for(parallel_step);
        for lat in parallels {
            let (_, y) = self.to_pixel(p.lon_min, lat);
            let y = (y.round() as u32).clamp(f.y, f.y + f.height - 1);
            for x in f.x..f.x + f.width {
                if (x - f.x) % 6 < 3 {
                    self.image.put_pixel(x, y, GRID_LINE);
                }
            }
            let label = format_degrees(lat, parallel_decimals, 'N', 'S');
            self.text.draw(
                &mut self.image,
                &label,
                f.x as i32 - 6,
                y as i32,
                LABEL_SIZE,
                BLACK,
                Anchor::Right,
            );
        }
    }

    /// Vertical colorbar to the right of the frame
    pub fn draw_colorbar<K: ColorKey>(&mut self, key: &K) {
        let f = self.frame;
        let (lo, hi) = key.value_range();
        let bar_x = f.x + f.width + COLORBAR_GAP;
        if bar_x + COLORBAR_WIDTH >= self.image.width() {
            return;
        }

        for r in 0..f.height {
            let t = 1.0 - (r as f64 + 0.5) / f.height as f64;
            let color = key.key_color(lo + t * (hi - lo)).unwrap_or(WHITE);
            for c in 0..COLORBAR_WIDTH {
                self.image.put_pixel(bar_x + c, f.y + r, color);
            }
        }
        draw_hollow_rect_mut(
            &mut self.image,
            Rect::at(bar_x as i32, f.y as i32).of_size(COLORBAR_WIDTH, f.height),
            BLACK,
        );

        let ticks = nice_ticks(lo, hi, 6);
        let decimals = match ticks.as_slice() {
            [a, b, ..] => decimals_for(b - a),
            _ => 2,
        };
        for tick in ticks {
            if hi <= lo {
                break;
            }
            let t = (tick - lo) / (hi - lo);
            let y = f.y as f64 + (1.0 - t) * f.height as f64;
            let y = (y.round() as i32).clamp(f.y as i32, (f.y + f.height) as i32 - 1);
            let right = (bar_x + COLORBAR_WIDTH) as f32;
            draw_line_segment_mut(
                &mut self.image,
                (right, y as f32),
                (right + 5.0, y as f32),
                BLACK,
            );
            self.text.draw(
                &mut self.image,
                &format!("{:.*}", decimals, tick),
                right as i32 + 8,
                y,
                LABEL_SIZE,
                BLACK,
                Anchor::Left,
            );
        }
    }

    /// Title centered above the frame
    pub fn draw_title(&mut self, title: &str) {
        let f = self.frame;
        self.text.draw(
            &mut self.image,
            title,
            (f.x + f.width / 2) as i32,
            f.y as i32 - 24,
            TITLE_SIZE,
            BLACK,
            Anchor::Center,
        );
    }

    /// Black outline around the map frame
    pub fn draw_boundary(&mut self) {
        let f = self.frame;
        draw_hollow_rect_mut(
            &mut self.image,
            Rect::at(f.x as i32, f.y as i32).of_size(f.width, f.height),
            BLACK,
        );
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        self.image.save(path)?;
        debug!(path = %path.display(), "Saved map image");
        Ok(())
    }
}

fn pixel_to_lonlat(frame: &Frame, projection: &Mercator, px: u32, py: u32) -> (f64, f64) {
    let u = (px as f64 + 0.5 - frame.x as f64) / frame.width as f64;
    let v = 1.0 - (py as f64 + 0.5 - frame.y as f64) / frame.height as f64;
    projection.from_unit(u, v)
}
