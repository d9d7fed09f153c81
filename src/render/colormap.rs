//! Value → color mapping

use crate::dataset::finite_range;
use image::Rgba;

/// Supported colormaps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Colormap {
    /// Classic blue → cyan → yellow → red "jet" ramp
    #[default]
    Jet,
    /// Black → white
    Gray,
}

/// Piecewise-linear channel from `(x, y)` anchors
fn segment(anchors: &[(f64, f64)], x: f64) -> f64 {
    let x = x.clamp(0.0, 1.0);
    for pair in anchors.windows(2) {
        let ((x0, y0), (x1, y1)) = (pair[0], pair[1]);
        if x <= x1 {
            if x1 == x0 {
                return y1;
            }
            return y0 + (y1 - y0) * (x - x0) / (x1 - x0);
        }
    }
    anchors.last().map_or(0.0, |&(_, y)| y)
}

const JET_RED: [(f64, f64); 5] = [(0.0, 0.0), (0.35, 0.0), (0.66, 1.0), (0.89, 1.0), (1.0, 0.5)];
const JET_GREEN: [(f64, f64); 6] = [
    (0.0, 0.0),
    (0.125, 0.0),
    (0.375, 1.0),
    (0.64, 1.0),
    (0.91, 0.0),
    (1.0, 0.0),
];
const JET_BLUE: [(f64, f64); 5] = [(0.0, 0.5), (0.11, 1.0), (0.34, 1.0), (0.65, 0.0), (1.0, 0.0)];

impl Colormap {
    /// Color at a normalized position in `[0, 1]`
    pub fn at(self, t: f64) -> Rgba<u8> {
        let to_u8 = |c: f64| (c * 255.0).round().clamp(0.0, 255.0) as u8;
        match self {
            Colormap::Jet => Rgba([
                to_u8(segment(&JET_RED, t)),
                to_u8(segment(&JET_GREEN, t)),
                to_u8(segment(&JET_BLUE, t)),
                255,
            ]),
            Colormap::Gray => {
                let g = to_u8(t.clamp(0.0, 1.0));
                Rgba([g, g, g, 255])
            }
        }
    }
}

/// Continuous color scale between `vmin` and `vmax`; values outside are clipped
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorScale {
    pub vmin: f64,
    pub vmax: f64,
    pub cmap: Colormap,
}

impl ColorScale {
    pub fn new(vmin: f64, vmax: f64, cmap: Colormap) -> Self {
        Self { vmin, vmax, cmap }
    }

    /// Scale with unset bounds taken from the finite data range
    pub fn autoscale<'a>(
        values: impl IntoIterator<Item = &'a f64>,
        vmin: Option<f64>,
        vmax: Option<f64>,
        cmap: Colormap,
    ) -> Self {
        let finite: Vec<f64> = values.into_iter().copied().collect();
        let (lo, hi) = finite_range(&finite).unwrap_or((0.0, 1.0));
        let vmin = vmin.unwrap_or(lo);
        let vmax = vmax.unwrap_or(hi);
        // A vmax below the data minimum would leave an inverted scale
        let vmin = if vmin > vmax { vmax } else { vmin };
        Self { vmin, vmax, cmap }
    }

    pub fn normalize(&self, value: f64) -> f64 {
        let range = self.vmax - self.vmin;
        // Collapsed scale: everything at or above the bound takes the top color
        if range.abs() < f64::EPSILON {
            return if value >= self.vmax { 1.0 } else { 0.0 };
        }
        ((value - self.vmin) / range).clamp(0.0, 1.0)
    }

    /// None for NaN (masked) values
    pub fn color(&self, value: f64) -> Option<Rgba<u8>> {
        value.is_finite().then(|| self.cmap.at(self.normalize(value)))
    }
}

/// Discrete bands between consecutive contour levels
#[derive(Debug, Clone, PartialEq)]
pub struct LevelScale {
    levels: Vec<f64>,
    pub cmap: Colormap,
}

impl LevelScale {
    /// Levels must be ascending; at least two are needed to form a band
    pub fn new(mut levels: Vec<f64>, cmap: Colormap) -> Self {
        levels.retain(|l| l.is_finite());
        levels.sort_by(|a, b| a.total_cmp(b));
        levels.dedup();
        Self { levels, cmap }
    }

    /// `start, start + step, ...` strictly below `stop`
    pub fn arange(start: f64, stop: f64, step: f64, cmap: Colormap) -> Self {
        let mut levels = Vec::new();
        if step > 0.0 {
            let n = ((stop - start) / step).ceil().max(0.0) as usize;
            levels.extend((0..n).map(|k| start + step * k as f64));
        }
        Self::new(levels, cmap)
    }

    pub fn levels(&self) -> &[f64] {
        &self.levels
    }

    pub fn band_count(&self) -> usize {
        self.levels.len().saturating_sub(1)
    }

    /// Index of the band holding `value`; the last level closes the top band
    pub fn band(&self, value: f64) -> Option<usize> {
        let n = self.levels.len();
        if n < 2 || !value.is_finite() || value < self.levels[0] || value > self.levels[n - 1] {
            return None;
        }
        let k = self.levels.partition_point(|&l| l <= value);
        Some(k.saturating_sub(1).min(n - 2))
    }

    /// Color of a band, sampled at its midpoint
    pub fn band_color(&self, band: usize) -> Rgba<u8> {
        let first = self.levels[0];
        let last = self.levels[self.levels.len() - 1];
        let mid = 0.5 * (self.levels[band] + self.levels[band + 1]);
        let t = if last > first { (mid - first) / (last - first) } else { 0.5 };
        self.cmap.at(t)
    }

    pub fn color(&self, value: f64) -> Option<Rgba<u8>> {
        self.band(value).map(|b| self.band_color(b))
    }

    pub fn range(&self) -> Option<(f64, f64)> {
        Some((*self.levels.first()?, *self.levels.last()?))
    }
}
