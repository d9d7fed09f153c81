//! Filled contours of a height field on its native nodes

use super::{decorate, for_each_step, PlotOptions};
use crate::dataset::WaveDataset;
use crate::errors::{Result, Ww3VisError};
use crate::interpolate::LinearInterpolator;
use crate::mesh::Triangulation;
use crate::render::{Colormap, LevelScale, MapCanvas};
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Clone)]
pub struct ContourOptions {
    /// Single file, explicit path or glob (multi-file aggregation)
    pub pattern: String,
    pub variable: String,
    pub levels: LevelScale,
}

impl Default for ContourOptions {
    fn default() -> Self {
        Self {
            pattern: "*_hs.nc".to_string(),
            variable: "hs".to_string(),
            levels: LevelScale::arange(0.0, 5.0, 0.01, Colormap::Jet),
        }
    }
}

/// One filled-contour map per time step.
///
/// The nodes (mesh nodes, or grid points of a structured file) are
/// triangulated without masking and every map pixel is interpolated
/// linearly, then binned into the contour bands. Pixels in triangles with a
/// missing vertex, or outside the level range, stay unfilled.
pub fn plot_contours(opts: &PlotOptions, contour: &ContourOptions) -> Result<Vec<PathBuf>> {
    if contour.levels.band_count() == 0 {
        return Err(Ww3VisError::Generic(
            "at least two contour levels are required".to_string(),
        ));
    }

    let dataset = WaveDataset::open(&contour.pattern)?;
    let coords = dataset.coordinates()?;
    let bounds = coords
        .bounds()
        .ok_or_else(|| Ww3VisError::Generic("dataset has no finite coordinates".to_string()))?;

    let tri = Triangulation::new(&coords.lon, &coords.lat)?;
    let pixel_grid = MapCanvas::new(opts.width, opts.height, bounds)?.pixel_grid();
    let interpolator = LinearInterpolator::new(&tri, &pixel_grid);
    info!(
        triangles = tri.triangle_count(),
        covered_pixels = interpolator.inside_count(),
        "Prepared contour geometry"
    );

    for_each_step(&dataset, opts, |t, title| {
        let field = dataset.read_record(&contour.variable, t)?;
        let raster = interpolator.interpolate(&field)?;
        drop(field);

        let mut canvas = MapCanvas::new(opts.width, opts.height, bounds)?;
        canvas.fill_levels(&raster, &contour.levels)?;
        decorate(&mut canvas, &contour.levels, opts, title);
        Ok(canvas)
    })
}
