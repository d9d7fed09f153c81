//! Height field with direction arrows and observation-point markers

use super::tri::{MeshRemap, TriOptions};
use super::{decorate, for_each_step, PlotOptions};
use crate::dataset::WaveDataset;
use crate::errors::Result;
use crate::interpolate::{direction_to_unit_vectors, subsample_step};
use crate::render::{ColorScale, MapCanvas, QuiverStyle};
use crate::stations::{read_stations, Station};
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Clone)]
pub struct DirectionOptions {
    pub pattern: String,
    pub variable: String,
    /// Roughly this many arrows along each grid axis
    pub arrows_per_axis: usize,
    /// Observation-point file; None draws no markers
    pub stations: Option<PathBuf>,
    pub marker_size: u32,
    pub quiver: QuiverStyle,
}

impl Default for DirectionOptions {
    fn default() -> Self {
        Self {
            pattern: "ww3.????????_dir.nc".to_string(),
            variable: "dir".to_string(),
            arrows_per_axis: 25,
            stations: Some(PathBuf::from("erie_ndbc.loc")),
            marker_size: 8,
            quiver: QuiverStyle::default(),
        }
    }
}

/// `TriOptions` defaults of the height+direction variant
pub fn direction_height_defaults() -> TriOptions {
    TriOptions {
        pattern: "ww3.????????_hs.nc".to_string(),
        flatness: 0.10,
        vmax: Some(4.0),
        ..TriOptions::default()
    }
}

/// One map per time step: remapped height, subsampled direction arrows, station markers
pub fn plot_tri_direction(
    opts: &PlotOptions,
    tri_opts: &TriOptions,
    dir_opts: &DirectionOptions,
) -> Result<Vec<PathBuf>> {
    let heights = WaveDataset::open(&tri_opts.pattern)?;
    let directions = WaveDataset::open(&dir_opts.pattern)?;
    heights.check_aligned(&directions)?;

    let stations: Vec<Station> = match &dir_opts.stations {
        Some(path) => read_stations(path)?,
        None => Vec::new(),
    };
    info!(stations = stations.len(), "Loaded observation points");

    let remap = MeshRemap::build(heights.coordinates()?, tri_opts.flatness, tri_opts.grid_size)?;
    let bounds = remap.bounds();
    let grid = remap.grid();
    let row_step = subsample_step(grid.ny(), dir_opts.arrows_per_axis);
    let col_step = subsample_step(grid.nx(), dir_opts.arrows_per_axis);

    for_each_step(&heights, opts, |t, title| {
        let hs = heights.read_record(&tri_opts.variable, t)?;
        let dir = directions.read_record(&dir_opts.variable, t)?;
        let hs_grid = remap.interpolator.interpolate(&hs)?;
        let dir_grid = remap.interpolator.interpolate(&dir)?;
        drop((hs, dir));
        let (u, v) = direction_to_unit_vectors(&dir_grid);

        let scale =
            ColorScale::autoscale(hs_grid.iter(), tri_opts.vmin, tri_opts.vmax, opts.colormap);
        let mut canvas = MapCanvas::new(opts.width, opts.height, bounds)?;
        canvas.fill_pcolormesh(grid, &hs_grid, &scale)?;
        canvas.draw_quiver(grid, &u, &v, row_step, col_step, &dir_opts.quiver)?;
        decorate(&mut canvas, &scale, opts, title);
        canvas.draw_markers(&stations, dir_opts.marker_size);
        Ok(canvas)
    })
}
