//! Unstructured height field, triangulated and remapped onto a regular grid

use super::{decorate, for_each_step, PlotOptions};
use crate::dataset::{Coordinates, WaveDataset};
use crate::errors::Result;
use crate::interpolate::{LinearInterpolator, RegularGrid};
use crate::mesh::Triangulation;
use crate::render::{ColorScale, MapCanvas};
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Clone)]
pub struct TriOptions {
    pub pattern: String,
    pub variable: String,
    /// Minimum circle ratio of border triangles (0 keeps all, 0.5 is equilateral)
    pub flatness: f64,
    /// Target grid columns × rows
    pub grid_size: (usize, usize),
    /// Lower color bound; the frame minimum when unset
    pub vmin: Option<f64>,
    /// Upper color bound; the frame maximum when unset
    pub vmax: Option<f64>,
}

impl Default for TriOptions {
    fn default() -> Self {
        Self {
            pattern: "ww3.Constant.20151214_hs.nc".to_string(),
            variable: "hs".to_string(),
            flatness: 0.2,
            grid_size: (1000, 1000),
            vmin: None,
            vmax: Some(1.4),
        }
    }
}

/// Masked triangulation of the mesh plus the regular grid it is remapped onto
#[derive(Debug, Clone)]
pub struct MeshRemap {
    pub triangulation: Triangulation,
    pub interpolator: LinearInterpolator,
}

impl MeshRemap {
    pub fn build(coords: &Coordinates, flatness: f64, grid_size: (usize, usize)) -> Result<Self> {
        let mut triangulation = Triangulation::new(&coords.lon, &coords.lat)?;
        let masked = triangulation.mask_flat_triangles(flatness);
        let grid = RegularGrid::spanning(&coords.lon, &coords.lat, grid_size.0, grid_size.1)?;
        let interpolator = LinearInterpolator::new(&triangulation, &grid);
        info!(
            triangles = triangulation.triangle_count(),
            masked,
            flatness,
            grid = ?grid_size,
            "Prepared mesh remap"
        );
        Ok(Self {
            triangulation,
            interpolator,
        })
    }

    pub fn grid(&self) -> &RegularGrid {
        self.interpolator.grid()
    }

    /// Map box of the target grid
    pub fn bounds(&self) -> (f64, f64, f64, f64) {
        let g = self.grid();
        (
            g.lons[0],
            g.lons[g.nx() - 1],
            g.lats[0],
            g.lats[g.ny() - 1],
        )
    }
}

/// One pseudocolor map of the remapped height per time step
pub fn plot_tri_height(opts: &PlotOptions, tri_opts: &TriOptions) -> Result<Vec<PathBuf>> {
    let dataset = WaveDataset::open(&tri_opts.pattern)?;
    let remap = MeshRemap::build(dataset.coordinates()?, tri_opts.flatness, tri_opts.grid_size)?;
    let bounds = remap.bounds();

    for_each_step(&dataset, opts, |t, title| {
        let field = dataset.read_record(&tri_opts.variable, t)?;
        let gridded = remap.interpolator.interpolate(&field)?;
        drop(field);

        let scale =
            ColorScale::autoscale(gridded.iter(), tri_opts.vmin, tri_opts.vmax, opts.colormap);
        let mut canvas = MapCanvas::new(opts.width, opts.height, bounds)?;
        canvas.fill_pcolormesh(remap.grid(), &gridded, &scale)?;
        decorate(&mut canvas, &scale, opts, title);
        Ok(canvas)
    })
}
