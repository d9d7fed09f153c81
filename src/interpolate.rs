//! Linear remapping of mesh values onto a regular lon/lat grid
//!
//! The mesh and target grid are fixed for a whole run, so every target node
//! is located in its triangle once ([`LinearInterpolator::new`]) and each
//! time step only evaluates the stored barycentric weights.

use crate::dataset::finite_range;
use crate::errors::{Result, Ww3VisError};
use crate::mesh::Triangulation;
use ndarray::{Array2, Zip};
use tracing::debug;

/// Tolerance on barycentric weights so nodes on shared edges and on the hull are kept
const BARYCENTRIC_EPS: f64 = 1e-10;

/// `n` evenly spaced values from `start` to `end` inclusive
pub fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (n - 1) as f64;
            (0..n)
                .map(|i| if i == n - 1 { end } else { start + step * i as f64 })
                .collect()
        }
    }
}

/// Regular lon/lat target grid; row `j` is latitude `lats[j]`, column `i` is longitude `lons[i]`
#[derive(Debug, Clone, PartialEq)]
pub struct RegularGrid {
    pub lons: Vec<f64>,
    pub lats: Vec<f64>,
}

impl RegularGrid {
    /// `nx` × `ny` grid spanning the finite extent of the given coordinates
    pub fn spanning(lon: &[f64], lat: &[f64], nx: usize, ny: usize) -> Result<Self> {
        let (lon_min, lon_max) = finite_range(lon)
            .ok_or_else(|| Ww3VisError::Generic("no finite longitudes".to_string()))?;
        let (lat_min, lat_max) = finite_range(lat)
            .ok_or_else(|| Ww3VisError::Generic("no finite latitudes".to_string()))?;
        if nx == 0 || ny == 0 {
            return Err(Ww3VisError::shape_mismatch(
                "target grid size",
                "> 0",
                format!("{nx}x{ny}"),
            ));
        }
        Ok(Self {
            lons: linspace(lon_min, lon_max, nx),
            lats: linspace(lat_min, lat_max, ny),
        })
    }

    pub fn nx(&self) -> usize {
        self.lons.len()
    }

    pub fn ny(&self) -> usize {
        self.lats.len()
    }

    /// Index range of `axis` values inside `[lo, hi]`
    fn index_span(axis: &[f64], lo: f64, hi: f64) -> std::ops::Range<usize> {
        let start = axis.partition_point(|&v| v < lo - BARYCENTRIC_EPS);
        let end = axis.partition_point(|&v| v <= hi + BARYCENTRIC_EPS);
        start..end.max(start)
    }
}

#[derive(Debug, Clone, Copy)]
struct Location {
    vertices: [usize; 3],
    weights: [f64; 3],
}

/// Barycentric weights of `p` in triangle `(a, b, c)`, or None for degenerate triangles
pub fn barycentric(p: (f64, f64), a: (f64, f64), b: (f64, f64), c: (f64, f64)) -> Option<[f64; 3]> {
    let det = (b.1 - c.1) * (a.0 - c.0) + (c.0 - b.0) * (a.1 - c.1);
    if det == 0.0 || !det.is_finite() {
        return None;
    }
    let w1 = ((b.1 - c.1) * (p.0 - c.0) + (c.0 - b.0) * (p.1 - c.1)) / det;
    let w2 = ((c.1 - a.1) * (p.0 - c.0) + (a.0 - c.0) * (p.1 - c.1)) / det;
    Some([w1, w2, 1.0 - w1 - w2])
}

/// Piecewise-linear interpolation from an (optionally masked) triangulation onto a regular grid
#[derive(Debug, Clone)]
pub struct LinearInterpolator {
    grid: RegularGrid,
    node_count: usize,
    /// row-major over the target grid
    locations: Vec<Option<Location>>,
}

impl LinearInterpolator {
    pub fn new(tri: &Triangulation, grid: &RegularGrid) -> Self {
        let (nx, ny) = (grid.nx(), grid.ny());
        let mut locations: Vec<Option<Location>> = vec![None; nx * ny];

        for (t, &[va, vb, vc]) in tri.triangles().iter().enumerate() {
            if tri.is_masked(t) {
                continue;
            }
            let (a, b, c) = (tri.node(va), tri.node(vb), tri.node(vc));
            let cols = RegularGrid::index_span(
                &grid.lons,
                a.0.min(b.0).min(c.0),
                a.0.max(b.0).max(c.0),
            );
            let rows = RegularGrid::index_span(
                &grid.lats,
                a.1.min(b.1).min(c.1),
                a.1.max(b.1).max(c.1),
            );

            for j in rows {
                for i in cols.clone() {
                    let slot = &mut locations[j * nx + i];
                    if slot.is_some() {
                        continue;
                    }
                    let Some(weights) = barycentric((grid.lons[i], grid.lats[j]), a, b, c) else {
                        continue;
                    };
                    if weights.iter().all(|&w| w >= -BARYCENTRIC_EPS) {
                        *slot = Some(Location {
                            vertices: [va, vb, vc],
                            weights,
                        });
                    }
                }
            }
        }

        let inside = locations.iter().filter(|l| l.is_some()).count();
        debug!(nx, ny, inside, "Located target grid nodes in triangulation");

        Self {
            grid: grid.clone(),
            node_count: tri.node_count(),
            locations,
        }
    }

    pub fn grid(&self) -> &RegularGrid {
        &self.grid
    }

    /// Number of target nodes that fall inside the unmasked triangulation
    pub fn inside_count(&self) -> usize {
        self.locations.iter().filter(|l| l.is_some()).count()
    }

    /// Interpolate one value per mesh node onto the grid (ny × nx).
    ///
    /// Target nodes outside the triangulation, or in a triangle with a NaN
    /// vertex, come out as NaN.
    pub fn interpolate(&self, values: &[f64]) -> Result<Array2<f64>> {
        if values.len() != self.node_count {
            return Err(Ww3VisError::shape_mismatch(
                "interpolated field",
                self.node_count,
                values.len(),
            ));
        }

        let nx = self.grid.nx();
        let mut out = Array2::<f64>::from_elem((self.grid.ny(), nx), f64::NAN);
        Zip::indexed(&mut out).par_for_each(|(j, i), cell| {
            if let Some(loc) = &self.locations[j * nx + i] {
                *cell = loc
                    .vertices
                    .iter()
                    .zip(loc.weights.iter())
                    .map(|(&v, &w)| values[v] * w)
                    .sum();
            }
        });
        Ok(out)
    }
}

/// Unit vectors (u east, v north) for directions in nautical "coming from" degrees
///
/// `u = cos(π/180·(270 − dir))`, `v = sin(π/180·(270 − dir))`.
pub fn direction_to_unit_vectors(dir: &Array2<f64>) -> (Array2<f64>, Array2<f64>) {
    let radians = dir.mapv(|d| (270.0 - d).to_radians());
    (radians.mapv(f64::cos), radians.mapv(f64::sin))
}

/// Stride that leaves roughly `target` samples out of `n`, never below 1
pub fn subsample_step(n: usize, target: usize) -> usize {
    if target == 0 {
        return 1;
    }
    (n / target).max(1)
}
