//! Delaunay triangulation of mesh nodes and flat-triangle masking
//!
//! Unstructured WW3 meshes are re-triangulated from their node positions.
//! The convex hull of a concave domain (bays, islands near the boundary)
//! produces long sliver triangles along the border; [`Triangulation::flat_triangle_mask`]
//! peels those off from the outside in, leaving interior triangles alone.

use crate::errors::{Result, Ww3VisError};
use delaunator::{Point, EMPTY};
use tracing::debug;

/// Circle ratio of an equilateral triangle, the maximum possible
pub const EQUILATERAL_RATIO: f64 = 0.5;

/// Triangles over a set of nodes, with an optional mask
#[derive(Debug, Clone)]
pub struct Triangulation {
    x: Vec<f64>,
    y: Vec<f64>,
    triangles: Vec<[usize; 3]>,
    /// `neighbors[t][i]` is the triangle across the edge from vertex `i` to vertex `i + 1`
    neighbors: Vec<[Option<usize>; 3]>,
    mask: Vec<bool>,
}

impl Triangulation {
    /// Delaunay-triangulate the nodes. Nodes with non-finite coordinates are
    /// left out but keep their index.
    pub fn new(x: &[f64], y: &[f64]) -> Result<Self> {
        if x.len() != y.len() {
            return Err(Ww3VisError::shape_mismatch(
                "triangulation coordinates",
                x.len(),
                y.len(),
            ));
        }

        let mut index_map = Vec::with_capacity(x.len());
        let mut points = Vec::with_capacity(x.len());
        for (i, (&px, &py)) in x.iter().zip(y).enumerate() {
            if px.is_finite() && py.is_finite() {
                index_map.push(i);
                points.push(Point { x: px, y: py });
            }
        }
        if points.len() < 3 {
            return Err(Ww3VisError::Triangulation(format!(
                "need at least 3 nodes with finite coordinates, got {}",
                points.len()
            )));
        }

        let delaunay = delaunator::triangulate(&points);
        if delaunay.triangles.is_empty() {
            return Err(Ww3VisError::Triangulation(
                "all nodes are collinear".to_string(),
            ));
        }

        let ntri = delaunay.triangles.len() / 3;
        let mut triangles = Vec::with_capacity(ntri);
        let mut neighbors = Vec::with_capacity(ntri);
        for t in 0..ntri {
            let mut verts = [0usize; 3];
            let mut nbrs = [None; 3];
            for i in 0..3 {
                verts[i] = index_map[delaunay.triangles[3 * t + i]];
                let opposite = delaunay.halfedges[3 * t + i];
                nbrs[i] = (opposite != EMPTY).then_some(opposite / 3);
            }

            // Store counter-clockwise; swapping vertices 1 and 2 reverses the edge cycle
            if signed_area(x, y, verts) < 0.0 {
                verts.swap(1, 2);
                nbrs = [nbrs[2], nbrs[1], nbrs[0]];
            }
            triangles.push(verts);
            neighbors.push(nbrs);
        }

        debug!(nodes = points.len(), triangles = ntri, "Triangulated mesh");

        Ok(Self {
            x: x.to_vec(),
            y: y.to_vec(),
            mask: vec![false; triangles.len()],
            triangles,
            neighbors,
        })
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    pub fn node_count(&self) -> usize {
        self.x.len()
    }

    pub fn triangles(&self) -> &[[usize; 3]] {
        &self.triangles
    }

    pub fn neighbors(&self) -> &[[Option<usize>; 3]] {
        &self.neighbors
    }

    pub fn node(&self, i: usize) -> (f64, f64) {
        (self.x[i], self.y[i])
    }

    pub fn mask(&self) -> &[bool] {
        &self.mask
    }

    pub fn is_masked(&self, t: usize) -> bool {
        self.mask[t]
    }

    pub fn masked_count(&self) -> usize {
        self.mask.iter().filter(|&&m| m).count()
    }

    pub fn set_mask(&mut self, mask: Vec<bool>) -> Result<()> {
        if mask.len() != self.triangles.len() {
            return Err(Ww3VisError::shape_mismatch(
                "triangle mask",
                self.triangles.len(),
                mask.len(),
            ));
        }
        self.mask = mask;
        Ok(())
    }

    /// Scale factors mapping the nodes of unmasked triangles onto a unit box
    fn scale_factors(&self) -> (f64, f64) {
        let mut bounds: Option<(f64, f64, f64, f64)> = None;
        for (t, tri) in self.triangles.iter().enumerate() {
            if self.mask[t] {
                continue;
            }
            for &v in tri {
                let (px, py) = (self.x[v], self.y[v]);
                bounds = Some(match bounds {
                    None => (px, px, py, py),
                    Some((x0, x1, y0, y1)) => (x0.min(px), x1.max(px), y0.min(py), y1.max(py)),
                });
            }
        }
        match bounds {
            Some((x0, x1, y0, y1)) => {
                let kx = if x1 > x0 { 1.0 / (x1 - x0) } else { 1.0 };
                let ky = if y1 > y0 { 1.0 / (y1 - y0) } else { 1.0 };
                (kx, ky)
            }
            None => (1.0, 1.0),
        }
    }

    /// In-circle over circumcircle radius for every triangle (NaN when masked).
    ///
    /// 0.5 for an equilateral triangle, 0 for a degenerate one. With `rescale`
    /// the nodes are first mapped onto a unit box so that very anisotropic
    /// lon/lat extents do not make every triangle look flat.
    pub fn circle_ratios(&self, rescale: bool) -> Vec<f64> {
        let (kx, ky) = if rescale {
            self.scale_factors()
        } else {
            (1.0, 1.0)
        };

        self.triangles
            .iter()
            .enumerate()
            .map(|(t, &[a, b, c])| {
                if self.mask[t] {
                    return f64::NAN;
                }
                let p = |i: usize| (self.x[i] * kx, self.y[i] * ky);
                circle_ratio(p(a), p(b), p(c))
            })
            .collect()
    }

    /// Mask of flat triangles on the border of the triangulation.
    ///
    /// Starting from the current border (edges without an unmasked neighbor),
    /// triangles whose circle ratio is below `min_circle_ratio` are masked;
    /// this exposes a new border and the sweep repeats until nothing changes.
    /// Already-masked triangles stay masked.
    pub fn flat_triangle_mask(&self, min_circle_ratio: f64) -> Vec<bool> {
        let ratios = self.circle_ratios(true);
        let bad: Vec<bool> = ratios.iter().map(|&r| r < min_circle_ratio).collect();
        let mut mask = self.mask.clone();

        loop {
            let wavefront: Vec<usize> = (0..self.triangles.len())
                .filter(|&t| !mask[t] && bad[t])
                .filter(|&t| {
                    self.neighbors[t]
                        .iter()
                        .any(|n| n.map_or(true, |n| mask[n]))
                })
                .collect();
            if wavefront.is_empty() {
                break;
            }
            for t in wavefront {
                mask[t] = true;
            }
        }

        mask
    }

    /// Apply [`Self::flat_triangle_mask`] and return the number of newly masked triangles
    pub fn mask_flat_triangles(&mut self, min_circle_ratio: f64) -> usize {
        let before = self.masked_count();
        self.mask = self.flat_triangle_mask(min_circle_ratio);
        let added = self.masked_count() - before;
        debug!(min_circle_ratio, added, "Masked flat border triangles");
        added
    }
}

fn signed_area(x: &[f64], y: &[f64], [a, b, c]: [usize; 3]) -> f64 {
    0.5 * ((x[b] - x[a]) * (y[c] - y[a]) - (x[c] - x[a]) * (y[b] - y[a]))
}

/// In-circle / circumcircle radius of one triangle
pub fn circle_ratio(a: (f64, f64), b: (f64, f64), c: (f64, f64)) -> f64 {
    let la = (b.0 - c.0).hypot(b.1 - c.1);
    let lb = (c.0 - a.0).hypot(c.1 - a.1);
    let lc = (a.0 - b.0).hypot(a.1 - b.1);

    let s = 0.5 * (la + lb + lc);
    let prod_s = (s - la) * (s - lb) * (s - lc);
    if !(prod_s > 0.0) || s == 0.0 {
        return 0.0;
    }
    let circum_radius = la * lb * lc / (4.0 * (s * prod_s).sqrt());
    let in_radius = (prod_s / s).sqrt();
    in_radius / circum_radius
}
