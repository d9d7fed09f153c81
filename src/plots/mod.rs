//! The plotting pipelines
//!
//! Each pipeline opens its dataset(s), prepares the geometry once, then walks
//! the time axis writing one PNG per step:
//! - [`contour`]: filled contours on the native nodes
//! - [`tri`]: triangulated height field remapped to a regular grid
//! - [`direction`]: height plus direction arrows and station markers
//! - [`difference`]: difference of two single-variable runs

pub mod contour;
pub mod difference;
pub mod direction;
pub mod tri;

pub use contour::{plot_contours, ContourOptions};
pub use difference::{difference, DifferenceOptions, DifferenceReport, SliceStats};
pub use direction::{direction_height_defaults, plot_tri_direction, DirectionOptions};
pub use tri::{plot_tri_height, MeshRemap, TriOptions};

use crate::dataset::WaveDataset;
use crate::errors::Result;
use crate::render::{ColorKey, Colormap, GraticuleAnchor, MapCanvas};
use crate::timestamps::{output_file_name, title_stamp};
use std::fs;
use std::path::PathBuf;
use tracing::{debug, info};

/// Settings shared by every map pipeline
#[derive(Debug, Clone)]
pub struct PlotOptions {
    /// Site label used in titles and file names
    pub site: String,
    pub output_dir: PathBuf,
    /// `YYYYMMDD` prefix of every file name
    pub generation_stamp: String,
    /// Appended to the file name before `.png`
    pub file_suffix: String,
    /// Inserted between the site and the timestamp in the title
    pub title_prefix: Option<String>,
    pub width: u32,
    pub height: u32,
    pub meridian_step: f64,
    pub parallel_step: f64,
    pub graticule_anchor: GraticuleAnchor,
    pub colormap: Colormap,
}

impl Default for PlotOptions {
    fn default() -> Self {
        Self {
            site: "WW3".to_string(),
            output_dir: PathBuf::from("."),
            generation_stamp: crate::timestamps::today_stamp(),
            file_suffix: String::new(),
            title_prefix: None,
            width: 1200,
            height: 900,
            meridian_step: 5.0,
            parallel_step: 5.0,
            graticule_anchor: GraticuleAnchor::Multiples,
            colormap: Colormap::Jet,
        }
    }
}

impl PlotOptions {
    /// `{site}: {stamp} (m)`, or `{site} {prefix} {stamp} (m)` with a title prefix
    pub fn title(&self, stamp: &str) -> String {
        match &self.title_prefix {
            Some(prefix) => format!("{} {} {} (m)", self.site, prefix, stamp),
            None => format!("{}: {} (m)", self.site, stamp),
        }
    }
}

/// Graticule, frame, colorbar and title
fn decorate<K: ColorKey>(canvas: &mut MapCanvas, key: &K, opts: &PlotOptions, title: &str) {
    canvas.draw_graticule(opts.meridian_step, opts.parallel_step, opts.graticule_anchor);
    canvas.draw_boundary();
    canvas.draw_colorbar(key);
    canvas.draw_title(title);
}

/// Render and save one image per time step of `dataset`
fn for_each_step<F>(
    dataset: &WaveDataset,
    opts: &PlotOptions,
    mut render: F,
) -> Result<Vec<PathBuf>>
where
    F: FnMut(usize, &str) -> Result<MapCanvas>,
{
    fs::create_dir_all(&opts.output_dir)?;
    let mut written = Vec::with_capacity(dataset.len());

    for t in 0..dataset.len() {
        let dt = dataset.datetime(t)?;
        let stamp = title_stamp(&dt);
        info!("Plotting {}", stamp);

        let canvas = render(t, &opts.title(&stamp))?;
        let path = opts.output_dir.join(output_file_name(
            &opts.generation_stamp,
            &opts.site,
            &dt,
            &opts.file_suffix,
        ));
        canvas.save(&path)?;
        debug!(path = %path.display(), step = t, "Wrote frame");
        written.push(path);
    }

    info!(frames = written.len(), "Finished plotting");
    Ok(written)
}
