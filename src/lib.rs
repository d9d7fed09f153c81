//! ww3vis: map images from WAVEWATCH III netCDF output
//!
//! Reads significant wave height (and mean wave direction) written by
//! `ww3_ounf` on structured grids or unstructured triangular meshes and
//! renders one PNG per output time step, named
//! `{YYYYMMDD}_{site}_{YYYYMMDD_HHMMSS}.png`.
//!
//! ## Module Organization
//!
//! - [`dataset`]: pattern expansion, multi-file aggregation, record reads and unpacking
//! - [`timestamps`]: model time offsets to calendar time, title and file-name stamps
//! - [`stations`]: observation-point files
//! - [`mesh`]: Delaunay triangulation and flat border-triangle masking
//! - [`interpolate`]: linear remapping onto regular grids, direction decomposition
//! - [`render`]: Mercator map canvas, color scales, text and line plots
//! - [`plots`]: the contour, tri, tri-dir and difference pipelines
//! - [`inspect`]: file layout report
//! - [`netcdf_io`]: NetCDF output of derived fields
//! - [`parallel`]: Rayon thread-pool configuration
//! - [`errors`]: Centralized error handling
//!
//! ## Usage
//!
//! ```rust,no_run
//! use ww3vis::prelude::*;
//!
//! let opts = PlotOptions {
//!     site: "Shinnecock_WW3".to_string(),
//!     file_suffix: "_tri".to_string(),
//!     ..PlotOptions::default()
//! };
//! let written = plot_tri_height(&opts, &TriOptions::default()).unwrap();
//! println!("wrote {} images", written.len());
//! ```

pub mod cli;
pub mod dataset;
pub mod errors;
pub mod inspect;
pub mod interpolate;
pub mod mesh;
pub mod netcdf_io;
pub mod parallel;
pub mod plots;
pub mod render;
pub mod stations;
pub mod timestamps;

pub use dataset::{resolve_pattern, Coordinates, GridLayout, WaveDataset};
pub use errors::{Result, Ww3VisError};
pub use parallel::ParallelConfig;

pub mod prelude {
    //! Commonly used imports for convenience
    pub use crate::dataset::{resolve_pattern, Coordinates, GridLayout, WaveDataset};
    pub use crate::errors::{Result, Ww3VisError};
    pub use crate::interpolate::{LinearInterpolator, RegularGrid};
    pub use crate::mesh::Triangulation;
    pub use crate::netcdf_io::NetCDFWriter;
    pub use crate::parallel::ParallelConfig;
    pub use crate::plots::{
        difference, plot_contours, plot_tri_direction, plot_tri_height, ContourOptions,
        DifferenceOptions, DirectionOptions, PlotOptions, TriOptions,
    };
    pub use crate::render::{ColorScale, Colormap, LevelScale, MapCanvas};
    pub use crate::stations::{read_stations, Station};
    pub use crate::timestamps::{output_file_name, title_stamp, TimeAxis};
}
