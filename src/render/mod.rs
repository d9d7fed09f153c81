//! Map rendering for gridded and interpolated wave fields
//!
//! - [`colormap`]: continuous and banded color scales
//! - [`mercator`]: projection of the lon/lat box onto the image
//! - [`canvas`]: frame layout, raster layers, arrows, markers, graticule, colorbar
//! - [`lineplot`]: 1-D charts for difference slices
//! - [`text`]: embedded-font text drawing

pub mod canvas;
pub mod colormap;
pub mod lineplot;
pub mod mercator;
pub mod text;

pub use canvas::{ColorKey, Frame, GraticuleAnchor, MapCanvas, QuiverStyle};
pub use colormap::{ColorScale, Colormap, LevelScale};
pub use lineplot::{render_line_plot, save_line_plot};
pub use mercator::Mercator;
