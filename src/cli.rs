//! Command-line interface for ww3vis, defined with `clap` derive.
//!
//! Every subcommand carries the defaults of the model setup it was written
//! for; the `*_options` methods turn parsed arguments into the plain option
//! structs of [`crate::plots`].

use crate::errors::{Result, Ww3VisError};
use crate::plots::{
    ContourOptions, DifferenceOptions, DirectionOptions, PlotOptions, TriOptions,
};
use crate::render::{Colormap, GraticuleAnchor, LevelScale};
use crate::timestamps::{generation_stamp, today_stamp};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::level_filters::LevelFilter;

/// Render WAVEWATCH III netCDF output as map images
#[derive(Parser, Debug)]
#[command(
    name = "ww3vis",
    version,
    about = "Render WAVEWATCH III netCDF output (structured and unstructured) as map images"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Number of threads for parallel interpolation and drawing. Defaults to number of CPU cores.
    #[arg(short = 't', long, global = true)]
    pub threads: Option<usize>,

    /// Log level (off, trace, debug, info, warn, error); RUST_LOG takes precedence
    #[arg(long, default_value = "info", global = true, value_parser = parse_log_level)]
    pub log_level: LevelFilter,

    /// Enable verbose output (same as --log-level debug)
    #[arg(short, long, default_value_t = false, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, default_value_t = false, global = true)]
    pub json: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Filled contours of significant wave height on a structured grid
    Contour(ContourArgs),
    /// Triangulated height field of an unstructured mesh
    Tri(TriArgs),
    /// Height field with direction arrows and observation points
    TriDir(TriDirArgs),
    /// Difference of one variable between two runs
    Diff(DiffArgs),
    /// Print dimensions, variables, layout and time range
    Inspect(InspectArgs),
}

/// Settings shared by the map subcommands
#[derive(clap::Args, Debug, Clone)]
pub struct OutputArgs {
    /// Site label used in titles and file names
    #[arg(long, env = "WW3VIS_SITE_ID")]
    pub site: Option<String>,

    /// Directory the images are written to
    #[arg(short, long, env = "WW3VIS_OUTPUT_DIR", default_value = ".")]
    pub output_dir: PathBuf,

    /// Image width in pixels
    #[arg(long, default_value_t = 1200)]
    pub width: u32,

    /// Image height in pixels
    #[arg(long, default_value_t = 900)]
    pub height: u32,

    /// Spacing of meridians in degrees
    #[arg(long)]
    pub meridian_step: Option<f64>,

    /// Spacing of parallels in degrees
    #[arg(long)]
    pub parallel_step: Option<f64>,

    /// Override the YYYYMMDD prefix of the file names (default: today)
    #[arg(long, value_parser = parse_date_stamp)]
    pub date_stamp: Option<String>,
}

impl OutputArgs {
    fn plot_options(&self, site: &str, meridian_step: f64, parallel_step: f64) -> PlotOptions {
        PlotOptions {
            site: self.site.clone().unwrap_or_else(|| site.to_string()),
            output_dir: self.output_dir.clone(),
            generation_stamp: self.date_stamp.clone().unwrap_or_else(today_stamp),
            width: self.width,
            height: self.height,
            meridian_step: self.meridian_step.unwrap_or(meridian_step),
            parallel_step: self.parallel_step.unwrap_or(parallel_step),
            ..PlotOptions::default()
        }
    }
}

#[derive(clap::Args, Debug, Clone)]
pub struct ContourArgs {
    /// File or glob pattern of height files
    #[arg(long, default_value = "*_hs.nc")]
    pub pattern: String,

    /// Variable to plot
    #[arg(long, default_value = "hs")]
    pub variable: String,

    /// First contour level
    #[arg(long, default_value_t = 0.0)]
    pub level_min: f64,

    /// Contour levels stop before this value
    #[arg(long, default_value_t = 5.0)]
    pub level_max: f64,

    /// Spacing of contour levels
    #[arg(long, default_value_t = 0.01)]
    pub level_step: f64,

    #[command(flatten)]
    pub output: OutputArgs,
}

impl ContourArgs {
    pub fn plot_options(&self) -> PlotOptions {
        self.output.plot_options("EC2001_WW3", 5.0, 5.0)
    }

    pub fn contour_options(&self) -> Result<ContourOptions> {
        let step_ok = self.level_step.is_finite() && self.level_step > 0.0;
        if !step_ok || self.level_max <= self.level_min {
            return Err(Ww3VisError::Generic(format!(
                "invalid contour levels {}..{} step {}",
                self.level_min, self.level_max, self.level_step
            )));
        }
        Ok(ContourOptions {
            pattern: self.pattern.clone(),
            variable: self.variable.clone(),
            levels: LevelScale::arange(
                self.level_min,
                self.level_max,
                self.level_step,
                Colormap::Jet,
            ),
        })
    }
}

#[derive(clap::Args, Debug, Clone)]
pub struct TriArgs {
    /// File or glob pattern of height files
    #[arg(long, default_value = "ww3.Constant.20151214_hs.nc")]
    pub pattern: String,

    /// Variable to plot
    #[arg(long, default_value = "hs")]
    pub variable: String,

    /// Minimum circle ratio of border triangles kept in the mesh
    #[arg(long, default_value_t = 0.2)]
    pub flatness: f64,

    /// Target grid as COLSxROWS (or a single number for a square grid)
    #[arg(long, default_value = "1000x1000", value_parser = parse_grid_size)]
    pub grid_size: (usize, usize),

    /// Lower color bound (default: frame minimum)
    #[arg(long)]
    pub vmin: Option<f64>,

    /// Upper color bound [default: 1.4]
    #[arg(long)]
    pub vmax: Option<f64>,

    /// Use the frame maximum as upper color bound
    #[arg(long, default_value_t = false, conflicts_with = "vmax")]
    pub auto_vmax: bool,

    #[command(flatten)]
    pub output: OutputArgs,
}

impl TriArgs {
    pub fn plot_options(&self) -> PlotOptions {
        PlotOptions {
            file_suffix: "_tri".to_string(),
            graticule_anchor: GraticuleAnchor::BoxCorner,
            ..self.output.plot_options("Shinnecock_WW3", 0.2, 0.2)
        }
    }

    pub fn tri_options(&self) -> TriOptions {
        TriOptions {
            pattern: self.pattern.clone(),
            variable: self.variable.clone(),
            flatness: self.flatness,
            grid_size: self.grid_size,
            vmin: self.vmin,
            vmax: upper_bound(self.vmax, self.auto_vmax, 1.4),
        }
    }
}

#[derive(clap::Args, Debug, Clone)]
pub struct TriDirArgs {
    /// File or glob pattern of height files
    #[arg(long, default_value = "ww3.????????_hs.nc")]
    pub hs_pattern: String,

    /// File or glob pattern of direction files
    #[arg(long, default_value = "ww3.????????_dir.nc")]
    pub dir_pattern: String,

    #[arg(long, default_value = "hs")]
    pub hs_variable: String,

    #[arg(long, default_value = "dir")]
    pub dir_variable: String,

    /// Minimum circle ratio of border triangles kept in the mesh
    #[arg(long, default_value_t = 0.10)]
    pub flatness: f64,

    /// Target grid as COLSxROWS (or a single number for a square grid)
    #[arg(long, default_value = "1000x1000", value_parser = parse_grid_size)]
    pub grid_size: (usize, usize),

    /// Lower color bound (default: frame minimum)
    #[arg(long)]
    pub vmin: Option<f64>,

    /// Upper color bound [default: 4.0]
    #[arg(long)]
    pub vmax: Option<f64>,

    /// Use the frame maximum as upper color bound
    #[arg(long, default_value_t = false, conflicts_with = "vmax")]
    pub auto_vmax: bool,

    /// Approximate number of arrows along each axis
    #[arg(long, default_value_t = 25)]
    pub arrows: usize,

    /// Observation-point file (lon lat per line, `$` comments)
    #[arg(long, default_value = "erie_ndbc.loc")]
    pub stations: PathBuf,

    /// Do not draw observation points
    #[arg(long, default_value_t = false)]
    pub no_stations: bool,

    /// Text between the site label and the timestamp in the title
    #[arg(long, default_value = "(12 km): Hsig:")]
    pub title_prefix: String,

    #[command(flatten)]
    pub output: OutputArgs,
}

impl TriDirArgs {
    pub fn plot_options(&self) -> PlotOptions {
        PlotOptions {
            title_prefix: Some(self.title_prefix.clone()),
            ..self.output.plot_options("Erie_WW3", 1.0, 0.5)
        }
    }

    pub fn tri_options(&self) -> TriOptions {
        TriOptions {
            pattern: self.hs_pattern.clone(),
            variable: self.hs_variable.clone(),
            flatness: self.flatness,
            grid_size: self.grid_size,
            vmin: self.vmin,
            vmax: upper_bound(self.vmax, self.auto_vmax, 4.0),
        }
    }

    pub fn direction_options(&self) -> DirectionOptions {
        DirectionOptions {
            pattern: self.dir_pattern.clone(),
            variable: self.dir_variable.clone(),
            arrows_per_axis: self.arrows,
            stations: (!self.no_stations).then(|| self.stations.clone()),
            ..DirectionOptions::default()
        }
    }
}

#[derive(clap::Args, Debug, Clone)]
pub struct DiffArgs {
    /// Baseline file (or pattern)
    pub first: String,

    /// File (or pattern) the baseline is subtracted from
    pub second: String,

    /// Variable to difference
    #[arg(long, default_value = "zeta")]
    pub variable: String,

    /// Time slice to summarize and plot (default: last)
    #[arg(long)]
    pub time_index: Option<usize>,

    /// Line plot of the selected slice is written to <OUTPUT>.png
    #[arg(short, long, default_value = "difference")]
    pub output: PathBuf,

    /// Write the full difference field to this NetCDF file
    #[arg(long)]
    pub output_netcdf: Option<PathBuf>,

    /// Plot width in pixels
    #[arg(long, default_value_t = 1200)]
    pub width: u32,

    /// Plot height in pixels
    #[arg(long, default_value_t = 600)]
    pub height: u32,
}

impl DiffArgs {
    pub fn difference_options(&self) -> DifferenceOptions {
        DifferenceOptions {
            first: self.first.clone(),
            second: self.second.clone(),
            variable: self.variable.clone(),
            time_index: self.time_index,
            output_png: Some(self.output.with_extension("png")),
            output_netcdf: self.output_netcdf.clone(),
            width: self.width,
            height: self.height,
        }
    }
}

#[derive(clap::Args, Debug, Clone)]
pub struct InspectArgs {
    /// File or glob pattern
    pub pattern: String,
}

fn upper_bound(vmax: Option<f64>, auto: bool, default: f64) -> Option<f64> {
    if auto {
        None
    } else {
        Some(vmax.unwrap_or(default))
    }
}

fn parse_log_level(s: &str) -> std::result::Result<LevelFilter, String> {
    s.parse::<LevelFilter>().map_err(|_| {
        format!("Invalid log level '{s}': expected off, trace, debug, info, warn or error")
    })
}

fn parse_grid_size(s: &str) -> std::result::Result<(usize, usize), String> {
    let parse = |v: &str| {
        v.trim()
            .parse::<usize>()
            .map_err(|_| format!("Invalid grid size '{s}': expected COLSxROWS, e.g. 1000x1000"))
    };
    let (nx, ny) = match s.split_once(['x', 'X']) {
        Some((cols, rows)) => (parse(cols)?, parse(rows)?),
        None => {
            let n = parse(s)?;
            (n, n)
        }
    };
    if nx < 2 || ny < 2 {
        return Err(format!("Invalid grid size '{s}': need at least 2 points per axis"));
    }
    Ok((nx, ny))
}

fn parse_date_stamp(s: &str) -> std::result::Result<String, String> {
    NaiveDate::parse_from_str(s, "%Y%m%d")
        .map(generation_stamp)
        .map_err(|_| format!("Invalid date stamp '{s}': expected YYYYMMDD"))
}
