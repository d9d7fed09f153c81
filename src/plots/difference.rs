//! Difference between two runs of the same single-variable output
//!
//! Typical use: surface elevation (`zeta`) from a coupled run minus the
//! uncoupled baseline on the same mesh.

use crate::dataset::WaveDataset;
use crate::errors::{Result, Ww3VisError};
use crate::netcdf_io::NetCDFWriter;
use crate::render::save_line_plot;
use crate::timestamps::title_stamp;
use chrono::NaiveDateTime;
use ndarray::{Array2, Axis};
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Clone)]
pub struct DifferenceOptions {
    /// Baseline file or pattern
    pub first: String,
    /// File or pattern subtracted from
    pub second: String,
    pub variable: String,
    /// Slice to summarize and plot; the last one when unset
    pub time_index: Option<usize>,
    pub output_png: Option<PathBuf>,
    pub output_netcdf: Option<PathBuf>,
    pub width: u32,
    pub height: u32,
}

impl Default for DifferenceOptions {
    fn default() -> Self {
        Self {
            first: String::new(),
            second: String::new(),
            variable: "zeta".to_string(),
            time_index: None,
            output_png: None,
            output_netcdf: None,
            width: 1200,
            height: 600,
        }
    }
}

/// Statistics over the finite values of one slice
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SliceStats {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub valid: usize,
    pub total: usize,
}

impl SliceStats {
    pub fn from_values(values: &[f64]) -> Self {
        let valid: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
        if valid.is_empty() {
            return Self {
                min: f64::NAN,
                max: f64::NAN,
                mean: f64::NAN,
                valid: 0,
                total: values.len(),
            };
        }
        Self {
            min: valid.iter().copied().fold(f64::INFINITY, f64::min),
            max: valid.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            mean: valid.iter().sum::<f64>() / valid.len() as f64,
            valid: valid.len(),
            total: values.len(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DifferenceReport {
    /// `second − first`, (time, node)
    pub difference: Array2<f64>,
    pub time_index: usize,
    pub datetime: NaiveDateTime,
    pub slice: Vec<f64>,
    pub stats: SliceStats,
    pub written: Vec<PathBuf>,
}

impl DifferenceReport {
    pub fn print_summary(&self, variable: &str) {
        println!("\n Difference of '{}' at {}", variable, title_stamp(&self.datetime));
        println!("==============================");
        println!("    Time index: {}", self.time_index);
        if self.stats.valid > 0 {
            println!("    Min: {:.4}", self.stats.min);
            println!("    Max: {:.4}", self.stats.max);
            println!("    Mean: {:.4}", self.stats.mean);
        } else {
            println!("    ⚠ No valid (finite) values in slice");
        }
        println!("    Valid elements: {} / {}", self.stats.valid, self.stats.total);
        for path in &self.written {
            println!("✅ Saved {}", path.display());
        }
    }
}

/// Compute `second − first` for every step, summarize and plot one slice
pub fn difference(opts: &DifferenceOptions) -> Result<DifferenceReport> {
    let first = WaveDataset::open(&opts.first)?;
    let second = WaveDataset::open(&opts.second)?;

    let a = first.read_all(&opts.variable)?;
    let b = second.read_all(&opts.variable)?;
    if a.dim() != b.dim() {
        return Err(Ww3VisError::shape_mismatch(
            format!("'{}' in {} vs {}", opts.variable, opts.first, opts.second),
            format!("{:?}", a.dim()),
            format!("{:?}", b.dim()),
        ));
    }
    if a.nrows() == 0 {
        return Err(Ww3VisError::Generic(format!(
            "'{}' has no time steps",
            opts.variable
        )));
    }
    let difference = &b - &a;

    let time_index = opts.time_index.unwrap_or(difference.nrows() - 1);
    if time_index >= difference.nrows() {
        return Err(Ww3VisError::shape_mismatch(
            "difference time index",
            format!("< {}", difference.nrows()),
            time_index,
        ));
    }
    let datetime = first.datetime(time_index)?;
    let slice = difference.index_axis(Axis(0), time_index).to_vec();
    let stats = SliceStats::from_values(&slice);
    info!(
        time_index,
        min = stats.min,
        max = stats.max,
        mean = stats.mean,
        "Computed difference slice"
    );

    let mut written = Vec::new();
    if let Some(path) = &opts.output_png {
        let title = format!("Δ{} at {}", opts.variable, title_stamp(&datetime));
        save_line_plot(&slice, &title, opts.width, opts.height, path)?;
        written.push(path.clone());
    }
    if let Some(path) = &opts.output_netcdf {
        let source = netcdf::open(&first.paths()[0])?;
        let comment = format!("{} minus {}", opts.second, opts.first);
        NetCDFWriter::new(&source, path).write_field(
            &difference,
            first.times(),
            &format!("{}_diff", opts.variable),
            &opts.variable,
            &comment,
        )?;
        written.push(path.clone());
    }

    Ok(DifferenceReport {
        difference,
        time_index,
        datetime,
        slice,
        stats,
        written,
    })
}
