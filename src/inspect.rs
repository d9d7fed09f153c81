//! Layout report for wave output files
//!
//! Lists the dimensions and variables of every file a pattern matches, then
//! what the plotting pipelines will see: grid layout, node count and time range.

use crate::dataset::{attribute_str, GridLayout, WaveDataset};
use crate::errors::Result;
use crate::timestamps::title_stamp;
use chrono::NaiveDateTime;
use netcdf::File;
use std::path::PathBuf;

/// What the pipelines see of a (possibly multi-file) dataset
#[derive(Debug, Clone)]
pub struct DatasetSummary {
    pub paths: Vec<PathBuf>,
    /// None when the files carry no longitude/latitude
    pub layout: Option<GridLayout>,
    pub node_count: Option<usize>,
    pub steps: usize,
    pub first_time: Option<NaiveDateTime>,
    pub last_time: Option<NaiveDateTime>,
}

pub fn summarize(dataset: &WaveDataset) -> Result<DatasetSummary> {
    let (layout, node_count) = match dataset.coordinates() {
        Ok(coords) => (Some(coords.layout), Some(coords.len())),
        Err(_) => (None, None),
    };
    let (first_time, last_time) = if dataset.is_empty() {
        (None, None)
    } else {
        (
            Some(dataset.datetime(0)?),
            Some(dataset.datetime(dataset.len() - 1)?),
        )
    };

    Ok(DatasetSummary {
        paths: dataset.paths().to_vec(),
        layout,
        node_count,
        steps: dataset.len(),
        first_time,
        last_time,
    })
}

/// Dimensions and variables of one file, sorted by name
pub fn list_variables_and_dimensions(file: &File) {
    println!("\n Dimensions");
    println!("==============");

    let mut dimensions: Vec<_> = file.dimensions().collect();
    dimensions.sort_by_key(|d| d.name());
    if dimensions.is_empty() {
        println!("   (No dimensions found)");
    }
    for dim in dimensions {
        if dim.is_unlimited() {
            println!("    {} = {} (unlimited)", dim.name(), dim.len());
        } else {
            println!("    {} = {}", dim.name(), dim.len());
        }
    }

    println!("\n Variables");
    println!("=============");

    let mut variables: Vec<_> = file.variables().collect();
    variables.sort_by_key(|v| v.name());
    if variables.is_empty() {
        println!("   (No variables found)");
    }
    for var in variables {
        let data_type = format!("{:?}", var.vartype()).to_lowercase();
        let dims: Vec<String> = var.dimensions().iter().map(|d| d.name()).collect();
        let shape: Vec<String> = var
            .dimensions()
            .iter()
            .map(|d| d.len().to_string())
            .collect();

        if dims.is_empty() {
            println!("    {} ({}): scalar", var.name(), data_type);
        } else {
            println!(
                "    {} ({}): [{}] = ({})",
                var.name(),
                data_type,
                dims.join(", "),
                shape.join(" × ")
            );
        }

        let key_attrs: Vec<String> = ["units", "long_name"]
            .iter()
            .filter_map(|name| attribute_str(&var, name).map(|v| format!("{name}: {v}")))
            .collect();
        if !key_attrs.is_empty() {
            println!("      └─ {}", key_attrs.join(", "));
        }
    }
}

pub fn print_summary(summary: &DatasetSummary) {
    println!("\n Dataset");
    println!("===========");
    println!("    Files: {}", summary.paths.len());
    match (&summary.layout, summary.node_count) {
        (Some(GridLayout::Unstructured), Some(n)) => {
            println!("    Layout: unstructured mesh, {} nodes", n)
        }
        (Some(GridLayout::Structured { nlat, nlon }), Some(n)) => {
            println!("    Layout: structured grid {} × {} ({} nodes)", nlat, nlon, n)
        }
        _ => println!("    Layout: no longitude/latitude coordinates"),
    }
    println!("    Time steps: {}", summary.steps);
    if let (Some(first), Some(last)) = (summary.first_time, summary.last_time) {
        println!("    Time range: {} .. {}", title_stamp(&first), title_stamp(&last));
    }
}

/// Print every matched file followed by the aggregated summary
pub fn inspect(pattern: &str) -> Result<DatasetSummary> {
    let dataset = WaveDataset::open(pattern)?;
    for path in dataset.paths() {
        println!("\n📁 {}", path.display());
        let file = netcdf::open(path)?;
        list_variables_and_dimensions(&file);
    }
    let summary = summarize(&dataset)?;
    print_summary(&summary);
    Ok(summary)
}
