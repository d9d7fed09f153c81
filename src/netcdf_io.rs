//! NetCDF output of derived fields
//!
//! Writes a computed (time, node) field next to the time coordinate it was
//! derived on, copying descriptive attributes from the source variable.

use crate::errors::{Result, Ww3VisError};
use chrono::Utc;
use ndarray::Array2;
use netcdf::{create, AttributeValue, File};
use std::{fs, path::Path};
use tracing::{debug, warn};

/// Attributes that describe the packed on-disk form and no longer apply to unpacked values
const PACKING_ATTRIBUTES: [&str; 6] = [
    "_FillValue",
    "missing_value",
    "scale_factor",
    "add_offset",
    "valid_min",
    "valid_max",
];

/// Writer for a derived field based on a variable of an existing file
pub struct NetCDFWriter<'a> {
    source_file: &'a File,
    output_path: &'a Path,
}

impl<'a> NetCDFWriter<'a> {
    pub fn new(source_file: &'a File, output_path: &'a Path) -> Self {
        Self {
            source_file,
            output_path,
        }
    }

    /// Write `data` as `var_name(time, node)` with the source variable's
    /// dimension names and attributes. `times` are written to a `time`
    /// coordinate carrying the source `units`.
    pub fn write_field(
        &self,
        data: &Array2<f64>,
        times: &[f64],
        var_name: &str,
        source_var_name: &str,
        comment: &str,
    ) -> Result<()> {
        let source_var = self
            .source_file
            .variable(source_var_name)
            .ok_or_else(|| Ww3VisError::VariableNotFound {
                var: source_var_name.to_string(),
            })?;

        let dim_names: Vec<String> = source_var
            .dimensions()
            .iter()
            .map(|d| d.name().to_string())
            .collect();
        if dim_names.len() != 2 {
            return Err(Ww3VisError::shape_mismatch(
                format!("dimensions of '{source_var_name}'"),
                "(time, node)",
                format!("{dim_names:?}"),
            ));
        }
        let (nt, nn) = data.dim();
        if times.len() != nt {
            return Err(Ww3VisError::shape_mismatch("time coordinate", nt, times.len()));
        }

        if self.output_path.exists() {
            fs::remove_file(self.output_path)?;
        }
        let mut file = create(self.output_path)?;

        file.add_dimension(&dim_names[0], nt)?;
        file.add_dimension(&dim_names[1], nn)?;

        {
            let mut time_var = file.add_variable::<f64>(&dim_names[0], &[dim_names[0].as_str()])?;
            if let Some(time_src) = self.source_file.variable(&dim_names[0]) {
                copy_attributes(&time_src, &mut time_var, &[])?;
            }
            time_var.put_values(times, ..)?;
        }

        let dim_refs: Vec<&str> = dim_names.iter().map(|s| s.as_str()).collect();
        let mut new_var = file.add_variable::<f64>(var_name, &dim_refs)?;
        copy_attributes(&source_var, &mut new_var, &PACKING_ATTRIBUTES)?;
        new_var.put_attribute("comment", comment)?;
        let flat: Vec<f64> = data.iter().copied().collect();
        new_var.put_values(&flat, ..)?;

        file.add_attribute(
            "history",
            format!("Created by ww3vis on {}", Utc::now().to_rfc3339()),
        )?;

        debug!(path = %self.output_path.display(), var_name, "Wrote NetCDF field");
        Ok(())
    }
}

fn copy_attributes(
    from: &netcdf::Variable,
    to: &mut netcdf::VariableMut,
    skip: &[&str],
) -> Result<()> {
    for attr in from
        .attributes()
        .filter(|a| !skip.iter().any(|s| *s == a.name()))
    {
        match attr.value()? {
            AttributeValue::Str(val) => {
                to.put_attribute(attr.name(), val)?;
            }
            AttributeValue::Strs(vals) => {
                to.put_attribute(attr.name(), vals)?;
            }
            AttributeValue::Float(val) => {
                to.put_attribute(attr.name(), val)?;
            }
            AttributeValue::Floats(vals) => {
                to.put_attribute(attr.name(), vals)?;
            }
            AttributeValue::Double(val) => {
                to.put_attribute(attr.name(), val)?;
            }
            AttributeValue::Doubles(vals) => {
                to.put_attribute(attr.name(), vals)?;
            }
            AttributeValue::Int(val) => {
                to.put_attribute(attr.name(), val)?;
            }
            AttributeValue::Ints(vals) => {
                to.put_attribute(attr.name(), vals)?;
            }
            AttributeValue::Short(val) => {
                to.put_attribute(attr.name(), val)?;
            }
            AttributeValue::Shorts(vals) => {
                to.put_attribute(attr.name(), vals)?;
            }
            _ => {
                warn!(attribute = attr.name(), "Skipped unsupported attribute type");
            }
        }
    }
    Ok(())
}
