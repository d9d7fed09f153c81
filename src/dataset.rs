//! NetCDF input: pattern expansion, multi-file aggregation and record reads
//!
//! A [`WaveDataset`] is one or more `ww3_ounf` files matched by a pattern and
//! stitched together along the time (record) dimension. Coordinates are taken
//! from the first file; records are read one time step at a time so only the
//! current slice is ever held in memory.

use crate::errors::{Result, Ww3VisError};
use crate::timestamps::TimeAxis;
use chrono::NaiveDateTime;
use ndarray::Array2;
use netcdf::{AttributeValue, File, Variable};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Names of the coordinate variables in a wave file
#[derive(Debug, Clone)]
pub struct CoordinateNames {
    pub longitude: String,
    pub latitude: String,
    pub time: String,
}

impl Default for CoordinateNames {
    fn default() -> Self {
        Self {
            longitude: "longitude".to_string(),
            latitude: "latitude".to_string(),
            time: "time".to_string(),
        }
    }
}

/// How the model nodes are laid out in the file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridLayout {
    /// One longitude/latitude pair per mesh node
    Unstructured,
    /// Regular or curvilinear grid, nodes flattened row-major (`nlat` rows of `nlon`)
    Structured { nlat: usize, nlon: usize },
}

/// Per-node coordinates in degrees
#[derive(Debug, Clone)]
pub struct Coordinates {
    pub lon: Vec<f64>,
    pub lat: Vec<f64>,
    pub layout: GridLayout,
}

impl Coordinates {
    pub fn len(&self) -> usize {
        self.lon.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lon.is_empty()
    }

    /// `(lon_min, lon_max, lat_min, lat_max)` over finite coordinates
    pub fn bounds(&self) -> Option<(f64, f64, f64, f64)> {
        let (lon_min, lon_max) = finite_range(&self.lon)?;
        let (lat_min, lat_max) = finite_range(&self.lat)?;
        Some((lon_min, lon_max, lat_min, lat_max))
    }
}

/// Min and max of the finite values in a slice
pub fn finite_range(values: &[f64]) -> Option<(f64, f64)> {
    values
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}

/// CF packing attributes of a variable
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Packing {
    pub fill_value: Option<f64>,
    pub missing_value: Option<f64>,
    pub scale_factor: f64,
    pub add_offset: f64,
}

impl Default for Packing {
    fn default() -> Self {
        Self {
            fill_value: None,
            missing_value: None,
            scale_factor: 1.0,
            add_offset: 0.0,
        }
    }
}

impl Packing {
    pub fn from_variable(var: &Variable) -> Self {
        Self {
            fill_value: attribute_f64(var, "_FillValue"),
            missing_value: attribute_f64(var, "missing_value"),
            scale_factor: attribute_f64(var, "scale_factor").unwrap_or(1.0),
            add_offset: attribute_f64(var, "add_offset").unwrap_or(0.0),
        }
    }

    /// Mask fill/missing/non-finite raw values as NaN, then scale and offset the rest
    pub fn unpack(&self, raw: &mut [f64]) {
        for value in raw.iter_mut() {
            let is_fill = self.fill_value.is_some_and(|fv| *value == fv)
                || self.missing_value.is_some_and(|mv| *value == mv);
            *value = if is_fill || !value.is_finite() {
                f64::NAN
            } else {
                *value * self.scale_factor + self.add_offset
            };
        }
    }
}

/// Read a numeric attribute as f64, taking the first element of array attributes
pub fn attribute_f64(var: &Variable, name: &str) -> Option<f64> {
    match var.attribute(name)?.value().ok()? {
        AttributeValue::Double(v) => Some(v),
        AttributeValue::Float(v) => Some(f64::from(v)),
        AttributeValue::Int(v) => Some(f64::from(v)),
        AttributeValue::Short(v) => Some(f64::from(v)),
        AttributeValue::Schar(v) => Some(f64::from(v)),
        AttributeValue::Uchar(v) => Some(f64::from(v)),
        AttributeValue::Ushort(v) => Some(f64::from(v)),
        AttributeValue::Uint(v) => Some(f64::from(v)),
        AttributeValue::Doubles(v) => v.first().copied(),
        AttributeValue::Floats(v) => v.first().map(|&x| f64::from(x)),
        AttributeValue::Ints(v) => v.first().map(|&x| f64::from(x)),
        AttributeValue::Shorts(v) => v.first().map(|&x| f64::from(x)),
        _ => None,
    }
}

/// Read a string attribute
pub fn attribute_str(var: &Variable, name: &str) -> Option<String> {
    match var.attribute(name)?.value().ok()? {
        AttributeValue::Str(s) => Some(s),
        AttributeValue::Strs(ss) => ss.into_iter().next(),
        _ => None,
    }
}

/// Expand a file pattern into a sorted list of paths.
///
/// An existing literal path is returned as-is, so explicit absolute paths
/// containing glob metacharacters still work.
pub fn resolve_pattern(pattern: &str) -> Result<Vec<PathBuf>> {
    let literal = Path::new(pattern);
    if literal.is_file() {
        return Ok(vec![literal.to_path_buf()]);
    }

    let mut paths: Vec<PathBuf> = glob::glob(pattern)?
        .filter_map(|entry| entry.ok())
        .filter(|p| p.is_file())
        .collect();
    paths.sort();

    if paths.is_empty() {
        return Err(Ww3VisError::NoMatchingFiles {
            pattern: pattern.to_string(),
        });
    }
    Ok(paths)
}

fn variable<'f>(file: &'f File, name: &str) -> Result<Variable<'f>> {
    file.variable(name)
        .ok_or_else(|| Ww3VisError::VariableNotFound {
            var: name.to_string(),
        })
}

fn dim_names(var: &Variable) -> Vec<String> {
    var.dimensions().iter().map(|d| d.name().to_string()).collect()
}

fn read_coordinates(file: &File, names: &CoordinateNames) -> Result<Option<Coordinates>> {
    let (lon_var, lat_var) = match (
        file.variable(&names.longitude),
        file.variable(&names.latitude),
    ) {
        (Some(lon), Some(lat)) => (lon, lat),
        _ => return Ok(None),
    };

    let lon = lon_var.get_values::<f64, _>(..)?;
    let lat = lat_var.get_values::<f64, _>(..)?;
    let lon_dims = dim_names(&lon_var);
    let lat_dims = dim_names(&lat_var);

    let coords = match (lon_dims.len(), lat_dims.len()) {
        (1, 1) if lon_dims == lat_dims => {
            if lon.len() != lat.len() {
                return Err(Ww3VisError::shape_mismatch(
                    "coordinate arrays",
                    lon.len(),
                    lat.len(),
                ));
            }
            Coordinates {
                lon,
                lat,
                layout: GridLayout::Unstructured,
            }
        }
        (1, 1) => {
            // Separate lon/lat axes: expand to the full grid, rows are latitudes
            let (nlat, nlon) = (lat.len(), lon.len());
            let mut node_lon = Vec::with_capacity(nlat * nlon);
            let mut node_lat = Vec::with_capacity(nlat * nlon);
            for &y in &lat {
                for &x in &lon {
                    node_lon.push(x);
                    node_lat.push(y);
                }
            }
            Coordinates {
                lon: node_lon,
                lat: node_lat,
                layout: GridLayout::Structured { nlat, nlon },
            }
        }
        (2, 2) => {
            let shape: Vec<usize> = lon_var.dimensions().iter().map(|d| d.len()).collect();
            if lon.len() != lat.len() {
                return Err(Ww3VisError::shape_mismatch(
                    "2-D coordinate arrays",
                    lon.len(),
                    lat.len(),
                ));
            }
            Coordinates {
                lon,
                lat,
                layout: GridLayout::Structured {
                    nlat: shape[0],
                    nlon: shape[1],
                },
            }
        }
        (a, b) => {
            return Err(Ww3VisError::shape_mismatch(
                "coordinate dimensionality",
                "1-D or 2-D longitude/latitude",
                format!("{a}-D longitude, {b}-D latitude"),
            ))
        }
    };

    Ok(Some(coords))
}

/// One or more wave-model files aggregated along time
pub struct WaveDataset {
    pattern: String,
    paths: Vec<PathBuf>,
    files: Vec<File>,
    /// global time index -> (file index, record within file)
    records: Vec<(usize, usize)>,
    times: Vec<f64>,
    time_axis: TimeAxis,
    coords: Option<Coordinates>,
}

impl std::fmt::Debug for WaveDataset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WaveDataset")
            .field("pattern", &self.pattern)
            .field("paths", &self.paths)
            .field("steps", &self.times.len())
            .field("nodes", &self.coords.as_ref().map(Coordinates::len))
            .finish()
    }
}

impl WaveDataset {
    /// Open every file matching `pattern` using the standard WW3 variable names
    pub fn open(pattern: &str) -> Result<Self> {
        Self::open_with(pattern, &CoordinateNames::default())
    }

    pub fn open_with(pattern: &str, names: &CoordinateNames) -> Result<Self> {
        let paths = resolve_pattern(pattern)?;
        info!(pattern, files = paths.len(), "Opening wave dataset");

        let mut files = Vec::with_capacity(paths.len());
        let mut records = Vec::new();
        let mut times = Vec::new();
        let mut time_axis = TimeAxis::default();
        let mut coords: Option<Coordinates> = None;

        for (file_idx, path) in paths.iter().enumerate() {
            let file = netcdf::open(path)?;
            debug!(path = %path.display(), "Opened NetCDF file");

            let file_coords = read_coordinates(&file, names)?;
            if file_idx == 0 {
                coords = file_coords;
            } else if let (Some(first), Some(this)) = (&coords, &file_coords) {
                if first.len() != this.len() {
                    return Err(Ww3VisError::shape_mismatch(
                        format!("node count of {}", path.display()),
                        first.len(),
                        this.len(),
                    ));
                }
            }

            let time_var = variable(&file, &names.time)?;
            if file_idx == 0 {
                if let Some(units) = attribute_str(&time_var, "units") {
                    time_axis = TimeAxis::from_units(&units)?;
                }
            }
            let file_times = time_var.get_values::<f64, _>(..)?;
            for (local, &t) in file_times.iter().enumerate() {
                records.push((file_idx, local));
                times.push(t);
            }
            drop(time_var);
            files.push(file);
        }

        if let Some(c) = &coords {
            info!(
                nodes = c.len(),
                steps = times.len(),
                layout = ?c.layout,
                "Wave dataset ready"
            );
        }

        Ok(Self {
            pattern: pattern.to_string(),
            paths,
            files,
            records,
            times,
            time_axis,
            coords,
        })
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    /// Number of time steps across all files
    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Raw time offsets as stored in the files
    pub fn times(&self) -> &[f64] {
        &self.times
    }

    pub fn time_axis(&self) -> TimeAxis {
        self.time_axis
    }

    pub fn datetime(&self, t: usize) -> Result<NaiveDateTime> {
        let offset = self.times.get(t).copied().ok_or_else(|| {
            Ww3VisError::shape_mismatch("time index", format!("< {}", self.len()), t)
        })?;
        self.time_axis.offset_to_datetime(offset)
    }

    /// Node coordinates; errors when the files carry no longitude/latitude
    pub fn coordinates(&self) -> Result<&Coordinates> {
        self.coords
            .as_ref()
            .ok_or_else(|| Ww3VisError::VariableNotFound {
                var: "longitude/latitude".to_string(),
            })
    }

    /// Read time step `t` of `var_name`, unpacked and with missing values as NaN
    pub fn read_record(&self, var_name: &str, t: usize) -> Result<Vec<f64>> {
        let &(file_idx, local) = self.records.get(t).ok_or_else(|| {
            Ww3VisError::shape_mismatch("time index", format!("< {}", self.len()), t)
        })?;
        let file = &self.files[file_idx];
        let var = variable(file, var_name)?;

        let shape: Vec<usize> = var.dimensions().iter().map(|d| d.len()).collect();
        if shape.first().copied().unwrap_or(0) <= local {
            return Err(Ww3VisError::shape_mismatch(
                format!("record dimension of '{var_name}'"),
                format!("> {local}"),
                format!("{shape:?}"),
            ));
        }

        let mut values: Vec<f64> = match shape.len() {
            2 => var.get_values::<f64, _>((local..local + 1, ..))?,
            3 => var.get_values::<f64, _>((local..local + 1, .., ..))?,
            n => {
                return Err(Ww3VisError::shape_mismatch(
                    format!("dimensions of '{var_name}'"),
                    "(time, node) or (time, lat, lon)",
                    format!("{n}-D"),
                ))
            }
        };
        Packing::from_variable(&var).unpack(&mut values);

        if let Some(c) = &self.coords {
            if values.len() != c.len() {
                return Err(Ww3VisError::shape_mismatch(
                    format!("record of '{var_name}'"),
                    c.len(),
                    values.len(),
                ));
            }
        }
        Ok(values)
    }

    /// Every record of `var_name` stacked as (time, node)
    pub fn read_all(&self, var_name: &str) -> Result<Array2<f64>> {
        let mut flat = Vec::new();
        let mut width = None;
        for t in 0..self.len() {
            let record = self.read_record(var_name, t)?;
            match width {
                None => width = Some(record.len()),
                Some(w) if w != record.len() => {
                    return Err(Ww3VisError::shape_mismatch(
                        format!("record {t} of '{var_name}'"),
                        w,
                        record.len(),
                    ))
                }
                _ => {}
            }
            flat.extend(record);
        }
        Ok(Array2::from_shape_vec(
            (self.len(), width.unwrap_or(0)),
            flat,
        )?)
    }

    /// Paired datasets must describe the same nodes at the same instants
    pub fn check_aligned(&self, other: &WaveDataset) -> Result<()> {
        let (a, b) = (self.coordinates()?, other.coordinates()?);
        if a.len() != b.len() {
            return Err(Ww3VisError::shape_mismatch(
                format!("node count of '{}' vs '{}'", self.pattern, other.pattern),
                a.len(),
                b.len(),
            ));
        }
        if self.len() != other.len() {
            return Err(Ww3VisError::shape_mismatch(
                format!("time steps of '{}' vs '{}'", self.pattern, other.pattern),
                self.len(),
                other.len(),
            ));
        }
        for t in 0..self.len() {
            let (ta, tb) = (self.datetime(t)?, other.datetime(t)?);
            if (ta - tb).num_seconds().abs() > 1 {
                return Err(Ww3VisError::shape_mismatch(
                    format!("time step {t} of '{}' vs '{}'", self.pattern, other.pattern),
                    ta,
                    tb,
                ));
            }
        }
        Ok(())
    }
}
