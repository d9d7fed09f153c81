//! Observation-point location files (`*.loc`)
//!
//! One point per line: longitude, latitude, optionally a name. Anything
//! after `$` is a comment.

use crate::errors::{Result, Ww3VisError};
use std::fs;
use std::path::Path;

/// A fixed observation point drawn as a marker on the map
#[derive(Debug, Clone, PartialEq)]
pub struct Station {
    pub lon: f64,
    pub lat: f64,
    pub label: Option<String>,
}

/// Parse the contents of a location file
pub fn parse_stations(text: &str) -> Result<Vec<Station>> {
    let mut stations = Vec::new();

    for (idx, raw_line) in text.lines().enumerate() {
        let line = raw_line.split('$').next().unwrap_or("").trim();
        if line.is_empty() {
            continue;
        }

        let mut fields = line.split_whitespace();
        let mut number = |what: &str| -> Result<f64> {
            let token = fields.next().ok_or_else(|| Ww3VisError::StationFile {
                line: idx + 1,
                message: format!("missing {what}"),
            })?;
            token.parse::<f64>().map_err(|_| Ww3VisError::StationFile {
                line: idx + 1,
                message: format!("invalid {what} '{token}'"),
            })
        };
        let lon = number("longitude")?;
        let lat = number("latitude")?;

        let rest: Vec<&str> = fields.collect();
        let label = if rest.is_empty() {
            None
        } else {
            let joined = rest.join(" ");
            let trimmed = joined.trim_matches(|c| c == '\'' || c == '"').trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        };

        stations.push(Station { lon, lat, label });
    }

    Ok(stations)
}

/// Read a location file from disk
pub fn read_stations(path: &Path) -> Result<Vec<Station>> {
    let text = fs::read_to_string(path)?;
    parse_stations(&text)
}
