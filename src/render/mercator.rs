//! Spherical Mercator projection over a lon/lat box

use std::f64::consts::FRAC_PI_4;

/// Latitude limit keeping `ln tan` finite
const MAX_LAT: f64 = 89.5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mercator {
    pub lon_min: f64,
    pub lon_max: f64,
    pub lat_min: f64,
    pub lat_max: f64,
}

impl Mercator {
    pub fn new(lon_min: f64, lon_max: f64, lat_min: f64, lat_max: f64) -> Self {
        Self {
            lon_min,
            lon_max,
            lat_min: lat_min.clamp(-MAX_LAT, MAX_LAT),
            lat_max: lat_max.clamp(-MAX_LAT, MAX_LAT),
        }
    }

    /// Projected northing (radians) of a latitude in degrees
    pub fn y(lat: f64) -> f64 {
        let phi = lat.clamp(-MAX_LAT, MAX_LAT).to_radians();
        (FRAC_PI_4 + phi / 2.0).tan().ln()
    }

    /// Latitude in degrees of a projected northing
    pub fn lat(y: f64) -> f64 {
        (2.0 * y.exp().atan() - std::f64::consts::FRAC_PI_2).to_degrees()
    }

    pub fn width(&self) -> f64 {
        (self.lon_max - self.lon_min).to_radians()
    }

    pub fn height(&self) -> f64 {
        Self::y(self.lat_max) - Self::y(self.lat_min)
    }

    /// Projected height over width; 1 for a degenerate box
    pub fn aspect(&self) -> f64 {
        let (w, h) = (self.width(), self.height());
        if w > 0.0 && h > 0.0 {
            h / w
        } else {
            1.0
        }
    }

    /// Position inside the box as fractions: (0, 0) south-west, (1, 1) north-east
    pub fn to_unit(&self, lon: f64, lat: f64) -> (f64, f64) {
        let w = self.lon_max - self.lon_min;
        let h = self.height();
        let u = if w > 0.0 { (lon - self.lon_min) / w } else { 0.5 };
        let v = if h > 0.0 {
            (Self::y(lat) - Self::y(self.lat_min)) / h
        } else {
            0.5
        };
        (u, v)
    }

    /// Inverse of [`Self::to_unit`]
    pub fn from_unit(&self, u: f64, v: f64) -> (f64, f64) {
        let lon = self.lon_min + u * (self.lon_max - self.lon_min);
        let lat = Self::lat(Self::y(self.lat_min) + v * self.height());
        (lon, lat)
    }
}
