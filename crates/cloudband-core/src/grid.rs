//! Latitude/longitude raster coordinates.
//!
//! Rows follow latitude (north to south), columns follow longitude (west to
//! east). Every raster in the crate is indexed `[[row, col]]` on this grid.

use serde::{Deserialize, Serialize};

use crate::error::{CloudBandError, Result};

/// Direction of a 1-D coordinate axis.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AxisOrder {
    Increasing,
    Decreasing,
}

/// A validated lat/lon grid. Latitudes strictly decrease, longitudes strictly
/// increase, and both axes hold at least two points.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Grid {
    latitudes: Vec<f64>,
    longitudes: Vec<f64>,
}

impl Grid {
    /// Build a grid from north-to-south latitudes and west-to-east longitudes.
    ///
    /// Fails with [`CloudBandError::InvalidGrid`] if an axis has fewer than two
    /// points or is not strictly monotonic in the expected direction. Use
    /// [`crate::field::FieldSeries::new`] to accept south-to-north input.
    pub fn new(latitudes: Vec<f64>, longitudes: Vec<f64>) -> Result<Self> {
        check_len("latitude", &latitudes)?;
        check_len("longitude", &longitudes)?;
        if axis_order(&latitudes) != Some(AxisOrder::Decreasing) {
            return Err(CloudBandError::InvalidGrid(
                "latitudes must be strictly decreasing (north to south)".into(),
            ));
        }
        if axis_order(&longitudes) != Some(AxisOrder::Increasing) {
            return Err(CloudBandError::InvalidGrid(
                "longitudes must be strictly increasing (west to east)".into(),
            ));
        }
        Ok(Self {
            latitudes,
            longitudes,
        })
    }

    pub fn latitudes(&self) -> &[f64] {
        &self.latitudes
    }

    pub fn longitudes(&self) -> &[f64] {
        &self.longitudes
    }

    /// Raster shape `(n_lat, n_lon)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.latitudes.len(), self.longitudes.len())
    }

    /// True if the longitude axis closes on itself: the last column plus one
    /// spacing lands on the first column modulo 360 degrees.
    pub fn is_global(&self) -> bool {
        let n = self.longitudes.len();
        let first = self.longitudes[0];
        let last = self.longitudes[n - 1];
        let step = (last - first) / (n - 1) as f64;
        ((last - first + step) - 360.0).abs() <= step * 0.5
    }
}

fn check_len(name: &str, axis: &[f64]) -> Result<()> {
    if axis.len() < 2 {
        return Err(CloudBandError::InvalidGrid(format!(
            "{name} axis needs at least 2 points, got {}",
            axis.len()
        )));
    }
    if axis.iter().any(|v| !v.is_finite()) {
        return Err(CloudBandError::InvalidGrid(format!(
            "{name} axis contains non-finite values"
        )));
    }
    Ok(())
}

/// Strict ordering of an axis, or `None` if it is not monotonic.
pub fn axis_order(axis: &[f64]) -> Option<AxisOrder> {
    if axis.windows(2).all(|w| w[1] < w[0]) {
        Some(AxisOrder::Decreasing)
    } else if axis.windows(2).all(|w| w[1] > w[0]) {
        Some(AxisOrder::Increasing)
    } else {
        None
    }
}

/// Wrap a longitude in degrees into [0, 360).
pub fn wrap_to_360(lon: f64) -> f64 {
    if lon < 0.0 {
        360.0 + lon
    } else {
        lon
    }
}

/// Wrap a longitude in degrees into [-180, 180].
pub fn wrap_to_180(lon: f64) -> f64 {
    if lon > 180.0 {
        lon - 360.0
    } else {
        lon
    }
}
