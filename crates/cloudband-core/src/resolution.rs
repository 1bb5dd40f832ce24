//! Physical area of every grid cell.
//!
//! Cell width is the great-circle distance to the next longitude along the
//! cell's latitude, cell height the distance to the next latitude along its
//! longitude. The last column and last row difference backwards, so edge
//! cells carry the width of their neighbor spacing rather than a half cell.

use ndarray::{Array2, Zip};

use crate::consts::EARTH_RADIUS_KM;
use crate::error::{CloudBandError, Result};
use crate::grid::Grid;

/// Cell areas in km^2, same shape as the grid.
///
/// Computed once per grid and shared read-only by detection, classification,
/// tracking and density; clone it into worker threads freely.
#[derive(Clone, Debug, PartialEq)]
pub struct ResolutionField {
    cells: Array2<f64>,
}

impl ResolutionField {
    pub fn from_grid(grid: &Grid) -> Self {
        let lats = grid.latitudes();
        let lons = grid.longitudes();
        let (h, w) = grid.shape();

        let cells = Array2::from_shape_fn((h, w), |(row, col)| {
            let (c0, c1) = neighbor_pair(col, w);
            let (r0, r1) = neighbor_pair(row, h);
            let dx = haversine_km(lats[row], lons[c0], lats[row], lons[c1]);
            let dy = haversine_km(lats[r0], lons[col], lats[r1], lons[col]);
            dx * dy
        });

        Self { cells }
    }

    /// Wrap a precomputed area raster (km^2). Fails on negative or non-finite cells.
    pub fn from_cells(cells: Array2<f64>) -> Result<Self> {
        if cells.nrows() == 0 || cells.ncols() == 0 {
            return Err(CloudBandError::InvalidGrid("empty resolution field".into()));
        }
        if cells.iter().any(|v| !v.is_finite() || *v < 0.0) {
            return Err(CloudBandError::InvalidGrid(
                "resolution cells must be finite and non-negative".into(),
            ));
        }
        Ok(Self { cells })
    }

    pub fn cells(&self) -> &Array2<f64> {
        &self.cells
    }

    pub fn dim(&self) -> (usize, usize) {
        self.cells.dim()
    }

    /// Total area (km^2) of the cells set in `mask`.
    pub fn area_of(&self, mask: &Array2<bool>) -> f64 {
        let mut total = 0.0;
        Zip::from(mask).and(&self.cells).for_each(|&m, &a| {
            if m {
                total += a;
            }
        });
        total
    }

    /// Area of every label in a label raster, indexed by label (index 0 is background).
    pub fn label_areas(&self, labels: &Array2<u32>) -> Vec<f64> {
        let max_label = labels.iter().copied().max().unwrap_or(0) as usize;
        let mut areas = vec![0.0; max_label + 1];
        Zip::from(labels).and(&self.cells).for_each(|&l, &a| {
            if l != 0 {
                areas[l as usize] += a;
            }
        });
        areas
    }

    /// Area of the intersection of two masks, restricted to a bounding box
    /// `(min_row, max_row, min_col, max_col)` known to contain it.
    pub fn overlap_area(
        &self,
        a: &Array2<bool>,
        b: &Array2<bool>,
        bbox: (usize, usize, usize, usize),
    ) -> f64 {
        let (min_row, max_row, min_col, max_col) = bbox;
        let mut total = 0.0;
        for row in min_row..=max_row {
            for col in min_col..=max_col {
                if a[[row, col]] && b[[row, col]] {
                    total += self.cells[[row, col]];
                }
            }
        }
        total
    }
}

/// Index pair used to difference position `i` on an axis of length `n`:
/// forward everywhere except the last point, which differences backward.
fn neighbor_pair(i: usize, n: usize) -> (usize, usize) {
    if i + 1 < n {
        (i, i + 1)
    } else {
        (i - 1, i)
    }
}

/// Great-circle distance in km between two points given in degrees.
pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let dphi = (lat2 - lat1).to_radians();
    let dlambda = (lon2 - lon1).to_radians();

    let a = (dphi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (dlambda / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * a.sqrt().min(1.0).asin()
}
