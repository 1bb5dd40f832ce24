use std::collections::BTreeSet;

use chrono::NaiveDateTime;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::time::date_to_number;

/// Stable key of a cloud band: its date number and its centroid longitude
/// rounded to the nearest degree.
///
/// Two bands of the same timestep whose centroids round to the same
/// longitude share an id; the tracker then cannot tell them apart as parents.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BandId {
    /// Hours since 1900-01-01 00:00.
    pub date_number: i64,
    /// Centroid longitude, rounded half to even (degrees).
    pub longitude: i64,
}

impl BandId {
    pub fn new(timestamp: NaiveDateTime, centroid_lon: f64) -> Self {
        Self {
            date_number: date_to_number(timestamp),
            longitude: centroid_lon.round_ties_even() as i64,
        }
    }
}

impl std::fmt::Display for BandId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}_{}", self.date_number, self.longitude)
    }
}

/// Closed coordinate interval in degrees.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CoordRange {
    pub min: f64,
    pub max: f64,
}

/// One elongated cloud structure at one timestep.
///
/// Created by classification, annotated with `parents` by the tracker and
/// persisted as-is. Every field round-trips through serde.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CloudBand {
    pub id: BandId,
    pub timestamp: NaiveDateTime,
    /// This band's pixels, same shape as the field.
    pub mask: Array2<bool>,
    /// Sum of the cell areas under `mask` (km^2).
    pub area_km2: f64,
    /// Latitudes spanned by the footprint.
    pub latitude_range: CoordRange,
    /// Longitudes spanned by the footprint.
    pub longitude_range: CoordRange,
    /// Pixel bounding box: (min_row, max_row, min_col, max_col).
    pub bbox: (usize, usize, usize, usize),
    /// Angle (degrees, [-90, 90]) between the raster's row axis and the major
    /// axis of the best-fit ellipse; 0 for degenerate footprints.
    pub orientation_deg: f64,
    pub centroid_lat: f64,
    pub centroid_lon: f64,
    /// The footprint touches both edges of a 0/360 degree domain.
    pub crosses_antimeridian: bool,
    /// Passed the geometric acceptance criteria.
    pub is_cloud_band: bool,
    /// Bands of the previous timestep this band inherits from.
    pub parents: BTreeSet<BandId>,
}

impl CloudBand {
    pub fn pixel_count(&self) -> usize {
        self.mask.iter().filter(|&&m| m).count()
    }

    /// True if the two bounding boxes share at least one pixel.
    pub fn bbox_intersects(&self, other: &CloudBand) -> bool {
        self.bbox_intersection(other).is_some()
    }

    /// Bounding box shared by both bands, if any.
    pub fn bbox_intersection(&self, other: &CloudBand) -> Option<(usize, usize, usize, usize)> {
        let (a0, a1, a2, a3) = self.bbox;
        let (b0, b1, b2, b3) = other.bbox;
        let min_row = a0.max(b0);
        let max_row = a1.min(b1);
        let min_col = a2.max(b2);
        let max_col = a3.min(b3);
        (min_row <= max_row && min_col <= max_col).then_some((min_row, max_row, min_col, max_col))
    }
}
