//! Candidate blobs to [`CloudBand`] records, and the geometric acceptance rule.

use std::collections::BTreeSet;

use chrono::NaiveDateTime;
use ndarray::Array2;
use tracing::debug;

use crate::cloudband::{BandId, CloudBand, CoordRange};
use crate::consts::{ANTIMERIDIAN_SPAN_LON, EPSILON};
use crate::detection::components::component_stats;
use crate::detection::DetectionParameters;
use crate::grid::{wrap_to_360, Grid};
use crate::resolution::ResolutionField;

/// Pixel-space moments of a binary region.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RegionGeometry {
    pub pixels: usize,
    /// Mean row index of the region's pixels.
    pub centroid_row: f64,
    /// Mean column index of the region's pixels.
    pub centroid_col: f64,
    /// Angle (radians) between the row axis and the major axis of the
    /// ellipse with the same second moments, in [-pi/2, pi/2].
    pub orientation: f64,
}

/// Centroid and orientation of the pixels of `mask` inside `bbox`.
///
/// With row variance `r`, column variance `c` and covariance `rc`, the
/// orientation is `0.5 * atan2(2 rc, r - c)`; when `r == c` it is +/- pi/4 by
/// the sign of `rc`. Single pixels and isotropic regions (`r == c`,
/// `rc == 0`) have orientation 0.
pub fn region_geometry(
    mask: &Array2<bool>,
    bbox: (usize, usize, usize, usize),
) -> Option<RegionGeometry> {
    let (min_row, max_row, min_col, max_col) = bbox;
    let mut n = 0usize;
    let mut sum_r = 0.0_f64;
    let mut sum_c = 0.0_f64;
    for row in min_row..=max_row {
        for col in min_col..=max_col {
            if mask[[row, col]] {
                n += 1;
                sum_r += row as f64;
                sum_c += col as f64;
            }
        }
    }
    if n == 0 {
        return None;
    }
    let mean_r = sum_r / n as f64;
    let mean_c = sum_c / n as f64;

    let mut mu_rr = 0.0_f64;
    let mut mu_cc = 0.0_f64;
    let mut mu_rc = 0.0_f64;
    for row in min_row..=max_row {
        for col in min_col..=max_col {
            if mask[[row, col]] {
                let dr = row as f64 - mean_r;
                let dc = col as f64 - mean_c;
                mu_rr += dr * dr;
                mu_cc += dc * dc;
                mu_rc += dr * dc;
            }
        }
    }

    let orientation = if (mu_rr - mu_cc).abs() < EPSILON {
        if mu_rc.abs() < EPSILON {
            0.0
        } else if mu_rc > 0.0 {
            std::f64::consts::FRAC_PI_4
        } else {
            -std::f64::consts::FRAC_PI_4
        }
    } else {
        0.5 * (2.0 * mu_rc).atan2(mu_rr - mu_cc)
    };

    Some(RegionGeometry {
        pixels: n,
        centroid_row: mean_r,
        centroid_col: mean_c,
        orientation,
    })
}

/// Turn every nonzero label of a candidate raster into a [`CloudBand`],
/// in ascending label order. Records are returned with `is_cloud_band = false`.
pub fn candidates_to_bands(
    labelled_candidates: &Array2<u32>,
    timestamp: NaiveDateTime,
    resolution: &ResolutionField,
    grid: &Grid,
) -> Vec<CloudBand> {
    let lats = grid.latitudes();
    let lons = grid.longitudes();

    component_stats(labelled_candidates)
        .into_iter()
        .filter_map(|stats| {
            let mask = labelled_candidates.mapv(|l| l == stats.label);
            let geometry = region_geometry(&mask, stats.bbox)?;
            let (min_row, max_row, min_col, max_col) = stats.bbox;

            let longitude_range = CoordRange {
                min: lons[min_col],
                max: lons[max_col],
            };
            let crosses_antimeridian = wrap_to_360(longitude_range.min) == 0.0
                && wrap_to_360(longitude_range.max) > ANTIMERIDIAN_SPAN_LON;

            // Pixel centroid truncated onto the grid.
            let centroid_lat = lats[geometry.centroid_row as usize];
            let centroid_lon = lons[geometry.centroid_col as usize];

            Some(CloudBand {
                id: BandId::new(timestamp, centroid_lon),
                timestamp,
                area_km2: resolution.area_of(&mask),
                mask,
                latitude_range: CoordRange {
                    min: lats[max_row],
                    max: lats[min_row],
                },
                longitude_range,
                bbox: stats.bbox,
                orientation_deg: geometry.orientation.to_degrees(),
                centroid_lat,
                centroid_lon,
                crosses_antimeridian,
                is_cloud_band: false,
                parents: BTreeSet::new(),
            })
        })
        .collect()
}

/// Geometric acceptance thresholds, all in degrees.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AcceptanceCriteria {
    pub angle_min: f64,
    pub angle_max: f64,
    pub top_latitude: f64,
    pub bottom_latitude: f64,
}

impl From<&DetectionParameters> for AcceptanceCriteria {
    fn from(params: &DetectionParameters) -> Self {
        Self {
            angle_min: params.angle_min,
            angle_max: params.angle_max,
            top_latitude: params.top_latitude,
            bottom_latitude: params.bottom_latitude,
        }
    }
}

/// Orientation measured against the hemisphere's reference axis: -90 degrees
/// south of the equator, +90 degrees otherwise.
pub fn hemisphere_angle(band: &CloudBand) -> f64 {
    let hemisphere_axis = if band.centroid_lat < 0.0 { -90.0 } else { 90.0 };
    band.orientation_deg + hemisphere_axis
}

/// The band reaches `bottom_latitude` on its poleward side and
/// `top_latitude` on its equatorward side; bands crossing the antimeridian
/// seam skip the orientation test.
pub fn is_cloud_band(band: &CloudBand, criteria: &AcceptanceCriteria) -> bool {
    let spans_latitudes = band.latitude_range.min <= criteria.bottom_latitude
        && band.latitude_range.max >= criteria.top_latitude;
    if band.crosses_antimeridian {
        return spans_latitudes;
    }
    let angle = hemisphere_angle(band);
    criteria.angle_min < angle && angle < criteria.angle_max && spans_latitudes
}

/// Flag every candidate that passes [`is_cloud_band`].
pub fn flag_cloud_bands(candidates: &mut [CloudBand], criteria: &AcceptanceCriteria) {
    for band in candidates.iter_mut() {
        band.is_cloud_band = is_cloud_band(band, criteria);
    }
}

/// Keep only the candidates that pass [`is_cloud_band`], flagged as accepted.
pub fn filter_cloud_bands(
    mut candidates: Vec<CloudBand>,
    criteria: &AcceptanceCriteria,
) -> Vec<CloudBand> {
    flag_cloud_bands(&mut candidates, criteria);
    let before = candidates.len();
    candidates.retain(|b| b.is_cloud_band);
    debug!(candidates = before, accepted = candidates.len(), "Cloud band filtering done");
    candidates
}
