#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime};
use ndarray::Array2;

use cloudband_core::classify::candidates_to_bands;
use cloudband_core::{CloudBand, Grid, ResolutionField};

/// Midnight of the given day.
pub fn date(year: i32, month: u32, day: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(year, month, day)
        .expect("valid date")
        .and_hms_opt(0, 0, 0)
        .expect("valid time")
}

/// Regional grid: `h` latitudes from 0 going south, `w` longitudes from 0
/// going east, both with `step` degrees spacing.
pub fn regional_grid(h: usize, w: usize, step: f64) -> Grid {
    let lats = (0..h).map(|i| -(i as f64) * step).collect();
    let lons = (0..w).map(|i| i as f64 * step).collect();
    Grid::new(lats, lons).expect("valid grid")
}

/// Global grid with 2 degree longitude spacing (0..358) and `h` latitudes
/// from 0 going south.
pub fn global_grid(h: usize) -> Grid {
    regional_grid(h, 180, 2.0)
}

/// Every cell is `cell_km2` square kilometers.
pub fn uniform_resolution(h: usize, w: usize, cell_km2: f64) -> ResolutionField {
    ResolutionField::from_cells(Array2::from_elem((h, w), cell_km2)).expect("valid cells")
}

/// Build a mask from rows of text: `#` is set, anything else is clear.
pub fn mask_from(rows: &[&str]) -> Array2<bool> {
    let h = rows.len();
    let w = rows[0].len();
    Array2::from_shape_fn((h, w), |(r, c)| rows[r].as_bytes()[c] == b'#')
}

/// Rectangle of set pixels `[r0, r1) x [c0, c1)` in an `h x w` mask.
pub fn rect_mask(h: usize, w: usize, r0: usize, r1: usize, c0: usize, c1: usize) -> Array2<bool> {
    Array2::from_shape_fn((h, w), |(r, c)| r >= r0 && r < r1 && c >= c0 && c < c1)
}

/// Three pixels wide diagonal running south-east: rows `0..len`, columns
/// `r..r + 3` on row `r`.
pub fn diagonal_mask(h: usize, w: usize, len: usize) -> Array2<bool> {
    Array2::from_shape_fn((h, w), |(r, c)| r < len && c >= r && c < r + 3)
}

/// Classify a single-region mask into one band record.
pub fn band_from_mask(
    mask: &Array2<bool>,
    timestamp: NaiveDateTime,
    resolution: &ResolutionField,
    grid: &Grid,
) -> CloudBand {
    let labels = mask.mapv(|m| m as u32);
    let mut bands = candidates_to_bands(&labels, timestamp, resolution, grid);
    assert_eq!(bands.len(), 1, "mask must hold exactly one region");
    bands.remove(0)
}

/// Like [`band_from_mask`], flagged as an accepted cloud band.
pub fn accepted_band(
    mask: &Array2<bool>,
    timestamp: NaiveDateTime,
    resolution: &ResolutionField,
    grid: &Grid,
) -> CloudBand {
    let mut band = band_from_mask(mask, timestamp, resolution, grid);
    band.is_cloud_band = true;
    band
}
