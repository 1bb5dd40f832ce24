mod common;

use approx::assert_relative_eq;
use ndarray::Array2;

use cloudband_core::grid::{axis_order, wrap_to_180, wrap_to_360, AxisOrder};
use cloudband_core::resolution::haversine_km;
use cloudband_core::{CloudBandError, Grid, ResolutionField};

use common::{global_grid, mask_from, regional_grid, uniform_resolution};

// ---------------------------------------------------------------------------
// Grid
// ---------------------------------------------------------------------------

#[test]
fn test_grid_shape() {
    let grid = regional_grid(5, 7, 1.0);
    assert_eq!(grid.shape(), (5, 7));
    assert_eq!(grid.latitudes()[4], -4.0);
    assert_eq!(grid.longitudes()[6], 6.0);
}

#[test]
fn test_grid_rejects_increasing_latitudes() {
    let err = Grid::new(vec![-10.0, 0.0], vec![0.0, 1.0]).unwrap_err();
    assert!(matches!(err, CloudBandError::InvalidGrid(_)), "got {err:?}");
}

#[test]
fn test_grid_rejects_decreasing_longitudes() {
    let err = Grid::new(vec![0.0, -1.0], vec![1.0, 0.0]).unwrap_err();
    assert!(matches!(err, CloudBandError::InvalidGrid(_)), "got {err:?}");
}

#[test]
fn test_grid_rejects_single_point_axis() {
    assert!(Grid::new(vec![0.0], vec![0.0, 1.0]).is_err());
    assert!(Grid::new(vec![0.0, -1.0], vec![0.0]).is_err());
}

#[test]
fn test_grid_rejects_nan_coordinate() {
    assert!(Grid::new(vec![0.0, f64::NAN], vec![0.0, 1.0]).is_err());
}

#[test]
fn test_grid_is_global() {
    assert!(global_grid(4).is_global());
    assert!(!regional_grid(4, 40, 2.0).is_global());
}

#[test]
fn test_axis_order() {
    assert_eq!(axis_order(&[1.0, 2.0, 3.0]), Some(AxisOrder::Increasing));
    assert_eq!(axis_order(&[3.0, 2.0, 1.0]), Some(AxisOrder::Decreasing));
    assert_eq!(axis_order(&[1.0, 3.0, 2.0]), None);
    assert_eq!(axis_order(&[1.0, 1.0]), None);
}

#[test]
fn test_wrap_longitudes() {
    assert_eq!(wrap_to_360(-10.0), 350.0);
    assert_eq!(wrap_to_360(10.0), 10.0);
    assert_eq!(wrap_to_360(0.0), 0.0);
    assert_eq!(wrap_to_180(190.0), -170.0);
    assert_eq!(wrap_to_180(180.0), 180.0);
    assert_eq!(wrap_to_180(-20.0), -20.0);
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

#[test]
fn test_haversine_one_degree_of_latitude() {
    // 2 * pi * 6371.0088 / 360
    let d = haversine_km(0.0, 0.0, 1.0, 0.0);
    assert_relative_eq!(d, 111.1950802, epsilon = 1e-4);
}

#[test]
fn test_haversine_longitude_shrinks_with_latitude() {
    let equator = haversine_km(0.0, 0.0, 0.0, 1.0);
    let sixty = haversine_km(-60.0, 0.0, -60.0, 1.0);
    assert!(sixty < equator * 0.51 && sixty > equator * 0.49, "got {sixty} vs {equator}");
}

#[test]
fn test_resolution_equator_cell() {
    let grid = regional_grid(3, 3, 1.0);
    let res = ResolutionField::from_grid(&grid);
    let side = haversine_km(0.0, 0.0, 1.0, 0.0);
    assert_relative_eq!(res.cells()[[0, 0]], side * side, max_relative = 1e-9);
}

#[test]
fn test_resolution_last_column_and_row_difference_backwards() {
    let grid = regional_grid(3, 4, 1.0);
    let res = ResolutionField::from_grid(&grid);
    let cells = res.cells();
    // Same latitude, same spacing: last column copies its neighbor spacing.
    assert_relative_eq!(cells[[0, 3]], cells[[0, 2]], max_relative = 1e-12);
    // Last row uses the spacing between rows 1 and 2 and its own latitude.
    assert!(cells[[2, 0]] > 0.0);
    assert!(cells[[2, 0]] < cells[[0, 0]], "poleward cells are smaller");
}

#[test]
fn test_resolution_from_cells_rejects_negative() {
    let err = ResolutionField::from_cells(Array2::from_elem((2, 2), -1.0)).unwrap_err();
    assert!(matches!(err, CloudBandError::InvalidGrid(_)));
}

#[test]
fn test_area_of_mask() {
    let res = uniform_resolution(3, 3, 2.5);
    let mask = mask_from(&["##.", "...", "..#"]);
    assert_relative_eq!(res.area_of(&mask), 7.5);
}

#[test]
fn test_label_areas_indexed_by_label() {
    let res = uniform_resolution(2, 3, 10.0);
    let labels = Array2::from_shape_vec((2, 3), vec![1, 1, 0, 2, 0, 1]).unwrap();
    let areas = res.label_areas(&labels);
    assert_eq!(areas.len(), 3);
    assert_relative_eq!(areas[0], 0.0);
    assert_relative_eq!(areas[1], 30.0);
    assert_relative_eq!(areas[2], 10.0);
}

#[test]
fn test_overlap_area() {
    let res = uniform_resolution(3, 3, 1.0);
    let a = mask_from(&["##.", "##.", "..."]);
    let b = mask_from(&[".##", ".##", "..."]);
    assert_relative_eq!(res.overlap_area(&a, &b, (0, 1, 1, 1)), 2.0);
}
