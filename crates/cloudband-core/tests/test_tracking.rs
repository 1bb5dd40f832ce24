mod common;

use approx::assert_relative_eq;
use chrono::NaiveDateTime;

use cloudband_core::archive::CloudBandArchive;
use cloudband_core::tracking::{
    children_of, find_band, is_parent, overlap_area, track, track_domains,
};
use cloudband_core::progress::Stage;
use cloudband_core::{BandId, CloudBand, CloudBandError, Grid, ResolutionField};

use common::{accepted_band, date, rect_mask, regional_grid, uniform_resolution};

const N: usize = 30;

fn setup() -> (Grid, ResolutionField) {
    (regional_grid(N, N, 2.0), uniform_resolution(N, N, 1.0))
}

fn rect_band(
    t: NaiveDateTime,
    rows: (usize, usize),
    cols: (usize, usize),
    grid: &Grid,
    res: &ResolutionField,
) -> CloudBand {
    accepted_band(&rect_mask(N, N, rows.0, rows.1, cols.0, cols.1), t, res, grid)
}

// ---------------------------------------------------------------------------
// Overlap rule
// ---------------------------------------------------------------------------

#[test]
fn test_small_parent_inside_large_child() {
    let (grid, res) = setup();
    let parent = rect_band(date(2021, 1, 1), (5, 15), (5, 15), &grid, &res);
    let child = rect_band(date(2021, 1, 2), (0, 20), (0, 25), &grid, &res);
    assert_relative_eq!(parent.area_km2, 100.0);
    assert_relative_eq!(child.area_km2, 500.0);
    assert_relative_eq!(overlap_area(&parent, &child, &res), 100.0);
    assert!(is_parent(&parent, &child, &res, 0.1));
}

#[test]
fn test_overlap_must_exceed_fraction_strictly() {
    let (grid, res) = setup();
    let a = rect_band(date(2021, 1, 1), (0, 10), (0, 20), &grid, &res);
    // One shared row: 20 km^2, exactly 10% of either 200 km^2 band.
    let b = rect_band(date(2021, 1, 2), (9, 19), (0, 20), &grid, &res);
    assert_relative_eq!(overlap_area(&a, &b, &res), 20.0);
    assert!(!is_parent(&a, &b, &res, 0.1));

    let c = rect_band(date(2021, 1, 2), (8, 18), (0, 20), &grid, &res);
    assert!(is_parent(&a, &c, &res, 0.1));
}

#[test]
fn test_disjoint_bounding_boxes_do_not_overlap() {
    let (grid, res) = setup();
    let a = rect_band(date(2021, 1, 1), (0, 5), (0, 5), &grid, &res);
    let b = rect_band(date(2021, 1, 2), (10, 15), (10, 15), &grid, &res);
    assert!(!a.bbox_intersects(&b));
    assert_eq!(overlap_area(&a, &b, &res), 0.0);
    assert!(!is_parent(&a, &b, &res, 0.1));
}

// ---------------------------------------------------------------------------
// Sequence tracking
// ---------------------------------------------------------------------------

#[test]
fn test_track_links_child_to_parent() {
    let (grid, res) = setup();
    let parent = rect_band(date(2021, 1, 1), (5, 15), (5, 15), &grid, &res);
    let child = rect_band(date(2021, 1, 2), (0, 20), (0, 25), &grid, &res);
    let parent_id = parent.id;

    let mut bands = vec![vec![parent], vec![child], vec![]];
    track(&mut bands, "test", &res, 0.1).unwrap();

    assert!(bands[0][0].parents.is_empty(), "first timestep has no parents");
    assert_eq!(bands[1][0].parents.len(), 1);
    assert!(bands[1][0].parents.contains(&parent_id));
}

#[test]
fn test_track_clears_stale_parents_on_first_timestep() {
    let (grid, res) = setup();
    let mut first = rect_band(date(2021, 1, 1), (5, 15), (5, 15), &grid, &res);
    first.parents.insert(BandId {
        date_number: 0,
        longitude: 0,
    });
    let mut bands = vec![vec![first]];
    track(&mut bands, "test", &res, 0.1).unwrap();
    assert!(bands[0][0].parents.is_empty());
}

#[test]
fn test_track_does_not_link_across_gaps() {
    let (grid, res) = setup();
    let early = rect_band(date(2021, 1, 1), (5, 15), (5, 15), &grid, &res);
    let late = rect_band(date(2021, 1, 3), (5, 15), (5, 15), &grid, &res);
    let mut bands = vec![vec![early], vec![], vec![late]];
    track(&mut bands, "test", &res, 0.1).unwrap();
    assert!(bands[2][0].parents.is_empty());
}

#[test]
fn test_track_merge_and_split() {
    let (grid, res) = setup();
    let west = rect_band(date(2021, 1, 1), (0, 10), (0, 10), &grid, &res);
    let east = rect_band(date(2021, 1, 1), (0, 10), (15, 25), &grid, &res);
    let merged = rect_band(date(2021, 1, 2), (0, 10), (0, 25), &grid, &res);
    let split_a = rect_band(date(2021, 1, 3), (0, 10), (0, 8), &grid, &res);
    let split_b = rect_band(date(2021, 1, 3), (0, 10), (17, 25), &grid, &res);
    assert_ne!(west.id, east.id);

    let mut bands = vec![vec![west, east], vec![merged], vec![split_a, split_b]];
    track(&mut bands, "test", &res, 0.1).unwrap();

    assert_eq!(bands[1][0].parents.len(), 2);
    let merged_id = bands[1][0].id;
    assert!(bands[2].iter().all(|b| b.parents.contains(&merged_id)));
    assert_eq!(children_of(&bands, 1, merged_id).len(), 2);
}

#[test]
fn test_track_is_repeatable() {
    let (grid, res) = setup();
    let parent = rect_band(date(2021, 1, 1), (5, 15), (5, 15), &grid, &res);
    let child = rect_band(date(2021, 1, 2), (0, 20), (0, 25), &grid, &res);
    let mut bands = vec![vec![parent], vec![child]];
    track(&mut bands, "test", &res, 0.1).unwrap();
    let once = bands.clone();
    track(&mut bands, "test", &res, 0.1).unwrap();
    assert_eq!(bands, once);
}

#[test]
fn test_track_rejects_mismatched_masks() {
    let (grid, res) = setup();
    let band = rect_band(date(2021, 1, 1), (5, 15), (5, 15), &grid, &res);
    let small_res = uniform_resolution(10, 10, 1.0);
    let mut bands = vec![vec![band]];
    let err = track(&mut bands, "south_pacific", &small_res, 0.1).unwrap_err();
    match err {
        CloudBandError::Timestep {
            domain,
            index,
            date: d,
            stage,
            source,
        } => {
            assert_eq!(domain, "south_pacific");
            assert_eq!(index, 0);
            assert_eq!(d, date(2021, 1, 1));
            assert_eq!(stage, Stage::Tracking);
            assert!(matches!(*source, CloudBandError::InvalidGrid(_)));
        }
        other => panic!("expected a timestep error, got {other:?}"),
    }
}

#[test]
fn test_track_without_bands_fails() {
    let (_, res) = setup();
    let mut bands: Vec<Vec<CloudBand>> = vec![vec![], vec![]];
    let err = track(&mut bands, "south_pacific", &res, 0.1).unwrap_err();
    match err {
        CloudBandError::EmptyInput(msg) => assert!(msg.contains("south_pacific"), "got {msg}"),
        other => panic!("expected empty input, got {other:?}"),
    }

    let mut none: Vec<Vec<CloudBand>> = vec![];
    let err = track(&mut none, "south_pacific", &res, 0.1).unwrap_err();
    assert!(matches!(err, CloudBandError::EmptyInput(_)), "got {err:?}");
}

// ---------------------------------------------------------------------------
// Lineage queries
// ---------------------------------------------------------------------------

#[test]
fn test_find_band_and_children() {
    let (grid, res) = setup();
    let parent = rect_band(date(2021, 1, 1), (5, 15), (5, 15), &grid, &res);
    let child = rect_band(date(2021, 1, 2), (0, 20), (0, 25), &grid, &res);
    let (parent_id, child_id) = (parent.id, child.id);
    let mut bands = vec![vec![parent], vec![child]];
    track(&mut bands, "test", &res, 0.1).unwrap();

    assert_eq!(find_band(&bands, child_id).map(|b| b.id), Some(child_id));
    assert!(find_band(&bands, BandId { date_number: -1, longitude: 0 }).is_none());

    let children = children_of(&bands, 0, parent_id);
    assert_eq!(children.len(), 1);
    assert_eq!(children[0].id, child_id);
    assert!(children_of(&bands, 1, child_id).is_empty(), "no timestep after the last");
}

#[test]
fn test_track_domains_in_parallel() {
    let (grid, res) = setup();
    let make_archive = |name: &str| {
        let parent = rect_band(date(2021, 1, 1), (5, 15), (5, 15), &grid, &res);
        let child = rect_band(date(2021, 1, 2), (0, 20), (0, 25), &grid, &res);
        CloudBandArchive::new(
            name,
            &grid,
            vec![date(2021, 1, 1), date(2021, 1, 2)],
            vec![vec![parent], vec![child]],
        )
        .unwrap()
    };
    let mut archives = vec![make_archive("south_pacific"), make_archive("south_atlantic")];
    track_domains(&mut archives, 0.1).unwrap();
    for archive in &archives {
        assert_eq!(archive.bands[1][0].parents.len(), 1, "domain {}", archive.domain);
    }
}

#[test]
fn test_track_domains_error_names_the_domain() {
    let (grid, res) = setup();
    let healthy = CloudBandArchive::new(
        "south_atlantic",
        &grid,
        vec![date(2021, 1, 1)],
        vec![vec![rect_band(date(2021, 1, 1), (5, 15), (5, 15), &grid, &res)]],
    )
    .unwrap();
    let mut broken = CloudBandArchive::new(
        "south_pacific",
        &grid,
        vec![date(2021, 1, 1), date(2021, 1, 2)],
        vec![vec![], vec![rect_band(date(2021, 1, 2), (5, 15), (5, 15), &grid, &res)]],
    )
    .unwrap();
    // Masks stay 30x30 while the grid loses a longitude.
    broken.longitudes.pop();

    let mut archives = vec![healthy, broken];
    let err = track_domains(&mut archives, 0.1).unwrap_err();
    let text = err.to_string();
    assert!(text.contains("south_pacific") && text.contains("Inheritance tracking"), "got {text}");
    match err {
        CloudBandError::Timestep {
            domain,
            index,
            stage,
            ..
        } => {
            assert_eq!(domain, "south_pacific");
            assert_eq!(index, 1);
            assert_eq!(stage, Stage::Tracking);
        }
        other => panic!("expected a timestep error, got {other:?}"),
    }
}
