#[allow(dead_code)]
mod common;

use chrono::Duration;
use ndarray::Array3;
use tempfile::TempDir;

use cloudband_core::archive::{CloudBandArchive, FieldBundle};
use cloudband_core::density::{compute_density, DensityRate};
use cloudband_core::progress::NoOpReporter;
use cloudband_core::tracking::children_of;
use cloudband_core::workflow::run_domain;
use cloudband_core::{DetectionParameters, ThresholdMethod};

const H: usize = 24;
const W: usize = 180;

/// Four days on a global 2 degree grid with a south-east tilted cloud band
/// drifting one column east per day. Latitudes are stored south to north
/// and values as hourly accumulated flux, the way reanalysis files ship.
fn build_bundle() -> FieldBundle {
    let latitudes: Vec<f64> = (0..H).map(|i| -46.0 + i as f64 * 2.0).collect();
    let longitudes: Vec<f64> = (0..W).map(|i| i as f64 * 2.0).collect();
    let timestamps = (0..4)
        .map(|d| common::date(2021, 1, 1) + Duration::days(d))
        .collect();

    let data = Array3::from_shape_fn((4, H, W), |(t, r, c)| {
        // Row 0 of the flipped field is latitude 0.
        let row = H - 1 - r;
        let start = 60 + t + row;
        let olr = if row < 18 && c >= start && c < start + 3 {
            190.0
        } else {
            280.0
        };
        -olr * 3600.0
    });

    FieldBundle {
        latitudes,
        longitudes,
        timestamps,
        data,
        accumulated_flux: true,
    }
}

fn params() -> DetectionParameters {
    DetectionParameters {
        threshold_method: ThresholdMethod::Fixed(230.0),
        angle_min: -70.0,
        angle_max: -20.0,
        top_latitude: -10.0,
        bottom_latitude: -30.0,
        ..Default::default()
    }
}

#[test]
fn test_detect_track_persist_and_aggregate() {
    let tmp = TempDir::new().expect("create temp dir");
    let fields_path = tmp.path().join("fields.json");
    let archive_path = tmp.path().join("bands.json");

    build_bundle().save(&fields_path).unwrap();
    let series = FieldBundle::load(&fields_path)
        .unwrap()
        .into_series()
        .unwrap();
    assert_eq!(series.grid().latitudes()[0], 0.0, "latitudes flipped north to south");
    assert!(series.grid().is_global());

    let (output, archive) = run_domain(&series, "south_indian", &params(), &NoOpReporter).unwrap();
    assert_eq!(output.band_count(), 4, "one band per day");
    for day in &output.cloud_bands {
        assert!(!day[0].crosses_antimeridian);
        assert!(day[0].area_km2 >= 500_000.0);
    }

    // Each day inherits from the previous one.
    for t in 1..4 {
        let previous = output.cloud_bands[t - 1][0].id;
        assert!(output.cloud_bands[t][0].parents.contains(&previous), "day {t}");
        assert_eq!(children_of(&output.cloud_bands, t - 1, previous).len(), 1);
    }

    archive.save(&archive_path).unwrap();
    let loaded = CloudBandArchive::load(&archive_path).unwrap();
    assert_eq!(loaded, archive);

    let maps = compute_density(&loaded.timestamps, &loaded.bands, loaded.shape()).unwrap();
    assert_eq!(maps.rate, DensityRate::Approximate);
    assert_eq!(maps.years, 1);
    let peak = maps.total.iter().copied().fold(0.0_f64, f64::max);
    assert_eq!(peak, 4.0, "cells under the band on every day");
}
