//! Detection over the full time axis, followed by optional tracking.

use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::NaiveDateTime;
use ndarray::{Array2, Array3, ArrayView2, Axis};
use rayon::prelude::*;
use tracing::{debug, info};

use crate::archive::CloudBandArchive;
use crate::classify::{candidates_to_bands, filter_cloud_bands, flag_cloud_bands, AcceptanceCriteria};
use crate::cloudband::CloudBand;
use crate::consts::PARALLEL_TIMESTEP_THRESHOLD;
use crate::detection::{detect_blobs, BlobDetection, DetectionParameters};
use crate::error::{CloudBandError, Result};
use crate::field::FieldSeries;
use crate::grid::Grid;
use crate::progress::{NoOpReporter, ProgressReporter, Stage};
use crate::resolution::ResolutionField;
use crate::tracking::track_reported;

/// Everything produced for one timestep.
#[derive(Clone, Debug)]
pub struct TimestepDetection {
    pub blobs: BlobDetection,
    /// Every classified candidate, flagged; only kept with `retain_candidates`.
    pub candidates: Option<Vec<CloudBand>>,
    /// Accepted cloud bands, in ascending candidate label order.
    pub cloud_bands: Vec<CloudBand>,
}

/// Per-timestep rasters stacked along a leading time axis, and band lists
/// aligned with the input timestamps.
#[derive(Clone, Debug)]
pub struct DetectionOutput {
    pub thresholds: Vec<f32>,
    pub binary: Array3<bool>,
    pub dilated: Array3<bool>,
    pub labelled_blobs: Array3<u32>,
    pub labelled_candidates: Array3<u32>,
    /// Accepted band `i` of a timestep is written as label `i + 1`.
    pub cloud_band_map: Array3<u32>,
    /// Present when `retain_candidates` is set.
    pub candidates: Option<Vec<Vec<CloudBand>>>,
    pub cloud_bands: Vec<Vec<CloudBand>>,
}

impl DetectionOutput {
    pub fn band_count(&self) -> usize {
        self.cloud_bands.iter().map(Vec::len).sum()
    }
}

/// Detect, classify and filter one snapshot.
pub fn detect_timestep(
    snapshot: ArrayView2<f32>,
    timestamp: NaiveDateTime,
    grid: &Grid,
    resolution: &ResolutionField,
    params: &DetectionParameters,
    connect_antimeridian: bool,
) -> Result<TimestepDetection> {
    let blobs = detect_blobs(snapshot, params, resolution, connect_antimeridian)?;
    if blobs.is_empty() {
        debug!(%timestamp, "Snapshot holds no cloud pixel");
    }
    let criteria = AcceptanceCriteria::from(params);
    let classified = candidates_to_bands(&blobs.labelled_candidates, timestamp, resolution, grid);

    let (candidates, cloud_bands) = if params.retain_candidates {
        let mut flagged = classified;
        flag_cloud_bands(&mut flagged, &criteria);
        let accepted = flagged.iter().filter(|b| b.is_cloud_band).cloned().collect();
        (Some(flagged), accepted)
    } else {
        (None, filter_cloud_bands(classified, &criteria))
    };

    Ok(TimestepDetection {
        blobs,
        candidates,
        cloud_bands,
    })
}

/// Run detection on every timestep of `series`.
pub fn detection_workflow(
    series: &FieldSeries,
    domain: &str,
    resolution: &ResolutionField,
    params: &DetectionParameters,
) -> Result<DetectionOutput> {
    detection_workflow_reported(series, domain, resolution, params, &NoOpReporter)
}

/// [`detection_workflow`] with progress reporting.
///
/// Timesteps are independent; above a small count they run on the Rayon
/// pool. Results are gathered by timestep index, so the output order always
/// matches the input. Any failing timestep aborts the run.
pub fn detection_workflow_reported(
    series: &FieldSeries,
    domain: &str,
    resolution: &ResolutionField,
    params: &DetectionParameters,
    reporter: &dyn ProgressReporter,
) -> Result<DetectionOutput> {
    let grid = series.grid();
    if resolution.dim() != grid.shape() {
        return Err(CloudBandError::InvalidGrid(format!(
            "resolution field is {:?} but grid is {:?}",
            resolution.dim(),
            grid.shape()
        )));
    }

    let connect_antimeridian = params.connect_antimeridian && grid.is_global();
    if connect_antimeridian {
        info!(domain, "Blobs crossing the longitude edges will be connected");
    } else if params.connect_antimeridian {
        debug!(domain, "Grid is not global, antimeridian merge disabled");
    }

    let total = series.len();
    info!(domain, timesteps = total, "Cloud band detection in progress");
    reporter.begin_stage(Stage::Detection, Some(total));
    let done = AtomicUsize::new(0);

    let run_one = |index: usize| -> Result<TimestepDetection> {
        let timestamp = series.timestamps()[index];
        let result = detect_timestep(
            series.snapshot(index),
            timestamp,
            grid,
            resolution,
            params,
            connect_antimeridian,
        )
        .map_err(|e| CloudBandError::Timestep {
            domain: domain.to_string(),
            index,
            date: timestamp,
            stage: Stage::Detection,
            source: Box::new(e),
        });
        reporter.advance(done.fetch_add(1, Ordering::Relaxed) + 1);
        result
    };

    let per_step: Vec<TimestepDetection> = if total >= PARALLEL_TIMESTEP_THRESHOLD {
        (0..total).into_par_iter().map(run_one).collect::<Result<_>>()?
    } else {
        (0..total).map(run_one).collect::<Result<_>>()?
    };
    reporter.finish_stage();

    let output = assemble(per_step, grid.shape(), params.retain_candidates);
    info!(domain, bands = output.band_count(), "Cloud band detection done");
    Ok(output)
}

fn assemble(
    per_step: Vec<TimestepDetection>,
    (h, w): (usize, usize),
    retain_candidates: bool,
) -> DetectionOutput {
    let nt = per_step.len();
    let mut output = DetectionOutput {
        thresholds: Vec::with_capacity(nt),
        binary: Array3::from_elem((nt, h, w), false),
        dilated: Array3::from_elem((nt, h, w), false),
        labelled_blobs: Array3::zeros((nt, h, w)),
        labelled_candidates: Array3::zeros((nt, h, w)),
        cloud_band_map: Array3::zeros((nt, h, w)),
        candidates: retain_candidates.then(|| Vec::with_capacity(nt)),
        cloud_bands: Vec::with_capacity(nt),
    };

    for (t, step) in per_step.into_iter().enumerate() {
        output.thresholds.push(step.blobs.threshold);
        output.binary.index_axis_mut(Axis(0), t).assign(&step.blobs.binary);
        output.dilated.index_axis_mut(Axis(0), t).assign(&step.blobs.dilated);
        output
            .labelled_blobs
            .index_axis_mut(Axis(0), t)
            .assign(&step.blobs.labelled_blobs);
        output
            .labelled_candidates
            .index_axis_mut(Axis(0), t)
            .assign(&step.blobs.labelled_candidates);
        output
            .cloud_band_map
            .index_axis_mut(Axis(0), t)
            .assign(&cloud_band_map(&step.cloud_bands, (h, w)));
        if let (Some(all), Some(candidates)) = (output.candidates.as_mut(), step.candidates) {
            all.push(candidates);
        }
        output.cloud_bands.push(step.cloud_bands);
    }
    output
}

/// Raster of one timestep's accepted bands: band `i` is written as `i + 1`.
pub fn cloud_band_map(bands: &[CloudBand], shape: (usize, usize)) -> Array2<u32> {
    let mut map = Array2::<u32>::zeros(shape);
    for (i, band) in bands.iter().enumerate() {
        let label = i as u32 + 1;
        ndarray::Zip::from(&mut map).and(&band.mask).for_each(|m, &b| {
            if b {
                *m = label;
            }
        });
    }
    map
}

/// Full run for one domain: resolution, detection, then tracking when
/// `run_tracking` is set. Returns the rasters and the persisted archive.
pub fn run_domain(
    series: &FieldSeries,
    domain: &str,
    params: &DetectionParameters,
    reporter: &dyn ProgressReporter,
) -> Result<(DetectionOutput, CloudBandArchive)> {
    let resolution = ResolutionField::from_grid(series.grid());
    let mut output = detection_workflow_reported(series, domain, &resolution, params, reporter)?;

    if params.run_tracking && output.band_count() == 0 {
        debug!(domain, "No cloud band detected, skipping tracking");
    } else if params.run_tracking {
        track_reported(
            &mut output.cloud_bands,
            domain,
            &resolution,
            params.overlap_fraction,
            reporter,
        )?;
    }

    let archive = CloudBandArchive::new(
        domain,
        series.grid(),
        series.timestamps().to_vec(),
        output.cloud_bands.clone(),
    )?;
    Ok((output, archive))
}
