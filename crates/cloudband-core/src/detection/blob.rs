use ndarray::{Array2, ArrayView2, Zip};
use tracing::{debug, warn};

use crate::error::{CloudBandError, Result};
use crate::resolution::ResolutionField;

use super::components::{connect_longitudes, label_components};
use super::config::{DetectionParameters, ThresholdMethod};
use super::morphology::{dilate_cross, fill_holes};
use super::threshold::compute_threshold;

/// A labelled blob and its physical area.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BlobArea {
    pub label: u32,
    pub area_km2: f64,
}

/// Intermediate rasters and candidate list for one snapshot.
#[derive(Clone, Debug)]
pub struct BlobDetection {
    /// Threshold actually applied (fixed or computed from the snapshot).
    pub threshold: f32,
    /// Pixels below the threshold, holes filled.
    pub binary: Array2<bool>,
    /// `binary` after one cross dilation.
    pub dilated: Array2<bool>,
    /// 8-connected labels of `dilated`, merged across the antimeridian if requested.
    pub labelled_blobs: Array2<u32>,
    /// `labelled_blobs` restricted to the candidates; other pixels are 0.
    pub labelled_candidates: Array2<u32>,
    /// Candidates sorted by area descending, ties by ascending label.
    pub candidates: Vec<BlobArea>,
}

impl BlobDetection {
    /// True if the snapshot held no cloud pixel at all.
    pub fn is_empty(&self) -> bool {
        !self.binary.iter().any(|&b| b)
    }
}

/// Detect candidate blobs in one snapshot.
///
/// Pipeline: threshold -> clamp negatives to zero -> binarize (`value <
/// threshold`) and fill holes -> cross dilation -> 8-connected labelling ->
/// optional antimeridian merge -> area filter.
///
/// A snapshot with no cloud pixel is not an error: all rasters are zero and
/// the candidate list is empty.
pub fn detect_blobs(
    field: ArrayView2<f32>,
    params: &DetectionParameters,
    resolution: &ResolutionField,
    connect_antimeridian: bool,
) -> Result<BlobDetection> {
    if field.dim() != resolution.dim() {
        return Err(CloudBandError::InvalidGrid(format!(
            "snapshot is {:?} but resolution field is {:?}",
            field.dim(),
            resolution.dim()
        )));
    }
    if !field.iter().any(|v| v.is_finite()) {
        return Err(CloudBandError::CorruptSnapshot {
            reason: "snapshot holds no finite value".into(),
        });
    }

    let threshold = compute_threshold(field, &params.threshold_method)?;
    if !matches!(params.threshold_method, ThresholdMethod::Fixed(_)) {
        warn!(method = %params.threshold_method, threshold, "Using automatic threshold");
    }

    let sanitized = sanitize(field);
    let below = sanitized.mapv(|v| v < threshold);
    let binary = fill_holes(&below);
    let dilated = dilate_cross(&binary);

    let mut labelled_blobs = label_components(&dilated);
    if connect_antimeridian {
        labelled_blobs = connect_longitudes(&labelled_blobs);
    }

    let areas = resolution.label_areas(&labelled_blobs);
    let mut blobs: Vec<BlobArea> = areas
        .iter()
        .enumerate()
        .skip(1)
        .map(|(label, &area_km2)| BlobArea {
            label: label as u32,
            area_km2,
        })
        .collect();
    // Stable sort: equal areas keep ascending label order.
    blobs.sort_by(|a, b| b.area_km2.total_cmp(&a.area_km2));

    let candidates: Vec<BlobArea> = blobs
        .into_iter()
        .filter(|b| b.area_km2 >= params.area_threshold_km2)
        .collect();

    let mut keep = vec![false; areas.len()];
    for c in &candidates {
        keep[c.label as usize] = true;
    }
    let labelled_candidates = labelled_blobs.mapv(|l| if keep[l as usize] { l } else { 0 });

    debug!(
        threshold,
        blobs = areas.len().saturating_sub(1),
        candidates = candidates.len(),
        "Blob detection done"
    );

    Ok(BlobDetection {
        threshold,
        binary,
        dilated,
        labelled_blobs,
        labelled_candidates,
        candidates,
    })
}

/// Clamp negative values to zero. NaN is left in place and never counts as cloud.
fn sanitize(field: ArrayView2<f32>) -> Array2<f32> {
    let negatives = field.iter().filter(|&&v| v < 0.0).count();
    if negatives > 0 {
        warn!(negatives, "Some missing values in the input, clamping to zero");
    }
    let mut out = field.to_owned();
    Zip::from(&mut out).for_each(|v| {
        if *v < 0.0 {
            *v = 0.0;
        }
    });
    out
}
