use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::consts::{
    DEFAULT_ANGLE_MAX, DEFAULT_ANGLE_MIN, DEFAULT_AREA_THRESHOLD_KM2, DEFAULT_BOTTOM_LATITUDE,
    DEFAULT_OLR_THRESHOLD, DEFAULT_OVERLAP_FRACTION, DEFAULT_TOP_LATITUDE,
};
use crate::error::Result;

/// How the cloud/clear-sky threshold is chosen for each snapshot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ThresholdMethod {
    /// User-specified threshold in field units (W m^-2 for OLR).
    Fixed(f32),
    /// Otsu's method: maximizes between-class variance of a bimodal histogram.
    Otsu,
    /// Yen's method: maximizes the entropic correlation of the two classes.
    Yen,
}

impl Default for ThresholdMethod {
    fn default() -> Self {
        Self::Fixed(DEFAULT_OLR_THRESHOLD)
    }
}

impl std::fmt::Display for ThresholdMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Fixed(v) => write!(f, "Fixed ({v})"),
            Self::Otsu => write!(f, "Otsu"),
            Self::Yen => write!(f, "Yen"),
        }
    }
}

/// Parameters for blob detection, cloud band acceptance and tracking.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DetectionParameters {
    #[serde(default)]
    pub threshold_method: ThresholdMethod,
    /// Minimum blob area (km^2) for a blob to become a candidate.
    #[serde(default = "default_area_threshold")]
    pub area_threshold_km2: f64,
    /// Exclusive lower bound on `orientation + hemisphere_axis` (degrees).
    #[serde(default = "default_angle_min")]
    pub angle_min: f64,
    /// Exclusive upper bound on `orientation + hemisphere_axis` (degrees).
    #[serde(default = "default_angle_max")]
    pub angle_max: f64,
    /// The band's northernmost latitude must be at least this.
    #[serde(default = "default_top_latitude")]
    pub top_latitude: f64,
    /// The band's southernmost latitude must be at most this.
    #[serde(default = "default_bottom_latitude")]
    pub bottom_latitude: f64,
    /// Minimum overlap, as a fraction of either band's area, to link parent and child.
    #[serde(default = "default_overlap_fraction")]
    pub overlap_fraction: f64,
    /// Merge blobs across the first/last longitude columns of a global grid.
    #[serde(default = "default_true")]
    pub connect_antimeridian: bool,
    /// Run inheritance tracking after detection.
    #[serde(default = "default_true")]
    pub run_tracking: bool,
    /// Keep every classified candidate (accepted or not) alongside the
    /// accepted bands, for diagnostics.
    #[serde(default)]
    pub retain_candidates: bool,
}

fn default_area_threshold() -> f64 {
    DEFAULT_AREA_THRESHOLD_KM2
}
fn default_angle_min() -> f64 {
    DEFAULT_ANGLE_MIN
}
fn default_angle_max() -> f64 {
    DEFAULT_ANGLE_MAX
}
fn default_top_latitude() -> f64 {
    DEFAULT_TOP_LATITUDE
}
fn default_bottom_latitude() -> f64 {
    DEFAULT_BOTTOM_LATITUDE
}
fn default_overlap_fraction() -> f64 {
    DEFAULT_OVERLAP_FRACTION
}
fn default_true() -> bool {
    true
}

impl Default for DetectionParameters {
    fn default() -> Self {
        Self {
            threshold_method: ThresholdMethod::default(),
            area_threshold_km2: DEFAULT_AREA_THRESHOLD_KM2,
            angle_min: DEFAULT_ANGLE_MIN,
            angle_max: DEFAULT_ANGLE_MAX,
            top_latitude: DEFAULT_TOP_LATITUDE,
            bottom_latitude: DEFAULT_BOTTOM_LATITUDE,
            overlap_fraction: DEFAULT_OVERLAP_FRACTION,
            connect_antimeridian: true,
            run_tracking: true,
            retain_candidates: false,
        }
    }
}

impl DetectionParameters {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }
}
