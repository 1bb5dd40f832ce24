pub mod archive;
pub mod classify;
pub mod cloudband;
pub mod consts;
pub mod density;
pub mod detection;
pub mod error;
pub mod field;
pub mod grid;
pub mod progress;
pub mod resolution;
pub mod time;
pub mod tracking;
pub mod workflow;

pub use cloudband::{BandId, CloudBand};
pub use detection::{DetectionParameters, ThresholdMethod};
pub use error::{CloudBandError, Result};
pub use grid::Grid;
pub use resolution::ResolutionField;
