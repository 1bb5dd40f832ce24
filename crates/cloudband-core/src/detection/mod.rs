pub mod blob;
pub mod components;
pub mod config;
pub mod morphology;
pub mod threshold;

pub use blob::{detect_blobs, BlobArea, BlobDetection};
pub use config::{DetectionParameters, ThresholdMethod};
