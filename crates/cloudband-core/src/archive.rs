//! JSON persistence of detection results and field inputs.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use chrono::NaiveDateTime;
use ndarray::Array3;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::cloudband::{BandId, CloudBand};
use crate::error::{CloudBandError, Result};
use crate::field::FieldSeries;
use crate::grid::Grid;

/// Tracked cloud bands of one domain, aligned with the timestamps.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CloudBandArchive {
    pub domain: String,
    pub latitudes: Vec<f64>,
    pub longitudes: Vec<f64>,
    pub timestamps: Vec<NaiveDateTime>,
    /// One list per timestep, possibly empty.
    pub bands: Vec<Vec<CloudBand>>,
}

impl CloudBandArchive {
    pub fn new(
        domain: &str,
        grid: &Grid,
        timestamps: Vec<NaiveDateTime>,
        bands: Vec<Vec<CloudBand>>,
    ) -> Result<Self> {
        if timestamps.len() != bands.len() {
            return Err(CloudBandError::MisalignedSequence {
                timestamps: timestamps.len(),
                snapshots: bands.len(),
            });
        }
        Ok(Self {
            domain: domain.to_string(),
            latitudes: grid.latitudes().to_vec(),
            longitudes: grid.longitudes().to_vec(),
            timestamps,
            bands,
        })
    }

    /// Rebuild and validate the grid the bands were detected on.
    pub fn grid(&self) -> Result<Grid> {
        Grid::new(self.latitudes.clone(), self.longitudes.clone())
    }

    /// Raster shape `(n_lat, n_lon)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.latitudes.len(), self.longitudes.len())
    }

    pub fn band_count(&self) -> usize {
        self.bands.iter().map(Vec::len).sum()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parse an archive, checking that the band lists line up with the
    /// timestamps.
    pub fn from_json(s: &str) -> Result<Self> {
        let archive: Self = serde_json::from_str(s)?;
        archive.validate()?;
        Ok(archive)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer(writer, self)?;
        info!(path = %path.display(), bands = self.band_count(), "Archive saved");
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        let archive: Self = serde_json::from_reader(reader)?;
        archive.validate()?;
        Ok(archive)
    }

    fn validate(&self) -> Result<()> {
        if self.timestamps.len() != self.bands.len() {
            return Err(CloudBandError::MisalignedSequence {
                timestamps: self.timestamps.len(),
                snapshots: self.bands.len(),
            });
        }
        let shape = self.shape();
        if let Some(band) = self.bands.iter().flatten().find(|b| b.mask.dim() != shape) {
            return Err(CloudBandError::InvalidGrid(format!(
                "band {} has mask {:?}, archive grid is {:?}",
                band.id,
                band.mask.dim(),
                shape
            )));
        }
        Ok(())
    }

    /// One row per band, in timestep then band order.
    pub fn summaries(&self) -> Vec<BandSummary> {
        self.bands
            .iter()
            .enumerate()
            .flat_map(|(t, day)| day.iter().map(move |band| BandSummary::new(t, band)))
            .collect()
    }
}

/// Flat description of one band, without its mask.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BandSummary {
    pub timestep: usize,
    pub id: BandId,
    pub timestamp: NaiveDateTime,
    pub area_km2: f64,
    pub centroid_lat: f64,
    pub centroid_lon: f64,
    pub orientation_deg: f64,
    pub crosses_antimeridian: bool,
    pub parent_count: usize,
}

impl BandSummary {
    pub fn new(timestep: usize, band: &CloudBand) -> Self {
        Self {
            timestep,
            id: band.id,
            timestamp: band.timestamp,
            area_km2: band.area_km2,
            centroid_lat: band.centroid_lat,
            centroid_lon: band.centroid_lon,
            orientation_deg: band.orientation_deg,
            crosses_antimeridian: band.crosses_antimeridian,
            parent_count: band.parents.len(),
        }
    }
}

/// OLR (or accumulated flux) snapshots as stored on disk:
/// `data[time][lat][lon]`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FieldBundle {
    pub latitudes: Vec<f64>,
    pub longitudes: Vec<f64>,
    pub timestamps: Vec<NaiveDateTime>,
    pub data: Array3<f32>,
    /// Values are hourly accumulated thermal radiation (J m^-2, negative
    /// upward) rather than OLR.
    #[serde(default)]
    pub accumulated_flux: bool,
}

impl FieldBundle {
    pub fn load(path: &Path) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        Ok(serde_json::from_reader(reader)?)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer(writer, self)?;
        Ok(())
    }

    /// Validate into a [`FieldSeries`], converting accumulated flux to OLR.
    pub fn into_series(self) -> Result<FieldSeries> {
        let series = FieldSeries::new(self.latitudes, self.longitudes, self.timestamps, self.data)?;
        Ok(if self.accumulated_flux {
            series.accumulated_flux_to_olr()
        } else {
            series
        })
    }
}
