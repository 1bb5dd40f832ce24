//! Per-grid-cell cloud band occurrence over a period.

use chrono::NaiveDateTime;
use ndarray::{Array2, Zip};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::cloudband::CloudBand;
use crate::error::{CloudBandError, Result};
use crate::time::{covers_full_years, distinct_years};

/// How `density` relates to `total`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DensityRate {
    /// The period covers whole calendar years: `density` is band days per year.
    PerYear,
    /// The period does not start on January 1st and end on December 31st:
    /// `density` is the total divided by the number of distinct years
    /// touched, not a true annual rate.
    Approximate,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DensityMaps {
    /// Number of timesteps each cell was covered by an accepted band.
    pub total: Array2<f64>,
    /// `total` divided by the number of distinct years spanned.
    pub density: Array2<f64>,
    pub years: usize,
    pub rate: DensityRate,
}

/// Sum the masks of every accepted band (`is_cloud_band`) and scale by the
/// number of years.
///
/// `shape` is the grid shape `(n_lat, n_lon)`; every mask must match it.
/// Fails with [`CloudBandError::EmptyInput`] when no timestep holds a band
/// and with [`CloudBandError::MisalignedSequence`] when `dates` and `bands`
/// differ in length.
pub fn compute_density(
    dates: &[NaiveDateTime],
    bands: &[Vec<CloudBand>],
    shape: (usize, usize),
) -> Result<DensityMaps> {
    if dates.len() != bands.len() {
        return Err(CloudBandError::MisalignedSequence {
            timestamps: dates.len(),
            snapshots: bands.len(),
        });
    }
    if !bands.iter().flatten().any(|b| b.is_cloud_band) {
        return Err(CloudBandError::EmptyInput(
            "no cloud band detected over the period".into(),
        ));
    }

    let mut total = Array2::<f64>::zeros(shape);
    for band in bands.iter().flatten().filter(|b| b.is_cloud_band) {
        if band.mask.dim() != shape {
            return Err(CloudBandError::InvalidGrid(format!(
                "band {} has mask {:?}, expected {:?}",
                band.id,
                band.mask.dim(),
                shape
            )));
        }
        Zip::from(&mut total).and(&band.mask).for_each(|t, &m| {
            if m {
                *t += 1.0;
            }
        });
    }

    let years = distinct_years(dates);
    let rate = if covers_full_years(dates) {
        DensityRate::PerYear
    } else {
        warn!(
            years,
            "Period does not cover full years: density is the total divided by the years touched"
        );
        DensityRate::Approximate
    };
    let density = total.mapv(|v| v / years as f64);

    info!(years, ?rate, "Density computed");
    Ok(DensityMaps {
        total,
        density,
        years,
        rate,
    })
}
