//! Time series of 2-D scalar snapshots (typically OLR, W m^-2) on a [`Grid`].

use chrono::{Duration, NaiveDateTime};
use ndarray::{concatenate, s, Array2, Array3, ArrayView2, Axis};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::consts::SECONDS_PER_HOUR;
use crate::error::{CloudBandError, Result};
use crate::grid::{axis_order, wrap_to_180, AxisOrder, Grid};
use crate::time::{check_period, djfm_indices};

/// A named geographic basin. Bounds are in degrees; `lon_east < lon_west`
/// denotes a domain crossing the 0 degree meridian on a [0, 360) grid.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Domain {
    pub name: String,
    pub lon_west: f64,
    pub lon_east: f64,
    pub lat_north: f64,
    pub lat_south: f64,
}

impl Domain {
    /// A domain covering the full 360 degrees of longitude.
    pub fn spans_full_longitude(&self) -> bool {
        ((self.lon_east - self.lon_west).abs() - 360.0).abs() < 1e-9
    }
}

/// Snapshots `data[[t, lat, lon]]` aligned 1:1 with `timestamps`.
#[derive(Clone, Debug)]
pub struct FieldSeries {
    grid: Grid,
    timestamps: Vec<NaiveDateTime>,
    data: Array3<f32>,
}

impl FieldSeries {
    /// Validate and assemble a series.
    ///
    /// Latitudes may be given south to north: the latitude axis and the data
    /// are then reversed together. Fails fast on degenerate axes, mismatched
    /// shapes, a timestamp count that differs from the snapshot count, or
    /// timestamps that do not strictly increase.
    pub fn new(
        latitudes: Vec<f64>,
        longitudes: Vec<f64>,
        timestamps: Vec<NaiveDateTime>,
        data: Array3<f32>,
    ) -> Result<Self> {
        let (nt, ny, nx) = data.dim();
        if timestamps.len() != nt {
            return Err(CloudBandError::MisalignedSequence {
                timestamps: timestamps.len(),
                snapshots: nt,
            });
        }
        if latitudes.len() != ny || longitudes.len() != nx {
            return Err(CloudBandError::InvalidGrid(format!(
                "grid is {}x{} but snapshots are {ny}x{nx}",
                latitudes.len(),
                longitudes.len()
            )));
        }
        if timestamps.windows(2).any(|w| w[1] <= w[0]) {
            return Err(CloudBandError::InvalidTimeAxis(
                "timestamps must be strictly increasing".into(),
            ));
        }

        let (latitudes, data) = if latitudes.len() >= 2
            && axis_order(&latitudes) == Some(AxisOrder::Increasing)
        {
            warn!("Latitudes are increasing, reversing latitudes and field");
            let mut lats = latitudes;
            lats.reverse();
            (lats, data.slice(s![.., ..;-1, ..]).to_owned())
        } else {
            (latitudes, data)
        };

        let grid = Grid::new(latitudes, longitudes)?;
        Ok(Self {
            grid,
            timestamps,
            data,
        })
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn timestamps(&self) -> &[NaiveDateTime] {
        &self.timestamps
    }

    pub fn data(&self) -> &Array3<f32> {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    pub fn snapshot(&self, index: usize) -> ArrayView2<'_, f32> {
        self.data.index_axis(Axis(0), index)
    }

    /// Crop the series to a domain.
    pub fn subset_domain(&self, domain: &Domain) -> Result<Self> {
        let lats = self.grid.latitudes();
        let lons = self.grid.longitudes();

        let (lons_out, data_lon) = if domain.lon_east < domain.lon_west {
            info!(domain = %domain.name, "Domain crosses the 0 degree meridian, rotating longitudes");
            let half = lons.len() / 2;
            let rotated_lons: Vec<f64> = lons[half..]
                .iter()
                .chain(&lons[..half])
                .map(|&l| wrap_to_180(l))
                .collect();
            let rotated = concatenate(
                Axis(2),
                &[
                    self.data.slice(s![.., .., half..]),
                    self.data.slice(s![.., .., ..half]),
                ],
            )
            .map_err(|e| CloudBandError::InvalidGrid(e.to_string()))?;
            let west = position_of(&rotated_lons, wrap_to_180(domain.lon_west), "lon_west")?;
            let east = position_of(&rotated_lons, wrap_to_180(domain.lon_east), "lon_east")?;
            if east < west {
                return Err(CloudBandError::InvalidGrid(format!(
                    "domain '{}' selects no longitudes",
                    domain.name
                )));
            }
            (
                rotated_lons[west..=east].to_vec(),
                rotated.slice(s![.., .., west..=east]).to_owned(),
            )
        } else {
            let ids: Vec<usize> = indices_within(lons, domain.lon_west, domain.lon_east);
            (
                ids.iter().map(|&i| lons[i]).collect(),
                self.data.select(Axis(2), &ids),
            )
        };

        let lat_ids = indices_within(lats, domain.lat_south, domain.lat_north);
        let lats_out: Vec<f64> = lat_ids.iter().map(|&i| lats[i]).collect();
        let data = data_lon.select(Axis(1), &lat_ids);

        info!(
            domain = %domain.name,
            n_lat = lats_out.len(),
            n_lon = lons_out.len(),
            "Subsetting dataset on domain done"
        );
        Self::new(lats_out, lons_out, self.timestamps.clone(), data)
    }

    /// Average consecutive snapshots into one snapshot per `period_hours`.
    ///
    /// Windows are `[t, t + period)` starting at the first timestamp; NaN
    /// values are ignored, and a cell that is NaN throughout a window stays NaN.
    pub fn temporal_mean(&self, period_hours: u32) -> Result<Self> {
        check_period(period_hours)?;
        let (Some(&first), Some(&last)) = (self.timestamps.first(), self.timestamps.last()) else {
            return Err(CloudBandError::EmptyInput("no snapshots to average".into()));
        };
        let step = Duration::hours(period_hours as i64);
        let (_, ny, nx) = self.data.dim();

        let mut starts = Vec::new();
        let mut means: Vec<Array2<f32>> = Vec::new();
        let mut window_start = first;
        let mut cursor = 0usize;
        while window_start <= last {
            let window_end = window_start + step;
            let begin = cursor;
            while cursor < self.timestamps.len() && self.timestamps[cursor] < window_end {
                cursor += 1;
            }
            if cursor == begin {
                return Err(CloudBandError::InvalidTimeAxis(format!(
                    "no snapshot between {window_start} and {window_end}"
                )));
            }
            means.push(nan_mean(self.data.slice(s![begin..cursor, .., ..]), ny, nx));
            starts.push(window_start);
            window_start = window_end;
        }

        let views: Vec<ArrayView2<f32>> = means.iter().map(|m| m.view()).collect();
        let data = ndarray::stack(Axis(0), &views)
            .map_err(|e| CloudBandError::InvalidGrid(e.to_string()))?;
        info!(
            input = self.len(),
            output = starts.len(),
            period_hours,
            "Temporal averaging done"
        );
        Ok(Self {
            grid: self.grid.clone(),
            timestamps: starts,
            data,
        })
    }

    /// Keep only the December to March snapshots.
    pub fn select_djfm(&self) -> Self {
        let ids = djfm_indices(&self.timestamps);
        Self {
            grid: self.grid.clone(),
            timestamps: ids.iter().map(|&i| self.timestamps[i]).collect(),
            data: self.data.select(Axis(0), &ids),
        }
    }

    /// Convert hourly accumulated top-of-atmosphere thermal radiation
    /// (J m^-2, negative upward) into outgoing longwave radiation (W m^-2).
    pub fn accumulated_flux_to_olr(mut self) -> Self {
        self.data
            .mapv_inplace(|v| (-(v as f64) / SECONDS_PER_HOUR) as f32);
        self
    }
}

fn indices_within(axis: &[f64], low: f64, high: f64) -> Vec<usize> {
    axis.iter()
        .enumerate()
        .filter(|(_, v)| **v >= low && **v <= high)
        .map(|(i, _)| i)
        .collect()
}

fn position_of(axis: &[f64], value: f64, name: &str) -> Result<usize> {
    axis.iter()
        .position(|&v| (v - value).abs() < 1e-6)
        .ok_or_else(|| CloudBandError::InvalidGrid(format!("{name} = {value} is not on the grid")))
}

fn nan_mean(window: ndarray::ArrayView3<f32>, ny: usize, nx: usize) -> Array2<f32> {
    let mut sum = Array2::<f64>::zeros((ny, nx));
    let mut count = Array2::<u32>::zeros((ny, nx));
    for snapshot in window.outer_iter() {
        ndarray::Zip::from(&mut sum)
            .and(&mut count)
            .and(&snapshot)
            .for_each(|s, c, &v| {
                if !v.is_nan() {
                    *s += v as f64;
                    *c += 1;
                }
            });
    }
    ndarray::Zip::from(&sum)
        .and(&count)
        .map_collect(|&s, &c| if c == 0 { f32::NAN } else { (s / c as f64) as f32 })
}
