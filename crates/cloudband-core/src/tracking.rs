//! Inheritance tracking: links each cloud band to the bands of the previous
//! timestep it overlaps, forming a lineage graph keyed by [`BandId`].

use std::collections::BTreeSet;

use rayon::prelude::*;
use tracing::{debug, info};

use crate::archive::CloudBandArchive;
use crate::cloudband::{BandId, CloudBand};
use crate::error::{CloudBandError, Result};
use crate::progress::{NoOpReporter, ProgressReporter, Stage};
use crate::resolution::ResolutionField;

/// Area (km^2) shared by two bands.
///
/// Only the intersection of the two bounding boxes is scanned; disjoint
/// boxes short-circuit to zero.
pub fn overlap_area(a: &CloudBand, b: &CloudBand, resolution: &ResolutionField) -> f64 {
    match a.bbox_intersection(b) {
        Some(bbox) => resolution.overlap_area(&a.mask, &b.mask, bbox),
        None => 0.0,
    }
}

/// `parent` (timestep t-1) is a parent of `child` (timestep t) if their
/// overlap exceeds `overlap_fraction` of either band's area.
pub fn is_parent(
    parent: &CloudBand,
    child: &CloudBand,
    resolution: &ResolutionField,
    overlap_fraction: f64,
) -> bool {
    let overlap = overlap_area(parent, child, resolution);
    overlap > overlap_fraction * parent.area_km2 || overlap > overlap_fraction * child.area_km2
}

/// Populate `parents` on every band of every timestep of `domain`.
///
/// Single pass in time order; each band's parent set is rebuilt from the
/// previous timestep's list. Bands of the first timestep get no parents.
/// A sequence without any band is an [`CloudBandError::EmptyInput`].
pub fn track(
    bands: &mut [Vec<CloudBand>],
    domain: &str,
    resolution: &ResolutionField,
    overlap_fraction: f64,
) -> Result<()> {
    track_reported(bands, domain, resolution, overlap_fraction, &NoOpReporter)
}

/// [`track`] with progress reporting.
pub fn track_reported(
    bands: &mut [Vec<CloudBand>],
    domain: &str,
    resolution: &ResolutionField,
    overlap_fraction: f64,
    reporter: &dyn ProgressReporter,
) -> Result<()> {
    if bands.iter().all(Vec::is_empty) {
        return Err(CloudBandError::EmptyInput(format!(
            "domain '{domain}': no cloud bands to track over {} timesteps",
            bands.len()
        )));
    }
    check_shapes(bands, domain, resolution)?;
    info!(
        domain,
        timesteps = bands.len(),
        overlap_fraction,
        "Inheritance tracking in progress"
    );
    reporter.begin_stage(Stage::Tracking, Some(bands.len()));

    let mut links = 0usize;
    for t in 0..bands.len() {
        let (before, rest) = bands.split_at_mut(t);
        let previous = before.last();
        for child in rest[0].iter_mut() {
            let parents: BTreeSet<BandId> = previous
                .into_iter()
                .flatten()
                .filter(|parent| is_parent(parent, child, resolution, overlap_fraction))
                .map(|parent| parent.id)
                .collect();
            links += parents.len();
            child.parents = parents;
        }
        reporter.advance(t + 1);
    }

    reporter.finish_stage();
    info!(links, "Inheritance tracking done");
    Ok(())
}

/// Track several independent domains in parallel, one archive per domain.
pub fn track_domains(archives: &mut [CloudBandArchive], overlap_fraction: f64) -> Result<()> {
    archives.par_iter_mut().try_for_each(|archive| {
        let resolution = ResolutionField::from_grid(&archive.grid()?);
        debug!(domain = %archive.domain, "Tracking domain");
        track(&mut archive.bands, &archive.domain, &resolution, overlap_fraction)
    })
}

fn check_shapes(
    bands: &[Vec<CloudBand>],
    domain: &str,
    resolution: &ResolutionField,
) -> Result<()> {
    for (t, day) in bands.iter().enumerate() {
        if let Some(band) = day.iter().find(|b| b.mask.dim() != resolution.dim()) {
            let source = CloudBandError::InvalidGrid(format!(
                "band {} has mask {:?} but resolution field is {:?}",
                band.id,
                band.mask.dim(),
                resolution.dim()
            ));
            return Err(CloudBandError::Timestep {
                domain: domain.to_string(),
                index: t,
                date: band.timestamp,
                stage: Stage::Tracking,
                source: Box::new(source),
            });
        }
    }
    Ok(())
}

/// Find a band by id anywhere in the sequence.
pub fn find_band(bands: &[Vec<CloudBand>], id: BandId) -> Option<&CloudBand> {
    bands.iter().flatten().find(|b| b.id == id)
}

/// Bands at timestep `t + 1` that list the band `id` of timestep `t` as a parent.
pub fn children_of(bands: &[Vec<CloudBand>], t: usize, id: BandId) -> Vec<&CloudBand> {
    bands
        .get(t + 1)
        .into_iter()
        .flatten()
        .filter(|b| b.parents.contains(&id))
        .collect()
}
