use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use cloudband_core::archive::CloudBandArchive;

#[derive(Args)]
pub struct InfoArgs {
    /// Cloud band archive (JSON)
    pub file: PathBuf,

    /// Show the N largest bands only
    #[arg(long, default_value = "20")]
    pub top: usize,
}

pub fn run(args: &InfoArgs) -> Result<()> {
    let archive = CloudBandArchive::load(&args.file)?;
    let (ny, nx) = archive.shape();

    println!("File:        {}", args.file.display());
    println!("Domain:      {}", archive.domain);
    println!("Grid:        {}x{}", ny, nx);
    println!("Timesteps:   {}", archive.timestamps.len());
    if let (Some(first), Some(last)) = (archive.timestamps.first(), archive.timestamps.last()) {
        println!("Period:      {} to {}", first, last);
    }
    let active = archive.bands.iter().filter(|day| !day.is_empty()).count();
    println!("Band days:   {}", active);
    println!("Bands:       {}", archive.band_count());

    let mut rows = archive.summaries();
    rows.sort_by(|a, b| b.area_km2.total_cmp(&a.area_km2));
    if rows.is_empty() {
        return Ok(());
    }

    println!(
        "\nLargest {} bands (of {}):",
        args.top.min(rows.len()),
        rows.len()
    );
    println!(
        "{:>6}  {:>14}  {:>12}  {:>8}  {:>8}  {:>7}  {:>7}",
        "Step", "Id", "Area km2", "Lat", "Lon", "Angle", "Parents"
    );
    println!("{}", "-".repeat(74));
    for row in rows.iter().take(args.top) {
        println!(
            "{:>6}  {:>14}  {:>12.0}  {:>8.2}  {:>8.2}  {:>7.1}  {:>7}",
            row.timestep,
            row.id.to_string(),
            row.area_km2,
            row.centroid_lat,
            row.centroid_lon,
            row.orientation_deg,
            row.parent_count
        );
    }

    Ok(())
}
