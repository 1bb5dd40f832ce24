use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use cloudband_core::archive::CloudBandArchive;
use cloudband_core::density::{compute_density, DensityRate};

#[derive(Args)]
pub struct DensityArgs {
    /// Cloud band archive (JSON)
    #[arg(short, long)]
    pub input: PathBuf,

    /// Density maps file (JSON) to write
    #[arg(short, long)]
    pub output: PathBuf,
}

pub fn run(args: &DensityArgs) -> Result<()> {
    let archive = CloudBandArchive::load(&args.input)
        .with_context(|| format!("Failed to read archive {}", args.input.display()))?;

    let maps = compute_density(&archive.timestamps, &archive.bands, archive.shape())?;

    let json = serde_json::to_string(&maps)?;
    std::fs::write(&args.output, json)
        .with_context(|| format!("Failed to write density to {}", args.output.display()))?;

    let peak = maps.density.iter().copied().fold(0.0_f64, f64::max);
    let unit = match maps.rate {
        DensityRate::PerYear => "band days per year",
        DensityRate::Approximate => "band days per year touched (partial years)",
    };
    println!("Domain:      {}", archive.domain);
    println!("Years:       {}", maps.years);
    println!("Peak:        {:.2} {}", peak, unit);
    println!("\nDensity saved to {}", args.output.display());
    Ok(())
}
