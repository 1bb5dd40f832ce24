use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Args;
use cloudband_core::archive::FieldBundle;
use cloudband_core::field::Domain;
use cloudband_core::workflow::run_domain;
use cloudband_core::DetectionParameters;

use crate::progress::BarReporter;
use crate::summary::{print_detection_summary, print_parameters};

#[derive(Args)]
pub struct DetectArgs {
    /// Field bundle (JSON) holding latitudes, longitudes, timestamps and data
    #[arg(short, long)]
    pub input: PathBuf,

    /// Archive file (JSON) to write
    #[arg(short, long)]
    pub output: PathBuf,

    /// Detection parameters file (TOML)
    #[arg(long)]
    pub params: Option<PathBuf>,

    /// Domain name recorded in the archive
    #[arg(long, default_value = "domain")]
    pub domain: String,

    /// Crop to west,east,north,south bounds (degrees) before detection
    #[arg(long, value_delimiter = ',', num_args = 4, allow_hyphen_values = true)]
    pub bounds: Option<Vec<f64>>,

    /// Average sub-daily snapshots over this many hours first (1, 3, 6, 12, 24)
    #[arg(long)]
    pub period: Option<u32>,

    /// Keep December to March timesteps only
    #[arg(long)]
    pub djfm: bool,

    /// Skip inheritance tracking
    #[arg(long)]
    pub no_track: bool,
}

pub fn run(args: &DetectArgs) -> Result<()> {
    let mut params = match args.params {
        Some(ref path) => DetectionParameters::load(path)
            .with_context(|| format!("Invalid parameters file {}", path.display()))?,
        None => DetectionParameters::default(),
    };
    if args.no_track {
        params.run_tracking = false;
    }

    let mut series = FieldBundle::load(&args.input)
        .with_context(|| format!("Failed to read field bundle {}", args.input.display()))?
        .into_series()?;

    if let Some(ref b) = args.bounds {
        let [lon_west, lon_east, lat_north, lat_south] = b[..] else {
            bail!("--bounds takes exactly four values: west,east,north,south");
        };
        let domain = Domain {
            name: args.domain.clone(),
            lon_west,
            lon_east,
            lat_north,
            lat_south,
        };
        series = series.subset_domain(&domain)?;
    }
    if let Some(hours) = args.period {
        series = series.temporal_mean(hours)?;
    }
    if args.djfm {
        series = series.select_djfm();
    }
    if series.is_empty() {
        bail!("No timestep left to process");
    }

    print_parameters(&params, &args.domain, series.len());

    let reporter = BarReporter::new()?;
    let (output, archive) = run_domain(&series, &args.domain, &params, &reporter)?;
    reporter.finish();

    archive
        .save(&args.output)
        .with_context(|| format!("Failed to write archive {}", args.output.display()))?;

    print_detection_summary(&output);
    println!("\nArchive saved to {}", args.output.display());
    Ok(())
}
