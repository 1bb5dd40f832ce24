use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use cloudband_core::DetectionParameters;

#[derive(Args)]
pub struct ConfigArgs {
    /// Write parameters to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Print or save the default DetectionParameters as TOML.
pub fn run(args: &ConfigArgs) -> Result<()> {
    let params = DetectionParameters::default();
    let toml_str = toml::to_string_pretty(&params)?;

    if let Some(ref path) = args.output {
        std::fs::write(path, &toml_str)
            .with_context(|| format!("Failed to write parameters to {}", path.display()))?;
        println!("Default parameters saved to {}", path.display());
    } else {
        print!("{}", toml_str);
    }

    Ok(())
}
