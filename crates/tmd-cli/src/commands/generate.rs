use std::error::Error;
use std::fs;
use std::path::PathBuf;

use clap::Args;
use tmd_events::{generate_events, GeneratorConfig};

#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// YAML generator configuration.
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Number of events; overrides the configuration.
    #[arg(long)]
    pub n_events: Option<usize>,
    /// Gaussian smearing width; overrides the configuration.
    #[arg(long)]
    pub smearing: Option<f64>,
    /// Emit a weight column.
    #[arg(long)]
    pub weighted: bool,
    #[arg(long, default_value_t = 0)]
    pub seed: u64,
    /// CSV output path.
    #[arg(long)]
    pub out: PathBuf,
}

pub fn run(args: &GenerateArgs) -> Result<(), Box<dyn Error>> {
    let mut config = match &args.config {
        Some(path) => tmd_core::serde::from_yaml_slice::<GeneratorConfig>(&fs::read(path)?)?,
        None => GeneratorConfig::default(),
    };
    if let Some(n_events) = args.n_events {
        config.n_events = n_events;
    }
    if let Some(smearing) = args.smearing {
        config.smearing = smearing;
    }
    config.weighted |= args.weighted;

    let store = generate_events(&config, args.seed)?;
    if let Some(parent) = args.out.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    store.write_path(&args.out)?;
    tracing::info!(path = %args.out.display(), events = store.len(), "wrote events");
    Ok(())
}
