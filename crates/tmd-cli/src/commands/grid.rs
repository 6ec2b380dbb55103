use std::error::Error;
use std::path::PathBuf;

use clap::Args;
use tmd_batch::ReportFormat;

use super::TableArgs;

#[derive(Args, Debug)]
pub struct GridArgs {
    #[command(flatten)]
    pub table: TableArgs,
    /// Main grid dimensions, comma separated.
    #[arg(long, value_delimiter = ',', default_value = "X,Q")]
    pub grid: Vec<String>,
    /// Write the summary here instead of stdout; `.json` selects JSON.
    #[arg(long)]
    pub out: Option<PathBuf>,
}

pub fn run(args: &GridArgs) -> Result<(), Box<dyn Error>> {
    let table = args.table.load()?;
    let grid = table.build_grid(&args.grid)?;
    let summary = grid.summary();
    match &args.out {
        Some(path) => {
            let bytes = match ReportFormat::from_path(path) {
                ReportFormat::Json => tmd_core::serde::to_canonical_json_bytes(&summary)?,
                ReportFormat::Yaml => tmd_core::serde::to_yaml_string(&summary)?.into_bytes(),
            };
            tmd_batch::report::write_atomic(path, &bytes)?;
            tracing::info!(path = %path.display(), bins = grid.len(), "wrote grid summary");
        }
        None => print!("{}", tmd_core::serde::to_yaml_string(&summary)?),
    }
    Ok(())
}
