use std::error::Error;

use clap::Args;

use super::TableArgs;

#[derive(Args, Debug)]
pub struct LookupArgs {
    #[command(flatten)]
    pub table: TableArgs,
    #[arg(long, allow_hyphen_values = true)]
    pub x: f64,
    #[arg(long, allow_hyphen_values = true)]
    pub q: f64,
    #[arg(long, allow_hyphen_values = true)]
    pub z: f64,
    #[arg(long = "ph-perp", allow_hyphen_values = true)]
    pub ph_perp: f64,
}

pub fn run(args: &LookupArgs) -> Result<(), Box<dyn Error>> {
    let table = args.table.load()?;
    let amplitude = table.lookup_amplitude(args.x, args.q, args.z, args.ph_perp);
    println!("{amplitude}");
    Ok(())
}
