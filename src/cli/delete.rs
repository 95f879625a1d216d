use anyhow::{Context, Result};
use clap::Parser;

use crate::cli::shape::Shape3;
use crate::partition::{FillMode, Partition};

/// Remove output block files left behind by a repartition (§6 CLI
/// surface `--delete`, §7 "the CLI offers `--delete` to clean them").
#[derive(Parser, Debug)]
#[command(about = "Delete output blocks")]
pub struct DeleteArgs {
    pub array: Shape3,
    pub output: Shape3,

    #[arg(long, default_value_t = 1)]
    pub element_size: usize,
}

pub fn run(args: &DeleteArgs) -> Result<()> {
    let out_blocks = Partition::new(args.output.0, "out", Some(args.array.0), FillMode::None, args.element_size)
        .context("opening output partition")?;
    out_blocks.delete().context("deleting output blocks")?;
    log::info!("deleted output blocks for shape {}", args.output);
    Ok(())
}
