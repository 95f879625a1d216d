use anyhow::{Context, Result};
use clap::Parser;

use crate::cli::shape::Shape3;
use crate::partition::{FillMode, Partition};
use crate::{planner, scheduler};

/// Generate a fresh random array on disk and split it into input blocks
/// (§6 CLI surface `--create`).
#[derive(Parser, Debug)]
#[command(about = "Create input blocks from fresh randomness")]
pub struct CreateArgs {
    /// Shape of the array to generate, e.g. "(12,12,12)"
    pub array: Shape3,

    /// Shape of the input blocks to write
    pub input: Shape3,

    #[arg(long, default_value_t = 1)]
    pub element_size: usize,
}

pub fn run(args: &CreateArgs) -> Result<()> {
    let array = args.array.0;
    let element_size = args.element_size;

    log::info!("writing complete array {}", args.array);
    let mut array_blocks = Partition::new(array, "array", None, FillMode::Random, element_size)
        .context("generating the array")?;

    log::info!("splitting array into input blocks {}", args.input);
    let mut in_blocks = Partition::new(args.input.0, "in", Some(array), FillMode::None, element_size)
        .context("creating input blocks")?;

    // Splitting one monolithic array file into many block files needs no
    // seek-minimizing reshuffle — there is exactly one source block to
    // begin with, so the degenerate baseline plan is exact here (the keep
    // planner's neighbor-chain routing is undefined for a single-block
    // read grid). See DESIGN.md.
    let plan = planner::plan_baseline(array, array, args.input.0, element_size);
    scheduler::repartition(&mut array_blocks, &mut in_blocks, plan).context("writing input blocks")?;

    log::info!("done");
    Ok(())
}
