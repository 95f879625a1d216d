use anyhow::{Context, Result, bail};
use clap::Parser;

use crate::cli::shape::Shape3;
use crate::geometry::Block;
use crate::partition::{FillMode, Partition};

/// Reconstruct the array from the input blocks and, separately, from the
/// output blocks, and check the two reconstructions are byte-identical
/// (§6 CLI surface `--test-data`).
#[derive(Parser, Debug)]
#[command(about = "Check that input and output blocks reconstruct the same array")]
pub struct TestDataArgs {
    pub array: Shape3,
    pub input: Shape3,
    pub output: Shape3,

    #[arg(long, default_value_t = 1)]
    pub element_size: usize,
}

pub fn run(args: &TestDataArgs) -> Result<()> {
    let array = args.array.0;
    let element_size = args.element_size;

    let mut in_blocks = Partition::new(args.input.0, "in", Some(array), FillMode::None, element_size)
        .context("opening input partition")?;
    let mut out_blocks = Partition::new(args.output.0, "out", Some(array), FillMode::None, element_size)
        .context("opening output partition")?;

    let mut from_in = Block::new((0, 0, 0), array, element_size);
    in_blocks.read_block(&mut from_in).context("reconstructing array from input blocks")?;

    let mut from_out = Block::new((0, 0, 0), array, element_size);
    out_blocks.read_block(&mut from_out).context("reconstructing array from output blocks")?;

    let len = from_in.byte_len();
    if from_in.data.get(0, len) != from_out.data.get(0, len) {
        bail!("input-reconstructed and output-reconstructed arrays differ");
    }

    log::info!("input and output blocks reconstruct byte-identical arrays");
    Ok(())
}
