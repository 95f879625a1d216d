use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};

use crate::cli::shape::Shape3;
use crate::partition::{FillMode, Partition};
use crate::{log as keeplog, planner, scheduler};

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Method {
    Baseline,
    Keep,
}

/// Repartition an input block partition into a differently-shaped
/// output block partition (§4.8).
#[derive(Parser, Debug)]
#[command(about = "Repartition input blocks into output blocks")]
pub struct RepartitionArgs {
    /// Shape of the reconstructed array, e.g. "(12,12,12)"
    pub array: Shape3,

    /// Shape of the on-disk input blocks
    pub input: Shape3,

    /// Shape of the on-disk output blocks to produce
    pub output: Shape3,

    /// Repartitioning method
    #[arg(long, value_enum, default_value_t = Method::Keep)]
    pub method: Method,

    /// Peak memory bound in bytes for the keep planner
    #[arg(long)]
    pub max_mem: Option<u64>,

    /// Element size in bytes (one byte per array element by default)
    #[arg(long, default_value_t = 1)]
    pub element_size: usize,
}

pub fn run(args: &RepartitionArgs) -> Result<()> {
    let array = args.array.0;
    let element_size = args.element_size;

    let mut in_blocks = Partition::new(args.input.0, "in", Some(array), FillMode::None, element_size)
        .context("opening input partition")?;
    let mut out_blocks = Partition::new(args.output.0, "out", Some(array), FillMode::None, element_size)
        .context("creating output partition")?;

    let plan = match args.method {
        Method::Baseline => planner::plan_baseline(array, args.input.0, args.output.0, element_size),
        Method::Keep => planner::plan_keep(array, args.input.0, args.output.0, element_size, args.max_mem)
            .context("planning the repartition")?,
    };

    log::info!(
        "repartitioning {} -> {} (method {:?}, read shape {:?})",
        args.input,
        args.output,
        args.method,
        plan.read_shape
    );

    let stats = scheduler::repartition(&mut in_blocks, &mut out_blocks, plan).context("running the repartition")?;

    log::info!(
        "done: {} bytes, {} seeks, {} bytes peak, {:.3}s read, {:.3}s write",
        stats.total_bytes,
        stats.seeks,
        stats.peak_mem,
        stats.read_time.as_secs_f64(),
        stats.write_time.as_secs_f64(),
    );

    keeplog::record(&stats).context("writing KEEP_LOG summary row")?;

    Ok(())
}
