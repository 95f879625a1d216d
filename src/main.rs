use anyhow::Result;
use clap::{Parser, Subcommand};

use keepart::cli;

#[derive(Parser)]
#[command(
    name = "keepart",
    version,
    about = concat!(
        "keepart: repartitions a large on-disk 3-D array of uniform blocks\n",
        "into blocks of a different shape, bounding peak memory and\n",
        "minimizing disk seeks.\nVersion: ",
        env!("CARGO_PKG_VERSION")
    ),
    propagate_version = true
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Repartition input blocks into output blocks
    Repartition(cli::RepartitionArgs),

    /// Create input blocks from fresh randomness
    Create(cli::CreateArgs),

    /// Check that input and output blocks reconstruct the same array
    TestData(cli::TestDataArgs),

    /// Delete output blocks
    Delete(cli::DeleteArgs),
}

fn main() -> Result<()> {
    keepart::log::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Repartition(args) => cli::run_repartition(&args)?,
        Commands::Create(args) => cli::run_create(&args)?,
        Commands::TestData(args) => cli::run_test_data(&args)?,
        Commands::Delete(args) => cli::run_delete(&args)?,
    }

    Ok(())
}
