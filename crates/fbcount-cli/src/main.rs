//! fbcount CLI - feature-barcode / UMI quantification pipeline

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "fbcount")]
#[command(author, version, about = "fbcount: feature-barcode/UMI quantification pipeline", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Number of threads to use
    #[arg(short = 'j', long, global = true, default_value = "0")]
    threads: usize,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Stage 1: correct barcode segments against their whitelists
    CorrectBarcodes(commands::correct_barcodes::CorrectBarcodesArgs),

    /// Stage 2: rewrite raw reads into normalized barcode1+UMI / barcode2 streams
    RewriteReads(commands::rewrite_reads::RewriteReadsArgs),

    /// Stage 3a: tabulate and correct UMIs per composite barcode
    CountUmi(commands::count_umi::CountUmiArgs),

    /// Stage 3b: estimate sequencing saturation by downsampling
    EstimateSaturation(commands::estimate_saturation::EstimateSaturationArgs),

    /// Stage 3c: aggregate per-feature UMI counts
    AggregateFeatures(commands::aggregate_features::AggregateFeaturesArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    }

    if cli.threads > 0 {
        rayon::ThreadPoolBuilder::new().num_threads(cli.threads).build_global().ok();
    }

    match cli.command {
        Commands::CorrectBarcodes(args) => commands::correct_barcodes::run(args),
        Commands::RewriteReads(args) => commands::rewrite_reads::run(args),
        Commands::CountUmi(args) => commands::count_umi::run(args),
        Commands::EstimateSaturation(args) => commands::estimate_saturation::run(args),
        Commands::AggregateFeatures(args) => commands::aggregate_features::run(args),
    }
}
