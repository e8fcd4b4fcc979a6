//! Stage 3c: per-feature UMI aggregation (spec §4.5).

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use fbcount_core::feature::{aggregate_feature_totals, write_feature_totals_tsv};
use fbcount_core::io::feature_info::parse_feature_info;
use fbcount_core::umi::UmiTable;
use fbcount_core::Config;

#[derive(Args)]
pub struct AggregateFeaturesArgs {
    /// Sample name
    #[arg(short, long)]
    sample: String,

    /// Path to the pipeline config JSON
    #[arg(short, long)]
    config: PathBuf,

    /// Directory containing `{sample}_dic_after_downsample.json`
    #[arg(short, long)]
    input_dir: PathBuf,

    /// Output directory for the feature x sample matrix
    #[arg(short, long)]
    output_dir: PathBuf,
}

pub fn run(args: AggregateFeaturesArgs) -> Result<()> {
    let config = Config::from_file(&args.config).context("failed to load pipeline config")?;
    std::fs::create_dir_all(&args.output_dir)?;

    let dic_path = args.input_dir.join(format!("{}_dic_after_downsample.json", args.sample));
    let optimal_table: UmiTable =
        serde_json::from_reader(std::fs::File::open(&dic_path).with_context(|| format!("{:?}", dic_path))?)?;

    let feature_info =
        parse_feature_info(&config.feature_barcode_info).context("failed to load feature-barcode info TSV")?;

    let totals = aggregate_feature_totals(&optimal_table, &feature_info)?;
    write_feature_totals_tsv(args.output_dir.join(format!("{}_feature_counts.tsv", args.sample)), &totals)?;

    log::info!("aggregate-features: sample `{}`, {} features totaled", args.sample, totals.len());
    Ok(())
}
