//! Stage 3b: saturation estimation by downsampling (spec §4.4).

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use fbcount_core::io::fasta::parse_feature_fasta;
use fbcount_core::saturation::{compute_grid, rows_only, select_optimal, write_grid_tsv};
use fbcount_core::umi::{bc_umi_type_counts, write_umi_type_tsv, UmiTable};
use fbcount_core::Config;

#[derive(Args)]
pub struct EstimateSaturationArgs {
    /// Sample name
    #[arg(short, long)]
    sample: String,

    /// Path to the pipeline config JSON
    #[arg(short, long)]
    config: PathBuf,

    /// Directory containing `{sample}_dic_B.json` (corrected UMI table)
    #[arg(short, long)]
    input_dir: PathBuf,

    /// Output directory for the downsample grid and optimal-ratio snapshot
    #[arg(short, long)]
    output_dir: PathBuf,
}

pub fn run(args: EstimateSaturationArgs) -> Result<()> {
    let config = Config::from_file(&args.config).context("failed to load pipeline config")?;
    std::fs::create_dir_all(&args.output_dir)?;

    let dic_b_path = args.input_dir.join(format!("{}_dic_B.json", args.sample));
    let corrected: UmiTable =
        serde_json::from_reader(std::fs::File::open(&dic_b_path).with_context(|| format!("{:?}", dic_b_path))?)?;

    let grid = compute_grid(&corrected);
    write_grid_tsv(args.output_dir.join(format!("{}_Downsample.tsv", args.sample)), &rows_only(&grid))?;

    let optimal = select_optimal(&grid);
    log::info!(
        "estimate-saturation: sample `{}`, optimal ratio {} (saturation {:.2}%, duplication {:.2}%)",
        args.sample,
        optimal.0.ratio,
        optimal.0.saturation,
        optimal.0.duplication
    );

    serde_json::to_writer_pretty(
        std::fs::File::create(args.output_dir.join(format!("{}_dic_after_downsample.json", args.sample)))?,
        &optimal.1,
    )?;

    let feature_labels = parse_feature_fasta(&config.feature_barcode).context("failed to load feature-barcode FASTA")?;
    let counts = bc_umi_type_counts(&optimal.1);
    write_umi_type_tsv(
        args.output_dir.join(format!("{}_per_bc_umi_count_after_downsample.map", args.sample)),
        &counts,
        &config,
        &feature_labels,
    )?;

    Ok(())
}
