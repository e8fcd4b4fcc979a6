//! Stage 3a: UMI tabulation and correction (spec §4.3).

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use fbcount_core::io::fasta::parse_feature_fasta;
use fbcount_core::io::fastq::FastqReader;
use fbcount_core::umi::{self, bc_umi_type_counts, write_umi_type_tsv};
use fbcount_core::Config;

#[derive(Args)]
pub struct CountUmiArgs {
    /// Sample name
    #[arg(short, long)]
    sample: String,

    /// Path to the pipeline config JSON
    #[arg(short, long)]
    config: PathBuf,

    /// Directory containing `{sample}_r1.fq.gz`/`{sample}_r2.fq.gz`
    #[arg(short, long)]
    input_dir: PathBuf,

    /// Output directory for UMI tables and logs
    #[arg(short, long)]
    output_dir: PathBuf,
}

pub fn run(args: CountUmiArgs) -> Result<()> {
    let config = Config::from_file(&args.config).context("failed to load pipeline config")?;
    std::fs::create_dir_all(&args.output_dir)?;

    let r1 = FastqReader::open(args.input_dir.join(format!("{}_r1.fq.gz", args.sample))).context("failed to open normalized R1")?;
    let r2 = FastqReader::open(args.input_dir.join(format!("{}_r2.fq.gz", args.sample))).context("failed to open normalized R2")?;

    let (total_reads, raw_table) = umi::raw_tabulate(r1, r2, &config)?;
    log::info!("count-umi: sample `{}`, {} raw reads tabulated", args.sample, total_reads);

    let (corrected_table, correction_log) = umi::correct_table(&raw_table, total_reads);

    let dic_a_path = args.output_dir.join(format!("{}_dic_A.json", args.sample));
    serde_json::to_writer_pretty(std::fs::File::create(&dic_a_path)?, &raw_table)?;
    let dic_b_path = args.output_dir.join(format!("{}_dic_B.json", args.sample));
    serde_json::to_writer_pretty(std::fs::File::create(&dic_b_path)?, &corrected_table)?;

    let log_path = args.output_dir.join(format!("{}_correct_umi.log", args.sample));
    serde_json::to_writer_pretty(std::fs::File::create(&log_path)?, &correction_log)?;

    let feature_labels = parse_feature_fasta(&config.feature_barcode).context("failed to load feature-barcode FASTA")?;

    let after_counts = bc_umi_type_counts(&corrected_table);
    write_umi_type_tsv(
        args.output_dir.join(format!("{}_per_bc_umi_count_after_correct.map", args.sample)),
        &after_counts,
        &config,
        &feature_labels,
    )?;

    let before_counts = bc_umi_type_counts(&raw_table);
    write_umi_type_tsv(
        args.output_dir.join(format!("{}_per_bc_umi_count_before_correct.map", args.sample)),
        &before_counts,
        &config,
        &feature_labels,
    )?;

    log::info!(
        "count-umi: sample `{}`, {} composite barcodes corrected",
        args.sample,
        correction_log.correct_umi_stat.len()
    );
    Ok(())
}
