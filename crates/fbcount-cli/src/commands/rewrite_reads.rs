//! Stage 2: read rewriting (spec §4.2).

use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use fbcount_core::barcode::DecisionMap;
use fbcount_core::io::fastq::{FastqReader, FastqWriter};
use fbcount_core::rewrite::rewrite_reads as run_rewrite;
use fbcount_core::Config;

#[derive(Args)]
pub struct RewriteReadsArgs {
    /// Sample name
    #[arg(short, long)]
    sample: String,

    /// Path to the pipeline config JSON
    #[arg(short, long)]
    config: PathBuf,

    /// Raw R1 FASTQ
    #[arg(long)]
    raw_r1: PathBuf,

    /// Raw R2 FASTQ
    #[arg(long)]
    raw_r2: PathBuf,

    /// Directory containing `{sample}_{segment}.barcode.bin` decision maps
    #[arg(long)]
    decisions_dir: PathBuf,

    /// Output directory for normalized `{sample}_r1.fq.gz`/`{sample}_r2.fq.gz`
    #[arg(short, long)]
    out_dir: PathBuf,
}

pub fn run(args: RewriteReadsArgs) -> Result<()> {
    let config = Config::from_file(&args.config).context("failed to load pipeline config")?;
    std::fs::create_dir_all(&args.out_dir)?;

    let mut decisions: HashMap<String, DecisionMap> = HashMap::new();
    for name in config.barcode_segments.keys() {
        let path = args.decisions_dir.join(format!("{}_{}.barcode.bin", args.sample, name));
        let map: DecisionMap =
            fbcount_core::io::binary::read(&path).with_context(|| format!("failed to load decisions for segment `{name}`"))?;
        decisions.insert(name.clone(), map);
    }

    let raw_r1 = FastqReader::open(&args.raw_r1).context("failed to open raw R1")?;
    let raw_r2 = FastqReader::open(&args.raw_r2).context("failed to open raw R2")?;

    let mut out_r1 = FastqWriter::create(args.out_dir.join(format!("{}_r1.fq.gz", args.sample)))?;
    let mut out_r2 = FastqWriter::create(args.out_dir.join(format!("{}_r2.fq.gz", args.sample)))?;

    let stats = run_rewrite(raw_r1, raw_r2, &config, &decisions, &mut out_r1, &mut out_r2)?;

    log::info!(
        "rewrite-reads: sample `{}`, {} total, {} valid",
        args.sample,
        stats.total_reads,
        stats.valid_reads
    );
    Ok(())
}
