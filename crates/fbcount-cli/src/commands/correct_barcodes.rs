//! Stage 1: barcode correction (spec §4.1).

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;

use fbcount_core::barcode::{self, SegmentCoords};
use fbcount_core::io::fastq::{open_or_create_empty, FastqReader};
use fbcount_core::io::whitelist::Whitelist;
use fbcount_core::Config;

#[derive(Args)]
pub struct CorrectBarcodesArgs {
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

    /// Directory containing pre-clipped per-segment candidate FASTQs
    #[arg(long)]
    preclipped_dir: PathBuf,

    /// Directory to write per-segment `.barcode.info` logs
    #[arg(long)]
    logs_dir: PathBuf,

    /// Output directory for `.barcode.bin` decision maps
    #[arg(short, long)]
    out_dir: PathBuf,
}

pub fn run(args: CorrectBarcodesArgs) -> Result<()> {
    let config = Config::from_file(&args.config).context("failed to load pipeline config")?;
    std::fs::create_dir_all(&args.out_dir)?;
    std::fs::create_dir_all(&args.logs_dir)?;

    let progress = ProgressBar::new(config.barcode_segments.len() as u64);
    progress.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] segments {pos}/{len} {msg}")
            .unwrap(),
    );

    let results: Vec<Result<String>> = config
        .barcode_segments
        .par_iter()
        .map(|(name, segment)| -> Result<String> {
            let whitelist = Whitelist::from_file(&segment.whitelist_path)
                .with_context(|| format!("failed to load whitelist for segment `{name}`"))?;

            let preclipped_path = args.preclipped_dir.join(format!("{}_{}.fq.gz", args.sample, name));
            let preclipped_reader =
                open_or_create_empty(&preclipped_path).with_context(|| format!("segment `{name}` pre-clipped FASTQ"))?;
            let (preclipped_map, prior) = barcode::prepare_segment_inputs(preclipped_reader, &whitelist)?;

            let raw_path = match segment.read {
                fbcount_core::config::ReadSlot::R1 => &args.raw_r1,
                fbcount_core::config::ReadSlot::R2 => &args.raw_r2,
            };
            let raw_reader = FastqReader::open(raw_path).with_context(|| format!("segment `{name}` raw FASTQ"))?;

            let coords = SegmentCoords { start: segment.start, end: segment.end };
            let (decisions, report) = barcode::correct_segment(raw_reader, &preclipped_map, &whitelist, &prior, &coords)?;

            let bin_path = args.out_dir.join(format!("{}_{}.barcode.bin", args.sample, name));
            fbcount_core::io::binary::write(&bin_path, &decisions)?;

            let info_path = args.logs_dir.join(format!("{}_{}.barcode.info", args.sample, name));
            let file = std::fs::File::create(&info_path)?;
            serde_json::to_writer_pretty(file, &report)?;

            progress.inc(1);
            progress.set_message(format!("last finished: `{name}` ({:.2}% valid)", report.barcode_valid_percent()));

            Ok(name.clone())
        })
        .collect();

    progress.finish_with_message("done");

    for result in results {
        result?;
    }

    log::info!("correct-barcodes: finished sample `{}`", args.sample);
    Ok(())
}
