//! S3c: feature aggregation (spec §4.5) and the per-sample summary row
//! supplemented from the original's `summary.py` (SPEC_FULL.md §4.5).

use std::collections::HashMap;
use std::path::Path;

use crate::barcode::report::SegmentReport;
use crate::config::Config;
use crate::saturation::GridRow;
use crate::umi::table::UmiTable;
use crate::Result;

/// One row of the final feature x sample matrix: a feature's total UMI
/// count across every barcode1 in the sample.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureTotal {
    pub feature_label: String,
    pub total_umi_count: u64,
}

/// Sum UMI counts per **Info label** across all barcode1s in the chosen
/// downsampled table (spec §4.5: "for each feature (keyed by Info label),
/// sum UMI counts across all barcode1s").
///
/// The composite barcode key is `barcode1_barcode2`; `barcode2` (the raw
/// feature-barcode sequence) is translated to its Info label via
/// `feature_info`, the `FB sequence -> Info` map parsed from the
/// `feature_barcode_info` file (spec §6) — distinct from the feature
/// FASTA's sequence-to-label map used for per-(barcode1, feature) row
/// rendering (see [`crate::umi::write_umi_type_tsv`]).
pub fn aggregate_feature_totals(table: &UmiTable, feature_info: &HashMap<String, String>) -> Result<Vec<FeatureTotal>> {
    let mut totals: HashMap<String, u64> = HashMap::new();

    for (composite, umis) in table {
        let (_, barcode2) = composite.split_once('_').ok_or_else(|| {
            crate::Error::Feature(format!("composite barcode `{composite}` missing `_` separator"))
        })?;
        let label = feature_info
            .get(barcode2)
            .ok_or_else(|| crate::Error::Feature(format!("no Info label for barcode2 `{barcode2}`")))?;
        let umi_count: u64 = umis.len() as u64;
        *totals.entry(label.clone()).or_insert(0) += umi_count;
    }

    let mut rows: Vec<FeatureTotal> = totals
        .into_iter()
        .map(|(feature_label, total_umi_count)| FeatureTotal { feature_label, total_umi_count })
        .collect();
    rows.sort_by(|a, b| a.feature_label.cmp(&b.feature_label));
    Ok(rows)
}

/// Write the feature x sample matrix as a two-column TSV
/// (`feature \t total_umi_count`).
pub fn write_feature_totals_tsv<P: AsRef<Path>>(path: P, rows: &[FeatureTotal]) -> Result<()> {
    use std::io::Write;
    let file = std::fs::File::create(path.as_ref())?;
    let mut writer = std::io::BufWriter::new(file);
    for row in rows {
        writeln!(writer, "{}\t{}", row.feature_label, row.total_umi_count)?;
    }
    Ok(())
}

/// Per-sample summary: segment validity percentages plus headline
/// saturation/duplication/UMI-count numbers, mirroring the columns the
/// reference's `summary.py` aggregates across samples. Multi-sample
/// aggregation itself is out of scope (SPEC_FULL.md §4.5); this struct
/// is what a future multi-sample driver would consume, one per sample.
#[derive(Debug, Clone)]
pub struct SampleSummary {
    pub sample: String,
    /// `segment_name -> barcode_valid_percent`.
    pub segment_valid_percent: HashMap<String, f64>,
    pub optimal_ratio: f64,
    pub sequencing_saturation: f64,
    pub duplication_rate: f64,
    pub umi_count: u64,
}

impl SampleSummary {
    pub fn new(sample: impl Into<String>, segment_reports: &HashMap<String, SegmentReport>, optimal: &GridRow) -> Self {
        let segment_valid_percent =
            segment_reports.iter().map(|(name, report)| (name.clone(), report.barcode_valid_percent())).collect();
        Self {
            sample: sample.into(),
            segment_valid_percent,
            optimal_ratio: optimal.ratio,
            sequencing_saturation: optimal.saturation,
            duplication_rate: optimal.duplication,
            umi_count: optimal.umi_reads,
        }
    }
}

/// Render barcode1 rendering helper shared with the UMI-type TSV writer:
/// exposed here too since S3c needs the same `'+'`-joined form when
/// producing per-(barcode1, feature) rows directly from a `Config`.
pub fn render_barcode1(raw_barcode1: &str, config: &Config) -> Result<String> {
    let boundaries = config.barcode1_boundaries()?;
    let mut parts = Vec::with_capacity(boundaries.len());
    let mut start = 0usize;
    for &end in &boundaries {
        parts.push(raw_barcode1.get(start..end).unwrap_or(""));
        start = end;
    }
    Ok(parts.join("+"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sums_umi_counts_per_info_label() {
        let mut table = UmiTable::new();
        let mut umis1 = HashMap::new();
        umis1.insert("U1".to_string(), 5u64);
        umis1.insert("U2".to_string(), 2u64);
        table.insert("AAAA_TTTT".to_string(), umis1);

        let mut umis2 = HashMap::new();
        umis2.insert("U3".to_string(), 9u64);
        table.insert("CCCC_TTTT".to_string(), umis2);

        let mut feature_info = HashMap::new();
        feature_info.insert("TTTT".to_string(), "CD4".to_string());

        let totals = aggregate_feature_totals(&table, &feature_info).unwrap();
        assert_eq!(totals.len(), 1);
        // 2 UMI types for AAAA_TTTT + 1 UMI type for CCCC_TTTT.
        assert_eq!(totals[0], FeatureTotal { feature_label: "CD4".to_string(), total_umi_count: 3 });
    }

    /// The FASTA label and the Info label are distinct mappings keyed by
    /// the same raw barcode2 sequence; aggregation must use the latter.
    #[test]
    fn info_label_can_differ_from_fasta_label() {
        let mut table = UmiTable::new();
        table.insert("AAAA_TTTT".to_string(), HashMap::from([("U1".to_string(), 1u64)]));

        // `feature_barcode` (FASTA) would label "TTTT" as "CD4-ab1", but
        // `feature_barcode_info` groups it under the coarser "CD4" Info.
        let mut feature_info = HashMap::new();
        feature_info.insert("TTTT".to_string(), "CD4".to_string());

        let totals = aggregate_feature_totals(&table, &feature_info).unwrap();
        assert_eq!(totals, vec![FeatureTotal { feature_label: "CD4".to_string(), total_umi_count: 1 }]);
    }

    #[test]
    fn errors_on_unknown_info_label() {
        let mut table = UmiTable::new();
        table.insert("AAAA_GGGG".to_string(), HashMap::from([("U1".to_string(), 1u64)]));
        let feature_info = HashMap::new();
        assert!(aggregate_feature_totals(&table, &feature_info).is_err());
    }
}
