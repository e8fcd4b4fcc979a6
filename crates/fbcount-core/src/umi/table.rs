//! The UMI table type and its TSV rendering (spec §4.3, §6).

use std::collections::HashMap;
use std::io::Write;
use std::path::Path;

use crate::config::Config;
use crate::{Error, Result};

/// `composite_barcode -> (umi -> read_count)`.
pub type UmiTable = HashMap<String, HashMap<String, u64>>;

/// Count of distinct UMI types per composite barcode, `|table[bc]|`.
pub fn bc_umi_type_counts(table: &UmiTable) -> HashMap<String, usize> {
    table.iter().map(|(bc, umis)| (bc.clone(), umis.len())).collect()
}

/// Split a composite barcode `barcode1_barcode2` back into its parts and
/// render as `barcode1_with_plus \t feature_label \t count`, matching
/// `write_dict_to_tsv` in the reference (spec §6).
///
/// Rows are written in ascending order of count.
pub fn write_umi_type_tsv<P: AsRef<Path>>(
    path: P,
    counts: &HashMap<String, usize>,
    config: &Config,
    feature_labels: &HashMap<String, String>,
) -> Result<()> {
    let boundaries = config.barcode1_boundaries()?;

    let mut rows: Vec<(&str, usize)> = counts.iter().map(|(bc, &n)| (bc.as_str(), n)).collect();
    rows.sort_by_key(|&(_, n)| n);

    let file = std::fs::File::create(path.as_ref())?;
    let mut writer = std::io::BufWriter::new(file);

    for (composite, count) in rows {
        let (barcode1, barcode2) = composite
            .split_once('_')
            .ok_or_else(|| Error::Umi(format!("composite barcode `{composite}` missing `_` separator")))?;

        let mut parts = Vec::with_capacity(boundaries.len());
        let mut start = 0usize;
        for &end in &boundaries {
            parts.push(barcode1.get(start..end).unwrap_or(""));
            start = end;
        }
        let barcode1_rendered = parts.join("+");

        let label = feature_labels
            .get(barcode2)
            .ok_or_else(|| Error::Umi(format!("no feature label for barcode2 `{barcode2}`")))?;

        writeln!(writer, "{barcode1_rendered}\t{label}\t{count}")?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BarcodeSegmentDef, ReadSlot};
    use std::path::PathBuf;
    use tempfile::tempdir;

    fn test_config() -> Config {
        let mut barcode_segments = HashMap::new();
        barcode_segments.insert(
            "bc1".to_string(),
            BarcodeSegmentDef { name: "bc1".to_string(), read: ReadSlot::R1, start: 0, end: 4, whitelist_path: PathBuf::new() },
        );
        barcode_segments.insert(
            "bc2".to_string(),
            BarcodeSegmentDef { name: "bc2".to_string(), read: ReadSlot::R1, start: 4, end: 8, whitelist_path: PathBuf::new() },
        );
        Config {
            barcode_segments,
            barcode1: vec!["bc1".to_string(), "bc2".to_string()],
            barcode2: vec![],
            umi: vec![],
            feature_barcode: PathBuf::new(),
            feature_barcode_info: PathBuf::new(),
        }
    }

    #[test]
    fn renders_plus_joined_barcode1_and_sorts_ascending() {
        let config = test_config();
        let mut labels = HashMap::new();
        labels.insert("TTTT".to_string(), "CD4".to_string());
        labels.insert("GGGG".to_string(), "CD3".to_string());

        let mut counts = HashMap::new();
        counts.insert("AAAACCCC_TTTT".to_string(), 5usize);
        counts.insert("AAAACCCC_GGGG".to_string(), 2usize);

        let dir = tempdir().unwrap();
        let path = dir.path().join("counts.map");
        write_umi_type_tsv(&path, &counts, &config, &labels).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines, vec!["AAAA+CCCC\tCD3\t2", "AAAA+CCCC\tCD4\t5"]);
    }
}
