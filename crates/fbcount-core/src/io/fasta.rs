//! Feature-barcode FASTA parsing (spec §6: alternating `>label` / sequence
//! lines, mapping each feature-barcode sequence to its human-readable
//! label).

use std::collections::HashMap;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::{Error, Result};

/// Parse a feature-barcode FASTA file into a `sequence -> label` map.
///
/// Mirrors the reference's `fa2dict`: every non-`>` line is associated
/// with the most recently seen `>` header, with no validation that
/// sequences are unique or that headers and sequences alternate 1:1.
pub fn parse_feature_fasta<P: AsRef<Path>>(path: P) -> Result<HashMap<String, String>> {
    let file = std::fs::File::open(path.as_ref())
        .map_err(|e| Error::FastaParse(format!("failed to open feature FASTA {:?}: {e}", path.as_ref())))?;
    let reader = BufReader::new(file);

    let mut map = HashMap::new();
    let mut current_label: Option<String> = None;

    for line in reader.lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if let Some(label) = line.strip_prefix('>') {
            current_label = Some(label.to_string());
        } else if let Some(label) = &current_label {
            map.insert(line.to_string(), label.clone());
        } else {
            return Err(Error::FastaParse("sequence line precedes any `>` header".to_string()));
        }
    }

    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn parses_alternating_records() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("features.fasta");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, ">CD3\nACGTACGT\n>CD4\nTTTTGGGG").unwrap();
        drop(file);

        let map = parse_feature_fasta(&path).unwrap();
        assert_eq!(map.get("ACGTACGT"), Some(&"CD3".to_string()));
        assert_eq!(map.get("TTTTGGGG"), Some(&"CD4".to_string()));
    }
}
