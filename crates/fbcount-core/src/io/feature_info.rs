//! Feature-barcode info file parsing (spec §4.5, §6): tab-separated
//! `Code \t FB \t Info` rows mapping each feature-barcode sequence to the
//! (possibly coarser) Info label used for the final feature x sample
//! aggregation — distinct from the feature FASTA's sequence-to-label
//! mapping used for per-(barcode1, feature) row rendering.

use std::collections::HashMap;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::{Error, Result};

/// Parse the feature-barcode info TSV into an `FB sequence -> Info label`
/// map (spec §4.5: "for each feature (keyed by Info label)").
///
/// A literal `Code\tFB\tInfo` header row, if present, is skipped.
pub fn parse_feature_info<P: AsRef<Path>>(path: P) -> Result<HashMap<String, String>> {
    let file = std::fs::File::open(path.as_ref())
        .map_err(|e| Error::Feature(format!("failed to open feature-barcode info {:?}: {e}", path.as_ref())))?;
    let reader = BufReader::new(file);

    let mut map = HashMap::new();
    for line in reader.lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let mut cols = line.split('\t');
        let (Some(code), Some(fb), Some(info)) = (cols.next(), cols.next(), cols.next()) else {
            return Err(Error::Feature(format!("malformed feature-barcode info row: `{line}`")));
        };
        if code == "Code" && fb == "FB" && info == "Info" {
            continue;
        }
        map.insert(fb.to_string(), info.to_string());
    }
    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn parses_rows_and_skips_header() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("feature_info.tsv");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "Code\tFB\tInfo").unwrap();
        writeln!(file, "1\tACGTACGT\tCD3").unwrap();
        writeln!(file, "2\tTTTTGGGG\tCD4").unwrap();
        drop(file);

        let map = parse_feature_info(&path).unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(map.get("ACGTACGT"), Some(&"CD3".to_string()));
        assert_eq!(map.get("TTTTGGGG"), Some(&"CD4".to_string()));
    }

    #[test]
    fn parses_without_header() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("feature_info.tsv");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "1\tACGTACGT\tCD3").unwrap();
        drop(file);

        let map = parse_feature_info(&path).unwrap();
        assert_eq!(map.get("ACGTACGT"), Some(&"CD3".to_string()));
    }
}
