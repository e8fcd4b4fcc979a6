//! Barcode whitelist loading and the empirical prior used by the
//! barcode corrector (spec §3, §4.1).

use std::path::Path;

use ahash::AHashMap;

use crate::io::fastq::FastqReader;
use crate::{Error, Result};

/// A whitelist of fixed-length barcode sequences, indexed in sorted
/// order (spec §3: "an ordered assignment of integer indices to sorted
/// sequences").
#[derive(Debug, Clone)]
pub struct Whitelist {
    /// Sequences in sorted (index) order.
    sequences: Vec<String>,
    /// sequence -> index, for O(1) membership/index lookup.
    index: AHashMap<String, usize>,
    seq_len: usize,
}

impl Whitelist {
    /// Load a whitelist from a file of one sequence per line. Any line
    /// containing `#` anywhere (not just as a prefix) is dropped, per
    /// spec §9 ambiguity note 4.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())
            .map_err(|e| Error::Whitelist(format!("failed to read whitelist {:?}: {e}", path.as_ref())))?;
        Self::from_lines(text.lines())
    }

    /// Build a whitelist directly from an iterator of sequences (and
    /// comment/blank lines to be filtered), bypassing file I/O. Useful for
    /// tests and for whitelists constructed programmatically.
    pub fn from_sequences<'a, I: IntoIterator<Item = &'a str>>(lines: I) -> Result<Self> {
        Self::from_lines(lines.into_iter())
    }

    fn from_lines<'a, I: Iterator<Item = &'a str>>(lines: I) -> Result<Self> {
        let mut sequences: Vec<String> = lines
            .map(str::trim)
            .filter(|l| !l.is_empty() && !l.contains('#'))
            .map(str::to_string)
            .collect();
        sequences.sort();
        sequences.dedup();

        let seq_len = sequences.first().map(String::len).unwrap_or(0);
        for seq in &sequences {
            if seq.len() != seq_len {
                return Err(Error::Whitelist(format!(
                    "inconsistent whitelist sequence length: expected {seq_len}, got {} for `{seq}`",
                    seq.len()
                )));
            }
        }

        let index = sequences
            .iter()
            .enumerate()
            .map(|(i, s)| (s.clone(), i))
            .collect();

        Ok(Self { sequences, index, seq_len })
    }

    pub fn len(&self) -> usize {
        self.sequences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequences.is_empty()
    }

    pub fn seq_len(&self) -> usize {
        self.seq_len
    }

    pub fn contains(&self, seq: &str) -> bool {
        self.index.contains_key(seq)
    }

    pub fn index_of(&self, seq: &str) -> Option<usize> {
        self.index.get(seq).copied()
    }

    pub fn sequence_at(&self, idx: usize) -> Option<&str> {
        self.sequences.get(idx).map(String::as_str)
    }

    pub fn sequences(&self) -> &[String] {
        &self.sequences
    }

    /// Estimate the empirical prior from occurrence counts of whitelist
    /// members in a pre-clipped segment FASTQ, using add-one smoothing
    /// and L1 normalization (spec §4.1: "Prior estimation").
    ///
    /// Candidates not in the whitelist do not contribute to counts.
    pub fn estimate_prior<P: AsRef<Path>>(&self, preclipped_fastq: P) -> Result<Prior> {
        let mut counts = vec![0u64; self.len()];
        let reader = FastqReader::open(preclipped_fastq)?;
        for record in reader {
            let record = record?;
            let seq = String::from_utf8_lossy(&record.seq);
            if let Some(idx) = self.index_of(&seq) {
                counts[idx] += 1;
            }
        }
        Ok(Prior::from_counts(&counts))
    }
}

/// An empirical prior probability vector over whitelist indices.
#[derive(Debug, Clone)]
pub struct Prior {
    weights: Vec<f64>,
}

impl Prior {
    /// `prior[i] = (count[i] + 1) / sum(count[j] + 1)`.
    pub fn from_counts(counts: &[u64]) -> Self {
        let smoothed: Vec<f64> = counts.iter().map(|&c| c as f64 + 1.0).collect();
        let total: f64 = smoothed.iter().sum();
        let weights = if total > 0.0 {
            smoothed.into_iter().map(|w| w / total).collect()
        } else {
            smoothed
        };
        Self { weights }
    }

    pub fn get(&self, idx: usize) -> f64 {
        self.weights[idx]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sorts_and_indexes_sequences() {
        let wl = Whitelist::from_lines(["TTTT", "AAAA", "# comment", "CCCC"].into_iter()).unwrap();
        assert_eq!(wl.len(), 3);
        assert_eq!(wl.sequences(), &["AAAA".to_string(), "CCCC".to_string(), "TTTT".to_string()]);
        assert_eq!(wl.index_of("AAAA"), Some(0));
    }

    #[test]
    fn strips_lines_containing_hash_anywhere() {
        let wl = Whitelist::from_lines(["AAAA", "AC#GT", "CCCC"].into_iter()).unwrap();
        assert_eq!(wl.len(), 2);
        assert!(!wl.contains("AC#GT"));
    }

    #[test]
    fn rejects_inconsistent_lengths() {
        let result = Whitelist::from_lines(["AAAA", "CCCCC"].into_iter());
        assert!(result.is_err());
    }

    #[test]
    fn prior_add_one_smoothing_and_l1_norm() {
        let prior = Prior::from_counts(&[9, 0]);
        // (9+1)/((9+1)+(0+1)) = 10/11, (0+1)/11 = 1/11
        assert!((prior.get(0) - 10.0 / 11.0).abs() < 1e-9);
        assert!((prior.get(1) - 1.0 / 11.0).abs() < 1e-9);
    }
}
