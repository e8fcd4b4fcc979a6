//! The probabilistic barcode correction procedure (spec §4.1).

use crate::io::whitelist::{Prior, Whitelist};

/// Confidence threshold `tau` above which a posterior match is accepted.
pub const CONFIDENCE_THRESHOLD: f64 = 0.975;
/// Maximum Hamming distance considered for correction.
pub const MAX_DISTANCE: u32 = 1;

const ALPHABET: [u8; 4] = [b'A', b'C', b'G', b'T'];

/// Outcome of running the correction procedure on one candidate sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Already a whitelist member and accepted without needing the
    /// posterior (either via the high-quality shortcut, or because the
    /// posterior happened to concentrate back onto the original sequence).
    Uncorrected(String),
    /// Corrected to a distinct whitelist neighbor.
    Corrected(String),
    /// No candidate cleared the confidence threshold.
    Failed,
}

/// Clamp raw Phred+33 quality bytes to the closed integer interval `[3, 40]`
/// (spec §4.1 step 1).
pub fn clamp_qualities(qual: &[u8]) -> Vec<i32> {
    qual.iter()
        .map(|&q| (q as i32 - 33).clamp(3, 40))
        .collect()
}

/// Enumerate whitelist neighbors at Hamming distance exactly 1 from `seq`,
/// treating any `'N'` in `seq` as mandatorily differing (spec §4.1,
/// "Neighbor enumeration").
///
/// Returns `(candidate_sequence, sum_of_clamped_quality_at_differing_positions)`
/// pairs for every whitelist member within distance 1.
fn enumerate_neighbors(seq: &str, clamped_qual: &[i32], whitelist: &Whitelist) -> Vec<(String, i32)> {
    let bytes: Vec<u8> = seq.bytes().collect();
    let n_positions: Vec<usize> = bytes.iter().enumerate().filter(|(_, &b)| b == b'N').map(|(i, _)| i).collect();

    match n_positions.len() {
        0 => {
            let mut out = Vec::new();
            for i in 0..bytes.len() {
                let original = bytes[i];
                for &alt in &ALPHABET {
                    if alt == original {
                        continue;
                    }
                    let mut candidate = bytes.clone();
                    candidate[i] = alt;
                    let candidate_str = String::from_utf8(candidate).expect("ASCII DNA alphabet");
                    if whitelist.contains(&candidate_str) {
                        out.push((candidate_str, clamped_qual[i]));
                    }
                }
            }
            out
        }
        1 => {
            let pos = n_positions[0];
            let mut out = Vec::new();
            for &alt in &ALPHABET {
                let mut candidate = bytes.clone();
                candidate[pos] = alt;
                let candidate_str = String::from_utf8(candidate).expect("ASCII DNA alphabet");
                if whitelist.contains(&candidate_str) {
                    out.push((candidate_str, clamped_qual[pos]));
                }
            }
            out
        }
        _ => Vec::new(),
    }
}

/// Run the correction procedure on one `(seq, qual)` pair (spec §4.1,
/// "Correction procedure").
pub fn correct(seq: &str, qual: &[u8], whitelist: &Whitelist, prior: &Prior) -> Outcome {
    let clamped = clamp_qualities(qual);

    let in_whitelist = whitelist.contains(seq);
    if in_whitelist && clamped.iter().all(|&q| q > 24) {
        return Outcome::Uncorrected(seq.to_string());
    }

    let mut candidates: Vec<String> = Vec::new();
    let mut likelihoods: Vec<f64> = Vec::new();

    if in_whitelist {
        let idx = whitelist.index_of(seq).expect("checked contains above");
        candidates.push(seq.to_string());
        likelihoods.push(prior.get(idx));
    }

    for (candidate, qsum) in enumerate_neighbors(seq, &clamped, whitelist) {
        let idx = whitelist.index_of(&candidate).expect("enumerate_neighbors only yields whitelist members");
        let p_bc = prior.get(idx);
        let likelihood = p_bc * 10f64.powf(-(qsum as f64) / 10.0);
        candidates.push(candidate);
        likelihoods.push(likelihood);
    }

    if candidates.is_empty() {
        return Outcome::Failed;
    }

    let total: f64 = likelihoods.iter().sum();
    let posterior: Vec<f64> = likelihoods.iter().map(|l| l / total).collect();

    let (best_idx, &best_p) = posterior
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
        .map(|(i, p)| (i, p))
        .expect("candidates is non-empty");

    if best_p > CONFIDENCE_THRESHOLD {
        let best_seq = &candidates[best_idx];
        if best_seq == seq {
            Outcome::Uncorrected(best_seq.clone())
        } else {
            Outcome::Corrected(best_seq.clone())
        }
    } else {
        Outcome::Failed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::whitelist::Whitelist;

    fn whitelist_of(seqs: &[&str]) -> Whitelist {
        Whitelist::from_sequences(seqs.iter().copied()).unwrap()
    }

    // Scenario A: single-read, perfect barcode.
    #[test]
    fn scenario_a_perfect_barcode_shortcut() {
        let wl = whitelist_of(&["ACGT"]);
        let prior = Prior::from_counts(&[1]);
        let outcome = correct("ACGT", b"IIII", &wl, &prior);
        assert_eq!(outcome, Outcome::Uncorrected("ACGT".to_string()));
    }

    // Scenario B: Hamming-1 correction succeeds.
    #[test]
    fn scenario_b_hamming1_correction_succeeds() {
        let wl = whitelist_of(&["ACGT", "TTTT"]);
        let prior = Prior::from_counts(&[9, 1]);
        let outcome = correct("ACGA", b"IIII", &wl, &prior);
        assert_eq!(outcome, Outcome::Corrected("ACGT".to_string()));
    }

    // Scenario C: correction fails by confidence, and separately by empty
    // candidate set.
    #[test]
    fn scenario_c_confidence_and_empty_candidates() {
        let wl = whitelist_of(&["AAAA", "CCCC"]);
        let prior = Prior::from_counts(&[1, 1]);

        let low_qual = [2u8 + 33, 2 + 33, 2 + 33, 2 + 33];
        let outcome = correct("ACCC", &low_qual, &wl, &prior);
        assert_eq!(outcome, Outcome::Corrected("CCCC".to_string()));

        let outcome2 = correct("AACC", &low_qual, &wl, &prior);
        assert_eq!(outcome2, Outcome::Failed);
    }

    #[test]
    fn neighbor_enumeration_respects_n_position() {
        let wl = whitelist_of(&["ACGT", "ACGA", "ACGC"]);
        let clamped = clamp_qualities(b"IIII");
        let neighbors = enumerate_neighbors("ACGN", &clamped, &wl);
        // N at position 3 must match a whitelist member differing only there.
        let mut seqs: Vec<_> = neighbors.iter().map(|(s, _)| s.clone()).collect();
        seqs.sort();
        assert_eq!(seqs, vec!["ACGA".to_string(), "ACGC".to_string(), "ACGT".to_string()]);
    }

    #[test]
    fn neighbor_enumeration_two_or_more_n_is_empty() {
        let wl = whitelist_of(&["ACGT"]);
        let clamped = clamp_qualities(b"IIII");
        let neighbors = enumerate_neighbors("ANGN", &clamped, &wl);
        assert!(neighbors.is_empty());
    }
}
