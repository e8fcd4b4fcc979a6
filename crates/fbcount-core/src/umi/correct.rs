//! Raw UMI tabulation and per-composite-barcode directional correction
//! (spec §4.3).

use std::collections::HashMap;

use indexmap::IndexMap;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::io::fastq::FastqRecord;
use crate::seq::PackedSeq;
use crate::umi::table::UmiTable;
use crate::{Error, Result};

const MAX_DIST_CORRECT_UMI: u32 = 1;

/// The `correct_umi.log` persisted per run: total reads processed and,
/// per composite barcode with at least one collapsed UMI, the
/// `child -> parent` mapping (spec §4.3 supplement).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorrectionLog {
    pub total_reads: u64,
    pub correct_umi_stat: HashMap<String, HashMap<String, String>>,
}

/// Walk the normalized R1/R2 streams in lockstep and build the raw
/// `composite_barcode -> umi -> count` table.
///
/// `r1` carries barcode1 (prefix of length `config.barcode1` segments'
/// total length) followed by the UMI (suffix of length `config.umi_len()`);
/// `r2` is entirely barcode2.
pub fn raw_tabulate<I1, I2>(r1: I1, r2: I2, config: &Config) -> Result<(u64, UmiTable)>
where
    I1: Iterator<Item = Result<FastqRecord>>,
    I2: Iterator<Item = Result<FastqRecord>>,
{
    let barcode1_len: usize = config.barcode1_lengths()?.iter().sum();
    let umi_len = config.umi_len();

    let mut total_reads = 0u64;
    let mut table: UmiTable = HashMap::new();

    for pair in r1.zip(r2) {
        let (rec1, rec2) = (pair.0?, pair.1?);
        total_reads += 1;

        let barcode1 = String::from_utf8_lossy(rec1.subseq(0, barcode1_len).ok_or_else(|| {
            Error::Umi(format!("normalized R1 for `{}` shorter than barcode1 length {barcode1_len}", rec1.name))
        })?)
        .to_string();
        let umi = String::from_utf8_lossy(
            rec1.subseq(barcode1_len, barcode1_len + umi_len)
                .ok_or_else(|| Error::Umi(format!("normalized R1 for `{}` shorter than barcode1+umi", rec1.name)))?,
        )
        .to_string();
        let barcode2 = String::from_utf8_lossy(&rec2.seq).to_string();

        let composite = format!("{barcode1}_{barcode2}");
        *table.entry(composite).or_default().entry(umi).or_insert(0) += 1;
    }

    Ok((total_reads, table))
}

/// Directional UMI correction for one composite barcode's UMI→count map
/// (spec §4.3, steps 1-5).
///
/// Returns the corrected map and the `child -> parent` mapping for every
/// UMI that was collapsed.
///
/// The accumulation step mirrors the reference (`count_UMI.py:112-119`)
/// exactly rather than the more "obvious" transitive collapse: a UMI can
/// simultaneously be a parent (of some lower-abundance neighbor) and a
/// child (of some higher-abundance one) when distinct Hamming-1 steps
/// chain together. The reference neither forbids nor flattens such
/// chains — it adds each child's *original* raw count into its parent's
/// accumulator slot (which may itself already have been zeroed out by an
/// earlier chain step) and only drops keys whose *final* accumulator
/// value is zero. A UMI in the middle of a chain can therefore survive
/// with a nonzero count even though it was itself marked as some other
/// UMI's child — accumulating into `parent` or removing `child` from the
/// map as each pair is visited would either panic or silently flatten the
/// chain, both of which diverge from the reference on exactly this case.
fn correct_one(counts: &HashMap<String, u64>) -> (HashMap<String, u64>, IndexMap<String, String>) {
    let mut ascending: Vec<(&String, u64)> = counts.iter().map(|(u, &c)| (u, c)).collect();
    ascending.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(b.0)));
    let descending: Vec<(&String, u64)> = ascending.iter().rev().cloned().collect();

    let packed: HashMap<&String, PackedSeq> = counts.keys().map(|u| (u, PackedSeq::pack(u))).collect();

    // Insertion order matters: it is replayed below exactly as discovered,
    // matching the reference's plain-dict iteration order.
    let mut parent: IndexMap<String, String> = IndexMap::new();

    for &(u_hi, c_hi) in &descending {
        let threshold = c_hi / 10;
        for &(u_lo, c_lo) in &ascending {
            if parent.contains_key(u_lo) {
                continue;
            }
            if c_lo > threshold {
                break;
            }
            let hi_packed = &packed[u_hi];
            let lo_packed = &packed[u_lo];
            if lo_packed.hamming_distance(hi_packed).is_some_and(|d| d <= MAX_DIST_CORRECT_UMI) {
                parent.insert(u_lo.clone(), u_hi.clone());
            }
        }
    }

    let mut corrected = counts.clone();
    for (child, parent_umi) in &parent {
        let child_raw_count = counts[child];
        *corrected.get_mut(parent_umi).expect("parent present in corrected map") += child_raw_count;
        corrected.insert(child.clone(), 0);
    }
    corrected.retain(|_, &mut count| count != 0);

    (corrected, parent)
}

/// Run UMI correction across every composite barcode, independently and
/// in parallel (spec §4.3, "Cross-barcode independence").
pub fn correct_table(raw: &UmiTable, total_reads: u64) -> (UmiTable, CorrectionLog) {
    let results: Vec<(String, HashMap<String, u64>, IndexMap<String, String>)> = raw
        .par_iter()
        .map(|(bc, counts)| {
            let (corrected, mapping) = correct_one(counts);
            (bc.clone(), corrected, mapping)
        })
        .collect();

    let mut corrected_table = UmiTable::new();
    let mut correct_umi_stat = HashMap::new();
    for (bc, corrected, mapping) in results {
        corrected_table.insert(bc.clone(), corrected);
        if !mapping.is_empty() {
            correct_umi_stat.insert(bc, mapping.into_iter().collect());
        }
    }

    (corrected_table, CorrectionLog { total_reads, correct_umi_stat })
}

#[cfg(test)]
mod tests {
    use super::*;

    // Scenario D: UMI correction.
    #[test]
    fn scenario_d_umi_correction() {
        let mut counts = HashMap::new();
        counts.insert("AAA".to_string(), 100u64);
        counts.insert("AAT".to_string(), 5u64);
        counts.insert("GGG".to_string(), 3u64);

        let (corrected, mapping) = correct_one(&counts);
        assert_eq!(corrected.get("AAA"), Some(&105));
        assert_eq!(corrected.get("GGG"), Some(&3));
        assert_eq!(corrected.get("AAT"), None);
        assert_eq!(mapping.get("AAT"), Some(&"AAA".to_string()));
    }

    #[test]
    fn monotonicity_conserves_total_reads_and_shrinks_key_count() {
        let mut counts = HashMap::new();
        counts.insert("AAAA".to_string(), 50u64);
        counts.insert("AAAT".to_string(), 2u64);
        counts.insert("CCCC".to_string(), 10u64);

        let (corrected, _mapping) = correct_one(&counts);
        let raw_total: u64 = counts.values().sum();
        let corrected_total: u64 = corrected.values().sum();
        assert_eq!(raw_total, corrected_total);
        assert!(corrected.len() <= counts.len());
    }

    #[test]
    fn no_parent_for_umi_below_threshold_but_too_far() {
        let mut counts = HashMap::new();
        counts.insert("AAAA".to_string(), 100u64);
        counts.insert("TTTT".to_string(), 5u64);

        let (corrected, mapping) = correct_one(&counts);
        assert_eq!(corrected.get("AAAA"), Some(&100));
        assert_eq!(corrected.get("TTTT"), Some(&5));
        assert!(mapping.is_empty());
    }

    /// A Hamming-1 abundance chain: AAAT is a child of AAAA, and AATT is
    /// in turn a child of AAAT (AATT is Hamming-2 from AAAA, so it is not
    /// AAAA's direct child). The reference adds AATT's original count
    /// into AAAT's accumulator slot before AAAT is itself zeroed out for
    /// being AAAA's child, so AAAT survives the "drop if zero" pass with
    /// a nonzero count instead of vanishing or panicking.
    #[test]
    fn hamming_chain_does_not_panic_and_matches_reference_accumulation() {
        let mut counts = HashMap::new();
        counts.insert("AAAA".to_string(), 1000u64);
        counts.insert("AAAT".to_string(), 50u64);
        counts.insert("AATT".to_string(), 2u64);

        let (corrected, mapping) = correct_one(&counts);

        assert_eq!(corrected.get("AAAA"), Some(&1050));
        assert_eq!(corrected.get("AAAT"), Some(&2));
        assert_eq!(corrected.get("AATT"), None);

        assert_eq!(mapping.get("AAAT"), Some(&"AAAA".to_string()));
        assert_eq!(mapping.get("AATT"), Some(&"AAAT".to_string()));

        let raw_total: u64 = counts.values().sum();
        let corrected_total: u64 = corrected.values().sum();
        assert_eq!(raw_total, corrected_total);
    }
}
