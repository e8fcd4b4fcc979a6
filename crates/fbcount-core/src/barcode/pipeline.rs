//! S1: the barcode corrector stage, combining the correction procedure
//! with the pre-clipped/shift-fallback read sourcing described in spec
//! §4.1.

use std::collections::HashMap;

use crate::barcode::corrector::{correct, Outcome};
use crate::barcode::report::SegmentReport;
use crate::barcode::segment::{Decision, DecisionMap, Tier};
use crate::io::fastq::FastqRecord;
use crate::io::whitelist::{Prior, Whitelist};
use crate::Result;

/// Number of additional shift attempts beyond the configured (shift=0)
/// coordinates, per spec §4.1.
pub const SHIFT_CORRECTION: usize = 2;

/// Static per-segment parameters for S1.
pub struct SegmentCoords {
    pub start: usize,
    pub end: usize,
}

/// Run the barcode corrector for one segment over a raw read stream,
/// consulting a pre-clipped candidate map built from the segment's
/// pre-clipped FASTQ.
///
/// `preclipped` supplies `name -> (seq, qual)` for reads whose upstream
/// linker matched; `raw_reads` is the full raw stream for the segment's
/// configured read (R1 or R2), already name-canonicalized.
pub fn correct_segment<I>(raw_reads: I, preclipped: &HashMap<String, (String, Vec<u8>)>, whitelist: &Whitelist, prior: &Prior, coords: &SegmentCoords) -> Result<(DecisionMap, SegmentReport)>
where
    I: Iterator<Item = Result<FastqRecord>>,
{
    let mut decisions = DecisionMap::new();
    let mut report = SegmentReport::default();

    for record in raw_reads {
        let record = record?;
        report.total_reads += 1;
        if report.total_reads % 500_000 == 0 {
            log::info!("barcode correction: processed {} reads", report.total_reads);
        }

        if let Some((seq, qual)) = preclipped.get(&record.name) {
            match correct(seq, qual, whitelist, prior) {
                Outcome::Failed => {
                    report.linker_right.failed += 1;
                    decisions.insert(record.name, Decision::uncorrectable());
                }
                Outcome::Uncorrected(s) => {
                    report.linker_right.uncorrected += 1;
                    decisions.insert(record.name, Decision { sequence: s, tier: Tier::A });
                }
                Outcome::Corrected(s) => {
                    report.linker_right.corrected += 1;
                    decisions.insert(record.name, Decision { sequence: s, tier: Tier::B });
                }
            }
            continue;
        }

        let mut resolved = false;
        for shift in 0..=SHIFT_CORRECTION {
            let Some(s) = coords.start.checked_sub(shift) else { break };
            let e = coords.end - shift;

            let seq = match record.subseq(s, e) {
                Some(bytes) => String::from_utf8_lossy(bytes).to_string(),
                None => String::new(),
            };
            let qual = record.subqual(s, e).unwrap_or(&[]);

            match correct(&seq, qual, whitelist, prior) {
                Outcome::Failed => continue,
                Outcome::Uncorrected(out_seq) => {
                    report.linker_wrong.shift_uncorrected[shift] += 1;
                    let tier = if shift == 0 { Tier::A } else { Tier::C };
                    decisions.insert(record.name.clone(), Decision { sequence: out_seq, tier });
                    resolved = true;
                    break;
                }
                Outcome::Corrected(out_seq) => {
                    report.linker_wrong.shift_corrected[shift] += 1;
                    let tier = if shift == 0 { Tier::B } else { Tier::D };
                    decisions.insert(record.name.clone(), Decision { sequence: out_seq, tier });
                    resolved = true;
                    break;
                }
            }

            if s == 0 {
                break;
            }
        }

        if !resolved {
            report.linker_wrong.failed += 1;
            decisions.insert(record.name, Decision::uncorrectable());
        }
    }

    log::info!(
        "barcode correction: {} reads, {:.2}% valid",
        report.total_reads,
        report.barcode_valid_percent()
    );

    Ok((decisions, report))
}

/// Build the `name -> (seq, qual)` map from a segment's pre-clipped FASTQ.
pub fn load_preclipped_map<I: Iterator<Item = Result<FastqRecord>>>(records: I) -> Result<HashMap<String, (String, Vec<u8>)>> {
    let mut map = HashMap::new();
    for record in records {
        let record = record?;
        map.insert(record.name, (String::from_utf8_lossy(&record.seq).to_string(), record.qual));
    }
    Ok(map)
}

/// Read a segment's pre-clipped FASTQ once and derive both the empirical
/// prior (spec §4.1, "Prior estimation") and the pre-clipped candidate
/// map (spec §4.1, "Per-read decision for candidates found in pre-clipped
/// set"), avoiding a second pass over the file.
pub fn prepare_segment_inputs<I: Iterator<Item = Result<FastqRecord>>>(
    records: I,
    whitelist: &Whitelist,
) -> Result<(HashMap<String, (String, Vec<u8>)>, Prior)> {
    let mut map = HashMap::new();
    let mut counts = vec![0u64; whitelist.len()];

    for record in records {
        let record = record?;
        let seq = String::from_utf8_lossy(&record.seq).to_string();
        if let Some(idx) = whitelist.index_of(&seq) {
            counts[idx] += 1;
        }
        map.insert(record.name, (seq, record.qual));
    }

    Ok((map, Prior::from_counts(&counts)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::fastq::FastqRecord;

    fn wl() -> Whitelist {
        Whitelist::from_sequences(["AAAA", "CCCC"]).unwrap()
    }

    // Scenario F: S2 drop rule groundwork — segment 1 fails for read `r17`.
    #[test]
    fn uncorrectable_raw_read_becomes_tier_e() {
        let whitelist = wl();
        let prior = Prior::from_counts(&[1, 1]);
        let preclipped = HashMap::new();

        let raw = vec![Ok(FastqRecord::new("r17".to_string(), b"GGGGGGGG".to_vec(), b"IIIIIIII".to_vec()))];
        let coords = SegmentCoords { start: 0, end: 4 };

        let (decisions, report) = correct_segment(raw.into_iter(), &preclipped, &whitelist, &prior, &coords).unwrap();
        assert_eq!(decisions["r17"].tier, Tier::E);
        assert_eq!(decisions["r17"].sequence, "");
        assert_eq!(report.linker_wrong.failed, 1);
    }

    #[test]
    fn preclipped_hit_produces_tier_a_or_b() {
        let whitelist = wl();
        let prior = Prior::from_counts(&[1, 1]);
        let mut preclipped = HashMap::new();
        preclipped.insert("r1".to_string(), ("AAAA".to_string(), b"IIII".to_vec()));

        let raw = vec![Ok(FastqRecord::new("r1".to_string(), b"XXXXAAAAYYYY".to_vec(), b"IIIIIIIIIIII".to_vec()))];
        let coords = SegmentCoords { start: 4, end: 8 };

        let (decisions, _report) = correct_segment(raw.into_iter(), &preclipped, &whitelist, &prior, &coords).unwrap();
        assert_eq!(decisions["r1"].tier, Tier::A);
        assert_eq!(decisions["r1"].sequence, "AAAA");
    }

    #[test]
    fn shift_fallback_finds_barcode_at_nonzero_shift() {
        let whitelist = wl();
        let prior = Prior::from_counts(&[1, 1]);
        let preclipped = HashMap::new();

        // Configured coords [5, 9) miss the barcode by one base; shift=1
        // (coords [4, 8)) should find it.
        let raw = vec![Ok(FastqRecord::new("r2".to_string(), b"XXXXAAAAYY".to_vec(), b"IIIIIIIIII".to_vec()))];
        let coords = SegmentCoords { start: 5, end: 9 };

        let (decisions, report) = correct_segment(raw.into_iter(), &preclipped, &whitelist, &prior, &coords).unwrap();
        assert_eq!(decisions["r2"].sequence, "AAAA");
        assert_eq!(decisions["r2"].tier, Tier::C);
        assert_eq!(report.linker_wrong.shift_uncorrected[1], 1);
    }
}
