//! Per-segment correction statistics (spec §4.1, "Logging output").

use serde::{Deserialize, Serialize};

/// Breakdown of decisions made when the linker matched (the read's name
/// was found in the pre-clipped candidate file).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LinkerRight {
    pub uncorrected: u64,
    pub corrected: u64,
    pub failed: u64,
}

/// Breakdown of decisions made when the linker missed and the segment was
/// re-extracted by position, keyed by shift offset (0, 1, or 2).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LinkerWrong {
    pub shift_uncorrected: [u64; 3],
    pub shift_corrected: [u64; 3],
    pub failed: u64,
}

/// The full report for one barcode segment's S1 run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SegmentReport {
    pub total_reads: u64,
    pub linker_right: LinkerRight,
    pub linker_wrong: LinkerWrong,
}

impl SegmentReport {
    pub fn failed_total(&self) -> u64 {
        self.linker_right.failed + self.linker_wrong.failed
    }

    /// `100 * (1 - failed / total)`.
    pub fn barcode_valid_percent(&self) -> f64 {
        if self.total_reads == 0 {
            return 0.0;
        }
        100.0 * (1.0 - self.failed_total() as f64 / self.total_reads as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_percent_with_no_failures() {
        let mut report = SegmentReport { total_reads: 10, ..Default::default() };
        report.linker_right.uncorrected = 10;
        assert_eq!(report.barcode_valid_percent(), 100.0);
    }

    #[test]
    fn valid_percent_with_zero_reads() {
        let report = SegmentReport::default();
        assert_eq!(report.barcode_valid_percent(), 0.0);
    }
}
