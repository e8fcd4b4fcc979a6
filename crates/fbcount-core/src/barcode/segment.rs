//! Per-read barcode decisions and quality tiers (spec §3).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// How a corrected barcode was obtained (spec §3, §4.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Tier {
    /// Linker matched, already a whitelist member, high quality — or
    /// shift=0 re-extraction whitelist hit.
    A,
    /// Linker matched, corrected from a Hamming-1 neighbor.
    B,
    /// Linker missed, re-extracted at shift >= 1, whitelist member unchanged.
    C,
    /// Linker missed, re-extracted at shift >= 1, corrected.
    D,
    /// Uncorrectable.
    E,
}

impl Tier {
    /// The quality character used to synthesize S2's normalized output
    /// (spec §4.2). Tier E never reaches S2 because reads with any
    /// uncorrectable segment are dropped.
    pub fn synthetic_quality_char(self) -> u8 {
        match self {
            Tier::A => b'G',
            Tier::B => b'F',
            Tier::C => b'9',
            Tier::D => b'8',
            Tier::E => unreachable!("tier E reads are dropped before quality synthesis"),
        }
    }
}

/// The per-read decision for one barcode segment: the corrected sequence
/// (empty if uncorrectable) and the tier that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    pub sequence: String,
    pub tier: Tier,
}

impl Decision {
    pub fn uncorrectable() -> Self {
        Self { sequence: String::new(), tier: Tier::E }
    }

    pub fn is_correctable(&self) -> bool {
        !self.sequence.is_empty()
    }
}

/// `read name -> decision`, one such map per configured barcode segment.
pub type DecisionMap = HashMap<String, Decision>;
