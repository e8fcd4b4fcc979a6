//! Pipeline configuration: the JSON schema described in spec §6.

use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Which raw read a segment is extracted from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadSlot {
    R1,
    R2,
}

/// Half-open coordinates `[start, end)` plus the whitelist path for one
/// barcode segment, as they appear in the `barcode` config map:
/// `[read, start, end, _, _, whitelist_path]`.
#[derive(Debug, Clone)]
pub struct BarcodeSegmentDef {
    pub name: String,
    pub read: ReadSlot,
    pub start: usize,
    pub end: usize,
    pub whitelist_path: PathBuf,
}

impl BarcodeSegmentDef {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.end == self.start
    }
}

/// Coordinates for one UMI segment: `[read, start, end]`.
#[derive(Debug, Clone)]
pub struct UmiSegmentDef {
    pub name: String,
    pub read: ReadSlot,
    pub start: usize,
    pub end: usize,
}

impl UmiSegmentDef {
    pub fn len(&self) -> usize {
        self.end - self.start
    }
}

/// Raw JSON shape of the configuration file, deserialized verbatim and
/// then validated/reshaped into [`Config`].
#[derive(Debug, Deserialize)]
struct RawConfig {
    barcode: HashMap<String, RawBarcodeEntry>,
    barcode_struct: RawBarcodeStruct,
    umi: indexmap::IndexMap<String, (String, usize, usize)>,
    feature_barcode: PathBuf,
    feature_barcode_info: PathBuf,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawBarcodeEntry {
    /// `[read, start, end, _, _, whitelist]`
    Full(String, usize, usize, serde_json::Value, serde_json::Value, PathBuf),
}

#[derive(Debug, Deserialize)]
struct RawBarcodeStruct {
    barcode1: Vec<String>,
    barcode2: Vec<String>,
}

fn parse_read_slot(raw: &str) -> Result<ReadSlot> {
    match raw {
        "r1" => Ok(ReadSlot::R1),
        "r2" => Ok(ReadSlot::R2),
        other => Err(Error::Config(format!("unknown read slot `{other}`, expected `r1` or `r2`"))),
    }
}

/// Fully validated pipeline configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// All declared barcode segments, keyed by name.
    pub barcode_segments: HashMap<String, BarcodeSegmentDef>,
    /// Ordered segment names composing barcode1 (cell/sample identifier).
    pub barcode1: Vec<String>,
    /// Ordered segment names composing barcode2 (feature identifier).
    pub barcode2: Vec<String>,
    /// Ordered UMI segments.
    pub umi: Vec<UmiSegmentDef>,
    /// Path to the feature-barcode FASTA.
    pub feature_barcode: PathBuf,
    /// Path to the tab-separated feature-barcode info file.
    pub feature_barcode_info: PathBuf,
}

impl Config {
    /// Load and validate a configuration from a JSON file.
    pub fn from_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&text)
    }

    /// Parse and validate a configuration from a JSON string.
    pub fn from_json(text: &str) -> Result<Self> {
        let raw: RawConfig =
            serde_json::from_str(text).map_err(|e| Error::Config(format!("malformed config JSON: {e}")))?;

        let mut barcode_segments = HashMap::with_capacity(raw.barcode.len());
        for (name, entry) in raw.barcode {
            let RawBarcodeEntry::Full(read, start, end, _, _, whitelist_path) = entry;
            if end <= start {
                return Err(Error::Config(format!(
                    "barcode segment `{name}` has end <= start ({end} <= {start})"
                )));
            }
            barcode_segments.insert(
                name.clone(),
                BarcodeSegmentDef {
                    name,
                    read: parse_read_slot(&read)?,
                    start,
                    end,
                    whitelist_path,
                },
            );
        }

        for name in raw.barcode_struct.barcode1.iter().chain(raw.barcode_struct.barcode2.iter()) {
            if !barcode_segments.contains_key(name) {
                return Err(Error::Config(format!(
                    "barcode_struct references unknown segment `{name}`"
                )));
            }
        }

        let mut umi = Vec::with_capacity(raw.umi.len());
        for (name, (read, start, end)) in raw.umi {
            if end <= start {
                return Err(Error::Config(format!("umi segment `{name}` has end <= start ({end} <= {start})")));
            }
            umi.push(UmiSegmentDef {
                name,
                read: parse_read_slot(&read)?,
                start,
                end,
            });
        }

        Ok(Config {
            barcode_segments,
            barcode1: raw.barcode_struct.barcode1,
            barcode2: raw.barcode_struct.barcode2,
            umi,
            feature_barcode: raw.feature_barcode,
            feature_barcode_info: raw.feature_barcode_info,
        })
    }

    /// Lengths of every barcode1 segment, in declared order.
    pub fn barcode1_lengths(&self) -> Result<Vec<usize>> {
        self.barcode1
            .iter()
            .map(|name| {
                self.barcode_segments
                    .get(name)
                    .map(|s| s.len())
                    .ok_or_else(|| Error::Config(format!("unknown barcode1 segment `{name}`")))
            })
            .collect()
    }

    /// Cumulative end offsets of barcode1 segments within the concatenated
    /// barcode1 string, used to re-render `barcode1_a+barcode1_b+...`.
    pub fn barcode1_boundaries(&self) -> Result<Vec<usize>> {
        let mut acc = 0usize;
        let mut boundaries = Vec::with_capacity(self.barcode1.len());
        for len in self.barcode1_lengths()? {
            acc += len;
            boundaries.push(acc);
        }
        Ok(boundaries)
    }

    /// Total length in bases of the concatenated UMI.
    pub fn umi_len(&self) -> usize {
        self.umi.iter().map(UmiSegmentDef::len).sum()
    }

    /// Look up a barcode segment definition by name.
    pub fn segment(&self, name: &str) -> Result<&BarcodeSegmentDef> {
        self.barcode_segments
            .get(name)
            .ok_or_else(|| Error::Config(format!("unknown barcode segment `{name}`")))
    }
}
