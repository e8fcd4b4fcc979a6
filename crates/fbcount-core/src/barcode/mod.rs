//! S1: probabilistic barcode correction (spec §3, §4.1).

pub mod corrector;
pub mod pipeline;
pub mod report;
pub mod segment;

pub use corrector::{correct, Outcome, CONFIDENCE_THRESHOLD, MAX_DISTANCE};
pub use pipeline::{correct_segment, load_preclipped_map, prepare_segment_inputs, SegmentCoords, SHIFT_CORRECTION};
pub use report::{LinkerRight, LinkerWrong, SegmentReport};
pub use segment::{Decision, DecisionMap, Tier};
