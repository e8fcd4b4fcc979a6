//! File I/O: FASTQ, FASTA, whitelists, and between-stage binary tables.

pub mod binary;
pub mod fasta;
pub mod fastq;
pub mod feature_info;
pub mod whitelist;

pub use fasta::parse_feature_fasta;
pub use fastq::{canonicalize_name, FastqReader, FastqRecord, FastqWriter};
pub use feature_info::parse_feature_info;
pub use whitelist::{Prior, Whitelist};
