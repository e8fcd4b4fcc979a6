//! # fbcount-core
//!
//! Core algorithms for a feature-barcode / UMI quantification pipeline:
//! probabilistic barcode correction, UMI error correction and counting,
//! and sequencing-saturation estimation by downsampling, plus the read
//! rewriter and feature aggregator that glue them into a pipeline.

pub mod barcode;
pub mod config;
pub mod error;
pub mod feature;
pub mod io;
pub mod rewrite;
pub mod saturation;
pub mod seq;
pub mod umi;

pub use config::Config;
pub use error::{Error, Result};
pub use seq::PackedSeq;
