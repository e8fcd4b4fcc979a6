pub mod aggregate_features;
pub mod correct_barcodes;
pub mod count_umi;
pub mod estimate_saturation;
pub mod rewrite_reads;
