//! S3a: UMI tabulation and directional error correction (spec §4.3).

pub mod correct;
pub mod table;

pub use correct::{correct_table, raw_tabulate, CorrectionLog};
pub use table::{bc_umi_type_counts, write_umi_type_tsv, UmiTable};
