//! S3b: saturation estimation by downsampling (spec §4.4).

use std::collections::HashMap;
use std::io::Write;
use std::path::Path;

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::umi::table::UmiTable;
use crate::Result;

/// Base RNG seed (spec §4.4: "seeded with a fixed constant (42)").
pub const BASE_SEED: u64 = 42;

/// One row of the 38-row downsample grid.
#[derive(Debug, Clone, Copy)]
pub struct GridRow {
    pub ratio: f64,
    pub saturation: f64,
    pub umi_types: u64,
    pub umi_reads: u64,
    pub duplication: f64,
}

/// The fixed ratio grid, excluding the row-0 sentinel and the final
/// full-pool (ratio=1.0) row: `{10^-4*k, 10^-3*k, 10^-2*k, 10^-1*k : k in
/// 1..=9}`, 36 values in the stated order (spec §3).
pub fn ratio_grid() -> Vec<f64> {
    let mut ratios = Vec::with_capacity(36);
    for exp in [0.0001, 0.001, 0.01, 0.1] {
        for k in 1..=9 {
            ratios.push((exp * k as f64 * 10_000.0).round() / 10_000.0);
        }
    }
    ratios
}

/// Flatten a UMI table into `(barcode, umi)` pairs with their read counts,
/// the representation used to draw from the read-multiset pool without
/// materializing every individual read.
fn flatten(table: &UmiTable) -> (Vec<(String, String)>, Vec<u64>) {
    let mut pairs = Vec::new();
    let mut counts = Vec::new();
    for (bc, umis) in table {
        for (umi, &count) in umis {
            if count == 0 {
                continue;
            }
            pairs.push((bc.clone(), umi.clone()));
            counts.push(count);
        }
    }
    (pairs, counts)
}

/// Draw `sample_size` elements uniformly without replacement from the
/// read-multiset pool implied by `table`, and rebuild the `(barcode,
/// umi) -> count` mapping from the drawn elements (spec §4.4,
/// "Downsample step").
pub fn downsample(table: &UmiTable, sample_size: usize, seed: u64) -> UmiTable {
    let (pairs, counts) = flatten(table);
    let pool_len: usize = counts.iter().map(|&c| c as usize).sum();
    let sample_size = sample_size.min(pool_len);

    let mut cumulative = Vec::with_capacity(counts.len());
    let mut acc = 0usize;
    for &c in &counts {
        acc += c as usize;
        cumulative.push(acc);
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let drawn = rand::seq::index::sample(&mut rng, pool_len, sample_size);

    let mut result: UmiTable = HashMap::new();
    for position in drawn.iter() {
        let pair_idx = cumulative.partition_point(|&end| end <= position);
        let (bc, umi) = &pairs[pair_idx];
        *result.entry(bc.clone()).or_default().entry(umi.clone()).or_insert(0) += 1;
    }
    result
}

/// Per-step statistics over any `(barcode -> umi -> count)` table (spec
/// §4.4, "Per-step statistics").
///
/// `single` is defined literally as the count of UMIs seen exactly once
/// (spec §4.4 and Design Notes ambiguity note 1), not the lowest
/// observed multiplicity class.
pub fn compute_statistics(table: &UmiTable, ratio: f64) -> GridRow {
    let mut bins: HashMap<u64, u64> = HashMap::new();
    for umis in table.values() {
        for &count in umis.values() {
            *bins.entry(count).or_insert(0) += 1;
        }
    }

    let single = bins.get(&1).copied().unwrap_or(0);
    let n_umi_types: u64 = bins.values().sum();
    let n_umi_reads: u64 = bins.iter().map(|(&k, &freq)| k * freq).sum();
    let duplicates: u64 = bins.iter().map(|(&k, &freq)| (k.saturating_sub(1)) * freq).sum();

    let saturation = if n_umi_types > 0 {
        round2(100.0 * (1.0 - single as f64 / n_umi_types as f64))
    } else {
        0.0
    };
    let duplication = if n_umi_reads > 0 {
        round2(100.0 * duplicates as f64 / n_umi_reads as f64)
    } else {
        0.0
    };

    GridRow { ratio, saturation, umi_types: n_umi_types, umi_reads: n_umi_reads, duplication }
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// Compute the full 38-row grid: a row-0 sentinel, the 36-ratio grid, and
/// the full pool (ratio=1.0), alongside the downsampled table each row's
/// statistics were computed from (an empty table for the sentinel, the
/// `corrected` table itself at ratio=1.0). Each ratio row's RNG is seeded
/// deterministically from the global seed and the row's position in the
/// grid (`seed = 42 ^ index`), so results are reproducible whether the
/// grid is computed sequentially or in parallel (spec §5).
pub fn compute_grid(corrected: &UmiTable) -> Vec<(GridRow, UmiTable)> {
    let pool_len: u64 = corrected.values().flat_map(|umis| umis.values()).sum();

    let mut rows = Vec::with_capacity(38);
    rows.push((GridRow { ratio: 0.0, saturation: 0.0, umi_types: 0, umi_reads: 0, duplication: 0.0 }, UmiTable::new()));

    for (index, &ratio) in ratio_grid().iter().enumerate() {
        let sample_size = (ratio * pool_len as f64).floor() as usize;
        let seed = BASE_SEED ^ (index + 1) as u64;
        let sampled = downsample(corrected, sample_size, seed);
        let row = compute_statistics(&sampled, ratio);
        rows.push((row, sampled));
    }

    rows.push((compute_statistics(corrected, 1.0), corrected.clone()));
    rows
}

/// Select the row with maximum Sequencing Saturation, first on ties
/// (spec §4.4, Design Notes ambiguity note 2).
pub fn select_optimal(rows: &[(GridRow, UmiTable)]) -> &(GridRow, UmiTable) {
    let mut best = &rows[0];
    for row in &rows[1..] {
        if row.0.saturation > best.0.saturation {
            best = row;
        }
    }
    best
}

/// Write the 38-row grid as a TSV with the columns from spec §6.
pub fn write_grid_tsv<P: AsRef<Path>>(path: P, rows: &[GridRow]) -> Result<()> {
    let file = std::fs::File::create(path.as_ref())?;
    let mut writer = std::io::BufWriter::new(file);
    writeln!(writer, "Downsample Ratio\tSequencing Saturation\tUMI Types\tUMI Counts\tDuplication Ratio")?;
    for row in rows {
        writeln!(
            writer,
            "{}\t{}\t{}\t{}\t{}",
            row.ratio, row.saturation, row.umi_types, row.umi_reads, row.duplication
        )?;
    }
    Ok(())
}

/// Project just the statistics rows out of `compute_grid`'s paired output,
/// for callers that only need the TSV and not the downsampled tables
/// (e.g. [`write_grid_tsv`]).
pub fn rows_only(rows: &[(GridRow, UmiTable)]) -> Vec<GridRow> {
    rows.iter().map(|(row, _)| *row).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn umi_table_of(bc: &str, entries: &[(&str, u64)]) -> UmiTable {
        let mut table = UmiTable::new();
        let inner = table.entry(bc.to_string()).or_default();
        for &(umi, count) in entries {
            inner.insert(umi.to_string(), count);
        }
        table
    }

    #[test]
    fn ratio_grid_has_36_values_in_stated_order() {
        let grid = ratio_grid();
        assert_eq!(grid.len(), 36);
        assert_eq!(grid[0], 0.0001);
        assert_eq!(grid[8], 0.0009);
        assert_eq!(grid[9], 0.001);
        assert_eq!(grid[35], 0.9);
    }

    #[test]
    fn grid_cardinality_is_38() {
        let table = umi_table_of("AAAA_TTTT", &[("GGGG", 10), ("CCCC", 1)]);
        let rows = compute_grid(&table);
        assert_eq!(rows.len(), 38);
        assert_eq!(rows[0].0.ratio, 0.0);
        assert!(rows[0].1.is_empty());
    }

    // Scenario E: saturation at ratio=1.0.
    #[test]
    fn scenario_e_full_pool_statistics() {
        let table = umi_table_of("AAAA_TTTT", &[("U1", 10), ("U2", 1)]);
        let row = compute_statistics(&table, 1.0);
        assert_eq!(row.umi_types, 2);
        assert_eq!(row.umi_reads, 11);
        assert_eq!(row.duplication, 81.82);
        assert_eq!(row.saturation, 50.0);
    }

    #[test]
    fn optimal_selection_breaks_ties_on_first_max() {
        let rows = vec![
            (GridRow { ratio: 0.0, saturation: 10.0, umi_types: 1, umi_reads: 1, duplication: 0.0 }, UmiTable::new()),
            (GridRow { ratio: 0.1, saturation: 20.0, umi_types: 2, umi_reads: 2, duplication: 0.0 }, UmiTable::new()),
            (GridRow { ratio: 0.5, saturation: 20.0, umi_types: 3, umi_reads: 3, duplication: 0.0 }, UmiTable::new()),
        ];
        let best = select_optimal(&rows);
        assert_eq!(best.0.ratio, 0.1);
    }

    #[test]
    fn downsample_at_ratio_one_draws_entire_pool() {
        let table = umi_table_of("AAAA_TTTT", &[("U1", 10), ("U2", 1)]);
        let sampled = downsample(&table, 11, 42);
        let total: u64 = sampled.values().flat_map(|m| m.values()).sum();
        assert_eq!(total, 11);
    }

    #[test]
    fn determinism_same_seed_same_result() {
        let table = umi_table_of("AAAA_TTTT", &[("U1", 100), ("U2", 20), ("U3", 5)]);
        let a = downsample(&table, 30, 7);
        let b = downsample(&table, 30, 7);
        assert_eq!(a, b);
    }
}
