use std::collections::BTreeMap;

use serde::Serialize;

use crate::table::{
    AGE, ASSISTS, GOALS, MARKET_VALUE, MINUTES, PLAYER, POS, PlayerTable, SortKey, XAG, XG,
    XG_XAG,
};

pub const TOP_N: usize = 5;
pub const HISTOGRAM_BINS: usize = 10;

const ZERO_FILLED: [&str; 7] = [GOALS, ASSISTS, XG, XAG, MINUTES, MARKET_VALUE, AGE];
const POSITION_AVERAGE_COLUMNS: [&str; 3] = [GOALS, XG_XAG, MARKET_VALUE];

#[derive(Debug, Clone, Serialize)]
pub struct Leaderboard {
    pub metric: &'static str,
    pub rows: PlayerTable,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionAverage {
    pub position: String,
    pub values: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionAverages {
    pub metrics: Vec<&'static str>,
    pub rows: Vec<PositionAverage>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Histogram {
    pub column: &'static str,
    pub bins: Vec<Bin>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub players: usize,
    pub leaderboards: Vec<Leaderboard>,
    pub position_averages: Option<PositionAverages>,
    pub histograms: Vec<Histogram>,
}

/// League overview. Works on a private copy in which the headline columns
/// have unknown values set to 0 and `xG+xAG` is recomputed from its parts.
pub fn dashboard(table: &PlayerTable) -> Dashboard {
    let mut work = table.clone();
    for column in ZERO_FILLED {
        work.fill_missing(column, 0.0);
    }
    if work.has_column(XG) && work.has_column(XAG) {
        let sums: Vec<f64> = work
            .iter()
            .map(|row| row.number_or_zero(XG) + row.number_or_zero(XAG))
            .collect();
        work.set_number_column(XG_XAG, &sums);
    }

    let boards: [(&'static str, &[&str]); 3] = [
        (GOALS, &[PLAYER, GOALS, MINUTES, MARKET_VALUE]),
        (ASSISTS, &[PLAYER, ASSISTS, MINUTES, MARKET_VALUE]),
        (XG_XAG, &[PLAYER, XG, XAG, XG_XAG, MARKET_VALUE]),
    ];
    let leaderboards = boards
        .iter()
        .filter(|(metric, _)| work.has_column(metric))
        .map(|&(metric, columns)| Leaderboard {
            metric,
            rows: top_by(&work, metric, TOP_N).project(columns),
        })
        .collect();

    let position_averages = (work.has_column(POS) && work.has_column(XG_XAG))
        .then(|| position_averages(&work));

    let histograms = [AGE, MARKET_VALUE]
        .into_iter()
        .filter(|column| work.has_column(column))
        .map(|column| Histogram {
            column,
            bins: histogram(
                &work.iter().map(|row| row.number_or_zero(column)).collect::<Vec<_>>(),
                HISTOGRAM_BINS,
            ),
        })
        .collect();

    Dashboard {
        players: table.len(),
        leaderboards,
        position_averages,
        histograms,
    }
}

/// First `n` rows by `metric`, descending, ties in table order.
pub fn top_by(table: &PlayerTable, metric: &str, n: usize) -> PlayerTable {
    let mut indices: Vec<usize> = (0..table.len()).collect();
    table.sort_indices(&mut indices, &[SortKey::descending(metric)]);
    indices.truncate(n);
    table.subset(&indices)
}

fn position_averages(table: &PlayerTable) -> PositionAverages {
    let metrics = table.schema().present(&POSITION_AVERAGE_COLUMNS);
    let mut groups: BTreeMap<String, (Vec<f64>, usize)> = BTreeMap::new();
    for row in table.iter() {
        let position = row.position();
        if position.is_empty() {
            continue;
        }
        let entry = groups
            .entry(position.into_owned())
            .or_insert_with(|| (vec![0.0; metrics.len()], 0));
        for (sum, metric) in entry.0.iter_mut().zip(&metrics) {
            *sum += row.number_or_zero(metric);
        }
        entry.1 += 1;
    }

    let rows = groups
        .into_iter()
        .map(|(position, (sums, n))| PositionAverage {
            position,
            values: sums.into_iter().map(|s| round2(s / n as f64)).collect(),
        })
        .collect();
    PositionAverages { metrics, rows }
}

/// Equal-width bins between the observed min and max; the last bin is closed.
pub fn histogram(values: &[f64], bins: usize) -> Vec<Bin> {
    if values.is_empty() || bins == 0 {
        return Vec::new();
    }
    let lo = values.iter().copied().fold(f64::INFINITY, f64::min);
    let hi = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if hi <= lo {
        return vec![Bin {
            lower: lo,
            upper: hi,
            count: values.len(),
        }];
    }

    let width = (hi - lo) / bins as f64;
    let mut out: Vec<Bin> = (0..bins)
        .map(|i| Bin {
            lower: lo + width * i as f64,
            upper: if i + 1 == bins { hi } else { lo + width * (i + 1) as f64 },
            count: 0,
        })
        .collect();
    for v in values {
        let slot = (((v - lo) / width).floor() as usize).min(bins - 1);
        out[slot].count += 1;
    }
    out
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn histogram_counts_every_value_once() {
        let values = [0.0, 1.0, 2.5, 5.0, 9.99, 10.0];
        let bins = histogram(&values, 10);
        assert_eq!(bins.len(), 10);
        assert_eq!(bins.iter().map(|b| b.count).sum::<usize>(), values.len());
        assert_eq!(bins[0].count, 1);
        assert_eq!(bins[9].count, 2);
        assert_eq!(bins[9].upper, 10.0);
    }

    #[test]
    fn histogram_single_value_collapses_to_one_bin() {
        let bins = histogram(&[3.0, 3.0], 10);
        assert_eq!(
            bins,
            vec![Bin {
                lower: 3.0,
                upper: 3.0,
                count: 2
            }]
        );
        assert!(histogram(&[], 10).is_empty());
    }

    #[test]
    fn round2_rounds_half_away() {
        assert_eq!(round2(1.005_1), 1.01);
        assert_eq!(round2(2.0 / 3.0), 0.67);
    }
}
