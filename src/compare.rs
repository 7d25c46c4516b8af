use std::collections::HashSet;

use serde::Serialize;

use crate::notice::Notice;
use crate::table::{
    ASSISTS, GOALS, GOALS_ASSISTS, GOALS_ASSISTS_NON_PENALTY, MARKET_VALUE, MINUTES, NINETIES,
    NON_PENALTY_GOALS, NPXG, NPXG_XAG, PENALTY_ATTEMPTS, PENALTY_GOALS, PROG_CARRIES,
    PROG_PASSES, PROG_RECEPTIONS, PlayerTable, RED_CARDS, STARTS, XAG, XG, XG_XAG, YELLOW_CARDS,
};

/// Columns shown in the raw comparison table, when present.
pub const COMPARISON_COLUMNS: [&str; 21] = [
    STARTS,
    MINUTES,
    NINETIES,
    GOALS,
    ASSISTS,
    GOALS_ASSISTS,
    NON_PENALTY_GOALS,
    PENALTY_GOALS,
    PENALTY_ATTEMPTS,
    YELLOW_CARDS,
    RED_CARDS,
    XG,
    NPXG,
    XAG,
    NPXG_XAG,
    PROG_CARRIES,
    PROG_PASSES,
    PROG_RECEPTIONS,
    GOALS_ASSISTS_NON_PENALTY,
    XG_XAG,
    MARKET_VALUE,
];

pub const MIN_RADAR_METRICS: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricRow {
    pub player: String,
    pub values: Vec<f64>,
}

/// Wide layout: one row per player, one value per metric.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MetricTable {
    pub metrics: Vec<String>,
    pub rows: Vec<MetricRow>,
}

impl MetricTable {
    pub fn value(&self, player: &str, metric: &str) -> Option<f64> {
        let col = self.metrics.iter().position(|m| m == metric)?;
        self.rows
            .iter()
            .find(|row| row.player == player)
            .and_then(|row| row.values.get(col).copied())
    }

    /// Long layout, metric-major: every player for the first metric, then the
    /// next metric.
    pub fn melt(&self) -> Vec<LongRow> {
        let mut out = Vec::with_capacity(self.metrics.len() * self.rows.len());
        for (col, metric) in self.metrics.iter().enumerate() {
            for row in &self.rows {
                out.push(LongRow {
                    player: row.player.clone(),
                    metric: metric.clone(),
                    value: row.values[col],
                });
            }
        }
        out
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LongRow {
    pub player: String,
    pub metric: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScatterPoint {
    pub player: String,
    pub xg: f64,
    pub goals: f64,
    pub minutes: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Comparison {
    pub selected: usize,
    /// Every comparison column for the selected players.
    pub raw: MetricTable,
    /// Chosen metrics scaled to 0..=100; `None` below three metrics.
    pub normalized: Option<MetricTable>,
    pub bars: Vec<LongRow>,
    pub scatter: Option<Vec<ScatterPoint>>,
    pub notices: Vec<Notice>,
}

/// Comparison columns available in this table.
pub fn comparison_metrics(table: &PlayerTable) -> Vec<String> {
    table
        .schema()
        .present(&COMPARISON_COLUMNS)
        .into_iter()
        .map(str::to_string)
        .collect()
}

/// Raw, normalized, long and scatter views over the named players. Unknown
/// names select nothing; unknown metrics are dropped.
pub fn compare(table: &PlayerTable, names: &[String], metrics: &[String]) -> Comparison {
    let wanted: HashSet<&str> = names.iter().map(String::as_str).collect();
    let selected: Vec<usize> = table
        .iter()
        .enumerate()
        .filter(|(_, row)| wanted.contains(&*row.name()))
        .map(|(idx, _)| idx)
        .collect();
    let selection = table.subset(&selected);

    let mut chosen: Vec<String> = Vec::with_capacity(metrics.len());
    for metric in metrics {
        if selection.has_column(metric) && !chosen.contains(metric) {
            chosen.push(metric.clone());
        }
    }

    let raw = metric_table(&selection, &comparison_metrics(table));
    let chosen_table = metric_table(&selection, &chosen);

    let mut notices = Vec::new();
    if selection.is_empty() {
        notices.push(Notice::NoMatches);
    }

    let normalized = if chosen.len() >= MIN_RADAR_METRICS {
        Some(normalize(&chosen_table))
    } else {
        notices.push(Notice::NotEnoughMetrics);
        None
    };

    let scatter = [XG, GOALS, MINUTES]
        .iter()
        .all(|c| selection.has_column(c))
        .then(|| {
            selection
                .iter()
                .map(|row| ScatterPoint {
                    player: row.name().into_owned(),
                    xg: row.number_or_zero(XG),
                    goals: row.number_or_zero(GOALS),
                    minutes: row.number_or_zero(MINUTES),
                })
                .collect()
        });

    Comparison {
        selected: selection.len(),
        raw,
        normalized,
        bars: chosen_table.melt(),
        scatter,
        notices,
    }
}

/// Per metric: value / max over the rows * 100. A zero or undefined max
/// yields 0 for the whole metric.
pub fn normalize(table: &MetricTable) -> MetricTable {
    let maxima: Vec<f64> = (0..table.metrics.len())
        .map(|col| {
            table
                .rows
                .iter()
                .map(|row| row.values[col])
                .fold(f64::NEG_INFINITY, f64::max)
        })
        .collect();

    let rows = table
        .rows
        .iter()
        .map(|row| MetricRow {
            player: row.player.clone(),
            values: row
                .values
                .iter()
                .zip(&maxima)
                .map(|(value, max)| {
                    if max.is_finite() && *max != 0.0 {
                        value / max * 100.0
                    } else {
                        0.0
                    }
                })
                .collect(),
        })
        .collect();

    MetricTable {
        metrics: table.metrics.clone(),
        rows,
    }
}

fn metric_table(table: &PlayerTable, metrics: &[String]) -> MetricTable {
    MetricTable {
        metrics: metrics.to_vec(),
        rows: table
            .iter()
            .map(|row| MetricRow {
                player: row.name().into_owned(),
                values: metrics.iter().map(|m| row.number_or_zero(m)).collect(),
            })
            .collect(),
    }
}
