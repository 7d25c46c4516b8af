use serde::Serialize;

use crate::compare::MIN_RADAR_METRICS;
use crate::notice::Notice;
use crate::search::ALL_LABEL;
use crate::table::{
    AGE, ASSISTS, GOALS, MARKET_VALUE, MINUTES, PLAYER, POS, PROG_PASSES, PROG_RECEPTIONS,
    PlayerTable, SQUAD, XAG, XG, YELLOW_CARDS,
};

pub const PROFILE_METRICS: [&str; 9] = [
    GOALS,
    ASSISTS,
    XG,
    XAG,
    PROG_PASSES,
    PROG_RECEPTIONS,
    YELLOW_CARDS,
    MINUTES,
    MARKET_VALUE,
];

pub const CARD_COLUMNS: [&str; 5] = [PLAYER, AGE, POS, SQUAD, MARKET_VALUE];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricBaseline {
    pub metric: String,
    /// `None` when the player's own value is unknown.
    pub player: Option<f64>,
    pub group_average: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlayerProfile {
    pub player: String,
    /// Position the baseline was computed over, or "All" for the fallback.
    pub group: String,
    pub group_size: usize,
    pub card: PlayerTable,
    pub stats: PlayerTable,
    pub baseline: Vec<MetricBaseline>,
    pub notice: Option<Notice>,
}

impl PlayerProfile {
    pub fn radar_ready(&self) -> bool {
        self.baseline.len() >= MIN_RADAR_METRICS
    }
}

/// Profile of the first row named `name`, compared against the mean of its
/// position group. Returns `None` for an unknown name.
pub fn profile(table: &PlayerTable, name: &str) -> Option<PlayerProfile> {
    let idx = table.iter().position(|row| row.name() == name)?;
    let row = table.row(idx)?;

    let position = row.position().into_owned();
    let group = (table.has_column(POS) && !position.is_empty()).then_some(position.as_str());

    let metrics = table.schema().present(&PROFILE_METRICS);
    let (group_size, averages) = group_means(table, group, &metrics);

    let baseline: Vec<MetricBaseline> = metrics
        .iter()
        .zip(averages)
        .map(|(metric, group_average)| MetricBaseline {
            metric: metric.to_string(),
            player: row.number(metric),
            group_average,
        })
        .collect();

    let single = table.subset(&[idx]);
    Some(PlayerProfile {
        player: name.to_string(),
        group: group.unwrap_or(ALL_LABEL).to_string(),
        group_size,
        card: single.project(&CARD_COLUMNS),
        stats: single.project(&metrics),
        notice: (baseline.len() < MIN_RADAR_METRICS).then_some(Notice::NotEnoughMetrics),
        baseline,
    })
}

/// Mean of each metric over rows whose position equals `group` (every row
/// when `group` is `None`). Unknown values are left out of the mean; a metric
/// with no known values averages to 0. Also returns the group size.
pub fn group_means(table: &PlayerTable, group: Option<&str>, metrics: &[&str]) -> (usize, Vec<f64>) {
    let mut sums = vec![0.0; metrics.len()];
    let mut counts = vec![0usize; metrics.len()];
    let mut size = 0usize;

    for row in table.iter() {
        if let Some(position) = group {
            if row.position() != position {
                continue;
            }
        }
        size += 1;
        for (i, metric) in metrics.iter().enumerate() {
            if let Some(v) = row.number(metric) {
                sums[i] += v;
                counts[i] += 1;
            }
        }
    }

    let means = sums
        .into_iter()
        .zip(counts)
        .map(|(sum, n)| if n == 0 { 0.0 } else { sum / n as f64 })
        .collect();
    (size, means)
}
