use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::notice::Notice;
use crate::search::Choice;
use crate::table::{
    AGE, ASSISTS, GOALS, GOALS_ASSISTS, MARKET_VALUE, MINUTES, PLAYER, POS, PlayerTable, Row,
    SQUAD, SortKey, XAG, XG, XG_XAG,
};

pub const DISPLAY_COLUMNS: [&str; 12] = [
    PLAYER,
    AGE,
    POS,
    SQUAD,
    MINUTES,
    GOALS,
    ASSISTS,
    XG,
    XAG,
    GOALS_ASSISTS,
    XG_XAG,
    MARKET_VALUE,
];

const MAX_AGE_DOMAIN: (f64, f64) = (16.0, 45.0);
const DEFAULT_MAX_AGE: f64 = 30.0;
const DEFAULT_MIN_MINUTES: f64 = 900.0;
/// Minutes slider ceiling when the dataset has no minutes column.
const FALLBACK_MINUTES_CEILING: f64 = 3000.0;

/// Candidate-search profile selected from the target position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tier {
    Forward,
    Midfield,
    Other,
}

impl Tier {
    pub fn label(self) -> &'static str {
        match self {
            Tier::Forward => "Forward",
            Tier::Midfield => "Midfield",
            Tier::Other => "Other",
        }
    }

    /// (primary, secondary) threshold columns.
    pub fn threshold_columns(self) -> (&'static str, &'static str) {
        match self {
            Tier::Forward => (GOALS, XG),
            Tier::Midfield => (ASSISTS, XAG),
            Tier::Other => (GOALS_ASSISTS, XG_XAG),
        }
    }

    /// Default (primary, secondary) minimums.
    pub fn default_thresholds(self) -> (f64, f64) {
        match self {
            Tier::Forward => (5.0, 2.0),
            Tier::Midfield => (3.0, 1.5),
            Tier::Other => (1.0, 0.5),
        }
    }

    /// Ranking keys, all descending, for a table with the given columns.
    pub fn ranking(self, table: &PlayerTable) -> Vec<&'static str> {
        let keys: &[&'static str] = match self {
            Tier::Forward => &[GOALS, XG, MINUTES],
            Tier::Midfield => &[ASSISTS, XAG, MINUTES],
            Tier::Other if table.has_column(XG_XAG) => &[GOALS_ASSISTS, XG_XAG, MINUTES],
            Tier::Other => &[GOALS_ASSISTS, MINUTES],
        };
        table.schema().present(keys)
    }
}

/// Position code to tier mapping: exact codes first, then prefixes in order.
#[derive(Debug, Clone)]
pub struct TierMap {
    exact: HashMap<String, Tier>,
    prefixes: Vec<(String, Tier)>,
}

impl Default for TierMap {
    fn default() -> Self {
        let mut map = TierMap::empty();
        for code in ["FW", "FWD", "F", "ST"] {
            map = map.with_code(code, Tier::Forward);
        }
        for code in ["MF", "MID", "M"] {
            map = map.with_code(code, Tier::Midfield);
        }
        map.with_prefix("F", Tier::Forward)
            .with_prefix("M", Tier::Midfield)
    }
}

impl TierMap {
    pub fn empty() -> Self {
        Self {
            exact: HashMap::new(),
            prefixes: Vec::new(),
        }
    }

    pub fn with_code(mut self, code: &str, tier: Tier) -> Self {
        self.exact.insert(code.trim().to_string(), tier);
        self
    }

    pub fn with_prefix(mut self, prefix: &str, tier: Tier) -> Self {
        self.prefixes.push((prefix.to_string(), tier));
        self
    }

    pub fn classify(&self, target: &Choice) -> Tier {
        let Choice::Only(code) = target else {
            return Tier::Other;
        };
        let code = code.trim();
        if let Some(tier) = self.exact.get(code) {
            return *tier;
        }
        self.prefixes
            .iter()
            .find(|(prefix, _)| code.starts_with(prefix.as_str()))
            .map(|(_, tier)| *tier)
            .unwrap_or(Tier::Other)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoutCriteria {
    pub target: Choice,
    pub max_age: f64,
    pub min_minutes: f64,
    pub max_market_value: f64,
    /// Minimum of the tier's primary column (goals, assists or G+A).
    pub primary_min: f64,
    /// Minimum of the tier's secondary column (xG, xAG or xG+xAG).
    pub secondary_min: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Slider {
    pub min: f64,
    pub max: f64,
    pub default: f64,
    pub step: f64,
}

impl Slider {
    fn new(min: f64, max: f64, default: f64, step: f64) -> Self {
        let max = max.max(min);
        Self {
            min,
            max,
            default: default.clamp(min, max),
            step,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ScoutControls {
    pub target: Choice,
    pub tier: Tier,
    pub positions: Vec<String>,
    pub max_age: Slider,
    pub min_minutes: Slider,
    pub max_market_value: Slider,
    pub primary_column: &'static str,
    pub primary: Slider,
    pub secondary_column: &'static str,
    pub secondary: Slider,
}

impl ScoutControls {
    pub fn default_criteria(&self) -> ScoutCriteria {
        ScoutCriteria {
            target: self.target.clone(),
            max_age: self.max_age.default,
            min_minutes: self.min_minutes.default,
            max_market_value: self.max_market_value.default,
            primary_min: self.primary.default,
            secondary_min: self.secondary.default,
        }
    }
}

/// Slider bounds for a target position. Ceilings come from the rows left
/// after the position filter only; the other filters do not move them.
pub fn scout_controls(table: &PlayerTable, target: &Choice, tiers: &TierMap) -> ScoutControls {
    let tier = tiers.classify(target);
    let pool = position_pool(table, target);
    let (primary_column, secondary_column) = tier.threshold_columns();
    let (primary_default, secondary_default) = tier.default_thresholds();

    let minutes_ceiling = if pool.has_column(MINUTES) {
        pool.max_or_zero(MINUTES).trunc()
    } else {
        FALLBACK_MINUTES_CEILING
    };
    let value_ceiling = pool.max_or_zero(MARKET_VALUE).trunc();

    let mut positions = vec![crate::search::ALL_LABEL.to_string()];
    positions.extend(table.distinct_text(POS));

    ScoutControls {
        target: target.clone(),
        tier,
        positions,
        max_age: Slider::new(MAX_AGE_DOMAIN.0, MAX_AGE_DOMAIN.1, DEFAULT_MAX_AGE, 1.0),
        min_minutes: Slider::new(0.0, minutes_ceiling, DEFAULT_MIN_MINUTES, 1.0),
        max_market_value: Slider::new(0.0, value_ceiling, value_ceiling, 1.0),
        primary_column,
        primary: Slider::new(0.0, pool.max_or_zero(primary_column).trunc(), primary_default, 1.0),
        secondary_column,
        secondary: Slider::new(0.0, pool.max_or_zero(secondary_column), secondary_default, 0.1),
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ScoutReport {
    pub tier: Tier,
    pub ranking: Vec<&'static str>,
    pub total: usize,
    pub candidates: PlayerTable,
    pub notice: Option<Notice>,
}

/// Position-aware candidate search. Common filters apply first, then the
/// tier's thresholds; survivors are ranked by the tier's keys, descending.
pub fn scout(table: &PlayerTable, criteria: &ScoutCriteria, tiers: &TierMap) -> ScoutReport {
    let tier = tiers.classify(&criteria.target);
    let (primary, secondary) = tier.threshold_columns();

    let mut indices: Vec<usize> = table
        .iter()
        .enumerate()
        .filter(|(_, row)| in_position(table, row, &criteria.target))
        .filter(|(_, row)| {
            at_most(table, row, AGE, criteria.max_age)
                && at_least(table, row, MINUTES, criteria.min_minutes)
                && at_most(table, row, MARKET_VALUE, criteria.max_market_value)
        })
        .filter(|(_, row)| {
            at_least(table, row, primary, criteria.primary_min)
                && at_least(table, row, secondary, criteria.secondary_min)
        })
        .map(|(idx, _)| idx)
        .collect();

    let ranking = tier.ranking(table);
    let keys: Vec<SortKey<'_>> = ranking.iter().map(|&c| SortKey::descending(c)).collect();
    table.sort_indices(&mut indices, &keys);

    let total = indices.len();
    ScoutReport {
        tier,
        ranking,
        total,
        candidates: table.subset(&indices).project(&DISPLAY_COLUMNS),
        notice: (total == 0).then_some(Notice::NoCandidates),
    }
}

fn position_pool(table: &PlayerTable, target: &Choice) -> PlayerTable {
    let indices: Vec<usize> = table
        .iter()
        .enumerate()
        .filter(|(_, row)| in_position(table, row, target))
        .map(|(idx, _)| idx)
        .collect();
    table.subset(&indices)
}

fn in_position(table: &PlayerTable, row: &Row<'_>, target: &Choice) -> bool {
    !table.has_column(POS) || target.matches(&row.position())
}

fn at_least(table: &PlayerTable, row: &Row<'_>, column: &str, min: f64) -> bool {
    !table.has_column(column) || row.number_or_zero(column) >= min
}

fn at_most(table: &PlayerTable, row: &Row<'_>, column: &str, max: f64) -> bool {
    !table.has_column(column) || row.number_or_zero(column) <= max
}
