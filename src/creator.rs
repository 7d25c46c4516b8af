use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::dataset::DatasetStore;
use crate::table::{
    AGE, ASSISTS, BORN, Cell, ColumnKind, GOALS, GOALS_ASSISTS, GOALS_ASSISTS_NON_PENALTY,
    MARKET_VALUE, MATCHES, MINUTES, NATION, NON_PENALTY_GOALS, NPXG, NPXG_XAG, PENALTY_GOALS,
    PLAYER, POS, PlayerRecord, PlayerTable, RANK, SQUAD, STARTS, XAG, XG, XG_XAG, format_number,
    is_declared_numeric,
};

pub const MIN_AGE: u32 = 15;
pub const MAX_AGE: u32 = 45;
pub const DEFAULT_AGE: u32 = 18;

/// Form input for a manually added player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewPlayer {
    pub name: String,
    pub squad: String,
    pub age: u32,
    pub position: String,
    pub nation: String,
    pub born: String,
    pub matches_played: u32,
    pub starts: u32,
    pub minutes: u32,
    pub goals: u32,
    pub assists: u32,
    pub non_penalty_goals: u32,
    pub xg: f64,
    pub xag: f64,
    pub npxg: f64,
    pub market_value: f64,
}

impl Default for NewPlayer {
    fn default() -> Self {
        Self {
            name: String::new(),
            squad: String::new(),
            age: DEFAULT_AGE,
            position: String::new(),
            nation: String::new(),
            born: String::new(),
            matches_played: 0,
            starts: 0,
            minutes: 0,
            goals: 0,
            assists: 0,
            non_penalty_goals: 0,
            xg: 0.0,
            xag: 0.0,
            npxg: 0.0,
            market_value: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DerivedStats {
    pub goals_assists: f64,
    pub penalty_goals: f64,
    pub goals_assists_non_penalty: f64,
    pub xg_xag: f64,
    pub npxg_xag: f64,
}

enum Value {
    Number(f64),
    Text(String),
}

impl NewPlayer {
    pub fn clamped_age(&self) -> u32 {
        self.age.clamp(MIN_AGE, MAX_AGE)
    }

    /// Composite columns, always recomputed from the raw inputs. Penalty
    /// goals are the goals not counted as non-penalty goals.
    pub fn derived(&self) -> DerivedStats {
        let goals = f64::from(self.goals);
        let assists = f64::from(self.assists);
        let penalty_goals = (goals - f64::from(self.non_penalty_goals)).max(0.0);
        let xag = non_negative(self.xag);
        DerivedStats {
            goals_assists: goals + assists,
            penalty_goals,
            goals_assists_non_penalty: goals + assists - penalty_goals,
            xg_xag: non_negative(self.xg) + xag,
            npxg_xag: non_negative(self.npxg) + xag,
        }
    }

    fn supplied(&self, next_rank: f64) -> Vec<(&'static str, Value)> {
        let d = self.derived();
        vec![
            (RANK, Value::Number(next_rank)),
            (PLAYER, Value::Text(self.name.clone())),
            (NATION, Value::Text(self.nation.clone())),
            (POS, Value::Text(self.position.clone())),
            (SQUAD, Value::Text(self.squad.clone())),
            (AGE, Value::Number(f64::from(self.clamped_age()))),
            (BORN, Value::Text(self.born.trim().to_string())),
            (MATCHES, Value::Number(f64::from(self.matches_played))),
            (STARTS, Value::Number(f64::from(self.starts))),
            (MINUTES, Value::Number(f64::from(self.minutes))),
            (GOALS, Value::Number(f64::from(self.goals))),
            (ASSISTS, Value::Number(f64::from(self.assists))),
            (GOALS_ASSISTS, Value::Number(d.goals_assists)),
            (NON_PENALTY_GOALS, Value::Number(f64::from(self.non_penalty_goals))),
            (PENALTY_GOALS, Value::Number(d.penalty_goals)),
            (GOALS_ASSISTS_NON_PENALTY, Value::Number(d.goals_assists_non_penalty)),
            (XG, Value::Number(non_negative(self.xg))),
            (XAG, Value::Number(non_negative(self.xag))),
            (XG_XAG, Value::Number(d.xg_xag)),
            (NPXG, Value::Number(non_negative(self.npxg))),
            (NPXG_XAG, Value::Number(d.npxg_xag)),
            (MARKET_VALUE, Value::Number(non_negative(self.market_value))),
        ]
    }
}

/// Row for `player` laid out on `table`'s schema. Columns the input does not
/// cover get 0 when numeric and an empty string otherwise; input fields with
/// no matching column are dropped.
pub fn build_record(table: &PlayerTable, player: &NewPlayer) -> PlayerRecord {
    let supplied = player.supplied(next_rank(table));
    let cells = table
        .schema()
        .columns()
        .iter()
        .map(|column| {
            let value = supplied
                .iter()
                .find(|(name, _)| *name == column.name)
                .map(|(_, value)| value);
            match (value, column.kind) {
                (Some(value), _) => to_cell(&column.name, value),
                (None, ColumnKind::Numeric) => to_cell(&column.name, &Value::Number(0.0)),
                (None, ColumnKind::Text) => Cell::Text(String::new()),
            }
        })
        .collect();
    PlayerRecord::new(cells)
}

#[derive(Debug, Clone, Serialize)]
pub struct AppendOutcome {
    pub player: String,
    pub rows: usize,
}

/// Append `player` to the stored dataset, rewrite the file and invalidate the
/// cached table so the next read sees the new row.
pub fn append_player(store: &DatasetStore, player: &NewPlayer) -> Result<AppendOutcome> {
    let current = store.table()?;
    let mut updated = PlayerTable::clone(&current);
    updated.push(build_record(&updated, player));
    store.persist(&updated)?;
    info!(player = %player.name, rows = updated.len(), "appended player");
    Ok(AppendOutcome {
        player: player.name.clone(),
        rows: updated.len(),
    })
}

/// One past the highest rank, so repeated appends keep distinct ranks.
fn next_rank(table: &PlayerTable) -> f64 {
    table
        .observed_range(RANK)
        .map(|(_, hi)| hi.trunc() + 1.0)
        .unwrap_or(table.len() as f64 + 1.0)
}

fn to_cell(column: &str, value: &Value) -> Cell {
    match value {
        Value::Number(n) if is_declared_numeric(column) => Cell::Number(Some(*n)),
        Value::Number(n) => Cell::Text(format_number(*n)),
        Value::Text(s) if is_declared_numeric(column) => Cell::Number(crate::table::parse_number(s)),
        Value::Text(s) => Cell::Text(s.clone()),
    }
}

fn non_negative(v: f64) -> f64 {
    if v.is_finite() { v.max(0.0) } else { 0.0 }
}
