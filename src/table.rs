use std::borrow::Cow;
use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};

use serde::Serialize;

pub const PLAYER: &str = "Player";
pub const SQUAD: &str = "Squad";
pub const POS: &str = "Pos";
pub const NATION: &str = "Nation";
pub const AGE: &str = "Age";
pub const BORN: &str = "Born";
pub const RANK: &str = "Rk";
pub const MATCHES: &str = "MP";
pub const STARTS: &str = "Starts";
pub const MINUTES: &str = "Min";
pub const NINETIES: &str = "90s";
pub const GOALS: &str = "Gls";
pub const ASSISTS: &str = "Ast";
pub const GOALS_ASSISTS: &str = "G+A";
pub const NON_PENALTY_GOALS: &str = "G-PK";
pub const PENALTY_GOALS: &str = "PK";
pub const PENALTY_ATTEMPTS: &str = "PKatt";
pub const YELLOW_CARDS: &str = "CrdY";
pub const RED_CARDS: &str = "CrdR";
pub const XG: &str = "xG";
pub const NPXG: &str = "npxG";
pub const XAG: &str = "xAG";
pub const NPXG_XAG: &str = "npxG+xAG";
pub const PROG_CARRIES: &str = "PrgC";
pub const PROG_PASSES: &str = "PrgP";
pub const PROG_RECEPTIONS: &str = "PrgR";
pub const GOALS_ASSISTS_NON_PENALTY: &str = "G+A-PK";
pub const XG_XAG: &str = "xG+xAG";
pub const MARKET_VALUE: &str = "Market Value (M€)";

/// Columns coerced to numbers on load. Anything unparseable becomes missing.
pub const NUMERIC_COLUMNS: [&str; 23] = [
    AGE,
    MATCHES,
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

/// Identity columns. Always strings, never null.
pub const TEXT_COLUMNS: [&str; 4] = [PLAYER, SQUAD, POS, NATION];

pub fn is_declared_numeric(name: &str) -> bool {
    NUMERIC_COLUMNS.contains(&name)
}

pub fn is_declared_text(name: &str) -> bool {
    TEXT_COLUMNS.contains(&name)
}

/// Lenient numeric coercion: blank, malformed and non-finite input is missing.
pub fn parse_number(raw: &str) -> Option<f64> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    s.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Integral values print without a fractional part so that round-tripped
/// counts stay `10`, not `10.0`.
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ColumnKind {
    Numeric,
    Text,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Column {
    pub name: String,
    pub kind: ColumnKind,
}

impl Column {
    pub fn new(name: impl Into<String>, kind: ColumnKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

/// Ordered column set with name lookup. Every operation that touches an
/// optional column asks the schema first and skips the step when it is absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Schema {
    columns: Vec<Column>,
    #[serde(skip)]
    index: HashMap<String, usize>,
}

impl Schema {
    pub fn new(columns: Vec<Column>) -> Self {
        let mut index = HashMap::with_capacity(columns.len());
        for (idx, column) in columns.iter().enumerate() {
            index.entry(column.name.clone()).or_insert(idx);
        }
        Self { columns, index }
    }

    pub fn has(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn kind(&self, name: &str) -> Option<ColumnKind> {
        self.index_of(name).map(|idx| self.columns[idx].kind)
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// The subset of `wanted` present in this schema, first occurrence wins.
    pub fn present<'a>(&self, wanted: &[&'a str]) -> Vec<&'a str> {
        let mut out: Vec<&'a str> = Vec::with_capacity(wanted.len());
        for name in wanted {
            if self.has(name) && !out.contains(name) {
                out.push(name);
            }
        }
        out
    }

    fn push(&mut self, column: Column) -> usize {
        let idx = self.columns.len();
        self.index.entry(column.name.clone()).or_insert(idx);
        self.columns.push(column);
        idx
    }
}

/// One table cell. Declared numeric columns hold `Number`, everything else is
/// kept as the source text so unknown columns pass through unmodified.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    Number(Option<f64>),
    Text(String),
}

impl Cell {
    pub fn number(&self) -> Option<f64> {
        match self {
            Cell::Number(value) => *value,
            Cell::Text(raw) => parse_number(raw),
        }
    }

    pub fn is_missing(&self) -> bool {
        match self {
            Cell::Number(value) => value.is_none(),
            Cell::Text(raw) => raw.is_empty(),
        }
    }

    pub fn render(&self) -> Cow<'_, str> {
        match self {
            Cell::Number(Some(value)) => Cow::Owned(format_number(*value)),
            Cell::Number(None) => Cow::Borrowed(""),
            Cell::Text(raw) => Cow::Borrowed(raw.as_str()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct PlayerRecord {
    cells: Vec<Cell>,
}

impl PlayerRecord {
    pub fn new(cells: Vec<Cell>) -> Self {
        Self { cells }
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }
}

/// Borrowed view of one row together with the schema that names its cells.
#[derive(Debug, Clone, Copy)]
pub struct Row<'a> {
    schema: &'a Schema,
    record: &'a PlayerRecord,
}

impl<'a> Row<'a> {
    pub fn cell(&self, column: &str) -> Option<&'a Cell> {
        let idx = self.schema.index_of(column)?;
        self.record.cells.get(idx)
    }

    /// `None` when the column is absent or the value is unknown.
    pub fn number(&self, column: &str) -> Option<f64> {
        self.cell(column).and_then(Cell::number)
    }

    pub fn number_or_zero(&self, column: &str) -> f64 {
        self.number(column).unwrap_or(0.0)
    }

    pub fn text(&self, column: &str) -> Cow<'a, str> {
        self.cell(column)
            .map(Cell::render)
            .unwrap_or(Cow::Borrowed(""))
    }

    pub fn name(&self) -> Cow<'a, str> {
        self.text(PLAYER)
    }

    pub fn squad(&self) -> Cow<'a, str> {
        self.text(SQUAD)
    }

    pub fn position(&self) -> Cow<'a, str> {
        self.text(POS)
    }

    pub fn record(&self) -> &'a PlayerRecord {
        self.record
    }
}

/// How a sort key treats unknown values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Missing {
    /// Unknown values go after every known one, whatever the direction.
    Last,
    /// Unknown values compare as 0.
    Zero,
}

#[derive(Debug, Clone, Copy)]
pub struct SortKey<'a> {
    pub column: &'a str,
    pub ascending: bool,
    pub missing: Missing,
}

impl<'a> SortKey<'a> {
    pub fn descending(column: &'a str) -> Self {
        Self {
            column,
            ascending: false,
            missing: Missing::Zero,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct PlayerTable {
    schema: Schema,
    rows: Vec<PlayerRecord>,
}

impl PlayerTable {
    /// Rows are padded or truncated to the schema width.
    pub fn new(schema: Schema, rows: Vec<PlayerRecord>) -> Self {
        let width = schema.len();
        let rows = rows
            .into_iter()
            .map(|mut record| {
                fit_width(&schema, &mut record.cells, width);
                record
            })
            .collect();
        Self { schema, rows }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn records(&self) -> &[PlayerRecord] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.schema.has(name)
    }

    pub fn row(&self, idx: usize) -> Option<Row<'_>> {
        self.rows.get(idx).map(|record| Row {
            schema: &self.schema,
            record,
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = Row<'_>> {
        self.rows.iter().map(|record| Row {
            schema: &self.schema,
            record,
        })
    }

    pub fn push(&mut self, mut record: PlayerRecord) {
        fit_width(&self.schema, &mut record.cells, self.schema.len());
        self.rows.push(record);
    }

    /// Owned copy of the given rows, in the given order.
    pub fn subset(&self, indices: &[usize]) -> PlayerTable {
        let rows = indices
            .iter()
            .filter_map(|&idx| self.rows.get(idx).cloned())
            .collect();
        PlayerTable {
            schema: self.schema.clone(),
            rows,
        }
    }

    /// Copy restricted to the listed columns that exist, in listed order.
    pub fn project(&self, columns: &[&str]) -> PlayerTable {
        let keep: Vec<usize> = self
            .schema
            .present(columns)
            .into_iter()
            .filter_map(|name| self.schema.index_of(name))
            .collect();
        let schema = Schema::new(
            keep.iter()
                .map(|&idx| self.schema.columns[idx].clone())
                .collect(),
        );
        let rows = self
            .rows
            .iter()
            .map(|record| PlayerRecord::new(keep.iter().map(|&idx| record.cells[idx].clone()).collect()))
            .collect();
        PlayerTable { schema, rows }
    }

    /// Sorted distinct non-empty values of a column.
    pub fn distinct_text(&self, column: &str) -> Vec<String> {
        if !self.schema.has(column) {
            return Vec::new();
        }
        self.iter()
            .map(|row| row.text(column).into_owned())
            .filter(|value| !value.is_empty())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Observed (min, max) over known values.
    pub fn observed_range(&self, column: &str) -> Option<(f64, f64)> {
        if !self.schema.has(column) {
            return None;
        }
        self.iter()
            .filter_map(|row| row.number(column))
            .fold(None, |acc, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }

    pub fn max_or_zero(&self, column: &str) -> f64 {
        if !self.schema.has(column) || self.rows.is_empty() {
            return 0.0;
        }
        self.iter()
            .map(|row| row.number_or_zero(column))
            .fold(f64::NEG_INFINITY, f64::max)
    }

    /// Replace unknown values of a column with `value`.
    pub fn fill_missing(&mut self, column: &str, value: f64) {
        let Some(idx) = self.schema.index_of(column) else {
            return;
        };
        for record in &mut self.rows {
            let cell = &mut record.cells[idx];
            if cell.number().is_none() {
                *cell = Cell::Number(Some(value));
            }
        }
    }

    /// Overwrite (or append) a numeric column with one value per row.
    pub fn set_number_column(&mut self, column: &str, values: &[f64]) {
        let idx = match self.schema.index_of(column) {
            Some(idx) => {
                self.schema.columns[idx].kind = ColumnKind::Numeric;
                idx
            }
            None => {
                let idx = self.schema.push(Column::new(column, ColumnKind::Numeric));
                for record in &mut self.rows {
                    record.cells.push(Cell::Number(None));
                }
                idx
            }
        };
        for (record, value) in self.rows.iter_mut().zip(values) {
            record.cells[idx] = Cell::Number(Some(*value));
        }
    }

    /// Stable multi-key sort of row indices. Keys naming absent columns are
    /// ignored.
    pub fn sort_indices(&self, indices: &mut [usize], keys: &[SortKey<'_>]) {
        let resolved: Vec<(usize, ColumnKind, &SortKey<'_>)> = keys
            .iter()
            .filter_map(|key| {
                let idx = self.schema.index_of(key.column)?;
                Some((idx, self.schema.columns[idx].kind, key))
            })
            .collect();
        if resolved.is_empty() {
            return;
        }
        indices.sort_by(|&a, &b| {
            for (col, kind, key) in &resolved {
                let left = &self.rows[a].cells[*col];
                let right = &self.rows[b].cells[*col];
                let ord = compare_cells(left, right, *kind, key);
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            Ordering::Equal
        });
    }

    /// Header line followed by rendered rows.
    pub fn to_string_rows(&self) -> Vec<Vec<String>> {
        let mut out = Vec::with_capacity(self.rows.len() + 1);
        out.push(self.schema.names().map(str::to_string).collect());
        for record in &self.rows {
            out.push(record.cells.iter().map(|c| c.render().into_owned()).collect());
        }
        out
    }
}

fn fit_width(schema: &Schema, cells: &mut Vec<Cell>, width: usize) {
    cells.truncate(width);
    while cells.len() < width {
        let empty = match schema.columns[cells.len()].kind {
            ColumnKind::Numeric if is_declared_numeric(&schema.columns[cells.len()].name) => {
                Cell::Number(None)
            }
            _ => Cell::Text(String::new()),
        };
        cells.push(empty);
    }
}

fn compare_cells(left: &Cell, right: &Cell, kind: ColumnKind, key: &SortKey<'_>) -> Ordering {
    match kind {
        ColumnKind::Numeric => {
            let (a, b) = match key.missing {
                Missing::Zero => (
                    Some(left.number().unwrap_or(0.0)),
                    Some(right.number().unwrap_or(0.0)),
                ),
                Missing::Last => (left.number(), right.number()),
            };
            match (a, b) {
                (Some(x), Some(y)) => {
                    let ord = x.partial_cmp(&y).unwrap_or(Ordering::Equal);
                    if key.ascending { ord } else { ord.reverse() }
                }
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            }
        }
        ColumnKind::Text => {
            let ord = left.render().cmp(&right.render());
            if key.ascending { ord } else { ord.reverse() }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> PlayerTable {
        let schema = Schema::new(vec![
            Column::new(PLAYER, ColumnKind::Text),
            Column::new(GOALS, ColumnKind::Numeric),
        ]);
        PlayerTable::new(
            schema,
            vec![
                PlayerRecord::new(vec![Cell::Text("A".into()), Cell::Number(Some(3.0))]),
                PlayerRecord::new(vec![Cell::Text("B".into()), Cell::Number(None)]),
                PlayerRecord::new(vec![Cell::Text("C".into())]),
                PlayerRecord::new(vec![Cell::Text("D".into()), Cell::Number(Some(7.0))]),
            ],
        )
    }

    #[test]
    fn parse_number_rejects_garbage_and_non_finite() {
        assert_eq!(parse_number(" 12.5 "), Some(12.5));
        assert_eq!(parse_number(""), None);
        assert_eq!(parse_number("n/a"), None);
        assert_eq!(parse_number("nan"), None);
        assert_eq!(parse_number("inf"), None);
    }

    #[test]
    fn format_number_drops_integral_fraction() {
        assert_eq!(format_number(10.0), "10");
        assert_eq!(format_number(2.35), "2.35");
        assert_eq!(format_number(-1.0), "-1");
    }

    #[test]
    fn short_rows_are_padded_with_missing() {
        let table = sample();
        let row = table.row(2).unwrap();
        assert_eq!(row.number(GOALS), None);
        assert_eq!(row.number_or_zero(GOALS), 0.0);
    }

    #[test]
    fn missing_last_holds_in_both_directions() {
        let table = sample();
        let mut idx: Vec<usize> = (0..table.len()).collect();
        let key = SortKey {
            column: GOALS,
            ascending: true,
            missing: Missing::Last,
        };
        table.sort_indices(&mut idx, &[key]);
        assert_eq!(idx, vec![0, 3, 1, 2]);

        let mut idx: Vec<usize> = (0..table.len()).collect();
        table.sort_indices(&mut idx, &[SortKey { ascending: false, ..key }]);
        assert_eq!(idx, vec![3, 0, 1, 2]);
    }

    #[test]
    fn unknown_sort_column_is_a_no_op() {
        let table = sample();
        let mut idx: Vec<usize> = vec![3, 1, 0, 2];
        table.sort_indices(&mut idx, &[SortKey::descending("nope")]);
        assert_eq!(idx, vec![3, 1, 0, 2]);
    }

    #[test]
    fn project_skips_absent_columns() {
        let table = sample().project(&[GOALS, "Nope", PLAYER]);
        let names: Vec<&str> = table.schema().names().collect();
        assert_eq!(names, vec![GOALS, PLAYER]);
        assert_eq!(table.row(0).unwrap().text(PLAYER), "A");
    }

    #[test]
    fn set_number_column_appends_when_absent() {
        let mut table = sample();
        table.set_number_column(XG_XAG, &[1.0, 2.0, 3.0, 4.0]);
        assert!(table.has_column(XG_XAG));
        assert_eq!(table.row(3).unwrap().number(XG_XAG), Some(4.0));
    }
}
