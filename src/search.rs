use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::notice::Notice;
use crate::table::{
    AGE, ASSISTS, GOALS, MARKET_VALUE, MINUTES, Missing, PLAYER, POS, PlayerTable, Row, SQUAD,
    SortKey, XAG, XG,
};

pub const ALL_LABEL: &str = "All";

/// Accepted spellings of the "no constraint" option.
const ALL_SENTINELS: [&str; 3] = ["all", "todos", "todas"];

pub const AGE_DOMAIN: (f64, f64) = (15.0, 45.0);

pub const SORTABLE_COLUMNS: [&str; 10] = [
    PLAYER,
    AGE,
    POS,
    SQUAD,
    GOALS,
    ASSISTS,
    XG,
    XAG,
    MINUTES,
    MARKET_VALUE,
];

/// A categorical selector: either every value or one exact value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Choice {
    #[default]
    All,
    Only(String),
}

impl Choice {
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() || ALL_SENTINELS.contains(&trimmed.to_lowercase().as_str()) {
            Choice::All
        } else {
            Choice::Only(trimmed.to_string())
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Choice::All)
    }

    pub fn matches(&self, value: &str) -> bool {
        match self {
            Choice::All => true,
            Choice::Only(wanted) => wanted == value,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Choice::All => ALL_LABEL,
            Choice::Only(value) => value,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NumRange {
    pub min: f64,
    pub max: f64,
}

impl NumRange {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Inclusive on both ends.
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    fn validate(&self, field: &'static str) -> Result<(), FilterError> {
        if !self.min.is_finite() || !self.max.is_finite() {
            return Err(FilterError::NonFiniteBound { field });
        }
        if self.min > self.max {
            return Err(FilterError::InvertedRange {
                field,
                min: self.min,
                max: self.max,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    pub column: String,
    pub ascending: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchFilter {
    pub name_substring: Option<String>,
    pub squad: Choice,
    pub position: Choice,
    pub age_range: Option<NumRange>,
    pub market_value_range: Option<NumRange>,
    pub sort: Option<SortSpec>,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum FilterError {
    #[error("{field} range is inverted (min {min} > max {max})")]
    InvertedRange {
        field: &'static str,
        min: f64,
        max: f64,
    },
    #[error("{field} range has a non-finite bound")]
    NonFiniteBound { field: &'static str },
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
    pub total: usize,
    pub rows: PlayerTable,
    pub notice: Option<Notice>,
}

/// Rows matching every active predicate, optionally sorted. Predicates on
/// columns the table lacks are skipped.
pub fn search(table: &PlayerTable, filter: &SearchFilter) -> Result<SearchResult, FilterError> {
    if let Some(range) = &filter.age_range {
        range.validate("age")?;
    }
    if let Some(range) = &filter.market_value_range {
        range.validate("market value")?;
    }

    let needle = filter
        .name_substring
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_lowercase);

    let mut indices: Vec<usize> = table
        .iter()
        .enumerate()
        .filter(|(_, row)| matches_filter(table, row, filter, needle.as_deref()))
        .map(|(idx, _)| idx)
        .collect();

    if let Some(sort) = &filter.sort {
        table.sort_indices(
            &mut indices,
            &[SortKey {
                column: &sort.column,
                ascending: sort.ascending,
                missing: Missing::Last,
            }],
        );
    }

    let rows = table.subset(&indices);
    Ok(SearchResult {
        total: rows.len(),
        notice: rows.is_empty().then_some(Notice::NoMatches),
        rows,
    })
}

fn matches_filter(
    table: &PlayerTable,
    row: &Row<'_>,
    filter: &SearchFilter,
    needle: Option<&str>,
) -> bool {
    if let Some(needle) = needle {
        if table.has_column(PLAYER) && !row.name().to_lowercase().contains(needle) {
            return false;
        }
    }
    if table.has_column(SQUAD) && !filter.squad.matches(&row.squad()) {
        return false;
    }
    if table.has_column(POS) && !filter.position.matches(&row.position()) {
        return false;
    }
    if let Some(range) = &filter.age_range {
        if table.has_column(AGE) && !range.contains(row.number_or_zero(AGE)) {
            return false;
        }
    }
    if let Some(range) = &filter.market_value_range {
        if table.has_column(MARKET_VALUE) && !range.contains(row.number_or_zero(MARKET_VALUE)) {
            return false;
        }
    }
    true
}

/// Option lists and slider bounds for the search form.
#[derive(Debug, Clone, Serialize)]
pub struct SearchControls {
    pub squads: Vec<String>,
    pub positions: Vec<String>,
    pub age_domain: NumRange,
    pub age_default: NumRange,
    pub market_value_bounds: NumRange,
    pub sort_columns: Vec<String>,
    pub default_sort: Option<SortSpec>,
}

impl SearchControls {
    /// The filter that the untouched form submits.
    pub fn default_filter(&self) -> SearchFilter {
        SearchFilter {
            age_range: Some(self.age_default),
            market_value_range: Some(self.market_value_bounds),
            sort: self.default_sort.clone(),
            ..SearchFilter::default()
        }
    }
}

pub fn search_controls(table: &PlayerTable) -> SearchControls {
    let with_all = |values: Vec<String>| {
        let mut out = Vec::with_capacity(values.len() + 1);
        out.push(ALL_LABEL.to_string());
        out.extend(values);
        out
    };

    let age_default = match table.observed_range(AGE) {
        Some((lo, hi)) => NumRange::new(lo.trunc(), hi.trunc()),
        None => NumRange::new(AGE_DOMAIN.0, AGE_DOMAIN.1),
    };

    let market_value_bounds = if table.observed_range(MARKET_VALUE).is_some() {
        let (lo, hi) = table
            .iter()
            .map(|row| row.number_or_zero(MARKET_VALUE))
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
                (lo.min(v), hi.max(v))
            });
        let (lo, hi) = (lo.trunc(), hi.trunc());
        NumRange::new(lo, if hi > lo { hi } else { lo })
    } else {
        NumRange::new(0.0, 0.0)
    };

    let sort_columns: Vec<String> = table
        .schema()
        .present(&SORTABLE_COLUMNS)
        .into_iter()
        .map(str::to_string)
        .collect();
    let default_sort = sort_columns.first().map(|column| SortSpec {
        column: column.clone(),
        ascending: false,
    });

    SearchControls {
        squads: with_all(table.distinct_text(SQUAD)),
        positions: with_all(table.distinct_text(POS)),
        age_domain: NumRange::new(AGE_DOMAIN.0, AGE_DOMAIN.1),
        age_default,
        market_value_bounds,
        sort_columns,
        default_sort,
    }
}
