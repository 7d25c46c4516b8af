use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use anyhow::{Context, Result};
use once_cell::sync::OnceCell;
use tracing::{debug, info};

use crate::table::{
    Cell, Column, ColumnKind, PlayerRecord, PlayerTable, Schema, is_declared_numeric,
    is_declared_text, parse_number,
};

static SHARED: OnceCell<DatasetStore> = OnceCell::new();

/// Process-wide store, bound to the first path it is asked for.
pub fn shared_store(path: &Path) -> &'static DatasetStore {
    SHARED.get_or_init(|| DatasetStore::new(path))
}

/// Lazily loaded, explicitly invalidated handle on the player table.
#[derive(Debug)]
pub struct DatasetStore {
    path: PathBuf,
    cached: Mutex<Option<Arc<PlayerTable>>>,
}

impl DatasetStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cached: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Cached table, reading the file on first use or after `invalidate`.
    pub fn table(&self) -> Result<Arc<PlayerTable>> {
        let mut guard = self.cached.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(table) = guard.as_ref() {
            return Ok(Arc::clone(table));
        }
        let table = Arc::new(read_table(&self.path)?);
        info!(
            path = %self.path.display(),
            rows = table.len(),
            columns = table.schema().len(),
            "loaded player dataset"
        );
        *guard = Some(Arc::clone(&table));
        Ok(table)
    }

    pub fn invalidate(&self) {
        let mut guard = self.cached.lock().unwrap_or_else(PoisonError::into_inner);
        if guard.take().is_some() {
            debug!(path = %self.path.display(), "dataset cache invalidated");
        }
    }

    /// Overwrite the dataset file and drop the cached copy.
    pub fn persist(&self, table: &PlayerTable) -> Result<()> {
        write_table(table, &self.path)?;
        self.invalidate();
        Ok(())
    }
}

pub fn read_table(path: &Path) -> Result<PlayerTable> {
    let file = File::open(path).with_context(|| format!("open dataset {}", path.display()))?;
    read_table_from(file).with_context(|| format!("parse dataset {}", path.display()))
}

pub fn read_table_from<R: Read>(source: R) -> Result<PlayerTable> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(source);
    let headers: Vec<String> = reader
        .headers()
        .context("read header row")?
        .iter()
        .map(str::to_string)
        .collect();

    let mut raw_rows: Vec<Vec<String>> = Vec::new();
    for (idx, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("read row {}", idx + 1))?;
        let mut row: Vec<String> = record.iter().map(str::to_string).collect();
        row.resize(headers.len(), String::new());
        raw_rows.push(row);
    }

    let columns: Vec<Column> = headers
        .iter()
        .enumerate()
        .map(|(idx, name)| Column::new(name.clone(), column_kind(name, idx, &raw_rows)))
        .collect();

    let rows = raw_rows
        .into_iter()
        .map(|row| {
            PlayerRecord::new(
                row.into_iter()
                    .zip(headers.iter())
                    .map(|(raw, name)| coerce(name, raw))
                    .collect(),
            )
        })
        .collect();

    Ok(PlayerTable::new(Schema::new(columns), rows))
}

/// Writes header plus every row, through a sibling temp file.
pub fn write_table(table: &PlayerTable, path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() {
            fs::create_dir_all(dir)
                .with_context(|| format!("create dataset dir {}", dir.display()))?;
        }
    }
    let tmp = path.with_extension("csv.tmp");
    {
        let file =
            File::create(&tmp).with_context(|| format!("create {}", tmp.display()))?;
        write_table_to(table, file)?;
    }
    fs::rename(&tmp, path).with_context(|| format!("swap dataset {}", path.display()))?;
    info!(path = %path.display(), rows = table.len(), "saved player dataset");
    Ok(())
}

pub fn write_table_to<W: Write>(table: &PlayerTable, sink: W) -> Result<()> {
    let mut writer = csv::Writer::from_writer(sink);
    writer
        .write_record(table.schema().names())
        .context("write header row")?;
    for record in table.records() {
        let cells: Vec<_> = record.cells().iter().map(|c| c.render()).collect();
        writer
            .write_record(cells.iter().map(|c| c.as_bytes()))
            .context("write dataset row")?;
    }
    writer.flush().context("flush dataset")?;
    Ok(())
}

fn column_kind(name: &str, idx: usize, rows: &[Vec<String>]) -> ColumnKind {
    if is_declared_numeric(name) {
        return ColumnKind::Numeric;
    }
    if is_declared_text(name) {
        return ColumnKind::Text;
    }
    // Blank cells say nothing; an all-blank column stays numeric.
    let any_text = rows.iter().any(|row| {
        let raw = row[idx].trim();
        !raw.is_empty() && parse_number(raw).is_none()
    });
    if any_text {
        ColumnKind::Text
    } else {
        ColumnKind::Numeric
    }
}

fn coerce(name: &str, raw: String) -> Cell {
    if is_declared_numeric(name) {
        Cell::Number(parse_number(&raw))
    } else {
        Cell::Text(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::{AGE, BORN, GOALS, PLAYER, RANK};

    const RAW: &str = "Rk,Player,Age,Gls,Born,Comment\n\
                       1,Alpha,24,3,2000,fast\n\
                       2,Beta,abc,,1999,\n\
                       3,Gamma\n";

    #[test]
    fn coerces_declared_numeric_and_keeps_extras() {
        let table = read_table_from(RAW.as_bytes()).unwrap();
        assert_eq!(table.len(), 3);

        let beta = table.row(1).unwrap();
        assert_eq!(beta.number(AGE), None);
        assert_eq!(beta.number(GOALS), None);
        assert_eq!(beta.text(PLAYER), "Beta");

        let gamma = table.row(2).unwrap();
        assert_eq!(gamma.text(BORN), "");
        assert_eq!(gamma.number(AGE), None);
    }

    #[test]
    fn infers_kind_of_undeclared_columns() {
        let table = read_table_from(RAW.as_bytes()).unwrap();
        assert_eq!(table.schema().kind(RANK), Some(ColumnKind::Numeric));
        assert_eq!(table.schema().kind(BORN), Some(ColumnKind::Numeric));
        assert_eq!(table.schema().kind("Comment"), Some(ColumnKind::Text));
    }

    #[test]
    fn all_blank_extra_column_is_numeric() {
        let raw = "Player,Gls,Scouted\nAlpha,3,\nBeta,1,  \n";
        let table = read_table_from(raw.as_bytes()).unwrap();
        assert_eq!(table.schema().kind("Scouted"), Some(ColumnKind::Numeric));
        assert_eq!(table.row(0).unwrap().number("Scouted"), None);
    }

    #[test]
    fn write_keeps_header_and_pass_through_text() {
        let table = read_table_from(RAW.as_bytes()).unwrap();
        let mut out = Vec::new();
        write_table_to(&table, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("Rk,Player,Age,Gls,Born,Comment"));
        assert_eq!(lines.next(), Some("1,Alpha,24,3,2000,fast"));
        assert_eq!(lines.next(), Some("2,Beta,,,1999,"));
    }
}
