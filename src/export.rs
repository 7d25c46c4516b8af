use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use rust_xlsxwriter::{Workbook, Worksheet};

use crate::table::{Cell, PlayerTable};
use crate::watchlist::WatchlistEntry;

pub struct ExportReport {
    pub sheets: usize,
    pub rows: usize,
}

/// Writes each named table to its own sheet, plus a `Meta` sheet with the
/// generation time. Known numbers are written as numbers.
pub fn export_tables(path: &Path, tables: &[(&str, &PlayerTable)]) -> Result<ExportReport> {
    let mut workbook = Workbook::new();
    let mut rows = 0usize;
    for (name, table) in tables {
        let sheet = workbook.add_worksheet();
        sheet
            .set_name(*name)
            .with_context(|| format!("name sheet {name}"))?;
        write_table(sheet, table)?;
        rows += table.len();
    }
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Meta")?;
        write_rows(
            sheet,
            &[
                vec!["Generated".to_string(), Utc::now().to_rfc3339()],
                vec!["Rows".to_string(), rows.to_string()],
            ],
        )?;
    }

    workbook
        .save(path)
        .with_context(|| format!("failed writing workbook to {}", path.display()))?;

    Ok(ExportReport {
        sheets: tables.len(),
        rows,
    })
}

fn watchlist_table_rows(entries: &[WatchlistEntry]) -> Vec<Vec<String>> {
    let mut out = vec![vec!["Player".to_string(), "Notes".to_string()]];
    out.extend(
        entries
            .iter()
            .map(|e| vec![e.player.clone(), e.notes.clone()]),
    );
    out
}

pub fn export_watchlist(path: &Path, entries: &[WatchlistEntry]) -> Result<ExportReport> {
    let mut workbook = Workbook::new();
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Watchlist")?;
        write_rows(sheet, &watchlist_table_rows(entries))?;
    }
    workbook
        .save(path)
        .with_context(|| format!("failed writing workbook to {}", path.display()))?;
    Ok(ExportReport {
        sheets: 1,
        rows: entries.len(),
    })
}

fn write_table(worksheet: &mut Worksheet, table: &PlayerTable) -> Result<()> {
    for (col_idx, name) in table.schema().names().enumerate() {
        worksheet
            .write_string(0, col_idx as u16, name)
            .with_context(|| format!("write header {name}"))?;
    }
    for (row_idx, record) in table.records().iter().enumerate() {
        let row = row_idx as u32 + 1;
        for (col_idx, cell) in record.cells().iter().enumerate() {
            let col = col_idx as u16;
            let written = match cell {
                Cell::Number(Some(v)) => worksheet.write_number(row, col, *v),
                Cell::Number(None) => continue,
                Cell::Text(s) => worksheet.write_string(row, col, s),
            };
            written.with_context(|| format!("write cell ({row},{col})"))?;
        }
    }
    Ok(())
}

fn write_rows(worksheet: &mut Worksheet, rows: &[Vec<String>]) -> Result<()> {
    for (row_idx, row) in rows.iter().enumerate() {
        for (col_idx, value) in row.iter().enumerate() {
            worksheet
                .write_string(row_idx as u32, col_idx as u16, value)
                .with_context(|| format!("write cell ({row_idx},{col_idx})"))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::read_table_from;

    #[test]
    fn writes_one_sheet_per_table() {
        let table = read_table_from("Player,Gls,Note\nA,3,\nB,,x\n".as_bytes()).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("search.xlsx");
        let report = export_tables(&path, &[("Search", &table), ("Again", &table)]).unwrap();
        assert_eq!(report.sheets, 2);
        assert_eq!(report.rows, 4);
        assert!(path.metadata().unwrap().len() > 0);
    }

    #[test]
    fn watchlist_rows_start_with_header() {
        let rows = watchlist_table_rows(&[WatchlistEntry::new("A", "n")]);
        assert_eq!(rows[0], vec!["Player", "Notes"]);
        assert_eq!(rows[1], vec!["A", "n"]);
        let dir = tempfile::tempdir().unwrap();
        let report = export_watchlist(&dir.path().join("w.xlsx"), &[]).unwrap();
        assert_eq!(report.rows, 0);
    }
}
