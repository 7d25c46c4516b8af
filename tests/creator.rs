use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use scoutbase::creator::{NewPlayer, append_player, build_record};
use scoutbase::dataset::{DatasetStore, read_table, read_table_from};
use scoutbase::table::{Cell, PlayerTable};

fn fixture_path() -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push("players.csv");
    path
}

fn copy_fixture(dir: &Path) -> PathBuf {
    let target = dir.join("players.csv");
    fs::copy(fixture_path(), &target).expect("fixture should copy");
    target
}

fn last_row_number(table: &PlayerTable, column: &str) -> Option<f64> {
    table.row(table.len() - 1).and_then(|row| row.number(column))
}

#[test]
fn append_then_reload_adds_one_row_with_derived_columns() {
    let dir = tempfile::tempdir().unwrap();
    let path = copy_fixture(dir.path());
    let store = DatasetStore::new(&path);
    let before = store.table().unwrap();

    let player = NewPlayer {
        name: "Nuevo Talento".to_string(),
        squad: "Brighton".to_string(),
        position: "FW".to_string(),
        age: 19,
        minutes: 1500,
        goals: 10,
        assists: 5,
        non_penalty_goals: 9,
        xg: 8.25,
        xag: 3.5,
        npxg: 7.5,
        market_value: 22.0,
        ..NewPlayer::default()
    };
    let outcome = append_player(&store, &player).unwrap();
    assert_eq!(outcome.rows, before.len() + 1);

    // The store was invalidated, so this reads the rewritten file.
    let after = store.table().unwrap();
    assert_eq!(after.len(), before.len() + 1);
    assert_eq!(after.schema(), before.schema());
    assert_eq!(read_table(&path).unwrap().len(), before.len() + 1);

    let row = after.row(after.len() - 1).unwrap();
    assert_eq!(row.name(), "Nuevo Talento");
    assert_eq!(row.squad(), "Brighton");
    assert_eq!(row.position(), "FW");
    assert_eq!(row.number("Age"), Some(19.0));
    assert_eq!(row.number("Gls"), Some(10.0));
    assert_eq!(row.number("G+A"), Some(15.0));
    assert_eq!(row.number("PK"), Some(1.0));
    assert_eq!(row.number("G+A-PK"), Some(14.0));
    assert_eq!(row.number("xG+xAG"), Some(11.75));
    assert_eq!(row.number("npxG+xAG"), Some(11.0));
    assert_eq!(row.number("Rk"), Some(11.0));
    // Columns the form does not cover default to zero.
    assert_eq!(row.number("PrgC"), Some(0.0));

    // Existing rows survive the rewrite untouched.
    assert_eq!(after.records()[..before.len()], before.records()[..]);
    assert!(!dir.path().join("players.csv.tmp").exists());
}

#[test]
fn second_append_continues_the_rank() {
    let dir = tempfile::tempdir().unwrap();
    let path = copy_fixture(dir.path());
    let store = DatasetStore::new(&path);
    append_player(&store, &NewPlayer { name: "A".to_string(), ..NewPlayer::default() }).unwrap();
    append_player(&store, &NewPlayer { name: "B".to_string(), ..NewPlayer::default() }).unwrap();
    let table = store.table().unwrap();
    assert_eq!(last_row_number(&table, "Rk"), Some(12.0));
    assert_eq!(last_row_number(&table, "Age"), Some(18.0));
}

#[test]
fn extra_columns_default_by_kind() {
    let raw = "Rk,Player,Pos,Gls,Ast,Height,Comment\n\
               4,Old,FW,3,1,181,fast\n";
    let table = read_table_from(raw.as_bytes()).unwrap();
    let player = NewPlayer {
        name: "New".to_string(),
        goals: 2,
        ..NewPlayer::default()
    };
    let record = build_record(&table, &player);
    let cells = record.cells();
    assert_eq!(cells.len(), table.schema().len());
    assert_eq!(cells[0].number(), Some(5.0));
    assert_eq!(cells[1], Cell::Text("New".to_string()));
    assert_eq!(cells[3], Cell::Number(Some(2.0)));
    assert_eq!(cells[5].render(), "0");
    assert_eq!(cells[6], Cell::Text(String::new()));
}

#[test]
fn append_to_missing_file_fails_with_context() {
    let dir = tempfile::tempdir().unwrap();
    let store = DatasetStore::new(dir.path().join("absent.csv"));
    let err = append_player(&store, &NewPlayer::default()).unwrap_err();
    assert!(format!("{err:#}").contains("absent.csv"));
}

#[test]
fn blank_extra_column_defaults_to_zero() {
    let raw = "Rk,Player,Gls,Scouted\n\
               1,Old,3,\n";
    let table = read_table_from(raw.as_bytes()).unwrap();
    let record = build_record(&table, &NewPlayer { name: "New".to_string(), ..NewPlayer::default() });
    assert_eq!(record.cells()[3].render(), "0");
}

#[test]
fn cached_table_is_reused_until_invalidated() {
    let dir = tempfile::tempdir().unwrap();
    let path = copy_fixture(dir.path());
    let store = DatasetStore::new(&path);

    let first = store.table().unwrap();
    let second = store.table().unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(first.len(), 10);

    fs::write(&path, "Rk,Player,Pos\n1,Solo,FW\n").unwrap();
    assert_eq!(store.table().unwrap().len(), 10);

    store.invalidate();
    let reloaded = store.table().unwrap();
    assert!(!Arc::ptr_eq(&first, &reloaded));
    assert_eq!(reloaded.len(), 1);
    assert_eq!(reloaded.row(0).unwrap().name(), "Solo");
}
