use std::path::PathBuf;

use scoutbase::dashboard::{HISTOGRAM_BINS, TOP_N, dashboard, histogram, top_by};
use scoutbase::dataset::{read_table, read_table_from};
use scoutbase::table::PlayerTable;

fn fixture_table() -> PlayerTable {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push("players.csv");
    read_table(&path).expect("fixture should load")
}

fn names(table: &PlayerTable) -> Vec<String> {
    table.iter().map(|row| row.name().into_owned()).collect()
}

#[test]
fn leaderboards_take_the_top_five() {
    let table = fixture_table();
    let overview = dashboard(&table);
    assert_eq!(overview.players, table.len());
    let metrics: Vec<&str> = overview.leaderboards.iter().map(|b| b.metric).collect();
    assert_eq!(metrics, vec!["Gls", "Ast", "xG+xAG"]);

    let goals = &overview.leaderboards[0].rows;
    assert_eq!(goals.len(), TOP_N);
    assert_eq!(
        names(goals),
        vec!["Erling Haaland", "Cole Palmer", "Mohamed Salah", "Bukayo Saka", "Martin Ødegaard"]
    );
    let columns: Vec<&str> = goals.schema().names().collect();
    assert_eq!(columns, vec!["Player", "Gls", "Min", "Market Value (M€)"]);

    // Ties keep table order: Salah and Ødegaard both have 10 assists.
    let assists = &overview.leaderboards[1].rows;
    assert_eq!(
        names(assists),
        vec!["Cole Palmer", "Mohamed Salah", "Martin Ødegaard", "Bukayo Saka", "Declan Rice"]
    );
}

#[test]
fn combined_expected_column_is_recomputed() {
    let raw = "Player,Pos,xG,xAG,xG+xAG\nA,FW,1.5,0.5,99\nB,MF,0.25,,\n";
    let table = read_table_from(raw.as_bytes()).unwrap();
    let overview = dashboard(&table);
    let board = overview
        .leaderboards
        .iter()
        .find(|b| b.metric == "xG+xAG")
        .unwrap();
    let values: Vec<Option<f64>> = board.rows.iter().map(|r| r.number("xG+xAG")).collect();
    assert_eq!(values, vec![Some(2.0), Some(0.25)]);
    // Source table is never touched.
    assert_eq!(table.row(0).unwrap().number("xG+xAG"), Some(99.0));
}

#[test]
fn position_averages_are_sorted_and_rounded() {
    let table = fixture_table();
    let averages = dashboard(&table).position_averages.unwrap();
    let positions: Vec<&str> = averages.rows.iter().map(|r| r.position.as_str()).collect();
    assert_eq!(positions, vec!["DF", "FW", "GK", "MF"]);
    assert_eq!(averages.metrics, vec!["Gls", "xG+xAG", "Market Value (M€)"]);
    let forwards = &averages.rows[1];
    // Missing market value counts as zero here.
    assert_eq!(forwards.values, vec![15.5, 21.6, 96.25]);
    let midfield = &averages.rows[3];
    assert_eq!(midfield.values[0], 12.33);
}

#[test]
fn histograms_cover_every_player() {
    let table = fixture_table();
    let overview = dashboard(&table);
    let columns: Vec<&str> = overview.histograms.iter().map(|h| h.column).collect();
    assert_eq!(columns, vec!["Age", "Market Value (M€)"]);
    for h in &overview.histograms {
        assert_eq!(h.bins.len(), HISTOGRAM_BINS);
        assert_eq!(h.bins.iter().map(|b| b.count).sum::<usize>(), table.len());
    }
    assert_eq!(histogram(&[], HISTOGRAM_BINS), Vec::new());
}

#[test]
fn top_by_missing_metric_keeps_table_order() {
    let table = fixture_table();
    let top = top_by(&table, "Nope", 3);
    assert_eq!(names(&top), vec!["Erling Haaland", "Mohamed Salah", "Bukayo Saka"]);
}
