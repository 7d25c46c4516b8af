use std::path::PathBuf;

use scoutbase::compare::{COMPARISON_COLUMNS, compare, comparison_metrics};
use scoutbase::dataset::read_table;
use scoutbase::notice::Notice;
use scoutbase::table::PlayerTable;

fn fixture_table() -> PlayerTable {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push("players.csv");
    read_table(&path).expect("fixture should load")
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[test]
fn normalized_maximum_is_exactly_one_hundred() {
    let table = fixture_table();
    let players = strings(&["Bukayo Saka", "Erling Haaland", "Mohamed Salah"]);
    let metrics = strings(&["Gls", "Ast", "xG"]);
    let result = compare(&table, &players, &metrics);

    assert_eq!(result.selected, 3);
    assert!(result.notices.is_empty());
    let normalized = result.normalized.expect("three metrics make a radar");
    assert_eq!(normalized.metrics, metrics);
    assert_eq!(normalized.value("Erling Haaland", "Gls"), Some(100.0));
    assert_eq!(normalized.value("Mohamed Salah", "Ast"), Some(100.0));
    assert_eq!(normalized.value("Erling Haaland", "xG"), Some(100.0));

    for (col, metric) in metrics.iter().enumerate() {
        let raw: Vec<f64> = normalized
            .rows
            .iter()
            .map(|row| result.raw.value(&row.player, metric).unwrap())
            .collect();
        let scaled: Vec<f64> = normalized.rows.iter().map(|row| row.values[col]).collect();
        for i in 0..raw.len() {
            for j in 0..raw.len() {
                if raw[i] < raw[j] {
                    assert!(scaled[i] < scaled[j], "{metric} order changed");
                }
            }
        }
        assert!(scaled.iter().all(|v| (0.0..=100.0).contains(v)));
    }
}

#[test]
fn selection_keeps_table_order_and_all_columns() {
    let table = fixture_table();
    let players = strings(&["Mohamed Salah", "Erling Haaland"]);
    let result = compare(&table, &players, &strings(&["Gls", "Ast", "xAG"]));
    let order: Vec<&str> = result.raw.rows.iter().map(|r| r.player.as_str()).collect();
    assert_eq!(order, vec!["Erling Haaland", "Mohamed Salah"]);
    assert_eq!(result.raw.metrics, comparison_metrics(&table));
    assert!(result.raw.metrics.len() < COMPARISON_COLUMNS.len());
    assert_eq!(result.raw.value("Mohamed Salah", "Min"), Some(2532.0));
}

#[test]
fn bars_are_metric_major() {
    let table = fixture_table();
    let players = strings(&["Erling Haaland", "Bukayo Saka"]);
    let result = compare(&table, &players, &strings(&["Gls", "Bogus", "Ast", "xG"]));
    let pairs: Vec<(&str, &str)> = result
        .bars
        .iter()
        .map(|r| (r.metric.as_str(), r.player.as_str()))
        .collect();
    assert_eq!(
        pairs,
        vec![
            ("Gls", "Erling Haaland"),
            ("Gls", "Bukayo Saka"),
            ("Ast", "Erling Haaland"),
            ("Ast", "Bukayo Saka"),
            ("xG", "Erling Haaland"),
            ("xG", "Bukayo Saka"),
        ]
    );
    let scatter = result.scatter.expect("xG, Gls and Min are present");
    assert_eq!(scatter.len(), 2);
    assert_eq!(scatter[0].goals, 27.0);
    assert_eq!(scatter[1].minutes, 2929.0);
}

#[test]
fn fewer_than_three_metrics_skips_the_radar() {
    let table = fixture_table();
    let result = compare(&table, &strings(&["Cole Palmer"]), &strings(&["Gls", "Ast"]));
    assert!(result.normalized.is_none());
    assert_eq!(result.notices, vec![Notice::NotEnoughMetrics]);
    assert_eq!(result.bars.len(), 2);
}

#[test]
fn unknown_players_select_nothing() {
    let table = fixture_table();
    let result = compare(&table, &strings(&["Nobody"]), &strings(&["Gls", "Ast", "xG"]));
    assert_eq!(result.selected, 0);
    assert!(result.raw.rows.is_empty());
    assert!(result.bars.is_empty());
    assert!(result.notices.contains(&Notice::NoMatches));
}

#[test]
fn all_zero_metric_normalizes_to_zero() {
    let table = fixture_table();
    let result = compare(&table, &strings(&["Alisson"]), &strings(&["Gls", "Ast", "PK"]));
    let normalized = result.normalized.unwrap();
    assert_eq!(normalized.rows[0].values, vec![0.0, 0.0, 0.0]);
}
