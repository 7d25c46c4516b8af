use std::path::PathBuf;

use scoutbase::dataset::{read_table, read_table_from};
use scoutbase::notice::Notice;
use scoutbase::profile::{group_means, profile};
use scoutbase::table::{GOALS, MARKET_VALUE, PlayerTable};

fn fixture_table() -> PlayerTable {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push("players.csv");
    read_table(&path).expect("fixture should load")
}

fn baseline(profile: &scoutbase::profile::PlayerProfile, metric: &str) -> (Option<f64>, f64) {
    let entry = profile
        .baseline
        .iter()
        .find(|b| b.metric == metric)
        .expect("metric should be profiled");
    (entry.player, entry.group_average)
}

#[test]
fn profile_compares_against_position_group() {
    let table = fixture_table();
    let found = profile(&table, "Erling Haaland").expect("player exists");
    assert_eq!(found.group, "FW");
    assert_eq!(found.group_size, 4);
    assert!(found.radar_ready());
    assert_eq!(found.notice, None);

    let (own, average) = baseline(&found, GOALS);
    assert_eq!(own, Some(27.0));
    assert_eq!(average, 15.5);

    // The youngster has no market value and is left out of that mean.
    let (_, average) = baseline(&found, MARKET_VALUE);
    assert!((average - 385.0 / 3.0).abs() < 1e-9);
}

#[test]
fn empty_position_falls_back_to_whole_dataset() {
    let table = fixture_table();
    let found = profile(&table, "Unknown Role").expect("player exists");
    assert_eq!(found.group, "All");
    assert_eq!(found.group_size, table.len());
    let (_, average) = baseline(&found, GOALS);
    assert!((average - 10.1).abs() < 1e-9);
}

#[test]
fn card_and_stats_are_single_row_projections() {
    let table = fixture_table();
    let found = profile(&table, "Cole Palmer").unwrap();
    assert_eq!(found.card.len(), 1);
    let card_columns: Vec<&str> = found.card.schema().names().collect();
    assert_eq!(card_columns, vec!["Player", "Age", "Pos", "Squad", "Market Value (M€)"]);
    assert_eq!(found.stats.len(), 1);
    assert!(!found.stats.has_column("CrdY"));
    assert_eq!(found.baseline.len(), found.stats.schema().len());
}

#[test]
fn unknown_player_has_no_profile() {
    let table = fixture_table();
    assert!(profile(&table, "Nobody").is_none());
    assert!(profile(&table, "erling haaland").is_none());
}

#[test]
fn too_few_metrics_flags_the_radar() {
    let raw = "Player,Pos,Gls,Ast\nA,FW,1,2\nB,FW,3,\n";
    let table = read_table_from(raw.as_bytes()).unwrap();
    let found = profile(&table, "A").unwrap();
    assert!(!found.radar_ready());
    assert_eq!(found.notice, Some(Notice::NotEnoughMetrics));
    assert_eq!(group_means(&table, Some("FW"), &["Gls", "Ast"]), (2, vec![2.0, 2.0]));
}
