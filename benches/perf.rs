use std::fmt::Write as _;

use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use scoutbase::compare::{compare, comparison_metrics};
use scoutbase::dashboard::dashboard;
use scoutbase::dataset::read_table_from;
use scoutbase::scout::{TierMap, scout, scout_controls};
use scoutbase::search::{Choice, NumRange, SearchFilter, SortSpec, search};
use scoutbase::table::PlayerTable;

const POSITIONS: [&str; 5] = ["FW", "MF", "DF", "GK", "FW,MF"];
const SQUADS: [&str; 6] = ["Arsenal", "Chelsea", "Liverpool", "Everton", "Fulham", "Brentford"];

fn synthetic_table(rows: usize) -> PlayerTable {
    let mut raw = String::from(
        "Rk,Player,Nation,Pos,Squad,Age,MP,Starts,Min,Gls,Ast,G+A,G-PK,PK,xG,npxG,xAG,npxG+xAG,PrgC,PrgP,PrgR,xG+xAG,Market Value (M€)\n",
    );
    for i in 0..rows {
        let goals = (i * 7) % 29;
        let assists = (i * 5) % 13;
        let xg = goals as f64 * 0.9;
        let xag = assists as f64 * 0.8;
        let _ = writeln!(
            raw,
            "{rk},Player {i},eng ENG,\"{pos}\",{squad},{age},{mp},{starts},{min},{goals},{assists},{ga},{goals},0,{xg:.1},{xg:.1},{xag:.1},{np:.1},{i},{i},{i},{sum:.1},{value}",
            rk = i + 1,
            pos = POSITIONS[i % POSITIONS.len()],
            squad = SQUADS[i % SQUADS.len()],
            age = 17 + i % 20,
            mp = 10 + i % 28,
            starts = i % 30,
            min = 300 + (i * 37) % 3000,
            ga = goals + assists,
            np = xg + xag,
            sum = xg + xag,
            value = (i * 13) % 150,
        );
    }
    read_table_from(raw.as_bytes()).expect("synthetic csv")
}

fn bench_search(c: &mut Criterion) {
    let table = synthetic_table(5_000);
    let filter = SearchFilter {
        name_substring: Some("player 1".to_string()),
        position: Choice::parse("FW"),
        age_range: Some(NumRange::new(18.0, 30.0)),
        market_value_range: Some(NumRange::new(0.0, 120.0)),
        sort: Some(SortSpec {
            column: "Gls".to_string(),
            ascending: false,
        }),
        ..SearchFilter::default()
    };
    c.bench_function("search_5k", |b| {
        b.iter(|| search(black_box(&table), black_box(&filter)).expect("valid filter"))
    });
}

fn bench_scout(c: &mut Criterion) {
    let table = synthetic_table(5_000);
    let tiers = TierMap::default();
    let criteria = scout_controls(&table, &Choice::parse("MF"), &tiers).default_criteria();
    c.bench_function("scout_5k", |b| {
        b.iter(|| scout(black_box(&table), black_box(&criteria), &tiers))
    });
}

fn bench_compare(c: &mut Criterion) {
    let table = synthetic_table(5_000);
    let names: Vec<String> = (0..25).map(|i| format!("Player {}", i * 97)).collect();
    let metrics = comparison_metrics(&table);
    c.bench_function("compare_25_of_5k", |b| {
        b.iter(|| compare(black_box(&table), black_box(&names), black_box(&metrics)))
    });
}

fn bench_dashboard(c: &mut Criterion) {
    let table = synthetic_table(5_000);
    c.bench_function("dashboard_5k", |b| b.iter(|| dashboard(black_box(&table))));
}

criterion_group!(benches, bench_search, bench_scout, bench_compare, bench_dashboard);
criterion_main!(benches);
