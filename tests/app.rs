use std::path::{Path, PathBuf};
use std::sync::Arc;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::Terminal;
use ratatui::backend::TestBackend;

use scoutbase::app::{App, Screen};
use scoutbase::dataset::read_table;
use scoutbase::render;
use scoutbase::watchlist::WatchlistStore;

fn fixture_app(dir: &Path) -> App {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push("players.csv");
    let table = read_table(&path).expect("fixture should load");
    let watchlist = WatchlistStore::new(dir.join("watchlist.csv"));
    App::new(Arc::new(table), watchlist).expect("app should start")
}

fn press(app: &mut App, code: KeyCode) {
    app.on_key(KeyEvent::new(code, KeyModifiers::NONE));
}

fn screen_text(app: &App) -> String {
    let mut terminal = Terminal::new(TestBackend::new(200, 50)).unwrap();
    terminal.draw(|f| render::ui(f, app)).unwrap();
    render::buffer_text(terminal.backend().buffer())
}

#[test]
fn number_keys_switch_screens() {
    let dir = tempfile::tempdir().unwrap();
    let mut app = fixture_app(dir.path());
    assert_eq!(app.screen, Screen::Search);

    press(&mut app, KeyCode::Char('5'));
    assert_eq!(app.screen, Screen::Dashboard);
    press(&mut app, KeyCode::Char('2'));
    assert_eq!(app.screen, Screen::Scout);
    press(&mut app, KeyCode::Esc);
    assert_eq!(app.screen, Screen::Search);

    press(&mut app, KeyCode::Char('?'));
    assert!(app.help_overlay);
    press(&mut app, KeyCode::Esc);
    assert!(!app.help_overlay);
    assert_eq!(app.screen, Screen::Search);

    press(&mut app, KeyCode::Char('q'));
    assert!(app.should_quit);
}

#[test]
fn selection_stays_inside_the_result() {
    let dir = tempfile::tempdir().unwrap();
    let mut app = fixture_app(dir.path());
    let total = app.search_result().total;
    assert_eq!(total, 9);

    press(&mut app, KeyCode::Up);
    assert_eq!(app.selected, 0);
    for _ in 0..20 {
        press(&mut app, KeyCode::Char('j'));
    }
    assert_eq!(app.selected, total - 1);

    // Cycling a filter starts the list over.
    press(&mut app, KeyCode::Char('p'));
    assert_eq!(app.selected, 0);
    assert_eq!(app.filter.position.label(), "DF");
    assert_eq!(app.search_result().total, 1);
}

#[test]
fn compare_then_open_profile() {
    let dir = tempfile::tempdir().unwrap();
    let mut app = fixture_app(dir.path());
    let first = app.selected_player().unwrap();
    press(&mut app, KeyCode::Char('c'));
    press(&mut app, KeyCode::Char('j'));
    let second = app.selected_player().unwrap();
    press(&mut app, KeyCode::Char('c'));
    assert_eq!(app.compare_names, vec![first.clone(), second.clone()]);
    assert_eq!(app.comparison().raw.rows.len(), 2);

    press(&mut app, KeyCode::Char('3'));
    press(&mut app, KeyCode::Char('x'));
    assert_eq!(app.compare_names, vec![second.clone()]);

    press(&mut app, KeyCode::Enter);
    assert_eq!(app.screen, Screen::Profile);
    assert_eq!(app.profile_name.as_deref(), Some(second.as_str()));
    assert_eq!(app.profile().map(|p| p.player), Some(second));
}

#[test]
fn watch_key_persists_and_removes() {
    let dir = tempfile::tempdir().unwrap();
    let mut app = fixture_app(dir.path());
    let name = app.selected_player().unwrap();

    press(&mut app, KeyCode::Char('w'));
    assert_eq!(app.entries.len(), 1);
    let saved = WatchlistStore::new(dir.path().join("watchlist.csv")).list().unwrap();
    assert_eq!(saved[0].player, name);

    press(&mut app, KeyCode::Char('6'));
    assert_eq!(app.selected_player(), Some(name));
    press(&mut app, KeyCode::Delete);
    assert!(app.entries.is_empty());
    assert!(WatchlistStore::new(dir.path().join("watchlist.csv")).list().unwrap().is_empty());
}

#[test]
fn draws_the_active_screen() {
    let dir = tempfile::tempdir().unwrap();
    let mut app = fixture_app(dir.path());

    let text = screen_text(&app);
    assert!(text.contains("SCOUTBASE"));
    assert!(text.contains("9 players"));
    assert!(text.contains("Erling Haaland"));

    press(&mut app, KeyCode::Char('5'));
    let text = screen_text(&app);
    assert!(text.contains("Top Gls"));
    assert!(text.contains("Averages by position"));

    press(&mut app, KeyCode::Char('6'));
    assert!(screen_text(&app).contains("Your watchlist is empty."));
}
