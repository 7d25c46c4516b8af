use std::collections::HashSet;
use std::fs;
use std::io::{self, Write};
use std::path::Path;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::{Backend, CrosstermBackend};
use serde::Serialize;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use scoutbase::app::App;
use scoutbase::cli::{self, Command, Invocation, USAGE, WatchlistAction};
use scoutbase::config::{DEFAULT_LOG_FILTER, Settings};
use scoutbase::dataset::{DatasetStore, shared_store};
use scoutbase::export::{ExportReport, export_tables, export_watchlist};
use scoutbase::scout::{TierMap, scout, scout_controls};
use scoutbase::search::{search, search_controls};
use scoutbase::watchlist::WatchlistStore;
use scoutbase::render::{self, Stack};
use scoutbase::{compare, creator, dashboard, profile};

fn main() -> Result<()> {
    let settings = Settings::from_env();
    init_logging(&settings.log_filter);

    let invocation = cli::parse_invocation(std::env::args().skip(1))?;
    let data_path = invocation
        .data
        .clone()
        .unwrap_or_else(|| settings.data_path.clone());
    let watchlist_path = invocation
        .watchlist
        .clone()
        .unwrap_or_else(|| settings.watchlist_path.clone());
    debug!(data = %data_path.display(), watchlist = %watchlist_path.display(), "resolved paths");

    let store = shared_store(&data_path);
    let watchlist = WatchlistStore::new(watchlist_path);
    run(&invocation, store, &watchlist)
}

fn init_logging(filter: &str) {
    let filter = EnvFilter::try_new(filter).unwrap_or_else(|err| {
        eprintln!("invalid log filter `{filter}`: {err}");
        EnvFilter::new(DEFAULT_LOG_FILTER)
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run(invocation: &Invocation, store: &DatasetStore, watchlist: &WatchlistStore) -> Result<()> {
    let json = invocation.json;
    match &invocation.command {
        Command::Help => {
            println!("{USAGE}");
        }
        Command::Ui => run_ui(store, watchlist)?,
        Command::Controls => {
            let table = store.table()?;
            let controls = search_controls(&table);
            let scout = scout_controls(&table, &Default::default(), &TierMap::default());
            #[derive(Serialize)]
            struct Controls<'a> {
                search: &'a scoutbase::search::SearchControls,
                scout: &'a scoutbase::scout::ScoutControls,
            }
            emit(
                json,
                &Controls {
                    search: &controls,
                    scout: &scout,
                },
                || render::controls_view(&controls, &scout),
            )?;
        }
        Command::Search { args, xlsx } => {
            let table = store.table()?;
            let mut filter = search_controls(&table).default_filter();
            args.apply_to(&mut filter);
            let result = search(&table, &filter)?;
            if let Some(path) = xlsx {
                report_export(path, export_tables(path, &[("Search", &result.rows)])?);
            }
            emit(json, &result, || render::search_view(&result))?;
        }
        Command::Compare { players, metrics } => {
            let table = store.table()?;
            let metrics = if metrics.is_empty() {
                compare::comparison_metrics(&table)
            } else {
                metrics.clone()
            };
            let comparison = compare::compare(&table, players, &metrics);
            emit(json, &comparison, || render::comparison_view(&comparison))?;
        }
        Command::Scout { args, xlsx } => {
            let table = store.table()?;
            let tiers = TierMap::default();
            let mut criteria = scout_controls(&table, &args.target, &tiers).default_criteria();
            args.apply_to(&mut criteria);
            let report = scout(&table, &criteria, &tiers);
            if let Some(path) = xlsx {
                report_export(path, export_tables(path, &[("Scout", &report.candidates)])?);
            }
            emit(json, &report, || render::scout_view(&report))?;
        }
        Command::Profile { player } => {
            let table = store.table()?;
            match profile::profile(&table, player) {
                Some(found) => emit(json, &found, || render::profile_view(&found))?,
                None => {
                    let notice = scoutbase::notice::Notice::PlayerNotFound;
                    emit(json, &notice, || Stack::message(notice.message()))?;
                }
            }
        }
        Command::Dashboard { xlsx } => {
            let table = store.table()?;
            let overview = dashboard::dashboard(&table);
            if let Some(path) = xlsx {
                let names: Vec<String> = overview
                    .leaderboards
                    .iter()
                    .map(|board| format!("Top {}", board.metric))
                    .collect();
                let sheets: Vec<(&str, &scoutbase::table::PlayerTable)> = names
                    .iter()
                    .zip(&overview.leaderboards)
                    .map(|(name, board)| (name.as_str(), &board.rows))
                    .collect();
                report_export(path, export_tables(path, &sheets)?);
            }
            emit(json, &overview, || render::dashboard_view(&overview))?;
        }
        Command::AddPlayer(player) => {
            if player.name.trim().is_empty() {
                warn!("adding a player with an empty name");
            }
            let outcome = creator::append_player(store, player)?;
            emit(json, &outcome, || {
                Stack::message(format!(
                    "added {} ({} players in {})",
                    outcome.player,
                    outcome.rows,
                    store.path().display()
                ))
            })?;
        }
        Command::Watchlist(action) => run_watchlist(action, watchlist, json)?,
    }
    Ok(())
}

fn run_watchlist(action: &WatchlistAction, watchlist: &WatchlistStore, json: bool) -> Result<()> {
    match action {
        WatchlistAction::List => {
            let entries = watchlist.list()?;
            emit(json, &entries, || render::watchlist_view(&entries))?;
        }
        WatchlistAction::Add { player, note } => {
            let entries = watchlist.add(player, note)?;
            emit(json, &entries, || render::watchlist_view(&entries))?;
        }
        WatchlistAction::Remove(names) => {
            let names: HashSet<String> = names.iter().cloned().collect();
            let entries = watchlist.remove(&names)?;
            emit(json, &entries, || render::watchlist_view(&entries))?;
        }
        WatchlistAction::Export { out } => match out {
            Some(path) if has_extension(path, "xlsx") => {
                let entries = watchlist.list()?;
                report_export(path, export_watchlist(path, &entries)?);
            }
            Some(path) => {
                let bytes = watchlist.export_csv()?;
                fs::write(path, &bytes)
                    .with_context(|| format!("write watchlist export {}", path.display()))?;
                eprintln!("wrote {}", path.display());
            }
            None => {
                let bytes = watchlist.export_csv()?;
                io::stdout()
                    .write_all(&bytes)
                    .context("write watchlist export to stdout")?;
            }
        },
    }
    Ok(())
}

fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(ext))
}

fn report_export(path: &Path, report: ExportReport) {
    eprintln!(
        "wrote {} ({} sheets, {} rows)",
        path.display(),
        report.sheets,
        report.rows
    );
}

fn emit<T: Serialize>(json: bool, value: &T, view: impl FnOnce() -> Stack) -> Result<()> {
    if json {
        let mut stdout = io::stdout().lock();
        serde_json::to_writer_pretty(&mut stdout, value).context("encode json output")?;
        writeln!(stdout)?;
    } else {
        render::print_stack(view()).context("draw output")?;
    }
    Ok(())
}

fn run_ui(store: &DatasetStore, watchlist: &WatchlistStore) -> Result<()> {
    let mut app = App::new(store.table()?, watchlist.clone())?;

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("error: {err}");
    }
    Ok(())
}

fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> io::Result<()> {
    let tick_rate = Duration::from_millis(250);
    let mut last_tick = Instant::now();

    loop {
        terminal.draw(|f| render::ui(f, app))?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or(Duration::ZERO);
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.on_key(key);
                }
            }
        }

        if last_tick.elapsed() >= tick_rate {
            last_tick = Instant::now();
        }

        if app.should_quit {
            return Ok(());
        }
    }
}
