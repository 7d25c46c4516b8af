use std::collections::HashSet;
use std::sync::Arc;

use crossterm::event::{KeyCode, KeyEvent};
use tracing::warn;

use crate::compare::{Comparison, compare};
use crate::dashboard::{Dashboard, dashboard};
use crate::notice::Notice;
use crate::profile::{PlayerProfile, profile};
use crate::scout::{ScoutControls, ScoutReport, TierMap, scout, scout_controls};
use crate::search::{
    Choice, SearchControls, SearchFilter, SearchResult, SortSpec, search, search_controls,
};
use crate::table::{ASSISTS, GOALS, PROG_CARRIES, PROG_PASSES, PlayerTable, XAG, XG};
use crate::watchlist::{WatchlistEntry, WatchlistStore};

/// Metrics charted on the compare screen, when present.
pub const COMPARE_METRICS: [&str; 6] = [GOALS, ASSISTS, XG, XAG, PROG_CARRIES, PROG_PASSES];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Search,
    Scout,
    Compare,
    Profile,
    Dashboard,
    Watchlist,
}

impl Screen {
    pub const ALL: [Screen; 6] = [
        Screen::Search,
        Screen::Scout,
        Screen::Compare,
        Screen::Profile,
        Screen::Dashboard,
        Screen::Watchlist,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Screen::Search => "Search",
            Screen::Scout => "Scout",
            Screen::Compare => "Compare",
            Screen::Profile => "Profile",
            Screen::Dashboard => "Dashboard",
            Screen::Watchlist => "Watchlist",
        }
    }
}

/// Interactive session state. The table is read once; only the watchlist is
/// written from here.
pub struct App {
    table: Arc<PlayerTable>,
    watchlist: WatchlistStore,
    tiers: TierMap,
    controls: SearchControls,
    overview: Dashboard,
    pub screen: Screen,
    pub should_quit: bool,
    pub help_overlay: bool,
    pub status: Option<String>,
    pub filter: SearchFilter,
    position_idx: usize,
    squad_idx: usize,
    sort_idx: usize,
    scout_idx: usize,
    pub selected: usize,
    pub compare_names: Vec<String>,
    pub profile_name: Option<String>,
    pub entries: Vec<WatchlistEntry>,
}

impl App {
    pub fn new(table: Arc<PlayerTable>, watchlist: WatchlistStore) -> anyhow::Result<Self> {
        let controls = search_controls(&table);
        let filter = controls.default_filter();
        let overview = dashboard(&table);
        let entries = watchlist.list()?;
        Ok(Self {
            table,
            watchlist,
            tiers: TierMap::default(),
            controls,
            overview,
            screen: Screen::Search,
            should_quit: false,
            help_overlay: false,
            status: None,
            filter,
            position_idx: 0,
            squad_idx: 0,
            sort_idx: 0,
            scout_idx: 0,
            selected: 0,
            compare_names: Vec::new(),
            profile_name: None,
            entries,
        })
    }

    pub fn table(&self) -> &PlayerTable {
        &self.table
    }

    pub fn search_result(&self) -> SearchResult {
        match search(&self.table, &self.filter) {
            Ok(result) => result,
            Err(err) => {
                warn!(%err, "search filter rejected");
                SearchResult {
                    total: 0,
                    rows: self.table.subset(&[]),
                    notice: Some(Notice::NoMatches),
                }
            }
        }
    }

    pub fn scout_target(&self) -> Choice {
        self.controls
            .positions
            .get(self.scout_idx)
            .map(|label| Choice::parse(label))
            .unwrap_or_default()
    }

    pub fn scout_controls(&self) -> ScoutControls {
        scout_controls(&self.table, &self.scout_target(), &self.tiers)
    }

    pub fn scout_report(&self) -> ScoutReport {
        let criteria = self.scout_controls().default_criteria();
        scout(&self.table, &criteria, &self.tiers)
    }

    pub fn comparison(&self) -> Comparison {
        let metrics: Vec<String> = self
            .table
            .schema()
            .present(&COMPARE_METRICS)
            .into_iter()
            .map(str::to_string)
            .collect();
        compare(&self.table, &self.compare_names, &metrics)
    }

    pub fn profile(&self) -> Option<PlayerProfile> {
        self.profile_name
            .as_deref()
            .and_then(|name| profile(&self.table, name))
    }

    pub fn overview(&self) -> &Dashboard {
        &self.overview
    }

    /// Player under the cursor on list screens.
    pub fn selected_player(&self) -> Option<String> {
        match self.screen {
            Screen::Search => self
                .search_result()
                .rows
                .row(self.selected)
                .map(|row| row.name().into_owned()),
            Screen::Scout => self
                .scout_report()
                .candidates
                .row(self.selected)
                .map(|row| row.name().into_owned()),
            Screen::Compare => self.compare_names.get(self.selected).cloned(),
            Screen::Watchlist => self.entries.get(self.selected).map(|e| e.player.clone()),
            Screen::Profile => self.profile_name.clone(),
            Screen::Dashboard => None,
        }
    }

    fn list_len(&self) -> usize {
        match self.screen {
            Screen::Search => self.search_result().total,
            Screen::Scout => self.scout_report().total,
            Screen::Compare => self.compare_names.len(),
            Screen::Watchlist => self.entries.len(),
            Screen::Profile | Screen::Dashboard => 0,
        }
    }

    pub fn on_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('?') => self.help_overlay = !self.help_overlay,
            KeyCode::Char(c @ '1'..='6') => {
                let idx = c as usize - '1' as usize;
                self.set_screen(Screen::ALL[idx]);
            }
            KeyCode::Char('b') | KeyCode::Esc => {
                if self.help_overlay {
                    self.help_overlay = false;
                } else {
                    self.set_screen(Screen::Search);
                }
            }
            KeyCode::Char('j') | KeyCode::Down => self.select_next(),
            KeyCode::Char('k') | KeyCode::Up => self.select_prev(),
            KeyCode::Char('p') => self.cycle_position(),
            KeyCode::Char('t') => self.cycle_squad(),
            KeyCode::Char('s') => self.cycle_sort(),
            KeyCode::Char('r') => self.toggle_direction(),
            KeyCode::Char('c') => self.toggle_compare(),
            KeyCode::Char('o') | KeyCode::Enter => self.open_profile(),
            KeyCode::Char('w') => self.watch_selected(),
            KeyCode::Char('x') | KeyCode::Delete => self.drop_selected(),
            _ => {}
        }
    }

    fn set_screen(&mut self, screen: Screen) {
        self.screen = screen;
        self.selected = 0;
    }

    fn select_next(&mut self) {
        let len = self.list_len();
        if len > 0 && self.selected + 1 < len {
            self.selected += 1;
        }
    }

    fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    fn clamp_selection(&mut self) {
        let len = self.list_len();
        if self.selected >= len {
            self.selected = len.saturating_sub(1);
        }
    }

    fn cycle_position(&mut self) {
        let count = self.controls.positions.len().max(1);
        match self.screen {
            Screen::Search => {
                self.position_idx = (self.position_idx + 1) % count;
                if let Some(label) = self.controls.positions.get(self.position_idx) {
                    self.filter.position = Choice::parse(label);
                }
            }
            Screen::Scout => self.scout_idx = (self.scout_idx + 1) % count,
            _ => return,
        }
        self.selected = 0;
    }

    fn cycle_squad(&mut self) {
        if self.screen != Screen::Search {
            return;
        }
        let count = self.controls.squads.len().max(1);
        self.squad_idx = (self.squad_idx + 1) % count;
        if let Some(label) = self.controls.squads.get(self.squad_idx) {
            self.filter.squad = Choice::parse(label);
        }
        self.selected = 0;
    }

    fn cycle_sort(&mut self) {
        if self.screen != Screen::Search || self.controls.sort_columns.is_empty() {
            return;
        }
        self.sort_idx = (self.sort_idx + 1) % self.controls.sort_columns.len();
        let ascending = self.filter.sort.as_ref().is_some_and(|s| s.ascending);
        self.filter.sort = Some(SortSpec {
            column: self.controls.sort_columns[self.sort_idx].clone(),
            ascending,
        });
    }

    fn toggle_direction(&mut self) {
        if self.screen != Screen::Search {
            return;
        }
        if let Some(sort) = self.filter.sort.as_mut() {
            sort.ascending = !sort.ascending;
        }
    }

    fn toggle_compare(&mut self) {
        let Some(name) = self.selected_player() else {
            return;
        };
        if let Some(pos) = self.compare_names.iter().position(|n| *n == name) {
            self.compare_names.remove(pos);
            self.status = Some(format!("{name} removed from comparison"));
        } else {
            self.status = Some(format!("{name} added to comparison"));
            self.compare_names.push(name);
        }
        if self.screen == Screen::Compare {
            self.clamp_selection();
        }
    }

    fn open_profile(&mut self) {
        if let Some(name) = self.selected_player() {
            self.profile_name = Some(name);
            self.set_screen(Screen::Profile);
        }
    }

    fn watch_selected(&mut self) {
        if self.screen == Screen::Watchlist {
            return;
        }
        let Some(name) = self.selected_player() else {
            return;
        };
        match self.watchlist.add(&name, "") {
            Ok(entries) => {
                self.entries = entries;
                self.status = Some(format!("{name} added to watchlist"));
            }
            Err(err) => {
                warn!(error = %format!("{err:#}"), "watchlist add failed");
                self.status = Some(format!("watchlist not saved: {err}"));
            }
        }
    }

    fn drop_selected(&mut self) {
        match self.screen {
            Screen::Watchlist => {
                let Some(name) = self.selected_player() else {
                    return;
                };
                let names: HashSet<String> = HashSet::from([name.clone()]);
                match self.watchlist.remove(&names) {
                    Ok(entries) => {
                        self.entries = entries;
                        self.status = Some(format!("{name} removed from watchlist"));
                        self.clamp_selection();
                    }
                    Err(err) => {
                        warn!(error = %format!("{err:#}"), "watchlist remove failed");
                        self.status = Some(format!("watchlist not saved: {err}"));
                    }
                }
            }
            Screen::Compare => self.toggle_compare(),
            _ => {}
        }
    }
}
