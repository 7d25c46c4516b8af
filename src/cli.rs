use std::collections::HashSet;
use std::path::PathBuf;

use anyhow::{Context, Result, anyhow, bail};

use crate::creator::NewPlayer;
use crate::scout::ScoutCriteria;
use crate::search::{Choice, NumRange, SearchFilter, SortSpec};

/// Flags that never take a value.
const SWITCHES: [&str; 3] = ["asc", "json", "help"];

pub const USAGE: &str = "\
usage: scoutbase [--data PATH] [--watchlist PATH] [--json] <command> [options]

commands:
  ui          interactive browser (1-6 switch screens, ? for keys)
  search      [--name TEXT] [--squad NAME] [--pos CODE] [--age MIN:MAX]
              [--value MIN:MAX] [--sort COLUMN] [--asc] [--xlsx PATH]
  controls    show filter options and slider bounds
  compare     --player NAME [--player NAME ...] [--metric COLUMN ...]
  scout       [--pos CODE] [--max-age N] [--min-minutes N] [--max-value N]
              [--primary N] [--secondary N] [--xlsx PATH]
  profile     NAME
  dashboard   [--xlsx PATH]
  add-player  --name NAME [--squad S] [--age N] [--pos P] [--nation N] [--born Y]
              [--mp N] [--starts N] [--min N] [--goals N] [--assists N] [--npg N]
              [--xg F] [--xag F] [--npxg F] [--value F]
  watchlist   list | add NAME [--note TEXT] | remove NAME... | export [--out PATH]";

/// Flat view over `--key value`, `--key=value`, switches and positionals.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArgList {
    positionals: Vec<String>,
    options: Vec<(String, String)>,
    switches: HashSet<String>,
}

impl ArgList {
    pub fn parse<I: IntoIterator<Item = String>>(args: I) -> Result<Self> {
        let mut out = ArgList::default();
        let mut iter = args.into_iter();
        while let Some(arg) = iter.next() {
            let Some(flag) = arg.strip_prefix("--") else {
                out.positionals.push(arg);
                continue;
            };
            if let Some((key, value)) = flag.split_once('=') {
                out.options.push((key.to_string(), value.to_string()));
            } else if SWITCHES.contains(&flag) {
                out.switches.insert(flag.to_string());
            } else {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("--{flag} expects a value"))?;
                out.options.push((flag.to_string(), value));
            }
        }
        Ok(out)
    }

    /// Last occurrence wins.
    pub fn value(&self, name: &str) -> Option<&str> {
        self.options
            .iter()
            .rev()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn values(&self, name: &str) -> Vec<String> {
        self.options
            .iter()
            .filter(|(key, _)| key == name)
            .map(|(_, value)| value.clone())
            .collect()
    }

    pub fn switch(&self, name: &str) -> bool {
        self.switches.contains(name)
    }

    pub fn positionals(&self) -> &[String] {
        &self.positionals
    }

    pub fn number(&self, name: &str) -> Result<Option<f64>> {
        self.value(name)
            .map(|raw| {
                raw.trim()
                    .parse::<f64>()
                    .with_context(|| format!("--{name}: `{raw}` is not a number"))
            })
            .transpose()
    }

    pub fn count(&self, name: &str) -> Result<Option<u32>> {
        self.value(name)
            .map(|raw| {
                raw.trim()
                    .parse::<u32>()
                    .with_context(|| format!("--{name}: `{raw}` is not a whole number"))
            })
            .transpose()
    }

    pub fn range(&self, name: &str) -> Result<Option<NumRange>> {
        self.value(name)
            .map(|raw| parse_range(raw).with_context(|| format!("--{name}")))
            .transpose()
    }

    pub fn path(&self, name: &str) -> Option<PathBuf> {
        self.value(name).map(PathBuf::from)
    }
}

/// `MIN:MAX` or `MIN..MAX`.
pub fn parse_range(raw: &str) -> Result<NumRange> {
    let (lo, hi) = raw
        .split_once("..")
        .or_else(|| raw.split_once(':'))
        .ok_or_else(|| anyhow!("`{raw}` is not a MIN:MAX range"))?;
    let lo = lo.trim().parse::<f64>().with_context(|| format!("bad lower bound `{lo}`"))?;
    let hi = hi.trim().parse::<f64>().with_context(|| format!("bad upper bound `{hi}`"))?;
    Ok(NumRange::new(lo, hi))
}

/// Search options as typed; anything left out keeps the form default.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchArgs {
    pub name: Option<String>,
    pub squad: Option<Choice>,
    pub position: Option<Choice>,
    pub age: Option<NumRange>,
    pub market_value: Option<NumRange>,
    pub sort: Option<String>,
    pub ascending: bool,
}

impl SearchArgs {
    pub fn apply_to(&self, filter: &mut SearchFilter) {
        if let Some(name) = &self.name {
            filter.name_substring = Some(name.clone());
        }
        if let Some(squad) = &self.squad {
            filter.squad = squad.clone();
        }
        if let Some(position) = &self.position {
            filter.position = position.clone();
        }
        if let Some(age) = self.age {
            filter.age_range = Some(age);
        }
        if let Some(value) = self.market_value {
            filter.market_value_range = Some(value);
        }
        if let Some(column) = &self.sort {
            filter.sort = Some(SortSpec {
                column: column.clone(),
                ascending: self.ascending,
            });
        } else if let Some(sort) = filter.sort.as_mut() {
            sort.ascending = self.ascending;
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScoutArgs {
    pub target: Choice,
    pub max_age: Option<f64>,
    pub min_minutes: Option<f64>,
    pub max_market_value: Option<f64>,
    pub primary_min: Option<f64>,
    pub secondary_min: Option<f64>,
}

impl ScoutArgs {
    pub fn apply_to(&self, criteria: &mut ScoutCriteria) {
        criteria.target = self.target.clone();
        if let Some(v) = self.max_age {
            criteria.max_age = v;
        }
        if let Some(v) = self.min_minutes {
            criteria.min_minutes = v;
        }
        if let Some(v) = self.max_market_value {
            criteria.max_market_value = v;
        }
        if let Some(v) = self.primary_min {
            criteria.primary_min = v;
        }
        if let Some(v) = self.secondary_min {
            criteria.secondary_min = v;
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum WatchlistAction {
    List,
    Add { player: String, note: String },
    Remove(Vec<String>),
    Export { out: Option<PathBuf> },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Search { args: SearchArgs, xlsx: Option<PathBuf> },
    Controls,
    Compare { players: Vec<String>, metrics: Vec<String> },
    Scout { args: ScoutArgs, xlsx: Option<PathBuf> },
    Profile { player: String },
    Dashboard { xlsx: Option<PathBuf> },
    AddPlayer(NewPlayer),
    Watchlist(WatchlistAction),
    Ui,
    Help,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    pub data: Option<PathBuf>,
    pub watchlist: Option<PathBuf>,
    pub json: bool,
    pub command: Command,
}

pub fn parse_invocation<I: IntoIterator<Item = String>>(args: I) -> Result<Invocation> {
    let args = ArgList::parse(args)?;
    let command = parse_command(&args)?;
    Ok(Invocation {
        data: args.path("data"),
        watchlist: args.path("watchlist"),
        json: args.switch("json"),
        command,
    })
}

fn parse_command(args: &ArgList) -> Result<Command> {
    if args.switch("help") {
        return Ok(Command::Help);
    }
    let Some((name, rest)) = args.positionals().split_first() else {
        return Ok(Command::Help);
    };
    let command = match name.as_str() {
        "search" => Command::Search {
            args: SearchArgs {
                name: args.value("name").map(str::to_string),
                squad: args.value("squad").map(Choice::parse),
                position: args.value("pos").map(Choice::parse),
                age: args.range("age")?,
                market_value: args.range("value")?,
                sort: args.value("sort").map(str::to_string),
                ascending: args.switch("asc"),
            },
            xlsx: args.path("xlsx"),
        },
        "controls" => Command::Controls,
        "compare" => {
            let mut players = args.values("player");
            players.extend(rest.iter().cloned());
            if players.is_empty() {
                bail!("compare needs at least one --player");
            }
            Command::Compare {
                players,
                metrics: args.values("metric"),
            }
        }
        "scout" => Command::Scout {
            args: ScoutArgs {
                target: args.value("pos").map(Choice::parse).unwrap_or_default(),
                max_age: args.number("max-age")?,
                min_minutes: args.number("min-minutes")?,
                max_market_value: args.number("max-value")?,
                primary_min: args.number("primary")?,
                secondary_min: args.number("secondary")?,
            },
            xlsx: args.path("xlsx"),
        },
        "profile" => {
            let player = rest
                .first()
                .cloned()
                .or_else(|| args.value("player").map(str::to_string))
                .ok_or_else(|| anyhow!("profile needs a player name"))?;
            Command::Profile { player }
        }
        "dashboard" => Command::Dashboard {
            xlsx: args.path("xlsx"),
        },
        "add-player" => Command::AddPlayer(parse_new_player(args)?),
        "watchlist" => Command::Watchlist(parse_watchlist(args, rest)?),
        "ui" => Command::Ui,
        "help" => Command::Help,
        other => bail!("unknown command `{other}`\n\n{USAGE}"),
    };
    Ok(command)
}

fn parse_new_player(args: &ArgList) -> Result<NewPlayer> {
    let name = args
        .value("name")
        .ok_or_else(|| anyhow!("add-player needs --name"))?;
    let text = |key: &str| args.value(key).unwrap_or_default().to_string();
    let defaults = NewPlayer::default();
    Ok(NewPlayer {
        name: name.to_string(),
        squad: text("squad"),
        age: args.count("age")?.unwrap_or(defaults.age),
        position: text("pos"),
        nation: text("nation"),
        born: text("born"),
        matches_played: args.count("mp")?.unwrap_or(0),
        starts: args.count("starts")?.unwrap_or(0),
        minutes: args.count("min")?.unwrap_or(0),
        goals: args.count("goals")?.unwrap_or(0),
        assists: args.count("assists")?.unwrap_or(0),
        non_penalty_goals: args.count("npg")?.unwrap_or(0),
        xg: args.number("xg")?.unwrap_or(0.0),
        xag: args.number("xag")?.unwrap_or(0.0),
        npxg: args.number("npxg")?.unwrap_or(0.0),
        market_value: args.number("value")?.unwrap_or(0.0),
    })
}

fn parse_watchlist(args: &ArgList, rest: &[String]) -> Result<WatchlistAction> {
    let Some((action, names)) = rest.split_first() else {
        return Ok(WatchlistAction::List);
    };
    let action = match action.as_str() {
        "list" => WatchlistAction::List,
        "add" => {
            let player = names
                .first()
                .cloned()
                .or_else(|| args.value("player").map(str::to_string))
                .ok_or_else(|| anyhow!("watchlist add needs a player name"))?;
            WatchlistAction::Add {
                player,
                note: args.value("note").unwrap_or_default().to_string(),
            }
        }
        "remove" => {
            let mut players: Vec<String> = names.to_vec();
            players.extend(args.values("player"));
            if players.is_empty() {
                bail!("watchlist remove needs at least one player name");
            }
            WatchlistAction::Remove(players)
        }
        "export" => WatchlistAction::Export {
            out: args.path("out"),
        },
        other => bail!("unknown watchlist action `{other}`"),
    };
    Ok(action)
}
