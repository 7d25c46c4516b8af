use std::env;
use std::path::PathBuf;

use serde::Serialize;

pub const DATA_ENV: &str = "SCOUTBASE_DATA";
pub const WATCHLIST_ENV: &str = "SCOUTBASE_WATCHLIST";
pub const LOG_ENV: &str = "SCOUTBASE_LOG";

pub const DEFAULT_DATA_PATH: &str = "datos/scoutbase_premier_league_updated.csv";
pub const DEFAULT_WATCHLIST_PATH: &str = "datos/lista_seguimiento.csv";
pub const DEFAULT_LOG_FILTER: &str = "warn";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Settings {
    pub data_path: PathBuf,
    pub watchlist_path: PathBuf,
    pub log_filter: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from(DEFAULT_DATA_PATH),
            watchlist_path: PathBuf::from(DEFAULT_WATCHLIST_PATH),
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl Settings {
    /// Reads `.env.local` then `.env` (existing variables win), then the
    /// process environment. Blank values count as unset.
    pub fn from_env() -> Self {
        let _ = dotenvy::from_filename(".env.local");
        let _ = dotenvy::from_filename(".env");
        Self::from_lookup(opt_env)
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            data_path: lookup(DATA_ENV)
                .map(PathBuf::from)
                .unwrap_or(defaults.data_path),
            watchlist_path: lookup(WATCHLIST_ENV)
                .map(PathBuf::from)
                .unwrap_or(defaults.watchlist_path),
            log_filter: lookup(LOG_ENV).unwrap_or(defaults.log_filter),
        }
    }
}

fn opt_env(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .and_then(|val| if val.trim().is_empty() { None } else { Some(val) })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_overrides_defaults() {
        let settings = Settings::from_lookup(|key| match key {
            DATA_ENV => Some("/tmp/players.csv".to_string()),
            _ => None,
        });
        assert_eq!(settings.data_path, PathBuf::from("/tmp/players.csv"));
        assert_eq!(settings.watchlist_path, PathBuf::from(DEFAULT_WATCHLIST_PATH));
        assert_eq!(settings.log_filter, DEFAULT_LOG_FILTER);
    }
}
