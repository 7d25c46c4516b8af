use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{ErrorKind, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchlistEntry {
    #[serde(rename = "Player")]
    pub player: String,
    #[serde(rename = "Notes", default)]
    pub notes: String,
}

impl WatchlistEntry {
    pub fn new(player: impl Into<String>, notes: impl Into<String>) -> Self {
        Self {
            player: player.into(),
            notes: notes.into(),
        }
    }
}

/// (Player, Notes) list kept in its own CSV file, rewritten on every change.
#[derive(Debug, Clone)]
pub struct WatchlistStore {
    path: PathBuf,
}

impl WatchlistStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current entries. A missing file is an empty watchlist.
    pub fn list(&self) -> Result<Vec<WatchlistEntry>> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no watchlist file yet");
                return Ok(Vec::new());
            }
            Err(err) => {
                return Err(err)
                    .with_context(|| format!("open watchlist {}", self.path.display()));
            }
        };
        read_entries(file).with_context(|| format!("parse watchlist {}", self.path.display()))
    }

    /// Append one entry. Duplicates are allowed.
    pub fn add(&self, player: &str, notes: &str) -> Result<Vec<WatchlistEntry>> {
        let mut entries = self.list()?;
        entries.push(WatchlistEntry::new(player, notes));
        self.save(&entries)?;
        info!(player, total = entries.len(), "added to watchlist");
        Ok(entries)
    }

    /// Drop every entry whose player is in `names`. An empty set leaves the
    /// file untouched.
    pub fn remove(&self, names: &HashSet<String>) -> Result<Vec<WatchlistEntry>> {
        let entries = self.list()?;
        if names.is_empty() {
            return Ok(entries);
        }
        let before = entries.len();
        let kept: Vec<WatchlistEntry> = entries
            .into_iter()
            .filter(|entry| !names.contains(&entry.player))
            .collect();
        self.save(&kept)?;
        info!(removed = before - kept.len(), total = kept.len(), "removed from watchlist");
        Ok(kept)
    }

    /// UTF-8 CSV download of the current entries.
    pub fn export_csv(&self) -> Result<Vec<u8>> {
        let entries = self.list()?;
        let mut buf = Vec::new();
        write_entries(&entries, &mut buf)?;
        Ok(buf)
    }

    fn save(&self, entries: &[WatchlistEntry]) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            if !dir.as_os_str().is_empty() {
                fs::create_dir_all(dir)
                    .with_context(|| format!("create watchlist dir {}", dir.display()))?;
            }
        }
        let tmp = self.path.with_extension("csv.tmp");
        {
            let file =
                File::create(&tmp).with_context(|| format!("create {}", tmp.display()))?;
            write_entries(entries, file)?;
        }
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("swap watchlist {}", self.path.display()))?;
        Ok(())
    }
}

/// Distinct player names in first-seen order.
pub fn watched_players(entries: &[WatchlistEntry]) -> Vec<String> {
    let mut seen = HashSet::new();
    entries
        .iter()
        .filter(|entry| seen.insert(entry.player.as_str()))
        .map(|entry| entry.player.clone())
        .collect()
}

fn read_entries<R: Read>(source: R) -> Result<Vec<WatchlistEntry>> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(source);
    let mut out = Vec::new();
    for row in reader.deserialize() {
        let entry: WatchlistEntry = row.context("read watchlist row")?;
        out.push(entry);
    }
    Ok(out)
}

fn write_entries<W: Write>(entries: &[WatchlistEntry], sink: W) -> Result<()> {
    let mut writer = csv::Writer::from_writer(sink);
    // The header goes out even for an empty list.
    writer
        .write_record(["Player", "Notes"])
        .context("write watchlist header")?;
    for entry in entries {
        writer
            .write_record([entry.player.as_str(), entry.notes.as_str()])
            .context("write watchlist row")?;
    }
    writer.flush().context("flush watchlist")?;
    Ok(())
}
